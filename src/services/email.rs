use crate::{
    config::Config,
    error::{AppError, Result},
};
use handlebars::Handlebars;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde_json::json;
use tracing::info;

const PASSWORD_RESET_TEMPLATE: &str = r#"
<div style="font-family: sans-serif; max-width: 480px; margin: 0 auto;">
  <h2>Reset your password</h2>
  <p>Hi {{first_name}},</p>
  <p>Someone recently requested a password change for your account.
     If this was you, set a new password here:</p>
  <p><a href="{{reset_link}}"
        style="background:#111;color:#fff;padding:10px 18px;border-radius:6px;text-decoration:none;">
     Reset password</a></p>
  <p>If you don't want to change your password or didn't request this,
     just ignore and delete this message.</p>
</div>
"#;

#[derive(Clone)]
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    templates: Handlebars<'static>,
    from: String,
}

impl EmailService {
    pub async fn new(config: &Config) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Email(format!("Failed to configure SMTP transport: {}", e)))?
            .port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        let mut templates = Handlebars::new();
        templates
            .register_template_string("password_reset", PASSWORD_RESET_TEMPLATE)
            .map_err(|e| AppError::Internal(format!("Invalid email template: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            templates,
            from: format!("{} <{}>", config.smtp_from_name, config.smtp_from_email),
        })
    }

    pub async fn send_password_reset(
        &self,
        to: &str,
        first_name: &str,
        reset_link: &str,
    ) -> Result<()> {
        let body = self
            .templates
            .render(
                "password_reset",
                &json!({ "first_name": first_name, "reset_link": reset_link }),
            )
            .map_err(|e| AppError::Internal(format!("Failed to render email: {}", e)))?;

        let message = Message::builder()
            .from(self
                .from
                .parse()
                .map_err(|e| AppError::Email(format!("Invalid sender address: {}", e)))?)
            .to(to
                .parse()
                .map_err(|e| AppError::Email(format!("Invalid recipient address: {}", e)))?)
            .subject("Reset your password")
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| AppError::Email(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(format!("Failed to send email: {}", e)))?;

        info!("Password reset email sent");
        Ok(())
    }
}
