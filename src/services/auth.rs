use crate::{
    config::Config,
    error::{AppError, Result},
    models::user::{
        LoginRequest, ResetPasswordRequest, SignupRequest, User, UserProfile,
    },
    models::password_reset::PasswordReset,
    services::{Database, EmailService},
};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub email: Option<String>,
}

/// The authenticated identity resolved for the current request. Stored in
/// request extensions by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Clone)]
pub struct AuthService {
    db: Arc<Database>,
    config: Config,
    email_service: EmailService,
}

impl AuthService {
    pub async fn new(db: Arc<Database>, config: &Config, email_service: EmailService) -> Result<Self> {
        Ok(Self {
            db,
            config: config.clone(),
            email_service,
        })
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<UserProfile> {
        if !self.config.enable_registrations {
            return Err(AppError::forbidden("Registrations are currently disabled"));
        }

        request.validate().map_err(AppError::ValidatorError)?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(&request.email)
            .fetch_one(self.db.pool())
            .await?;
        if existing > 0 {
            return Err(AppError::conflict("A user with this email already exists."));
        }

        let user = User {
            id: Uuid::new_v4(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: request.email.to_lowercase(),
            password_hash: self.hash_password(&request.password)?,
            image: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, password_hash, image, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.image)
        .bind(user.created_at)
        .execute(self.db.pool())
        .await?;

        info!("Created user account: {}", user.id);
        Ok(user.into())
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        request.validate().map_err(AppError::ValidatorError)?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(request.email.to_lowercase())
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

        if !self.verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        let token = self.issue_jwt(&user)?;
        debug!("Issued session token for user: {}", user.id);

        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    pub fn issue_jwt(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            exp: (now + Duration::hours(self.config.jwt_expiry_hours)).timestamp(),
            iat: now.timestamp(),
            email: Some(user.email.clone()),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;

        Ok(token)
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_ref());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::unauthorized("Invalid token"))
            }
        }
    }

    /// Load the user a verified token refers to. `None` when the account was
    /// deleted after the token was issued.
    pub async fn resolve_user(&self, subject: &str) -> Result<Option<CurrentUser>> {
        let user_id = Uuid::parse_str(subject)?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(user.map(|u| CurrentUser {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            image: u.image,
        }))
    }

    /// Start the reset flow. Succeeds quietly when no account matches, so the
    /// endpoint never confirms whether an email is registered. The reset
    /// email itself is the one external call whose failure is user-visible.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_optional(self.db.pool())
            .await?;

        let Some(user) = user else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let mut token_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut token_bytes);
        let token = hex::encode(token_bytes);

        let reset = PasswordReset {
            id: Uuid::new_v4(),
            user_id: user.id,
            token,
            expires_at: Utc::now() + Duration::minutes(self.config.reset_token_expiry_minutes),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO password_resets (id, user_id, token, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(reset.id)
        .bind(reset.user_id)
        .bind(&reset.token)
        .bind(reset.expires_at)
        .bind(reset.created_at)
        .execute(self.db.pool())
        .await?;

        let reset_link = format!("{}?token={}", self.config.password_reset_url, reset.token);
        self.email_service
            .send_password_reset(&user.email, &user.first_name, &reset_link)
            .await?;

        info!("Password reset link sent to user: {}", user.id);
        Ok(())
    }

    /// Consume a reset token: validate, re-hash, delete the token row.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        request.validate().map_err(AppError::ValidatorError)?;

        let reset = sqlx::query_as::<_, PasswordReset>(
            "SELECT * FROM password_resets WHERE token = ?",
        )
        .bind(&request.token)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid or expired reset token."))?;

        if Utc::now() > reset.expires_at {
            return Err(AppError::bad_request("This reset link has expired."));
        }

        let password_hash = self.hash_password(&request.password)?;

        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(reset.user_id)
            .execute(self.db.pool())
            .await?;

        // Single use: the token row goes away with the successful change
        sqlx::query("DELETE FROM password_resets WHERE id = ?")
            .bind(reset.id)
            .execute(self.db.pool())
            .await?;

        info!("Password reset completed for user: {}", reset.user_id);
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AppError::Internal(format!("Stored password hash is invalid: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
