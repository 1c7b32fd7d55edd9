use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, Router},
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shortcut_blog::{
    config::Config,
    routes,
    services::{
        AuthService, CommentService, Database, EmailService, NotificationService, PostService,
        ReactionService, StorageService, UserService,
    },
    state::AppState,
    utils::middleware::auth_middleware,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "shortcut_blog=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shortcut blog service...");

    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    let db = Arc::new(Database::new(&config).await?);
    db.verify_connection().await?;
    db.migrate().await?;
    info!("Database connection established successfully");

    let storage_service = StorageService::new(&config).await?;
    let email_service = EmailService::new(&config).await?;
    let notification_service = NotificationService::new(db.clone()).await?;
    let auth_service = AuthService::new(db.clone(), &config, email_service.clone()).await?;
    let user_service = UserService::new(db.clone(), storage_service.clone()).await?;
    let post_service = PostService::new(db.clone(), storage_service.clone()).await?;
    let comment_service = CommentService::new(db.clone(), notification_service.clone()).await?;
    let reaction_service = ReactionService::new(db.clone(), notification_service.clone()).await?;

    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: (*db).clone(),
        auth_service,
        user_service,
        post_service,
        comment_service,
        reaction_service,
        notification_service,
        storage_service,
        email_service,
    });

    // Locked to the configured origins in production, open in development
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);
    let cors = if config.is_production() {
        cors.allow_origin(
            config
                .cors_allowed_origins
                .split(',')
                .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
    } else {
        cors.allow_origin(Any)
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", routes::auth::router())
        .nest("/api/users", routes::users::router())
        .nest("/api/posts", routes::posts::router())
        .nest("/api/comments", routes::comments::router())
        .nest("/api/notifications", routes::notifications::router())
        .nest("/api/media", routes::media::router())
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "Shortcut blog is running!"
}
