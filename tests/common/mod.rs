#![allow(dead_code)]

use shortcut_blog::{
    config::Config,
    models::post::{CreatePostRequest, Post},
    models::user::{SignupRequest, UserProfile},
    services::{
        AuthService, CommentService, Database, EmailService, NotificationService, PostService,
        ReactionService, StorageService, UserService,
    },
};
use std::sync::Arc;
use uuid::Uuid;

pub struct TestApp {
    pub db: Arc<Database>,
    pub auth: AuthService,
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
    pub reactions: ReactionService,
    pub notifications: NotificationService,
    pub storage: StorageService,
}

fn test_config() -> Config {
    let upload_dir = std::env::temp_dir()
        .join(format!("shortcut-blog-test-{}", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        environment: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        jwt_secret: "test-secret-do-not-use".to_string(),
        jwt_expiry_hours: 1,
        reset_token_expiry_minutes: 60,
        upload_dir,
        public_base_url: "http://localhost:3000".to_string(),
        max_upload_size: 4 * 1024 * 1024,
        smtp_host: "localhost".to_string(),
        smtp_port: 2525,
        smtp_username: String::new(),
        smtp_password: String::new(),
        smtp_from_name: "Shortcut Blog".to_string(),
        smtp_from_email: "noreply@shortcut-blog.test".to_string(),
        password_reset_url: "http://localhost:3001/reset-password".to_string(),
        default_posts_per_page: 20,
        default_notifications_limit: 20,
        enable_registrations: true,
        cors_allowed_origins: "http://localhost:3001".to_string(),
    }
}

/// Fresh in-memory database plus the full service graph. The pool is pinned
/// to a single connection so every query sees the same memory database.
pub async fn setup() -> TestApp {
    let config = test_config();

    let db = Arc::new(
        Database::connect(&config.database_url, config.database_max_connections)
            .await
            .unwrap(),
    );
    db.migrate().await.unwrap();

    let storage = StorageService::new(&config).await.unwrap();
    let email = EmailService::new(&config).await.unwrap();
    let notifications = NotificationService::new(db.clone()).await.unwrap();
    let auth = AuthService::new(db.clone(), &config, email).await.unwrap();
    let users = UserService::new(db.clone(), storage.clone()).await.unwrap();
    let posts = PostService::new(db.clone(), storage.clone()).await.unwrap();
    let comments = CommentService::new(db.clone(), notifications.clone())
        .await
        .unwrap();
    let reactions = ReactionService::new(db.clone(), notifications.clone())
        .await
        .unwrap();

    TestApp {
        db,
        auth,
        users,
        posts,
        comments,
        reactions,
        notifications,
        storage,
    }
}

pub async fn create_user(app: &TestApp, first_name: &str, last_name: &str, email: &str) -> UserProfile {
    app.auth
        .signup(SignupRequest {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: "correct-horse-battery".to_string(),
            confirm_password: "correct-horse-battery".to_string(),
        })
        .await
        .unwrap()
}

pub async fn create_post(app: &TestApp, author_id: Uuid, title: &str) -> Post {
    app.posts
        .create_post(
            author_id,
            CreatePostRequest {
                title: title.to_string(),
                content: format!("<p>Body of {}</p>", title),
                image_url: None,
            },
        )
        .await
        .unwrap()
}
