pub mod auth;
pub mod comment;
pub mod database;
pub mod email;
pub mod notification;
pub mod post;
pub mod reaction;
pub mod storage;
pub mod user;

// Re-export the service types the rest of the crate wires together
pub use auth::AuthService;
pub use comment::CommentService;
pub use database::Database;
pub use email::EmailService;
pub use notification::NotificationService;
pub use post::PostService;
pub use reaction::ReactionService;
pub use storage::StorageService;
pub use user::UserService;
