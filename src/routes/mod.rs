pub mod auth;
pub mod comments;
pub mod media;
pub mod notifications;
pub mod posts;
pub mod users;
