use crate::{
    config::Config,
    services::{
        auth::AuthService,
        comment::CommentService,
        database::Database,
        email::EmailService,
        notification::NotificationService,
        post::PostService,
        reaction::ReactionService,
        storage::StorageService,
        user::UserService,
    },
};

/// Shared application state: configuration plus one instance of every
/// service, cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub reaction_service: ReactionService,
    pub notification_service: NotificationService,
    pub storage_service: StorageService,
    pub email_service: EmailService,
}
