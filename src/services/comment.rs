use crate::{
    error::{AppError, Result},
    models::comment::*,
    models::notification::NotificationType,
    models::post::Post,
    services::{Database, NotificationService},
    utils::sanitize,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
    notifications: NotificationService,
}

impl CommentService {
    pub async fn new(db: Arc<Database>, notifications: NotificationService) -> Result<Self> {
        Ok(Self { db, notifications })
    }

    pub async fn create_comment(
        &self,
        author_id: Uuid,
        request: CreateCommentRequest,
    ) -> Result<Comment> {
        debug!("Creating comment on post: {}", request.post_id);

        request.validate().map_err(AppError::ValidatorError)?;

        if request.content.trim().is_empty() {
            return Err(AppError::validation("Comment content is required."));
        }

        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(request.post_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        let comment = Comment {
            id: Uuid::new_v4(),
            content: sanitize::clean_comment_html(request.content.trim()),
            post_id: post.id,
            author_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO comments (id, content, post_id, author_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.id)
        .bind(&comment.content)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(self.db.pool())
        .await?;

        // The notification is a side effect, never a reason to fail the
        // comment that already exists
        match self.commenter_name(author_id).await {
            Ok(name) => {
                let message = format!("{} commented on your post \"{}\"", name, post.title);
                if let Err(e) = self
                    .notifications
                    .emit(post.author_id, author_id, post.id, NotificationType::Comment, &message)
                    .await
                {
                    warn!("Failed to emit comment notification: {}", e);
                }
            }
            Err(e) => warn!("Failed to resolve commenter name: {}", e),
        }

        info!("Created comment: {} on post: {}", comment.id, post.id);
        Ok(comment)
    }

    pub async fn get_post_comments(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        debug!("Getting comments for post: {}", post_id);

        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            "SELECT c.*,
                    u.first_name AS author_first_name,
                    u.last_name  AS author_last_name,
                    u.image      AS author_image
             FROM comments c
             JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ?
             ORDER BY c.created_at DESC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(comments)
    }

    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        editor_id: Uuid,
        request: UpdateCommentRequest,
    ) -> Result<Comment> {
        request.validate().map_err(AppError::ValidatorError)?;

        let mut comment = self
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if comment.author_id != editor_id {
            return Err(AppError::forbidden("You can only edit your own comments"));
        }

        comment.content = sanitize::clean_comment_html(request.content.trim());
        comment.updated_at = Utc::now();

        sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(&comment.content)
            .bind(comment.updated_at)
            .bind(comment.id)
            .execute(self.db.pool())
            .await?;

        Ok(comment)
    }

    pub async fn delete_comment(&self, comment_id: Uuid, requester_id: Uuid) -> Result<()> {
        let comment = self
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if comment.author_id != requester_id {
            return Err(AppError::forbidden("You can only delete your own comments"));
        }

        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(comment.post_id)
            .fetch_optional(self.db.pool())
            .await?;

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;

        // Retract the matching notification if the author never saw it.
        // Best effort: a no-op when it is already gone.
        if let Some(post) = post {
            if let Err(e) = self
                .notifications
                .retract(post.author_id, requester_id, post.id, NotificationType::Comment)
                .await
            {
                warn!("Failed to retract comment notification: {}", e);
            }
        }

        info!("Deleted comment: {}", comment_id);
        Ok(())
    }

    pub async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(comment_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(comment)
    }

    async fn commenter_name(&self, user_id: Uuid) -> Result<String> {
        let (first_name, last_name) = sqlx::query_as::<_, (String, String)>(
            "SELECT first_name, last_name FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(format!("{} {}", first_name, last_name))
    }
}
