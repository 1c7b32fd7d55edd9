use crate::{
    error::{is_unique_violation, AppError, Result},
    models::notification::NotificationType,
    models::post::Post,
    models::reaction::*,
    services::{Database, NotificationService},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ReactionService {
    db: Arc<Database>,
    notifications: NotificationService,
}

impl ReactionService {
    pub async fn new(db: Arc<Database>, notifications: NotificationService) -> Result<Self> {
        Ok(Self { db, notifications })
    }

    /// Flip the like state for (post, user): no row -> insert, row -> delete.
    ///
    /// The read-then-invert has an inherent race when the same user fires two
    /// requests at once. The UNIQUE(post_id, user_id) index turns a would-be
    /// double insert into a rejected statement, which is resolved as "the
    /// other request won": the pair is Liked, no error reaches the user and
    /// no duplicate notification is emitted.
    pub async fn toggle(&self, post_id: Uuid, user_id: Uuid) -> Result<ReactionState> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        let existing = sqlx::query_as::<_, Reaction>(
            "SELECT * FROM reactions WHERE post_id = ? AND user_id = ?",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        let liked = match existing {
            Some(reaction) => {
                sqlx::query("DELETE FROM reactions WHERE id = ?")
                    .bind(reaction.id)
                    .execute(self.db.pool())
                    .await?;

                if let Err(e) = self
                    .notifications
                    .retract(post.author_id, user_id, post.id, NotificationType::Reaction)
                    .await
                {
                    warn!("Failed to retract reaction notification: {}", e);
                }

                debug!("User {} unliked post {}", user_id, post_id);
                false
            }
            None => {
                let inserted = sqlx::query(
                    "INSERT INTO reactions (id, post_id, user_id, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(Uuid::new_v4())
                .bind(post_id)
                .bind(user_id)
                .bind(Utc::now())
                .execute(self.db.pool())
                .await;

                match inserted {
                    Ok(_) => {
                        self.notify_author(&post, user_id).await;
                        info!("User {} liked post {}", user_id, post_id);
                    }
                    Err(e) if is_unique_violation(&e) => {
                        // A concurrent toggle from the same user got there
                        // first; the pair is Liked either way
                        debug!(
                            "Concurrent like for post {} by user {}, other request won",
                            post_id, user_id
                        );
                    }
                    Err(e) => return Err(e.into()),
                }
                true
            }
        };

        let like_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reactions WHERE post_id = ?",
        )
        .bind(post_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(ReactionState { liked, like_count })
    }

    async fn notify_author(&self, post: &Post, liker_id: Uuid) {
        let name = match sqlx::query_as::<_, (String, String)>(
            "SELECT first_name, last_name FROM users WHERE id = ?",
        )
        .bind(liker_id)
        .fetch_one(self.db.pool())
        .await
        {
            Ok((first, last)) => format!("{} {}", first, last),
            Err(e) => {
                warn!("Failed to resolve liker name: {}", e);
                return;
            }
        };

        let message = format!("{} liked your post \"{}\"", name, post.title);
        if let Err(e) = self
            .notifications
            .emit(post.author_id, liker_id, post.id, NotificationType::Reaction, &message)
            .await
        {
            warn!("Failed to emit reaction notification: {}", e);
        }
    }
}
