use crate::{
    error::Result,
    models::notification::*,
    services::Database,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// Record an engagement event for the post author. Self-actions are
    /// suppressed: nobody gets notified about their own comment or like.
    pub async fn emit(
        &self,
        recipient_id: Uuid,
        sender_id: Uuid,
        post_id: Uuid,
        notification_type: NotificationType,
        message: &str,
    ) -> Result<()> {
        if recipient_id == sender_id {
            return Ok(());
        }

        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, sender_id, post_id, notification_type, message, is_read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(recipient_id)
        .bind(sender_id)
        .bind(post_id)
        .bind(notification_type)
        .bind(message)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        debug!(
            "Emitted {:?} notification: {} -> {}",
            notification_type, sender_id, recipient_id
        );
        Ok(())
    }

    /// Delete any notification matching the exact (recipient, sender, post,
    /// type) tuple. Used when the triggering comment/reaction is removed.
    /// Safe to call when nothing matches.
    pub async fn retract(
        &self,
        recipient_id: Uuid,
        sender_id: Uuid,
        post_id: Uuid,
        notification_type: NotificationType,
    ) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM notifications
             WHERE recipient_id = ? AND sender_id = ? AND post_id = ? AND notification_type = ?",
        )
        .bind(recipient_id)
        .bind(sender_id)
        .bind(post_id)
        .bind(notification_type)
        .execute(self.db.pool())
        .await?;

        debug!(
            "Retracted {} {:?} notification(s): {} -> {}",
            result.rows_affected(),
            notification_type,
            sender_id,
            recipient_id
        );
        Ok(())
    }

    /// Newest-first snapshot with sender and post projections for display.
    /// Rows whose post vanished are excluded in the query itself, before the
    /// LIMIT applies, so a page is never short just because cleanup lagged
    /// behind a delete.
    pub async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<NotificationList> {
        let limit = limit.clamp(1, 100);

        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT n.id, n.recipient_id, n.sender_id, n.post_id, n.notification_type,
                    n.message, n.is_read, n.created_at,
                    u.first_name AS sender_first_name,
                    u.last_name  AS sender_last_name,
                    u.image      AS sender_image,
                    p.slug       AS post_slug,
                    p.title      AS post_title
             FROM notifications n
             JOIN users u ON u.id = n.sender_id
             LEFT JOIN posts p ON p.id = n.post_id
             WHERE n.recipient_id = ?
               AND (n.post_id IS NULL OR p.id IS NOT NULL)
             ORDER BY n.created_at DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        let notifications = rows.into_iter().map(NotificationResponse::from).collect();

        let unread_count = self.unread_count(user_id).await?;

        Ok(NotificationList {
            notifications,
            unread_count,
        })
    }

    /// Monotonic: a read notification never reverts to unread. Scoped to the
    /// recipient so nobody can mark someone else's notification.
    pub async fn mark_read(&self, notification_id: Uuid, recipient_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND recipient_id = ?")
            .bind(notification_id)
            .bind(recipient_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE recipient_id = ?")
            .bind(recipient_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Always derived from current rows, never stored, so it cannot drift.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count)
    }
}
