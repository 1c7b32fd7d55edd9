use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Comment,
    Reaction,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Uuid,
    pub post_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Snapshot row joined with the sender and post projections used for
/// display. Post fields are optional because the join is defensive: a post
/// delete can outrace notification cleanup.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Uuid,
    pub post_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub sender_first_name: String,
    pub sender_last_name: String,
    pub sender_image: Option<String>,
    pub post_slug: Option<String>,
    pub post_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_image: Option<String>,
    pub post_slug: Option<String>,
    pub post_title: Option<String>,
    pub notification_type: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for NotificationResponse {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            sender_name: format!("{} {}", row.sender_first_name, row.sender_last_name),
            sender_image: row.sender_image,
            post_slug: row.post_slug,
            post_title: row.post_title,
            notification_type: row.notification_type,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<i64>,
}
