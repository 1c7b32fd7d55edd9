use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A like. At most one row per (post_id, user_id), enforced by a UNIQUE
/// index so a racing double-insert fails instead of double-counting.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reaction {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Result of a toggle: the state the (post, user) pair ended up in.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionState {
    pub liked: bool,
    pub like_count: i64,
}
