use crate::{config::Config, error::Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tracing::{debug, info};

/// Schema, applied statement by statement at startup. Uniqueness constraints
/// and cascades live here: the slug index, the (post_id, user_id) reaction
/// guard, and the user/post delete cascades.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            TEXT PRIMARY KEY,
        first_name    TEXT NOT NULL,
        last_name     TEXT NOT NULL,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        image         TEXT,
        created_at    TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id         TEXT PRIMARY KEY,
        slug       TEXT NOT NULL,
        title      TEXT NOT NULL,
        excerpt    TEXT NOT NULL,
        content    TEXT NOT NULL,
        image_url  TEXT,
        author_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS posts_slug_unique ON posts(slug)",
    "CREATE INDEX IF NOT EXISTS posts_author_idx ON posts(author_id)",
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id         TEXT PRIMARY KEY,
        content    TEXT NOT NULL,
        post_id    TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        author_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS comments_post_idx ON comments(post_id)",
    r#"
    CREATE TABLE IF NOT EXISTS reactions (
        id         TEXT PRIMARY KEY,
        post_id    TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS unique_user_post_reaction ON reactions(post_id, user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id                TEXT PRIMARY KEY,
        recipient_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        sender_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        post_id           TEXT REFERENCES posts(id) ON DELETE CASCADE,
        notification_type TEXT NOT NULL CHECK (notification_type IN ('COMMENT', 'REACTION')),
        message           TEXT NOT NULL,
        is_read           BOOLEAN NOT NULL DEFAULT 0,
        created_at        TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS notifications_recipient_idx ON notifications(recipient_id)",
    "CREATE INDEX IF NOT EXISTS notifications_unread_idx ON notifications(recipient_id, is_read)",
    r#"
    CREATE TABLE IF NOT EXISTS password_resets (
        id         TEXT PRIMARY KEY,
        user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        token      TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS password_resets_token_idx ON password_resets(token)",
];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self> {
        Self::connect(&config.database_url, config.database_max_connections).await
    }

    /// Connect to `url` with foreign keys enforced. An in-memory url must be
    /// paired with `max_connections = 1` or every pooled connection would
    /// see its own empty database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn verify_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
            debug!("Applied schema statement");
        }
        info!("Database schema up to date");
        Ok(())
    }
}
