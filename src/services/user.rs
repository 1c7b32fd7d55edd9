use crate::{
    error::{AppError, Result},
    models::user::{User, UserProfile},
    services::{Database, StorageService},
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
    storage: StorageService,
}

impl UserService {
    pub async fn new(db: Arc<Database>, storage: StorageService) -> Result<Self> {
        Ok(Self { db, storage })
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile> {
        let user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        Ok(user.into())
    }

    /// Point the profile at a new avatar. The previous blob is removed best
    /// effort; a leftover file never fails the profile update.
    pub async fn update_avatar(&self, user_id: Uuid, image_url: String) -> Result<UserProfile> {
        debug!("Updating avatar for user: {}", user_id);

        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let previous = user.image.take();

        sqlx::query("UPDATE users SET image = ? WHERE id = ?")
            .bind(&image_url)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        if let Some(previous) = previous {
            if previous != image_url {
                if let Err(e) = self.storage.delete_by_url(&previous).await {
                    warn!("Failed to delete previous avatar for {}: {}", user_id, e);
                }
            }
        }

        user.image = Some(image_url);
        info!("Updated avatar for user: {}", user_id);
        Ok(user.into())
    }

    pub async fn delete_avatar(&self, user_id: Uuid) -> Result<UserProfile> {
        debug!("Removing avatar for user: {}", user_id);

        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        sqlx::query("UPDATE users SET image = NULL WHERE id = ?")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        if let Some(previous) = user.image.take() {
            if let Err(e) = self.storage.delete_by_url(&previous).await {
                warn!("Failed to delete avatar blob for {}: {}", user_id, e);
            }
        }

        info!("Removed avatar for user: {}", user_id);
        Ok(user.into())
    }
}
