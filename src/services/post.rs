use crate::{
    error::{is_unique_violation, AppError, Result},
    models::post::*,
    services::{Database, StorageService},
    utils::{sanitize, slug, text},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Bounded retry for slug collisions: the timestamp suffix is unique enough
/// in practice, but two same-titled posts in the same clock window can
/// collide, so the insert regenerates the suffix instead of failing.
const SLUG_INSERT_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
    storage: StorageService,
}

impl PostService {
    pub async fn new(db: Arc<Database>, storage: StorageService) -> Result<Self> {
        Ok(Self { db, storage })
    }

    pub async fn create_post(&self, author_id: Uuid, request: CreatePostRequest) -> Result<Post> {
        debug!("Creating post for user: {}", author_id);

        request.validate().map_err(AppError::ValidatorError)?;

        let title = request.title.trim().to_string();
        if title.is_empty() || request.content.trim().is_empty() {
            return Err(AppError::validation("Title and content are required."));
        }

        let content = sanitize::clean_post_html(&request.content);
        let excerpt = text::make_excerpt(&content);
        let image_url = request.image_url.filter(|url| !url.is_empty());

        let base_slug = slug::generate_slug(&title);
        let mut candidate = slug::with_time_suffix(&base_slug);

        for attempt in 1..=SLUG_INSERT_ATTEMPTS {
            let post = Post {
                id: Uuid::new_v4(),
                slug: candidate.clone(),
                title: title.clone(),
                excerpt: excerpt.clone(),
                content: content.clone(),
                image_url: image_url.clone(),
                author_id,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };

            let inserted = sqlx::query(
                "INSERT INTO posts (id, slug, title, excerpt, content, image_url, author_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(post.id)
            .bind(&post.slug)
            .bind(&post.title)
            .bind(&post.excerpt)
            .bind(&post.content)
            .bind(&post.image_url)
            .bind(post.author_id)
            .bind(post.created_at)
            .bind(post.updated_at)
            .execute(self.db.pool())
            .await;

            match inserted {
                Ok(_) => {
                    info!("Created post: {} ({})", post.id, post.slug);
                    return Ok(post);
                }
                Err(e) if is_unique_violation(&e) => {
                    warn!(
                        "Slug collision on '{}' (attempt {}/{}), regenerating",
                        candidate, attempt, SLUG_INSERT_ATTEMPTS
                    );
                    candidate = slug::with_random_suffix(&base_slug);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::internal("Failed to allocate a unique slug for the post"))
    }

    pub async fn update_post(
        &self,
        post_id: Uuid,
        editor_id: Uuid,
        request: UpdatePostRequest,
    ) -> Result<Post> {
        debug!("Updating post: {} by user: {}", post_id, editor_id);

        request.validate().map_err(AppError::ValidatorError)?;

        let mut post = self
            .get_post_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        if post.author_id != editor_id {
            return Err(AppError::forbidden("Only the post author can update this post"));
        }

        if let Some(title) = request.title {
            if title.trim().is_empty() {
                return Err(AppError::validation("Title is required."));
            }
            // The slug is assigned at creation and never changes
            post.title = title.trim().to_string();
        }

        if let Some(content) = request.content {
            if content.trim().is_empty() {
                return Err(AppError::validation("Content is required."));
            }
            post.content = sanitize::clean_post_html(&content);
            post.excerpt = text::make_excerpt(&post.content);
        }

        if let Some(image_url) = request.image_url {
            post.image_url = if image_url.is_empty() { None } else { Some(image_url) };
        }

        post.updated_at = Utc::now();

        sqlx::query(
            "UPDATE posts SET title = ?, excerpt = ?, content = ?, image_url = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(post.updated_at)
        .bind(post.id)
        .execute(self.db.pool())
        .await?;

        info!("Updated post: {}", post_id);
        Ok(post)
    }

    pub async fn delete_post(&self, post_id: Uuid, requester_id: Uuid) -> Result<()> {
        debug!("Deleting post: {} by user: {}", post_id, requester_id);

        let post = self
            .get_post_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        if post.author_id != requester_id {
            return Err(AppError::forbidden("Only the post author can delete this post"));
        }

        // Cascades take the comments, reactions and notifications with it
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        // Best effort: an orphaned image is an operational cost, not a
        // reason to fail a delete that already happened
        if let Some(image_url) = &post.image_url {
            if let Err(e) = self.storage.delete_by_url(image_url).await {
                warn!("Failed to delete image for post {}: {}", post_id, e);
            }
        }

        info!("Deleted post: {}", post_id);
        Ok(())
    }

    pub async fn get_post_by_id(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(post)
    }

    pub async fn get_post_by_slug(
        &self,
        slug: &str,
        viewer_id: Option<Uuid>,
    ) -> Result<Option<PostResponse>> {
        debug!("Getting post by slug: {}", slug);

        let row = sqlx::query_as::<_, PostRow>(
            "SELECT p.*,
                    u.first_name AS author_first_name,
                    u.last_name  AS author_last_name,
                    u.image      AS author_image,
                    (SELECT COUNT(*) FROM reactions r WHERE r.post_id = p.id) AS like_count,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)  AS comment_count
             FROM posts p
             JOIN users u ON u.id = p.author_id
             WHERE p.slug = ?",
        )
        .bind(slug)
        .fetch_optional(self.db.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let liked_by_viewer = match viewer_id {
            Some(viewer_id) => Some(self.viewer_has_liked(row.id, viewer_id).await?),
            None => None,
        };

        Ok(Some(PostResponse::from_row(row, liked_by_viewer)))
    }

    /// Paginated listing, newest first, optionally restricted to one author.
    pub async fn list_posts(&self, query: PostQuery, default_limit: i64) -> Result<Vec<PostResponse>> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(default_limit).clamp(1, 100);
        let offset = (page - 1) * limit;

        let base = "SELECT p.*,
                           u.first_name AS author_first_name,
                           u.last_name  AS author_last_name,
                           u.image      AS author_image,
                           (SELECT COUNT(*) FROM reactions r WHERE r.post_id = p.id) AS like_count,
                           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)  AS comment_count
                    FROM posts p
                    JOIN users u ON u.id = p.author_id";

        let rows = match query.author {
            Some(author_id) => {
                sqlx::query_as::<_, PostRow>(&format!(
                    "{} WHERE p.author_id = ? ORDER BY p.created_at DESC LIMIT ? OFFSET ?",
                    base
                ))
                .bind(author_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query_as::<_, PostRow>(&format!(
                    "{} ORDER BY p.created_at DESC LIMIT ? OFFSET ?",
                    base
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|row| PostResponse::from_row(row, None))
            .collect())
    }

    async fn viewer_has_liked(&self, post_id: Uuid, viewer_id: Uuid) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reactions WHERE post_id = ? AND user_id = ?",
        )
        .bind(post_id)
        .bind(viewer_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count > 0)
    }
}
