mod common;

use common::{create_post, create_user, setup};
use shortcut_blog::{
    error::AppError,
    models::comment::{CreateCommentRequest, UpdateCommentRequest},
    models::notification::NotificationType,
};
use uuid::Uuid;

#[tokio::test]
async fn toggle_flips_like_state_and_count() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Toggle Me").await;

    let liked = app.reactions.toggle(post.id, reader.id).await.unwrap();
    assert!(liked.liked);
    assert_eq!(liked.like_count, 1);

    let unliked = app.reactions.toggle(post.id, reader.id).await.unwrap();
    assert!(!unliked.liked);
    assert_eq!(unliked.like_count, 0);

    // Never more than one row per (post, user), whatever the sequence
    app.reactions.toggle(post.id, reader.id).await.unwrap();
    let rows = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM reactions WHERE post_id = ? AND user_id = ?",
    )
    .bind(post.id)
    .bind(reader.id)
    .fetch_one(app.db.pool())
    .await
    .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn concurrent_double_toggle_leaves_at_most_one_row() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Double Click").await;

    // Two toggles from the same user racing each other. Whatever the
    // interleaving, neither call errors and the unique index keeps the pair
    // at one row at most.
    let (first, second) = tokio::join!(
        app.reactions.toggle(post.id, reader.id),
        app.reactions.toggle(post.id, reader.id),
    );
    first.unwrap();
    second.unwrap();

    let rows = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM reactions WHERE post_id = ? AND user_id = ?",
    )
    .bind(post.id)
    .bind(reader.id)
    .fetch_one(app.db.pool())
    .await
    .unwrap();
    assert!(rows <= 1);

    // No duplicate notification either way
    assert!(app.notifications.unread_count(author.id).await.unwrap() <= 1);
}

#[tokio::test]
async fn reaction_on_missing_post_is_not_found() {
    let app = setup().await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;

    let err = app
        .reactions
        .toggle(Uuid::new_v4(), reader.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn own_engagement_produces_no_notification() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let post = create_post(&app, author.id, "Self Service").await;

    app.reactions.toggle(post.id, author.id).await.unwrap();
    app.comments
        .create_comment(
            author.id,
            CreateCommentRequest {
                post_id: post.id,
                content: "First!".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 0);
    let list = app.notifications.list_for_user(author.id, 20).await.unwrap();
    assert!(list.notifications.is_empty());
}

#[tokio::test]
async fn comment_notifies_the_post_author() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Discussable").await;

    app.comments
        .create_comment(
            reader.id,
            CreateCommentRequest {
                post_id: post.id,
                content: "Great post".to_string(),
            },
        )
        .await
        .unwrap();

    let list = app.notifications.list_for_user(author.id, 20).await.unwrap();
    assert_eq!(list.unread_count, 1);
    assert_eq!(list.notifications.len(), 1);

    let n = &list.notifications[0];
    assert_eq!(n.notification_type, NotificationType::Comment);
    assert_eq!(n.sender_name, "Grace Hopper");
    assert_eq!(n.post_slug.as_deref(), Some(post.slug.as_str()));
    assert_eq!(n.post_title.as_deref(), Some("Discussable"));
    assert!(n.message.contains("commented on your post"));
    assert!(!n.is_read);
}

#[tokio::test]
async fn deleting_the_comment_retracts_the_notification() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Retractable").await;

    let comment = app
        .comments
        .create_comment(
            reader.id,
            CreateCommentRequest {
                post_id: post.id,
                content: "Oops".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 1);

    app.comments.delete_comment(comment.id, reader.id).await.unwrap();
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 0);
    let list = app.notifications.list_for_user(author.id, 20).await.unwrap();
    assert!(list.notifications.is_empty());
}

#[tokio::test]
async fn unliking_retracts_the_reaction_notification() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Fickle Hearts").await;

    app.reactions.toggle(post.id, reader.id).await.unwrap();
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 1);

    app.reactions.toggle(post.id, reader.id).await.unwrap();
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 0);
}

#[tokio::test]
async fn retract_with_nothing_matching_is_a_no_op() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Quiet").await;

    app.notifications
        .retract(author.id, reader.id, post.id, NotificationType::Reaction)
        .await
        .unwrap();
    app.notifications
        .retract(author.id, reader.id, post.id, NotificationType::Reaction)
        .await
        .unwrap();
}

#[tokio::test]
async fn listing_keeps_pages_full_when_rows_have_no_post() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Page Filler").await;

    // A row without a post reference, as cleanup lag can leave behind
    sqlx::query(
        "INSERT INTO notifications (id, recipient_id, sender_id, post_id, notification_type, message, is_read, created_at)
         VALUES (?, ?, ?, NULL, 'COMMENT', ?, 0, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(author.id)
    .bind(reader.id)
    .bind("Grace Hopper commented on your post")
    .bind(chrono::Utc::now())
    .execute(app.db.pool())
    .await
    .unwrap();

    app.reactions.toggle(post.id, reader.id).await.unwrap();
    app.comments
        .create_comment(
            reader.id,
            CreateCommentRequest {
                post_id: post.id,
                content: "Hello".to_string(),
            },
        )
        .await
        .unwrap();

    // The post-less row counts toward the page like any other
    let list = app.notifications.list_for_user(author.id, 3).await.unwrap();
    assert_eq!(list.notifications.len(), 3);
    assert!(list
        .notifications
        .iter()
        .any(|n| n.post_slug.is_none() && n.post_title.is_none()));
    assert_eq!(list.unread_count, 3);
}

#[tokio::test]
async fn mark_read_is_scoped_to_the_recipient() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Private Inbox").await;

    app.reactions.toggle(post.id, reader.id).await.unwrap();
    let list = app.notifications.list_for_user(author.id, 20).await.unwrap();
    let notification_id = list.notifications[0].id;

    // The sender cannot mark the recipient's notification
    app.notifications.mark_read(notification_id, reader.id).await.unwrap();
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 1);

    app.notifications.mark_read(notification_id, author.id).await.unwrap();
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 0);

    // Read state survives in the listing
    let list = app.notifications.list_for_user(author.id, 20).await.unwrap();
    assert!(list.notifications[0].is_read);
}

#[tokio::test]
async fn mark_all_read_clears_the_counter() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let other = create_user(&app, "Alan", "Turing", "alan@example.com").await;
    let post = create_post(&app, author.id, "Busy Day").await;

    app.reactions.toggle(post.id, reader.id).await.unwrap();
    app.reactions.toggle(post.id, other.id).await.unwrap();
    app.comments
        .create_comment(
            reader.id,
            CreateCommentRequest {
                post_id: post.id,
                content: "Hello".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 3);

    app.notifications.mark_all_read(author.id).await.unwrap();
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 0);

    // Already-read rows keep their state after another pass
    app.notifications.mark_all_read(author.id).await.unwrap();
    let list = app.notifications.list_for_user(author.id, 20).await.unwrap();
    assert_eq!(list.notifications.len(), 3);
    assert!(list.notifications.iter().all(|n| n.is_read));
}

#[tokio::test]
async fn comments_can_only_be_edited_by_their_author() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Commented").await;

    let comment = app
        .comments
        .create_comment(
            reader.id,
            CreateCommentRequest {
                post_id: post.id,
                content: "Original".to_string(),
            },
        )
        .await
        .unwrap();

    let err = app
        .comments
        .update_comment(
            comment.id,
            author.id,
            UpdateCommentRequest {
                content: "Tampered".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let err = app
        .comments
        .delete_comment(comment.id, author.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let updated = app
        .comments
        .update_comment(
            comment.id,
            reader.id,
            UpdateCommentRequest {
                content: "Edited".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.content, "Edited");
}

#[tokio::test]
async fn comment_listing_is_newest_first_with_author_projection() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Thread").await;

    for i in 0..3 {
        app.comments
            .create_comment(
                reader.id,
                CreateCommentRequest {
                    post_id: post.id,
                    content: format!("Comment {}", i),
                },
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let comments = app.comments.get_post_comments(post.id).await.unwrap();
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[0].content, "Comment 2");
    assert_eq!(comments[2].content, "Comment 0");
    assert!(comments.iter().all(|c| c.author_first_name == "Grace"));
}

#[tokio::test]
async fn full_engagement_lifecycle() {
    let app = setup().await;
    let author = create_user(&app, "Ada", "Lovelace", "ada@example.com").await;
    let reader = create_user(&app, "Grace", "Hopper", "grace@example.com").await;
    let post = create_post(&app, author.id, "Lifecycle").await;

    let comment = app
        .comments
        .create_comment(
            reader.id,
            CreateCommentRequest {
                post_id: post.id,
                content: "Following along".to_string(),
            },
        )
        .await
        .unwrap();
    app.reactions.toggle(post.id, reader.id).await.unwrap();
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 2);

    app.notifications.mark_all_read(author.id).await.unwrap();
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 0);

    // Removing the engagement removes the read notifications too
    app.comments.delete_comment(comment.id, reader.id).await.unwrap();
    app.reactions.toggle(post.id, reader.id).await.unwrap();

    let list = app.notifications.list_for_user(author.id, 20).await.unwrap();
    assert!(list.notifications.is_empty());
    assert_eq!(list.unread_count, 0);
}
