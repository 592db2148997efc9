use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{Comment, CommentResponse, TopicAuthor},
    services::{notification_service, reputation_service, topic_service},
};

pub async fn get_comment_by_id_raw(db: &PgPool, comment_id: Uuid) -> Result<Option<Comment>> {
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(db)
        .await?;

    Ok(comment)
}

pub async fn get_topic_comments(
    db: &PgPool,
    topic_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Vec<CommentResponse>> {
    let rows = sqlx::query(
        r#"
        SELECT
            c.id, c.topic_id, c.body, c.upvotes, c.downvotes, c.vote_score,
            c.created_at, c.updated_at,
            u.id AS author_id, u.username, u.display_name, u.avatar_url, u.reputation,
            v.vote_type AS user_vote
        FROM comments c
        JOIN users u ON c.author_id = u.id
        LEFT JOIN votes v ON v.target_type = 'comment' AND v.target_id = c.id AND v.user_id = $2
        WHERE c.topic_id = $1
        ORDER BY c.created_at ASC
        "#,
    )
    .bind(topic_id)
    .bind(viewer_id)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CommentResponse {
            id: row.get("id"),
            topic_id: row.get("topic_id"),
            author: TopicAuthor {
                id: row.get("author_id"),
                username: row.get("username"),
                display_name: row.get("display_name"),
                avatar_url: row.get("avatar_url"),
                reputation: row.get("reputation"),
            },
            body: row.get("body"),
            upvotes: row.get("upvotes"),
            downvotes: row.get("downvotes"),
            vote_score: row.get("vote_score"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            user_vote: row.get("user_vote"),
        })
        .collect())
}

pub async fn create_comment(
    db: &PgPool,
    topic_id: Uuid,
    author_id: Uuid,
    author_username: &str,
    body: &str,
) -> Result<Comment> {
    let topic = topic_service::get_topic_by_id_raw(db, topic_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".to_string()))?;

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (id, topic_id, author_id, body, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(topic_id)
    .bind(author_id)
    .bind(body.trim())
    .bind(chrono::Utc::now())
    .fetch_one(db)
    .await?;

    topic_service::recount_comments(db, topic_id).await?;

    // Reply and mention notifications are best-effort
    if topic.author_id != author_id {
        if let Err(e) = notification_service::notify_topic_reply(
            db,
            topic.author_id,
            author_username,
            topic_id,
            &topic.title,
        )
        .await
        {
            tracing::warn!("Failed to notify topic author {}: {}", topic.author_id, e);
        }
    }

    let link = format!("/topics/{}", topic_id);
    if let Err(e) = notification_service::notify_mentions(db, body, author_username, &link).await {
        tracing::warn!("Failed to create mention notifications: {}", e);
    }

    Ok(comment)
}

pub async fn update_comment(
    db: &PgPool,
    comment_id: Uuid,
    author_id: Uuid,
    body: &str,
) -> Result<Comment> {
    let comment = get_comment_by_id_raw(db, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != author_id {
        return Err(AppError::Authorization(
            "You can only edit your own comments".to_string(),
        ));
    }

    let comment = sqlx::query_as::<_, Comment>(
        "UPDATE comments SET body = $2, updated_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(comment_id)
    .bind(body.trim())
    .bind(chrono::Utc::now())
    .fetch_one(db)
    .await?;

    Ok(comment)
}

pub async fn delete_comment(db: &PgPool, comment_id: Uuid, author_id: Uuid) -> Result<()> {
    let comment = get_comment_by_id_raw(db, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != author_id {
        return Err(AppError::Authorization(
            "You can only delete your own comments".to_string(),
        ));
    }

    // Vote rows do not cascade with the comment; remove them first
    sqlx::query("DELETE FROM votes WHERE target_type = 'comment' AND target_id = $1")
        .bind(comment_id)
        .execute(db)
        .await?;

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(db)
        .await?;

    topic_service::recount_comments(db, comment.topic_id).await?;

    if let Err(e) = reputation_service::recompute_reputation(db, author_id).await {
        tracing::warn!(
            "Failed to recompute reputation for {} after comment delete: {}",
            author_id,
            e
        );
    }

    Ok(())
}
