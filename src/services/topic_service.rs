use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        CreateTopicRequest, Topic, TopicAuthor, TopicListResponse, TopicResponse, TopicSort,
        UpdateTopicRequest,
    },
    services::{comment_service, reputation_service},
};

pub async fn get_topic_by_id_raw(db: &PgPool, topic_id: Uuid) -> Result<Option<Topic>> {
    let topic = sqlx::query_as::<_, Topic>("SELECT * FROM topics WHERE id = $1")
        .bind(topic_id)
        .fetch_optional(db)
        .await?;

    Ok(topic)
}

pub async fn get_topic(
    db: &PgPool,
    topic_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Option<TopicResponse>> {
    let row = sqlx::query(
        r#"
        SELECT
            t.id, t.title, t.body, t.category, t.upvotes, t.downvotes, t.vote_score,
            t.comment_count, t.created_at, t.updated_at,
            u.id AS author_id, u.username, u.display_name, u.avatar_url, u.reputation,
            v.vote_type AS user_vote,
            (b.user_id IS NOT NULL) AS is_bookmarked
        FROM topics t
        JOIN users u ON t.author_id = u.id
        LEFT JOIN votes v ON v.target_type = 'topic' AND v.target_id = t.id AND v.user_id = $2
        LEFT JOIN bookmarks b ON b.topic_id = t.id AND b.user_id = $2
        WHERE t.id = $1
        "#,
    )
    .bind(topic_id)
    .bind(viewer_id)
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let comments = comment_service::get_topic_comments(db, topic_id, viewer_id).await?;

    Ok(Some(TopicResponse {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        category: row.get("category"),
        author: TopicAuthor {
            id: row.get("author_id"),
            username: row.get("username"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            reputation: row.get("reputation"),
        },
        upvotes: row.get("upvotes"),
        downvotes: row.get("downvotes"),
        vote_score: row.get("vote_score"),
        comment_count: row.get("comment_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        user_vote: row.get("user_vote"),
        is_bookmarked: row.get("is_bookmarked"),
        comments,
    }))
}

pub async fn list_topics(
    db: &PgPool,
    viewer_id: Option<Uuid>,
    query: Option<&str>,
    sort: TopicSort,
    limit: u32,
    offset: u32,
) -> Result<Vec<TopicListResponse>> {
    let mut sql = r#"
        SELECT
            t.id, t.title, t.category, t.upvotes, t.downvotes, t.vote_score,
            t.comment_count, t.created_at,
            u.id AS author_id, u.username, u.display_name, u.avatar_url, u.reputation,
            v.vote_type AS user_vote
        FROM topics t
        JOIN users u ON t.author_id = u.id
        LEFT JOIN votes v ON v.target_type = 'topic' AND v.target_id = t.id AND v.user_id = $1
        WHERE TRUE
    "#
    .to_string();

    let mut param_count = 1;

    if query.is_some() {
        param_count += 1;
        sql.push_str(&format!(
            " AND (t.title ILIKE ${0} OR t.body ILIKE ${0})",
            param_count
        ));
    }

    let order_clause = match sort {
        TopicSort::New => "t.created_at DESC",
        TopicSort::Old => "t.created_at ASC",
        TopicSort::Top => "t.vote_score DESC, t.created_at DESC",
    };

    sql.push_str(&format!(
        " ORDER BY {} LIMIT ${} OFFSET ${}",
        order_clause,
        param_count + 1,
        param_count + 2
    ));

    let mut query_builder = sqlx::query(&sql).bind(viewer_id);

    if let Some(q) = query {
        query_builder = query_builder.bind(format!("%{}%", q));
    }

    query_builder = query_builder.bind(limit as i64).bind(offset as i64);

    let rows = query_builder.fetch_all(db).await?;

    Ok(rows.into_iter().map(|row| topic_list_row(&row)).collect())
}

pub async fn count_topics(db: &PgPool, query: Option<&str>) -> Result<i64> {
    let count = if let Some(q) = query {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM topics WHERE title ILIKE $1 OR body ILIKE $1",
        )
        .bind(format!("%{}%", q))
        .fetch_one(db)
        .await?
    } else {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM topics")
            .fetch_one(db)
            .await?
    };

    Ok(count)
}

pub async fn create_topic(db: &PgPool, author_id: Uuid, req: &CreateTopicRequest) -> Result<Topic> {
    let topic = sqlx::query_as::<_, Topic>(
        r#"
        INSERT INTO topics (id, title, body, category, author_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.title.trim())
    .bind(req.body.trim())
    .bind(req.category.as_deref().unwrap_or("General"))
    .bind(author_id)
    .bind(chrono::Utc::now())
    .fetch_one(db)
    .await?;

    Ok(topic)
}

pub async fn update_topic(
    db: &PgPool,
    topic_id: Uuid,
    author_id: Uuid,
    req: &UpdateTopicRequest,
) -> Result<Topic> {
    let topic = get_topic_by_id_raw(db, topic_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".to_string()))?;

    if topic.author_id != author_id {
        return Err(AppError::Authorization(
            "You can only edit your own topics".to_string(),
        ));
    }

    let topic = sqlx::query_as::<_, Topic>(
        r#"
        UPDATE topics
        SET title = COALESCE($2, title),
            body = COALESCE($3, body),
            category = COALESCE($4, category),
            updated_at = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(topic_id)
    .bind(req.title.as_deref())
    .bind(req.body.as_deref())
    .bind(req.category.as_deref())
    .bind(chrono::Utc::now())
    .fetch_one(db)
    .await?;

    Ok(topic)
}

pub async fn delete_topic(db: &PgPool, topic_id: Uuid, author_id: Uuid) -> Result<()> {
    let topic = get_topic_by_id_raw(db, topic_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".to_string()))?;

    if topic.author_id != author_id {
        return Err(AppError::Authorization(
            "You can only delete your own topics".to_string(),
        ));
    }

    // Votes reference targets by id only, so they do not cascade with the
    // topic row; clear them so reputation recomputation sees the truth
    sqlx::query(
        r#"
        DELETE FROM votes
        WHERE target_type = 'comment'
          AND target_id IN (SELECT id FROM comments WHERE topic_id = $1)
        "#,
    )
    .bind(topic_id)
    .execute(db)
    .await?;

    sqlx::query("DELETE FROM votes WHERE target_type = 'topic' AND target_id = $1")
        .bind(topic_id)
        .execute(db)
        .await?;

    sqlx::query("DELETE FROM topics WHERE id = $1")
        .bind(topic_id)
        .execute(db)
        .await?;

    if let Err(e) = reputation_service::recompute_reputation(db, author_id).await {
        tracing::warn!(
            "Failed to recompute reputation for {} after topic delete: {}",
            author_id,
            e
        );
    }

    Ok(())
}

pub async fn bookmark_topic(db: &PgPool, user_id: Uuid, topic_id: Uuid) -> Result<()> {
    get_topic_by_id_raw(db, topic_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".to_string()))?;

    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM bookmarks WHERE user_id = $1 AND topic_id = $2",
    )
    .bind(user_id)
    .bind(topic_id)
    .fetch_optional(db)
    .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Topic already bookmarked".to_string()));
    }

    sqlx::query("INSERT INTO bookmarks (id, user_id, topic_id, created_at) VALUES ($1, $2, $3, $4)")
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(topic_id)
        .bind(chrono::Utc::now())
        .execute(db)
        .await?;

    Ok(())
}

pub async fn unbookmark_topic(db: &PgPool, user_id: Uuid, topic_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND topic_id = $2")
        .bind(user_id)
        .bind(topic_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Bookmark not found".to_string()));
    }

    Ok(())
}

pub async fn get_bookmarked_topics(
    db: &PgPool,
    user_id: Uuid,
    limit: u32,
    offset: u32,
) -> Result<Vec<TopicListResponse>> {
    let rows = sqlx::query(
        r#"
        SELECT
            t.id, t.title, t.category, t.upvotes, t.downvotes, t.vote_score,
            t.comment_count, t.created_at,
            u.id AS author_id, u.username, u.display_name, u.avatar_url, u.reputation,
            v.vote_type AS user_vote
        FROM bookmarks b
        JOIN topics t ON b.topic_id = t.id
        JOIN users u ON t.author_id = u.id
        LEFT JOIN votes v ON v.target_type = 'topic' AND v.target_id = t.id AND v.user_id = $1
        WHERE b.user_id = $1
        ORDER BY b.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(|row| topic_list_row(&row)).collect())
}

pub async fn recount_comments(db: &PgPool, topic_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE topics
        SET comment_count = (SELECT COUNT(*)::int FROM comments WHERE topic_id = $1)
        WHERE id = $1
        "#,
    )
    .bind(topic_id)
    .execute(db)
    .await?;

    Ok(())
}

fn topic_list_row(row: &sqlx::postgres::PgRow) -> TopicListResponse {
    TopicListResponse {
        id: row.get("id"),
        title: row.get("title"),
        category: row.get("category"),
        author: TopicAuthor {
            id: row.get("author_id"),
            username: row.get("username"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            reputation: row.get("reputation"),
        },
        upvotes: row.get("upvotes"),
        downvotes: row.get("downvotes"),
        vote_score: row.get("vote_score"),
        comment_count: row.get("comment_count"),
        created_at: row.get("created_at"),
        user_vote: row.get("user_vote"),
    }
}
