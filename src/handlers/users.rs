use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{User, UserProfileResponse},
    services::{badge_service, reputation_service},
};

#[derive(Debug, serde::Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Response> {
    let limit = params.limit.unwrap_or(50).min(100);
    let offset = params.offset.unwrap_or(0);

    // Rankings tolerate a short staleness window
    let cache_key = format!("leaderboard:{}:{}", limit, offset);
    if let Some(cached) = state.redis.cache_get(&cache_key).await? {
        return Ok(([(header::CONTENT_TYPE, "application/json")], cached).into_response());
    }

    let users = reputation_service::get_leaderboard(&state.db, limit, offset).await?;

    let body = json!({
        "users": users,
        "total": users.len()
    })
    .to_string();

    if let Err(e) = state.redis.cache_set(&cache_key, &body, 300).await {
        tracing::warn!("Failed to cache leaderboard: {}", e);
    }

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let (topic_count, comment_count) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM topics WHERE author_id = $1),
            (SELECT COUNT(*) FROM comments WHERE author_id = $1)
        "#,
    )
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    let badges = badge_service::get_user_badges(&state.db, user.id).await?;

    let profile = UserProfileResponse {
        user: user.into(),
        topic_count,
        comment_count,
        badges,
    };

    Ok(Json(json!({ "user": profile })))
}

#[derive(Debug, serde::Deserialize)]
pub struct BadgesQuery {
    pub user_id: Option<Uuid>,
}

// Full catalog, or one user's awards when user_id is given
pub async fn list_badges(
    State(state): State<AppState>,
    Query(params): Query<BadgesQuery>,
) -> Result<Json<Value>> {
    if let Some(user_id) = params.user_id {
        let badges = badge_service::get_user_badges(&state.db, user_id).await?;
        return Ok(Json(json!({ "badges": badges })));
    }

    let badges = badge_service::list_badges(&state.db).await?;

    Ok(Json(json!({ "badges": badges })))
}
