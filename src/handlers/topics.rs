use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::{AppError, Result},
    models::{
        CreateReportRequest, CreateTopicRequest, ListTopicsQuery, TargetType, UpdateTopicRequest,
        VoteRequest, VoteResponse,
    },
    services::{moderation_service, topic_service, vote_service},
};

pub async fn list_topics(
    State(state): State<AppState>,
    OptionalAuthUser(auth_user): OptionalAuthUser,
    Query(params): Query<ListTopicsQuery>,
) -> Result<Json<Value>> {
    let limit = params.limit.unwrap_or(25).min(100);
    let offset = params.offset.unwrap_or(0);
    let viewer_id = auth_user.map(|u| u.user_id);

    let topics = topic_service::list_topics(
        &state.db,
        viewer_id,
        params.query.as_deref(),
        params.sort,
        limit,
        offset,
    )
    .await?;

    let total = topic_service::count_topics(&state.db, params.query.as_deref()).await?;

    Ok(Json(json!({
        "topics": topics,
        "total": total
    })))
}

pub async fn get_topic(
    State(state): State<AppState>,
    OptionalAuthUser(auth_user): OptionalAuthUser,
    Path(topic_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let viewer_id = auth_user.map(|u| u.user_id);

    let topic = topic_service::get_topic(&state.db, topic_id, viewer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".to_string()))?;

    Ok(Json(json!({ "topic": topic })))
}

pub async fn create_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateTopicRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;
    moderation_service::reject_if_spam(&payload.title)?;
    moderation_service::reject_if_spam(&payload.body)?;

    // 20 new topics per hour
    let rate_limit_key = format!("create_topic:{}", auth_user.user_id);
    if !state
        .redis
        .check_rate_limit(&rate_limit_key, 20, 3600)
        .await?
    {
        return Err(AppError::RateLimit);
    }

    let topic = topic_service::create_topic(&state.db, auth_user.user_id, &payload).await?;

    Ok(Json(json!({ "topic": topic })))
}

pub async fn update_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(topic_id): Path<Uuid>,
    Json(payload): Json<UpdateTopicRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;

    if let Some(body) = &payload.body {
        moderation_service::reject_if_spam(body)?;
    }

    let topic =
        topic_service::update_topic(&state.db, topic_id, auth_user.user_id, &payload).await?;

    Ok(Json(json!({ "topic": topic })))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(topic_id): Path<Uuid>,
) -> Result<Json<Value>> {
    topic_service::delete_topic(&state.db, topic_id, auth_user.user_id).await?;

    Ok(Json(json!({
        "message": "Topic deleted successfully"
    })))
}

pub async fn vote_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(topic_id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    // 100 votes per hour across all targets
    let rate_limit_key = format!("vote:{}", auth_user.user_id);
    if !state
        .redis
        .check_rate_limit(&rate_limit_key, 100, 3600)
        .await?
    {
        return Err(AppError::RateLimit);
    }

    let outcome = vote_service::cast_vote(
        &state.db,
        auth_user.user_id,
        TargetType::Topic,
        topic_id,
        payload.vote_type,
    )
    .await?;

    let (upvotes, downvotes, vote_score) = sqlx::query_as::<_, (i32, i32, i32)>(
        "SELECT upvotes, downvotes, vote_score FROM topics WHERE id = $1",
    )
    .bind(topic_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(VoteResponse {
        success: true,
        action: outcome.action,
        vote: outcome.vote,
        upvotes,
        downvotes,
        vote_score,
    }))
}

// Tally plus the caller's own vote, for rendering vote controls
pub async fn get_topic_votes(
    State(state): State<AppState>,
    OptionalAuthUser(auth_user): OptionalAuthUser,
    Path(topic_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let topic = topic_service::get_topic_by_id_raw(&state.db, topic_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".to_string()))?;

    let user_vote = match auth_user {
        Some(user) => Some(
            vote_service::get_user_vote(&state.db, user.user_id, TargetType::Topic, topic_id)
                .await?,
        ),
        None => None,
    };

    Ok(Json(json!({
        "upvotes": topic.upvotes,
        "downvotes": topic.downvotes,
        "vote_score": topic.vote_score,
        "user_vote": user_vote
    })))
}

pub async fn bookmark_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(topic_id): Path<Uuid>,
) -> Result<Json<Value>> {
    topic_service::bookmark_topic(&state.db, auth_user.user_id, topic_id).await?;

    Ok(Json(json!({
        "message": "Topic bookmarked successfully"
    })))
}

pub async fn unbookmark_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(topic_id): Path<Uuid>,
) -> Result<Json<Value>> {
    topic_service::unbookmark_topic(&state.db, auth_user.user_id, topic_id).await?;

    Ok(Json(json!({
        "message": "Bookmark removed successfully"
    })))
}

#[derive(Debug, serde::Deserialize)]
pub struct BookmarksQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn get_bookmarks(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<BookmarksQuery>,
) -> Result<Json<Value>> {
    let limit = params.limit.unwrap_or(25).min(100);
    let offset = params.offset.unwrap_or(0);

    let topics =
        topic_service::get_bookmarked_topics(&state.db, auth_user.user_id, limit, offset).await?;

    Ok(Json(json!({ "topics": topics })))
}

pub async fn report_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(topic_id): Path<Uuid>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;

    moderation_service::create_report(
        &state.db,
        auth_user.user_id,
        TargetType::Topic,
        topic_id,
        &payload.reason,
        payload.details.as_deref(),
    )
    .await?;

    Ok(Json(json!({
        "message": "Report submitted successfully"
    })))
}
