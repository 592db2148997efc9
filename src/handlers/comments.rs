use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::{AppError, Result},
    models::{
        CreateCommentRequest, CreateReportRequest, TargetType, UpdateCommentRequest, VoteRequest,
        VoteResponse,
    },
    services::{comment_service, moderation_service, vote_service},
};

pub async fn get_topic_comments(
    State(state): State<AppState>,
    OptionalAuthUser(auth_user): OptionalAuthUser,
    Path(topic_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let viewer_id = auth_user.map(|u| u.user_id);

    let comments = comment_service::get_topic_comments(&state.db, topic_id, viewer_id).await?;

    Ok(Json(json!({ "comments": comments })))
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(topic_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;
    moderation_service::reject_if_spam(&payload.body)?;

    // 60 comments per hour
    let rate_limit_key = format!("create_comment:{}", auth_user.user_id);
    if !state
        .redis
        .check_rate_limit(&rate_limit_key, 60, 3600)
        .await?
    {
        return Err(AppError::RateLimit);
    }

    let comment = comment_service::create_comment(
        &state.db,
        topic_id,
        auth_user.user_id,
        &auth_user.username,
        &payload.body,
    )
    .await?;

    Ok(Json(json!({ "comment": comment })))
}

pub async fn update_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;
    moderation_service::reject_if_spam(&payload.body)?;

    let comment =
        comment_service::update_comment(&state.db, comment_id, auth_user.user_id, &payload.body)
            .await?;

    Ok(Json(json!({ "comment": comment })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<Value>> {
    comment_service::delete_comment(&state.db, comment_id, auth_user.user_id).await?;

    Ok(Json(json!({
        "message": "Comment deleted successfully"
    })))
}

pub async fn vote_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    // Votes share one budget regardless of target type
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
        TargetType::Comment,
        comment_id,
        payload.vote_type,
    )
    .await?;

    let (upvotes, downvotes, vote_score) = sqlx::query_as::<_, (i32, i32, i32)>(
        "SELECT upvotes, downvotes, vote_score FROM comments WHERE id = $1",
    )
    .bind(comment_id)
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

pub async fn report_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;

    moderation_service::create_report(
        &state.db,
        auth_user.user_id,
        TargetType::Comment,
        comment_id,
        &payload.reason,
        payload.details.as_deref(),
    )
    .await?;

    Ok(Json(json!({
        "message": "Report submitted successfully"
    })))
}
