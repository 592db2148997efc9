use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    models::{DeleteNotificationsRequest, ListNotificationsQuery, MarkNotificationsReadRequest},
    services::notification_service,
};

pub async fn get_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<ListNotificationsQuery>,
) -> Result<Json<Value>> {
    let limit = params.limit.unwrap_or(20).min(100);
    let offset = params.offset.unwrap_or(0);

    let response = notification_service::get_notifications(
        &state.db,
        auth_user.user_id,
        limit,
        offset,
        params.unread_only,
    )
    .await?;

    Ok(Json(json!(response)))
}

pub async fn unread_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>> {
    let unread = notification_service::unread_count(&state.db, auth_user.user_id).await?;

    Ok(Json(json!({ "unread": unread })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<MarkNotificationsReadRequest>,
) -> Result<Json<Value>> {
    let updated = notification_service::mark_read(
        &state.db,
        auth_user.user_id,
        payload.notification_ids.as_deref(),
    )
    .await?;

    Ok(Json(json!({ "updated": updated })))
}

pub async fn delete_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<DeleteNotificationsRequest>,
) -> Result<Json<Value>> {
    let deleted = notification_service::delete_notifications(
        &state.db,
        auth_user.user_id,
        &payload.notification_ids,
    )
    .await?;

    Ok(Json(json!({ "deleted": deleted })))
}
