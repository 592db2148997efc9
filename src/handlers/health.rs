use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database_up = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    Json(json!({
        "status": if database_up { "ok" } else { "degraded" },
        "database": database_up,
        "timestamp": chrono::Utc::now()
    }))
}
