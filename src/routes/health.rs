use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::{AppState, database, error::Result};

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready once the database answers.
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<Value>> {
    database::check_health(&state.db).await?;

    Ok(Json(json!({
        "status": "ready",
        "database": "connected"
    })))
}
