//! Service status handler

use axum::Json;
use serde_json::{json, Value};

/// GET / - Liveness message (no authentication)
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Billwise API",
        "status": "running"
    }))
}
