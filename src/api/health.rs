use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::state::AppState;

pub async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let dispatcher = &state.dispatcher;
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "tools": dispatcher.registry().tools().len(),
        "oauth": dispatcher.oauth().is_some(),
        "helper_slots": dispatcher.bridge().available_slots()
    }))
}
