use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_ping(req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

fn handle_config_get(state: &AppState, req: &Request) -> serde_json::Value {
    match serde_json::to_value(&state.config) {
        Ok(cfg) => ok(&req.id, cfg),
        Err(e) => err(&req.id, "api_error", format!("{e}"), None),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "ping" => Some(handle_ping(req)),
        "config.get" => Some(handle_config_get(state, req)),
        _ => None,
    }
}
