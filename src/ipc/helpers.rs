use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::api::ApiError;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::Needs;

pub fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Deserialize `params.<key>` into a payload type; missing key is an error.
pub fn required_obj<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, serde_json::Value> {
    let Some(raw) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {}", key), None));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("bad {}: {}", key, e), None))
}

/// Deserialize `params.filters`; absent or null means all defaults.
pub fn parse_filters<T: DeserializeOwned + Default>(
    req: &Request,
) -> Result<T, serde_json::Value> {
    match req.params.get("filters") {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(raw) => serde_json::from_value(raw.clone())
            .map_err(|e| err(&req.id, "bad_params", format!("bad filters: {}", e), None)),
    }
}

/// Fetch the collections a handler needs, turning a fetch failure into the
/// error envelope.
pub async fn prime(
    state: &mut AppState,
    req: &Request,
    needs: Needs,
) -> Result<(), serde_json::Value> {
    let api = Arc::clone(&state.api);
    state
        .store
        .prime(api.as_ref(), needs)
        .await
        .map_err(|e| api_err(req, &e))
}

pub fn api_err(req: &Request, e: &ApiError) -> serde_json::Value {
    warn!(method = %req.method, error = %e, "remote request failed");
    err(&req.id, e.code(), e.to_string(), None)
}
