use std::sync::Arc;

use serde::Deserialize;

use crate::api::Api;
use crate::config::Config;
use crate::store::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub api: Arc<dyn Api>,
    pub store: Store,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn Api>) -> Self {
        Self {
            config,
            api,
            store: Store::new(),
        }
    }
}
