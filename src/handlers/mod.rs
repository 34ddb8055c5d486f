pub mod health_handlers;
pub mod resource_handlers;

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{clients::InfluxClient, runtime::Store};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<Store>>,
    pub influx: InfluxClient,
}
