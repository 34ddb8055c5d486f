//! Status of the managed records.

use super::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::models::{Condition, ResourceKind};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    pub kind: ResourceKind,
    pub name: String,
    pub external_name: String,
    pub deletion_requested: bool,
    pub conditions: Vec<Condition>,
}

/// `GET /resources`
///
/// Every record with its identity and conditions, ordered by kind and name.
pub async fn list_resources(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;
    let resources: Vec<ResourceStatus> = store
        .records()
        .map(|r| ResourceStatus {
            kind: r.kind(),
            name: r.name().to_string(),
            external_name: r.external_name().to_string(),
            deletion_requested: r.deletion_requested(),
            conditions: r.conditions().to_vec(),
        })
        .collect();
    Json(resources)
}
