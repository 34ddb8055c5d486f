//! Defines the status routes served next to the reconciliation loop.
//!
//! - `GET /healthz`   -> liveness
//! - `GET /readyz`    -> readiness (InfluxDB reachable, manifest loaded)
//! - `GET /resources` -> records with their conditions

use crate::handlers::{
    AppState,
    health_handlers::{healthz, readyz},
    resource_handlers::list_resources,
};
use axum::{Router, routing::get};

/// Build the router. Handlers share [`AppState`].
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/resources", get(list_resources))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clients::InfluxClient, runtime::Store};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn app(influx: &MockServer, store: Store) -> Router {
        routes().with_state(AppState {
            store: Arc::new(RwLock::new(store)),
            influx: InfluxClient::new(&influx.uri(), None),
        })
    }

    #[tokio::test]
    async fn healthz_is_always_ok() {
        let influx = MockServer::start().await;
        let (status, body) = get_json(app(&influx, Store::new()), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readyz_needs_manifest_and_influx() {
        let influx = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&influx)
            .await;

        let (status, body) = get_json(app(&influx, Store::new()), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["influxdb"]["ok"], true);
        assert_eq!(body["checks"]["manifest"]["ok"], false);

        let mut store = Store::new();
        store.apply_manifest(serde_json::from_str(r#"{"resources": []}"#).unwrap());
        let (status, body) = get_json(app(&influx, store), "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn resources_lists_records() {
        let influx = MockServer::start().await;
        let mut store = Store::new();
        store.apply_manifest(
            serde_json::from_str(
                r#"{"resources": [{"kind": "Bucket", "name": "metrics", "forProvider": {}}]}"#,
            )
            .unwrap(),
        );

        let (status, body) = get_json(app(&influx, store), "/resources").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["kind"], "Bucket");
        assert_eq!(body[0]["externalName"], "metrics");
        assert_eq!(body[0]["deletionRequested"], false);
    }
}
