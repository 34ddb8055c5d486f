//! Per-kind external clients: observe, create, update and delete one
//! InfluxDB resource so that it matches its record.
//!
//! Every controller is bound to a single record type through
//! [`ExternalClient`]; the runtime picks the controller by matching on
//! [`crate::models::ManagedResource`].

pub mod bucket;
pub mod dbrp;
pub mod late_init;
pub mod organization;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{
    errors::{ApiError, ReconcileError, ReconcileResult, wrap},
    models::Record,
};

pub use bucket::BucketExternal;
pub use dbrp::DbrpExternal;
pub use organization::OrganizationExternal;

/// Result of observing the external resource behind a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    /// Desired parameters were backfilled and should be persisted.
    pub resource_late_initialized: bool,
    /// No update call is needed.
    pub resource_up_to_date: bool,
}

impl ExternalObservation {
    pub fn absent() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait ExternalClient<P, O>: Send + Sync
where
    P: Send + Sync,
    O: Send + Sync,
{
    /// Fetch the external resource, refresh `at_provider`, backfill unset
    /// parameters and decide whether an update is needed.
    async fn observe(&self, cr: &mut Record<P, O>) -> ReconcileResult<ExternalObservation>;

    async fn create(&self, cr: &mut Record<P, O>) -> ReconcileResult<()>;

    async fn update(&self, cr: &mut Record<P, O>) -> ReconcileResult<()>;

    /// Delete by the stored external identity, never by name.
    async fn delete(&self, cr: &mut Record<P, O>) -> ReconcileResult<()>;
}

/// Treat a 404 from a delete call as success.
fn ignore_absent(result: Result<(), ApiError>, context: &'static str) -> Result<(), ReconcileError> {
    match result {
        Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => Ok(()),
        other => other.map_err(wrap(context)),
    }
}
