//! The remote API boundary.
//!
//! Controllers talk to InfluxDB only through the per-kind traits below, so
//! tests can swap in mocks and production shares one [`InfluxClient`].
//! Absence is normalized here: [`lookup`] turns both the typed 404 and the
//! legacy `"<kind> '<name>' not found"` text into [`Lookup::NotFound`].

pub mod domain;
pub mod influxdb;

use async_trait::async_trait;
use reqwest::StatusCode;

#[cfg(test)]
use mockall::automock;

use crate::{errors::ApiError, models::ResourceKind};
use domain::{Bucket, Dbrp, DbrpCreate, DbrpQuery, DbrpUpdate, Dbrps, Organization};

pub use influxdb::InfluxClient;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait OrganizationsApi: Send + Sync {
    /// Fails with `organization '<name>' not found` when no organization
    /// has that exact name.
    async fn find_organization_by_name(&self, name: &str) -> Result<Organization, ApiError>;

    async fn create_organization(&self, org: &Organization) -> Result<Organization, ApiError>;

    async fn update_organization(&self, org: &Organization) -> Result<Organization, ApiError>;

    async fn delete_organization(&self, id: &str) -> Result<(), ApiError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait BucketsApi: Send + Sync {
    /// Fails with `bucket '<name>' not found` when no bucket has that exact
    /// name.
    async fn find_bucket_by_name(&self, name: &str) -> Result<Bucket, ApiError>;

    async fn create_bucket(&self, bucket: &Bucket) -> Result<Bucket, ApiError>;

    async fn update_bucket(&self, bucket: &Bucket) -> Result<Bucket, ApiError>;

    async fn delete_bucket(&self, id: &str) -> Result<(), ApiError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait DbrpsApi: Send + Sync {
    async fn get_dbrps(&self, query: &DbrpQuery) -> Result<Dbrps, ApiError>;

    async fn post_dbrp(&self, body: &DbrpCreate) -> Result<Dbrp, ApiError>;

    async fn patch_dbrp(&self, id: &str, org_id: &str, body: &DbrpUpdate)
    -> Result<Dbrp, ApiError>;

    async fn delete_dbrp(&self, id: &str, org_id: &str) -> Result<(), ApiError>;
}

/// Outcome of a fetch once absence has been separated from failure.
#[derive(Debug, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

/// Classify the result of a fetch of the `kind` resource called `name`.
/// Absence becomes `Ok(Lookup::NotFound)`; every other error is returned
/// unchanged.
pub fn lookup<T>(
    result: Result<T, ApiError>,
    kind: ResourceKind,
    name: &str,
) -> Result<Lookup<T>, ApiError> {
    match result {
        Ok(value) => Ok(Lookup::Found(value)),
        Err(err) if is_not_found(&err, kind, name) => Ok(Lookup::NotFound),
        Err(err) => Err(err),
    }
}

/// True for a typed 404 or for an error whose text contains
/// `<kind> '<name>' not found`.
pub fn is_not_found(err: &ApiError, kind: ResourceKind, name: &str) -> bool {
    if err.status() == Some(StatusCode::NOT_FOUND) {
        return true;
    }
    err.to_string()
        .contains(&format!("{} '{}' not found", kind.noun(), name))
}
