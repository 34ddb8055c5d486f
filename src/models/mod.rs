//! Desired-state records for the resources the reconciler manages.
//!
//! Every record pairs user intent (`for_provider`) with the last state
//! observed in InfluxDB (`at_provider`). Both halves serialize as camelCase
//! JSON so manifests and the status endpoint share one vocabulary.

pub mod bucket;
pub mod dbrp;
pub mod organization;
pub mod record;

pub use record::{
    BucketRecord, Condition, DbrpRecord, ManagedResource, OrganizationRecord, Record, ResourceKind,
};
