//! Minimal orchestration: keeps the records in a [`Store`], resolves
//! references and runs reconciliation passes.

pub mod reconciler;
pub mod references;
pub mod store;

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    clients::{BucketsApi, DbrpsApi, OrganizationsApi},
    controllers::{BucketExternal, DbrpExternal, OrganizationExternal},
    errors::ReconcileResult,
    models::{
        ManagedResource, ResourceKind,
        bucket::{BucketObservation, BucketParameters},
        dbrp::{DbrpObservation, DbrpParameters},
        organization::{OrganizationObservation, OrganizationParameters},
    },
};

pub use reconciler::{Outcome, Reconciled, Reconciler};
pub use references::{IdIndex, ResolveReferences};
pub use store::{Manifest, Store};

/// Referenced kinds come first so their ids are observed before the
/// records pointing at them run.
const PASS_ORDER: [ResourceKind; 3] = [
    ResourceKind::Organization,
    ResourceKind::Bucket,
    ResourceKind::DatabaseRetentionPolicyMapping,
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub created: usize,
    pub updated: usize,
    pub up_to_date: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl PassSummary {
    fn record(&mut self, result: &ReconcileResult<Reconciled>) {
        match result {
            Ok(r) => match r.outcome {
                Outcome::Created => self.created += 1,
                Outcome::Updated => self.updated += 1,
                Outcome::UpToDate => self.up_to_date += 1,
                Outcome::Deleted => self.deleted += 1,
            },
            Err(_) => self.failed += 1,
        }
    }
}

pub struct Runtime {
    organizations: Reconciler<OrganizationParameters, OrganizationObservation>,
    buckets: Reconciler<BucketParameters, BucketObservation>,
    dbrps: Reconciler<DbrpParameters, DbrpObservation>,
    store: Arc<RwLock<Store>>,
}

impl Runtime {
    pub fn new(
        organizations: Arc<dyn OrganizationsApi>,
        buckets: Arc<dyn BucketsApi>,
        dbrps: Arc<dyn DbrpsApi>,
        store: Arc<RwLock<Store>>,
    ) -> Self {
        Self {
            organizations: Reconciler::new(
                ResourceKind::Organization,
                Arc::new(OrganizationExternal::new(organizations)),
            ),
            buckets: Reconciler::new(ResourceKind::Bucket, Arc::new(BucketExternal::new(buckets))),
            dbrps: Reconciler::new(
                ResourceKind::DatabaseRetentionPolicyMapping,
                Arc::new(DbrpExternal::new(dbrps)),
            ),
            store,
        }
    }

    /// Apply `manifest` to the store. Returns whether anything changed.
    pub async fn sync(&self, manifest: Manifest) -> bool {
        let changed = self.store.write().await.apply_manifest(manifest);
        if changed {
            info!("applied new manifest");
        }
        changed
    }

    /// Reconcile every record once. Failures are recorded on the record and
    /// counted; they never stop the pass.
    pub async fn run_pass(&self) -> PassSummary {
        let mut summary = PassSummary::default();

        for kind in PASS_ORDER {
            let (batch, index) = {
                let store = self.store.read().await;
                (store.resources_of(kind), store.id_index())
            };

            let results = join_all(batch.into_iter().map(|mut resource| {
                let index = &index;
                async move {
                    let result = self.reconcile(&mut resource, index).await;
                    (resource, result)
                }
            }))
            .await;

            let mut store = self.store.write().await;
            for (resource, result) in results {
                summary.record(&result);
                match result {
                    Ok(Reconciled {
                        outcome: Outcome::Deleted,
                        ..
                    }) => {
                        store.remove(resource.kind(), resource.name());
                    }
                    _ => store.put(resource),
                }
            }
        }

        info!(
            created = summary.created,
            updated = summary.updated,
            up_to_date = summary.up_to_date,
            deleted = summary.deleted,
            failed = summary.failed,
            "reconciliation pass finished"
        );
        summary
    }

    async fn reconcile(
        &self,
        resource: &mut ManagedResource,
        index: &IdIndex,
    ) -> ReconcileResult<Reconciled> {
        match resource {
            ManagedResource::Organization(cr) => self.organizations.reconcile(cr).await,
            ManagedResource::Bucket(cr) => {
                cr.for_provider.resolve_references(index);
                self.buckets.reconcile(cr).await
            }
            ManagedResource::DatabaseRetentionPolicyMapping(cr) => {
                cr.for_provider.resolve_references(index);
                self.dbrps.reconcile(cr).await
            }
        }
    }
}
