//! One reconciliation pass over a single record.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    controllers::ExternalClient,
    errors::ReconcileResult,
    models::{Condition, Record, ResourceKind},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Created,
    Updated,
    UpToDate,
    /// The external resource is gone; the record can be dropped.
    Deleted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reconciled {
    pub outcome: Outcome,
    /// Desired parameters were backfilled during observation.
    pub late_initialized: bool,
}

/// Drives observe / create / update / delete for records of one kind.
pub struct Reconciler<P, O> {
    kind: ResourceKind,
    external: Arc<dyn ExternalClient<P, O>>,
}

impl<P, O> Reconciler<P, O>
where
    P: Send + Sync,
    O: Send + Sync,
{
    pub fn new(kind: ResourceKind, external: Arc<dyn ExternalClient<P, O>>) -> Self {
        Self { kind, external }
    }

    /// Run one pass and record the result as the `Synced` condition. A
    /// failure leaves the record as far as it got; the next pass retries.
    pub async fn reconcile(&self, cr: &mut Record<P, O>) -> ReconcileResult<Reconciled> {
        match self.step(cr).await {
            Ok(reconciled) => {
                cr.set_condition(Condition::reconcile_success());
                Ok(reconciled)
            }
            Err(err) => {
                warn!(
                    kind = %self.kind,
                    name = %cr.name,
                    context = err.context(),
                    error = %err,
                    "reconcile failed"
                );
                cr.set_condition(Condition::reconcile_error(err.to_string()));
                Err(err)
            }
        }
    }

    async fn step(&self, cr: &mut Record<P, O>) -> ReconcileResult<Reconciled> {
        let observation = self.external.observe(cr).await?;
        let done = |outcome| Reconciled {
            outcome,
            late_initialized: observation.resource_late_initialized,
        };

        if cr.deletion_requested {
            if observation.resource_exists {
                cr.set_condition(Condition::deleting());
                self.external.delete(cr).await?;
                info!(kind = %self.kind, name = %cr.name, "deleted external resource");
            }
            return Ok(done(Outcome::Deleted));
        }

        if !observation.resource_exists {
            cr.set_condition(Condition::creating());
            self.external.create(cr).await?;
            info!(
                kind = %self.kind,
                name = %cr.name,
                external_name = %cr.external_name(),
                "created external resource"
            );
            return Ok(done(Outcome::Created));
        }

        if !observation.resource_up_to_date {
            self.external.update(cr).await?;
            info!(kind = %self.kind, name = %cr.name, "updated external resource");
            return Ok(done(Outcome::Updated));
        }

        debug!(kind = %self.kind, name = %cr.name, "external resource is up to date");
        Ok(done(Outcome::UpToDate))
    }
}
