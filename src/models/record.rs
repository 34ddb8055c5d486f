//! The generic managed record and its status conditions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    bucket::{BucketObservation, BucketParameters},
    dbrp::{DbrpObservation, DbrpParameters},
    organization::{OrganizationObservation, OrganizationParameters},
};

/// The three kinds of external resource this reconciler drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Organization,
    Bucket,
    DatabaseRetentionPolicyMapping,
}

impl ResourceKind {
    /// Noun InfluxDB uses for this kind in its error messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Bucket => "bucket",
            Self::DatabaseRetentionPolicyMapping => "dbrp",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Organization => "Organization",
            Self::Bucket => "Bucket",
            Self::DatabaseRetentionPolicyMapping => "DatabaseRetentionPolicyMapping",
        };
        f.write_str(name)
    }
}

/// Points at another record by name. The target's external id is filled in
/// by the runtime before the referencing record is reconciled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionType {
    Ready,
    Synced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionReason {
    Available,
    Unavailable,
    Creating,
    Deleting,
    ReconcileSuccess,
    ReconcileError,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub status: ConditionStatus,
    pub reason: ConditionReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    fn new(kind: ConditionType, status: ConditionStatus, reason: ConditionReason) -> Self {
        Self {
            kind,
            status,
            reason,
            message: None,
            last_transition_time: Utc::now(),
        }
    }

    /// The external resource exists and is usable.
    pub fn available() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::True, ConditionReason::Available)
    }

    /// The external resource exists but reports itself as not usable.
    pub fn unavailable() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Unavailable)
    }

    pub fn creating() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Creating)
    }

    pub fn deleting() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Deleting)
    }

    pub fn reconcile_success() -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::True,
            ConditionReason::ReconcileSuccess,
        )
    }

    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(
                ConditionType::Synced,
                ConditionStatus::False,
                ConditionReason::ReconcileError,
            )
        }
    }

    /// Same type, status, reason and message; transition time ignored.
    fn equivalent(&self, other: &Condition) -> bool {
        self.kind == other.kind
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// A desired-state record: user parameters plus the state observed in
/// InfluxDB.
///
/// `external_name` is the identity annotation. Organizations and buckets use
/// it as the lookup name; mappings store their server-assigned id in it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<P, O> {
    pub name: String,
    #[serde(default)]
    pub external_name: String,
    #[serde(default)]
    pub deletion_requested: bool,
    pub for_provider: P,
    #[serde(default)]
    pub at_provider: O,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl<P, O: Default> Record<P, O> {
    pub fn new(name: impl Into<String>, for_provider: P) -> Self {
        Self {
            name: name.into(),
            external_name: String::new(),
            deletion_requested: false,
            for_provider,
            at_provider: O::default(),
            conditions: Vec::new(),
        }
    }

    pub fn with_external_name(mut self, external_name: impl Into<String>) -> Self {
        self.external_name = external_name.into();
        self
    }
}

impl<P, O> Record<P, O> {
    pub fn external_name(&self) -> &str {
        &self.external_name
    }

    pub fn set_external_name(&mut self, external_name: impl Into<String>) {
        self.external_name = external_name.into();
    }

    /// Replace the condition of the same type. An unchanged condition keeps
    /// its original transition time.
    pub fn set_condition(&mut self, condition: Condition) {
        match self.conditions.iter_mut().find(|c| c.kind == condition.kind) {
            Some(existing) if existing.equivalent(&condition) => {}
            Some(existing) => *existing = condition,
            None => self.conditions.push(condition),
        }
    }

    #[cfg(test)]
    pub fn condition(&self, kind: ConditionType) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.kind == kind)
    }
}

pub type OrganizationRecord = Record<OrganizationParameters, OrganizationObservation>;
pub type BucketRecord = Record<BucketParameters, BucketObservation>;
pub type DbrpRecord = Record<DbrpParameters, DbrpObservation>;

/// Any record the runtime manages. Each controller is bound to exactly one
/// variant, so dispatch happens by `match` instead of a runtime downcast.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum ManagedResource {
    Organization(OrganizationRecord),
    Bucket(BucketRecord),
    DatabaseRetentionPolicyMapping(DbrpRecord),
}

impl ManagedResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Organization(_) => ResourceKind::Organization,
            Self::Bucket(_) => ResourceKind::Bucket,
            Self::DatabaseRetentionPolicyMapping(_) => ResourceKind::DatabaseRetentionPolicyMapping,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Organization(r) => &r.name,
            Self::Bucket(r) => &r.name,
            Self::DatabaseRetentionPolicyMapping(r) => &r.name,
        }
    }

    pub fn external_name(&self) -> &str {
        match self {
            Self::Organization(r) => r.external_name(),
            Self::Bucket(r) => r.external_name(),
            Self::DatabaseRetentionPolicyMapping(r) => r.external_name(),
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        match self {
            Self::Organization(r) => &r.conditions,
            Self::Bucket(r) => &r.conditions,
            Self::DatabaseRetentionPolicyMapping(r) => &r.conditions,
        }
    }

    pub fn deletion_requested(&self) -> bool {
        match self {
            Self::Organization(r) => r.deletion_requested,
            Self::Bucket(r) => r.deletion_requested,
            Self::DatabaseRetentionPolicyMapping(r) => r.deletion_requested,
        }
    }

    pub fn request_deletion(&mut self) {
        match self {
            Self::Organization(r) => r.deletion_requested = true,
            Self::Bucket(r) => r.deletion_requested = true,
            Self::DatabaseRetentionPolicyMapping(r) => r.deletion_requested = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_condition_replaces_same_type_only() {
        let mut record = OrganizationRecord::new("org", OrganizationParameters::default());
        record.set_condition(Condition::creating());
        record.set_condition(Condition::reconcile_success());
        record.set_condition(Condition::available());

        assert_eq!(record.conditions.len(), 2);
        assert_eq!(
            record.condition(ConditionType::Ready).map(|c| c.reason),
            Some(ConditionReason::Available)
        );
        assert_eq!(
            record.condition(ConditionType::Synced).map(|c| c.reason),
            Some(ConditionReason::ReconcileSuccess)
        );
    }

    #[test]
    fn unchanged_condition_keeps_transition_time() {
        let mut record = OrganizationRecord::new("org", OrganizationParameters::default());
        record.set_condition(Condition::available());
        let first = record.conditions[0].last_transition_time;

        let mut later = Condition::available();
        later.last_transition_time = first + chrono::Duration::seconds(30);
        record.set_condition(later);

        assert_eq!(record.conditions[0].last_transition_time, first);
    }

    #[test]
    fn reconcile_error_carries_message() {
        let mut record = DbrpRecord::new("map", DbrpParameters::default());
        record.set_condition(Condition::reconcile_error("cannot get dbrp: boom"));
        let synced = record.condition(ConditionType::Synced).cloned();
        assert_eq!(
            synced.and_then(|c| c.message),
            Some("cannot get dbrp: boom".to_string())
        );
    }
}
