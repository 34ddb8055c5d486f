//! In-memory record store, fed from a JSON manifest of desired resources.
//!
//! Manifest format:
//!
//! ```json
//! {"resources": [
//!   {"kind": "Organization", "name": "acme", "forProvider": {"description": "tenant"}},
//!   {"kind": "Bucket", "name": "metrics", "forProvider": {"orgIDRef": {"name": "acme"}}}
//! ]}
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};
use tokio::fs;

use super::references::IdIndex;
use crate::models::{
    ManagedResource, Record, ResourceKind, bucket::BucketParameters, dbrp::DbrpParameters,
    organization::OrganizationParameters,
};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<ManifestEntry>,
}

impl Manifest {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("reading manifest {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing manifest {}", path.display()))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind")]
pub enum ManifestEntry {
    Organization(Desired<OrganizationParameters>),
    Bucket(Desired<BucketParameters>),
    #[serde(alias = "DBRP")]
    DatabaseRetentionPolicyMapping(Desired<DbrpParameters>),
}

/// One desired resource as written in the manifest.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Desired<P> {
    pub name: String,
    /// Overrides the external-name annotation.
    #[serde(default)]
    pub external_name: Option<String>,
    pub for_provider: P,
}

impl<P: Clone> Desired<P> {
    /// Fresh record. Organizations and buckets are looked up by name, so
    /// their external name defaults to the record name; a mapping gets its
    /// identity on create.
    fn into_record<O: Default>(self, named_by_record: bool) -> Record<P, O> {
        let external_name = match self.external_name {
            Some(name) => name,
            None if named_by_record => self.name.clone(),
            None => String::new(),
        };
        Record::new(self.name, self.for_provider).with_external_name(external_name)
    }

    /// Push new desired parameters into an existing record, keeping its
    /// observed state and identity.
    fn refresh<O>(&self, record: &mut Record<P, O>) {
        record.for_provider = self.for_provider.clone();
        if let Some(name) = &self.external_name {
            record.set_external_name(name.clone());
        }
        record.deletion_requested = false;
    }
}

impl ManifestEntry {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Organization(_) => ResourceKind::Organization,
            Self::Bucket(_) => ResourceKind::Bucket,
            Self::DatabaseRetentionPolicyMapping(_) => ResourceKind::DatabaseRetentionPolicyMapping,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Organization(d) => &d.name,
            Self::Bucket(d) => &d.name,
            Self::DatabaseRetentionPolicyMapping(d) => &d.name,
        }
    }

    fn into_resource(self) -> ManagedResource {
        match self {
            Self::Organization(d) => ManagedResource::Organization(d.into_record(true)),
            Self::Bucket(d) => ManagedResource::Bucket(d.into_record(true)),
            Self::DatabaseRetentionPolicyMapping(d) => {
                ManagedResource::DatabaseRetentionPolicyMapping(d.into_record(false))
            }
        }
    }

    /// Returns false when `resource` is of another kind.
    fn refresh(&self, resource: &mut ManagedResource) -> bool {
        match (self, resource) {
            (Self::Organization(d), ManagedResource::Organization(r)) => d.refresh(r),
            (Self::Bucket(d), ManagedResource::Bucket(r)) => d.refresh(r),
            (
                Self::DatabaseRetentionPolicyMapping(d),
                ManagedResource::DatabaseRetentionPolicyMapping(r),
            ) => d.refresh(r),
            _ => return false,
        }
        true
    }
}

type Key = (ResourceKind, String);

/// Records keyed by kind and name.
#[derive(Debug, Default)]
pub struct Store {
    records: BTreeMap<Key, ManagedResource>,
    manifest: Option<Manifest>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest_loaded(&self) -> bool {
        self.manifest.is_some()
    }

    /// Make the store match `manifest`. New entries become records, listed
    /// records take the new parameters and unlisted ones are marked for
    /// deletion. Returns false, touching nothing, if the manifest is the one
    /// already applied.
    pub fn apply_manifest(&mut self, manifest: Manifest) -> bool {
        if self.manifest.as_ref() == Some(&manifest) {
            return false;
        }

        let listed: Vec<Key> = manifest
            .resources
            .iter()
            .map(|e| (e.kind(), e.name().to_string()))
            .collect();
        for (key, resource) in self.records.iter_mut() {
            if !listed.contains(key) {
                resource.request_deletion();
            }
        }

        for entry in manifest.resources.iter().cloned() {
            let key = (entry.kind(), entry.name().to_string());
            if let Some(existing) = self.records.get_mut(&key) {
                if entry.refresh(existing) {
                    continue;
                }
            }
            self.records.insert(key, entry.into_resource());
        }

        self.manifest = Some(manifest);
        true
    }

    pub fn records(&self) -> impl Iterator<Item = &ManagedResource> {
        self.records.values()
    }

    /// Snapshot of every record of `kind`.
    pub fn resources_of(&self, kind: ResourceKind) -> Vec<ManagedResource> {
        self.records
            .values()
            .filter(|r| r.kind() == kind)
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<&ManagedResource> {
        self.records.get(&(kind, name.to_string()))
    }

    pub fn put(&mut self, resource: ManagedResource) {
        let key = (resource.kind(), resource.name().to_string());
        self.records.insert(key, resource);
    }

    pub fn remove(&mut self, kind: ResourceKind, name: &str) -> Option<ManagedResource> {
        self.records.remove(&(kind, name.to_string()))
    }

    pub fn id_index(&self) -> IdIndex {
        IdIndex::from_records(self.records.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(json: &str) -> Manifest {
        serde_json::from_str(json).unwrap()
    }

    const BASE: &str = r#"{"resources": [
        {"kind": "Organization", "name": "acme", "forProvider": {"description": "tenant"}},
        {"kind": "Bucket", "name": "metrics", "forProvider": {"orgIDRef": {"name": "acme"}}},
        {"kind": "DBRP", "name": "telegraf", "forProvider": {"database": "telegraf", "retentionPolicy": "autogen"}}
    ]}"#;

    #[test]
    fn new_records_get_default_external_names() {
        let mut store = Store::new();
        assert!(!store.manifest_loaded());
        assert!(store.apply_manifest(manifest(BASE)));
        assert!(store.manifest_loaded());

        let external = |kind, name| store.get(kind, name).map(|r| r.external_name().to_string());
        assert_eq!(external(ResourceKind::Organization, "acme").as_deref(), Some("acme"));
        assert_eq!(external(ResourceKind::Bucket, "metrics").as_deref(), Some("metrics"));
        assert_eq!(
            external(ResourceKind::DatabaseRetentionPolicyMapping, "telegraf").as_deref(),
            Some("")
        );
    }

    #[test]
    fn unchanged_manifest_is_not_reapplied() {
        let mut store = Store::new();
        assert!(store.apply_manifest(manifest(BASE)));

        if let Some(ManagedResource::Organization(mut org)) =
            store.get(ResourceKind::Organization, "acme").cloned()
        {
            org.at_provider.id = "0a1b".into();
            store.put(ManagedResource::Organization(org));
        }
        assert!(!store.apply_manifest(manifest(BASE)));
        assert_eq!(store.id_index().organization_id("acme"), "0a1b");
    }

    #[test]
    fn changed_entries_keep_identity_and_unlisted_are_marked() {
        let mut store = Store::new();
        store.apply_manifest(manifest(BASE));
        if let Some(ManagedResource::DatabaseRetentionPolicyMapping(mut dbrp)) = store
            .get(ResourceKind::DatabaseRetentionPolicyMapping, "telegraf")
            .cloned()
        {
            dbrp.set_external_name("abc123");
            store.put(ManagedResource::DatabaseRetentionPolicyMapping(dbrp));
        }

        let changed = manifest(
            r#"{"resources": [
                {"kind": "Organization", "name": "acme", "forProvider": {"description": "renamed"}},
                {"kind": "DatabaseRetentionPolicyMapping", "name": "telegraf", "forProvider": {"database": "telegraf", "retentionPolicy": "weekly"}}
            ]}"#,
        );
        assert!(store.apply_manifest(changed));

        match store.get(ResourceKind::Organization, "acme") {
            Some(ManagedResource::Organization(org)) => {
                assert_eq!(org.for_provider.description.as_deref(), Some("renamed"));
                assert!(!org.deletion_requested);
            }
            other => panic!("unexpected record {other:?}"),
        }
        match store.get(ResourceKind::DatabaseRetentionPolicyMapping, "telegraf") {
            Some(ManagedResource::DatabaseRetentionPolicyMapping(dbrp)) => {
                assert_eq!(dbrp.external_name(), "abc123");
                assert_eq!(dbrp.for_provider.retention_policy, "weekly");
            }
            other => panic!("unexpected record {other:?}"),
        }
        let bucket = store.get(ResourceKind::Bucket, "metrics");
        assert!(bucket.is_some_and(ManagedResource::deletion_requested));
    }

    #[test]
    fn relisting_cancels_deletion() {
        let mut store = Store::new();
        store.apply_manifest(manifest(BASE));
        store.apply_manifest(Manifest::default());
        assert!(store.records().all(ManagedResource::deletion_requested));

        store.apply_manifest(manifest(BASE));
        assert!(store.records().all(|r| !r.deletion_requested()));
    }

    #[test]
    fn explicit_external_name_wins() {
        let mut store = Store::new();
        store.apply_manifest(manifest(
            r#"{"resources": [{"kind": "Bucket", "name": "metrics", "externalName": "prod-metrics", "forProvider": {}}]}"#,
        ));
        assert_eq!(
            store.get(ResourceKind::Bucket, "metrics").map(ManagedResource::external_name),
            Some("prod-metrics")
        );
    }

    #[test]
    fn resources_of_filters_by_kind() {
        let mut store = Store::new();
        store.apply_manifest(manifest(BASE));
        let buckets = store.resources_of(ResourceKind::Bucket);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].name(), "metrics");

        assert!(store.remove(ResourceKind::Bucket, "metrics").is_some());
        assert!(store.resources_of(ResourceKind::Bucket).is_empty());
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = Manifest::load("/nonexistent/resources.json").await.unwrap_err();
        assert!(err.to_string().contains("reading manifest"));
    }
}
