//! Cross-record references: a bucket names its organization, a mapping its
//! bucket and organization. The referenced record's observed id is filled in
//! before the referencing record is reconciled.

use std::collections::HashMap;

use crate::models::{
    ManagedResource, ResourceKind, bucket::BucketParameters, dbrp::DbrpParameters,
};

/// Observed external ids of the records that can be referenced.
#[derive(Clone, Debug, Default)]
pub struct IdIndex {
    ids: HashMap<(ResourceKind, String), String>,
}

impl IdIndex {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ManagedResource>) -> Self {
        let mut index = Self::default();
        for record in records {
            match record {
                ManagedResource::Organization(r) => {
                    index.insert(ResourceKind::Organization, &r.name, &r.at_provider.id)
                }
                ManagedResource::Bucket(r) => {
                    index.insert(ResourceKind::Bucket, &r.name, &r.at_provider.id)
                }
                ManagedResource::DatabaseRetentionPolicyMapping(_) => {}
            }
        }
        index
    }

    pub fn insert(&mut self, kind: ResourceKind, name: &str, id: &str) {
        if !id.is_empty() {
            self.ids.insert((kind, name.to_string()), id.to_string());
        }
    }

    /// Id of the `kind` record called `name`, or an empty string while it
    /// is unknown or not created yet.
    pub fn extract_id(&self, kind: ResourceKind, name: &str) -> String {
        self.ids
            .get(&(kind, name.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn organization_id(&self, name: &str) -> String {
        self.extract_id(ResourceKind::Organization, name)
    }

    pub fn bucket_id(&self, name: &str) -> String {
        self.extract_id(ResourceKind::Bucket, name)
    }
}

/// Parameters that may point at other records.
pub trait ResolveReferences {
    /// Fill referenced fields that are still unset. An unresolved target
    /// leaves an empty value, which is sent to the server as is.
    fn resolve_references(&mut self, index: &IdIndex);
}

impl ResolveReferences for BucketParameters {
    fn resolve_references(&mut self, index: &IdIndex) {
        let Some(reference) = &self.org_id_ref else {
            return;
        };
        if self.org_id.as_deref().unwrap_or_default().is_empty() {
            self.org_id = Some(index.organization_id(&reference.name));
        }
    }
}

impl ResolveReferences for DbrpParameters {
    fn resolve_references(&mut self, index: &IdIndex) {
        if let Some(reference) = &self.bucket_id_ref {
            if self.bucket_id.is_empty() {
                self.bucket_id = index.bucket_id(&reference.name);
            }
        }
        if let Some(reference) = &self.org_id_ref {
            if self.org_id.is_empty() {
                self.org_id = index.organization_id(&reference.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BucketRecord, OrganizationRecord, record::Reference};

    fn index() -> IdIndex {
        let mut org = OrganizationRecord::new("acme", Default::default());
        org.at_provider.id = "0a1b".into();
        let mut bucket = BucketRecord::new("metrics", Default::default());
        bucket.at_provider.id = "b1".into();
        let pending = OrganizationRecord::new("pending", Default::default());

        IdIndex::from_records(&[
            ManagedResource::Organization(org),
            ManagedResource::Bucket(bucket),
            ManagedResource::Organization(pending),
        ])
    }

    fn reference(name: &str) -> Option<Reference> {
        Some(Reference { name: name.into() })
    }

    #[test]
    fn extracts_ids_by_kind() {
        let index = index();
        assert_eq!(index.organization_id("acme"), "0a1b");
        assert_eq!(index.bucket_id("metrics"), "b1");
        assert_eq!(index.bucket_id("acme"), "");
        assert_eq!(index.organization_id("pending"), "");
    }

    #[test]
    fn bucket_org_reference_fills_unset_value() {
        let mut params = BucketParameters {
            org_id_ref: reference("acme"),
            ..Default::default()
        };
        params.resolve_references(&index());
        assert_eq!(params.org_id.as_deref(), Some("0a1b"));

        let mut explicit = BucketParameters {
            org_id: Some("fixed".into()),
            org_id_ref: reference("acme"),
            ..Default::default()
        };
        explicit.resolve_references(&index());
        assert_eq!(explicit.org_id.as_deref(), Some("fixed"));
    }

    #[test]
    fn unresolved_reference_is_retried_later() {
        let mut params = BucketParameters {
            org_id_ref: reference("pending"),
            ..Default::default()
        };
        params.resolve_references(&index());
        assert_eq!(params.org_id.as_deref(), Some(""));

        let mut later = IdIndex::default();
        later.insert(ResourceKind::Organization, "pending", "0c0d");
        params.resolve_references(&later);
        assert_eq!(params.org_id.as_deref(), Some("0c0d"));
    }

    #[test]
    fn dbrp_resolves_bucket_and_org() {
        let mut params = DbrpParameters {
            bucket_id_ref: reference("metrics"),
            org_id_ref: reference("acme"),
            database: "telegraf".into(),
            retention_policy: "autogen".into(),
            ..Default::default()
        };
        params.resolve_references(&index());
        assert_eq!(params.bucket_id, "b1");
        assert_eq!(params.org_id, "0a1b");
    }

    #[test]
    fn no_reference_leaves_params_alone() {
        let mut params = DbrpParameters {
            org_id: "o1".into(),
            ..Default::default()
        };
        params.resolve_references(&index());
        assert_eq!(params.bucket_id, "");
        assert_eq!(params.org_id, "o1");
    }
}
