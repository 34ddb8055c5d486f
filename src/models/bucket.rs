//! Represents a bucket, a named location for time series data owned by an
//! organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::Reference;

/// Type of the implicit retention rule InfluxDB reports for buckets that
/// never expire.
pub const EXPIRE_RULE_TYPE: &str = "expire";

/// User-configurable fields of a bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Id of the owning organization. Either this or `org_id_ref` has to be
    /// given before the bucket is created.
    #[serde(default, rename = "orgID", skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,

    /// Organization record whose id populates `org_id`.
    #[serde(default, rename = "orgIDRef", skip_serializing_if = "Option::is_none")]
    pub org_id_ref: Option<Reference>,

    /// Retention policy tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp: Option<String>,

    /// Rules to expire or retain data. No rules means data never expires.
    #[serde(default)]
    pub retention_rules: Vec<RetentionRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
}

/// A retention rule. Rules are matched by `rule_type`, never by position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRule {
    #[serde(rename = "type", default = "default_rule_type")]
    pub rule_type: String,

    /// Seconds data is kept. 0 means forever.
    #[serde(default)]
    pub every_seconds: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_group_duration_seconds: Option<i64>,
}

fn default_rule_type() -> String {
    EXPIRE_RULE_TYPE.to_string()
}

impl RetentionRule {
    /// `{type: expire, everySeconds: 0}` with no shard duration: the rule the
    /// server reports when nothing was configured.
    pub fn is_implicit_default(&self) -> bool {
        self.rule_type == EXPIRE_RULE_TYPE
            && self.every_seconds == 0
            && self.shard_group_duration_seconds.unwrap_or(0) == 0
    }
}

#[cfg(test)]
impl RetentionRule {
    pub fn expire(every_seconds: i64) -> Self {
        Self {
            rule_type: default_rule_type(),
            every_seconds,
            shard_group_duration_seconds: None,
        }
    }

    pub fn with_shard_group_duration(mut self, seconds: i64) -> Self {
        self.shard_group_duration_seconds = Some(seconds);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Implicit,
    Explicit,
}

/// Fields of a bucket as last observed in InfluxDB.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketObservation {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// `user` or `system`.
    #[serde(default, rename = "type")]
    pub bucket_type: String,

    /// Labels attached to the bucket, sorted by id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,

    #[serde(default)]
    pub links: BucketLinks,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "orgID")]
    pub org_id: String,
    /// Key/value pairs associated with this label.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// URIs of the bucket's related API resources.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketLinks {
    #[serde(default)]
    pub labels: String,
    #[serde(default)]
    pub members: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub owners: String,
    #[serde(default, rename = "self")]
    pub self_link: String,
    #[serde(default)]
    pub write: String,
}
