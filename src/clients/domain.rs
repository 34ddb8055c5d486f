//! Request and response bodies of the InfluxDB v2 API, limited to the
//! fields the controllers read or send.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use crate::models::bucket::{RetentionRule, SchemaType};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub links: Option<OrganizationLinks>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OrganizationLinks {
    pub buckets: Option<String>,
    pub dashboards: Option<String>,
    pub labels: Option<String>,
    pub members: Option<String>,
    pub owners: Option<String>,
    pub secrets: Option<String>,
    #[serde(rename = "self")]
    pub self_link: Option<String>,
    pub tasks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Organizations {
    #[serde(default)]
    pub orgs: Vec<Organization>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "type", skip_serializing)]
    pub bucket_type: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "orgID", skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Always sent; an empty list means the data never expires.
    #[serde(default)]
    pub retention_rules: Vec<RetentionRule>,
    #[serde(default, skip_serializing)]
    pub labels: Option<Vec<Label>>,
    #[serde(default, skip_serializing)]
    pub links: Option<BucketLinks>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "orgID")]
    pub org_id: Option<String>,
    pub properties: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BucketLinks {
    pub labels: Option<String>,
    pub members: Option<String>,
    pub org: Option<String>,
    pub owners: Option<String>,
    #[serde(rename = "self")]
    pub self_link: Option<String>,
    pub write: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Buckets {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// A database retention policy mapping. The API spells the retention policy
/// in snake case.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Dbrp {
    pub id: String,
    #[serde(default, rename = "orgID")]
    pub org_id: String,
    #[serde(default, rename = "bucketID")]
    pub bucket_id: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub retention_policy: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub links: Option<DbrpLinks>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DbrpLinks {
    #[serde(rename = "self")]
    pub self_link: String,
}

/// Response of `GET /dbrps`. `content` is absent when nothing matched.
#[derive(Debug, Default, Deserialize)]
pub struct Dbrps {
    pub content: Option<Vec<Dbrp>>,
}

/// Response of `PATCH /dbrps/{id}`.
#[derive(Debug, Deserialize)]
pub struct DbrpGet {
    pub content: Dbrp,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DbrpCreate {
    #[serde(rename = "bucketID")]
    pub bucket_id: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(rename = "orgID")]
    pub org_id: String,
    pub retention_policy: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DbrpUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_policy: Option<String>,
}

/// Filters for `GET /dbrps`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DbrpQuery {
    pub org_id: String,
    pub id: String,
}
