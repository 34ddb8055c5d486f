//! Represents an InfluxDB organization, the top-level tenant that owns buckets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-configurable fields of an organization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fields of an organization as last observed in InfluxDB.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationObservation {
    /// Server-assigned id. Buckets and mappings reference the organization by it.
    #[serde(default)]
    pub id: String,

    /// `active`, `inactive`, or empty when the server omits it.
    #[serde(default)]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub links: OrganizationLinks,
}

impl OrganizationObservation {
    /// Only an explicit `inactive` marks the organization unusable.
    pub fn is_inactive(&self) -> bool {
        self.status == "inactive"
    }
}

/// URIs of the organization's related API resources.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationLinks {
    #[serde(default)]
    pub buckets: String,
    #[serde(default)]
    pub dashboards: String,
    #[serde(default)]
    pub labels: String,
    #[serde(default)]
    pub members: String,
    #[serde(default)]
    pub owners: String,
    #[serde(default)]
    pub secrets: String,
    #[serde(default, rename = "self")]
    pub self_link: String,
    #[serde(default)]
    pub tasks: String,
}
