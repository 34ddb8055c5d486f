//! Represents a database retention policy mapping (DBRP), which exposes a
//! bucket under an InfluxQL `database`/`retention_policy` pair.

use serde::{Deserialize, Serialize};

use super::record::Reference;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbrpParameters {
    /// Id of the bucket being mapped.
    #[serde(default, rename = "bucketID")]
    pub bucket_id: String,

    #[serde(default, rename = "bucketIDRef", skip_serializing_if = "Option::is_none")]
    pub bucket_id_ref: Option<Reference>,

    /// InfluxQL database name.
    pub database: String,

    /// Whether this is the default retention policy for the database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,

    /// Id of the owning organization.
    #[serde(default, rename = "orgID")]
    pub org_id: String,

    #[serde(default, rename = "orgIDRef", skip_serializing_if = "Option::is_none")]
    pub org_id_ref: Option<Reference>,

    /// InfluxQL retention policy name.
    pub retention_policy: String,
}

/// A mapping has no observable fields besides its links; `default` and
/// `retention_policy` are echoed back and compared against the parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbrpObservation {
    #[serde(default)]
    pub links: DbrpLinks,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbrpLinks {
    #[serde(default, rename = "self")]
    pub self_link: String,
}
