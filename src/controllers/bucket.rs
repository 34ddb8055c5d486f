//! Bucket controller, plus the conversions between bucket parameters and the
//! API's bucket body.
//!
//! Retention rules form an unordered set keyed by rule type. Both sides are
//! brought into canonical form by [`canonical_retention_rules`] before they
//! are compared, and late-initialization pairs rules by sorted position.

use async_trait::async_trait;
use std::{cmp::Ordering, collections::BTreeMap, sync::Arc};
use tracing::debug;

use super::{ExternalClient, ExternalObservation, ignore_absent, late_init::LateInitializer};
use crate::{
    clients::{BucketsApi, Lookup, domain, lookup},
    errors::{ReconcileResult, wrap},
    models::{
        BucketRecord, Condition, ResourceKind,
        bucket::{
            BucketLinks, BucketObservation, BucketParameters, EXPIRE_RULE_TYPE, Label, RetentionRule,
        },
    },
};

const ERR_FIND_BUCKET: &str = "cannot find bucket";
const ERR_CREATE_BUCKET: &str = "cannot create bucket";
const ERR_UPDATE_BUCKET: &str = "cannot update bucket";
const ERR_DELETE_BUCKET: &str = "cannot delete bucket";

pub struct BucketExternal {
    api: Arc<dyn BucketsApi>,
}

impl BucketExternal {
    pub fn new(api: Arc<dyn BucketsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ExternalClient<BucketParameters, BucketObservation> for BucketExternal {
    async fn observe(&self, cr: &mut BucketRecord) -> ReconcileResult<ExternalObservation> {
        let name = cr.external_name().to_string();
        let fetched = self.api.find_bucket_by_name(&name).await;
        let bucket = match lookup(fetched, ResourceKind::Bucket, &name)
            .map_err(wrap(ERR_FIND_BUCKET))?
        {
            Lookup::Found(bucket) => bucket,
            Lookup::NotFound => {
                debug!(bucket = %name, "bucket does not exist");
                return Ok(ExternalObservation::absent());
            }
        };

        cr.at_provider = generate_observation(&bucket);
        cr.set_condition(Condition::available());
        let late_initialized = late_initialize(&mut cr.for_provider, &bucket);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_late_initialized: late_initialized,
            resource_up_to_date: is_up_to_date(&cr.for_provider, &bucket),
        })
    }

    async fn create(&self, cr: &mut BucketRecord) -> ReconcileResult<()> {
        let bucket = generate_bucket(cr.external_name(), &cr.for_provider);
        self.api
            .create_bucket(&bucket)
            .await
            .map_err(wrap(ERR_CREATE_BUCKET))?;
        Ok(())
    }

    async fn update(&self, cr: &mut BucketRecord) -> ReconcileResult<()> {
        let mut bucket = generate_bucket(cr.external_name(), &cr.for_provider);
        bucket.id = Some(cr.at_provider.id.clone());
        self.api
            .update_bucket(&bucket)
            .await
            .map_err(wrap(ERR_UPDATE_BUCKET))?;
        Ok(())
    }

    async fn delete(&self, cr: &mut BucketRecord) -> ReconcileResult<()> {
        let result = self.api.delete_bucket(&cr.at_provider.id).await;
        ignore_absent(result, ERR_DELETE_BUCKET)
    }
}

/// Build the create/update body for the bucket named `name`.
pub fn generate_bucket(name: &str, params: &BucketParameters) -> domain::Bucket {
    domain::Bucket {
        name: name.to_string(),
        description: params.description.clone(),
        org_id: params.org_id.clone(),
        rp: params.rp.clone(),
        schema_type: params.schema_type,
        retention_rules: params.retention_rules.clone(),
        ..Default::default()
    }
}

pub fn generate_observation(bucket: &domain::Bucket) -> BucketObservation {
    let links = bucket.links.clone().unwrap_or_default();
    let mut labels: Vec<Label> = bucket
        .labels
        .iter()
        .flatten()
        .map(|l| Label {
            id: l.id.clone().unwrap_or_default(),
            name: l.name.clone().unwrap_or_default(),
            org_id: l.org_id.clone().unwrap_or_default(),
            properties: l.properties.clone().unwrap_or_else(BTreeMap::new),
        })
        .collect();
    labels.sort_by(|a, b| a.id.cmp(&b.id));

    BucketObservation {
        id: bucket.id.clone().unwrap_or_default(),
        created_at: bucket.created_at,
        updated_at: bucket.updated_at,
        bucket_type: bucket.bucket_type.clone().unwrap_or_default(),
        labels,
        links: BucketLinks {
            labels: links.labels.unwrap_or_default(),
            members: links.members.unwrap_or_default(),
            org: links.org.unwrap_or_default(),
            owners: links.owners.unwrap_or_default(),
            self_link: links.self_link.unwrap_or_default(),
            write: links.write.unwrap_or_default(),
        },
    }
}

/// Canonical order of retention rules: by type, then by duration.
fn rule_order(a: &RetentionRule, b: &RetentionRule) -> Ordering {
    a.rule_type
        .cmp(&b.rule_type)
        .then(a.every_seconds.cmp(&b.every_seconds))
        .then(
            a.shard_group_duration_seconds
                .unwrap_or(0)
                .cmp(&b.shard_group_duration_seconds.unwrap_or(0)),
        )
}

/// Canonical form of a rule set: the implicit `expire`/0 default is dropped,
/// since it means the same as configuring no rule, and the rest is sorted.
pub fn canonical_retention_rules(rules: &[RetentionRule]) -> Vec<&RetentionRule> {
    let mut out: Vec<&RetentionRule> = rules.iter().filter(|r| !r.is_implicit_default()).collect();
    out.sort_by(|a, b| rule_order(a, b));
    out
}

/// Backfill unset parameters from the observed bucket. Returns true if any
/// field changed.
pub fn late_initialize(params: &mut BucketParameters, observed: &domain::Bucket) -> bool {
    let mut li = LateInitializer::new();
    li.option(&mut params.description, observed.description.as_ref());
    li.option(&mut params.rp, observed.rp.as_ref());
    li.option(&mut params.schema_type, observed.schema_type.as_ref());

    // With no rules configured, only a never-expiring rule may be adopted,
    // whatever shard duration the server picked for it. Anything else is
    // drift for the comparator to report.
    if params.retention_rules.is_empty()
        && !observed.retention_rules.is_empty()
        && observed
            .retention_rules
            .iter()
            .all(|r| r.rule_type == EXPIRE_RULE_TYPE && r.every_seconds == 0)
    {
        params.retention_rules = observed.retention_rules.clone();
        li.mark_changed();
        return li.is_changed();
    }

    let mut desired: Vec<usize> = (0..params.retention_rules.len()).collect();
    desired.sort_by(|&a, &b| {
        rule_order(&params.retention_rules[a], &params.retention_rules[b])
    });
    let mut actual: Vec<&RetentionRule> = observed.retention_rules.iter().collect();
    actual.sort_by(|a, b| rule_order(a, b));

    for (idx, obs) in desired.into_iter().zip(actual) {
        let rule = &mut params.retention_rules[idx];
        // A shard duration only carries over to the same retention period.
        if rule.rule_type == obs.rule_type && rule.every_seconds == obs.every_seconds {
            li.option(
                &mut rule.shard_group_duration_seconds,
                obs.shard_group_duration_seconds.as_ref(),
            );
        }
    }
    li.is_changed()
}

/// Whether the observed bucket already matches the parameters.
pub fn is_up_to_date(params: &BucketParameters, observed: &domain::Bucket) -> bool {
    let desired = canonical_retention_rules(&params.retention_rules);
    let actual = canonical_retention_rules(&observed.retention_rules);
    if desired.len() != actual.len() {
        return false;
    }
    let rules_match = desired.iter().zip(&actual).all(|(d, a)| {
        d.rule_type == a.rule_type
            && d.every_seconds == a.every_seconds
            && d.shard_group_duration_seconds.unwrap_or(0)
                == a.shard_group_duration_seconds.unwrap_or(0)
    });
    rules_match
        && params.description.as_deref().unwrap_or_default()
            == observed.description.as_deref().unwrap_or_default()
}
