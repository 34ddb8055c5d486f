//! DBRP controller.
//!
//! Unlike organizations and buckets, a mapping has no unique name: it is
//! identified by the id the server assigns on create, which is stored as the
//! record's external name.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{ExternalClient, ExternalObservation, ignore_absent, late_init::LateInitializer};
use crate::{
    clients::{DbrpsApi, Lookup, domain, lookup},
    errors::{ReconcileResult, wrap},
    models::{
        Condition, DbrpRecord, ResourceKind,
        dbrp::{DbrpLinks, DbrpObservation, DbrpParameters},
    },
};

const ERR_GET_DBRP: &str = "cannot get dbrp";
const ERR_CREATE_DBRP: &str = "cannot create dbrp";
const ERR_UPDATE_DBRP: &str = "cannot update dbrp";
const ERR_DELETE_DBRP: &str = "cannot delete dbrp";

pub struct DbrpExternal {
    api: Arc<dyn DbrpsApi>,
}

impl DbrpExternal {
    pub fn new(api: Arc<dyn DbrpsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ExternalClient<DbrpParameters, DbrpObservation> for DbrpExternal {
    async fn observe(&self, cr: &mut DbrpRecord) -> ReconcileResult<ExternalObservation> {
        let id = cr.external_name().to_string();
        if id.is_empty() {
            return Ok(ExternalObservation::absent());
        }

        let query = domain::DbrpQuery {
            org_id: cr.for_provider.org_id.clone(),
            id: id.clone(),
        };
        let fetched = self.api.get_dbrps(&query).await;
        let found = match lookup(fetched, ResourceKind::DatabaseRetentionPolicyMapping, &id)
            .map_err(wrap(ERR_GET_DBRP))?
        {
            Lookup::Found(list) => list.content.and_then(|c| c.into_iter().next()),
            Lookup::NotFound => None,
        };
        let Some(dbrp) = found else {
            debug!(dbrp = %id, "dbrp does not exist");
            return Ok(ExternalObservation::absent());
        };

        cr.at_provider = generate_observation(&dbrp);
        cr.set_condition(Condition::available());
        let late_initialized = late_initialize(&mut cr.for_provider, &dbrp);

        Ok(ExternalObservation {
            resource_exists: true,
            resource_late_initialized: late_initialized,
            resource_up_to_date: is_up_to_date(&cr.for_provider, &dbrp),
        })
    }

    async fn create(&self, cr: &mut DbrpRecord) -> ReconcileResult<()> {
        let created = self
            .api
            .post_dbrp(&generate_create(&cr.for_provider))
            .await
            .map_err(wrap(ERR_CREATE_DBRP))?;
        debug!(dbrp = %created.id, database = %created.database, "dbrp created");
        cr.set_external_name(created.id);
        Ok(())
    }

    async fn update(&self, cr: &mut DbrpRecord) -> ReconcileResult<()> {
        let body = domain::DbrpUpdate {
            default: cr.for_provider.default,
            retention_policy: Some(cr.for_provider.retention_policy.clone()),
        };
        self.api
            .patch_dbrp(cr.external_name(), &cr.for_provider.org_id, &body)
            .await
            .map_err(wrap(ERR_UPDATE_DBRP))?;
        Ok(())
    }

    /// Always issued, even when the last observe saw nothing; a 404 means
    /// the mapping is already gone.
    async fn delete(&self, cr: &mut DbrpRecord) -> ReconcileResult<()> {
        let result = self
            .api
            .delete_dbrp(cr.external_name(), &cr.for_provider.org_id)
            .await;
        ignore_absent(result, ERR_DELETE_DBRP)
    }
}

pub fn generate_create(params: &DbrpParameters) -> domain::DbrpCreate {
    domain::DbrpCreate {
        bucket_id: params.bucket_id.clone(),
        database: params.database.clone(),
        default: params.default,
        org_id: params.org_id.clone(),
        retention_policy: params.retention_policy.clone(),
    }
}

pub fn generate_observation(dbrp: &domain::Dbrp) -> DbrpObservation {
    DbrpObservation {
        links: DbrpLinks {
            self_link: dbrp
                .links
                .as_ref()
                .map(|l| l.self_link.clone())
                .unwrap_or_default(),
        },
    }
}

/// Adopt the server's `default` flag when none was configured.
pub fn late_initialize(params: &mut DbrpParameters, observed: &domain::Dbrp) -> bool {
    let mut li = LateInitializer::new();
    li.option(&mut params.default, Some(&observed.default));
    li.is_changed()
}

/// Only `default` (unset counts as false) and `retention_policy` can drift;
/// the other fields are fixed at creation.
pub fn is_up_to_date(params: &DbrpParameters, observed: &domain::Dbrp) -> bool {
    params.default.unwrap_or(false) == observed.default
        && params.retention_policy == observed.retention_policy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockDbrpsApi;
    use crate::errors::ApiError;
    use reqwest::StatusCode;

    fn params() -> DbrpParameters {
        DbrpParameters {
            bucket_id: "b1".into(),
            database: "telegraf".into(),
            org_id: "o1".into(),
            retention_policy: "autogen".into(),
            ..Default::default()
        }
    }

    fn observed(default: bool, rp: &str) -> domain::Dbrp {
        domain::Dbrp {
            id: "abc123".into(),
            org_id: "o1".into(),
            bucket_id: "b1".into(),
            database: "telegraf".into(),
            retention_policy: rp.into(),
            default,
            links: Some(domain::DbrpLinks {
                self_link: "/api/v2/dbrps/abc123".into(),
            }),
        }
    }

    #[test]
    fn up_to_date_cases() {
        let with_default = |d: Option<bool>| DbrpParameters {
            default: d,
            ..params()
        };
        let cases = [
            (with_default(None), observed(false, "autogen"), true),
            (with_default(None), observed(true, "autogen"), false),
            (with_default(Some(true)), observed(true, "autogen"), true),
            (with_default(Some(false)), observed(false, "weekly"), false),
        ];
        for (p, o, want) in cases {
            assert_eq!(is_up_to_date(&p, &o), want, "{p:?} vs {o:?}");
        }
    }

    #[test]
    fn late_init_only_fills_unset_default() {
        let mut p = params();
        assert!(late_initialize(&mut p, &observed(true, "autogen")));
        assert_eq!(p.default, Some(true));

        let mut explicit = DbrpParameters {
            default: Some(false),
            ..params()
        };
        assert!(!late_initialize(&mut explicit, &observed(true, "autogen")));
        assert_eq!(explicit.default, Some(false));
    }

    #[tokio::test]
    async fn observe_without_identity_makes_no_call() {
        let external = DbrpExternal::new(Arc::new(MockDbrpsApi::new()));
        let mut cr = DbrpRecord::new("telegraf", params());

        let obs = external.observe(&mut cr).await.unwrap();
        assert_eq!(obs, ExternalObservation::absent());
    }

    #[tokio::test]
    async fn create_stores_server_id_then_observe_sees_absence() {
        let mut api = MockDbrpsApi::new();
        api.expect_post_dbrp()
            .withf(|body| {
                body.bucket_id == "b1"
                    && body.org_id == "o1"
                    && body.database == "telegraf"
                    && body.default.is_none()
            })
            .times(1)
            .returning(|_| Ok(observed(false, "autogen")));
        api.expect_get_dbrps()
            .withf(|q| q.id == "abc123" && q.org_id == "o1")
            .times(1)
            .returning(|_| Ok(domain::Dbrps { content: Some(vec![]) }));
        let external = DbrpExternal::new(Arc::new(api));

        let mut cr = DbrpRecord::new("telegraf", params());
        external.create(&mut cr).await.unwrap();
        assert_eq!(cr.external_name(), "abc123");

        let obs = external.observe(&mut cr).await.unwrap();
        assert!(!obs.resource_exists);
    }

    #[tokio::test]
    async fn observe_missing_content_or_404_is_absent() {
        let mut api = MockDbrpsApi::new();
        let mut calls = 0;
        api.expect_get_dbrps().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(domain::Dbrps { content: None })
            } else {
                Err(ApiError::http(StatusCode::NOT_FOUND, "dbrp not found"))
            }
        });
        let external = DbrpExternal::new(Arc::new(api));

        let mut cr = DbrpRecord::new("telegraf", params()).with_external_name("abc123");
        assert!(!external.observe(&mut cr).await.unwrap().resource_exists);
        assert!(!external.observe(&mut cr).await.unwrap().resource_exists);
    }

    #[tokio::test]
    async fn observe_existing_mapping() {
        let mut api = MockDbrpsApi::new();
        api.expect_get_dbrps().returning(|_| {
            Ok(domain::Dbrps {
                content: Some(vec![observed(true, "autogen")]),
            })
        });
        let external = DbrpExternal::new(Arc::new(api));

        let mut cr = DbrpRecord::new("telegraf", params()).with_external_name("abc123");
        let obs = external.observe(&mut cr).await.unwrap();

        assert_eq!(
            obs,
            ExternalObservation {
                resource_exists: true,
                resource_late_initialized: true,
                resource_up_to_date: true,
            }
        );
        assert_eq!(cr.at_provider.links.self_link, "/api/v2/dbrps/abc123");
    }

    #[tokio::test]
    async fn update_patches_by_id_and_org() {
        let mut api = MockDbrpsApi::new();
        api.expect_patch_dbrp()
            .withf(|id, org, body| {
                id == "abc123"
                    && org == "o1"
                    && body.default == Some(true)
                    && body.retention_policy.as_deref() == Some("weekly")
            })
            .times(1)
            .returning(|_, _, _| Ok(observed(true, "weekly")));
        let external = DbrpExternal::new(Arc::new(api));

        let mut cr = DbrpRecord::new(
            "telegraf",
            DbrpParameters {
                default: Some(true),
                retention_policy: "weekly".into(),
                ..params()
            },
        )
        .with_external_name("abc123");
        external.update(&mut cr).await.unwrap();
    }

    #[tokio::test]
    async fn delete_tolerates_absence() {
        let mut api = MockDbrpsApi::new();
        api.expect_delete_dbrp()
            .withf(|id, org| id == "abc123" && org == "o1")
            .times(1)
            .returning(|_, _| {
                Err(ApiError::http(StatusCode::NOT_FOUND, "unable to find DBRP"))
            });
        let external = DbrpExternal::new(Arc::new(api));

        let mut cr = DbrpRecord::new("telegraf", params()).with_external_name("abc123");
        assert!(external.delete(&mut cr).await.is_ok());
    }

    #[tokio::test]
    async fn delete_surfaces_server_errors() {
        let mut api = MockDbrpsApi::new();
        api.expect_delete_dbrp()
            .returning(|_, _| Err(ApiError::http(StatusCode::INTERNAL_SERVER_ERROR, "boom")));
        let external = DbrpExternal::new(Arc::new(api));

        let mut cr = DbrpRecord::new("telegraf", params()).with_external_name("abc123");
        let err = external.delete(&mut cr).await.unwrap_err();
        assert_eq!(err.context(), "cannot delete dbrp");
    }
}
