//! Organization controller.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{ExternalClient, ExternalObservation, ignore_absent};
use crate::{
    clients::{Lookup, OrganizationsApi, domain, lookup},
    errors::{ReconcileResult, wrap},
    models::{
        Condition, OrganizationRecord, ResourceKind,
        organization::{
            OrganizationLinks, OrganizationObservation, OrganizationParameters,
        },
    },
};

const ERR_FIND_ORGANIZATION: &str = "cannot find organization";
const ERR_CREATE_ORGANIZATION: &str = "cannot create organization";
const ERR_UPDATE_ORGANIZATION: &str = "cannot update organization";
const ERR_DELETE_ORGANIZATION: &str = "cannot delete organization";

pub struct OrganizationExternal {
    api: Arc<dyn OrganizationsApi>,
}

impl OrganizationExternal {
    pub fn new(api: Arc<dyn OrganizationsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ExternalClient<OrganizationParameters, OrganizationObservation> for OrganizationExternal {
    async fn observe(&self, cr: &mut OrganizationRecord) -> ReconcileResult<ExternalObservation> {
        let name = cr.external_name().to_string();
        let fetched = self.api.find_organization_by_name(&name).await;
        let org = match lookup(fetched, ResourceKind::Organization, &name)
            .map_err(wrap(ERR_FIND_ORGANIZATION))?
        {
            Lookup::Found(org) => org,
            Lookup::NotFound => {
                debug!(organization = %name, "organization does not exist");
                return Ok(ExternalObservation::absent());
            }
        };

        cr.at_provider = generate_observation(&org);
        if cr.at_provider.is_inactive() {
            cr.set_condition(Condition::unavailable());
        } else {
            cr.set_condition(Condition::available());
        }

        Ok(ExternalObservation {
            resource_exists: true,
            resource_late_initialized: false,
            resource_up_to_date: is_up_to_date(&cr.for_provider, &org),
        })
    }

    async fn create(&self, cr: &mut OrganizationRecord) -> ReconcileResult<()> {
        let org = generate_organization(cr.external_name(), &cr.for_provider);
        self.api
            .create_organization(&org)
            .await
            .map_err(wrap(ERR_CREATE_ORGANIZATION))?;
        Ok(())
    }

    async fn update(&self, cr: &mut OrganizationRecord) -> ReconcileResult<()> {
        let mut org = generate_organization(cr.external_name(), &cr.for_provider);
        org.id = Some(cr.at_provider.id.clone());
        self.api
            .update_organization(&org)
            .await
            .map_err(wrap(ERR_UPDATE_ORGANIZATION))?;
        Ok(())
    }

    async fn delete(&self, cr: &mut OrganizationRecord) -> ReconcileResult<()> {
        let result = self.api.delete_organization(&cr.at_provider.id).await;
        ignore_absent(result, ERR_DELETE_ORGANIZATION)
    }
}

/// Build the create/update body for the organization named `name`.
pub fn generate_organization(name: &str, params: &OrganizationParameters) -> domain::Organization {
    domain::Organization {
        name: name.to_string(),
        description: params.description.clone(),
        ..Default::default()
    }
}

pub fn generate_observation(org: &domain::Organization) -> OrganizationObservation {
    let links = org.links.clone().unwrap_or_default();
    OrganizationObservation {
        id: org.id.clone().unwrap_or_default(),
        status: org.status.clone().unwrap_or_default(),
        created_at: org.created_at,
        updated_at: org.updated_at,
        links: OrganizationLinks {
            buckets: links.buckets.unwrap_or_default(),
            dashboards: links.dashboards.unwrap_or_default(),
            labels: links.labels.unwrap_or_default(),
            members: links.members.unwrap_or_default(),
            owners: links.owners.unwrap_or_default(),
            secrets: links.secrets.unwrap_or_default(),
            self_link: links.self_link.unwrap_or_default(),
            tasks: links.tasks.unwrap_or_default(),
        },
    }
}

/// Equal descriptions (unset counts as empty) mean no update is needed.
pub fn is_up_to_date(params: &OrganizationParameters, observed: &domain::Organization) -> bool {
    params.description.as_deref().unwrap_or_default()
        == observed.description.as_deref().unwrap_or_default()
}
