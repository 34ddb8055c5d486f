//! `InfluxClient`: the InfluxDB v2 HTTP API over `reqwest`.
//!
//! One client is built at startup and shared by every controller; the
//! underlying `reqwest::Client` pools connections and is safe to use from
//! concurrent tasks. No retries or timeouts are applied here: dropping the
//! returned future aborts the request.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    BucketsApi, DbrpsApi, OrganizationsApi,
    domain::{
        Bucket, Buckets, Dbrp, DbrpCreate, DbrpGet, DbrpQuery, DbrpUpdate, Dbrps, Organization,
        Organizations,
    },
};
use crate::errors::ApiError;

#[derive(Clone, Debug)]
pub struct InfluxClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl InfluxClient {
    /// Build a client for `endpoint`. An empty token sends no
    /// `Authorization` header.
    pub fn new(endpoint: &str, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: endpoint.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            req = req.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        req
    }

    /// `GET /health`. Succeeds when the server answers with a 2xx.
    pub async fn health(&self) -> Result<(), ApiError> {
        let url = format!("{}/health", self.base_url);
        let resp = self.request(Method::GET, &url).send().await?;
        expect_success(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(ApiError::http(status, &body));
    }
    serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
}

async fn expect_success(resp: Response) -> Result<(), ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await?;
    Err(ApiError::http(status, &body))
}

fn require_id<'a>(id: &'a Option<String>, what: &str) -> Result<&'a str, ApiError> {
    id.as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Message(format!("{what} id is required")))
}

#[async_trait]
impl OrganizationsApi for InfluxClient {
    async fn find_organization_by_name(&self, name: &str) -> Result<Organization, ApiError> {
        let resp = self
            .request(Method::GET, &self.api_url("orgs"))
            .query(&[("org", name)])
            .send()
            .await?;
        let orgs: Organizations = decode(resp).await?;
        orgs.orgs
            .into_iter()
            .find(|org| org.name == name)
            .ok_or_else(|| ApiError::Message(format!("organization '{name}' not found")))
    }

    async fn create_organization(&self, org: &Organization) -> Result<Organization, ApiError> {
        debug!("POST orgs name={}", org.name);
        let resp = self
            .request(Method::POST, &self.api_url("orgs"))
            .json(org)
            .send()
            .await?;
        decode(resp).await
    }

    async fn update_organization(&self, org: &Organization) -> Result<Organization, ApiError> {
        let id = require_id(&org.id, "organization")?;
        let resp = self
            .request(Method::PATCH, &self.api_url(&format!("orgs/{id}")))
            .json(org)
            .send()
            .await?;
        decode(resp).await
    }

    async fn delete_organization(&self, id: &str) -> Result<(), ApiError> {
        let resp = self
            .request(Method::DELETE, &self.api_url(&format!("orgs/{id}")))
            .send()
            .await?;
        expect_success(resp).await
    }
}

#[async_trait]
impl BucketsApi for InfluxClient {
    async fn find_bucket_by_name(&self, name: &str) -> Result<Bucket, ApiError> {
        let resp = self
            .request(Method::GET, &self.api_url("buckets"))
            .query(&[("name", name)])
            .send()
            .await?;
        let buckets: Buckets = decode(resp).await?;
        buckets
            .buckets
            .into_iter()
            .find(|bucket| bucket.name == name)
            .ok_or_else(|| ApiError::Message(format!("bucket '{name}' not found")))
    }

    async fn create_bucket(&self, bucket: &Bucket) -> Result<Bucket, ApiError> {
        debug!("POST buckets name={}", bucket.name);
        let resp = self
            .request(Method::POST, &self.api_url("buckets"))
            .json(bucket)
            .send()
            .await?;
        decode(resp).await
    }

    async fn update_bucket(&self, bucket: &Bucket) -> Result<Bucket, ApiError> {
        let id = require_id(&bucket.id, "bucket")?;
        let resp = self
            .request(Method::PATCH, &self.api_url(&format!("buckets/{id}")))
            .json(bucket)
            .send()
            .await?;
        decode(resp).await
    }

    async fn delete_bucket(&self, id: &str) -> Result<(), ApiError> {
        let resp = self
            .request(Method::DELETE, &self.api_url(&format!("buckets/{id}")))
            .send()
            .await?;
        expect_success(resp).await
    }
}

#[async_trait]
impl DbrpsApi for InfluxClient {
    async fn get_dbrps(&self, query: &DbrpQuery) -> Result<Dbrps, ApiError> {
        let mut params = vec![("id", query.id.as_str())];
        if !query.org_id.is_empty() {
            params.push(("orgID", query.org_id.as_str()));
        }
        let resp = self
            .request(Method::GET, &self.api_url("dbrps"))
            .query(&params)
            .send()
            .await?;
        decode(resp).await
    }

    async fn post_dbrp(&self, body: &DbrpCreate) -> Result<Dbrp, ApiError> {
        debug!("POST dbrps database={}", body.database);
        let resp = self
            .request(Method::POST, &self.api_url("dbrps"))
            .json(body)
            .send()
            .await?;
        decode(resp).await
    }

    async fn patch_dbrp(
        &self,
        id: &str,
        org_id: &str,
        body: &DbrpUpdate,
    ) -> Result<Dbrp, ApiError> {
        let resp = self
            .request(Method::PATCH, &self.api_url(&format!("dbrps/{id}")))
            .query(&[("orgID", org_id)])
            .json(body)
            .send()
            .await?;
        let updated: DbrpGet = decode(resp).await?;
        Ok(updated.content)
    }

    async fn delete_dbrp(&self, id: &str, org_id: &str) -> Result<(), ApiError> {
        let resp = self
            .request(Method::DELETE, &self.api_url(&format!("dbrps/{id}")))
            .query(&[("orgID", org_id)])
            .send()
            .await?;
        expect_success(resp).await
    }
}
