//! HTTP implementation of the control-plane contract
//!
//! Talks to the Atlas Administration API v2 with a service-account bearer
//! token. Create and delete calls return as soon as the control plane
//! accepts the job.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::client::{
    AtlasApi, AtlasClusterState, AtlasError, ClusterSpec, ClusterView, CreatedCluster,
    CreatedDatabaseUser, DatabaseUserSpec,
};

const ATLAS_MEDIA_TYPE: &str = "application/vnd.atlas.2023-02-01+json";

/// Control-plane client configuration
#[derive(Debug, Clone)]
pub struct AtlasClientConfig {
    /// Base URL of the administration API
    pub base_url: String,
    /// Service-account access token (sent as a bearer token)
    pub access_token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for AtlasClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cloud.mongodb.com".to_string(),
            access_token: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// reqwest-backed control-plane client
pub struct HttpAtlasClient {
    config: AtlasClientConfig,
    client: reqwest::Client,
}

impl HttpAtlasClient {
    pub fn new(config: AtlasClientConfig) -> Result<Self, AtlasError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/api/atlas/v2{}",
            self.config.base_url.trim_end_matches('/'),
            path
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(&self.config.access_token)
            .header(reqwest::header::ACCEPT, ATLAS_MEDIA_TYPE)
    }

    /// Turn a non-success response into the typed error taxonomy
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AtlasError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or_else(|| status.to_string());

        Err(map_status(status, detail))
    }
}

fn map_status(status: StatusCode, detail: String) -> AtlasError {
    match status {
        StatusCode::NOT_FOUND => AtlasError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AtlasError::Unauthorized,
        _ => AtlasError::Api {
            status: status.as_u16(),
            detail,
        },
    }
}

#[async_trait]
impl AtlasApi for HttpAtlasClient {
    async fn create_cluster(
        &self,
        project_id: &str,
        spec: &ClusterSpec,
    ) -> Result<CreatedCluster, AtlasError> {
        info!(
            cluster = %spec.name,
            provider = %spec.provider,
            region = %spec.region,
            "Requesting cluster creation"
        );

        let body = CreateClusterBody::from_spec(spec);
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/groups/{}/clusters", project_id),
            )
            .json(&body)
            .send()
            .await?;

        let created: ClusterBody = Self::check(response).await?.json().await?;

        if spec.open_network_access {
            self.open_access_list(project_id).await?;
        }

        Ok(CreatedCluster {
            external_id: created.id.unwrap_or(created.name),
        })
    }

    async fn describe_cluster(
        &self,
        project_id: &str,
        cluster_name: &str,
    ) -> Result<ClusterView, AtlasError> {
        debug!(cluster = %cluster_name, "Describing cluster");

        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/groups/{}/clusters/{}", project_id, cluster_name),
            )
            .send()
            .await?;

        let body: ClusterBody = Self::check(response).await?.json().await?;

        let state = body
            .state_name
            .as_deref()
            .map(AtlasClusterState::parse)
            .ok_or_else(|| AtlasError::InvalidResponse("missing stateName".to_string()))?;

        Ok(ClusterView {
            state,
            connection_string: body
                .connection_strings
                .and_then(|strings| strings.standard_srv),
        })
    }

    async fn delete_cluster(
        &self,
        project_id: &str,
        cluster_name: &str,
    ) -> Result<(), AtlasError> {
        info!(cluster = %cluster_name, "Requesting cluster deletion");

        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/groups/{}/clusters/{}", project_id, cluster_name),
            )
            .send()
            .await?;

        Self::check(response).await?;

        Ok(())
    }

    async fn create_database_user(
        &self,
        project_id: &str,
        spec: &DatabaseUserSpec,
    ) -> Result<CreatedDatabaseUser, AtlasError> {
        info!(username = %spec.username, "Creating database user");

        let body = CreateDatabaseUserBody::from_spec(spec);
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/groups/{}/databaseUsers", project_id),
            )
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;

        Ok(CreatedDatabaseUser {
            username: spec.username.clone(),
        })
    }

    async fn delete_database_user(
        &self,
        project_id: &str,
        username: &str,
    ) -> Result<(), AtlasError> {
        info!(username = %username, "Deleting database user");

        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/groups/{}/databaseUsers/admin/{}", project_id, username),
            )
            .send()
            .await?;

        Self::check(response).await?;

        Ok(())
    }
}

impl HttpAtlasClient {
    /// Open the project access list to all addresses
    async fn open_access_list(&self, project_id: &str) -> Result<(), AtlasError> {
        let body = vec![AccessListEntry {
            cidr_block: "0.0.0.0/0".to_string(),
            comment: "hackdesk: open access".to_string(),
        }];

        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/groups/{}/accessList", project_id),
            )
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;

        Ok(())
    }
}

// ---- wire types ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateClusterBody {
    name: String,
    cluster_type: &'static str,
    replication_specs: Vec<ReplicationSpec>,
}

impl CreateClusterBody {
    fn from_spec(spec: &ClusterSpec) -> Self {
        Self {
            name: spec.name.clone(),
            cluster_type: "REPLICASET",
            replication_specs: vec![ReplicationSpec {
                region_configs: vec![RegionConfig {
                    provider_name: spec.provider.clone(),
                    region_name: spec.region.clone(),
                    priority: 7,
                    electable_specs: HardwareSpec {
                        instance_size: spec.tier.clone(),
                        node_count: 3,
                    },
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplicationSpec {
    region_configs: Vec<RegionConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegionConfig {
    provider_name: String,
    region_name: String,
    priority: u8,
    electable_specs: HardwareSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HardwareSpec {
    instance_size: String,
    node_count: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterBody {
    id: Option<String>,
    name: String,
    state_name: Option<String>,
    connection_strings: Option<ConnectionStrings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionStrings {
    standard_srv: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDatabaseUserBody {
    database_name: &'static str,
    username: String,
    password: String,
    roles: Vec<RoleBody>,
}

impl CreateDatabaseUserBody {
    fn from_spec(spec: &DatabaseUserSpec) -> Self {
        Self {
            database_name: "admin",
            username: spec.username.clone(),
            password: spec.password.clone(),
            roles: spec
                .roles
                .iter()
                .map(|role| RoleBody {
                    role_name: role.clone(),
                    database_name: "admin",
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleBody {
    role_name: String,
    database_name: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessListEntry {
    cidr_block: String,
    comment: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    detail: Option<String>,
}
