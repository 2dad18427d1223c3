//! Thin client for the Render deploy REST API.
//!
//! Covers the handful of endpoints the operator workflow needs: service
//! lookup, deploy trigger and polling, log tailing, and environment
//! variables. Responses are decoded into the few fields we read; Render's
//! envelope objects (`{ "service": ... }`) are unwrapped here so the rest of
//! the tool never sees them.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{CliError, CliResult};

const API_BASE: &str = "https://api.render.com/v1";

/// Lifecycle state of one deploy, as reported by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeployStatus {
    Created,
    QueuedBuild,
    BuildInProgress,
    UpdateInProgress,
    Live,
    Success,
    BuildFailed,
    DeployFailed,
    Canceled,
    /// Any status this tool does not know; treated as still in flight.
    #[serde(other)]
    Unknown,
}

impl DeployStatus {
    pub fn is_success(self) -> bool {
        matches!(self, DeployStatus::Live | DeployStatus::Success)
    }

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            DeployStatus::BuildFailed | DeployStatus::DeployFailed | DeployStatus::Canceled
        )
    }

    pub fn is_terminal(self) -> bool {
        self.is_success() || self.is_failure()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetails {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub service_details: Option<ServiceDetails>,
}

#[derive(Debug, Deserialize)]
struct ServiceEnvelope {
    service: Service,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deploy {
    pub id: String,
    pub status: DeployStatus,
}

#[derive(Debug, Deserialize)]
struct DeployEnvelope {
    deploy: Deploy,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLine {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogsPage {
    logs: Vec<LogLine>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvVarEnvelope {
    env_var: EnvVarInner,
}

#[derive(Debug, Deserialize)]
struct EnvVarInner {
    key: String,
    value: String,
}

/// Resolve a service by name: exact match first, then a case-insensitive
/// substring match when it is unambiguous. An empty name resolves only when
/// there is exactly one service.
pub fn pick_service<'a>(services: &'a [Service], name: &str) -> Option<&'a Service> {
    if name.is_empty() {
        return match services {
            [only] => Some(only),
            _ => None,
        };
    }
    if let Some(exact) = services.iter().find(|s| s.name == name) {
        return Some(exact);
    }
    let needle = name.to_lowercase();
    let mut hits = services
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&needle));
    match (hits.next(), hits.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

pub struct DeployClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl DeployClient {
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: API_BASE.to_owned(),
            token,
        }
    }

    async fn check(&self, response: reqwest::Response) -> CliResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(CliError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn list_services(&self) -> CliResult<Vec<Service>> {
        let response = self
            .http
            .get(format!("{}/services", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("limit", "100")])
            .send()
            .await?;
        let envelopes: Vec<ServiceEnvelope> = self.check(response).await?.json().await?;
        Ok(envelopes.into_iter().map(|e| e.service).collect())
    }

    /// List services and resolve one by name.
    pub async fn find_service(&self, name: &str) -> CliResult<Service> {
        let services = self.list_services().await?;
        pick_service(&services, name)
            .cloned()
            .ok_or_else(|| CliError::NoService(name.to_owned()))
    }

    pub async fn trigger_deploy(&self, service_id: &str, clear_cache: bool) -> CliResult<Deploy> {
        let cache = if clear_cache { "clear" } else { "do_not_clear" };
        let response = self
            .http
            .post(format!("{}/services/{service_id}/deploys", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({ "clearCache": cache }))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    pub async fn deploy(&self, service_id: &str, deploy_id: &str) -> CliResult<Deploy> {
        let response = self
            .http
            .get(format!(
                "{}/services/{service_id}/deploys/{deploy_id}",
                self.base_url
            ))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    pub async fn recent_deploys(&self, service_id: &str, limit: u32) -> CliResult<Vec<Deploy>> {
        let response = self
            .http
            .get(format!("{}/services/{service_id}/deploys", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("limit", limit.to_string())])
            .send()
            .await?;
        let envelopes: Vec<DeployEnvelope> = self.check(response).await?.json().await?;
        Ok(envelopes.into_iter().map(|e| e.deploy).collect())
    }

    pub async fn service_logs(&self, service_id: &str, lines: u32) -> CliResult<Vec<LogLine>> {
        let response = self
            .http
            .get(format!("{}/logs", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("resource", service_id), ("limit", &lines.to_string())])
            .send()
            .await?;
        let page: LogsPage = self.check(response).await?.json().await?;
        Ok(page.logs)
    }

    pub async fn env_vars(&self, service_id: &str) -> CliResult<Vec<EnvVar>> {
        let response = self
            .http
            .get(format!("{}/services/{service_id}/env-vars", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let envelopes: Vec<EnvVarEnvelope> = self.check(response).await?.json().await?;
        Ok(envelopes
            .into_iter()
            .map(|e| EnvVar {
                key: e.env_var.key,
                value: e.env_var.value,
            })
            .collect())
    }

    pub async fn set_env_var(&self, service_id: &str, key: &str, value: &str) -> CliResult<EnvVar> {
        let response = self
            .http
            .put(format!(
                "{}/services/{service_id}/env-vars/{key}",
                self.base_url
            ))
            .bearer_auth(&self.token)
            .json(&json!({ "value": value }))
            .send()
            .await?;
        let inner: EnvVarInner = self.check(response).await?.json().await?;
        Ok(EnvVar {
            key: inner.key,
            value: inner.value,
        })
    }
}
