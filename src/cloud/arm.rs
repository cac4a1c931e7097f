// ABOUTME: Azure Resource Manager implementation of the App Service client.
// ABOUTME: Uses reqwest with a bearer token taken from the service principal.

use super::cache::ClientFactory;
use super::client::{AppServiceClient, WebApp};
use super::credentials::ServicePrincipal;
use super::error::{Error, Result};
use super::profile::PublishingProfile;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";
pub const API_VERSION: &str = "2022-03-01";

/// Management API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagementConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// How long a cached client may be reused.
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub cache_ttl: Duration,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_timeout(),
            cache_ttl: default_cache_ttl(),
        }
    }
}

/// App Service client over the Resource Manager REST API.
pub struct ArmClient {
    client: Client,
    endpoint: String,
    subscription_id: String,
    token: SecretString,
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient")
            .field("endpoint", &self.endpoint)
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

impl ArmClient {
    pub fn new(config: &ManagementConfig, credential: &ServicePrincipal) -> Result<Self> {
        if credential.access_token.expose_secret().is_empty() {
            return Err(Error::MissingToken(credential.id.clone()));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            subscription_id: credential.subscription_id.clone(),
            token: credential.access_token.clone(),
        })
    }

    fn site_url(&self, resource_group: &str, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/sites/{}?api-version={}",
            self.endpoint,
            urlencoding::encode(&self.subscription_id),
            urlencoding::encode(resource_group),
            urlencoding::encode(name),
            API_VERSION
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

async fn status_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::Status { status, body }
}

#[async_trait]
impl AppServiceClient for ArmClient {
    async fn find_web_app(&self, resource_group: &str, name: &str) -> Result<Option<WebApp>> {
        let url = self.site_url(resource_group, name);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(status_error(response).await),
        }
    }

    async fn publishing_profile(&self, app: &WebApp) -> Result<PublishingProfile> {
        let url = format!(
            "{}{}/publishxml?api-version={}",
            self.endpoint, app.id, API_VERSION
        );
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, self.bearer())
            .json(&serde_json::json!({ "format": "Ftp" }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let xml = response.text().await?;
        PublishingProfile::from_publish_xml(&xml)
    }
}

/// Builds [`ArmClient`]s for the client cache.
#[derive(Debug, Clone, Default)]
pub struct ArmClientFactory {
    config: ManagementConfig,
}

impl ArmClientFactory {
    pub fn new(config: ManagementConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for ArmClientFactory {
    fn create(&self, credential: &ServicePrincipal) -> Result<Arc<dyn AppServiceClient>> {
        Ok(Arc::new(ArmClient::new(&self.config, credential)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(token: &str) -> ServicePrincipal {
        ServicePrincipal::new("sp", "sub 1", SecretString::from(token))
    }

    #[test]
    fn site_url_encodes_segments() {
        let config = ManagementConfig {
            endpoint: "https://management.example/".to_string(),
            ..Default::default()
        };
        let client = ArmClient::new(&config, &credential("token")).unwrap();
        assert_eq!(
            client.site_url("my rg", "app"),
            "https://management.example/subscriptions/sub%201/resourceGroups/my%20rg/providers/Microsoft.Web/sites/app?api-version=2022-03-01"
        );
    }

    #[test]
    fn empty_token_is_rejected() {
        let result = ArmClient::new(&ManagementConfig::default(), &credential(""));
        assert!(matches!(result, Err(Error::MissingToken(id)) if id == "sp"));
    }
}
