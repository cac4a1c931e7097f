// ABOUTME: Management client trait for App Service lookups.
// ABOUTME: Resolves a web app by resource group and name, then its publishing profile.

use super::error::Result;
use super::profile::PublishingProfile;
use async_trait::async_trait;
use serde::Deserialize;

/// A web app resource as returned by the management API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebApp {
    /// Full resource id (`/subscriptions/.../sites/<name>`).
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
}

#[async_trait]
pub trait AppServiceClient: Send + Sync {
    /// Look up a web app. `Ok(None)` when it does not exist.
    async fn find_web_app(&self, resource_group: &str, name: &str) -> Result<Option<WebApp>>;

    /// Retrieve the FTP publishing profile of a web app.
    async fn publishing_profile(&self, app: &WebApp) -> Result<PublishingProfile>;
}
