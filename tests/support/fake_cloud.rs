// ABOUTME: Fake management API client and factory for publish settings tests.
// ABOUTME: Serves a fixed web app and profile and counts client constructions.

use appdeploy::cloud::{
    self, AppServiceClient, ClientFactory, PublishingProfile, ServicePrincipal, WebApp,
};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn credential(token: &str) -> ServicePrincipal {
    ServicePrincipal::new("sp-1", "sub-1", SecretString::from(token))
}

pub fn profile() -> PublishingProfile {
    PublishingProfile::new(
        "ftp://waws-prod.ftp.example.net/site/wwwroot",
        "app\\$app",
        SecretString::from("ftp-secret"),
    )
}

/// What the fake API answers.
#[derive(Debug, Clone)]
pub enum Scenario {
    Found,
    Missing,
    LookupFails,
    ProfileFails,
}

pub struct FakeAppService {
    scenario: Scenario,
}

#[async_trait]
impl AppServiceClient for FakeAppService {
    async fn find_web_app(&self, resource_group: &str, name: &str) -> cloud::Result<Option<WebApp>> {
        match self.scenario {
            Scenario::Missing => Ok(None),
            Scenario::LookupFails => Err(cloud::Error::Status {
                status: 403,
                body: "AuthorizationFailed".to_string(),
            }),
            Scenario::Found | Scenario::ProfileFails => Ok(Some(WebApp {
                id: format!(
                    "/subscriptions/sub-1/resourceGroups/{}/providers/Microsoft.Web/sites/{}",
                    resource_group, name
                ),
                name: name.to_string(),
                location: "westeurope".to_string(),
            })),
        }
    }

    async fn publishing_profile(&self, _app: &WebApp) -> cloud::Result<PublishingProfile> {
        match self.scenario {
            Scenario::ProfileFails => Err(cloud::Error::InvalidProfile(
                "no FTP publish profile".to_string(),
            )),
            _ => Ok(profile()),
        }
    }
}

/// Factory counting how many clients it built.
#[derive(Clone)]
pub struct FakeClientFactory {
    scenario: Scenario,
    created: Arc<AtomicUsize>,
}

impl FakeClientFactory {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ClientFactory for FakeClientFactory {
    fn create(&self, _credential: &ServicePrincipal) -> cloud::Result<Arc<dyn AppServiceClient>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeAppService {
            scenario: self.scenario.clone(),
        }))
    }
}
