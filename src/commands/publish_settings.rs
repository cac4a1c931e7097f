// ABOUTME: Resolves the web app's FTP publishing profile through the management API.
// ABOUTME: Stores the profile in the context for the upload command that follows.

use crate::cloud::{self, ClientCache, PublishingProfile, ServicePrincipal};
use crate::deploy::{Command, CommandData, DeploymentState, Outcome, describe_error};
use async_trait::async_trait;
use std::sync::Arc;

/// What the publish settings command reads from and writes to the context.
pub trait PublishSettingsData: CommandData {
    fn resource_group(&self) -> &str;

    fn app_name(&self) -> &str;

    fn credential(&self) -> Option<&ServicePrincipal>;

    fn set_publishing_profile(&mut self, profile: PublishingProfile);
}

pub struct GetPublishSettingsCommand {
    clients: Arc<ClientCache>,
}

impl GetPublishSettingsCommand {
    pub fn new(clients: Arc<ClientCache>) -> Self {
        Self { clients }
    }

    async fn lookup(
        &self,
        credential: &ServicePrincipal,
        resource_group: &str,
        app_name: &str,
    ) -> cloud::Result<Option<PublishingProfile>> {
        let client = self.clients.get_client(credential)?;
        match client.find_web_app(resource_group, app_name).await? {
            Some(app) => client.publishing_profile(&app).await.map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Command for GetPublishSettingsCommand {
    type Data = dyn PublishSettingsData;

    async fn execute(&self, data: &mut Self::Data) -> Outcome {
        data.log_status("Retrieving publish settings");

        let Some(credential) = data.credential().cloned() else {
            data.log_error("Error retrieving publish settings: no credential configured");
            return Outcome::Failed;
        };
        let resource_group = data.resource_group().to_string();
        let app_name = data.app_name().to_string();

        match self.lookup(&credential, &resource_group, &app_name).await {
            Ok(Some(profile)) => {
                data.set_publishing_profile(profile);
                data.set_deployment_state(DeploymentState::Success);
                data.log_status("Successfully retrieved publish settings");
                Outcome::Succeeded
            }
            Ok(None) => {
                data.log_error(&format!(
                    "App {} in resource group {} not found",
                    app_name, resource_group
                ));
                Outcome::Failed
            }
            Err(e) => {
                data.log_error(&format!(
                    "Error retrieving publish settings: {}",
                    describe_error(&e)
                ));
                Outcome::Failed
            }
        }
    }
}
