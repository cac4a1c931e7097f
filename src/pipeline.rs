// ABOUTME: Wires configuration, commands, and the orchestrator into runnable deployments.
// ABOUTME: Used by the CLI; tests drive the same entry points with fake transports.

use crate::cloud::{ArmClientFactory, ClientCache, PublishingProfile};
use crate::commands::{FtpDeployCommand, GetPublishSettingsCommand};
use crate::config::Config;
use crate::deploy::{
    CommandKind, DeploymentContext, DeploymentState, JobContext, Next, Orchestrator,
    TransitionTable,
};
use crate::error::{Error, Result};
use crate::ftp::{FileTransfer, FtpSession, TransferFactory};
use crate::output::LogSink;
use std::path::Path;
use std::sync::Arc;

/// Client cache backed by the Resource Manager API.
pub fn client_cache(config: &Config) -> Arc<ClientCache> {
    Arc::new(ClientCache::new(
        ArmClientFactory::new(config.management.clone()),
        config.management.cache_ttl,
    ))
}

/// Factory for real FTP sessions.
pub fn ftp_sessions(config: &Config) -> impl TransferFactory + 'static {
    let ftp = config.ftp.clone();
    move || Box::new(FtpSession::new(ftp.clone())) as Box<dyn FileTransfer>
}

/// Run a full deployment and return the terminal state.
pub async fn deploy(
    config: &Config,
    workspace: &Path,
    sink: Arc<dyn LogSink>,
    clients: Arc<ClientCache>,
    transfers: impl TransferFactory + 'static,
) -> Result<DeploymentState> {
    let table = config.transition_table();
    let orchestrator = Orchestrator::new()
        .register(
            CommandKind::GetPublishSettings,
            GetPublishSettingsCommand::new(clients),
        )
        .register(CommandKind::FtpDeploy, FtpDeployCommand::new(transfers))
        .max_steps(config.max_steps);
    orchestrator.validate(&table)?;

    let mut ctx = DeploymentContext::new(
        JobContext::new(workspace, sink),
        table,
        config.deploy_settings()?,
    );
    if let Some(profile) = config.resolve_publish_profile()? {
        ctx = ctx.with_publishing_profile(profile);
    }

    let state = orchestrator.run(&mut ctx).await;
    tracing::debug!("Deployment finished in state {}", state);
    Ok(state)
}

/// Look up the publishing profile without deploying.
pub async fn fetch_profile(
    config: &Config,
    workspace: &Path,
    sink: Arc<dyn LogSink>,
    clients: Arc<ClientCache>,
) -> Result<PublishingProfile> {
    if let Some(profile) = config.resolve_publish_profile()? {
        return Ok(profile);
    }

    let table = TransitionTable::builder()
        .on(CommandKind::GetPublishSettings, Next::Finish, Next::Finish)
        .build(CommandKind::GetPublishSettings)?;
    let orchestrator = Orchestrator::new()
        .register(
            CommandKind::GetPublishSettings,
            GetPublishSettingsCommand::new(clients),
        )
        .max_steps(config.max_steps);

    let mut ctx = DeploymentContext::new(
        JobContext::new(workspace, sink),
        table,
        config.deploy_settings()?,
    );

    match orchestrator.run(&mut ctx).await {
        DeploymentState::Done => ctx
            .publishing_profile()
            .cloned()
            .ok_or(Error::DeploymentFailed),
        _ => Err(Error::DeploymentFailed),
    }
}
