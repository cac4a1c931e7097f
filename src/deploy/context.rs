// ABOUTME: Shared mutable state of one deployment run and the views commands see of it.
// ABOUTME: Holds the job (workspace, sink), the command graph, settings, and the resolved profile.

use super::command::{CommandData, DataForCommand};
use super::site::SiteLayout;
use super::state::DeploymentState;
use super::transitions::TransitionTable;
use crate::cloud::{PublishingProfile, ServicePrincipal};
use crate::commands::{FtpDeployData, PublishSettingsData};
use crate::output::LogSink;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Host-job facts for a run: where the files are and where lines go.
#[derive(Clone)]
pub struct JobContext {
    workspace: PathBuf,
    sink: Arc<dyn LogSink>,
}

impl JobContext {
    pub fn new(workspace: impl Into<PathBuf>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            workspace: workspace.into(),
            sink,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("workspace", &self.workspace)
            .finish_non_exhaustive()
    }
}

/// User-supplied inputs of a deployment.
#[derive(Debug, Clone)]
pub struct DeploySettings {
    /// Comma-separated include patterns, relative to the source directory.
    pub files: String,
    pub source_dir: Option<String>,
    pub target_dir: Option<String>,
    pub resource_group: String,
    pub app_name: String,
    pub credential: Option<ServicePrincipal>,
    pub site: SiteLayout,
}

impl DeploySettings {
    pub fn new(files: impl Into<String>) -> Self {
        Self {
            files: files.into(),
            source_dir: None,
            target_dir: None,
            resource_group: String::new(),
            app_name: String::new(),
            credential: None,
            site: SiteLayout::default(),
        }
    }
}

/// State of one orchestration run.
///
/// The command graph is fixed at construction. Only the state and the
/// publishing profile change while commands run.
#[derive(Debug)]
pub struct DeploymentContext {
    state: DeploymentState,
    job: JobContext,
    transitions: TransitionTable,
    settings: DeploySettings,
    publishing_profile: Option<PublishingProfile>,
}

impl DeploymentContext {
    pub fn new(job: JobContext, transitions: TransitionTable, settings: DeploySettings) -> Self {
        Self {
            state: DeploymentState::Unknown,
            job,
            transitions,
            settings,
            publishing_profile: None,
        }
    }

    /// Seed the profile, for runs that skip the lookup command.
    pub fn with_publishing_profile(mut self, profile: PublishingProfile) -> Self {
        self.publishing_profile = Some(profile);
        self
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn settings(&self) -> &DeploySettings {
        &self.settings
    }

    pub fn publishing_profile(&self) -> Option<&PublishingProfile> {
        self.publishing_profile.as_ref()
    }
}

impl CommandData for DeploymentContext {
    fn job(&self) -> &JobContext {
        &self.job
    }

    fn deployment_state(&self) -> DeploymentState {
        self.state
    }

    fn set_deployment_state(&mut self, state: DeploymentState) {
        self.state = state;
    }
}

impl FtpDeployData for DeploymentContext {
    fn file_pattern(&self) -> &str {
        &self.settings.files
    }

    fn source_directory(&self) -> Option<&str> {
        self.settings.source_dir.as_deref()
    }

    fn target_directory(&self) -> Option<&str> {
        self.settings.target_dir.as_deref()
    }

    fn site(&self) -> &SiteLayout {
        &self.settings.site
    }

    fn publishing_profile(&self) -> Option<&PublishingProfile> {
        self.publishing_profile.as_ref()
    }
}

impl PublishSettingsData for DeploymentContext {
    fn resource_group(&self) -> &str {
        &self.settings.resource_group
    }

    fn app_name(&self) -> &str {
        &self.settings.app_name
    }

    fn credential(&self) -> Option<&ServicePrincipal> {
        self.settings.credential.as_ref()
    }

    fn set_publishing_profile(&mut self, profile: PublishingProfile) {
        self.publishing_profile = Some(profile);
    }
}

impl DataForCommand<dyn CommandData> for DeploymentContext {
    fn data_for_command(&mut self) -> &mut (dyn CommandData + 'static) {
        self
    }
}

impl DataForCommand<dyn FtpDeployData> for DeploymentContext {
    fn data_for_command(&mut self) -> &mut (dyn FtpDeployData + 'static) {
        self
    }
}

impl DataForCommand<dyn PublishSettingsData> for DeploymentContext {
    fn data_for_command(&mut self) -> &mut (dyn PublishSettingsData + 'static) {
        self
    }
}
