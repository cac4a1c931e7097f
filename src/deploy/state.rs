// ABOUTME: Deployment state shared by all commands of one run.
// ABOUTME: HasError and Done are terminal; the orchestrator stops on either.

use serde::Serialize;
use std::fmt;

/// Status of a deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DeploymentState {
    /// Not started yet.
    #[default]
    Unknown,
    /// Orchestration in progress.
    Running,
    /// The last command completed successfully.
    Success,
    /// The command graph reached its end.
    Done,
    /// A command reported an error. Sticky for the rest of the run.
    HasError,
}

impl DeploymentState {
    /// Whether orchestration must stop.
    pub fn is_finished(self) -> bool {
        matches!(self, DeploymentState::HasError | DeploymentState::Done)
    }

    pub fn is_error(self) -> bool {
        self == DeploymentState::HasError
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeploymentState::Unknown => "unknown",
            DeploymentState::Running => "running",
            DeploymentState::Success => "success",
            DeploymentState::Done => "done",
            DeploymentState::HasError => "error",
        };
        write!(f, "{}", s)
    }
}
