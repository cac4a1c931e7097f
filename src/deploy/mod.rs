// ABOUTME: Deployment state machine: context, commands, command graph, and orchestration.
// ABOUTME: Commands mutate a shared context; a transition table picks the next command.

mod command;
mod context;
mod error;
mod orchestrator;
mod site;
mod state;
mod transitions;

pub use command::{Command, CommandData, DataForCommand, describe_error};
pub use context::{DeploySettings, DeploymentContext, JobContext};
pub use error::{TransitionError, TransitionErrorKind};
pub use orchestrator::{DEFAULT_MAX_STEPS, Orchestrator, Step};
pub use site::SiteLayout;
pub use state::DeploymentState;
pub use transitions::{
    CommandKind, Next, Outcome, Transition, TransitionTable, TransitionTableBuilder,
};
