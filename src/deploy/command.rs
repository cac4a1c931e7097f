// ABOUTME: Command abstraction: a unit of work that reads and mutates a narrow view of the context.
// ABOUTME: Logging primitives live on the view so every command reports errors the same way.

use super::context::JobContext;
use super::state::DeploymentState;
use super::transitions::Outcome;
use async_trait::async_trait;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;

/// Base capability every command view provides.
pub trait CommandData: Send + Sync {
    fn job(&self) -> &JobContext;

    fn deployment_state(&self) -> DeploymentState;

    /// Overwrite the state unconditionally.
    fn set_deployment_state(&mut self, state: DeploymentState);

    /// Write an informational line. Never changes state.
    fn log_status(&self, message: &str) {
        tracing::info!("{}", message);
        self.job().sink().status(message);
    }

    /// Write an error line and mark the run as failed.
    fn log_error(&mut self, message: &str) {
        tracing::error!("{}", message);
        self.job().sink().error(message);
        self.set_deployment_state(DeploymentState::HasError);
    }

    /// Write `prefix` followed by the error and its causes, then mark the run as failed.
    fn log_fault(&mut self, prefix: &str, error: &(dyn StdError + 'static)) {
        let message = format!("{}{}", prefix, describe_error(error));

        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            tracing::debug!("{}\n{}", message, backtrace);
        }

        self.log_error(&message);
    }

    fn is_finished(&self) -> bool {
        self.deployment_state().is_finished()
    }

    fn has_error(&self) -> bool {
        self.deployment_state().is_error()
    }
}

/// Render an error with its source chain, skipping causes already spelled out by their parent.
pub fn describe_error(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// A deployment step.
///
/// Commands hold no orchestration state. `execute` reports problems through
/// the view's logging primitives and returns `Outcome::Failed` when it did.
#[async_trait]
pub trait Command: Send + Sync {
    /// The capability view this command works against.
    type Data: CommandData + ?Sized;

    async fn execute(&self, data: &mut Self::Data) -> Outcome;
}

/// Narrows a full context to the view a command needs.
pub trait DataForCommand<D: ?Sized> {
    fn data_for_command(&mut self) -> &mut D;
}
