// ABOUTME: Drives a deployment context through its command graph until a terminal state.
// ABOUTME: Guards each command against panics and bounds the number of executions.

use super::command::{Command, CommandData, DataForCommand};
use super::context::DeploymentContext;
use super::error::{MissingCommandSnafu, TransitionError};
use super::state::DeploymentState;
use super::transitions::{CommandKind, Next, Outcome, TransitionTable};
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

/// Default ceiling on command executions per run.
pub const DEFAULT_MAX_STEPS: usize = 32;

/// A command bound to the full deployment context.
#[async_trait]
pub trait Step: Send + Sync {
    async fn run(&self, ctx: &mut DeploymentContext) -> Outcome;
}

#[async_trait]
impl<C> Step for C
where
    C: Command + 'static,
    DeploymentContext: DataForCommand<C::Data>,
{
    async fn run(&self, ctx: &mut DeploymentContext) -> Outcome {
        let data = <DeploymentContext as DataForCommand<C::Data>>::data_for_command(ctx);
        self.execute(data).await
    }
}

/// Registry of commands plus the loop that runs them.
pub struct Orchestrator {
    steps: HashMap<CommandKind, Box<dyn Step>>,
    max_steps: usize,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn register(mut self, kind: CommandKind, step: impl Step + 'static) -> Self {
        self.steps.insert(kind, Box::new(step));
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Check that every command the table names has a registered implementation.
    pub fn validate(&self, table: &TransitionTable) -> Result<(), TransitionError> {
        let mut kinds: Vec<_> = table.kinds().collect();
        kinds.sort_by_key(|k| k.to_string());
        for kind in kinds {
            if !self.steps.contains_key(&kind) {
                return MissingCommandSnafu { kind }.fail();
            }
        }
        Ok(())
    }

    /// Run commands from the table's start until the context is finished.
    pub async fn run(&self, ctx: &mut DeploymentContext) -> DeploymentState {
        if ctx.deployment_state() == DeploymentState::Unknown {
            ctx.set_deployment_state(DeploymentState::Running);
        }

        let mut current = ctx.transitions().start();
        let mut executed = 0;

        while !ctx.is_finished() {
            if executed >= self.max_steps {
                ctx.log_error(&format!(
                    "Deployment exceeded the limit of {} command executions",
                    self.max_steps
                ));
                break;
            }

            let Some(step) = self.steps.get(&current) else {
                ctx.log_error(&format!("No command registered for {}", current));
                break;
            };

            tracing::debug!("Executing command {}", current);
            executed += 1;
            let outcome = match AssertUnwindSafe(step.run(ctx)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => {
                    ctx.log_error(&format!(
                        "Command {} panicked: {}",
                        current,
                        panic_message(panic.as_ref())
                    ));
                    Outcome::Failed
                }
            };

            if ctx.is_finished() {
                break;
            }

            match ctx.transitions().next(current, outcome) {
                None => {
                    ctx.log_error(&format!("No transition defined for {}", current));
                }
                Some(Next::Command(next)) => {
                    tracing::debug!("{} {:?}, continuing with {}", current, outcome, next);
                    current = next;
                }
                Some(Next::Finish) if outcome == Outcome::Failed => {
                    ctx.log_error(&format!("{} failed", current));
                }
                Some(Next::Finish) => {
                    ctx.set_deployment_state(DeploymentState::Done);
                }
            }
        }

        ctx.deployment_state()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
