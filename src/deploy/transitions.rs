// ABOUTME: Command graph for a deployment run: which command follows which outcome.
// ABOUTME: Tables are built once, validated, and never mutated afterwards.

use super::error::{
    CyclicSuccessPathSnafu, TransitionError, UnknownStartSnafu, UnknownTargetSnafu,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Stable identifier for a command type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandKind {
    GetPublishSettings,
    FtpDeploy,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandKind::GetPublishSettings => "GetPublishSettings",
            CommandKind::FtpDeploy => "FtpDeploy",
        };
        write!(f, "{}", s)
    }
}

/// Result of executing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Where the orchestrator goes after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Command(CommandKind),
    Finish,
}

/// Successor choice for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub on_success: Next,
    pub on_failure: Next,
}

impl Transition {
    pub fn next(&self, outcome: Outcome) -> Next {
        match outcome {
            Outcome::Succeeded => self.on_success,
            Outcome::Failed => self.on_failure,
        }
    }
}

/// Immutable command graph with a start command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    start: CommandKind,
    entries: HashMap<CommandKind, Transition>,
}

impl TransitionTable {
    pub fn builder() -> TransitionTableBuilder {
        TransitionTableBuilder::default()
    }

    /// Look up the publishing profile, then upload over FTP.
    pub fn publish_and_deploy() -> Self {
        Self::builder()
            .on(
                CommandKind::GetPublishSettings,
                Next::Command(CommandKind::FtpDeploy),
                Next::Finish,
            )
            .on(CommandKind::FtpDeploy, Next::Finish, Next::Finish)
            .build_unchecked(CommandKind::GetPublishSettings)
    }

    /// Upload over FTP with a publishing profile supplied up front.
    pub fn deploy_only() -> Self {
        Self::builder()
            .on(CommandKind::FtpDeploy, Next::Finish, Next::Finish)
            .build_unchecked(CommandKind::FtpDeploy)
    }

    pub fn start(&self) -> CommandKind {
        self.start
    }

    pub fn get(&self, kind: CommandKind) -> Option<&Transition> {
        self.entries.get(&kind)
    }

    /// Successor of `kind` for the given outcome, or `None` if `kind` has no entry.
    pub fn next(&self, kind: CommandKind, outcome: Outcome) -> Option<Next> {
        self.entries.get(&kind).map(|t| t.next(outcome))
    }

    /// Every command the table can reach.
    pub fn kinds(&self) -> impl Iterator<Item = CommandKind> + '_ {
        self.entries.keys().copied()
    }
}

#[derive(Debug, Default)]
pub struct TransitionTableBuilder {
    entries: HashMap<CommandKind, Transition>,
}

impl TransitionTableBuilder {
    /// Register the successors of `kind`. A later call for the same kind replaces the earlier one.
    pub fn on(mut self, kind: CommandKind, on_success: Next, on_failure: Next) -> Self {
        self.entries.insert(
            kind,
            Transition {
                on_success,
                on_failure,
            },
        );
        self
    }

    /// Validate and freeze the table.
    ///
    /// # Errors
    ///
    /// Fails when `start` or any `Next::Command` target has no entry, or when
    /// following success edges from `start` revisits a command.
    pub fn build(self, start: CommandKind) -> Result<TransitionTable, TransitionError> {
        if !self.entries.contains_key(&start) {
            return UnknownStartSnafu { start }.fail();
        }

        let mut from_kinds: Vec<_> = self.entries.keys().copied().collect();
        from_kinds.sort_by_key(|k| k.to_string());
        for from in from_kinds {
            let t = self.entries[&from];
            for next in [t.on_success, t.on_failure] {
                if let Next::Command(target) = next
                    && !self.entries.contains_key(&target)
                {
                    return UnknownTargetSnafu { from, target }.fail();
                }
            }
        }

        let mut seen = HashSet::from([start]);
        let mut current = start;
        while let Next::Command(next) = self.entries[&current].on_success {
            if !seen.insert(next) {
                return CyclicSuccessPathSnafu { start, kind: next }.fail();
            }
            current = next;
        }

        Ok(TransitionTable {
            start,
            entries: self.entries,
        })
    }

    fn build_unchecked(self, start: CommandKind) -> TransitionTable {
        TransitionTable {
            start,
            entries: self.entries,
        }
    }
}
