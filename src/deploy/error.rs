// ABOUTME: Error types for command graph construction with SNAFU pattern.
// ABOUTME: Reports unknown start commands, dangling targets, and success-path cycles.

use snafu::Snafu;

use super::transitions::CommandKind;

/// A transition table or command registry that cannot be driven safely.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransitionError {
    #[snafu(display("start command {start} has no transition entry"))]
    UnknownStart { start: CommandKind },

    #[snafu(display("{from} transitions to {target}, which has no transition entry"))]
    UnknownTarget {
        from: CommandKind,
        target: CommandKind,
    },

    #[snafu(display("success path from {start} revisits {kind}"))]
    CyclicSuccessPath {
        start: CommandKind,
        kind: CommandKind,
    },

    #[snafu(display("no command registered for {kind}"))]
    MissingCommand { kind: CommandKind },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionErrorKind {
    UnknownStart,
    UnknownTarget,
    CyclicSuccessPath,
    MissingCommand,
}

impl TransitionError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> TransitionErrorKind {
        match self {
            TransitionError::UnknownStart { .. } => TransitionErrorKind::UnknownStart,
            TransitionError::UnknownTarget { .. } => TransitionErrorKind::UnknownTarget,
            TransitionError::CyclicSuccessPath { .. } => TransitionErrorKind::CyclicSuccessPath,
            TransitionError::MissingCommand { .. } => TransitionErrorKind::MissingCommand,
        }
    }
}
