//! Observable controller state.

use std::fmt;
use std::sync::Arc;

use crate::error::ErrorInfo;

/// What a controller is doing right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OperationState {
    #[default]
    Idle,
    /// A list fetch is in flight.
    Loading,
    /// A create, update, delete or toggle is in flight.
    Submitting,
    /// The last operation failed. Cleared when the next operation starts.
    Error(ErrorInfo),
}

impl OperationState {
    /// Whether a request is in flight. Views disable submit controls while busy.
    pub fn is_busy(&self) -> bool {
        matches!(self, OperationState::Loading | OperationState::Submitting)
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            OperationState::Error(info) => Some(info),
            _ => None,
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationState::Idle => write!(f, "idle"),
            OperationState::Loading => write!(f, "loading"),
            OperationState::Submitting => write!(f, "submitting"),
            OperationState::Error(info) => write!(f, "error ({}): {}", info.kind, info.message),
        }
    }
}

/// Snapshot published to views after every state transition.
#[derive(Debug, Clone)]
pub struct ListState<R> {
    pub items: Arc<Vec<R>>,
    pub status: OperationState,
    pub last_error: Option<ErrorInfo>,
}

impl<R> Default for ListState<R> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            status: OperationState::Idle,
            last_error: None,
        }
    }
}
