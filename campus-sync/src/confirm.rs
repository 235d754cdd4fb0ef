//! User confirmation before destructive actions.
//!
//! Views ask a gate before calling `remove`; the controller itself never
//! prompts.

use async_trait::async_trait;

#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    /// Ask the user a yes/no question. `true` means proceed.
    async fn confirm(&self, message: &str) -> bool;
}

/// Gate for non-interactive use: approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

#[async_trait]
impl ConfirmationGate for AssumeYes {
    async fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Gate that refuses everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeNo;

#[async_trait]
impl ConfirmationGate for AssumeNo {
    async fn confirm(&self, _message: &str) -> bool {
        false
    }
}
