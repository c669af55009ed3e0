//! Machine error types.

use crate::core::CallbackError;
use thiserror::Error;

/// Errors raised by machine and state operations.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("initial state is not set for machine '{machine}'")]
    NoInitialState { machine: String },

    #[error("state machine '{machine}' has not been started")]
    NotStarted { machine: String },

    #[error("state '{state}' is already registered in machine '{machine}'")]
    DuplicateState { machine: String, state: String },

    #[error("state '{state}' cannot use the same machine as child and parent")]
    HierarchyCycle { state: String },

    /// A user callback failed. The error is passed through unchanged.
    #[error(transparent)]
    Callback(CallbackError),
}

impl MachineError {
    /// Returns whether this error reports misuse of the API rather than a
    /// failing user callback.
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, MachineError::Callback(_))
    }

    /// Recover the original callback error, if this is one.
    pub fn into_callback_error(self) -> Option<CallbackError> {
        match self {
            MachineError::Callback(e) => Some(e),
            _ => None,
        }
    }
}
