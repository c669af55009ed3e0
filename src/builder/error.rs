//! Build errors for the machine builder.

use crate::machine::MachineError;
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Transition refers to unknown state '{state}'. Add it with .state() or .initial()")]
    UnknownState { state: String },

    #[error("Transition refers to unknown event '{event}'. Add it with .event()")]
    UnknownEvent { event: String },

    #[error(transparent)]
    Machine(#[from] MachineError),
}
