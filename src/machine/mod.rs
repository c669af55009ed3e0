//! The dispatch engine.
//!
//! A `StateMachine` owns its states, events, and transitions, tracks the
//! current state, and routes triggered events either through its own
//! transition table or down into the current state's child machine.
//!
//! # Key Concepts
//!
//! - **Registration order**: the earliest-registered matching transition wins
//! - **Exit sentinel**: every machine owns one; reaching it ends the cycle
//! - **Propagation**: forwarding an event to a nested machine

mod error;
#[allow(clippy::module_inception)]
mod machine;

pub use error::MachineError;
pub use machine::{ExitCallback, MachineId, StateMachine, TriggerOutcome};
