//! Building blocks of a hierarchical state machine.
//!
//! This module contains the value-level pieces a machine is assembled from:
//! - `Event` tokens that trigger transitions
//! - `State` nodes with entry/exit chains and optional child machines
//! - `Transition` records in three kinds (normal, self, null)
//! - `Guard` predicates and the callback types user code plugs in through

mod event;
mod guard;
mod state;
mod transition;

pub use event::Event;
pub use guard::{callback, Callback, CallbackError, CallbackResult, Guard};
pub use state::{State, StateId, StateKind, DEFAULT_EXIT_STATUS};
pub use transition::{Transition, TransitionKind};
