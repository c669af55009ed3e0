//! Hfsm: a hierarchical finite state machine engine
//!
//! Callers declare states, events, and transitions, start the machine, and
//! trigger events. Each trigger resolves to at most one transition, which
//! runs exit and entry chains. A state may own a child machine, so machines
//! nest to any depth; starting or stopping a state cascades into its child,
//! and triggered events can be propagated down to it.
//!
//! # Core Concepts
//!
//! - **Event**: a named token that triggers transitions
//! - **State**: a named node with entry/exit callbacks and an optional child machine
//! - **Transition**: normal, self, or null; optionally guarded, with an optional action
//! - **StateMachine**: registries, the current-state pointer, and dispatch
//!
//! Logging goes through an injected [`log::LogSink`]; nothing is logged
//! unless a sink is installed.
//!
//! # Example
//!
//! ```rust
//! use hfsm::core::{Event, State};
//! use hfsm::machine::StateMachine;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pings = Arc::new(AtomicUsize::new(0));
//!
//! let mut machine: StateMachine<()> = StateMachine::new("worker");
//! let idle = machine.add_state(State::new("Idle"), true).unwrap();
//! let running = machine.add_state(State::new("Running"), false).unwrap();
//! let go = Event::new("go");
//! let ping = Event::new("ping");
//! machine.add_event(go.clone());
//! machine.add_event(ping.clone());
//! machine.add_transition(&idle, &running, &go);
//!
//! let counter = Arc::clone(&pings);
//! machine
//!     .add_null_transition(&running, &ping)
//!     .unwrap()
//!     .add_action(move |_| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     });
//!
//! machine.start(&()).unwrap();
//! machine.trigger_event(&go, &(), false).unwrap();
//! machine.trigger_event(&ping, &(), false).unwrap();
//!
//! assert_eq!(machine.current_state().unwrap().name(), "Running");
//! assert_eq!(pings.load(Ordering::SeqCst), 1);
//! ```

pub mod builder;
pub mod core;
pub mod log;
pub mod machine;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder, TransitionSpec};
pub use crate::core::{Event, Guard, State, StateId, Transition, TransitionKind};
pub use log::{Level, LogSink, NullSink, TracingSink};
pub use machine::{MachineError, MachineId, StateMachine, TriggerOutcome};
