//! Builder API for declarative machine assembly.
//!
//! The imperative `StateMachine` API mirrors the classic registry calls and
//! reports unknown references by returning `None`. The builder collects the
//! same pieces and validates them all at `build()`, turning every dangling
//! reference into a [`BuildError`].
//!
//! # Example
//!
//! ```
//! use hfsm::builder::{MachineBuilder, TransitionSpec};
//! use hfsm::core::{Event, State};
//!
//! let mut machine = MachineBuilder::<()>::new("switch")
//!     .initial(State::new("Off"))
//!     .state(State::new("On"))
//!     .events(["flip"])
//!     .transition(TransitionSpec::normal("Off", "On", "flip"))
//!     .transition(TransitionSpec::normal("On", "Off", "flip"))
//!     .build()
//!     .unwrap();
//!
//! machine.start(&()).unwrap();
//! machine.trigger_event(&Event::new("flip"), &(), false).unwrap();
//! assert_eq!(machine.current_state().unwrap().name(), "On");
//! ```

pub mod error;
pub mod machine;
pub mod transition;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use transition::TransitionSpec;
