//! States, their entry/exit chains, and nested machines.

use super::guard::{Callback, CallbackResult};
use crate::log::{null_sink, Level, SharedSink};
use crate::machine::{MachineError, MachineId, StateMachine};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Status used by the exit sentinel every machine creates.
pub const DEFAULT_EXIT_STATUS: &str = "Normal";

/// Explicit key identifying a state inside a machine.
///
/// The key is the state's name. Two states sharing a name share a key and
/// are treated as the same state by registries and transition matching.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(Arc<str>);

impl StateId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StateId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StateId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&StateId> for StateId {
    fn from(id: &StateId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for StateId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Distinguishes ordinary states from exit sentinels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateKind {
    Regular,
    /// Terminal sentinel. Its name is `status + "ExitState"`.
    Exit { status: Arc<str> },
}

/// A named node with ordered entry/exit callbacks and an optional child
/// machine.
///
/// A state is owned by the machine it is registered in; it keeps only the
/// [`MachineId`] of that parent. A child machine, when present, is owned by
/// the state and is started, stopped, and fed propagated events through it.
///
/// # Example
///
/// ```rust
/// use hfsm::core::State;
///
/// let mut idle: State<u32> = State::new("Idle");
/// idle.on_entry(|n: &u32| {
///     println!("entered with {n}");
///     Ok(())
/// });
///
/// assert_eq!(idle.name(), "Idle");
/// assert!(!idle.has_child_sm());
/// ```
pub struct State<D> {
    id: StateId,
    kind: StateKind,
    entry_callbacks: Vec<Callback<D>>,
    exit_callbacks: Vec<Callback<D>>,
    child: Option<Box<StateMachine<D>>>,
    parent: Option<MachineId>,
    log: SharedSink,
}

impl<D> State<D> {
    pub fn new(name: impl Into<StateId>) -> Self {
        Self::with_kind(name.into(), StateKind::Regular)
    }

    /// Create a state that owns `child` from the start.
    pub fn with_child(name: impl Into<StateId>, child: StateMachine<D>) -> Self {
        let mut state = Self::new(name);
        state.child = Some(Box::new(child));
        state
    }

    /// Create an exit sentinel named `status + "ExitState"`.
    pub fn exit(status: impl Into<Arc<str>>) -> Self {
        let status = status.into();
        let id = StateId::new(format!("{status}ExitState"));
        Self::with_kind(id, StateKind::Exit { status })
    }

    fn with_kind(id: StateId, kind: StateKind) -> Self {
        Self {
            id,
            kind,
            entry_callbacks: Vec::new(),
            exit_callbacks: Vec::new(),
            child: None,
            parent: None,
            log: null_sink(),
        }
    }

    pub fn name(&self) -> &str {
        self.id.as_str()
    }

    pub fn id(&self) -> &StateId {
        &self.id
    }

    pub fn kind(&self) -> &StateKind {
        &self.kind
    }

    pub fn is_exit(&self) -> bool {
        matches!(self.kind, StateKind::Exit { .. })
    }

    /// Status of an exit sentinel, `None` for regular states.
    pub fn exit_status(&self) -> Option<&str> {
        match &self.kind {
            StateKind::Exit { status } => Some(&**status),
            StateKind::Regular => None,
        }
    }

    /// Append an entry callback. Callbacks run in registration order.
    pub fn on_entry<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(&D) -> CallbackResult + Send + 'static,
    {
        self.entry_callbacks.push(Box::new(callback));
        self
    }

    /// Append an exit callback. Callbacks run in registration order.
    pub fn on_exit<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(&D) -> CallbackResult + Send + 'static,
    {
        self.exit_callbacks.push(Box::new(callback));
        self
    }

    /// Attach (or replace) the child machine.
    ///
    /// Fails if `child` is the machine this state is registered in.
    pub fn set_child_sm(&mut self, child: StateMachine<D>) -> Result<(), MachineError> {
        if self.parent == Some(child.id()) {
            return Err(MachineError::HierarchyCycle {
                state: self.name().to_string(),
            });
        }
        self.child = Some(Box::new(child));
        Ok(())
    }

    /// Record the machine this state is registered in.
    ///
    /// Fails if `parent` is this state's own child machine.
    pub fn set_parent_sm(&mut self, parent: MachineId) -> Result<(), MachineError> {
        if self.child.as_ref().is_some_and(|c| c.id() == parent) {
            return Err(MachineError::HierarchyCycle {
                state: self.name().to_string(),
            });
        }
        self.parent = Some(parent);
        Ok(())
    }

    pub fn has_child_sm(&self) -> bool {
        self.child.is_some()
    }

    pub fn child_sm(&self) -> Option<&StateMachine<D>> {
        self.child.as_deref()
    }

    pub fn child_sm_mut(&mut self) -> Option<&mut StateMachine<D>> {
        self.child.as_deref_mut()
    }

    pub fn parent_sm(&self) -> Option<MachineId> {
        self.parent
    }

    pub(crate) fn set_log_sink(&mut self, sink: SharedSink) {
        self.log = sink;
    }

    /// Run the entry chain, then start the child machine if any.
    ///
    /// The first failing callback aborts the chain. Callbacks that already
    /// ran are not undone.
    pub fn start(&mut self, data: &D) -> Result<(), MachineError> {
        self.log.log(Level::Debug, &format!("Entering {}", self.id));
        for callback in &mut self.entry_callbacks {
            callback(data).map_err(MachineError::Callback)?;
        }
        if let Some(child) = self.child.as_deref_mut() {
            child.start(data)?;
        }
        Ok(())
    }

    /// Run the exit chain, then stop the child machine if any.
    pub fn stop(&mut self, data: &D) -> Result<(), MachineError> {
        self.log.log(Level::Debug, &format!("Exiting {}", self.id));
        for callback in &mut self.exit_callbacks {
            callback(data).map_err(MachineError::Callback)?;
        }
        if let Some(child) = self.child.as_deref_mut() {
            child.stop(data)?;
        }
        Ok(())
    }
}

impl<D> PartialEq for State<D> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<D> Eq for State<D> {}

impl<D> fmt::Display for State<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State={}", self.id)
    }
}

impl<D> fmt::Debug for State<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("entry_callbacks", &self.entry_callbacks.len())
            .field("exit_callbacks", &self.exit_callbacks.len())
            .field("child", &self.child.as_ref().map(|c| c.name().to_string()))
            .field("parent", &self.parent)
            .finish()
    }
}
