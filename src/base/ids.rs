//! Arena indices for the compiled process graph.
//!
//! Activities and transitions live in flat vectors owned by their
//! [`ProcessDefinition`](crate::model::ProcessDefinition). Structural parents,
//! event scopes and transition endpoints refer to each other through these
//! indices, never through references, because the graph is not a tree: an
//! activity's event scope may point sideways or upwards independently of its
//! flow scope.

use std::fmt;

/// Index of an activity in its process definition's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityId(u32);

impl ActivityId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "activity#{}", self.0)
    }
}

/// Index of a transition in its process definition's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(u32);

impl TransitionId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A scope of the graph: the process itself or an activity that is also a
/// scope (subprocess, transaction, multi-instance body, scoped task).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeId {
    Process,
    Activity(ActivityId),
}

impl ScopeId {
    pub fn activity(self) -> Option<ActivityId> {
        match self {
            ScopeId::Process => None,
            ScopeId::Activity(id) => Some(id),
        }
    }

    pub fn is_process(self) -> bool {
        matches!(self, ScopeId::Process)
    }
}

impl From<ActivityId> for ScopeId {
    fn from(id: ActivityId) -> Self {
        ScopeId::Activity(id)
    }
}
