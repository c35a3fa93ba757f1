//! Foundation types for the BPMN compiler.
//!
//! This module provides fundamental types used throughout the compiler:
//! - [`ActivityId`], [`TransitionId`], [`ScopeId`] - Arena indices of the graph
//! - [`Position`], [`LineIndex`] - Byte offset to line conversion
//! - Namespace URIs and fixed names ([`constants`])
//!
//! This module has NO dependencies on other compiler modules.

pub mod constants;
mod ids;
mod position;

pub use ids::{ActivityId, ScopeId, TransitionId};
pub use position::{LineIndex, Position};
