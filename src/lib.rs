//! # bpmn
//!
//! Compiler from BPMN 2.0 XML process definitions to an executable process
//! graph.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! parser      → BpmnParser, per-document passes, ParseOptions
//!   ↓
//! listener    → ParseListener hooks invoked after each construct
//!   ↓
//! registry    → messages, signals, errors, escalations of a document
//!   ↓
//! model       → ProcessDefinition, activities, transitions, declarations
//!   ↓
//! expression  → ExpressionManager, ScriptFactory, compiled handles
//!   ↓
//! diagnostics → Diagnostic, DiagnosticCollector, ParseReport
//!   ↓
//! xml         → Element tree, namespaces, quick-xml reader
//!   ↓
//! base        → ActivityId/ScopeId/TransitionId, positions, constants
//! ```

// ============================================================================
// MODULES (dependency order: base → xml → diagnostics → expression → model → registry → listener → parser)
// ============================================================================

/// Foundation types: arena ids, line positions, namespace constants
pub mod base;

/// Element tree and the XML reader
pub mod xml;

/// Diagnostics collected while compiling
pub mod diagnostics;

/// Errors that end a compilation
pub mod error;

/// Expression and script compilation services
pub mod expression;

/// The compiled process graph
pub mod model;

/// Definitions shared by all processes of a document
pub mod registry;

/// Hooks for customizing the compiled graph
pub mod listener;

/// The compiler
pub mod parser;

// Re-export the entry points
pub use diagnostics::{Diagnostic, ParseErrors, ParseReport, Severity};
pub use error::CompileError;
pub use listener::{ListenerError, ListenerResult, ParseListener};
pub use model::{Activity, ActivityType, Behavior, ProcessDefinition, Transition};
pub use parser::{BpmnParser, ParseOptions, ParseOutput};
