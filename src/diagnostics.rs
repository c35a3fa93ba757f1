//! Diagnostics: parse error reporting.
//!
//! Every document defect found while compiling becomes a [`Diagnostic`] in a
//! [`DiagnosticCollector`]. Nothing is raised individually: at the end of the
//! pass the collector is turned into a [`ParseReport`], warnings are flushed to
//! the log and, if any error was recorded, the whole report is returned as a
//! single [`ParseErrors`] value.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;

use crate::xml::Element;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Deployment-fatal.
    Error,
    /// Logged; compilation result stays usable.
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Name of the compiled resource.
    pub resource: Arc<str>,
    /// Line of the offending element (1-indexed, 0 when unknown).
    pub line: u32,
    /// Ids of the BPMN elements involved.
    pub element_ids: Vec<SmolStr>,
    /// Severity level.
    pub severity: Severity,
    /// Error/warning code (e.g., "E0201").
    pub code: Option<Arc<str>>,
    /// The diagnostic message.
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Warning, message)
    }

    fn new(severity: Severity, message: impl Into<Arc<str>>) -> Self {
        Self {
            resource: Arc::from(""),
            line: 0,
            element_ids: Vec::new(),
            severity,
            code: None,
            message: message.into(),
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Take the line of `element`.
    pub fn at(self, element: &Element) -> Self {
        self.with_line(element.line())
    }

    /// Add the id of an element involved in this diagnostic.
    pub fn with_element_id(mut self, id: impl Into<SmolStr>) -> Self {
        let id = id.into();
        if !id.is_empty() {
            self.element_ids.push(id);
        }
        self
    }

    pub fn with_element_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        for id in ids {
            self = self.with_element_id(id);
        }
        self
    }

    pub fn with_resource(mut self, resource: Arc<str>) -> Self {
        self.resource = resource;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "[{code}] ")?;
        }
        write!(f, "{} | {} | line {}", self.message, self.resource, self.line)?;
        if !self.element_ids.is_empty() {
            write!(f, " | elements {}", self.element_ids.join(", "))?;
        }
        Ok(())
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes for compile errors.
///
/// ## Error Code Ranges
///
/// - **E0100-E0199**: Document registries (imports, messages, signals, errors, escalations)
/// - **E0200-E0299**: Process and scope structure (start events, subprocesses, references)
/// - **E0300-E0399**: Event definitions
/// - **E0400-E0499**: Sequence flows and gateways
/// - **E0500-E0599**: Tasks and vendor extensions
/// - **E0600-E0699**: Multi-instance and asynchronous continuations
/// - **E0700-E0799**: Diagram interchange
/// - **W0001-W0099**: Warnings
#[allow(dead_code)]
pub mod codes {
    // ========================================================================
    // REGISTRY ERRORS (E0100-E0199)
    // ========================================================================

    /// Import of an unsupported type.
    pub const UNSUPPORTED_IMPORT: &str = "E0101";

    /// Root-level definition without an id.
    pub const DEFINITION_MISSING_ID: &str = "E0102";

    /// Signal without a name.
    pub const SIGNAL_MISSING_NAME: &str = "E0103";

    /// Two signals share a name.
    pub const DUPLICATE_SIGNAL_NAME: &str = "E0104";

    // ========================================================================
    // STRUCTURE ERRORS (E0200-E0299)
    // ========================================================================

    /// More than one initial start event in a scope.
    pub const MULTIPLE_INITIAL_START_EVENTS: &str = "E0201";

    /// Event definition not allowed on this start event.
    pub const INVALID_START_EVENT: &str = "E0202";

    /// Event subprocess misuse.
    pub const INVALID_EVENT_SUBPROCESS: &str = "E0203";

    /// Attribute value outside its domain.
    pub const INVALID_ATTRIBUTE_VALUE: &str = "E0204";

    /// Required attribute or element missing.
    pub const MISSING_ATTRIBUTE: &str = "E0205";

    /// Reference to an element that does not exist.
    pub const UNRESOLVED_REFERENCE: &str = "E0206";

    /// Compensation wiring defect.
    pub const INVALID_COMPENSATION: &str = "E0207";

    /// Association defect.
    pub const INVALID_ASSOCIATION: &str = "E0208";

    /// History time to live missing or invalid.
    pub const HISTORY_TIME_TO_LIVE: &str = "E0209";

    // ========================================================================
    // EVENT ERRORS (E0300-E0399)
    // ========================================================================

    /// Timer without configuration.
    pub const INVALID_TIMER: &str = "E0301";

    /// Message event definition defect.
    pub const INVALID_MESSAGE_EVENT: &str = "E0302";

    /// Signal event definition defect.
    pub const INVALID_SIGNAL_EVENT: &str = "E0303";

    /// Error event definition defect.
    pub const INVALID_ERROR_EVENT: &str = "E0304";

    /// Escalation event definition defect.
    pub const INVALID_ESCALATION_EVENT: &str = "E0305";

    /// Conditional event definition defect.
    pub const INVALID_CONDITIONAL_EVENT: &str = "E0306";

    /// Two event subscriptions with the same name in one scope.
    pub const DUPLICATE_EVENT_SUBSCRIPTION: &str = "E0307";

    /// Boundary event defect.
    pub const INVALID_BOUNDARY_EVENT: &str = "E0308";

    /// Cancel event outside a transaction.
    pub const INVALID_CANCEL_EVENT: &str = "E0309";

    /// Unsupported event type.
    pub const UNSUPPORTED_EVENT: &str = "E0310";

    /// Duplicate event subscription job declaration.
    pub const DUPLICATE_JOB_DECLARATION: &str = "E0311";

    /// Link event defect.
    pub const INVALID_LINK_EVENT: &str = "E0312";

    // ========================================================================
    // FLOW ERRORS (E0400-E0499)
    // ========================================================================

    /// Sequence flow source not found in scope.
    pub const INVALID_FLOW_SOURCE: &str = "E0401";

    /// Sequence flow destination not found in scope.
    pub const INVALID_FLOW_DESTINATION: &str = "E0402";

    /// Exclusive gateway outgoing flow rules.
    pub const EXCLUSIVE_GATEWAY_FLOW: &str = "E0403";

    /// Event-based gateway topology.
    pub const EVENT_BASED_GATEWAY_FLOW: &str = "E0404";

    /// Flow connected to a compensation handler.
    pub const COMPENSATION_FLOW: &str = "E0405";

    /// Flow connected to an event subprocess.
    pub const EVENT_SUBPROCESS_FLOW: &str = "E0406";

    /// Condition expression defect.
    pub const INVALID_CONDITION: &str = "E0407";

    /// Link source without matching link target.
    pub const UNMATCHED_LINK: &str = "E0408";

    // ========================================================================
    // TASK AND EXTENSION ERRORS (E0500-E0599)
    // ========================================================================

    /// Service-task-like configuration.
    pub const INVALID_SERVICE_TASK: &str = "E0501";

    /// Field injection defect.
    pub const INVALID_FIELD: &str = "E0502";

    /// Script defect.
    pub const INVALID_SCRIPT: &str = "E0503";

    /// User task definition defect.
    pub const INVALID_USER_TASK: &str = "E0504";

    /// Form definition defect.
    pub const INVALID_FORM: &str = "E0505";

    /// Execution or task listener defect.
    pub const INVALID_LISTENER: &str = "E0506";

    /// Input/output mapping defect.
    pub const INVALID_IO_MAPPING: &str = "E0507";

    /// Call activity defect.
    pub const INVALID_CALL_ACTIVITY: &str = "E0508";

    /// Business rule task defect.
    pub const INVALID_BUSINESS_RULE_TASK: &str = "E0509";

    /// Property declaration defect.
    pub const INVALID_PROPERTY: &str = "E0510";

    // ========================================================================
    // MULTI-INSTANCE / ASYNC ERRORS (E0600-E0699)
    // ========================================================================

    /// Multi-instance characteristics defect.
    pub const INVALID_MULTI_INSTANCE: &str = "E0601";

    /// Asynchronous continuation defect.
    pub const INVALID_ASYNC: &str = "E0602";

    /// Priority value defect.
    pub const INVALID_PRIORITY: &str = "E0603";

    // ========================================================================
    // DIAGRAM ERRORS (E0700-E0799)
    // ========================================================================

    /// Diagram interchange defect.
    pub const INVALID_DIAGRAM: &str = "E0701";

    // ========================================================================
    // WARNINGS (W0001-W0099)
    // ========================================================================

    /// Single unconditioned exclusive gateway flow used as default.
    pub const IMPLICIT_DEFAULT_FLOW: &str = "W0001";

    /// Time cycle on an interrupting timer.
    pub const INTERRUPTING_TIME_CYCLE: &str = "W0002";

    /// Unsupported activity type ignored.
    pub const UNSUPPORTED_ACTIVITY: &str = "W0003";

    /// Attribute not supported and ignored.
    pub const IGNORED_ATTRIBUTE: &str = "W0004";

    /// Unknown variable event name.
    pub const UNKNOWN_VARIABLE_EVENT: &str = "W0005";

    /// Link event and definition names differ.
    pub const LINK_NAME_MISMATCH: &str = "W0006";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Accumulates diagnostics for one resource, in the order they are found.
#[derive(Clone, Debug)]
pub struct DiagnosticCollector {
    resource: Arc<str>,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new(resource: impl Into<Arc<str>>) -> Self {
        Self {
            resource: resource.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn resource(&self) -> &Arc<str> {
        &self.resource
    }

    /// Add a diagnostic, stamping it with this collector's resource.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics
            .push(diagnostic.with_resource(self.resource.clone()));
    }

    /// Add an error at `element` involving the given element ids.
    pub fn error(&mut self, code: &str, message: impl Into<Arc<str>>, element: &Element, ids: &[&str]) {
        self.add(
            Diagnostic::error(message)
                .with_code(code)
                .at(element)
                .with_element_ids(ids.iter().copied()),
        );
    }

    /// Add a warning at `element` involving the given element ids.
    pub fn warning(
        &mut self,
        code: &str,
        message: impl Into<Arc<str>>,
        element: &Element,
        ids: &[&str],
    ) {
        self.add(
            Diagnostic::warning(message)
                .with_code(code)
                .at(element)
                .with_element_ids(ids.iter().copied()),
        );
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_report(self) -> ParseReport {
        let (errors, warnings) = self.diagnostics.into_iter().partition(Diagnostic::is_error);
        ParseReport {
            resource: self.resource,
            errors,
            warnings,
        }
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// All diagnostics of one compiled resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub resource: Arc<str>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ParseReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Errors and warnings together, errors first.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

impl fmt::Display for ParseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not parse BPMN resource {}. Errors:", self.resource)?;
        for error in &self.errors {
            write!(f, "\n* {error}")?;
        }
        Ok(())
    }
}

/// The aggregated failure of a compilation: every error of the resource.
#[derive(Debug, Error)]
#[error("{report}")]
pub struct ParseErrors {
    pub report: ParseReport,
}

impl ParseErrors {
    pub fn errors(&self) -> &[Diagnostic] {
        &self.report.errors
    }
}
