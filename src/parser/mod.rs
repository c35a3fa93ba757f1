//! # BPMN Parser
//!
//! Compiles a `definitions` document into executable [`ProcessDefinition`]s.
//!
//! [`BpmnParser`] is the reusable entry point: it owns the options, the
//! expression and script services and the listeners. Every call creates a
//! fresh [`BpmnParse`], the per-document state, and drops it when the
//! document is done.
//!
//! ## Passes
//!
//! ```text
//! definitions
//!   ├── registries            messages, signals, errors, escalations, imports
//!   ├── process*              parse_process → parse_scope (recursive)
//!   │     ├── start events
//!   │     ├── activities      multi-instance body first, then dispatch by tag
//!   │     ├── catch events    those no event-based gateway claimed
//!   │     ├── end events
//!   │     ├── boundary events
//!   │     ├── sequence flows  link redirection, multi-instance rerouting
//!   │     ├── listeners, associations, compensation handlers
//!   │     └── backlog         deferred forward references of this scope
//!   ├── collaboration         participants
//!   └── diagram interchange   bounds and waypoints
//! ```
//!
//! Document defects become diagnostics and never stop the pass. A defect of
//! the compiler itself (duplicate activity ids) or a failing listener ends
//! the compilation at once.

mod activities;
mod diagram;
mod event_definitions;
mod events;
mod extensions;
mod flows;
mod multi_instance;
mod options;
mod process;
mod scope;
mod tasks;
mod util;

pub use options::ParseOptions;

use std::path::Path;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, trace, warn};

use crate::base::ScopeId;
use crate::diagnostics::{Diagnostic, DiagnosticCollector, ParseErrors, ParseReport};
use crate::error::CompileError;
use crate::expression::{
    DefaultExpressionManager, DefaultScriptFactory, ExpressionManager, ScriptFactory,
};
use crate::listener::ParseListener;
use crate::model::{JobDeclaration, ProcessDefinition};
use crate::registry::Registry;
use crate::xml::{Element, parse_document};

pub(crate) type ParseResult<T = ()> = Result<T, CompileError>;

/// Invoke one hook on every listener, in registration order. Arguments are
/// evaluated per listener; the current process is passed last.
macro_rules! notify {
    ($parse:ident . $hook:ident ( $($arg:expr),* $(,)? )) => {
        for listener in $parse.listeners.iter_mut() {
            listener.$hook($($arg,)* &mut $parse.process)?;
        }
    };
}
pub(crate) use notify;

// ============================================================================
// PARSER
// ============================================================================

/// Reusable BPMN compiler.
///
/// ```
/// use bpmn::parser::BpmnParser;
///
/// let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
///   <process id="order" isExecutable="true">
///     <startEvent id="start"/>
///     <sequenceFlow id="f" sourceRef="start" targetRef="end"/>
///     <endEvent id="end"/>
///   </process>
/// </definitions>"#;
///
/// let output = BpmnParser::new().parse_str("order.bpmn", xml).unwrap();
/// let process = output.process("order").unwrap();
/// assert_eq!(process.initial().map(|a| a.id()), Some("start"));
/// ```
pub struct BpmnParser {
    options: ParseOptions,
    expressions: Box<dyn ExpressionManager>,
    scripts: Box<dyn ScriptFactory>,
    listeners: Vec<Box<dyn ParseListener>>,
}

impl Default for BpmnParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BpmnParser {
    pub fn new() -> Self {
        Self {
            options: ParseOptions::default(),
            expressions: Box::new(DefaultExpressionManager),
            scripts: Box::new(DefaultScriptFactory),
            listeners: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_expression_manager(mut self, expressions: impl ExpressionManager + 'static) -> Self {
        self.expressions = Box::new(expressions);
        self
    }

    pub fn with_script_factory(mut self, scripts: impl ScriptFactory + 'static) -> Self {
        self.scripts = Box::new(scripts);
        self
    }

    /// Register a listener. Listeners run in registration order.
    pub fn with_listener(mut self, listener: impl ParseListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Compile a document given as text. `resource` names it in diagnostics.
    pub fn parse_str(&mut self, resource: &str, xml: &str) -> Result<ParseOutput, CompileError> {
        let root = parse_document(xml)?;
        self.parse_element(resource, &root)
    }

    /// Read and compile a document file.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<ParseOutput, CompileError> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)?;
        self.parse_str(&path.to_string_lossy(), &xml)
    }

    /// Compile an already read `definitions` element.
    pub fn parse_element(&mut self, resource: &str, root: &Element) -> Result<ParseOutput, CompileError> {
        debug!(resource, "compiling BPMN resource");
        let mut parse = BpmnParse::new(
            resource,
            &self.options,
            self.expressions.as_ref(),
            self.scripts.as_ref(),
            self.listeners.as_mut_slice(),
        );
        parse.parse_root_element(root)?;
        parse.finish()
    }
}

/// Result of a successful compilation.
#[derive(Debug)]
pub struct ParseOutput {
    /// Executable processes in document order.
    pub processes: Vec<ProcessDefinition>,
    /// Job declarations by process key; processes without jobs are absent.
    pub job_declarations: IndexMap<SmolStr, Vec<JobDeclaration>>,
    /// Participant id to the key of the process it references.
    pub participant_processes: IndexMap<SmolStr, SmolStr>,
    pub registry: Registry,
    /// Warnings of the compilation (errors would have failed it).
    pub report: ParseReport,
}

impl ParseOutput {
    pub fn process(&self, key: &str) -> Option<&ProcessDefinition> {
        self.processes.iter().find(|p| p.key == key)
    }

    pub fn job_declarations_of(&self, key: &str) -> &[JobDeclaration] {
        self.job_declarations.get(key).map_or(&[], Vec::as_slice)
    }
}

// ============================================================================
// PER-DOCUMENT STATE
// ============================================================================

/// A validation waiting for a reference that may be defined later in the
/// same scope. Reported when the scope is complete and the reference still
/// does not resolve at the scope's sub-process level.
#[derive(Debug)]
struct BacklogEntry {
    scope: ScopeId,
    reference: SmolStr,
    diagnostic: Diagnostic,
}

/// State of one compilation.
pub(crate) struct BpmnParse<'a> {
    options: &'a ParseOptions,
    expressions: &'a dyn ExpressionManager,
    scripts: &'a dyn ScriptFactory,
    listeners: &'a mut [Box<dyn ParseListener>],

    registry: Registry,
    diagnostics: DiagnosticCollector,
    /// Every `id` in the document.
    element_ids: FxHashSet<SmolStr>,

    processes: Vec<ProcessDefinition>,
    participant_processes: IndexMap<SmolStr, SmolStr>,

    /// The process being compiled.
    process: ProcessDefinition,
    /// Throwing link event id to link name, per process.
    link_sources: FxHashMap<SmolStr, SmolStr>,
    /// Link name to catching link event id, per process.
    link_targets: FxHashMap<SmolStr, SmolStr>,
    backlog: Vec<BacklogEntry>,
}

impl<'a> BpmnParse<'a> {
    pub(crate) fn new(
        resource: &str,
        options: &'a ParseOptions,
        expressions: &'a dyn ExpressionManager,
        scripts: &'a dyn ScriptFactory,
        listeners: &'a mut [Box<dyn ParseListener>],
    ) -> Self {
        Self {
            options,
            expressions,
            scripts,
            listeners,
            registry: Registry::default(),
            diagnostics: DiagnosticCollector::new(resource),
            element_ids: FxHashSet::default(),
            processes: Vec::new(),
            participant_processes: IndexMap::new(),
            process: ProcessDefinition::new(""),
            link_sources: FxHashMap::default(),
            link_targets: FxHashMap::default(),
            backlog: Vec::new(),
        }
    }

    /// Compile the `definitions` element.
    pub(crate) fn parse_root_element(&mut self, root: &Element) -> ParseResult {
        trace!("registry pass");
        root.collect_ids(&mut self.element_ids);
        self.registry = Registry::build(root, self.expressions, &mut self.diagnostics);

        trace!("process pass");
        self.parse_process_definitions(root)?;
        self.parse_collaboration(root);

        trace!("diagram interchange pass");
        self.parse_diagram_interchange(root);

        for listener in self.listeners.iter_mut() {
            listener.parse_root_element(root, &mut self.processes)?;
        }
        Ok(())
    }

    /// Flush warnings to the log and turn the collected errors into the
    /// result.
    pub(crate) fn finish(self) -> Result<ParseOutput, CompileError> {
        let report = self.diagnostics.into_report();
        for warning in &report.warnings {
            warn!(
                resource = %warning.resource,
                line = warning.line,
                code = warning.code.as_deref().unwrap_or(""),
                "{}",
                warning.message
            );
        }
        if report.has_errors() {
            return Err(ParseErrors { report }.into());
        }

        let job_declarations = self
            .processes
            .iter()
            .filter(|p| !p.job_declarations().is_empty())
            .map(|p| (p.key.clone(), p.job_declarations().to_vec()))
            .collect();

        Ok(ParseOutput {
            processes: self.processes,
            job_declarations,
            participant_processes: self.participant_processes,
            registry: self.registry,
            report,
        })
    }

    // ------------------------------------------------------------------------
    // Backlog
    // ------------------------------------------------------------------------

    fn add_to_backlog(&mut self, scope: ScopeId, reference: &str, diagnostic: Diagnostic) {
        self.backlog.push(BacklogEntry {
            scope,
            reference: SmolStr::new(reference),
            diagnostic,
        });
    }

    /// Resolve the pending references of `scope`.
    fn drain_backlog(&mut self, scope: ScopeId) {
        let (pending, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.backlog)
            .into_iter()
            .partition(|entry| entry.scope == scope);
        self.backlog = rest;

        for entry in pending {
            if self
                .process
                .find_activity_at_level_of_subprocess(scope, &entry.reference)
                .is_none()
            {
                self.diagnostics.add(entry.diagnostic);
            }
        }
    }
}
