//! Document-level registries.
//!
//! Messages, signals, errors and escalations are declared once under the
//! `definitions` root and referenced from any process of the document. This
//! pass runs before any process is compiled; afterwards the [`Registry`] is
//! read-only.
//!
//! ## Keys
//!
//! ```text
//! messages, signals     targetNamespace ":" id       (looked up through resolve_name)
//! errors, escalations   id as written                (looked up by the raw reference)
//! ```

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::diagnostics::{DiagnosticCollector, codes};
use crate::expression::{Expression, ExpressionManager, ParameterValue};
use crate::xml::{Element, VENDOR_NS};

/// A `message` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageDefinition {
    /// Namespace-qualified id.
    pub id: SmolStr,
    pub name: Option<Expression>,
}

/// A `signal` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalDefinition {
    /// Namespace-qualified id.
    pub id: SmolStr,
    pub name: Expression,
}

/// An `error` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorDefinition {
    pub id: SmolStr,
    pub error_code: Option<SmolStr>,
    pub error_message: Option<ParameterValue>,
}

/// An `escalation` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EscalationDefinition {
    pub id: SmolStr,
    pub name: Option<SmolStr>,
    /// `None` when absent or empty.
    pub escalation_code: Option<SmolStr>,
}

/// Read-only tables shared by every process of one document.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    pub target_namespace: Option<SmolStr>,
    pub prefixes: IndexMap<SmolStr, SmolStr>,
    pub messages: IndexMap<SmolStr, MessageDefinition>,
    pub signals: IndexMap<SmolStr, SignalDefinition>,
    pub errors: IndexMap<SmolStr, ErrorDefinition>,
    pub escalations: IndexMap<SmolStr, EscalationDefinition>,
}

impl Registry {
    /// Run the registry pass over the `definitions` root.
    pub fn build(
        root: &Element,
        expressions: &dyn ExpressionManager,
        diagnostics: &mut DiagnosticCollector,
    ) -> Self {
        let mut registry = Registry {
            target_namespace: root.attribute("targetNamespace").map(SmolStr::new),
            prefixes: root
                .namespace_declarations()
                .map(|(prefix, uri)| (SmolStr::new(prefix), SmolStr::new(uri)))
                .collect(),
            ..Registry::default()
        };

        registry.parse_imports(root, diagnostics);
        registry.parse_messages(root, expressions, diagnostics);
        registry.parse_signals(root, expressions, diagnostics);
        registry.parse_errors(root, expressions, diagnostics);
        registry.parse_escalations(root, diagnostics);

        debug!(
            messages = registry.messages.len(),
            signals = registry.signals.len(),
            errors = registry.errors.len(),
            escalations = registry.escalations.len(),
            "registries built"
        );
        registry
    }

    /// Qualify `name` with its namespace.
    ///
    /// `prefix:id` resolves through the `xmlns:` declarations of the root,
    /// a bare id through the target namespace. An undeclared prefix or a
    /// missing target namespace resolves to the empty string, so the lookup
    /// simply finds nothing.
    pub fn resolve_name(&self, name: &str) -> String {
        match name.split_once(':') {
            Some((prefix, local)) => {
                let uri = self.prefixes.get(prefix).map_or("", SmolStr::as_str);
                format!("{uri}:{local}")
            }
            None => self.qualify(name),
        }
    }

    fn qualify(&self, id: &str) -> String {
        let namespace = self.target_namespace.as_deref().unwrap_or("");
        format!("{namespace}:{id}")
    }

    pub fn message(&self, reference: &str) -> Option<&MessageDefinition> {
        self.messages.get(self.resolve_name(reference).as_str())
    }

    pub fn signal(&self, reference: &str) -> Option<&SignalDefinition> {
        self.signals.get(self.resolve_name(reference).as_str())
    }

    pub fn error(&self, reference: &str) -> Option<&ErrorDefinition> {
        self.errors.get(reference)
    }

    pub fn escalation(&self, reference: &str) -> Option<&EscalationDefinition> {
        self.escalations.get(reference)
    }

    // ========================================================================
    // DEFINITION PASSES
    // ========================================================================

    fn parse_imports(&mut self, root: &Element, diagnostics: &mut DiagnosticCollector) {
        for import in root.elements("import") {
            let import_type = import.attribute_or("importType", "null");
            diagnostics.error(
                codes::UNSUPPORTED_IMPORT,
                format!("Could not import item of type {import_type}"),
                import,
                &[],
            );
        }
    }

    fn parse_messages(
        &mut self,
        root: &Element,
        expressions: &dyn ExpressionManager,
        diagnostics: &mut DiagnosticCollector,
    ) {
        for element in root.elements("message") {
            let Some(id) = element.attribute("id") else {
                diagnostics.error(
                    codes::DEFINITION_MISSING_ID,
                    "message must have an id",
                    element,
                    &[],
                );
                continue;
            };
            let name = element
                .attribute("name")
                .map(|name| expressions.create_expression(name));
            let id = SmolStr::new(self.qualify(id));
            self.messages
                .insert(id.clone(), MessageDefinition { id, name });
        }
    }

    fn parse_signals(
        &mut self,
        root: &Element,
        expressions: &dyn ExpressionManager,
        diagnostics: &mut DiagnosticCollector,
    ) {
        for element in root.elements("signal") {
            let id = element.attribute("id");
            let name = element.attribute("name");

            let duplicate = name.is_some_and(|name| {
                self.signals.values().any(|s| s.name.text() == name)
            });
            if let (true, Some(name)) = (duplicate, name) {
                diagnostics.error(
                    codes::DUPLICATE_SIGNAL_NAME,
                    format!("duplicate signal name '{name}'."),
                    element,
                    &[],
                );
            }

            match (id, name) {
                (None, _) => diagnostics.error(
                    codes::DEFINITION_MISSING_ID,
                    "signal must have an id",
                    element,
                    &[],
                ),
                (Some(id), None) => diagnostics.error(
                    codes::SIGNAL_MISSING_NAME,
                    format!("signal with id '{id}' has no name"),
                    element,
                    &[id],
                ),
                (Some(id), Some(name)) => {
                    let id = SmolStr::new(self.qualify(id));
                    let name = expressions.create_expression(name);
                    self.signals.insert(id.clone(), SignalDefinition { id, name });
                }
            }
        }
    }

    fn parse_errors(
        &mut self,
        root: &Element,
        expressions: &dyn ExpressionManager,
        diagnostics: &mut DiagnosticCollector,
    ) {
        for element in root.elements("error") {
            let Some(id) = element.attribute("id") else {
                diagnostics.error(
                    codes::DEFINITION_MISSING_ID,
                    "'id' is mandatory on error definition",
                    element,
                    &[],
                );
                continue;
            };
            let error_message = element
                .attribute_ns(&VENDOR_NS, "errorMessage")
                .map(|message| ParameterValue::from_text(Some(message), expressions));
            let definition = ErrorDefinition {
                id: SmolStr::new(id),
                error_code: element.attribute("errorCode").map(SmolStr::new),
                error_message,
            };
            self.errors.insert(definition.id.clone(), definition);
        }
    }

    fn parse_escalations(&mut self, root: &Element, diagnostics: &mut DiagnosticCollector) {
        for element in root.elements("escalation") {
            let Some(id) = element.attribute("id") else {
                diagnostics.error(
                    codes::DEFINITION_MISSING_ID,
                    "escalation must have an id",
                    element,
                    &[],
                );
                continue;
            };
            let definition = EscalationDefinition {
                id: SmolStr::new(id),
                name: element.attribute("name").map(SmolStr::new),
                escalation_code: element
                    .attribute("escalationCode")
                    .filter(|code| !code.is_empty())
                    .map(SmolStr::new),
            };
            self.escalations.insert(definition.id.clone(), definition);
        }
    }
}
