//! Opaque expression and script handles.
//!
//! The compiler never evaluates anything. Attribute values that the runtime
//! evaluates later are turned into [`Expression`]s by an [`ExpressionManager`]
//! and scripts into [`ExecutableScript`]s by a [`ScriptFactory`]; both services
//! are injected into the parser so embedders can plug in their own language.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use thiserror::Error;

// ============================================================================
// EXPRESSIONS
// ============================================================================

/// A compiled, not yet evaluated expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Expression {
    text: Arc<str>,
    literal: bool,
}

impl Expression {
    pub fn new(text: impl Into<Arc<str>>, literal: bool) -> Self {
        Self {
            text: text.into(),
            literal,
        }
    }

    /// Source text as written in the document.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether evaluation always yields the source text unchanged.
    pub fn is_literal_text(&self) -> bool {
        self.literal
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Whether `text` is an expression rather than a plain value.
pub fn is_expression(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("${") || text.starts_with("#{")
}

/// Compiles expression source text into opaque handles.
pub trait ExpressionManager {
    fn create_expression(&self, text: &str) -> Expression;
}

/// Unified-EL style manager: text without `${` or `#{` is literal.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultExpressionManager;

impl ExpressionManager for DefaultExpressionManager {
    fn create_expression(&self, text: &str) -> Expression {
        let literal = !text.contains("${") && !text.contains("#{");
        Expression::new(text, literal)
    }
}

// ============================================================================
// SCRIPTS
// ============================================================================

/// Where the body of a script comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptSource {
    /// Inline source text.
    Source(Arc<str>),
    /// Source text computed by an expression.
    DynamicSource(Expression),
    /// Classpath or deployment resource.
    Resource(Arc<str>),
    /// Resource name computed by an expression.
    DynamicResource(Expression),
}

/// A compiled, not yet executed script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutableScript {
    pub language: SmolStr,
    pub source: ScriptSource,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Script language is required")]
    MissingLanguage,

    #[error("Script source or resource is required")]
    MissingSource,
}

/// Compiles scripts into opaque handles.
pub trait ScriptFactory {
    fn create_script(
        &self,
        language: Option<&str>,
        source: Option<&str>,
        resource: Option<&str>,
        expressions: &dyn ExpressionManager,
    ) -> Result<ExecutableScript, ScriptError>;
}

/// Factory that classifies the script body and otherwise keeps it verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultScriptFactory;

impl ScriptFactory for DefaultScriptFactory {
    fn create_script(
        &self,
        language: Option<&str>,
        source: Option<&str>,
        resource: Option<&str>,
        expressions: &dyn ExpressionManager,
    ) -> Result<ExecutableScript, ScriptError> {
        let language = match language {
            Some(language) if !language.is_empty() => SmolStr::new(language),
            _ => return Err(ScriptError::MissingLanguage),
        };

        let source = match (resource.filter(|r| !r.is_empty()), source) {
            (Some(resource), _) if is_expression(resource) => {
                ScriptSource::DynamicResource(expressions.create_expression(resource))
            }
            (Some(resource), _) => ScriptSource::Resource(Arc::from(resource)),
            (None, Some(source)) if is_expression(source) => {
                ScriptSource::DynamicSource(expressions.create_expression(source))
            }
            (None, Some(source)) => ScriptSource::Source(Arc::from(source)),
            (None, None) => return Err(ScriptError::MissingSource),
        };

        Ok(ExecutableScript { language, source })
    }
}

// ============================================================================
// VALUES AND CONDITIONS
// ============================================================================

/// A value computed at runtime: parameter mappings, priorities, field values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParameterValue {
    Null,
    Constant(Arc<str>),
    Expression(Expression),
    Script(ExecutableScript),
    List(Vec<ParameterValue>),
    Map(IndexMap<SmolStr, ParameterValue>),
}

impl ParameterValue {
    /// Expression for any text, null for none. Literal text compiles to a
    /// literal expression.
    pub fn from_text(text: Option<&str>, expressions: &dyn ExpressionManager) -> Self {
        match text {
            None => ParameterValue::Null,
            Some(text) => ParameterValue::Expression(expressions.create_expression(text)),
        }
    }

    /// The source text of a constant or expression value.
    pub fn text(&self) -> Option<&str> {
        match self {
            ParameterValue::Constant(text) => Some(text),
            ParameterValue::Expression(expression) => Some(expression.text()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParameterValue::Null)
    }
}

/// A condition guarding a transition or a conditional event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    Expression(Expression),
    Script(ExecutableScript),
}
