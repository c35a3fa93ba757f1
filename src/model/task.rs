//! Task definitions, listeners, field injections and input/output mappings.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::expression::{ExecutableScript, Expression, ParameterValue};

/// A value injected into a delegate's field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub name: SmolStr,
    /// [`ParameterValue::Constant`] for `stringValue`/`string`,
    /// [`ParameterValue::Expression`] for `expression`.
    pub value: ParameterValue,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<SmolStr>, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// How an execution or task listener is implemented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerDefinition {
    Class {
        class_name: SmolStr,
        fields: Vec<FieldDeclaration>,
    },
    Expression(Expression),
    DelegateExpression {
        expression: Expression,
        fields: Vec<FieldDeclaration>,
    },
    Script(ExecutableScript),
}

// ============================================================================
// USER TASKS
// ============================================================================

/// Form attached to a user task or to the initial start event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormDefinition {
    pub form_key: Option<Expression>,
    pub form_ref: Option<Expression>,
    /// Kept as written; invalid values are reported.
    pub form_ref_binding: Option<SmolStr>,
    pub form_ref_version: Option<Expression>,
}

impl FormDefinition {
    pub fn has_form_key(&self) -> bool {
        self.form_key.is_some()
    }
}

/// Everything the runtime needs to create a human task.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskDefinition {
    pub key: SmolStr,
    pub name_expression: Option<Expression>,
    pub description_expression: Option<Expression>,
    pub assignee_expression: Option<Expression>,
    pub candidate_user_expressions: Vec<Expression>,
    pub candidate_group_expressions: Vec<Expression>,
    pub due_date_expression: Option<Expression>,
    pub follow_up_date_expression: Option<Expression>,
    pub priority_expression: Option<Expression>,
    pub form: FormDefinition,
    /// Listeners by event name (`create`, `assignment`, ...).
    pub task_listeners: IndexMap<SmolStr, Vec<ListenerDefinition>>,
    /// Timeout listeners by listener id.
    pub timeout_task_listeners: IndexMap<SmolStr, ListenerDefinition>,
}

impl TaskDefinition {
    pub fn new(key: impl Into<SmolStr>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn add_task_listener(&mut self, event: &str, listener: ListenerDefinition) {
        self.task_listeners
            .entry(SmolStr::new(event))
            .or_default()
            .push(listener);
    }

    pub fn task_listeners(&self, event: &str) -> &[ListenerDefinition] {
        self.task_listeners.get(event).map_or(&[], Vec::as_slice)
    }

    /// Name text for diagnostics, `null` when the task has no name.
    pub(crate) fn display_name(&self) -> &str {
        self.name_expression.as_ref().map_or("null", Expression::text)
    }
}

// ============================================================================
// INPUT / OUTPUT
// ============================================================================

/// One `inputParameter` or `outputParameter`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IoParameter {
    pub name: SmolStr,
    pub value: ParameterValue,
}

/// Local variable mapping applied when an activity starts and ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IoMapping {
    pub inputs: Vec<IoParameter>,
    pub outputs: Vec<IoParameter>,
}

impl IoMapping {
    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }
}
