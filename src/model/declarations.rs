//! Declarative runtime artifacts attached to scopes and activities.
//!
//! None of these do anything at compile time. The runtime reads them to
//! create event subscriptions, timers and jobs when a scope is entered.

use smol_str::SmolStr;

use super::activity::Priority;
use super::behavior::CallableElementParameter;
use crate::base::constants::{ASYNC_AFTER, ASYNC_BEFORE};
use crate::expression::{Condition, Expression, ParameterValue};

// ============================================================================
// EVENT SUBSCRIPTIONS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Message,
    Signal,
    Conditional,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Message => "message",
            EventType::Signal => "signal",
            EventType::Conditional => "conditional",
        }
    }
}

/// Payload a throwing signal passes to its receivers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignalPayload {
    pub inputs: Vec<CallableElementParameter>,
    pub business_key: Option<ParameterValue>,
}

/// A subscription the runtime opens when the event scope is entered.
#[derive(Clone, Debug, PartialEq)]
pub struct EventSubscriptionDeclaration {
    pub event_type: EventType,
    pub event_name: Option<Expression>,
    pub activity_id: SmolStr,
    pub event_scope_activity_id: Option<SmolStr>,
    pub start_event: bool,
    pub is_async: bool,
    pub payload: Option<SignalPayload>,
    /// Set for conditional subscriptions.
    pub conditional: Option<ConditionalEventDefinition>,
}

impl EventSubscriptionDeclaration {
    pub fn new(event_type: EventType, event_name: Option<Expression>) -> Self {
        Self {
            event_type,
            event_name,
            activity_id: SmolStr::default(),
            event_scope_activity_id: None,
            start_event: false,
            is_async: false,
            payload: None,
            conditional: None,
        }
    }

    /// Conditional subscription for `definition`.
    pub fn conditional(definition: ConditionalEventDefinition) -> Self {
        let mut declaration = Self::new(EventType::Conditional, None);
        declaration.activity_id = definition.activity_id.clone();
        declaration.conditional = Some(definition);
        declaration
    }

    /// Event name as written, before any expression evaluation.
    pub fn unresolved_event_name(&self) -> Option<&str> {
        self.event_name.as_ref().map(Expression::text)
    }

    pub fn has_event_name(&self) -> bool {
        self.unresolved_event_name().is_some_and(|name| !name.trim().is_empty())
    }

    /// Whether the name can only be known at runtime.
    pub fn has_expression_name(&self) -> bool {
        self.event_name
            .as_ref()
            .is_some_and(|name| !name.is_literal_text())
    }
}

/// Condition of a conditional event.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionalEventDefinition {
    pub condition: Condition,
    pub condition_text: String,
    pub activity_id: SmolStr,
    pub variable_name: Option<SmolStr>,
    pub variable_events: Vec<SmolStr>,
    pub interrupting: bool,
}

// ============================================================================
// TIMERS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerDeclarationType {
    Date,
    Cycle,
    Duration,
}

impl TimerDeclarationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerDeclarationType::Date => "DATE",
            TimerDeclarationType::Cycle => "CYCLE",
            TimerDeclarationType::Duration => "DURATION",
        }
    }
}

/// Job handler that fires a timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerJobHandler {
    StartEvent,
    StartEventSubprocess,
    IntermediateEvent,
    ExecuteNestedActivity,
    TaskListener,
}

impl TimerJobHandler {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerJobHandler::StartEvent => "timer-start-event",
            TimerJobHandler::StartEventSubprocess => "timer-start-event-subprocess",
            TimerJobHandler::IntermediateEvent => "timer-intermediate-transition",
            TimerJobHandler::ExecuteNestedActivity => "timer-transition",
            TimerJobHandler::TaskListener => "timer-task-listener",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerDeclaration {
    pub timer_type: TimerDeclarationType,
    /// `None` when the definition had no configuration (already reported).
    pub expression: Option<Expression>,
    pub job_handler: TimerJobHandler,
    /// Handler configuration: the activity id, the process key for process
    /// start timers, the event subprocess id for event subprocess start timers.
    pub raw_configuration: SmolStr,
    pub activity_id: SmolStr,
    pub event_scope_activity_id: Option<SmolStr>,
    pub interrupting: bool,
    pub exclusive: bool,
    pub priority: Option<Priority>,
    /// Id of the task listener for timeout listeners.
    pub listener_id: Option<SmolStr>,
}

impl TimerDeclaration {
    /// `TYPE: expression`, used to tell timers of one activity apart.
    pub fn job_configuration(&self) -> String {
        let text = self.expression.as_ref().map_or("", Expression::text);
        format!("{}: {}", self.timer_type.as_str(), text)
    }
}

// ============================================================================
// JOBS
// ============================================================================

/// An asynchronous continuation before or after an activity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageJobDeclaration {
    pub activity_id: SmolStr,
    /// [`ASYNC_BEFORE`] or [`ASYNC_AFTER`].
    pub job_configuration: &'static str,
    pub exclusive: bool,
    pub priority: Option<Priority>,
}

impl MessageJobDeclaration {
    pub fn async_before(activity_id: SmolStr, exclusive: bool, priority: Option<Priority>) -> Self {
        Self {
            activity_id,
            job_configuration: ASYNC_BEFORE,
            exclusive,
            priority,
        }
    }

    pub fn async_after(activity_id: SmolStr, exclusive: bool, priority: Option<Priority>) -> Self {
        Self {
            activity_id,
            job_configuration: ASYNC_AFTER,
            exclusive,
            priority,
        }
    }
}

/// Asynchronous delivery of a caught signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSubscriptionJobDeclaration {
    pub activity_id: SmolStr,
    pub event_type: EventType,
    pub priority: Option<Priority>,
}

/// A job the runtime's scheduler may create for a process definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobDeclaration {
    Message(MessageJobDeclaration),
    Timer(TimerDeclaration),
}

impl JobDeclaration {
    pub fn activity_id(&self) -> &str {
        match self {
            JobDeclaration::Message(job) => &job.activity_id,
            JobDeclaration::Timer(timer) => &timer.activity_id,
        }
    }

    pub fn job_configuration(&self) -> String {
        match self {
            JobDeclaration::Message(job) => job.job_configuration.to_string(),
            JobDeclaration::Timer(timer) => timer.job_configuration(),
        }
    }

    /// Same activity and same configuration, ignoring case.
    pub fn matches(&self, activity_id: &str, job_configuration: &str) -> bool {
        self.activity_id() == activity_id
            && self.job_configuration().eq_ignore_ascii_case(job_configuration)
    }
}

// ============================================================================
// CATCH DEFINITIONS
// ============================================================================

/// An error handler registered on its catching scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorEventDefinition {
    pub handler_activity_id: SmolStr,
    pub error_code: Option<SmolStr>,
    pub error_code_variable: Option<SmolStr>,
    pub error_message_variable: Option<SmolStr>,
    /// Base precedence; event subprocess start events rank above boundary events.
    pub precedence: u32,
    /// Expression deciding whether an external task error matches.
    pub expression: Option<Expression>,
}

impl ErrorEventDefinition {
    pub fn new(handler_activity_id: impl Into<SmolStr>) -> Self {
        Self {
            handler_activity_id: handler_activity_id.into(),
            error_code: None,
            error_code_variable: None,
            error_message_variable: None,
            precedence: 0,
            expression: None,
        }
    }

    /// Coded handlers win over catch-all handlers of the same base precedence.
    pub fn effective_precedence(&self) -> u32 {
        self.precedence + u32::from(self.error_code.is_some())
    }
}

/// An escalation handler registered on its catching scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EscalationEventDefinition {
    pub handler_activity_id: SmolStr,
    /// Event subprocess handler (as opposed to a boundary event).
    pub handler_is_sub_process: bool,
    pub cancel_activity: bool,
    pub escalation_code: Option<SmolStr>,
    pub escalation_code_variable: Option<SmolStr>,
}

/// A throwing compensation event's target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompensateEventDefinition {
    pub activity_ref: Option<SmolStr>,
    pub wait_for_completion: bool,
}

/// A `property` declared on a scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub name: SmolStr,
    pub variable_type: SmolStr,
    pub source_variable: Option<SmolStr>,
    pub source_expression: Option<Expression>,
    pub destination_variable: Option<SmolStr>,
    pub destination_expression: Option<Expression>,
    pub link: Option<SmolStr>,
    pub link_expression: Option<Expression>,
}

impl VariableDeclaration {
    pub fn new(name: impl Into<SmolStr>, variable_type: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            variable_type: variable_type.into(),
            source_variable: None,
            source_expression: None,
            destination_variable: None,
            destination_expression: None,
            link: None,
            link_expression: None,
        }
    }
}
