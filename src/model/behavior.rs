//! Behavior descriptors installed on activities.
//!
//! A behavior tells the runtime what an activity does when a token arrives.
//! The compiler only records which variant applies and the data it needs.

use smol_str::SmolStr;

use super::activity::Priority;
use super::declarations::{
    CompensateEventDefinition, ConditionalEventDefinition, ErrorEventDefinition,
    EventSubscriptionDeclaration,
};
use super::task::FieldDeclaration;
use crate::expression::{ExecutableScript, Expression, ParameterValue};
use crate::registry::EscalationDefinition;

/// Closed set of activity behaviors.
#[derive(Clone, Debug, PartialEq)]
pub enum Behavior {
    NoneStartEvent,
    EventSubProcessStart,
    EventSubProcessStartConditional(ConditionalEventDefinition),

    ExclusiveGateway,
    InclusiveGateway,
    ParallelGateway,
    EventBasedGateway,

    Task,
    ManualTask,
    ReceiveTask,
    ScriptTask {
        script: ExecutableScript,
        result_variable: Option<SmolStr>,
    },
    UserTask {
        task_definition_key: SmolStr,
    },
    ServiceTask(ServiceTaskBehavior),
    DmnBusinessRuleTask(DecisionTaskBehavior),

    SubProcess,
    EventSubProcess,
    CallActivity(CallActivityBehavior),
    MultiInstance(MultiInstanceBehavior),

    IntermediateCatchEvent {
        after_event_based_gateway: bool,
    },
    IntermediateCatchLink,
    IntermediateConditional(ConditionalEventDefinition),

    IntermediateThrowNone,
    ThrowSignal(EventSubscriptionDeclaration),
    CompensationEvent(CompensateEventDefinition),
    /// `None` when the referenced escalation does not exist (already reported).
    ThrowEscalation(Option<EscalationDefinition>),

    NoneEndEvent,
    ErrorEndEvent {
        error_code: Option<SmolStr>,
        error_message: Option<ParameterValue>,
    },
    CancelEndEvent,
    TerminateEndEvent,

    BoundaryEvent,
    CancelBoundary,
    BoundaryConditional(ConditionalEventDefinition),
}

impl Behavior {
    pub fn is_multi_instance(&self) -> bool {
        matches!(self, Behavior::MultiInstance(_))
    }

    pub fn is_event_based_gateway(&self) -> bool {
        matches!(self, Behavior::EventBasedGateway)
    }
}

// ============================================================================
// SERVICE TASKS
// ============================================================================

/// Implementations of service-task-like activities.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceTaskBehavior {
    ClassDelegate {
        class_name: SmolStr,
        fields: Vec<FieldDeclaration>,
    },
    DelegateExpression {
        expression: Expression,
        fields: Vec<FieldDeclaration>,
    },
    Expression {
        expression: Expression,
        result_variable: Option<SmolStr>,
    },
    Mail {
        fields: Vec<FieldDeclaration>,
    },
    Shell {
        fields: Vec<FieldDeclaration>,
    },
    External {
        topic: ParameterValue,
        priority: Option<Priority>,
        error_event_definitions: Vec<ErrorEventDefinition>,
    },
}

// ============================================================================
// CALLABLE ELEMENTS
// ============================================================================

/// Which deployed definition a call resolves to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallableElementBinding {
    #[default]
    Latest,
    Deployment,
    Version,
    VersionTag,
}

impl CallableElementBinding {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallableElementBinding::Latest => "latest",
            CallableElementBinding::Deployment => "deployment",
            CallableElementBinding::Version => "version",
            CallableElementBinding::VersionTag => "versionTag",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "latest" => Some(CallableElementBinding::Latest),
            "deployment" => Some(CallableElementBinding::Deployment),
            "version" => Some(CallableElementBinding::Version),
            "versionTag" => Some(CallableElementBinding::VersionTag),
            _ => None,
        }
    }
}

/// A variable passed into or out of a called element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallableElementParameter {
    pub source: Option<ParameterValue>,
    pub target: Option<SmolStr>,
    pub all_variables: bool,
    pub read_local: bool,
}

/// Reference to a called process, case or decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallableElement {
    pub definition_key: ParameterValue,
    pub binding: Option<CallableElementBinding>,
    pub version: ParameterValue,
    pub version_tag: ParameterValue,
    pub tenant_id: Option<ParameterValue>,
    pub business_key: Option<ParameterValue>,
    pub inputs: Vec<CallableElementParameter>,
    pub outputs: Vec<CallableElementParameter>,
    pub outputs_local: Vec<CallableElementParameter>,
}

impl CallableElement {
    pub fn new(definition_key: ParameterValue) -> Self {
        Self {
            definition_key,
            binding: None,
            version: ParameterValue::Null,
            version_tag: ParameterValue::Null,
            tenant_id: None,
            business_key: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            outputs_local: Vec::new(),
        }
    }

    /// Effective binding, `latest` when none was declared.
    pub fn effective_binding(&self) -> CallableElementBinding {
        self.binding.unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalledElementKind {
    Process,
    Case,
}

/// Delegate mapping variables in and out of a called process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VariableMapping {
    Class(SmolStr),
    DelegateExpression(Expression),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallActivityBehavior {
    pub kind: CalledElementKind,
    pub callable_element: CallableElement,
    pub variable_mapping: Option<VariableMapping>,
}

// ============================================================================
// DECISIONS
// ============================================================================

/// How a decision result is mapped to a process variable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecisionResultMapper {
    SingleEntry,
    SingleResult,
    CollectEntries,
    #[default]
    ResultList,
}

impl DecisionResultMapper {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "singleEntry" => Some(DecisionResultMapper::SingleEntry),
            "singleResult" => Some(DecisionResultMapper::SingleResult),
            "collectEntries" => Some(DecisionResultMapper::CollectEntries),
            "resultList" => Some(DecisionResultMapper::ResultList),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecisionTaskBehavior {
    pub callable_element: CallableElement,
    pub result_variable: Option<SmolStr>,
    pub result_mapper: DecisionResultMapper,
}

// ============================================================================
// MULTI-INSTANCE
// ============================================================================

/// Loop configuration of a multi-instance body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiInstanceBehavior {
    pub sequential: bool,
    pub loop_cardinality: Option<Expression>,
    pub completion_condition: Option<Expression>,
    pub collection_expression: Option<Expression>,
    pub collection_variable: Option<SmolStr>,
    pub element_variable: Option<SmolStr>,
}

impl MultiInstanceBehavior {
    pub fn has_collection(&self) -> bool {
        self.collection_expression.is_some() || self.collection_variable.is_some()
    }
}
