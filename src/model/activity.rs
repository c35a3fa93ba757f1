//! Activities: the nodes of the compiled graph.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::behavior::Behavior;
use super::declarations::{
    ConditionalEventDefinition, EventSubscriptionJobDeclaration, MessageJobDeclaration,
};
use super::process::{Bounds, ScopeData};
use super::task::IoMapping;
use crate::base::{ActivityId, ScopeId, TransitionId};
use crate::expression::Expression;

// ============================================================================
// ACTIVITY TYPES
// ============================================================================

macro_rules! activity_types {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// The type tag of an activity.
        ///
        /// Element tags map to a type when the element is created; event
        /// definitions refine the generic event tags afterwards (a
        /// `boundaryEvent` with a timer becomes [`ActivityType::BoundaryTimer`]).
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum ActivityType {
            $($variant,)*
        }

        impl ActivityType {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ActivityType::$variant => $name,)*
                }
            }

            /// Type of an element by tag name, if the tag names an activity.
            pub fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $($name => Some(ActivityType::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

activity_types! {
    ExclusiveGateway => "exclusiveGateway",
    InclusiveGateway => "inclusiveGateway",
    ParallelGateway => "parallelGateway",
    ComplexGateway => "complexGateway",
    EventBasedGateway => "eventBasedGateway",

    Task => "task",
    ScriptTask => "scriptTask",
    ServiceTask => "serviceTask",
    BusinessRuleTask => "businessRuleTask",
    ManualTask => "manualTask",
    UserTask => "userTask",
    SendTask => "sendTask",
    ReceiveTask => "receiveTask",

    SubProcess => "subProcess",
    AdHocSubProcess => "adHocSubProcess",
    CallActivity => "callActivity",
    Transaction => "transaction",
    MultiInstanceBody => "multiInstanceBody",

    StartEvent => "startEvent",
    EndEvent => "endEvent",
    BoundaryEvent => "boundaryEvent",
    IntermediateCatchEvent => "intermediateCatchEvent",
    IntermediateThrowEvent => "intermediateThrowEvent",

    BoundaryTimer => "boundaryTimer",
    BoundaryMessage => "boundaryMessage",
    BoundarySignal => "boundarySignal",
    BoundaryCompensation => "compensationBoundaryCatch",
    BoundaryError => "boundaryError",
    BoundaryEscalation => "boundaryEscalation",
    BoundaryCancel => "cancelBoundaryCatch",
    BoundaryConditional => "boundaryConditional",

    StartEventTimer => "startTimerEvent",
    StartEventMessage => "messageStartEvent",
    StartEventSignal => "signalStartEvent",
    StartEventEscalation => "escalationStartEvent",
    StartEventCompensation => "compensationStartEvent",
    StartEventError => "errorStartEvent",
    StartEventConditional => "conditionalStartEvent",

    IntermediateMessage => "intermediateMessageCatch",
    IntermediateTimer => "intermediateTimer",
    IntermediateLink => "intermediateLinkCatch",
    IntermediateSignal => "intermediateSignalCatch",
    IntermediateConditional => "intermediateConditional",

    IntermediateSignalThrow => "intermediateSignalThrow",
    IntermediateCompensationThrow => "intermediateCompensationThrowEvent",
    IntermediateMessageThrow => "intermediateMessageThrowEvent",
    IntermediateNoneThrow => "intermediateNoneThrowEvent",
    IntermediateEscalationThrow => "intermediateEscalationThrowEvent",

    EndEventError => "errorEndEvent",
    EndEventCancel => "cancelEndEvent",
    EndEventTerminate => "terminateEndEvent",
    EndEventMessage => "messageEndEvent",
    EndEventSignal => "signalEndEvent",
    EndEventCompensation => "compensationEndEvent",
    EndEventEscalation => "escalationEndEvent",
    EndEventNone => "noneEndEvent",
}

impl ActivityType {
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            ActivityType::ExclusiveGateway
                | ActivityType::InclusiveGateway
                | ActivityType::ParallelGateway
                | ActivityType::ComplexGateway
                | ActivityType::EventBasedGateway
        )
    }

    /// Start event types that compete for the initial activity of a process.
    pub fn is_initial_candidate(&self) -> bool {
        matches!(self, ActivityType::StartEvent | ActivityType::StartEventTimer)
    }

    pub fn is_intermediate_catch(&self) -> bool {
        matches!(
            self,
            ActivityType::IntermediateCatchEvent
                | ActivityType::IntermediateMessage
                | ActivityType::IntermediateTimer
                | ActivityType::IntermediateLink
                | ActivityType::IntermediateSignal
                | ActivityType::IntermediateConditional
        )
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an activity starts relative to the scope it is embedded in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActivityStartBehavior {
    #[default]
    Default,
    /// Interrupting event subprocess: cancels the event scope's other work.
    InterruptEventScope,
    /// Non-interrupting boundary event or event subprocess.
    ConcurrentInFlowScope,
    /// Interrupting boundary event: cancels the host.
    CancelEventScope,
    /// Terminate or cancel end event.
    InterruptFlowScope,
}

/// Priority of jobs or external tasks created for an activity or process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Priority {
    Constant(i64),
    Expression(Expression),
}

// ============================================================================
// ACTIVITY
// ============================================================================

/// A node of the compiled graph.
///
/// Every activity can hold children and declarations (its [`ScopeData`]); the
/// [`is_scope`](Activity::is_scope) flag decides whether the runtime treats it
/// as a variable-isolating scope.
#[derive(Clone, Debug)]
pub struct Activity {
    /// Element id; empty when the element has none.
    pub id: SmolStr,
    pub name: Option<SmolStr>,
    pub documentation: Option<String>,
    pub line: u32,
    pub activity_type: ActivityType,
    pub behavior: Option<Behavior>,
    pub start_behavior: ActivityStartBehavior,

    /// Structural parent for sequence-flow purposes.
    pub flow_scope: ScopeId,
    /// Scope in which this activity's event subscriptions are registered.
    pub event_scope: Option<ScopeId>,
    pub scope: ScopeData,

    pub is_scope: bool,
    pub is_sub_process_scope: bool,
    pub triggered_by_event: bool,
    pub is_for_compensation: bool,
    /// Set on activities wrapped by a multi-instance body.
    pub is_multi_instance: bool,
    pub throws_compensation: bool,
    pub consumes_compensation: bool,

    pub async_before: bool,
    pub async_after: bool,
    pub exclusive: bool,
    pub message_jobs: Vec<MessageJobDeclaration>,
    pub event_subscription_jobs: Vec<EventSubscriptionJobDeclaration>,
    pub job_priority: Option<Priority>,
    pub task_priority: Option<Priority>,

    /// Id of the default outgoing sequence flow.
    pub default_flow: Option<SmolStr>,
    pub io_mapping: Option<IoMapping>,
    pub conditional_event: Option<ConditionalEventDefinition>,
    /// Compensation handler wired through an association.
    pub compensation_handler: Option<ActivityId>,
    /// On a compensation handler: the boundary event that activates it.
    pub compensation_boundary: Option<ActivityId>,
    /// On a cancel end event: the cancel boundary event of its transaction.
    pub cancel_boundary: Option<ActivityId>,
    /// Boundary events attached to this activity, in document order.
    pub boundary_events: Vec<ActivityId>,
    /// Cancel end events inside this transaction.
    pub cancel_end_events: Vec<ActivityId>,

    /// Open-ended vendor properties (`operaton:properties`).
    pub extension_properties: IndexMap<SmolStr, SmolStr>,
    pub bounds: Option<Bounds>,
    pub is_expanded: Option<bool>,

    pub outgoing: Vec<TransitionId>,
    pub incoming: Vec<TransitionId>,
}

impl Activity {
    pub(crate) fn new(id: SmolStr, activity_type: ActivityType, flow_scope: ScopeId) -> Self {
        Self {
            id,
            name: None,
            documentation: None,
            line: 0,
            activity_type,
            behavior: None,
            start_behavior: ActivityStartBehavior::Default,
            flow_scope,
            event_scope: None,
            scope: ScopeData::default(),
            is_scope: false,
            is_sub_process_scope: false,
            triggered_by_event: false,
            is_for_compensation: false,
            is_multi_instance: false,
            throws_compensation: false,
            consumes_compensation: false,
            async_before: false,
            async_after: false,
            exclusive: true,
            message_jobs: Vec::new(),
            event_subscription_jobs: Vec::new(),
            job_priority: None,
            task_priority: None,
            default_flow: None,
            io_mapping: None,
            conditional_event: None,
            compensation_handler: None,
            compensation_boundary: None,
            cancel_boundary: None,
            boundary_events: Vec::new(),
            cancel_end_events: Vec::new(),
            extension_properties: IndexMap::new(),
            bounds: None,
            is_expanded: None,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_compensation_handler(&self) -> bool {
        self.is_for_compensation
    }

    /// Whether the activity is an intermediate catch event claimed by an
    /// event-based gateway.
    pub fn is_event_based_gateway_target(&self, gateway: ActivityId) -> bool {
        self.event_scope == Some(ScopeId::Activity(gateway))
    }
}
