//! The compiled process model.
//!
//! ```text
//! process       ProcessDefinition, ScopeData, Transition, lanes, diagram data
//! activity      Activity, ActivityType, ActivityStartBehavior, Priority
//! behavior      Behavior and the data each variant carries
//! declarations  subscriptions, timers, jobs, error/escalation handlers
//! task          user task definitions, listeners, fields, io mappings
//! ```

mod activity;
mod behavior;
mod declarations;
mod process;
mod task;

pub use activity::{Activity, ActivityStartBehavior, ActivityType, Priority};
pub use behavior::{
    Behavior, CallActivityBehavior, CallableElement, CallableElementBinding,
    CallableElementParameter, CalledElementKind, DecisionResultMapper, DecisionTaskBehavior,
    MultiInstanceBehavior, ServiceTaskBehavior, VariableMapping,
};
pub use declarations::{
    CompensateEventDefinition, ConditionalEventDefinition, ErrorEventDefinition,
    EscalationEventDefinition, EventSubscriptionDeclaration, EventSubscriptionJobDeclaration,
    EventType, JobDeclaration, MessageJobDeclaration, SignalPayload, TimerDeclaration,
    TimerDeclarationType, TimerJobHandler, VariableDeclaration,
};
pub use process::{
    Bounds, Lane, LaneSet, ParticipantProcess, ProcessDefinition, ScopeData, Transition,
};
pub use task::{
    FieldDeclaration, FormDefinition, IoMapping, IoParameter, ListenerDefinition, TaskDefinition,
};
