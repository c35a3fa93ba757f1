//! The compiled process graph.
//!
//! ```text
//! ProcessDefinition
//!   ├── scope: ScopeData            root scope (children, declarations)
//!   ├── activities: Vec<Activity>   arena, indexed by ActivityId
//!   │     └── scope: ScopeData      nested children and declarations
//!   └── transitions: Vec<Transition>
//! ```
//!
//! Every activity lives in the process's arena, whatever its depth. A scope
//! only records the ids of its direct children.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::activity::{Activity, ActivityType, Priority};
use super::declarations::{
    ErrorEventDefinition, EscalationEventDefinition, EventSubscriptionDeclaration, JobDeclaration,
    MessageJobDeclaration, TimerDeclaration, VariableDeclaration,
};
use super::task::{FormDefinition, ListenerDefinition, TaskDefinition};
use crate::base::constants::{ASYNC_AFTER, ASYNC_BEFORE};
use crate::base::{ActivityId, ScopeId, TransitionId};
use crate::error::CompileError;
use crate::expression::{Condition, Expression};

// ============================================================================
// SCOPES
// ============================================================================

/// Children and declarations of the process or of one activity.
#[derive(Clone, Debug, Default)]
pub struct ScopeData {
    /// Direct children in creation order.
    pub activities: Vec<ActivityId>,
    /// Initial activity (the process's initial start event).
    pub initial: Option<ActivityId>,
    /// Execution listeners by event name.
    pub execution_listeners: IndexMap<SmolStr, Vec<ListenerDefinition>>,
    /// Event subscriptions opened when the scope is entered, keyed by activity id.
    pub event_subscriptions: IndexMap<SmolStr, EventSubscriptionDeclaration>,
    /// Timers armed when the scope is entered, keyed by activity id.
    pub timer_declarations: IndexMap<SmolStr, TimerDeclaration>,
    /// Timeout task listener timers by activity id, then listener id.
    pub timeout_listener_declarations: IndexMap<SmolStr, IndexMap<SmolStr, TimerDeclaration>>,
    /// Sorted by descending effective precedence.
    pub error_event_definitions: Vec<ErrorEventDefinition>,
    pub escalation_event_definitions: Vec<EscalationEventDefinition>,
    pub variable_declarations: Vec<VariableDeclaration>,
}

impl ScopeData {
    pub fn add_execution_listener(&mut self, event: &str, listener: ListenerDefinition) {
        self.execution_listeners
            .entry(SmolStr::new(event))
            .or_default()
            .push(listener);
    }

    pub fn execution_listeners(&self, event: &str) -> &[ListenerDefinition] {
        self.execution_listeners.get(event).map_or(&[], Vec::as_slice)
    }

    /// Insert keeping the list ordered by descending effective precedence;
    /// equal precedences keep insertion order.
    pub fn add_error_event_definition(&mut self, definition: ErrorEventDefinition) {
        let precedence = definition.effective_precedence();
        let position = self
            .error_event_definitions
            .iter()
            .position(|d| d.effective_precedence() < precedence)
            .unwrap_or(self.error_event_definitions.len());
        self.error_event_definitions.insert(position, definition);
    }
}

// ============================================================================
// TRANSITIONS, LANES, DIAGRAM
// ============================================================================

/// A compiled sequence flow.
#[derive(Clone, Debug)]
pub struct Transition {
    /// `None` when the sequence flow has no id.
    pub id: Option<SmolStr>,
    pub source: ActivityId,
    pub destination: ActivityId,
    pub name: Option<SmolStr>,
    pub documentation: Option<String>,
    pub condition: Option<Condition>,
    /// Condition text as written.
    pub condition_text: Option<String>,
    /// `take` listeners.
    pub listeners: Vec<ListenerDefinition>,
    /// Flattened `x, y` pairs from the diagram.
    pub waypoints: Vec<i32>,
    pub line: u32,
}

/// Diagram bounds, truncated to integers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lane {
    pub id: Option<SmolStr>,
    pub name: Option<SmolStr>,
    pub flow_node_ids: Vec<SmolStr>,
    pub bounds: Option<Bounds>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaneSet {
    pub id: Option<SmolStr>,
    pub name: Option<SmolStr>,
    pub lanes: Vec<Lane>,
}

/// The collaboration participant that references a process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParticipantProcess {
    pub id: SmolStr,
    pub name: Option<SmolStr>,
    pub bounds: Option<Bounds>,
}

// ============================================================================
// PROCESS DEFINITION
// ============================================================================

/// One executable process of a document.
#[derive(Clone, Debug)]
pub struct ProcessDefinition {
    pub key: SmolStr,
    pub name: Option<SmolStr>,
    /// The document's target namespace.
    pub category: Option<SmolStr>,
    pub documentation: Option<String>,
    pub version_tag: Option<SmolStr>,
    pub history_time_to_live: Option<u32>,
    pub startable_in_tasklist: bool,
    /// Variable receiving the authenticated starter's id.
    pub initiator_variable_name: Option<SmolStr>,
    pub job_priority: Option<Priority>,
    pub task_priority: Option<Priority>,
    /// Set once any conditional start event subscribes on the process.
    pub has_conditional_events: bool,
    pub graphical_notation_defined: bool,
    pub participant: Option<ParticipantProcess>,
    pub lane_sets: Vec<LaneSet>,
    pub candidate_starter_users: Vec<Expression>,
    pub candidate_starter_groups: Vec<Expression>,
    /// Form of the initial start event.
    pub start_form: Option<FormDefinition>,
    /// User task definitions by task definition key.
    pub task_definitions: IndexMap<SmolStr, TaskDefinition>,
    /// Process-level start timers.
    pub start_timers: Vec<TimerDeclaration>,
    /// Root scope.
    pub scope: ScopeData,

    activities: Vec<Activity>,
    transitions: Vec<Transition>,
    by_id: FxHashMap<SmolStr, ActivityId>,
    job_declarations: Vec<JobDeclaration>,
}

impl ProcessDefinition {
    pub fn new(key: impl Into<SmolStr>) -> Self {
        Self {
            key: key.into(),
            name: None,
            category: None,
            documentation: None,
            version_tag: None,
            history_time_to_live: None,
            startable_in_tasklist: true,
            initiator_variable_name: None,
            job_priority: None,
            task_priority: None,
            has_conditional_events: false,
            graphical_notation_defined: false,
            participant: None,
            lane_sets: Vec::new(),
            candidate_starter_users: Vec::new(),
            candidate_starter_groups: Vec::new(),
            start_form: None,
            task_definitions: IndexMap::new(),
            start_timers: Vec::new(),
            scope: ScopeData::default(),
            activities: Vec::new(),
            transitions: Vec::new(),
            by_id: FxHashMap::default(),
            job_declarations: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn activity(&self, id: ActivityId) -> &Activity {
        &self.activities[id.index()]
    }

    pub fn activity_mut(&mut self, id: ActivityId) -> &mut Activity {
        &mut self.activities[id.index()]
    }

    /// Every activity of the process, in creation order.
    pub fn activities(&self) -> impl Iterator<Item = (ActivityId, &Activity)> {
        self.activities
            .iter()
            .enumerate()
            .map(|(index, activity)| (ActivityId::new(index), activity))
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    /// Look up an activity by element id anywhere in the process.
    pub fn find_activity(&self, id: &str) -> Option<ActivityId> {
        self.by_id.get(id).copied()
    }

    /// Look up an activity by element id and return it.
    pub fn activity_by_id(&self, id: &str) -> Option<&Activity> {
        self.find_activity(id).map(|id| self.activity(id))
    }

    pub fn scope(&self, scope: ScopeId) -> &ScopeData {
        match scope {
            ScopeId::Process => &self.scope,
            ScopeId::Activity(id) => &self.activity(id).scope,
        }
    }

    pub fn scope_mut(&mut self, scope: ScopeId) -> &mut ScopeData {
        match scope {
            ScopeId::Process => &mut self.scope,
            ScopeId::Activity(id) => &mut self.activity_mut(id).scope,
        }
    }

    /// Direct children of `scope`.
    pub fn children(&self, scope: ScopeId) -> impl Iterator<Item = &Activity> {
        self.scope(scope)
            .activities
            .iter()
            .map(|&id| self.activity(id))
    }

    /// Element id of a scope: the process key or the activity id.
    pub fn scope_element_id(&self, scope: ScopeId) -> &str {
        match scope {
            ScopeId::Process => &self.key,
            ScopeId::Activity(id) => self.activity(id).id(),
        }
    }

    /// Flow scope of `scope`; the process has none.
    pub fn parent_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        scope.activity().map(|id| self.activity(id).flow_scope)
    }

    pub fn initial(&self) -> Option<&Activity> {
        self.scope.initial.map(|id| self.activity(id))
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.index()]
    }

    pub fn transition_mut(&mut self, id: TransitionId) -> &mut Transition {
        &mut self.transitions[id.index()]
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn find_transition(&self, id: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id.as_deref() == Some(id))
    }

    pub fn outgoing(&self, activity: ActivityId) -> impl Iterator<Item = &Transition> {
        self.activity(activity)
            .outgoing
            .iter()
            .map(|&id| self.transition(id))
    }

    pub fn incoming(&self, activity: ActivityId) -> impl Iterator<Item = &Transition> {
        self.activity(activity)
            .incoming
            .iter()
            .map(|&id| self.transition(id))
    }

    /// The nearest enclosing sub-process scope: the process, a subprocess, a
    /// transaction or an event subprocess. Multi-instance bodies and scoped
    /// tasks are transparent.
    pub fn level_of_subprocess(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        while let ScopeId::Activity(id) = current {
            let activity = self.activity(id);
            if activity.is_sub_process_scope {
                break;
            }
            current = activity.flow_scope;
        }
        current
    }

    /// Find `id` among the activities that share `scope`'s sub-process
    /// level. An activity wrapped in a multi-instance body is found at the
    /// level of the body.
    pub fn find_activity_at_level_of_subprocess(&self, scope: ScopeId, id: &str) -> Option<ActivityId> {
        let found = self.find_activity(id)?;
        let level = self.level_of_subprocess(scope);
        (self.level_of_subprocess(self.activity(found).flow_scope) == level).then_some(found)
    }

    /// Find `id` among the descendants of `scope`, at any depth.
    pub fn find_activity_in_scope(&self, scope: ScopeId, id: &str) -> Option<ActivityId> {
        let found = self.find_activity(id)?;
        let mut current = self.activity(found).flow_scope;
        loop {
            if current == scope {
                return Some(found);
            }
            current = self.parent_scope(current)?;
        }
    }

    pub fn job_declarations(&self) -> &[JobDeclaration] {
        &self.job_declarations
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// Create an activity as a child of `flow_scope`.
    ///
    /// Ids are unique across the whole process; an empty id is never indexed.
    pub fn create_activity(
        &mut self,
        flow_scope: ScopeId,
        id: impl Into<SmolStr>,
        activity_type: ActivityType,
    ) -> Result<ActivityId, CompileError> {
        let id = id.into();
        let activity_id = ActivityId::new(self.activities.len());
        if !id.is_empty() {
            if self.by_id.contains_key(&id) {
                return Err(CompileError::DuplicateActivityId {
                    id,
                    process: self.key.clone(),
                });
            }
            self.by_id.insert(id.clone(), activity_id);
        }
        self.activities
            .push(Activity::new(id, activity_type, flow_scope));
        self.scope_mut(flow_scope).activities.push(activity_id);
        Ok(activity_id)
    }

    /// Connect `source` to `destination`.
    pub fn create_transition(
        &mut self,
        source: ActivityId,
        destination: ActivityId,
        id: Option<SmolStr>,
    ) -> TransitionId {
        let transition_id = TransitionId::new(self.transitions.len());
        self.transitions.push(Transition {
            id,
            source,
            destination,
            name: None,
            documentation: None,
            condition: None,
            condition_text: None,
            listeners: Vec::new(),
            waypoints: Vec::new(),
            line: 0,
        });
        self.activity_mut(source).outgoing.push(transition_id);
        self.activity_mut(destination).incoming.push(transition_id);
        transition_id
    }

    pub fn add_job_declaration(&mut self, declaration: JobDeclaration) {
        self.job_declarations.push(declaration);
    }

    /// Toggle the asynchronous continuation before `activity`.
    ///
    /// The activity's message job list and the process's job declarations
    /// follow the flag: enabling adds a declaration unless an equal one
    /// exists, disabling removes it.
    pub fn set_async_before(&mut self, activity: ActivityId, async_before: bool, exclusive: bool) {
        self.update_async(activity, ASYNC_BEFORE, async_before, exclusive);
        let activity = self.activity_mut(activity);
        activity.async_before = async_before;
        activity.exclusive = exclusive;
    }

    /// Toggle the asynchronous continuation after `activity`.
    pub fn set_async_after(&mut self, activity: ActivityId, async_after: bool, exclusive: bool) {
        self.update_async(activity, ASYNC_AFTER, async_after, exclusive);
        let activity = self.activity_mut(activity);
        activity.async_after = async_after;
        activity.exclusive = exclusive;
    }

    fn update_async(
        &mut self,
        activity: ActivityId,
        configuration: &'static str,
        enabled: bool,
        exclusive: bool,
    ) {
        let activity_id = self.activity(activity).id.clone();
        let exists = self
            .job_declarations
            .iter()
            .any(|job| job.matches(&activity_id, configuration));

        if enabled && !exists {
            let priority = self.activity(activity).job_priority.clone();
            let job = if configuration == ASYNC_BEFORE {
                MessageJobDeclaration::async_before(activity_id, exclusive, priority)
            } else {
                MessageJobDeclaration::async_after(activity_id, exclusive, priority)
            };
            self.activity_mut(activity).message_jobs.push(job.clone());
            self.job_declarations.push(JobDeclaration::Message(job));
        } else if !enabled && exists {
            self.job_declarations
                .retain(|job| !job.matches(&activity_id, configuration));
            self.activity_mut(activity)
                .message_jobs
                .retain(|job| !job.job_configuration.eq_ignore_ascii_case(configuration));
        }
    }
}
