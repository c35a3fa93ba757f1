//! Event definitions shared by start, intermediate, boundary and end events.
//!
//! Each catching definition registers a declaration on the event scope of
//! its activity: a subscription (message, signal, conditional), a timer, or
//! an error or escalation handler.

use smol_str::SmolStr;
use tracing::warn;

use super::extensions::set_error_variables;
use super::util::split_comma_separated;
use super::{BpmnParse, ParseResult, notify};
use crate::base::{ActivityId, ScopeId};
use crate::diagnostics::{Diagnostic, codes};
use crate::expression::ParameterValue;
use crate::model::{
    ActivityType, Behavior, CompensateEventDefinition, ConditionalEventDefinition,
    ErrorEventDefinition, EscalationEventDefinition, EventSubscriptionDeclaration,
    EventSubscriptionJobDeclaration, EventType, JobDeclaration, SignalPayload, TimerDeclaration,
    TimerDeclarationType, TimerJobHandler,
};
use crate::registry::EscalationDefinition;
use crate::xml::{Element, VENDOR_NS};

const VARIABLE_EVENTS: [&str; 3] = ["create", "update", "delete"];

/// Precedence of error start events of event subprocesses over boundary
/// events.
const EVENT_SUBPROCESS_ERROR_PRECEDENCE: u32 = 10;

impl BpmnParse<'_> {
    // ------------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------------

    /// Timer of `activity`. The first of `timeDate`, `timeCycle` and
    /// `timeDuration` wins. The caller finishes the declaration and registers
    /// the job with [`add_timer_job`](Self::add_timer_job).
    pub(super) fn parse_timer(
        &mut self,
        definition: &Element,
        activity: ActivityId,
        job_handler: TimerJobHandler,
    ) -> TimerDeclaration {
        let timer_activity = self.process.activity(activity);
        let activity_id = timer_activity.id.clone();
        let priority = timer_activity.job_priority.clone();

        let (timer_type, expression) = match timer_configuration(definition) {
            Some((timer_type, configuration)) => (
                timer_type,
                Some(self.expressions.create_expression(configuration.text())),
            ),
            None => {
                self.diagnostics.error(
                    codes::INVALID_TIMER,
                    "Timer needs configuration (either timeDate, timeCycle or timeDuration is needed).",
                    definition,
                    &[activity_id.as_str()],
                );
                (TimerDeclarationType::Duration, None)
            }
        };

        if activity_id.is_empty() {
            self.diagnostics.error(
                codes::INVALID_TIMER,
                "Attribute \"id\" is required!",
                definition,
                &[],
            );
        }

        TimerDeclaration {
            timer_type,
            expression,
            job_handler,
            raw_configuration: activity_id.clone(),
            activity_id,
            event_scope_activity_id: None,
            interrupting: false,
            exclusive: definition.attribute_ns_or(&VENDOR_NS, "exclusive", "true") == "true",
            priority,
            listener_id: None,
        }
    }

    /// Register the job of a finished timer declaration on the process.
    pub(super) fn add_timer_job(&mut self, timer: &TimerDeclaration) {
        self.process
            .add_job_declaration(JobDeclaration::Timer(timer.clone()));
    }

    fn add_timer_declaration(&mut self, scope: ScopeId, timer: TimerDeclaration) {
        self.add_timer_job(&timer);
        self.process
            .scope_mut(scope)
            .timer_declarations
            .insert(timer.activity_id.clone(), timer);
    }

    /// Process start timer. Its job configuration is the process key.
    pub(super) fn parse_timer_start_event_definition(&mut self, definition: &Element, activity: ActivityId) {
        self.process.activity_mut(activity).activity_type = ActivityType::StartEventTimer;
        let mut timer = self.parse_timer(definition, activity, TimerJobHandler::StartEvent);
        timer.raw_configuration = self.process.key.clone();
        self.add_timer_job(&timer);
        self.process.start_timers.push(timer);
    }

    pub(super) fn parse_timer_start_event_for_event_subprocess(
        &mut self,
        definition: &Element,
        activity: ActivityId,
        interrupting: bool,
    ) {
        self.process.activity_mut(activity).activity_type = ActivityType::StartEventTimer;
        let mut timer = self.parse_timer(definition, activity, TimerJobHandler::StartEventSubprocess);

        let start = self.process.activity(activity);
        let event_scope = start.event_scope.unwrap_or(start.flow_scope);
        timer.event_scope_activity_id = Some(SmolStr::new(self.process.scope_element_id(event_scope)));
        timer.raw_configuration = SmolStr::new(self.process.scope_element_id(start.flow_scope));
        timer.interrupting = interrupting;

        if interrupting {
            self.warn_time_cycle(definition, "interrupting start", &timer.activity_id);
        }
        self.add_timer_declaration(event_scope, timer);
    }

    pub(super) fn parse_boundary_timer_event_definition(
        &mut self,
        definition: &Element,
        interrupting: bool,
        activity: ActivityId,
    ) -> ParseResult {
        self.process.activity_mut(activity).activity_type = ActivityType::BoundaryTimer;
        let mut timer = self.parse_timer(definition, activity, TimerJobHandler::ExecuteNestedActivity);

        if interrupting {
            timer.interrupting = true;
            self.warn_time_cycle(definition, "cancelling boundary", &timer.activity_id);
        }

        let event_scope = self.event_scope_of(activity);
        self.add_timer_declaration(event_scope, timer);

        notify!(self.parse_boundary_timer_event_definition(definition, interrupting, activity));
        Ok(())
    }

    pub(super) fn parse_intermediate_timer_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
    ) -> ParseResult {
        self.process.activity_mut(activity).activity_type = ActivityType::IntermediateTimer;
        let timer = self.parse_timer(definition, activity, TimerJobHandler::IntermediateEvent);

        if definition.element("timeCycle").is_some() {
            warn!(
                process = self.process.key.as_str(),
                activity = timer.activity_id.as_str(),
                "intermediate catch timer event with time cycle is not recommended"
            );
        }

        let event_scope = self.event_scope_of(activity);
        self.add_timer_declaration(event_scope, timer);

        notify!(self.parse_intermediate_timer_event_definition(definition, activity));
        Ok(())
    }

    fn warn_time_cycle(&mut self, definition: &Element, kind: &str, activity_id: &str) {
        if let Some(time_cycle) = definition.element("timeCycle") {
            self.diagnostics.warning(
                codes::INTERRUPTING_TIME_CYCLE,
                format!("It is not recommended to use a {kind} timer event with a time cycle."),
                time_cycle,
                &[activity_id],
            );
        }
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    /// Event scope of a catching activity; its flow scope when none was set.
    pub(super) fn event_scope_of(&self, activity: ActivityId) -> ScopeId {
        let activity = self.process.activity(activity);
        activity.event_scope.unwrap_or(activity.flow_scope)
    }

    /// Register a subscription on `scope`, keyed by its activity.
    ///
    /// Messages need a name. Two message or two signal subscriptions of one
    /// scope may not share a name unless exactly one of them is a start
    /// event, and two conditional start events may not share a condition.
    pub(super) fn add_event_subscription(
        &mut self,
        scope: ScopeId,
        declaration: EventSubscriptionDeclaration,
        element: &Element,
    ) {
        let activity_id = declaration.activity_id.clone();
        if declaration.event_type == EventType::Message && !declaration.has_event_name() {
            self.diagnostics.error(
                codes::INVALID_MESSAGE_EVENT,
                "Cannot have a message event subscription with an empty or missing name",
                element,
                &[activity_id.as_str()],
            );
        }

        let scope_id = self.process.scope_element_id(scope).to_string();
        let existing = &self.process.scope(scope).event_subscriptions;

        match declaration.event_type {
            EventType::Message | EventType::Signal => {
                let duplicate = declaration.has_event_name()
                    && existing.values().any(|other| {
                        other.event_type == declaration.event_type
                            && other.has_event_name()
                            && other.unresolved_event_name() == declaration.unresolved_event_name()
                            && other.start_event == declaration.start_event
                    });
                if duplicate {
                    let name = declaration.unresolved_event_name().unwrap_or_default();
                    self.diagnostics.error(
                        codes::DUPLICATE_EVENT_SUBSCRIPTION,
                        format!(
                            "Cannot have more than one {} event subscription with name '{name}' for scope '{scope_id}'",
                            declaration.event_type.as_str()
                        ),
                        element,
                        &[activity_id.as_str()],
                    );
                }
            }
            EventType::Conditional => {
                let condition = declaration.conditional.as_ref().map(|c| c.condition_text.as_str());
                let duplicate = declaration.start_event
                    && existing.values().any(|other| {
                        other.event_type == EventType::Conditional
                            && other.start_event
                            && other.conditional.as_ref().map(|c| c.condition_text.as_str()) == condition
                    });
                if duplicate {
                    self.diagnostics.error(
                        codes::DUPLICATE_EVENT_SUBSCRIPTION,
                        format!(
                            "Cannot have more than one conditional event subscription with the same condition '{}'",
                            condition.unwrap_or_default()
                        ),
                        element,
                        &[activity_id.as_str()],
                    );
                }
            }
        }

        self.process
            .scope_mut(scope)
            .event_subscriptions
            .insert(activity_id, declaration);
    }

    // ------------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------------

    /// Subscription for the message referenced by `messageRef`.
    pub(super) fn parse_message_event_definition(
        &mut self,
        element: &Element,
        activity_id: &str,
    ) -> Option<EventSubscriptionDeclaration> {
        let Some(message_ref) = element.attribute("messageRef") else {
            self.diagnostics.error(
                codes::INVALID_MESSAGE_EVENT,
                "attribute 'messageRef' is required",
                element,
                &[activity_id],
            );
            return None;
        };
        let Some(message) = self.registry.message(message_ref) else {
            self.diagnostics.error(
                codes::UNRESOLVED_REFERENCE,
                format!("Invalid 'messageRef': no message with id '{message_ref}' found."),
                element,
                &[activity_id],
            );
            return None;
        };
        Some(EventSubscriptionDeclaration::new(
            EventType::Message,
            message.name.clone(),
        ))
    }

    pub(super) fn parse_boundary_message_event_definition(
        &mut self,
        definition: &Element,
        interrupting: bool,
        activity: ActivityId,
    ) -> ParseResult {
        self.process.activity_mut(activity).activity_type = ActivityType::BoundaryMessage;
        let activity_id = self.process.activity(activity).id.clone();

        let declaration = self.parse_message_event_definition(definition, &activity_id);
        self.require_boundary_id(definition, &activity_id);
        if let Some(mut declaration) = declaration {
            declaration.activity_id = activity_id;
            let event_scope = self.event_scope_of(activity);
            self.add_event_subscription(event_scope, declaration, definition);
        }

        notify!(self.parse_boundary_message_event_definition(definition, interrupting, activity));
        Ok(())
    }

    pub(super) fn parse_intermediate_message_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
    ) -> ParseResult {
        self.process.activity_mut(activity).activity_type = ActivityType::IntermediateMessage;
        let activity_id = self.process.activity(activity).id.clone();

        if let Some(mut declaration) = self.parse_message_event_definition(definition, &activity_id) {
            declaration.activity_id = activity_id;
            let event_scope = self.event_scope_of(activity);
            self.add_event_subscription(event_scope, declaration, definition);
        }

        notify!(self.parse_intermediate_message_catch_event_definition(definition, activity));
        Ok(())
    }

    fn require_boundary_id(&mut self, definition: &Element, activity_id: &str) {
        if activity_id.is_empty() {
            self.diagnostics.error(
                codes::INVALID_BOUNDARY_EVENT,
                "boundary event has no id",
                definition,
                &[],
            );
        }
    }

    // ------------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------------

    /// Subscription for the signal referenced by `signalRef`. A throwing
    /// signal carries the payload declared by its vendor `in` elements.
    pub(super) fn parse_signal_event_definition(
        &mut self,
        element: &Element,
        is_throwing: bool,
        activity_id: &str,
    ) -> Option<EventSubscriptionDeclaration> {
        let Some(signal_ref) = element.attribute("signalRef") else {
            self.diagnostics.error(
                codes::INVALID_SIGNAL_EVENT,
                "signalEventDefinition does not have required property 'signalRef'",
                element,
                &[activity_id],
            );
            return None;
        };
        let Some(signal) = self.registry.signal(signal_ref) else {
            self.diagnostics.error(
                codes::UNRESOLVED_REFERENCE,
                format!("Could not find signal with id '{signal_ref}'"),
                element,
                &[activity_id],
            );
            return None;
        };

        let mut declaration = EventSubscriptionDeclaration::new(EventType::Signal, Some(signal.name.clone()));
        if is_throwing {
            declaration.payload = Some(self.parse_signal_payload(element, activity_id));
        }
        declaration.is_async = element.attribute_ns_or(&VENDOR_NS, "async", "false") == "true";
        Some(declaration)
    }

    fn parse_signal_payload(&mut self, element: &Element, activity_id: &str) -> SignalPayload {
        let mut payload = SignalPayload::default();
        let Some(extensions) = element.extension_elements() else {
            return payload;
        };
        let owner_id = element.attribute("id").unwrap_or(activity_id);

        for input in extensions.elements_ns(&VENDOR_NS, "in") {
            match input.attribute("businessKey").filter(|key| !key.is_empty()) {
                Some(business_key) => {
                    payload.business_key =
                        Some(ParameterValue::from_text(Some(business_key), self.expressions));
                }
                None => {
                    let mut parameter = self.parse_callable_element_parameter(input, owner_id);
                    if input.attribute("local") == Some("true") {
                        parameter.read_local = true;
                    }
                    payload.inputs.push(parameter);
                }
            }
        }
        payload
    }

    /// Catching signal: a subscription on the event scope plus the job that
    /// delivers the signal asynchronously.
    pub(super) fn parse_signal_catch_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
        start_event: bool,
    ) {
        let activity_id = self.process.activity(activity).id.clone();
        let Some(mut declaration) = self.parse_signal_event_definition(definition, false, &activity_id) else {
            return;
        };
        declaration.activity_id = activity_id.clone();
        declaration.start_event = start_event;
        let event_scope = self.event_scope_of(activity);
        self.add_event_subscription(event_scope, declaration, definition);

        let catching = self.process.activity(activity);
        let job = EventSubscriptionJobDeclaration {
            activity_id: activity_id.clone(),
            event_type: EventType::Signal,
            priority: catching.job_priority.clone(),
        };
        if catching
            .event_subscription_jobs
            .iter()
            .any(|existing| existing.event_type == job.event_type)
        {
            self.diagnostics.error(
                codes::DUPLICATE_JOB_DECLARATION,
                format!(
                    "Activity contains already job declaration with type {}",
                    job.event_type.as_str()
                ),
                definition,
                &[activity_id.as_str()],
            );
        }
        self.process.activity_mut(activity).event_subscription_jobs.push(job);
    }

    pub(super) fn parse_boundary_signal_event_definition(
        &mut self,
        definition: &Element,
        interrupting: bool,
        activity: ActivityId,
    ) -> ParseResult {
        self.process.activity_mut(activity).activity_type = ActivityType::BoundarySignal;
        let activity_id = self.process.activity(activity).id.clone();

        let declaration = self.parse_signal_event_definition(definition, false, &activity_id);
        self.require_boundary_id(definition, &activity_id);
        if let Some(mut declaration) = declaration {
            declaration.activity_id = activity_id;
            let event_scope = self.event_scope_of(activity);
            self.add_event_subscription(event_scope, declaration, definition);
        }

        notify!(self.parse_boundary_signal_event_definition(definition, interrupting, activity));
        Ok(())
    }

    pub(super) fn parse_intermediate_signal_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
    ) -> ParseResult {
        self.process.activity_mut(activity).activity_type = ActivityType::IntermediateSignal;
        self.parse_signal_catch_event_definition(definition, activity, false);

        notify!(self.parse_intermediate_signal_catch_event_definition(definition, activity));
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------

    /// Error handler for the error referenced by `errorRef`. An unknown
    /// reference is used as the error code itself.
    pub(super) fn create_error_event_definition(
        &self,
        definition: &Element,
        handler_id: SmolStr,
    ) -> ErrorEventDefinition {
        let mut error = ErrorEventDefinition::new(handler_id);
        if let Some(error_ref) = definition.attribute("errorRef") {
            error.error_code = match self.registry.error(error_ref) {
                Some(declared) => declared.error_code.clone(),
                None => Some(SmolStr::new(error_ref)),
            };
        }
        set_error_variables(definition, &mut error);
        error
    }

    pub(super) fn parse_boundary_error_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
    ) -> ParseResult {
        self.process.activity_mut(activity).activity_type = ActivityType::BoundaryError;
        let handler_id = self.process.activity(activity).id.clone();

        let error = self.create_error_event_definition(definition, handler_id);
        let event_scope = self.event_scope_of(activity);
        self.process.scope_mut(event_scope).add_error_event_definition(error);

        notify!(self.parse_boundary_error_event_definition(definition, true, activity));
        Ok(())
    }

    /// Error start event of an event subprocess; outranks boundary events.
    pub(super) fn parse_error_start_event_for_event_subprocess(
        &mut self,
        definition: &Element,
        start: ActivityId,
        sub_process: ActivityId,
    ) {
        self.process.activity_mut(start).activity_type = ActivityType::StartEventError;
        let handler_id = self.process.activity(sub_process).id.clone();

        let mut error = self.create_error_event_definition(definition, handler_id);
        error.precedence = EVENT_SUBPROCESS_ERROR_PRECEDENCE;
        let event_scope = self.event_scope_of(start);
        self.process.scope_mut(event_scope).add_error_event_definition(error);
    }

    // ------------------------------------------------------------------------
    // Escalations
    // ------------------------------------------------------------------------

    /// The escalation a throwing event references, reported when missing.
    pub(super) fn find_escalation(&mut self, definition: &Element, activity_id: &str) -> Option<EscalationDefinition> {
        let Some(escalation_ref) = definition.attribute("escalationRef") else {
            self.diagnostics.error(
                codes::INVALID_ESCALATION_EVENT,
                "escalationEventDefinition does not have required attribute 'escalationRef'",
                definition,
                &[activity_id],
            );
            return None;
        };
        let escalation = self.registry.escalation(escalation_ref).cloned();
        if escalation.is_none() {
            self.diagnostics.error(
                codes::UNRESOLVED_REFERENCE,
                format!("could not find escalation with id '{escalation_ref}'"),
                definition,
                &[activity_id],
            );
        }
        escalation
    }

    /// Escalation handler. Without `escalationRef` it catches every code.
    pub(super) fn create_escalation_event_definition(
        &mut self,
        definition: &Element,
        handler: ActivityId,
        cancel_activity: bool,
        parent_id: &str,
    ) -> EscalationEventDefinition {
        let handler_activity = self.process.activity(handler);
        let mut escalation = EscalationEventDefinition {
            handler_activity_id: handler_activity.id.clone(),
            handler_is_sub_process: handler_activity.is_sub_process_scope,
            cancel_activity,
            escalation_code: None,
            escalation_code_variable: definition
                .attribute_ns(&VENDOR_NS, "escalationCodeVariable")
                .map(SmolStr::new),
        };

        if let Some(escalation_ref) = definition.attribute("escalationRef") {
            match self.registry.escalation(escalation_ref) {
                Some(declared) => escalation.escalation_code = declared.escalation_code.clone(),
                None => self.diagnostics.error(
                    codes::UNRESOLVED_REFERENCE,
                    format!("could not find escalation with id '{escalation_ref}'"),
                    definition,
                    &[parent_id],
                ),
            }
        }
        escalation
    }

    /// Register an escalation handler on `scope`. Handlers of one kind
    /// (event subprocesses or boundary events) may not overlap: at most one
    /// catch-all, and no catch-all next to coded handlers.
    pub(super) fn add_escalation_event_definition(
        &mut self,
        scope: ScopeId,
        escalation: EscalationEventDefinition,
        element: &Element,
        escalation_element_id: &str,
    ) {
        let (kind, kinds) = if escalation.handler_is_sub_process {
            ("event subprocess", "event subprocesses")
        } else {
            ("boundary event", "boundary events")
        };

        let mut messages = Vec::new();
        for existing in &self.process.scope(scope).escalation_event_definitions {
            if existing.handler_is_sub_process != escalation.handler_is_sub_process {
                continue;
            }
            match (&existing.escalation_code, &escalation.escalation_code) {
                (None, None) => messages.push(format!(
                    "The same scope can not contains more than one escalation {kind} without escalation code. An escalation {kind} without escalation code catch all escalation events."
                )),
                (None, Some(_)) | (Some(_), None) => messages.push(format!(
                    "The same scope can not contains an escalation {kind} without escalation code and another one with escalation code. The escalation {kind} without escalation code catch all escalation events."
                )),
                (Some(existing_code), Some(code)) if existing_code == code => messages.push(format!(
                    "multiple escalation {kinds} with the same escalationCode '{code}' are not supported on same scope"
                )),
                _ => {}
            }
        }
        for message in messages {
            self.diagnostics.error(
                codes::INVALID_ESCALATION_EVENT,
                message,
                element,
                &[escalation_element_id],
            );
        }

        self.process
            .scope_mut(scope)
            .escalation_event_definitions
            .push(escalation);
    }

    pub(super) fn parse_boundary_escalation_event_definition(
        &mut self,
        definition: &Element,
        cancel_activity: bool,
        activity: ActivityId,
    ) -> ParseResult {
        self.process.activity_mut(activity).activity_type = ActivityType::BoundaryEscalation;
        let activity_id = self.process.activity(activity).id.clone();

        let escalation = self.create_escalation_event_definition(definition, activity, cancel_activity, &activity_id);
        let event_scope = self.event_scope_of(activity);
        self.add_escalation_event_definition(event_scope, escalation, definition, &activity_id);

        notify!(self.parse_boundary_escalation_event_definition(definition, cancel_activity, activity));
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Compensation
    // ------------------------------------------------------------------------

    /// Target of a throwing compensation event.
    ///
    /// `activityRef` must name an activity of the scope's sub-process level,
    /// or of the enclosing level when thrown from an event subprocess. The
    /// check waits in the backlog until that scope is complete.
    pub(super) fn parse_throw_compensate_event_definition(
        &mut self,
        definition: &Element,
        scope: ScopeId,
        parent_id: &str,
    ) -> CompensateEventDefinition {
        let activity_ref = definition.attribute("activityRef");
        let wait_for_completion = definition.attribute_or("waitForCompletion", "true") == "true";

        if let Some(activity_ref) = activity_ref {
            if self
                .process
                .find_activity_at_level_of_subprocess(scope, activity_ref)
                .is_none()
            {
                let mut target_scope = scope;
                if let Some(activity) = scope.activity().map(|id| self.process.activity(id)) {
                    if activity.triggered_by_event && activity.activity_type == ActivityType::SubProcess {
                        target_scope = activity.flow_scope;
                    }
                }
                if self
                    .process
                    .find_activity_at_level_of_subprocess(target_scope, activity_ref)
                    .is_none()
                {
                    let scope_id = self.process.scope_element_id(target_scope).to_string();
                    let diagnostic = Diagnostic::error(format!(
                        "Invalid attribute value for 'activityRef': no activity with id '{activity_ref}' in scope '{scope_id}'"
                    ))
                    .with_code(codes::INVALID_ATTRIBUTE_VALUE)
                    .at(definition)
                    .with_element_id(parent_id);
                    self.add_to_backlog(target_scope, activity_ref, diagnostic);
                }
            }
        }

        if !wait_for_completion {
            self.diagnostics.warning(
                codes::IGNORED_ATTRIBUTE,
                "Unsupported attribute value for 'waitForCompletion': 'waitForCompletion=false' is not supported. Compensation event will wait for compensation to join.",
                definition,
                &[parent_id],
            );
        }

        CompensateEventDefinition {
            activity_ref: activity_ref.map(SmolStr::new),
            wait_for_completion: true,
        }
    }

    /// Catching compensation events ignore the throw-side attributes.
    pub(super) fn validate_catch_compensate_event_definition(&mut self, definition: &Element, parent_id: &str) {
        if definition.attribute("activityRef").is_some() {
            self.diagnostics.warning(
                codes::IGNORED_ATTRIBUTE,
                "attribute 'activityRef' is not supported on catching compensation event. attribute will be ignored",
                definition,
                &[parent_id],
            );
        }
        if definition.attribute("waitForCompletion").is_some() {
            self.diagnostics.warning(
                codes::IGNORED_ATTRIBUTE,
                "attribute 'waitForCompletion' is not supported on catching compensation event. attribute will be ignored",
                definition,
                &[parent_id],
            );
        }
    }

    pub(super) fn parse_boundary_compensate_event_definition(&mut self, definition: &Element, activity: ActivityId) {
        self.process.activity_mut(activity).activity_type = ActivityType::BoundaryCompensation;
        let boundary = self.process.activity(activity);
        let activity_id = boundary.id.clone();
        let host = boundary.event_scope;

        let duplicate = self.process.children(boundary.flow_scope).any(|sibling| {
            sibling.activity_type == ActivityType::BoundaryCompensation
                && sibling.event_scope == host
                && sibling.id != activity_id
        });
        if duplicate {
            self.diagnostics.error(
                codes::INVALID_COMPENSATION,
                "multiple boundary events with compensateEventDefinition not supported on same activity",
                definition,
                &[activity_id.as_str()],
            );
        }

        self.validate_catch_compensate_event_definition(definition, &activity_id);
    }

    // ------------------------------------------------------------------------
    // Cancel
    // ------------------------------------------------------------------------

    /// Cancel boundary event of a transaction. The transaction's cancel end
    /// events are wired to it.
    pub(super) fn parse_boundary_cancel_event_definition(&mut self, definition: &Element, activity: ActivityId) -> Behavior {
        {
            let boundary = self.process.activity_mut(activity);
            boundary.activity_type = ActivityType::BoundaryCancel;
            boundary.throws_compensation = true;
        }
        let boundary = self.process.activity(activity);
        let activity_id = boundary.id.clone();
        let flow_scope = boundary.flow_scope;
        let event_scope = boundary.event_scope;

        let mut transaction = event_scope.and_then(ScopeId::activity);
        if let Some(host) = transaction {
            let host_activity = self.process.activity(host);
            if host_activity.behavior.as_ref().is_some_and(Behavior::is_multi_instance) {
                transaction = host_activity.scope.activities.first().copied();
            }
        }

        let is_transaction = transaction
            .is_some_and(|id| self.process.activity(id).activity_type == ActivityType::Transaction);
        if !is_transaction {
            self.diagnostics.error(
                codes::INVALID_CANCEL_EVENT,
                "boundary event with cancelEventDefinition only supported on transaction subprocesses",
                definition,
                &[activity_id.as_str()],
            );
        }

        let transaction_scope = transaction.map(ScopeId::from);
        let duplicate = self.process.children(flow_scope).any(|sibling| {
            sibling.activity_type == ActivityType::BoundaryCancel
                && sibling.id != activity_id
                && sibling.event_scope.is_some()
                && sibling.event_scope == transaction_scope
        });
        if duplicate {
            self.diagnostics.error(
                codes::INVALID_CANCEL_EVENT,
                "multiple boundary events with cancelEventDefinition not supported on same transaction subprocess",
                definition,
                &[activity_id.as_str()],
            );
        }

        if let Some(transaction) = transaction {
            let cancel_end_events: Vec<ActivityId> = self
                .process
                .scope(transaction.into())
                .activities
                .iter()
                .copied()
                .filter(|&child| matches!(self.process.activity(child).behavior, Some(Behavior::CancelEndEvent)))
                .collect();
            for end_event in cancel_end_events {
                self.process.activity_mut(end_event).cancel_boundary = Some(activity);
            }
        }

        Behavior::CancelBoundary
    }

    // ------------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------------

    /// The `condition` of a conditional event definition. Marks the process
    /// as having conditional events.
    pub(super) fn parse_conditional_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
    ) -> Option<ConditionalEventDefinition> {
        let activity_id = self.process.activity(activity).id.clone();
        let Some(condition_element) = definition.element("condition") else {
            self.diagnostics.error(
                codes::INVALID_CONDITIONAL_EVENT,
                "Conditional event must contain an expression for evaluation.",
                definition,
                &[],
            );
            return None;
        };

        let condition = self.parse_condition_expression(condition_element, &activity_id)?;
        self.process.has_conditional_events = true;

        let variable_events_list = definition
            .attribute_ns(&VENDOR_NS, "variableEvents")
            .map(split_comma_separated)
            .unwrap_or_default();
        let mut variable_events: Vec<SmolStr> = Vec::new();
        for event in &variable_events_list {
            if !VARIABLE_EVENTS.contains(&event.as_str()) {
                self.diagnostics.warning(
                    codes::UNKNOWN_VARIABLE_EVENT,
                    format!(
                        "Variable event: {event} is not valid. Possible variable change events are: [{}]:",
                        VARIABLE_EVENTS.join(", ")
                    ),
                    definition,
                    &[],
                );
            }
            if !variable_events.iter().any(|known| known == event) {
                variable_events.push(SmolStr::new(event));
            }
        }

        Some(ConditionalEventDefinition {
            condition,
            condition_text: condition_element.text().to_string(),
            activity_id,
            variable_name: definition
                .attribute_ns(&VENDOR_NS, "variableName")
                .map(SmolStr::new),
            variable_events,
            interrupting: false,
        })
    }

    fn subscribe_conditional(&mut self, definition: &Element, activity: ActivityId, conditional: &ConditionalEventDefinition, start_event: bool) {
        let mut declaration = EventSubscriptionDeclaration::conditional(conditional.clone());
        declaration.start_event = start_event;
        let event_scope = self.event_scope_of(activity);
        self.add_event_subscription(event_scope, declaration, definition);
    }

    pub(super) fn parse_boundary_conditional_event_definition(
        &mut self,
        definition: &Element,
        interrupting: bool,
        activity: ActivityId,
    ) -> ParseResult<Option<Behavior>> {
        self.process.activity_mut(activity).activity_type = ActivityType::BoundaryConditional;
        let Some(mut conditional) = self.parse_conditional_event_definition(definition, activity) else {
            return Ok(None);
        };
        conditional.interrupting = interrupting;
        self.subscribe_conditional(definition, activity, &conditional, false);

        notify!(self.parse_boundary_conditional_event_definition(definition, interrupting, activity, &conditional));
        Ok(Some(Behavior::BoundaryConditional(conditional)))
    }

    pub(super) fn parse_intermediate_conditional_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
    ) -> ParseResult<Option<ConditionalEventDefinition>> {
        self.process.activity_mut(activity).activity_type = ActivityType::IntermediateConditional;
        let Some(conditional) = self.parse_conditional_event_definition(definition, activity) else {
            return Ok(None);
        };
        self.subscribe_conditional(definition, activity, &conditional, false);

        notify!(self.parse_intermediate_conditional_event_definition(definition, activity, &conditional));
        Ok(Some(conditional))
    }

    pub(super) fn parse_conditional_start_event_for_event_subprocess(
        &mut self,
        definition: &Element,
        activity: ActivityId,
        interrupting: bool,
    ) -> ParseResult<Option<ConditionalEventDefinition>> {
        self.process.activity_mut(activity).activity_type = ActivityType::StartEventConditional;
        let Some(mut conditional) = self.parse_conditional_event_definition(definition, activity) else {
            return Ok(None);
        };
        conditional.interrupting = interrupting;
        self.subscribe_conditional(definition, activity, &conditional, false);

        notify!(self.parse_conditional_start_event_for_event_subprocess(definition, activity, &conditional));
        Ok(Some(conditional))
    }
}

/// The configured timer element and its type.
fn timer_configuration(definition: &Element) -> Option<(TimerDeclarationType, &Element)> {
    [
        ("timeDate", TimerDeclarationType::Date),
        ("timeCycle", TimerDeclarationType::Cycle),
        ("timeDuration", TimerDeclarationType::Duration),
    ]
    .into_iter()
    .find_map(|(tag, timer_type)| definition.element(tag).map(|element| (timer_type, element)))
}
