//! Start, intermediate, end and boundary events.

use smol_str::SmolStr;
use tracing::debug;

use super::tasks::is_service_like;
use super::{BpmnParse, ParseResult, notify};
use crate::base::{ActivityId, ScopeId};
use crate::diagnostics::{Diagnostic, codes};
use crate::model::{ActivityStartBehavior, ActivityType, Behavior, EventSubscriptionDeclaration};
use crate::xml::{Element, VENDOR_NS};

/// Event definition children of an event element.
struct EventDefinitions<'e> {
    timer: Option<&'e Element>,
    message: Option<&'e Element>,
    signal: Option<&'e Element>,
    error: Option<&'e Element>,
    escalation: Option<&'e Element>,
    compensate: Option<&'e Element>,
    conditional: Option<&'e Element>,
    cancel: Option<&'e Element>,
    terminate: Option<&'e Element>,
    link: Option<&'e Element>,
}

impl<'e> EventDefinitions<'e> {
    fn of(element: &'e Element) -> Self {
        Self {
            timer: element.element("timerEventDefinition"),
            message: element.element("messageEventDefinition"),
            signal: element.element("signalEventDefinition"),
            error: element.element("errorEventDefinition"),
            escalation: element.element("escalationEventDefinition"),
            compensate: element.element("compensateEventDefinition"),
            conditional: element.element("conditionalEventDefinition"),
            cancel: element.element("cancelEventDefinition"),
            terminate: element.element("terminateEventDefinition"),
            link: element.element("linkEventDefinition"),
        }
    }
}

impl BpmnParse<'_> {
    // ------------------------------------------------------------------------
    // Start events
    // ------------------------------------------------------------------------

    /// Start events of `element`. On the process level this also selects the
    /// initial activity and attaches the start form.
    pub(super) fn parse_start_events(&mut self, element: &Element, scope: ScopeId) -> ParseResult {
        let start_elements: Vec<&Element> = element.elements("startEvent").collect();
        let mut starts = Vec::with_capacity(start_elements.len());

        if start_elements.is_empty() && matches!(element.tag(), "process" | "subProcess") {
            self.diagnostics.error(
                codes::INVALID_START_EVENT,
                format!("{} must define a startEvent element", element.tag()),
                element,
                &[],
            );
        }

        for &start_element in &start_elements {
            let activity = self.create_activity_on_scope(start_element, scope, ActivityType::StartEvent)?;
            self.parse_async_for_activity(start_element, activity);

            match scope.activity() {
                None => self.parse_process_start_event(activity, start_element),
                Some(scope_activity) => {
                    self.parse_scope_start_event(activity, start_element, element, scope_activity)?;
                }
            }

            self.ensure_no_io_mapping(start_element);
            self.parse_execution_listeners_on_scope(start_element, activity.into());
            starts.push(activity);
        }

        if scope.is_process() {
            self.select_initial(&starts, element);
            self.parse_start_form(&start_elements);
        }

        for (start_element, activity) in start_elements.into_iter().zip(starts) {
            notify!(self.parse_start_event(start_element, scope, activity));
        }
        Ok(())
    }

    /// The single none or timer start event becomes the initial activity; a
    /// lone start event of any other type does too.
    fn select_initial(&mut self, starts: &[ActivityId], element: &Element) {
        let mut initial: Option<ActivityId> = None;
        for &start in starts {
            if !self.process.activity(start).activity_type.is_initial_candidate() {
                continue;
            }
            match initial {
                None => initial = Some(start),
                Some(selected) => {
                    let selected_id = self.process.activity(selected).id.clone();
                    let duplicate_id = self.process.activity(start).id.clone();
                    self.diagnostics.error(
                        codes::MULTIPLE_INITIAL_START_EVENTS,
                        "multiple none start events or timer start events not supported on process definition",
                        element,
                        &[selected_id.as_str(), duplicate_id.as_str()],
                    );
                }
            }
        }
        if initial.is_none() {
            if let [only] = starts {
                initial = Some(*only);
            }
        }
        self.process.scope.initial = initial;
    }

    fn parse_start_form(&mut self, start_elements: &[&Element]) {
        let Some(initial_id) = self.process.initial().map(|initial| initial.id.clone()) else {
            return;
        };
        let Some(start_element) = start_elements
            .iter()
            .find(|start| start.attribute_or("id", "") == initial_id)
        else {
            return;
        };
        let form = self.parse_form_definition(start_element);
        self.process.start_form = Some(form);
    }

    fn parse_process_start_event(&mut self, activity: ActivityId, element: &Element) {
        if let Some(initiator) = element.attribute_ns(&VENDOR_NS, "initiator") {
            self.process.initiator_variable_name = Some(SmolStr::new(initiator));
        }
        self.process.activity_mut(activity).behavior = Some(Behavior::NoneStartEvent);

        let definitions = EventDefinitions::of(element);
        let activity_id = self.process.activity(activity).id.clone();

        if let Some(timer) = definitions.timer {
            self.parse_timer_start_event_definition(timer, activity);
        } else if let Some(message) = definitions.message {
            self.process.activity_mut(activity).activity_type = ActivityType::StartEventMessage;
            if let Some(mut declaration) = self.parse_message_event_definition(message, &activity_id) {
                declaration.activity_id = activity_id.clone();
                declaration.start_event = true;
                self.ensure_no_expression_in_message_start_event(message, &declaration, &activity_id);
                self.add_event_subscription(ScopeId::Process, declaration, element);
            }
        } else if let Some(signal) = definitions.signal {
            let start = self.process.activity_mut(activity);
            start.activity_type = ActivityType::StartEventSignal;
            start.event_scope = Some(ScopeId::Process);
            self.parse_signal_catch_event_definition(signal, activity, true);
        } else if let Some(conditional) = definitions.conditional {
            self.process.activity_mut(activity).activity_type = ActivityType::StartEventConditional;
            if let Some(definition) = self.parse_conditional_event_definition(conditional, activity) {
                self.process.activity_mut(activity).conditional_event = Some(definition.clone());
                let mut declaration = EventSubscriptionDeclaration::conditional(definition);
                declaration.start_event = true;
                self.add_event_subscription(ScopeId::Process, declaration, element);
            }
        }
    }

    fn ensure_no_expression_in_message_start_event(
        &mut self,
        definition: &Element,
        declaration: &EventSubscriptionDeclaration,
        parent_id: &str,
    ) {
        if declaration.has_event_name() && declaration.has_expression_name() {
            let name = declaration.unresolved_event_name().unwrap_or_default();
            self.diagnostics.error(
                codes::INVALID_MESSAGE_EVENT,
                format!(
                    "Invalid message name '{name}' for element '{}': expressions in the message start event name are not allowed!",
                    definition.tag()
                ),
                definition,
                &[parent_id],
            );
        }
    }

    /// Start event of a subprocess. Event subprocess starts register their
    /// trigger on the subprocess's flow scope; plain subprocess starts take
    /// no event definitions.
    fn parse_scope_start_event(
        &mut self,
        activity: ActivityId,
        element: &Element,
        parent: &Element,
        scope_activity: ActivityId,
    ) -> ParseResult {
        let activity_id = self.process.activity(activity).id.clone();
        let scope = ScopeId::from(scope_activity);
        if self.process.scope(scope).initial.is_none() {
            self.process.scope_mut(scope).initial = Some(activity);
        } else {
            self.diagnostics.error(
                codes::INVALID_START_EVENT,
                "multiple start events not supported for subprocess",
                parent,
                &[activity_id.as_str()],
            );
        }

        let definitions = EventDefinitions::of(element);
        if self.process.activity(scope_activity).triggered_by_event {
            self.parse_event_sub_process_start_event(activity, element, scope_activity, &definitions)?;
            return Ok(());
        }

        let disallowed = [
            (definitions.conditional, "conditionalEventDefinition is not allowed on start event within a subprocess"),
            (definitions.timer, "timerEventDefinition is not allowed on start event within a subprocess"),
            (definitions.escalation, "escalationEventDefinition is not allowed on start event within a subprocess"),
            (definitions.compensate, "compensateEventDefinition is not allowed on start event within a subprocess"),
            (definitions.error, "errorEventDefinition only allowed on start event if subprocess is an event subprocess"),
            (definitions.message, "messageEventDefinition only allowed on start event if subprocess is an event subprocess"),
            (definitions.signal, "signalEventDefinition only allowed on start event if subprocess is an event subprocess"),
        ];
        for (definition, message) in disallowed {
            if let Some(definition) = definition {
                self.diagnostics.error(
                    codes::INVALID_START_EVENT,
                    message,
                    definition,
                    &[activity_id.as_str()],
                );
            }
        }

        self.process.activity_mut(activity).behavior = Some(Behavior::NoneStartEvent);
        Ok(())
    }

    fn parse_event_sub_process_start_event(
        &mut self,
        activity: ActivityId,
        element: &Element,
        sub_process: ActivityId,
        definitions: &EventDefinitions<'_>,
    ) -> ParseResult {
        let activity_id = self.process.activity(activity).id.clone();
        let interrupting = element
            .attribute_or("isInterrupting", "true")
            .eq_ignore_ascii_case("true");

        let flow_scope = {
            let event_sub_process = self.process.activity_mut(sub_process);
            event_sub_process.start_behavior = if interrupting {
                ActivityStartBehavior::InterruptEventScope
            } else {
                ActivityStartBehavior::ConcurrentInFlowScope
            };
            event_sub_process.flow_scope
        };
        self.process.activity_mut(activity).event_scope = Some(flow_scope);

        let mut behavior = Behavior::EventSubProcessStart;

        if let Some(error) = definitions.error {
            if !interrupting {
                self.diagnostics.error(
                    codes::INVALID_EVENT_SUBPROCESS,
                    "error start event of event subprocess must be interrupting",
                    element,
                    &[],
                );
            }
            self.parse_error_start_event_for_event_subprocess(error, activity, sub_process);
        } else if let Some(message) = definitions.message {
            self.process.activity_mut(activity).activity_type = ActivityType::StartEventMessage;
            if let Some(declaration) = self.parse_message_event_definition(message, &activity_id) {
                self.parse_event_definition_for_sub_process(declaration, activity, message);
            }
        } else if let Some(signal) = definitions.signal {
            self.process.activity_mut(activity).activity_type = ActivityType::StartEventSignal;
            if let Some(declaration) = self.parse_signal_event_definition(signal, false, &activity_id) {
                self.parse_event_definition_for_sub_process(declaration, activity, signal);
            }
        } else if let Some(timer) = definitions.timer {
            self.parse_timer_start_event_for_event_subprocess(timer, activity, interrupting);
        } else if let Some(compensate) = definitions.compensate {
            self.parse_compensation_event_sub_process(activity, element, sub_process, compensate);
        } else if let Some(escalation) = definitions.escalation {
            self.process.activity_mut(activity).activity_type = ActivityType::StartEventEscalation;
            let definition =
                self.create_escalation_event_definition(escalation, sub_process, interrupting, &activity_id);
            self.add_escalation_event_definition(flow_scope, definition, escalation, &activity_id);
        } else if let Some(conditional) = definitions.conditional {
            if let Some(definition) =
                self.parse_conditional_start_event_for_event_subprocess(conditional, activity, interrupting)?
            {
                behavior = Behavior::EventSubProcessStartConditional(definition);
            }
        } else {
            self.diagnostics.error(
                codes::INVALID_EVENT_SUBPROCESS,
                "start event of event subprocess must be of type 'error', 'message', 'timer', 'signal', 'compensation' or 'escalation'",
                element,
                &[],
            );
        }

        self.process.activity_mut(activity).behavior = Some(behavior);
        Ok(())
    }

    fn parse_event_definition_for_sub_process(
        &mut self,
        mut declaration: EventSubscriptionDeclaration,
        activity: ActivityId,
        element: &Element,
    ) {
        let event_scope = self.event_scope_of(activity);
        declaration.activity_id = self.process.activity(activity).id.clone();
        declaration.event_scope_activity_id = Some(SmolStr::new(self.process.scope_element_id(event_scope)));
        declaration.start_event = false;
        self.add_event_subscription(event_scope, declaration, element);
    }

    /// Compensation start event: the event subprocess becomes the
    /// compensation handler of its enclosing subprocess.
    fn parse_compensation_event_sub_process(
        &mut self,
        activity: ActivityId,
        element: &Element,
        sub_process: ActivityId,
        definition: &Element,
    ) {
        self.process.activity_mut(activity).activity_type = ActivityType::StartEventCompensation;
        let activity_id = self.process.activity(activity).id.clone();
        let event_sub_process = self.process.activity_mut(sub_process);
        event_sub_process.is_for_compensation = true;

        match event_sub_process.flow_scope.activity() {
            None => self.diagnostics.error(
                codes::INVALID_COMPENSATION,
                "event subprocess with compensation start event is only supported for embedded subprocess (since throwing compensation through a call activity-induced process hierarchy is not supported)",
                element,
                &[],
            ),
            Some(enclosing) => match self.process.activity(enclosing).compensation_handler {
                None => self.process.activity_mut(enclosing).compensation_handler = Some(sub_process),
                Some(handler) => {
                    let message = if self.process.activity(handler).is_sub_process_scope {
                        "multiple event subprocesses with compensation start event are not supported on the same scope"
                    } else {
                        "compensation boundary event and event subprocess with compensation start event are not supported on the same scope"
                    };
                    self.diagnostics.error(codes::INVALID_COMPENSATION, message, element, &[]);
                }
            },
        }

        self.validate_catch_compensate_event_definition(definition, &activity_id);
    }

    // ------------------------------------------------------------------------
    // Intermediate events
    // ------------------------------------------------------------------------

    /// An intermediate catch event. After an event-based gateway the gateway
    /// is its event scope; otherwise the event is a scope of its own.
    pub(super) fn parse_intermediate_catch_event(
        &mut self,
        element: &Element,
        scope: ScopeId,
        event_based_gateway: Option<ActivityId>,
    ) -> ParseResult<Option<ActivityId>> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::IntermediateCatchEvent)?;
        self.parse_async_for_activity(element, activity);

        {
            let catch_event = self.process.activity_mut(activity);
            match event_based_gateway {
                Some(gateway) => {
                    catch_event.event_scope = Some(gateway.into());
                    catch_event.start_behavior = ActivityStartBehavior::CancelEventScope;
                }
                None => {
                    catch_event.event_scope = Some(activity.into());
                    catch_event.is_scope = true;
                }
            }
            catch_event.behavior = Some(Behavior::IntermediateCatchEvent {
                after_event_based_gateway: event_based_gateway.is_some(),
            });
        }

        let definitions = EventDefinitions::of(element);
        if let Some(timer) = definitions.timer {
            self.parse_intermediate_timer_event_definition(timer, activity)?;
        } else if let Some(signal) = definitions.signal {
            self.parse_intermediate_signal_event_definition(signal, activity)?;
        } else if let Some(message) = definitions.message {
            self.parse_intermediate_message_event_definition(message, activity)?;
        } else if let Some(link) = definitions.link {
            if event_based_gateway.is_some() {
                self.diagnostics.error(
                    codes::INVALID_LINK_EVENT,
                    "IntermediateCatchLinkEvent is not allowed after an EventBasedGateway.",
                    element,
                    &[],
                );
            }
            self.process.activity_mut(activity).behavior = Some(Behavior::IntermediateCatchLink);
            self.parse_link_catch(element, activity, link);
        } else if let Some(conditional) = definitions.conditional {
            if let Some(definition) = self.parse_intermediate_conditional_event_definition(conditional, activity)? {
                self.process.activity_mut(activity).behavior = Some(Behavior::IntermediateConditional(definition));
            }
        } else {
            self.diagnostics.error(
                codes::UNSUPPORTED_EVENT,
                "Unsupported intermediate catch event type",
                element,
                &[],
            );
        }

        self.parse_execution_listeners_on_scope(element, activity.into());
        notify!(self.parse_intermediate_catch_event(element, scope, activity));
        Ok(Some(activity))
    }

    /// Remember a catching link event as the target of its link name.
    fn parse_link_catch(&mut self, element: &Element, activity: ActivityId, link: &Element) {
        self.process.activity_mut(activity).activity_type = ActivityType::IntermediateLink;
        let Some(link_name) = link_name(self, element, link) else {
            return;
        };

        if self.link_targets.contains_key(link_name) {
            self.diagnostics.error(
                codes::INVALID_LINK_EVENT,
                format!("Multiple Intermediate Catch Events with the same link event name ('{link_name}') are not allowed."),
                element,
                &[],
            );
            return;
        }

        let element_name = element.attribute("name");
        if element_name != Some(link_name) {
            self.diagnostics.warning(
                codes::LINK_NAME_MISMATCH,
                format!(
                    "Link Event named '{}' contains link event definition with name '{link_name}' - it is recommended to use the same name for both.",
                    element_name.unwrap_or("null")
                ),
                element,
                &[],
            );
        }
        self.link_targets
            .insert(SmolStr::new(link_name), SmolStr::new(element.attribute_or("id", "")));
    }

    /// An intermediate throw event. A throwing link event creates no
    /// activity: it only redirects the flows that enter it.
    pub(super) fn parse_intermediate_throw_event(
        &mut self,
        element: &Element,
        scope: ScopeId,
    ) -> ParseResult<Option<ActivityId>> {
        let definitions = EventDefinitions::of(element);
        let element_id = element.attribute_or("id", "");

        if let Some(link) = definitions.link {
            if let Some(link_name) = link_name(self, element, link) {
                debug!(id = element_id, link = link_name, "throwing link event");
                self.link_sources
                    .insert(SmolStr::new(element_id), SmolStr::new(link_name));
            }
            return Ok(None);
        }

        let activity = self.create_activity_on_scope(element, scope, ActivityType::IntermediateThrowEvent)?;
        self.parse_async_for_activity(element, activity);
        let activity_id = self.process.activity(activity).id.clone();
        let service_like = is_service_like(definitions.message);

        let mut behavior = None;
        if let Some(signal) = definitions.signal {
            self.process.activity_mut(activity).activity_type = ActivityType::IntermediateSignalThrow;
            behavior = self
                .parse_signal_event_definition(signal, true, &activity_id)
                .map(Behavior::ThrowSignal);
        } else if let Some(compensate) = definitions.compensate {
            let definition = self.parse_throw_compensate_event_definition(compensate, scope, element_id);
            let thrower = self.process.activity_mut(activity);
            thrower.activity_type = ActivityType::IntermediateCompensationThrow;
            thrower.throws_compensation = true;
            thrower.is_scope = true;
            behavior = Some(Behavior::CompensationEvent(definition));
        } else if let Some(message) = definitions.message {
            if service_like {
                let element_name = ActivityType::IntermediateMessageThrow.as_str();
                self.process.activity_mut(activity).activity_type = ActivityType::IntermediateMessageThrow;
                self.parse_service_task_like(activity, element_name, message, element);
            } else {
                self.process.activity_mut(activity).activity_type = ActivityType::IntermediateNoneThrow;
                behavior = Some(Behavior::IntermediateThrowNone);
            }
        } else if let Some(escalation) = definitions.escalation {
            self.process.activity_mut(activity).activity_type = ActivityType::IntermediateEscalationThrow;
            let definition = self.find_escalation(escalation, &activity_id);
            if definition.as_ref().is_some_and(|d| d.escalation_code.is_none()) {
                self.diagnostics.error(
                    codes::INVALID_ESCALATION_EVENT,
                    "throwing escalation event must have an 'escalationCode'",
                    escalation,
                    &[activity_id.as_str()],
                );
            }
            behavior = Some(Behavior::ThrowEscalation(definition));
        } else {
            self.process.activity_mut(activity).activity_type = ActivityType::IntermediateNoneThrow;
            behavior = Some(Behavior::IntermediateThrowNone);
        }

        if behavior.is_some() {
            self.process.activity_mut(activity).behavior = behavior;
        }

        self.parse_execution_listeners_on_scope(element, activity.into());
        notify!(self.parse_intermediate_throw_event(element, scope, activity));

        // A listener may install the behavior of a message throw event.
        if let (true, Some(message)) = (service_like, definitions.message) {
            self.validate_service_task_like(activity, ActivityType::IntermediateMessageThrow.as_str(), message);
        }
        Ok(Some(activity))
    }

    // ------------------------------------------------------------------------
    // End events
    // ------------------------------------------------------------------------

    pub(super) fn parse_end_events(&mut self, element: &Element, scope: ScopeId) -> ParseResult {
        for end_element in element.elements("endEvent") {
            let activity = self.create_activity_on_scope(end_element, scope, ActivityType::EndEvent)?;
            let activity_id = self.process.activity(activity).id.clone();
            let definitions = EventDefinitions::of(end_element);
            let service_like = is_service_like(definitions.message);

            if let Some(error) = definitions.error {
                self.parse_error_end_event(error, activity, &activity_id);
            } else if let Some(cancel) = definitions.cancel {
                self.parse_cancel_end_event(cancel, activity, scope, &activity_id);
            } else if definitions.terminate.is_some() {
                let end = self.process.activity_mut(activity);
                end.activity_type = ActivityType::EndEventTerminate;
                end.behavior = Some(Behavior::TerminateEndEvent);
                end.start_behavior = ActivityStartBehavior::InterruptFlowScope;
            } else if let Some(message) = definitions.message {
                if service_like {
                    let element_name = ActivityType::EndEventMessage.as_str();
                    self.parse_service_task_like(activity, element_name, message, end_element);
                    self.process.activity_mut(activity).activity_type = ActivityType::EndEventMessage;
                } else {
                    self.process.activity_mut(activity).behavior = Some(Behavior::IntermediateThrowNone);
                }
            } else if let Some(signal) = definitions.signal {
                self.process.activity_mut(activity).activity_type = ActivityType::EndEventSignal;
                let behavior = self
                    .parse_signal_event_definition(signal, true, &activity_id)
                    .map(Behavior::ThrowSignal);
                self.process.activity_mut(activity).behavior = behavior;
            } else if let Some(compensate) = definitions.compensate {
                let definition = self.parse_throw_compensate_event_definition(compensate, scope, &activity_id);
                let end = self.process.activity_mut(activity);
                end.activity_type = ActivityType::EndEventCompensation;
                end.behavior = Some(Behavior::CompensationEvent(definition));
                end.throws_compensation = true;
                end.is_scope = true;
            } else if let Some(escalation) = definitions.escalation {
                self.process.activity_mut(activity).activity_type = ActivityType::EndEventEscalation;
                let definition = self.find_escalation(escalation, &activity_id);
                if definition.as_ref().is_some_and(|d| d.escalation_code.is_none()) {
                    self.diagnostics.error(
                        codes::INVALID_ESCALATION_EVENT,
                        "escalation end event must have an 'escalationCode'",
                        escalation,
                        &[activity_id.as_str()],
                    );
                }
                self.process.activity_mut(activity).behavior = Some(Behavior::ThrowEscalation(definition));
            } else {
                let end = self.process.activity_mut(activity);
                end.activity_type = ActivityType::EndEventNone;
                end.behavior = Some(Behavior::NoneEndEvent);
            }

            self.parse_activity_input_output(end_element, activity)?;
            self.parse_async_for_activity(end_element, activity);
            self.parse_execution_listeners_on_scope(end_element, activity.into());
            notify!(self.parse_end_event(end_element, scope, activity));

            if let (true, Some(message)) = (service_like, definitions.message) {
                self.validate_service_task_like(activity, ActivityType::EndEventMessage.as_str(), message);
            }
        }
        Ok(())
    }

    fn parse_error_end_event(&mut self, definition: &Element, activity: ActivityId, activity_id: &str) {
        let Some(error_ref) = definition.attribute("errorRef").filter(|r| !r.is_empty()) else {
            self.diagnostics.error(
                codes::INVALID_ERROR_EVENT,
                "'errorRef' attribute is mandatory on error end event",
                definition,
                &[activity_id],
            );
            return;
        };

        let behavior = match self.registry.error(error_ref).cloned() {
            Some(error) => {
                if error.error_code.as_deref().is_none_or(str::is_empty) {
                    self.diagnostics.error(
                        codes::INVALID_ERROR_EVENT,
                        format!(
                            "'errorCode' is mandatory on errors referenced by throwing error event definitions, but the error '{}' does not define one.",
                            error.id
                        ),
                        definition,
                        &[activity_id],
                    );
                }
                Behavior::ErrorEndEvent {
                    error_code: error.error_code,
                    error_message: error.error_message,
                }
            }
            None => Behavior::ErrorEndEvent {
                error_code: Some(SmolStr::new(error_ref)),
                error_message: None,
            },
        };

        let end = self.process.activity_mut(activity);
        end.activity_type = ActivityType::EndEventError;
        end.behavior = Some(behavior);
    }

    /// Cancel end events only live directly inside a transaction.
    fn parse_cancel_end_event(&mut self, definition: &Element, activity: ActivityId, scope: ScopeId, activity_id: &str) {
        let transaction = scope
            .activity()
            .filter(|&host| self.process.activity(host).activity_type == ActivityType::Transaction);
        let Some(transaction) = transaction else {
            self.diagnostics.error(
                codes::INVALID_CANCEL_EVENT,
                "end event with cancelEventDefinition only supported inside transaction subprocess",
                definition,
                &[activity_id],
            );
            return;
        };

        let end = self.process.activity_mut(activity);
        end.activity_type = ActivityType::EndEventCancel;
        end.behavior = Some(Behavior::CancelEndEvent);
        end.start_behavior = ActivityStartBehavior::InterruptFlowScope;
        end.throws_compensation = true;
        end.is_scope = true;
        self.process.activity_mut(transaction).cancel_end_events.push(activity);
    }

    // ------------------------------------------------------------------------
    // Boundary events
    // ------------------------------------------------------------------------

    /// Boundary events of `element`. Each is created in `flow_scope` and
    /// catches in the scope of the activity it is attached to.
    pub(super) fn parse_boundary_events(&mut self, element: &Element, flow_scope: ScopeId) -> ParseResult {
        for boundary_element in element.elements("boundaryEvent") {
            let attached_to_ref = boundary_element.attribute_or("attachedToRef", "");
            if attached_to_ref.is_empty() {
                self.diagnostics.error(
                    codes::INVALID_BOUNDARY_EVENT,
                    "AttachedToRef is required when using a timerEventDefinition",
                    boundary_element,
                    &[],
                );
            }
            debug!(
                kind = "boundary event",
                id = boundary_element.attribute_or("id", ""),
                "parsing element"
            );

            let definitions = EventDefinitions::of(boundary_element);
            let activity = self.create_activity_on_scope(boundary_element, flow_scope, ActivityType::BoundaryEvent)?;
            self.parse_async(Some(boundary_element), activity);

            let Some(attached) = self
                .process
                .find_activity_at_level_of_subprocess(flow_scope, attached_to_ref)
            else {
                self.diagnostics.error(
                    codes::INVALID_BOUNDARY_EVENT,
                    "Invalid reference in boundary event. Make sure that the referenced activity is defined in the same scope as the boundary event",
                    boundary_element,
                    &[],
                );
                continue;
            };

            let event_scope = if definitions.compensate.is_none() && self.process.activity(attached).is_multi_instance {
                self.process.activity(attached).flow_scope
            } else {
                if definitions.compensate.is_none() {
                    self.process.activity_mut(attached).is_scope = true;
                }
                ScopeId::from(attached)
            };

            let cancel_activity = boundary_element
                .attribute_or("cancelActivity", "true")
                .eq_ignore_ascii_case("true");
            {
                let boundary = self.process.activity_mut(activity);
                boundary.event_scope = Some(event_scope);
                boundary.start_behavior = if cancel_activity {
                    ActivityStartBehavior::CancelEventScope
                } else {
                    ActivityStartBehavior::ConcurrentInFlowScope
                };
            }
            self.process.activity_mut(attached).boundary_events.push(activity);

            let mut behavior = Behavior::BoundaryEvent;
            if let Some(timer) = definitions.timer {
                self.parse_boundary_timer_event_definition(timer, cancel_activity, activity)?;
            } else if let Some(error) = definitions.error {
                self.parse_boundary_error_event_definition(error, activity)?;
            } else if let Some(signal) = definitions.signal {
                self.parse_boundary_signal_event_definition(signal, cancel_activity, activity)?;
            } else if let Some(cancel) = definitions.cancel {
                behavior = self.parse_boundary_cancel_event_definition(cancel, activity);
            } else if let Some(compensate) = definitions.compensate {
                self.parse_boundary_compensate_event_definition(compensate, activity);
            } else if let Some(message) = definitions.message {
                self.parse_boundary_message_event_definition(message, cancel_activity, activity)?;
            } else if let Some(escalation) = definitions.escalation {
                if self.can_catch_escalation(attached) {
                    self.parse_boundary_escalation_event_definition(escalation, cancel_activity, activity)?;
                } else {
                    self.diagnostics.error(
                        codes::INVALID_ESCALATION_EVENT,
                        "An escalation boundary event should only be attached to a subprocess, a call activity or an user task",
                        boundary_element,
                        &[],
                    );
                }
            } else if let Some(conditional) = definitions.conditional {
                if let Some(conditional_behavior) =
                    self.parse_boundary_conditional_event_definition(conditional, cancel_activity, activity)?
                {
                    behavior = conditional_behavior;
                }
            } else {
                self.diagnostics.error(
                    codes::UNSUPPORTED_EVENT,
                    "Unsupported boundary event type",
                    boundary_element,
                    &[],
                );
            }

            self.ensure_no_io_mapping(boundary_element);
            self.process.activity_mut(activity).behavior = Some(behavior);
            self.parse_execution_listeners_on_scope(boundary_element, activity.into());
            notify!(self.parse_boundary_event(boundary_element, flow_scope, activity));
        }
        Ok(())
    }

    fn can_catch_escalation(&self, attached: ActivityId) -> bool {
        let host = self.process.activity(attached);
        host.is_sub_process_scope
            || matches!(
                host.behavior,
                Some(Behavior::CallActivity(_) | Behavior::UserTask { .. })
            )
    }
}

/// The `name` of a link event definition, reported when missing.
fn link_name<'e>(parse: &mut BpmnParse<'_>, element: &Element, link: &'e Element) -> Option<&'e str> {
    let name = link.attribute("name").filter(|name| !name.is_empty());
    if name.is_none() {
        parse.diagnostics.add(
            Diagnostic::error("Link event definition must have a 'name'")
                .with_code(codes::INVALID_LINK_EVENT)
                .at(element)
                .with_element_id(element.attribute_or("id", "")),
        );
    }
    name
}
