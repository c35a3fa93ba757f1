//! Sequence flows and their conditions.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::util::parse_documentation;
use super::{BpmnParse, ParseResult, notify};
use crate::base::constants::BPMN20_NS;
use crate::base::{ActivityId, ScopeId, TransitionId};
use crate::diagnostics::{Diagnostic, codes};
use crate::expression::Condition;
use crate::model::Behavior;
use crate::xml::{Element, VENDOR_NS, XSI};

const FORMAL_EXPRESSION_TYPE: &str = "tFormalExpression";

enum FlowRejection {
    /// Flows out of an event-based gateway; the gateway claimed their targets.
    Resolved,
    Invalid(&'static str, String),
}

impl BpmnParse<'_> {
    /// Transitions for the `sequenceFlow` children of `element`.
    ///
    /// Flows never cross a sub-process boundary: both ends are looked up at
    /// the sub-process level of `scope`. A flow into a throwing link event is
    /// redirected to the catching event of the same link name, and a flow
    /// touching a multi-instance activity is attached to its body.
    pub(super) fn parse_sequence_flows(
        &mut self,
        element: &Element,
        scope: ScopeId,
        compensation_handlers: &IndexMap<&str, &Element>,
    ) -> ParseResult {
        for flow in element.elements("sequenceFlow") {
            let id = flow.attribute("id");
            let flow_id = id.unwrap_or("null");
            let source_ref = flow.attribute_or("sourceRef", "");
            let mut destination_ref = SmolStr::new(flow.attribute_or("targetRef", ""));

            if let Some(link_name) = self.link_sources.get(destination_ref.as_str()) {
                match self.link_targets.get(link_name) {
                    Some(target) => destination_ref = target.clone(),
                    None => {
                        let message = format!(
                            "sequence flow points to link event source with name '{link_name}' but no event target with that name exists. Most probably your link events are not configured correctly."
                        );
                        self.diagnostics.error(codes::UNMATCHED_LINK, message, flow, &[]);
                        continue;
                    }
                }
            }

            let source = self.process.find_activity_at_level_of_subprocess(scope, source_ref);
            let destination = self
                .process
                .find_activity_at_level_of_subprocess(scope, &destination_ref);

            let is_handler = |activity: Option<ActivityId>, reference: &str| match activity {
                Some(activity) => self.process.activity(activity).is_compensation_handler(),
                None => compensation_handlers.contains_key(reference),
            };

            if is_handler(source, source_ref) {
                self.diagnostics.error(
                    codes::COMPENSATION_FLOW,
                    format!(
                        "Invalid outgoing sequence flow of compensation activity '{source_ref}'. A compensation activity should not have an incoming or outgoing sequence flow."
                    ),
                    flow,
                    &[source_ref, flow_id],
                );
                continue;
            }
            if is_handler(destination, &destination_ref) {
                self.diagnostics.error(
                    codes::COMPENSATION_FLOW,
                    format!(
                        "Invalid incoming sequence flow of compensation activity '{destination_ref}'. A compensation activity should not have an incoming or outgoing sequence flow."
                    ),
                    flow,
                    &[destination_ref.as_str(), flow_id],
                );
                continue;
            }
            let Some(source) = source else {
                self.diagnostics.error(
                    codes::INVALID_FLOW_SOURCE,
                    format!("Invalid source '{source_ref}' of sequence flow '{flow_id}'"),
                    flow,
                    &[],
                );
                continue;
            };
            let Some(destination) = destination else {
                self.diagnostics.error(
                    codes::INVALID_FLOW_DESTINATION,
                    format!("Invalid destination '{destination_ref}' of sequence flow '{flow_id}'"),
                    flow,
                    &[],
                );
                continue;
            };

            match self.check_flow_topology(source, destination) {
                Some(FlowRejection::Resolved) => continue,
                Some(FlowRejection::Invalid(code, message)) => {
                    self.diagnostics.error(code, message, flow, &[]);
                    continue;
                }
                None => {}
            }

            let source = self.multi_instance_scope(source).unwrap_or(source);
            let destination = self.multi_instance_scope(destination).unwrap_or(destination);

            let transition = self
                .process
                .create_transition(source, destination, id.map(SmolStr::new));
            {
                let created = self.process.transition_mut(transition);
                created.name = flow.attribute("name").map(SmolStr::new);
                created.documentation = parse_documentation(flow);
                created.line = flow.line();
            }
            self.parse_sequence_flow_condition(flow, transition);
            self.parse_execution_listeners_on_transition(flow, transition);

            notify!(self.parse_sequence_flow(flow, scope, transition));
        }
        Ok(())
    }

    /// Why a flow between resolved activities must not become a transition.
    fn check_flow_topology(&self, source: ActivityId, destination: ActivityId) -> Option<FlowRejection> {
        let source_activity = self.process.activity(source);
        let destination_activity = self.process.activity(destination);

        if matches!(source_activity.behavior, Some(Behavior::EventBasedGateway)) {
            return Some(FlowRejection::Resolved);
        }

        let catches = matches!(
            destination_activity.behavior,
            Some(Behavior::IntermediateCatchEvent { .. } | Behavior::IntermediateConditional(_))
        );
        let after_gateway = destination_activity
            .event_scope
            .and_then(ScopeId::activity)
            .is_some_and(|scope| {
                self.process
                    .activity(scope)
                    .behavior
                    .as_ref()
                    .is_some_and(Behavior::is_event_based_gateway)
            });
        if catches && after_gateway {
            return Some(FlowRejection::Invalid(
                codes::EVENT_BASED_GATEWAY_FLOW,
                format!(
                    "Invalid incoming sequenceflow for intermediateCatchEvent with id '{}' connected to an event-based gateway.",
                    destination_activity.id
                ),
            ));
        }

        if is_event_sub_process(source_activity.behavior.as_ref(), source_activity.triggered_by_event) {
            return Some(FlowRejection::Invalid(
                codes::EVENT_SUBPROCESS_FLOW,
                "Invalid outgoing sequence flow of event subprocess".to_string(),
            ));
        }
        if is_event_sub_process(destination_activity.behavior.as_ref(), destination_activity.triggered_by_event) {
            return Some(FlowRejection::Invalid(
                codes::EVENT_SUBPROCESS_FLOW,
                "Invalid incoming sequence flow of event subprocess".to_string(),
            ));
        }
        None
    }

    /// The multi-instance body wrapping `activity`, if any.
    pub(super) fn multi_instance_scope(&self, activity: ActivityId) -> Option<ActivityId> {
        let activity = self.process.activity(activity);
        if activity.is_multi_instance {
            activity.flow_scope.activity()
        } else {
            None
        }
    }

    fn parse_sequence_flow_condition(&mut self, flow: &Element, transition: TransitionId) {
        let Some(condition_element) = flow.element("conditionExpression") else {
            return;
        };
        let ancestor_id = flow.attribute_or("id", "");
        let condition = self.parse_condition_expression(condition_element, ancestor_id);

        let created = self.process.transition_mut(transition);
        created.condition_text = Some(condition_element.text().to_string());
        created.condition = condition;
    }

    /// A condition: an expression, or a script when a `language` is given.
    /// Only `tFormalExpression` is accepted as `xsi:type`.
    pub(super) fn parse_condition_expression(&mut self, element: &Element, ancestor_id: &str) -> Option<Condition> {
        if let Some(condition_type) = element.attribute_ns(&XSI, "type") {
            let resolved = if condition_type.contains(':') {
                self.registry.resolve_name(condition_type)
            } else {
                format!("{BPMN20_NS}:{condition_type}")
            };
            if resolved != format!("{BPMN20_NS}:{FORMAL_EXPRESSION_TYPE}") {
                self.diagnostics.error(
                    codes::INVALID_CONDITION,
                    "Invalid type, only tFormalExpression is currently supported",
                    element,
                    &[ancestor_id],
                );
            }
        }

        let text = element.text();
        let Some(language) = element.attribute("language") else {
            return Some(Condition::Expression(self.expressions.create_expression(text)));
        };

        let resource = element.attribute_ns(&VENDOR_NS, "resource");
        match self
            .scripts
            .create_script(Some(language), Some(text), resource, self.expressions)
        {
            Ok(script) => Some(Condition::Script(script)),
            Err(error) => {
                self.diagnostics.add(
                    Diagnostic::error(format!("Unable to process condition expression:{error}"))
                        .with_code(codes::INVALID_CONDITION)
                        .at(element)
                        .with_element_id(ancestor_id),
                );
                None
            }
        }
    }
}

fn is_event_sub_process(behavior: Option<&Behavior>, triggered_by_event: bool) -> bool {
    triggered_by_event && matches!(behavior, Some(Behavior::SubProcess | Behavior::EventSubProcess))
}
