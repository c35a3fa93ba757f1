//! Activity shells, tag dispatch, gateways, subprocesses, call activities
//! and asynchronous continuations.

use smol_str::SmolStr;
use tracing::debug;

use super::util::{parse_boolean_or, parse_documentation};
use super::{BpmnParse, ParseResult, notify};
use crate::base::{ActivityId, ScopeId};
use crate::diagnostics::codes;
use crate::expression::{ParameterValue, is_expression};
use crate::model::{
    ActivityType, Behavior, CallActivityBehavior, CallableElement, CallableElementBinding,
    CalledElementKind, Priority, VariableDeclaration, VariableMapping,
};
use crate::xml::{Element, VENDOR_NS};

impl BpmnParse<'_> {
    /// Create the generic activity for `element` inside `scope`.
    pub(super) fn create_activity_on_scope(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity_type: ActivityType,
    ) -> ParseResult<ActivityId> {
        let id = element.attribute_or("id", "");
        debug!(kind = "activity", id, "parsing element");

        let job_priority = self.parse_priority(element, "jobPriority");
        let activity = self.process.create_activity(scope, id, activity_type)?;

        let created = self.process.activity_mut(activity);
        created.name = element.attribute("name").map(SmolStr::new);
        created.documentation = parse_documentation(element);
        created.default_flow = element.attribute("default").map(SmolStr::new);
        created.line = element.line();
        created.job_priority = job_priority;
        created.is_for_compensation = super::scope::is_compensation_handler(element);
        Ok(activity)
    }

    /// Dispatch a child of a scope element by tag.
    ///
    /// A `multiInstanceLoopCharacteristics` child wraps the activity in a
    /// body first; the activity is then created inside the body. Tags that
    /// are not activities yield `None`.
    pub(super) fn parse_activity(
        &mut self,
        element: &Element,
        parent: Option<&Element>,
        scope: ScopeId,
    ) -> ParseResult<Option<ActivityId>> {
        let body = self.parse_multi_instance_loop_characteristics(element, scope)?;
        let is_multi_instance = body.is_some();
        let scope = body.map_or(scope, ScopeId::from);

        let activity = match element.tag() {
            "exclusiveGateway" => Some(self.parse_gateway(element, scope, ActivityType::ExclusiveGateway)?),
            "inclusiveGateway" => Some(self.parse_gateway(element, scope, ActivityType::InclusiveGateway)?),
            "parallelGateway" => Some(self.parse_gateway(element, scope, ActivityType::ParallelGateway)?),
            "scriptTask" => Some(self.parse_script_task(element, scope)?),
            "serviceTask" => Some(self.parse_service_task(element, scope)?),
            "businessRuleTask" => Some(self.parse_business_rule_task(element, scope)?),
            "task" => Some(self.parse_task(element, scope)?),
            "manualTask" => Some(self.parse_manual_task(element, scope)?),
            "userTask" => Some(self.parse_user_task(element, scope)?),
            "sendTask" => Some(self.parse_send_task(element, scope)?),
            "receiveTask" => Some(self.parse_receive_task(element, scope)?),
            "subProcess" => Some(self.parse_sub_process(element, scope)?),
            "callActivity" => Some(self.parse_call_activity(element, scope, is_multi_instance)?),
            "intermediateThrowEvent" => self.parse_intermediate_throw_event(element, scope)?,
            "eventBasedGateway" => Some(self.parse_event_based_gateway(element, parent, scope)?),
            "transaction" => Some(self.parse_transaction(element, scope)?),
            "adHocSubProcess" | "complexGateway" => {
                self.diagnostics.warning(
                    codes::UNSUPPORTED_ACTIVITY,
                    "Ignoring unsupported activity type",
                    element,
                    &[],
                );
                None
            }
            _ => None,
        };

        if let Some(activity) = activity {
            if is_multi_instance {
                self.process.activity_mut(activity).is_multi_instance = true;
            }
            self.process.activity_mut(activity).name = element.attribute("name").map(SmolStr::new);
            self.parse_activity_input_output(element, activity)?;
        }
        Ok(activity)
    }

    // ------------------------------------------------------------------------
    // Gateways
    // ------------------------------------------------------------------------

    fn parse_gateway(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity_type: ActivityType,
    ) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, activity_type)?;
        let behavior = match activity_type {
            ActivityType::InclusiveGateway => Behavior::InclusiveGateway,
            ActivityType::ParallelGateway => Behavior::ParallelGateway,
            _ => Behavior::ExclusiveGateway,
        };
        self.process.activity_mut(activity).behavior = Some(behavior);

        self.parse_async_for_activity(element, activity);
        self.parse_execution_listeners_on_scope(element, activity.into());

        match activity_type {
            ActivityType::InclusiveGateway => notify!(self.parse_inclusive_gateway(element, scope, activity)),
            ActivityType::ParallelGateway => notify!(self.parse_parallel_gateway(element, scope, activity)),
            _ => notify!(self.parse_exclusive_gateway(element, scope, activity)),
        }
        Ok(activity)
    }

    /// The gateway claims the intermediate catch events its outgoing flows
    /// point at; they are parsed here with the gateway as event scope.
    fn parse_event_based_gateway(
        &mut self,
        element: &Element,
        parent: Option<&Element>,
        scope: ScopeId,
    ) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::EventBasedGateway)?;
        {
            let gateway = self.process.activity_mut(activity);
            gateway.behavior = Some(Behavior::EventBasedGateway);
            gateway.is_scope = true;
        }

        self.parse_async_for_activity(element, activity);
        if self.process.activity(activity).async_after {
            self.diagnostics.error(
                codes::INVALID_ASYNC,
                format!("'asyncAfter' not supported for {} elements.", element.tag()),
                element,
                &[],
            );
        }

        self.parse_execution_listeners_on_scope(element, activity.into());
        notify!(self.parse_event_based_gateway(element, scope, activity));

        let Some(parent) = parent else {
            return Ok(activity);
        };
        let gateway_id = self.process.activity(activity).id.clone();
        for flow in parent.elements("sequenceFlow") {
            if flow.attribute("sourceRef") != Some(gateway_id.as_str()) {
                continue;
            }
            let Some(target_ref) = flow.attribute("targetRef") else {
                continue;
            };
            let Some(target) = parent
                .children()
                .iter()
                .find(|sibling| sibling.attribute("id") == Some(target_ref))
            else {
                continue;
            };

            if target.tag() != "intermediateCatchEvent" {
                self.diagnostics.error(
                    codes::EVENT_BASED_GATEWAY_FLOW,
                    "Event based gateway can only be connected to elements of type intermediateCatchEvent",
                    element,
                    &[],
                );
                continue;
            }
            if self.process.find_activity(target_ref).is_some() {
                continue;
            }
            if let Some(catch_event) = self.parse_intermediate_catch_event(target, scope, Some(activity))? {
                self.parse_activity_input_output(target, catch_event)?;
            }
        }
        Ok(activity)
    }

    // ------------------------------------------------------------------------
    // Subprocesses
    // ------------------------------------------------------------------------

    fn parse_sub_process(&mut self, element: &Element, scope: ScopeId) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::SubProcess)?;
        self.process.activity_mut(activity).is_sub_process_scope = true;

        self.parse_async_for_activity(element, activity);

        let triggered_by_event =
            parse_boolean_or(element.attribute("triggeredByEvent"), false).unwrap_or(false);
        {
            let sub_process = self.process.activity_mut(activity);
            sub_process.triggered_by_event = triggered_by_event;
            sub_process.consumes_compensation = !triggered_by_event;
            sub_process.is_scope = true;
            if triggered_by_event {
                sub_process.behavior = Some(Behavior::EventSubProcess);
                sub_process.event_scope = Some(scope);
            } else {
                sub_process.behavior = Some(Behavior::SubProcess);
            }
        }

        self.parse_scope(element, activity.into())?;

        notify!(self.parse_sub_process(element, scope, activity));
        Ok(activity)
    }

    fn parse_transaction(&mut self, element: &Element, scope: ScopeId) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::Transaction)?;

        self.parse_async_for_activity(element, activity);
        {
            let transaction = self.process.activity_mut(activity);
            transaction.is_scope = true;
            transaction.is_sub_process_scope = true;
            transaction.behavior = Some(Behavior::SubProcess);
        }

        self.parse_scope(element, activity.into())?;

        notify!(self.parse_transaction(element, scope, activity));
        Ok(activity)
    }

    // ------------------------------------------------------------------------
    // Call activities
    // ------------------------------------------------------------------------

    fn parse_call_activity(
        &mut self,
        element: &Element,
        scope: ScopeId,
        is_multi_instance: bool,
    ) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::CallActivity)?;
        let id = self.process.activity(activity).id.clone();

        self.parse_async_for_activity(element, activity);

        let called_element = element.attribute("calledElement");
        let case_ref = element.attribute_ns(&VENDOR_NS, "caseRef");
        match (called_element, case_ref) {
            (None, None) => self.diagnostics.error(
                codes::INVALID_CALL_ACTIVITY,
                "Missing attribute 'calledElement' or 'caseRef'",
                element,
                &[],
            ),
            (Some(_), Some(_)) => self.diagnostics.error(
                codes::INVALID_CALL_ACTIVITY,
                "The attributes 'calledElement' or 'caseRef' cannot be used together: Use either 'calledElement' or 'caseRef'",
                element,
                &[],
            ),
            _ => {}
        }

        let (kind, definition_key, binding_attribute, version_attribute, tenant_attribute) =
            match called_element {
                Some(called_element) => (
                    CalledElementKind::Process,
                    Some(called_element),
                    "calledElementBinding",
                    "calledElementVersion",
                    "calledElementTenantId",
                ),
                None => (
                    CalledElementKind::Case,
                    case_ref,
                    "caseBinding",
                    "caseVersion",
                    "caseTenantId",
                ),
            };

        let variable_mapping = match kind {
            CalledElementKind::Process => {
                if let Some(class_name) = element.attribute_ns(&VENDOR_NS, "variableMappingClass") {
                    Some(VariableMapping::Class(SmolStr::new(class_name)))
                } else {
                    element
                        .attribute_ns(&VENDOR_NS, "variableMappingDelegateExpression")
                        .map(|expression| {
                            VariableMapping::DelegateExpression(self.expressions.create_expression(expression))
                        })
                }
            }
            CalledElementKind::Case => None,
        };

        let mut callable_element =
            CallableElement::new(ParameterValue::from_text(definition_key, self.expressions));
        self.parse_callable_element_attributes(
            element,
            &mut callable_element,
            binding_attribute,
            version_attribute,
            "calledElementVersionTag",
            tenant_attribute,
        );
        self.parse_call_activity_parameters(element, &id, &mut callable_element);

        {
            let call_activity = self.process.activity_mut(activity);
            // A multi-instance body already isolates the instances.
            if !is_multi_instance {
                call_activity.is_scope = true;
            }
            call_activity.behavior = Some(Behavior::CallActivity(CallActivityBehavior {
                kind,
                callable_element,
                variable_mapping,
            }));
        }

        self.parse_execution_listeners_on_scope(element, activity.into());
        notify!(self.parse_call_activity(element, scope, activity));
        Ok(activity)
    }

    /// Binding, version, version tag and tenant of a call activity or a
    /// decision reference.
    pub(super) fn parse_callable_element_attributes(
        &mut self,
        element: &Element,
        callable_element: &mut CallableElement,
        binding_attribute: &str,
        version_attribute: &str,
        version_tag_attribute: &str,
        tenant_attribute: &str,
    ) {
        callable_element.binding = element
            .attribute_ns(&VENDOR_NS, binding_attribute)
            .and_then(CallableElementBinding::parse);

        let version = element.attribute_ns(&VENDOR_NS, version_attribute);
        if callable_element.binding == Some(CallableElementBinding::Version) && version.is_none() {
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                format!("Missing attribute '{version_attribute}' when '{binding_attribute}' has value 'version'"),
                element,
                &[],
            );
        }
        callable_element.version = ParameterValue::from_text(version, self.expressions);

        let version_tag = element.attribute_ns(&VENDOR_NS, version_tag_attribute);
        if callable_element.binding == Some(CallableElementBinding::VersionTag) && version_tag.is_none() {
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                format!(
                    "Missing attribute '{version_tag_attribute}' when '{binding_attribute}' has value 'versionTag'"
                ),
                element,
                &[],
            );
        }
        callable_element.version_tag = ParameterValue::from_text(version_tag, self.expressions);

        callable_element.tenant_id = element
            .attribute_ns(&VENDOR_NS, tenant_attribute)
            .filter(|tenant| !tenant.is_empty())
            .map(|tenant| ParameterValue::from_text(Some(tenant), self.expressions));
    }

    fn parse_call_activity_parameters(
        &mut self,
        element: &Element,
        activity_id: &str,
        callable_element: &mut CallableElement,
    ) {
        let Some(extensions) = element.extension_elements() else {
            return;
        };

        for input in extensions.elements_ns(&VENDOR_NS, "in") {
            match input.attribute("businessKey").filter(|key| !key.is_empty()) {
                Some(business_key) => {
                    callable_element.business_key =
                        Some(ParameterValue::from_text(Some(business_key), self.expressions));
                }
                None => {
                    let mut parameter = self.parse_callable_element_parameter(input, activity_id);
                    if input.attribute("local") == Some("true") {
                        parameter.read_local = true;
                    }
                    callable_element.inputs.push(parameter);
                }
            }
        }

        for output in extensions.elements_ns(&VENDOR_NS, "out") {
            let parameter = self.parse_callable_element_parameter(output, activity_id);
            if output.attribute("local") == Some("true") {
                callable_element.outputs_local.push(parameter);
            } else {
                callable_element.outputs.push(parameter);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Asynchronous continuations and priorities
    // ------------------------------------------------------------------------

    /// Async flags of an activity. For an activity wrapped in a
    /// multi-instance body the element's flags go to the body and the flags
    /// of `multiInstanceLoopCharacteristics` to the inner activity.
    pub(super) fn parse_async_for_activity(&mut self, element: &Element, activity: ActivityId) {
        let current = self.process.activity(activity);
        let body = current.flow_scope.activity().filter(|&parent| {
            self.process
                .activity(parent)
                .behavior
                .as_ref()
                .is_some_and(Behavior::is_multi_instance)
        });

        match body {
            Some(body) if !current.is_compensation_handler() => {
                self.parse_async(Some(element), body);
                self.parse_async(element.element("multiInstanceLoopCharacteristics"), activity);
            }
            _ => self.parse_async(Some(element), activity),
        }
    }

    pub(super) fn parse_async(&mut self, element: Option<&Element>, activity: ActivityId) {
        let (async_before, async_after, exclusive) = element.map_or((false, false, true), |element| {
            (is_async_before(element), is_async_after(element), is_exclusive(element))
        });
        self.process.set_async_before(activity, async_before, exclusive);
        self.process.set_async_after(activity, async_after, exclusive);
    }

    /// A vendor priority attribute: an expression or an integer constant.
    pub(super) fn parse_priority(&mut self, element: &Element, attribute: &str) -> Option<Priority> {
        let value = element.attribute_ns(&VENDOR_NS, attribute)?;
        if is_expression(value) {
            return Some(Priority::Expression(self.expressions.create_expression(value)));
        }
        match value.parse::<i32>() {
            Ok(priority) => Some(Priority::Constant(i64::from(priority))),
            Err(_) => {
                self.diagnostics.error(
                    codes::INVALID_PRIORITY,
                    format!("Value '{value}' for attribute '{attribute}' is not a valid number"),
                    element,
                    &[],
                );
                None
            }
        }
    }

    pub(super) fn parse_topic(&mut self, element: &Element) -> ParameterValue {
        match element.attribute_ns(&VENDOR_NS, "topic") {
            Some(topic) => ParameterValue::from_text(Some(topic), self.expressions),
            None => {
                self.diagnostics.error(
                    codes::INVALID_SERVICE_TASK,
                    "External tasks must specify a 'topic' attribute in the operaton namespace",
                    element,
                    &[],
                );
                ParameterValue::Null
            }
        }
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    /// `property` children become variable declarations on the activity,
    /// which turns into a scope.
    pub(super) fn parse_properties(&mut self, element: &Element, activity: ActivityId) -> ParseResult {
        for property in element.elements("property") {
            let name = match (property.attribute("name"), property.attribute("id")) {
                (Some(name), _) | (None, Some(name)) => name,
                (None, None) => {
                    let activity_id = self.process.activity(activity).id.clone();
                    self.diagnostics.error(
                        codes::INVALID_PROPERTY,
                        format!(
                            "Invalid property usage on line {}: no id or name specified.",
                            property.line()
                        ),
                        property,
                        &[activity_id.as_str()],
                    );
                    continue;
                }
            };

            let variable_type = property.attribute_ns_or(&VENDOR_NS, "type", "string");
            let mut declaration = VariableDeclaration::new(name, variable_type);
            declaration.source_variable = property.attribute_ns(&VENDOR_NS, "src").map(SmolStr::new);
            declaration.source_expression = property
                .attribute_ns(&VENDOR_NS, "srcExpr")
                .map(|text| self.expressions.create_expression(text));
            declaration.destination_variable = property.attribute_ns(&VENDOR_NS, "dst").map(SmolStr::new);
            declaration.destination_expression = property
                .attribute_ns(&VENDOR_NS, "dstExpr")
                .map(|text| self.expressions.create_expression(text));
            declaration.link = property.attribute_ns(&VENDOR_NS, "link").map(SmolStr::new);
            declaration.link_expression = property
                .attribute_ns(&VENDOR_NS, "linkExpr")
                .map(|text| self.expressions.create_expression(text));

            let owner = self.process.activity_mut(activity);
            owner.scope.variable_declarations.push(declaration);
            owner.is_scope = true;

            let scope = ScopeId::from(activity);
            notify!(self.parse_property(property, scope));
        }
        Ok(())
    }
}

fn is_exclusive(element: &Element) -> bool {
    element.attribute_ns_or(&VENDOR_NS, "exclusive", "true") == "true"
}

fn is_async_before(element: &Element) -> bool {
    element.attribute_ns(&VENDOR_NS, "async") == Some("true")
        || element.attribute_ns(&VENDOR_NS, "asyncBefore") == Some("true")
}

fn is_async_after(element: &Element) -> bool {
    element.attribute_ns(&VENDOR_NS, "asyncAfter") == Some("true")
}
