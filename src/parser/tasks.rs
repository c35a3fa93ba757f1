//! Tasks: plain, manual, receive, script, service-like, business rule and
//! user tasks, with task definitions, forms and task listeners.

use smol_str::SmolStr;
use tracing::debug;

use super::util::{
    GROUP_PREFIX, USER_PREFIX, assignment_id, parse_documentation, split_comma_separated,
};
use super::{BpmnParse, ParseResult, notify};
use crate::base::{ActivityId, ScopeId};
use crate::diagnostics::codes;
use crate::expression::ParameterValue;
use crate::model::{
    ActivityType, Behavior, CallableElement, DecisionResultMapper, DecisionTaskBehavior,
    FieldDeclaration, FormDefinition, ListenerDefinition, ServiceTaskBehavior, TaskDefinition,
    TimerJobHandler,
};
use crate::xml::{Element, VENDOR_NS};

const ALLOWED_FORM_REF_BINDINGS: [&str; 3] = ["deployment", "latest", "version"];

const TASK_LISTENER_EVENTS: [&str; 5] = ["create", "assignment", "complete", "update", "delete"];

impl BpmnParse<'_> {
    // ------------------------------------------------------------------------
    // Pass-through tasks
    // ------------------------------------------------------------------------

    pub(super) fn parse_task(&mut self, element: &Element, scope: ScopeId) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::Task)?;
        self.process.activity_mut(activity).behavior = Some(Behavior::Task);

        self.parse_async_for_activity(element, activity);
        self.parse_execution_listeners_on_scope(element, activity.into());

        notify!(self.parse_task(element, scope, activity));
        Ok(activity)
    }

    pub(super) fn parse_manual_task(&mut self, element: &Element, scope: ScopeId) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::ManualTask)?;
        self.process.activity_mut(activity).behavior = Some(Behavior::ManualTask);

        self.parse_async_for_activity(element, activity);
        self.parse_execution_listeners_on_scope(element, activity.into());

        notify!(self.parse_manual_task(element, scope, activity));
        Ok(activity)
    }

    /// A receive task with a `messageRef` subscribes to the message on itself.
    pub(super) fn parse_receive_task(&mut self, element: &Element, scope: ScopeId) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::ReceiveTask)?;
        self.process.activity_mut(activity).behavior = Some(Behavior::ReceiveTask);

        self.parse_async_for_activity(element, activity);
        self.parse_execution_listeners_on_scope(element, activity.into());

        if element.attribute("messageRef").is_some() {
            let id = self.process.activity(activity).id.clone();
            {
                let receive_task = self.process.activity_mut(activity);
                receive_task.is_scope = true;
                receive_task.event_scope = Some(activity.into());
            }
            if let Some(mut declaration) = self.parse_message_event_definition(element, &id) {
                declaration.activity_id = id.clone();
                declaration.event_scope_activity_id = Some(id);
                self.add_event_subscription(activity.into(), declaration, element);
            }
        }

        notify!(self.parse_receive_task(element, scope, activity));
        Ok(activity)
    }

    // ------------------------------------------------------------------------
    // Script tasks
    // ------------------------------------------------------------------------

    /// A script that cannot be compiled leaves the task without behavior,
    /// listeners or hook calls.
    pub(super) fn parse_script_task(&mut self, element: &Element, scope: ScopeId) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::ScriptTask)?;

        let options = self.options;
        let language = element
            .attribute("scriptFormat")
            .unwrap_or(options.default_script_language.as_str());
        let script_element = element.element("script");
        let source = script_element.map(Element::text);
        let resource = element.attribute_ns(&VENDOR_NS, "resource");

        let script = match self
            .scripts
            .create_script(Some(language), source, resource, self.expressions)
        {
            Ok(script) => script,
            Err(error) => {
                self.diagnostics.error(
                    codes::INVALID_SCRIPT,
                    format!("Unable to process ScriptTask: {error}"),
                    script_element.unwrap_or(element),
                    &[],
                );
                return Ok(activity);
            }
        };

        self.parse_async_for_activity(element, activity);
        self.process.activity_mut(activity).behavior = Some(Behavior::ScriptTask {
            script,
            result_variable: parse_result_variable(element),
        });
        self.parse_execution_listeners_on_scope(element, activity.into());

        notify!(self.parse_script_task(element, scope, activity));
        Ok(activity)
    }

    // ------------------------------------------------------------------------
    // Service-like tasks
    // ------------------------------------------------------------------------

    pub(super) fn parse_service_task(&mut self, element: &Element, scope: ScopeId) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::ServiceTask)?;

        self.parse_async_for_activity(element, activity);
        self.parse_service_task_like(activity, "serviceTask", element, element);
        self.parse_execution_listeners_on_scope(element, activity.into());

        notify!(self.parse_service_task(element, scope, activity));

        // A listener may install the behavior, so this runs after the hooks.
        self.validate_service_task_like(activity, "serviceTask", element);
        Ok(activity)
    }

    pub(super) fn parse_send_task(&mut self, element: &Element, scope: ScopeId) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::SendTask)?;
        let service_like = is_service_like(Some(element));

        self.parse_async_for_activity(element, activity);
        if service_like {
            self.parse_service_task_like(activity, "sendTask", element, element);
        }
        self.parse_execution_listeners_on_scope(element, activity.into());

        notify!(self.parse_send_task(element, scope, activity));

        if service_like {
            self.validate_service_task_like(activity, "sendTask", element);
        } else if self.process.activity(activity).behavior.is_none() {
            self.diagnostics.error(
                codes::INVALID_SERVICE_TASK,
                "One of the attributes 'class', 'delegateExpression', 'type', or 'expression' is mandatory on sendTask.",
                element,
                &[],
            );
        }
        Ok(activity)
    }

    /// Install the behavior selected by `type`, `class`, `delegateExpression`
    /// or `expression`, in that order. Vendor properties of external tasks
    /// are read from `properties_element`.
    pub(super) fn parse_service_task_like(
        &mut self,
        activity: ActivityId,
        element_name: &str,
        element: &Element,
        properties_element: &Element,
    ) {
        let task_type = element.attribute_ns(&VENDOR_NS, "type");
        let class_name = element.attribute_ns(&VENDOR_NS, "class");
        let expression = element.attribute_ns(&VENDOR_NS, "expression");
        let delegate_expression = element.attribute_ns(&VENDOR_NS, "delegateExpression");
        let result_variable = parse_result_variable(element);

        let behavior = if let Some(task_type) = task_type {
            if task_type.eq_ignore_ascii_case("mail") {
                let fields = self.parse_field_declarations(element);
                self.validate_mail_fields(element, &fields);
                Some(ServiceTaskBehavior::Mail { fields })
            } else if task_type.eq_ignore_ascii_case("shell") {
                let fields = self.parse_field_declarations(element);
                self.validate_shell_fields(element, &fields);
                Some(ServiceTaskBehavior::Shell { fields })
            } else if task_type.eq_ignore_ascii_case("external") {
                Some(self.parse_external_task(activity, element, properties_element))
            } else {
                self.diagnostics.error(
                    codes::INVALID_SERVICE_TASK,
                    format!("Invalid usage of type attribute on {element_name}: '{task_type}'"),
                    element,
                    &[],
                );
                None
            }
        } else if let Some(class_name) = class_name.filter(|name| !name.trim().is_empty()) {
            if result_variable.is_some() {
                self.diagnostics.error(
                    codes::INVALID_SERVICE_TASK,
                    format!("'resultVariableName' not supported for {element_name} elements using 'class'"),
                    element,
                    &[],
                );
            }
            Some(ServiceTaskBehavior::ClassDelegate {
                class_name: SmolStr::new(class_name),
                fields: self.parse_field_declarations(element),
            })
        } else if let Some(delegate_expression) = delegate_expression {
            if result_variable.is_some() {
                self.diagnostics.error(
                    codes::INVALID_SERVICE_TASK,
                    format!(
                        "'resultVariableName' not supported for {element_name} elements using 'delegateExpression'"
                    ),
                    element,
                    &[],
                );
            }
            Some(ServiceTaskBehavior::DelegateExpression {
                expression: self.expressions.create_expression(delegate_expression),
                fields: self.parse_field_declarations(element),
            })
        } else {
            expression
                .filter(|expression| !expression.trim().is_empty())
                .map(|expression| ServiceTaskBehavior::Expression {
                    expression: self.expressions.create_expression(expression),
                    result_variable,
                })
        };

        if let Some(behavior) = behavior {
            self.process.activity_mut(activity).behavior = Some(Behavior::ServiceTask(behavior));
        }
    }

    pub(super) fn validate_service_task_like(&mut self, activity: ActivityId, element_name: &str, element: &Element) {
        if self.process.activity(activity).behavior.is_none() {
            self.diagnostics.error(
                codes::INVALID_SERVICE_TASK,
                format!(
                    "One of the attributes 'class', 'delegateExpression', 'type', or 'expression' is mandatory on {element_name}. If you are using a connector, make sure the connect process engine plugin is registered with the process engine."
                ),
                element,
                &[],
            );
        }
    }

    fn parse_external_task(
        &mut self,
        activity: ActivityId,
        element: &Element,
        properties_element: &Element,
    ) -> ServiceTaskBehavior {
        let topic = self.parse_topic(element);
        let priority = self.parse_priority(element, "taskPriority");
        let properties = super::extensions::parse_extension_properties(properties_element);
        let error_event_definitions = self.parse_vendor_error_event_definitions(activity, element);

        let task = self.process.activity_mut(activity);
        task.is_scope = true;
        task.task_priority = priority.clone();
        task.extension_properties = properties;

        ServiceTaskBehavior::External {
            topic,
            priority,
            error_event_definitions,
        }
    }

    fn validate_mail_fields(&mut self, element: &Element, fields: &[FieldDeclaration]) {
        if !fields.iter().any(|field| field.name == "to") {
            self.diagnostics.error(
                codes::INVALID_FIELD,
                "No recipient is defined on the mail activity",
                element,
                &[],
            );
        }
        if !fields.iter().any(|field| field.name == "text" || field.name == "html") {
            self.diagnostics.error(
                codes::INVALID_FIELD,
                "Text or html field should be provided",
                element,
                &[],
            );
        }
    }

    fn validate_shell_fields(&mut self, element: &Element, fields: &[FieldDeclaration]) {
        for field in fields {
            if !matches!(field.name.as_str(), "wait" | "redirectError" | "cleanEnv") {
                continue;
            }
            let value = field.value.text().unwrap_or("null");
            if !value.eq_ignore_ascii_case("true") && !value.eq_ignore_ascii_case("false") {
                self.diagnostics.error(
                    codes::INVALID_FIELD,
                    format!("undefined value for shell {} parameter :{value}", field.name),
                    element,
                    &[],
                );
            }
        }
        if !fields.iter().any(|field| field.name == "command") {
            self.diagnostics.error(
                codes::INVALID_FIELD,
                "No shell command is defined on the shell activity",
                element,
                &[],
            );
        }
    }

    // ------------------------------------------------------------------------
    // Business rule tasks
    // ------------------------------------------------------------------------

    /// With a `decisionRef` the task evaluates a decision; otherwise it is
    /// implemented like a service task.
    pub(super) fn parse_business_rule_task(&mut self, element: &Element, scope: ScopeId) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::BusinessRuleTask)?;

        let Some(decision_ref) = element.attribute_ns(&VENDOR_NS, "decisionRef") else {
            self.parse_async_for_activity(element, activity);
            self.parse_service_task_like(activity, "businessRuleTask", element, element);
            self.parse_execution_listeners_on_scope(element, activity.into());

            notify!(self.parse_business_rule_task(element, scope, activity));

            self.validate_service_task_like(activity, "businessRuleTask", element);
            return Ok(activity);
        };

        // The result variable is stored locally.
        self.process.activity_mut(activity).is_scope = true;
        self.parse_async_for_activity(element, activity);

        let mut callable_element =
            CallableElement::new(ParameterValue::from_text(Some(decision_ref), self.expressions));
        self.parse_callable_element_attributes(
            element,
            &mut callable_element,
            "decisionRefBinding",
            "decisionRefVersion",
            "decisionRefVersionTag",
            "decisionRefTenantId",
        );

        let result_mapper = self.parse_decision_result_mapper(element);
        self.process.activity_mut(activity).behavior =
            Some(Behavior::DmnBusinessRuleTask(DecisionTaskBehavior {
                callable_element,
                result_variable: parse_result_variable(element),
                result_mapper,
            }));

        self.parse_execution_listeners_on_scope(element, activity.into());
        notify!(self.parse_business_rule_task(element, scope, activity));
        Ok(activity)
    }

    fn parse_decision_result_mapper(&mut self, element: &Element) -> DecisionResultMapper {
        let Some(name) = element.attribute_ns(&VENDOR_NS, "mapDecisionResult") else {
            return DecisionResultMapper::default();
        };
        DecisionResultMapper::parse(name).unwrap_or_else(|| {
            self.diagnostics.error(
                codes::INVALID_BUSINESS_RULE_TASK,
                format!(
                    "No decision result mapper found for name '{name}'. Supported mappers are 'singleEntry', 'singleResult', 'collectEntries' and 'resultList'."
                ),
                element,
                &[],
            );
            DecisionResultMapper::default()
        })
    }

    // ------------------------------------------------------------------------
    // User tasks
    // ------------------------------------------------------------------------

    pub(super) fn parse_user_task(&mut self, element: &Element, scope: ScopeId) -> ParseResult<ActivityId> {
        let activity = self.create_activity_on_scope(element, scope, ActivityType::UserTask)?;

        self.parse_async_for_activity(element, activity);

        let key = self.process.activity(activity).id.clone();
        let task_definition = self.parse_task_definition(element, activity, key.clone());
        self.process.task_definitions.insert(key.clone(), task_definition);
        self.process.activity_mut(activity).behavior = Some(Behavior::UserTask {
            task_definition_key: key,
        });

        self.parse_properties(element, activity)?;
        self.parse_execution_listeners_on_scope(element, activity.into());

        notify!(self.parse_user_task(element, scope, activity));
        Ok(activity)
    }

    fn parse_task_definition(&mut self, element: &Element, activity: ActivityId, key: SmolStr) -> TaskDefinition {
        debug!(kind = "task definition", id = key.as_str(), "parsing element");
        let mut task = TaskDefinition::new(key);
        task.form = self.parse_form_definition(element);
        task.name_expression = element
            .attribute("name")
            .map(|name| self.expressions.create_expression(name));
        task.description_expression = parse_documentation(element)
            .map(|description| self.expressions.create_expression(&description));

        self.parse_human_performer(element, &mut task);
        for owner in element.elements("potentialOwner") {
            if let Some(text) = formal_expression(owner) {
                for entry in split_comma_separated(text) {
                    if entry.starts_with(USER_PREFIX) {
                        let user = self.expressions.create_expression(assignment_id(&entry, USER_PREFIX));
                        task.candidate_user_expressions.push(user);
                    } else if entry.starts_with(GROUP_PREFIX) {
                        let group = self.expressions.create_expression(assignment_id(&entry, GROUP_PREFIX));
                        task.candidate_group_expressions.push(group);
                    } else {
                        let group = self.expressions.create_expression(&entry);
                        task.candidate_group_expressions.push(group);
                    }
                }
            }
        }

        self.parse_user_task_extensions(element, activity, &mut task);
        task
    }

    fn parse_human_performer(&mut self, element: &Element, task: &mut TaskDefinition) {
        let performers: Vec<&Element> = element.elements("humanPerformer").collect();
        match performers.as_slice() {
            [] => {}
            [performer] => {
                if let Some(text) = formal_expression(performer) {
                    task.assignee_expression = Some(self.expressions.create_expression(text));
                }
            }
            _ => self.diagnostics.error(
                codes::INVALID_USER_TASK,
                format!(
                    "Invalid task definition: multiple humanPerformer sub elements defined for {}",
                    task.display_name()
                ),
                element,
                &[],
            ),
        }
    }

    fn parse_user_task_extensions(&mut self, element: &Element, activity: ActivityId, task: &mut TaskDefinition) {
        if let Some(assignee) = element.attribute_ns(&VENDOR_NS, "assignee") {
            if task.assignee_expression.is_none() {
                task.assignee_expression = Some(self.expressions.create_expression(assignee));
            } else {
                self.diagnostics.error(
                    codes::INVALID_USER_TASK,
                    format!(
                        "Invalid usage: duplicate assignee declaration for task {}",
                        task.display_name()
                    ),
                    element,
                    &[],
                );
            }
        }

        if let Some(users) = element.attribute_ns(&VENDOR_NS, "candidateUsers") {
            for user in split_comma_separated(users) {
                task.candidate_user_expressions
                    .push(self.expressions.create_expression(user.trim()));
            }
        }
        if let Some(groups) = element.attribute_ns(&VENDOR_NS, "candidateGroups") {
            for group in split_comma_separated(groups) {
                task.candidate_group_expressions
                    .push(self.expressions.create_expression(group.trim()));
            }
        }

        self.parse_task_listeners(element, activity, task);

        task.due_date_expression = element
            .attribute_ns(&VENDOR_NS, "dueDate")
            .map(|text| self.expressions.create_expression(text));
        task.follow_up_date_expression = element
            .attribute_ns(&VENDOR_NS, "followUpDate")
            .map(|text| self.expressions.create_expression(text));
        task.priority_expression = element
            .attribute_ns(&VENDOR_NS, "priority")
            .map(|text| self.expressions.create_expression(text));
    }

    fn parse_task_listeners(&mut self, element: &Element, activity: ActivityId, task: &mut TaskDefinition) {
        let Some(extensions) = element.extension_elements() else {
            return;
        };
        let activity_id = self.process.activity(activity).id.clone();

        for listener in extensions.elements_ns(&VENDOR_NS, "taskListener") {
            match listener.attribute("event") {
                Some(event) if TASK_LISTENER_EVENTS.contains(&event) => {
                    if let Some(definition) = self.parse_listener(listener, &activity_id, "taskListener") {
                        task.add_task_listener(event, definition);
                    }
                }
                Some("timeout") => {
                    if let Some((listener_id, definition)) = self.parse_timeout_task_listener(listener, activity) {
                        task.timeout_task_listeners.insert(listener_id, definition);
                    }
                }
                Some(_) => self.diagnostics.error(
                    codes::INVALID_LISTENER,
                    "Attribute 'event' must be one of {create|assignment|complete|update|delete|timeout}",
                    element,
                    &[],
                ),
                None => self.diagnostics.error(
                    codes::INVALID_LISTENER,
                    "Attribute 'event' is mandatory on taskListener",
                    element,
                    &[],
                ),
            }
        }
    }

    /// A timeout listener arms a timer on the task, which becomes its own
    /// event scope.
    fn parse_timeout_task_listener(
        &mut self,
        listener: &Element,
        activity: ActivityId,
    ) -> Option<(SmolStr, ListenerDefinition)> {
        let activity_id = self.process.activity(activity).id.clone();
        let listener_id = listener.attribute("id");
        if listener_id.is_none() {
            self.diagnostics.error(
                codes::INVALID_LISTENER,
                "Element 'id' is mandatory on taskListener of type 'timeout'",
                listener,
                &[activity_id.as_str()],
            );
        }
        let timer_definition = listener.element("timerEventDefinition");
        if timer_definition.is_none() {
            self.diagnostics.error(
                codes::INVALID_LISTENER,
                "Element 'timerEventDefinition' is mandatory on taskListener of type 'timeout'",
                listener,
                &[activity_id.as_str()],
            );
        }

        {
            let task = self.process.activity_mut(activity);
            task.is_scope = true;
            task.event_scope = Some(activity.into());
        }

        let listener_id = SmolStr::new(listener_id?);
        let mut timer = self.parse_timer(timer_definition?, activity, TimerJobHandler::TaskListener);
        timer.raw_configuration = SmolStr::new(format!("{activity_id}$taskListener~{listener_id}"));
        timer.listener_id = Some(listener_id.clone());
        self.add_timer_job(&timer);
        self.process
            .activity_mut(activity)
            .scope
            .timeout_listener_declarations
            .entry(activity_id.clone())
            .or_default()
            .insert(listener_id.clone(), timer);

        let definition = self.parse_listener(listener, &activity_id, "taskListener")?;
        Some((listener_id, definition))
    }

    // ------------------------------------------------------------------------
    // Forms
    // ------------------------------------------------------------------------

    /// `formKey` or `formRef` of a user task or start event.
    pub(super) fn parse_form_definition(&mut self, element: &Element) -> FormDefinition {
        let form_key = element.attribute_ns(&VENDOR_NS, "formKey");
        let form_ref = element.attribute_ns(&VENDOR_NS, "formRef");
        if form_key.is_some() && form_ref.is_some() {
            self.diagnostics.error(
                codes::INVALID_FORM,
                "Invalid element definition: only one of the attributes formKey and formRef is allowed.",
                element,
                &[],
            );
        }

        let mut form = FormDefinition {
            form_key: form_key.map(|key| self.expressions.create_expression(key)),
            ..FormDefinition::default()
        };

        if let Some(form_ref) = form_ref {
            form.form_ref = Some(self.expressions.create_expression(form_ref));

            let binding = element.attribute_ns(&VENDOR_NS, "formRefBinding");
            if !binding.is_some_and(|binding| ALLOWED_FORM_REF_BINDINGS.contains(&binding)) {
                self.diagnostics.error(
                    codes::INVALID_FORM,
                    format!(
                        "Invalid element definition: value for formRefBinding attribute has to be one of [{}] but was {}",
                        ALLOWED_FORM_REF_BINDINGS.join(", "),
                        binding.unwrap_or("null")
                    ),
                    element,
                    &[],
                );
            }
            form.form_ref_binding = binding.map(SmolStr::new);

            if binding == Some("version") {
                form.form_ref_version = element
                    .attribute_ns(&VENDOR_NS, "formRefVersion")
                    .map(|version| self.expressions.create_expression(version));
            }
        }
        form
    }
}

/// Whether an element carries a service task implementation.
pub(super) fn is_service_like(element: Option<&Element>) -> bool {
    let Some(element) = element else {
        return false;
    };
    ["class", "expression", "delegateExpression", "type"]
        .iter()
        .any(|attribute| element.attribute_ns(&VENDOR_NS, attribute).is_some())
        || element
            .extension_elements()
            .is_some_and(|extensions| extensions.element("connector").is_some())
}

/// `resultVariable`, or the older `resultVariableName`.
fn parse_result_variable(element: &Element) -> Option<SmolStr> {
    element
        .attribute_ns(&VENDOR_NS, "resultVariable")
        .or_else(|| element.attribute_ns(&VENDOR_NS, "resultVariableName"))
        .map(SmolStr::new)
}

/// Text of `resourceAssignmentExpression/formalExpression`.
fn formal_expression(performer: &Element) -> Option<&str> {
    performer
        .element("resourceAssignmentExpression")?
        .element("formalExpression")
        .map(Element::text)
}
