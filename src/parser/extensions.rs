//! Vendor extension elements: execution listeners, field injection, vendor
//! scripts, input/output mappings, call parameters and open properties.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::{BpmnParse, ParseResult, notify};
use crate::base::constants::{EVENT_END, EVENT_START};
use crate::base::{ActivityId, ScopeId, TransitionId};
use crate::diagnostics::codes;
use crate::expression::{ExecutableScript, ParameterValue};
use crate::model::{
    CallableElementParameter, ErrorEventDefinition, FieldDeclaration, IoMapping, IoParameter,
    ListenerDefinition,
};
use crate::xml::{Element, VENDOR_NS};

impl BpmnParse<'_> {
    // ------------------------------------------------------------------------
    // Execution listeners
    // ------------------------------------------------------------------------

    /// `start` and `end` listeners of a scope element.
    pub(super) fn parse_execution_listeners_on_scope(&mut self, element: &Element, scope: ScopeId) {
        let Some(extensions) = element.extension_elements() else {
            return;
        };
        let scope_element_id = element.attribute_or("id", "");

        for listener in extensions.elements_ns(&VENDOR_NS, "executionListener") {
            let event = listener.attribute("event").map(str::trim).unwrap_or("");
            if event.is_empty() {
                self.diagnostics.error(
                    codes::INVALID_LISTENER,
                    "Attribute 'event' is mandatory on listener",
                    listener,
                    &[scope_element_id],
                );
                continue;
            }
            if event != EVENT_START && event != EVENT_END {
                self.diagnostics.error(
                    codes::INVALID_LISTENER,
                    "Attribute 'event' must be one of {start|end}",
                    listener,
                    &[scope_element_id],
                );
                continue;
            }
            if let Some(definition) = self.parse_listener(listener, scope_element_id, "executionListener") {
                self.process.scope_mut(scope).add_execution_listener(event, definition);
            }
        }
    }

    /// `take` listeners of a sequence flow. The `event` attribute is not read.
    pub(super) fn parse_execution_listeners_on_transition(&mut self, element: &Element, transition: TransitionId) {
        let Some(extensions) = element.extension_elements() else {
            return;
        };
        let flow_id = element.attribute_or("id", "");

        for listener in extensions.elements_ns(&VENDOR_NS, "executionListener") {
            if let Some(definition) = self.parse_listener(listener, flow_id, "executionListener") {
                self.process.transition_mut(transition).listeners.push(definition);
            }
        }
    }

    /// Implementation of an execution or task listener: `class`,
    /// `expression`, `delegateExpression` or a nested vendor `script`.
    pub(super) fn parse_listener(
        &mut self,
        listener: &Element,
        ancestor_id: &str,
        kind: &str,
    ) -> Option<ListenerDefinition> {
        if let Some(class_name) = listener.attribute("class") {
            if class_name.is_empty() {
                self.diagnostics.error(
                    codes::INVALID_LISTENER,
                    "Attribute 'class' cannot be empty",
                    listener,
                    &[ancestor_id],
                );
                return None;
            }
            return Some(ListenerDefinition::Class {
                class_name: SmolStr::new(class_name),
                fields: self.parse_field_declarations(listener),
            });
        }

        if let Some(expression) = listener.attribute("expression") {
            return Some(ListenerDefinition::Expression(
                self.expressions.create_expression(expression),
            ));
        }

        if let Some(delegate_expression) = listener.attribute("delegateExpression") {
            if delegate_expression.is_empty() {
                self.diagnostics.error(
                    codes::INVALID_LISTENER,
                    "Attribute 'delegateExpression' cannot be empty",
                    listener,
                    &[ancestor_id],
                );
                return None;
            }
            return Some(ListenerDefinition::DelegateExpression {
                expression: self.expressions.create_expression(delegate_expression),
                fields: self.parse_field_declarations(listener),
            });
        }

        if let Some(script) = listener.element_ns(&VENDOR_NS, "script") {
            return self
                .parse_vendor_script(script, ancestor_id)
                .map(ListenerDefinition::Script);
        }

        self.diagnostics.error(
            codes::INVALID_LISTENER,
            format!("Element 'class', 'expression', 'delegateExpression' or 'script' is mandatory on {kind}"),
            listener,
            &[ancestor_id],
        );
        None
    }

    // ------------------------------------------------------------------------
    // Field injection
    // ------------------------------------------------------------------------

    /// Vendor `field` children, read from `extensionElements` or, for
    /// custom extensions, from the element itself.
    pub(super) fn parse_field_declarations(&mut self, element: &Element) -> Vec<FieldDeclaration> {
        let holder = element.extension_elements().unwrap_or(element);
        let mut fields = Vec::new();
        for field in holder.elements_ns(&VENDOR_NS, "field") {
            if let Some(declaration) = self.parse_field_declaration(element, field) {
                fields.push(declaration);
            }
        }
        fields
    }

    fn parse_field_declaration(&mut self, owner: &Element, field: &Element) -> Option<FieldDeclaration> {
        let name = field.attribute_or("name", "");

        if field.elements_ns(&VENDOR_NS, "string").nth(1).is_some() {
            self.diagnostics.error(
                codes::INVALID_FIELD,
                "Multiple string field declarations found",
                owner,
                &[],
            );
        } else if let Some(value) = self.attribute_or_child_text(field, "stringValue", "string", owner) {
            return Some(FieldDeclaration::new(
                name,
                ParameterValue::Constant(value.into()),
            ));
        }

        if field.elements_ns(&VENDOR_NS, "expression").nth(1).is_some() {
            self.diagnostics.error(
                codes::INVALID_FIELD,
                "Multiple expression field declarations found",
                owner,
                &[],
            );
        } else if let Some(value) = self
            .attribute_or_child_text(field, "expression", "expression", owner)
            .filter(|value| !value.trim().is_empty())
        {
            return Some(FieldDeclaration::new(
                name,
                ParameterValue::Expression(self.expressions.create_expression(&value)),
            ));
        }

        self.diagnostics.error(
            codes::INVALID_FIELD,
            "One of the following is mandatory on a field declaration: one of attributes stringValue|expression or one of child elements string|expression",
            owner,
            &[],
        );
        None
    }

    /// Value given either as attribute or as vendor child element, never both.
    fn attribute_or_child_text(
        &mut self,
        element: &Element,
        attribute: &str,
        child: &str,
        owner: &Element,
    ) -> Option<String> {
        let owner_id = owner.attribute_or("id", "");
        let attribute_value = element.attribute(attribute);
        let child_element = element.element_ns(&VENDOR_NS, child);

        match (attribute_value, child_element) {
            (Some(_), Some(_)) => {
                self.diagnostics.error(
                    codes::INVALID_FIELD,
                    format!("Can't use attribute '{attribute}' and element '{child}' together, only use one"),
                    element,
                    &[owner_id],
                );
                None
            }
            (None, Some(child_element)) => {
                if child_element.text().is_empty() {
                    self.diagnostics.error(
                        codes::INVALID_FIELD,
                        format!("No valid value found in attribute '{attribute}' nor element '{child}'"),
                        element,
                        &[owner_id],
                    );
                    None
                } else {
                    Some(child_element.text().to_string())
                }
            }
            (Some(value), None) if !value.is_empty() => Some(value.to_string()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Scripts
    // ------------------------------------------------------------------------

    /// A vendor `script` element: `scriptFormat`, optional `resource`, source
    /// as text.
    pub(super) fn parse_vendor_script(&mut self, script: &Element, ancestor_id: &str) -> Option<ExecutableScript> {
        let Some(language) = script.attribute("scriptFormat").filter(|f| !f.is_empty()) else {
            self.diagnostics.error(
                codes::INVALID_SCRIPT,
                "Missing attribute 'scriptFormat' for 'script' element",
                script,
                &[ancestor_id],
            );
            return None;
        };
        let source = Some(script.text()).filter(|text| !text.is_empty());
        let resource = script.attribute("resource");

        match self
            .scripts
            .create_script(Some(language), source, resource, self.expressions)
        {
            Ok(script) => Some(script),
            Err(error) => {
                self.diagnostics.error(
                    codes::INVALID_SCRIPT,
                    error.to_string(),
                    script,
                    &[ancestor_id],
                );
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Input / output
    // ------------------------------------------------------------------------

    /// Vendor `inputOutput` of an activity. The activity becomes a scope
    /// unless a multi-instance body already isolates it.
    pub(super) fn parse_activity_input_output(&mut self, element: &Element, activity: ActivityId) -> ParseResult {
        let Some(extensions) = element.extension_elements() else {
            return Ok(());
        };
        let Some(input_output) = extensions.element_ns(&VENDOR_NS, "inputOutput") else {
            return Ok(());
        };
        let activity_id = self.process.activity(activity).id.clone();
        let Some(mapping) = self.parse_io_mapping(input_output, &activity_id) else {
            return Ok(());
        };

        if self.is_io_mapping_supported(element, activity, &mapping) {
            let is_multi_instance = self.process.activity(activity).is_multi_instance;
            let target = self.process.activity_mut(activity);
            target.io_mapping = Some(mapping);
            if !is_multi_instance {
                target.is_scope = true;
            }
        }

        notify!(self.parse_io_mapping(extensions, activity));
        Ok(())
    }

    fn is_io_mapping_supported(&mut self, element: &Element, activity: ActivityId, mapping: &IoMapping) -> bool {
        let tag = element.tag();
        let supported_tag = tag.to_lowercase().contains("task")
            || tag.contains("Event")
            || matches!(tag, "transaction" | "subProcess" | "callActivity");
        if !supported_tag {
            self.diagnostics.error(
                codes::INVALID_IO_MAPPING,
                format!("operaton:inputOutput mapping unsupported for element type '{tag}'."),
                element,
                &[],
            );
            return false;
        }

        if tag == "subProcess" && element.attribute("triggeredByEvent") == Some("true") {
            self.diagnostics.error(
                codes::INVALID_IO_MAPPING,
                format!(
                    "operaton:inputOutput mapping unsupported for element type '{tag}' with attribute 'triggeredByEvent = true'."
                ),
                element,
                &[],
            );
            return false;
        }

        if !mapping.has_outputs() {
            return true;
        }
        if tag == "endEvent" {
            // Reported, but the mapping is kept.
            self.diagnostics.error(
                codes::INVALID_IO_MAPPING,
                format!("operaton:outputParameter not allowed for element type '{tag}'."),
                element,
                &[],
            );
            true
        } else if self.process.activity(activity).is_multi_instance {
            self.diagnostics.error(
                codes::INVALID_IO_MAPPING,
                "operaton:outputParameter not allowed for multi-instance constructs",
                element,
                &[],
            );
            false
        } else {
            true
        }
    }

    /// Report a vendor `inputOutput` on an element that does not support one.
    pub(super) fn ensure_no_io_mapping(&mut self, element: &Element) {
        let defined = element
            .extension_elements()
            .and_then(|extensions| extensions.element_ns(&VENDOR_NS, "inputOutput"))
            .is_some();
        if defined {
            self.diagnostics.error(
                codes::INVALID_IO_MAPPING,
                format!(
                    "operaton:inputOutput mapping unsupported for element type '{}'.",
                    element.tag()
                ),
                element,
                &[],
            );
        }
    }

    fn parse_io_mapping(&mut self, input_output: &Element, activity_id: &str) -> Option<IoMapping> {
        let mut mapping = IoMapping::default();
        let mut valid = true;

        for (tag, parameters) in [
            ("inputParameter", &mut mapping.inputs),
            ("outputParameter", &mut mapping.outputs),
        ] {
            for parameter in input_output.elements_ns(&VENDOR_NS, tag) {
                let Some(name) = parameter.attribute("name").filter(|name| !name.is_empty()) else {
                    self.diagnostics.error(
                        codes::INVALID_IO_MAPPING,
                        format!("Missing attribute 'name' for {tag}"),
                        parameter,
                        &[activity_id],
                    );
                    valid = false;
                    continue;
                };
                match self.parse_parameter_value(parameter, activity_id) {
                    Some(value) => parameters.push(IoParameter {
                        name: SmolStr::new(name),
                        value,
                    }),
                    None => valid = false,
                }
            }
        }

        valid.then_some(mapping)
    }

    /// Value of a parameter: its text, or a single nested `list`, `map` or
    /// `script`.
    fn parse_parameter_value(&mut self, element: &Element, activity_id: &str) -> Option<ParameterValue> {
        match element.children() {
            [] => Some(if element.text().is_empty() {
                ParameterValue::Null
            } else {
                ParameterValue::Expression(self.expressions.create_expression(element.text()))
            }),
            [nested] => self.parse_nested_value(nested, activity_id),
            _ => {
                self.diagnostics.error(
                    codes::INVALID_IO_MAPPING,
                    "Nested parameter can at most have one child element",
                    element,
                    &[activity_id],
                );
                None
            }
        }
    }

    fn parse_nested_value(&mut self, element: &Element, activity_id: &str) -> Option<ParameterValue> {
        match element.tag() {
            "list" => {
                let mut values = Vec::new();
                for item in element.children() {
                    values.push(self.parse_nested_value(item, activity_id)?);
                }
                Some(ParameterValue::List(values))
            }
            "map" => {
                let mut entries = IndexMap::new();
                for entry in element.elements("entry") {
                    let Some(key) = entry.attribute("key") else {
                        self.diagnostics.error(
                            codes::INVALID_IO_MAPPING,
                            "Missing attribute 'key' for 'entry' element",
                            entry,
                            &[activity_id],
                        );
                        return None;
                    };
                    let value = self.parse_parameter_value(entry, activity_id)?;
                    entries.insert(SmolStr::new(key), value);
                }
                Some(ParameterValue::Map(entries))
            }
            "script" => self
                .parse_vendor_script(element, activity_id)
                .map(ParameterValue::Script),
            _ => self.parse_parameter_value(element, activity_id),
        }
    }

    // ------------------------------------------------------------------------
    // Call parameters
    // ------------------------------------------------------------------------

    /// An `in` or `out` element of a call activity or throwing signal.
    pub(super) fn parse_callable_element_parameter(
        &mut self,
        element: &Element,
        activity_id: &str,
    ) -> CallableElementParameter {
        let mut parameter = CallableElementParameter::default();
        if element.attribute("variables") == Some("all") {
            parameter.all_variables = true;
            return parameter;
        }

        let strict = self.options.strict_call_activity_validation;
        let mut source_value = ParameterValue::Null;

        let mut source = element.attribute("source");
        if let Some(text) = source {
            if !text.is_empty() {
                source_value = ParameterValue::Constant(text.into());
            } else if strict {
                self.diagnostics.error(
                    codes::INVALID_CALL_ACTIVITY,
                    "Empty attribute 'source' when passing variables",
                    element,
                    &[activity_id],
                );
            } else {
                source = None;
            }
        }

        if source.is_none() {
            source = element.attribute("sourceExpression");
            if let Some(text) = source {
                if !text.is_empty() {
                    source_value = ParameterValue::Expression(self.expressions.create_expression(text));
                } else if strict {
                    self.diagnostics.error(
                        codes::INVALID_CALL_ACTIVITY,
                        "Empty attribute 'sourceExpression' when passing variables",
                        element,
                        &[activity_id],
                    );
                }
            }
        }

        if strict && source.is_none() {
            self.diagnostics.error(
                codes::INVALID_CALL_ACTIVITY,
                "Missing parameter 'source' or 'sourceExpression' when passing variables",
                element,
                &[activity_id],
            );
        }
        parameter.source = Some(source_value);

        let target = element.attribute("target");
        let has_source = source.is_some_and(|source| !source.is_empty());
        if (strict || has_source) && target.is_none() {
            self.diagnostics.error(
                codes::INVALID_CALL_ACTIVITY,
                "Missing attribute 'target' when attribute 'source' or 'sourceExpression' is set",
                element,
                &[activity_id],
            );
        } else if strict && target.is_some_and(str::is_empty) {
            self.diagnostics.error(
                codes::INVALID_CALL_ACTIVITY,
                "Empty attribute 'target' when attribute 'source' or 'sourceExpression' is set",
                element,
                &[activity_id],
            );
        }
        parameter.target = target.map(SmolStr::new);
        parameter
    }

    // ------------------------------------------------------------------------
    // External task errors
    // ------------------------------------------------------------------------

    /// Vendor `errorEventDefinition`s of an external task. Each one carries
    /// an expression deciding whether a reported failure matches.
    pub(super) fn parse_vendor_error_event_definitions(
        &mut self,
        activity: ActivityId,
        element: &Element,
    ) -> Vec<ErrorEventDefinition> {
        let Some(extensions) = element.extension_elements() else {
            return Vec::new();
        };
        let activity_id = self.process.activity(activity).id.clone();

        extensions
            .elements("errorEventDefinition")
            .filter_map(|definition| {
                let error_ref = definition.attribute("errorRef")?;
                let mut error = ErrorEventDefinition::new(activity_id.clone());
                error.expression = definition
                    .attribute("expression")
                    .map(|text| self.expressions.create_expression(text));
                error.error_code = match self.registry.error(error_ref) {
                    Some(declared) => declared.error_code.clone(),
                    None => Some(SmolStr::new(error_ref)),
                };
                set_error_variables(definition, &mut error);
                Some(error)
            })
            .collect()
    }
}

/// Vendor `errorCodeVariable` and `errorMessageVariable` of an error catch.
pub(super) fn set_error_variables(definition: &Element, error: &mut ErrorEventDefinition) {
    error.error_code_variable = definition
        .attribute_ns(&VENDOR_NS, "errorCodeVariable")
        .map(SmolStr::new);
    error.error_message_variable = definition
        .attribute_ns(&VENDOR_NS, "errorMessageVariable")
        .map(SmolStr::new);
}

/// Vendor `properties/property` name-value pairs of an element.
pub(super) fn parse_extension_properties(element: &Element) -> IndexMap<SmolStr, SmolStr> {
    let mut properties = IndexMap::new();
    let Some(container) = element
        .extension_elements()
        .and_then(|extensions| extensions.element_ns(&VENDOR_NS, "properties"))
    else {
        return properties;
    };
    for property in container.elements_ns(&VENDOR_NS, "property") {
        if let (Some(name), Some(value)) = (property.attribute("name"), property.attribute("value")) {
            properties.insert(SmolStr::new(name), SmolStr::new(value));
        }
    }
    properties
}
