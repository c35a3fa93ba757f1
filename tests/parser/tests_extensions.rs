#![allow(clippy::unwrap_used)]

//! Vendor extensions: execution and task listeners, field injection and
//! input/output mappings.

use bpmn::expression::{ParameterValue, ScriptSource};
use bpmn::model::{ListenerDefinition, TimerJobHandler};
use rstest::rstest;

use crate::helpers::*;

// ============================================================================
// HELPERS
// ============================================================================

fn task_with_extensions(tag: &str, extensions: &str) -> String {
    process(&format!(
        r#"<startEvent id="start"/>
           <sequenceFlow id="f1" sourceRef="start" targetRef="t"/>
           <{tag} id="t"><extensionElements>{extensions}</extensionElements></{tag}>"#
    ))
}

fn io_mapping(parameters: &str) -> String {
    task_with_extensions(
        "task",
        &format!("<operaton:inputOutput>{parameters}</operaton:inputOutput>"),
    )
}

// ============================================================================
// EXECUTION LISTENERS
// ============================================================================

#[test]
fn test_execution_listeners_on_activity() {
    let process = compile_process(&task_with_extensions(
        "task",
        r#"<operaton:executionListener event="start" class="org.example.Audit">
             <operaton:field name="level" stringValue="info"/>
           </operaton:executionListener>
           <operaton:executionListener event="end" delegateExpression="${auditor}"/>
           <operaton:executionListener event="end">
             <operaton:script scriptFormat="groovy">println 'done'</operaton:script>
           </operaton:executionListener>"#,
    ));
    let scope = &process.activity_by_id("t").unwrap().scope;

    let start = scope.execution_listeners("start");
    assert_eq!(start.len(), 1);
    let ListenerDefinition::Class { class_name, fields } = &start[0] else {
        panic!("expected a class listener, got {:?}", start[0]);
    };
    assert_eq!(class_name, "org.example.Audit");
    assert_eq!(fields[0].value, ParameterValue::Constant("info".into()));

    let end = scope.execution_listeners("end");
    assert_eq!(end.len(), 2);
    assert!(matches!(&end[0], ListenerDefinition::DelegateExpression { expression, .. } if expression.text() == "${auditor}"));
    assert!(matches!(&end[1], ListenerDefinition::Script(script) if script.language == "groovy"));
}

#[test]
fn test_execution_listener_on_process() {
    let xml = definitions(
        r#"<process id="p" isExecutable="true">
             <extensionElements>
               <operaton:executionListener event="start" expression="${audit.started(execution)}"/>
             </extensionElements>
             <startEvent id="start"/>
           </process>"#,
    );
    let process = compile_process(&xml);
    assert_eq!(process.scope.execution_listeners("start").len(), 1);
    assert!(process.scope.execution_listeners("end").is_empty());
}

#[rstest]
#[case::missing_event(
    r#"<operaton:executionListener class="org.example.Audit"/>"#,
    "Attribute 'event' is mandatory on listener"
)]
#[case::unknown_event(
    r#"<operaton:executionListener event="take" class="org.example.Audit"/>"#,
    "Attribute 'event' must be one of {start|end}"
)]
#[case::empty_class(
    r#"<operaton:executionListener event="start" class=""/>"#,
    "Attribute 'class' cannot be empty"
)]
#[case::empty_delegate_expression(
    r#"<operaton:executionListener event="start" delegateExpression=""/>"#,
    "Attribute 'delegateExpression' cannot be empty"
)]
#[case::script_without_format(
    r#"<operaton:executionListener event="start"><operaton:script>x</operaton:script></operaton:executionListener>"#,
    "Missing attribute 'scriptFormat' for 'script' element"
)]
#[case::no_implementation(
    r#"<operaton:executionListener event="start"/>"#,
    "Element 'class', 'expression', 'delegateExpression' or 'script' is mandatory on executionListener"
)]
fn test_invalid_execution_listeners(#[case] listener: &str, #[case] message: &str) {
    let errors = compile_errors(&task_with_extensions("task", listener));
    let error = find_containing(&errors, message);
    assert_eq!(error.element_ids, ["t"]);
}

// ============================================================================
// TASK LISTENERS
// ============================================================================

#[test]
fn test_task_listeners_by_event() {
    let process = compile_process(&task_with_extensions(
        "userTask",
        r#"<operaton:taskListener event="create" class="org.example.Assign"/>
           <operaton:taskListener event="complete" expression="${notifier.done(task)}"/>
           <operaton:taskListener event="complete" delegateExpression="${archiver}"/>"#,
    ));
    let definition = process.task_definitions.get("t").unwrap();
    assert_eq!(definition.task_listeners("create").len(), 1);
    assert_eq!(definition.task_listeners("complete").len(), 2);
    assert!(definition.task_listeners("delete").is_empty());
}

#[test]
fn test_timeout_task_listener() {
    let output = compile(&task_with_extensions(
        "userTask",
        r#"<operaton:taskListener event="timeout" id="remind" class="org.example.Remind">
             <timerEventDefinition><timeDuration>PT2H</timeDuration></timerEventDefinition>
           </operaton:taskListener>"#,
    ));
    let process = output.process("p").unwrap();

    let task = process.activity_by_id("t").unwrap();
    assert!(task.is_scope);
    let timers = task.scope.timeout_listener_declarations.get("t").unwrap();
    let timer = timers.get("remind").unwrap();
    assert_eq!(timer.job_handler, TimerJobHandler::TaskListener);
    assert_eq!(timer.raw_configuration, "t$taskListener~remind");
    assert_eq!(timer.listener_id.as_deref(), Some("remind"));
    assert!(output.job_declarations_of("p").iter().any(|job| job.matches("t", "DURATION: PT2H")));

    let definition = process.task_definitions.get("t").unwrap();
    assert!(matches!(
        definition.timeout_task_listeners.get("remind"),
        Some(ListenerDefinition::Class { class_name, .. }) if class_name == "org.example.Remind"
    ));
}

#[rstest]
#[case::unknown_event(
    r#"<operaton:taskListener event="escalate" class="org.example.A"/>"#,
    "Attribute 'event' must be one of {create|assignment|complete|update|delete|timeout}"
)]
#[case::missing_event(
    r#"<operaton:taskListener class="org.example.A"/>"#,
    "Attribute 'event' is mandatory on taskListener"
)]
#[case::timeout_without_id(
    r#"<operaton:taskListener event="timeout" class="org.example.A">
         <timerEventDefinition><timeDuration>PT2H</timeDuration></timerEventDefinition>
       </operaton:taskListener>"#,
    "Element 'id' is mandatory on taskListener of type 'timeout'"
)]
#[case::timeout_without_timer(
    r#"<operaton:taskListener event="timeout" id="remind" class="org.example.A"/>"#,
    "Element 'timerEventDefinition' is mandatory on taskListener of type 'timeout'"
)]
#[case::empty_class(
    r#"<operaton:taskListener event="create" class=""/>"#,
    "Attribute 'class' cannot be empty"
)]
fn test_invalid_task_listeners(#[case] listener: &str, #[case] message: &str) {
    let errors = compile_errors(&task_with_extensions("userTask", listener));
    assert_error_containing(&errors, message);
}

// ============================================================================
// FIELD INJECTION
// ============================================================================

#[rstest]
#[case::no_value(
    r#"<operaton:field name="x"/>"#,
    "One of the following is mandatory on a field declaration"
)]
#[case::attribute_and_element(
    r#"<operaton:field name="x" stringValue="a"><operaton:string>b</operaton:string></operaton:field>"#,
    "Can't use attribute 'stringValue' and element 'string' together, only use one"
)]
#[case::two_strings(
    r#"<operaton:field name="x"><operaton:string>a</operaton:string><operaton:string>b</operaton:string></operaton:field>"#,
    "Multiple string field declarations found"
)]
#[case::empty_string_element(
    r#"<operaton:field name="x"><operaton:string/></operaton:field>"#,
    "No valid value found in attribute 'stringValue' nor element 'string'"
)]
fn test_invalid_fields(#[case] field: &str, #[case] message: &str) {
    let xml = process(&format!(
        r#"<startEvent id="start"/>
           <serviceTask id="t" operaton:class="org.example.Charge">
             <extensionElements>{field}</extensionElements>
           </serviceTask>"#
    ));
    assert_error_containing(&compile_errors(&xml), message);
}

// ============================================================================
// INPUT / OUTPUT
// ============================================================================

#[test]
fn test_plain_parameters() {
    let process = compile_process(&io_mapping(
        r#"<operaton:inputParameter name="amount">${order.total}</operaton:inputParameter>
           <operaton:inputParameter name="nothing"/>
           <operaton:outputParameter name="result">${out}</operaton:outputParameter>"#,
    ));
    let task = process.activity_by_id("t").unwrap();
    assert!(task.is_scope);

    let mapping = task.io_mapping.as_ref().unwrap();
    assert_eq!(mapping.inputs.len(), 2);
    assert!(matches!(&mapping.inputs[0].value, ParameterValue::Expression(e) if e.text() == "${order.total}"));
    assert!(mapping.inputs[1].value.is_null());
    assert_eq!(mapping.outputs[0].name, "result");
}

#[test]
fn test_nested_parameters() {
    let process = compile_process(&io_mapping(
        r#"<operaton:inputParameter name="reviewers">
             <operaton:list>
               <operaton:value>kermit</operaton:value>
               <operaton:value>${lead}</operaton:value>
             </operaton:list>
           </operaton:inputParameter>
           <operaton:inputParameter name="limits">
             <operaton:map>
               <operaton:entry key="daily">100</operaton:entry>
               <operaton:entry key="tags">
                 <operaton:list><operaton:value>a</operaton:value></operaton:list>
               </operaton:entry>
             </operaton:map>
           </operaton:inputParameter>
           <operaton:inputParameter name="computed">
             <operaton:script scriptFormat="groovy">a * 2</operaton:script>
           </operaton:inputParameter>"#,
    ));
    let mapping = process.activity_by_id("t").unwrap().io_mapping.clone().unwrap();

    let ParameterValue::List(reviewers) = &mapping.inputs[0].value else {
        panic!("expected a list, got {:?}", mapping.inputs[0].value);
    };
    let texts: Vec<Option<&str>> = reviewers.iter().map(ParameterValue::text).collect();
    assert_eq!(texts, [Some("kermit"), Some("${lead}")]);

    let ParameterValue::Map(limits) = &mapping.inputs[1].value else {
        panic!("expected a map, got {:?}", mapping.inputs[1].value);
    };
    assert_eq!(limits.get("daily").and_then(ParameterValue::text), Some("100"));
    assert!(matches!(limits.get("tags"), Some(ParameterValue::List(tags)) if tags.len() == 1));

    let ParameterValue::Script(script) = &mapping.inputs[2].value else {
        panic!("expected a script, got {:?}", mapping.inputs[2].value);
    };
    assert!(matches!(&script.source, ScriptSource::Source(source) if &**source == "a * 2"));
}

#[rstest]
#[case::missing_name(
    "<operaton:inputParameter>x</operaton:inputParameter>",
    "Missing attribute 'name' for inputParameter"
)]
#[case::two_children(
    r#"<operaton:inputParameter name="x"><operaton:list/><operaton:map/></operaton:inputParameter>"#,
    "Nested parameter can at most have one child element"
)]
#[case::entry_without_key(
    r#"<operaton:inputParameter name="x"><operaton:map><operaton:entry>1</operaton:entry></operaton:map></operaton:inputParameter>"#,
    "Missing attribute 'key' for 'entry' element"
)]
fn test_invalid_parameters(#[case] parameters: &str, #[case] message: &str) {
    let errors = compile_errors(&io_mapping(parameters));
    let error = find_containing(&errors, message);
    assert_eq!(error.element_ids, ["t"]);
}

#[test]
fn test_mapping_on_unsupported_element() {
    let errors = compile_errors(&task_with_extensions(
        "exclusiveGateway",
        r#"<operaton:inputOutput>
             <operaton:inputParameter name="x">1</operaton:inputParameter>
           </operaton:inputOutput>"#,
    ));
    assert_error_containing(&errors, "operaton:inputOutput mapping unsupported for element type 'exclusiveGateway'.");
}

#[test]
fn test_mapping_on_event_subprocess() {
    let errors = compile_errors(&process(
        r#"<startEvent id="start"/>
           <subProcess id="handler" triggeredByEvent="true">
             <extensionElements>
               <operaton:inputOutput><operaton:inputParameter name="x">1</operaton:inputParameter></operaton:inputOutput>
             </extensionElements>
             <startEvent id="trigger"><errorEventDefinition/></startEvent>
           </subProcess>"#,
    ));
    assert_error_containing(&errors, "with attribute 'triggeredByEvent = true'.");
}
