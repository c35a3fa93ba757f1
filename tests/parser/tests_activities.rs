#![allow(clippy::unwrap_used)]

//! Tasks, call activities, properties and asynchronous continuations.

use bpmn::base::constants::{ASYNC_AFTER, ASYNC_BEFORE};
use bpmn::expression::{ParameterValue, ScriptSource};
use bpmn::model::{
    ActivityType, Behavior, CallableElementBinding, CalledElementKind, DecisionResultMapper,
    EventType, Priority, ServiceTaskBehavior, VariableMapping,
};
use bpmn::parser::{BpmnParser, ParseOptions};
use rstest::rstest;

use crate::helpers::*;

// ============================================================================
// HELPERS
// ============================================================================

/// A process `start → {element}` where the element has id `t`.
fn single(element: &str) -> String {
    process(&format!(
        r#"<startEvent id="start"/>
           <sequenceFlow id="f1" sourceRef="start" targetRef="t"/>
           {element}"#
    ))
}

fn service_behavior(xml: &str) -> ServiceTaskBehavior {
    let process = compile_process(xml);
    match process.activity_by_id("t").unwrap().behavior.clone() {
        Some(Behavior::ServiceTask(behavior)) => behavior,
        other => panic!("expected a service task behavior, got {other:?}"),
    }
}

// ============================================================================
// USER TASKS
// ============================================================================

#[test]
fn test_user_task_definition() {
    let process = compile_process(&single(
        r#"<userTask id="t" name="Approve ${order}" operaton:assignee="${initiator}"
                     operaton:candidateUsers="kermit, ${reviewer}"
                     operaton:candidateGroups="management,accounting"
                     operaton:dueDate="${due}" operaton:priority="50"
                     operaton:formKey="embedded:app:forms/approve.html">
             <documentation>Check the order</documentation>
           </userTask>"#,
    ));

    let task = process.activity_by_id("t").unwrap();
    assert_eq!(task.activity_type, ActivityType::UserTask);
    assert!(matches!(&task.behavior, Some(Behavior::UserTask { task_definition_key }) if task_definition_key == "t"));

    let definition = process.task_definitions.get("t").unwrap();
    assert_eq!(definition.name_expression.as_ref().unwrap().text(), "Approve ${order}");
    assert_eq!(definition.description_expression.as_ref().unwrap().text(), "Check the order");
    assert_eq!(definition.assignee_expression.as_ref().unwrap().text(), "${initiator}");

    let users: Vec<&str> = definition.candidate_user_expressions.iter().map(|e| e.text()).collect();
    assert_eq!(users, ["kermit", "${reviewer}"]);
    let groups: Vec<&str> = definition.candidate_group_expressions.iter().map(|e| e.text()).collect();
    assert_eq!(groups, ["management", "accounting"]);

    assert_eq!(definition.due_date_expression.as_ref().unwrap().text(), "${due}");
    assert_eq!(definition.priority_expression.as_ref().unwrap().text(), "50");
    assert!(definition.form.has_form_key());
}

#[test]
fn test_potential_owner_and_human_performer() {
    let process = compile_process(&single(
        r#"<userTask id="t">
             <humanPerformer>
               <resourceAssignmentExpression><formalExpression>fozzie</formalExpression></resourceAssignmentExpression>
             </humanPerformer>
             <potentialOwner>
               <resourceAssignmentExpression>
                 <formalExpression>user(kermit), group(management), sales</formalExpression>
               </resourceAssignmentExpression>
             </potentialOwner>
           </userTask>"#,
    ));

    let definition = process.task_definitions.get("t").unwrap();
    assert_eq!(definition.assignee_expression.as_ref().unwrap().text(), "fozzie");
    let users: Vec<&str> = definition.candidate_user_expressions.iter().map(|e| e.text()).collect();
    assert_eq!(users, ["kermit"]);
    let groups: Vec<&str> = definition.candidate_group_expressions.iter().map(|e| e.text()).collect();
    assert_eq!(groups, ["management", "sales"]);
}

#[test]
fn test_multiple_human_performers() {
    let performer = r#"<humanPerformer>
          <resourceAssignmentExpression><formalExpression>fozzie</formalExpression></resourceAssignmentExpression>
        </humanPerformer>"#;
    let errors = compile_errors(&single(&format!(
        r#"<userTask id="t" name="Approve">{performer}{performer}</userTask>"#
    )));
    assert_error_containing(
        &errors,
        "Invalid task definition: multiple humanPerformer sub elements defined for Approve",
    );
}

#[test]
fn test_duplicate_assignee() {
    let errors = compile_errors(&single(
        r#"<userTask id="t" operaton:assignee="kermit">
             <humanPerformer>
               <resourceAssignmentExpression><formalExpression>fozzie</formalExpression></resourceAssignmentExpression>
             </humanPerformer>
           </userTask>"#,
    ));
    assert_error_containing(&errors, "Invalid usage: duplicate assignee declaration for task null");
}

#[rstest]
#[case::key_and_ref(
    r#"operaton:formKey="a" operaton:formRef="b" operaton:formRefBinding="latest""#,
    "only one of the attributes formKey and formRef is allowed."
)]
#[case::bad_binding(
    r#"operaton:formRef="b" operaton:formRefBinding="newest""#,
    "value for formRefBinding attribute has to be one of [deployment, latest, version] but was newest"
)]
#[case::missing_binding(
    r#"operaton:formRef="b""#,
    "value for formRefBinding attribute has to be one of [deployment, latest, version] but was null"
)]
fn test_invalid_forms(#[case] attributes: &str, #[case] message: &str) {
    let errors = compile_errors(&single(&format!(r#"<userTask id="t" {attributes}/>"#)));
    assert_error_containing(&errors, message);
}

#[test]
fn test_form_ref_with_version() {
    let process = compile_process(&single(
        r#"<userTask id="t" operaton:formRef="invoice" operaton:formRefBinding="version" operaton:formRefVersion="3"/>"#,
    ));
    let form = &process.task_definitions.get("t").unwrap().form;
    assert_eq!(form.form_ref.as_ref().unwrap().text(), "invoice");
    assert_eq!(form.form_ref_binding.as_deref(), Some("version"));
    assert_eq!(form.form_ref_version.as_ref().unwrap().text(), "3");
}

// ============================================================================
// SERVICE TASKS
// ============================================================================

#[test]
fn test_class_delegate_with_fields() {
    let behavior = service_behavior(&single(
        r#"<serviceTask id="t" operaton:class="org.example.Charge">
             <extensionElements>
               <operaton:field name="currency" stringValue="EUR"/>
               <operaton:field name="amount"><operaton:expression>${total}</operaton:expression></operaton:field>
             </extensionElements>
           </serviceTask>"#,
    ));
    let ServiceTaskBehavior::ClassDelegate { class_name, fields } = behavior else {
        panic!("expected a class delegate, got {behavior:?}");
    };
    assert_eq!(class_name, "org.example.Charge");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "currency");
    assert_eq!(fields[0].value, ParameterValue::Constant("EUR".into()));
    assert!(matches!(&fields[1].value, ParameterValue::Expression(e) if e.text() == "${total}"));
}

#[test]
fn test_delegate_expression() {
    let behavior = service_behavior(&single(
        r#"<serviceTask id="t" operaton:delegateExpression="${chargeDelegate}"/>"#,
    ));
    assert!(matches!(
        behavior,
        ServiceTaskBehavior::DelegateExpression { ref expression, .. } if expression.text() == "${chargeDelegate}"
    ));
}

#[test]
fn test_expression_with_result_variable() {
    let behavior = service_behavior(&single(
        r#"<serviceTask id="t" operaton:expression="${calculator.sum(a, b)}" operaton:resultVariable="sum"/>"#,
    ));
    let ServiceTaskBehavior::Expression { expression, result_variable } = behavior else {
        panic!("expected an expression behavior, got {behavior:?}");
    };
    assert_eq!(expression.text(), "${calculator.sum(a, b)}");
    assert_eq!(result_variable.as_deref(), Some("sum"));
}

#[test]
fn test_result_variable_with_class() {
    let errors = compile_errors(&single(
        r#"<serviceTask id="t" operaton:class="org.example.Charge" operaton:resultVariable="out"/>"#,
    ));
    assert_error_containing(&errors, "'resultVariableName' not supported for serviceTask elements using 'class'");
}

#[test]
fn test_external_task() {
    let process = compile_process(&process_with(
        r#"<error id="declined" errorCode="DECLINED"/>"#,
        r#"<startEvent id="start"/>
           <sequenceFlow id="f1" sourceRef="start" targetRef="t"/>
           <serviceTask id="t" operaton:type="external" operaton:topic="charge" operaton:taskPriority="${prio}">
             <extensionElements>
               <operaton:properties>
                 <operaton:property name="region" value="eu"/>
               </operaton:properties>
               <operaton:errorEventDefinition id="onDecline" errorRef="declined" expression="${error.message == 'no'}"/>
             </extensionElements>
           </serviceTask>"#,
    ));

    let task = process.activity_by_id("t").unwrap();
    assert!(task.is_scope);
    assert!(matches!(task.task_priority, Some(Priority::Expression(_))));
    assert_eq!(task.extension_properties.get("region").map(|v| v.as_str()), Some("eu"));

    let Some(Behavior::ServiceTask(ServiceTaskBehavior::External { topic, error_event_definitions, .. })) = &task.behavior
    else {
        panic!("expected an external task, got {:?}", task.behavior);
    };
    assert_eq!(topic.text(), Some("charge"));
    assert_eq!(error_event_definitions.len(), 1);
    assert_eq!(error_event_definitions[0].error_code.as_deref(), Some("DECLINED"));
    assert!(error_event_definitions[0].expression.is_some());
}

#[test]
fn test_external_task_without_topic() {
    let errors = compile_errors(&single(r#"<serviceTask id="t" operaton:type="external"/>"#));
    assert_error_containing(
        &errors,
        "External tasks must specify a 'topic' attribute in the operaton namespace",
    );
}

#[rstest]
#[case::mail_without_recipient(
    r#"<serviceTask id="t" operaton:type="mail">
         <extensionElements><operaton:field name="text" stringValue="hello"/></extensionElements>
       </serviceTask>"#,
    "No recipient is defined on the mail activity"
)]
#[case::mail_without_body(
    r#"<serviceTask id="t" operaton:type="mail">
         <extensionElements><operaton:field name="to" stringValue="ops@example.org"/></extensionElements>
       </serviceTask>"#,
    "Text or html field should be provided"
)]
#[case::shell_without_command(
    r#"<serviceTask id="t" operaton:type="shell"/>"#,
    "No shell command is defined on the shell activity"
)]
#[case::shell_bad_flag(
    r#"<serviceTask id="t" operaton:type="shell">
         <extensionElements>
           <operaton:field name="command" stringValue="ls"/>
           <operaton:field name="wait" stringValue="maybe"/>
         </extensionElements>
       </serviceTask>"#,
    "undefined value for shell wait parameter :maybe"
)]
#[case::unknown_type(
    r#"<serviceTask id="t" operaton:type="carrier-pigeon"/>"#,
    "Invalid usage of type attribute on serviceTask: 'carrier-pigeon'"
)]
#[case::no_implementation(
    r#"<serviceTask id="t"/>"#,
    "One of the attributes 'class', 'delegateExpression', 'type', or 'expression' is mandatory on serviceTask."
)]
fn test_invalid_service_tasks(#[case] element: &str, #[case] message: &str) {
    let errors = compile_errors(&single(element));
    assert_error_containing(&errors, message);
}

#[test]
fn test_mail_task() {
    let behavior = service_behavior(&single(
        r#"<serviceTask id="t" operaton:type="mail">
             <extensionElements>
               <operaton:field name="to" stringValue="ops@example.org"/>
               <operaton:field name="html"><operaton:string>&lt;b&gt;done&lt;/b&gt;</operaton:string></operaton:field>
             </extensionElements>
           </serviceTask>"#,
    ));
    assert!(matches!(behavior, ServiceTaskBehavior::Mail { ref fields } if fields.len() == 2));
}

#[rstest]
#[case::with_class(r#"<sendTask id="t" operaton:class="org.example.Send"/>"#, true)]
#[case::without_implementation(r#"<sendTask id="t"/>"#, false)]
fn test_send_task(#[case] element: &str, #[case] valid: bool) {
    if valid {
        let process = compile_process(&single(element));
        let task = process.activity_by_id("t").unwrap();
        assert_eq!(task.activity_type, ActivityType::SendTask);
        assert!(matches!(task.behavior, Some(Behavior::ServiceTask(_))));
    } else {
        let errors = compile_errors(&single(element));
        assert_error_containing(
            &errors,
            "One of the attributes 'class', 'delegateExpression', 'type', or 'expression' is mandatory on sendTask.",
        );
    }
}

// ============================================================================
// SCRIPT, RECEIVE AND BUSINESS RULE TASKS
// ============================================================================

#[test]
fn test_script_task() {
    let process = compile_process(&single(
        r#"<scriptTask id="t" scriptFormat="groovy" operaton:resultVariable="total">
             <script>a + b</script>
           </scriptTask>"#,
    ));
    let Some(Behavior::ScriptTask { script, result_variable }) = &process.activity_by_id("t").unwrap().behavior else {
        panic!("expected a script task behavior");
    };
    assert_eq!(script.language, "groovy");
    assert!(matches!(&script.source, ScriptSource::Source(source) if &**source == "a + b"));
    assert_eq!(result_variable.as_deref(), Some("total"));
}

#[test]
fn test_script_task_default_language() {
    let mut parser =
        BpmnParser::new().with_options(ParseOptions::default().with_default_script_language("javascript"));
    let output = parser
        .parse_str("test.bpmn", &single(r#"<scriptTask id="t"><script>x</script></scriptTask>"#))
        .unwrap();
    let task = output.process("p").unwrap().activity_by_id("t").unwrap();
    assert!(matches!(&task.behavior, Some(Behavior::ScriptTask { script, .. }) if script.language == "javascript"));
}

#[test]
fn test_script_task_without_source() {
    let errors = compile_errors(&single(r#"<scriptTask id="t" scriptFormat="groovy"/>"#));
    assert_error_containing(&errors, "Unable to process ScriptTask: Script source or resource is required");
}

#[test]
fn test_receive_task_with_message() {
    let process = compile_process(&process_with(
        r#"<message id="paid" name="payment received"/>"#,
        r#"<startEvent id="start"/>
           <sequenceFlow id="f1" sourceRef="start" targetRef="t"/>
           <receiveTask id="t" messageRef="paid"/>"#,
    ));
    let task = process.activity_by_id("t").unwrap();
    assert!(task.is_scope);
    assert!(matches!(task.behavior, Some(Behavior::ReceiveTask)));
    let subscription = task.scope.event_subscriptions.get("t").unwrap();
    assert_eq!(subscription.event_type, EventType::Message);
    assert_eq!(subscription.unresolved_event_name(), Some("payment received"));
    assert_eq!(subscription.event_scope_activity_id.as_deref(), Some("t"));
}

#[test]
fn test_receive_task_without_message() {
    let process = compile_process(&single(r#"<receiveTask id="t"/>"#));
    let task = process.activity_by_id("t").unwrap();
    assert!(!task.is_scope);
    assert!(task.scope.event_subscriptions.is_empty());
}

#[test]
fn test_decision_task() {
    let process = compile_process(&single(
        r#"<businessRuleTask id="t" operaton:decisionRef="approve" operaton:decisionRefBinding="version"
                             operaton:decisionRefVersion="2" operaton:mapDecisionResult="singleEntry"
                             operaton:resultVariable="approved"/>"#,
    ));
    let task = process.activity_by_id("t").unwrap();
    assert!(task.is_scope);
    let Some(Behavior::DmnBusinessRuleTask(decision)) = &task.behavior else {
        panic!("expected a decision behavior, got {:?}", task.behavior);
    };
    assert_eq!(decision.callable_element.definition_key.text(), Some("approve"));
    assert_eq!(decision.callable_element.binding, Some(CallableElementBinding::Version));
    assert_eq!(decision.callable_element.version.text(), Some("2"));
    assert_eq!(decision.result_mapper, DecisionResultMapper::SingleEntry);
    assert_eq!(decision.result_variable.as_deref(), Some("approved"));
}

#[test]
fn test_decision_task_with_unknown_mapper() {
    let errors = compile_errors(&single(
        r#"<businessRuleTask id="t" operaton:decisionRef="approve" operaton:mapDecisionResult="everything"/>"#,
    ));
    assert_error_containing(&errors, "No decision result mapper found for name 'everything'");
}

#[test]
fn test_business_rule_task_as_service_task() {
    let behavior = service_behavior(&single(
        r#"<businessRuleTask id="t" operaton:class="org.example.Rules"/>"#,
    ));
    assert!(matches!(behavior, ServiceTaskBehavior::ClassDelegate { .. }));
}

// ============================================================================
// CALL ACTIVITIES
// ============================================================================

#[test]
fn test_call_activity() {
    let process = compile_process(&single(
        r##"<callActivity id="t" calledElement="billing" operaton:calledElementBinding="versionTag"
                         operaton:calledElementVersionTag="v2" operaton:calledElementTenantId="acme"
                         operaton:variableMappingClass="org.example.Mapping">
             <extensionElements>
               <operaton:in businessKey="#{execution.processBusinessKey}"/>
               <operaton:in source="amount" target="total"/>
               <operaton:in sourceExpression="${order.id}" target="orderId" local="true"/>
               <operaton:in variables="all"/>
               <operaton:out source="invoice" target="invoice"/>
               <operaton:out source="receipt" target="receipt" local="true"/>
             </extensionElements>
           </callActivity>"##,
    ));

    let task = process.activity_by_id("t").unwrap();
    assert!(task.is_scope);
    let Some(Behavior::CallActivity(call)) = &task.behavior else {
        panic!("expected a call activity behavior, got {:?}", task.behavior);
    };
    assert_eq!(call.kind, CalledElementKind::Process);
    assert_eq!(call.variable_mapping, Some(VariableMapping::Class("org.example.Mapping".into())));

    let callable = &call.callable_element;
    assert_eq!(callable.definition_key.text(), Some("billing"));
    assert_eq!(callable.binding, Some(CallableElementBinding::VersionTag));
    assert_eq!(callable.version_tag.text(), Some("v2"));
    assert_eq!(callable.tenant_id.as_ref().and_then(ParameterValue::text), Some("acme"));
    assert!(callable.business_key.is_some());

    assert_eq!(callable.inputs.len(), 3);
    assert_eq!(callable.inputs[0].source, Some(ParameterValue::Constant("amount".into())));
    assert_eq!(callable.inputs[0].target.as_deref(), Some("total"));
    assert!(callable.inputs[1].read_local);
    assert!(callable.inputs[2].all_variables);

    assert_eq!(callable.outputs.len(), 1);
    assert_eq!(callable.outputs_local.len(), 1);
}

#[test]
fn test_call_activity_for_case() {
    let process = compile_process(&single(r#"<callActivity id="t" operaton:caseRef="claim"/>"#));
    let Some(Behavior::CallActivity(call)) = &process.activity_by_id("t").unwrap().behavior else {
        panic!("expected a call activity behavior");
    };
    assert_eq!(call.kind, CalledElementKind::Case);
    assert_eq!(call.callable_element.definition_key.text(), Some("claim"));
}

#[rstest]
#[case::nothing_called(r#"<callActivity id="t"/>"#, "Missing attribute 'calledElement' or 'caseRef'")]
#[case::both_called(
    r#"<callActivity id="t" calledElement="a" operaton:caseRef="b"/>"#,
    "The attributes 'calledElement' or 'caseRef' cannot be used together"
)]
#[case::version_missing(
    r#"<callActivity id="t" calledElement="a" operaton:calledElementBinding="version"/>"#,
    "Missing attribute 'calledElementVersion' when 'calledElementBinding' has value 'version'"
)]
#[case::target_missing(
    r#"<callActivity id="t" calledElement="a">
         <extensionElements><operaton:in source="amount"/></extensionElements>
       </callActivity>"#,
    "Missing attribute 'target' when attribute 'source' or 'sourceExpression' is set"
)]
#[case::source_missing(
    r#"<callActivity id="t" calledElement="a">
         <extensionElements><operaton:out target="x"/></extensionElements>
       </callActivity>"#,
    "Missing parameter 'source' or 'sourceExpression' when passing variables"
)]
fn test_invalid_call_activities(#[case] element: &str, #[case] message: &str) {
    let errors = compile_errors(&single(element));
    assert_error_containing(&errors, message);
}

#[test]
fn test_lenient_call_activity_parameters() {
    let mut parser =
        BpmnParser::new().with_options(ParseOptions::default().with_strict_call_activity_validation(false));
    let output = parser.parse_str(
        "test.bpmn",
        &single(
            r#"<callActivity id="t" calledElement="a">
                 <extensionElements><operaton:out target="x"/></extensionElements>
               </callActivity>"#,
        ),
    );
    assert!(output.is_ok());
}

// ============================================================================
// PROPERTIES AND UNSUPPORTED ELEMENTS
// ============================================================================

#[test]
fn test_user_task_properties() {
    let process = compile_process(&single(
        r#"<userTask id="t">
             <property id="p1" name="approved" operaton:type="boolean" operaton:src="decision"/>
             <property id="p2"/>
           </userTask>"#,
    ));
    let task = process.activity_by_id("t").unwrap();
    assert!(task.is_scope);
    let declarations = &task.scope.variable_declarations;
    assert_eq!(declarations.len(), 2);
    assert_eq!(declarations[0].name, "approved");
    assert_eq!(declarations[0].variable_type, "boolean");
    assert_eq!(declarations[0].source_variable.as_deref(), Some("decision"));
    assert_eq!(declarations[1].name, "p2");
}

#[test]
fn test_property_without_name_or_id() {
    let errors = compile_errors(&single(r#"<userTask id="t"><property/></userTask>"#));
    let error = find_containing(&errors, "Invalid property usage on line");
    assert!(error.message.ends_with("no id or name specified."));
    assert_eq!(error.element_ids, ["t"]);
}

#[test]
fn test_ad_hoc_subprocess_is_ignored() {
    let output = compile(&process(r#"<startEvent id="start"/><adHocSubProcess id="t"/>"#));
    assert!(output.process("p").unwrap().activity_by_id("t").is_none());
    assert_error_containing(&output.report.warnings, "Ignoring unsupported activity type");
}

// ============================================================================
// ASYNC CONTINUATIONS AND PRIORITIES
// ============================================================================

#[test]
fn test_async_before_and_after() {
    let output = compile(&process(
        r#"<startEvent id="start"/>
           <sequenceFlow id="f1" sourceRef="start" targetRef="t"/>
           <serviceTask id="t" operaton:class="org.example.Charge" operaton:asyncBefore="true"
                        operaton:asyncAfter="true" operaton:exclusive="false" operaton:jobPriority="7"/>
           <sequenceFlow id="f2" sourceRef="t" targetRef="end"/>
           <endEvent id="end"/>"#,
    ));
    let process = output.process("p").unwrap();
    let task = process.activity_by_id("t").unwrap();

    assert!(task.async_before);
    assert!(task.async_after);
    assert!(!task.exclusive);
    assert_eq!(task.job_priority, Some(Priority::Constant(7)));
    assert_eq!(task.message_jobs.len(), 2);

    let jobs = output.job_declarations_of("p");
    assert!(jobs.iter().any(|job| job.matches("t", ASYNC_BEFORE)));
    assert!(jobs.iter().any(|job| job.matches("t", ASYNC_AFTER)));
}

#[test]
fn test_legacy_async_attribute() {
    let process = compile_process(&single(r#"<task id="t" operaton:async="true"/>"#));
    let task = process.activity_by_id("t").unwrap();
    assert!(task.async_before);
    assert!(task.exclusive);
    assert!(process.job_declarations().iter().any(|job| job.matches("t", ASYNC_BEFORE)));
}

#[test]
fn test_camunda_namespace_is_accepted() {
    let process = compile_process(&single(r#"<task id="t" camunda:asyncBefore="true"/>"#));
    assert!(process.activity_by_id("t").unwrap().async_before);
}

#[rstest]
#[case::constant("12", Some(Priority::Constant(12)))]
#[case::negative("-3", Some(Priority::Constant(-3)))]
fn test_job_priority(#[case] value: &str, #[case] expected: Option<Priority>) {
    let process = compile_process(&single(&format!(r#"<task id="t" operaton:jobPriority="{value}"/>"#)));
    assert_eq!(process.activity_by_id("t").unwrap().job_priority, expected);
}

#[test]
fn test_job_priority_expression() {
    let process = compile_process(&single(r#"<task id="t" operaton:jobPriority="${priority}"/>"#));
    assert!(matches!(
        process.activity_by_id("t").unwrap().job_priority,
        Some(Priority::Expression(_))
    ));
}

#[test]
fn test_invalid_job_priority() {
    let errors = compile_errors(&single(r#"<task id="t" operaton:jobPriority="urgent"/>"#));
    assert_error_containing(&errors, "Value 'urgent' for attribute 'jobPriority' is not a valid number");
}
