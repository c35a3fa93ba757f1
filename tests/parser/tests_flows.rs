#![allow(clippy::unwrap_used)]

//! Sequence flows: endpoints, conditions, listeners and sub-process
//! boundaries.

use bpmn::expression::{Condition, ScriptSource};
use bpmn::model::ListenerDefinition;
use rstest::rstest;

use crate::helpers::*;

// ============================================================================
// HELPERS
// ============================================================================

fn start_to_task(flow: &str) -> String {
    process(&format!(
        r#"<startEvent id="start"/>
           <userTask id="review"/>
           {flow}"#
    ))
}

// ============================================================================
// TRANSITIONS
// ============================================================================

#[test]
fn test_transition_connects_activities() {
    let process = compile_process(&start_to_task(
        r#"<sequenceFlow id="f1" name="Go" sourceRef="start" targetRef="review">
             <documentation>always taken</documentation>
           </sequenceFlow>"#,
    ));

    let start = process.find_activity("start").unwrap();
    let review = process.find_activity("review").unwrap();
    let transition = process.find_transition("f1").unwrap();
    assert_eq!(transition.source, start);
    assert_eq!(transition.destination, review);
    assert_eq!(transition.name.as_deref(), Some("Go"));
    assert_eq!(transition.documentation.as_deref(), Some("always taken"));
    assert!(transition.condition.is_none());
    assert!(transition.line > 0);

    assert_eq!(process.outgoing(start).count(), 1);
    assert_eq!(process.incoming(review).count(), 1);
}

#[test]
fn test_flow_without_id() {
    let process = compile_process(&start_to_task(r#"<sequenceFlow sourceRef="start" targetRef="review"/>"#));
    assert_eq!(process.transitions().len(), 1);
    assert_eq!(process.transitions()[0].id, None);
}

#[rstest]
#[case::unknown_source(
    r#"<sequenceFlow id="f1" sourceRef="ghost" targetRef="review"/>"#,
    "Invalid source 'ghost' of sequence flow 'f1'"
)]
#[case::unknown_destination(
    r#"<sequenceFlow id="f1" sourceRef="start" targetRef="ghost"/>"#,
    "Invalid destination 'ghost' of sequence flow 'f1'"
)]
#[case::missing_id_and_source(
    r#"<sequenceFlow targetRef="review"/>"#,
    "Invalid source '' of sequence flow 'null'"
)]
fn test_invalid_endpoints(#[case] flow: &str, #[case] message: &str) {
    let errors = compile_errors(&start_to_task(flow));
    assert_error_containing(&errors, message);
}

#[test]
fn test_flow_cannot_enter_a_subprocess() {
    let errors = compile_errors(&process(
        r#"<startEvent id="start"/>
           <subProcess id="sub">
             <startEvent id="subStart"/>
             <userTask id="inner"/>
           </subProcess>
           <sequenceFlow id="across" sourceRef="start" targetRef="inner"/>"#,
    ));
    assert_error_containing(&errors, "Invalid destination 'inner' of sequence flow 'across'");
}

#[test]
fn test_flows_inside_subprocess() {
    let process = compile_process(&process(
        r#"<startEvent id="start"/>
           <subProcess id="sub">
             <startEvent id="subStart"/>
             <sequenceFlow id="inside" sourceRef="subStart" targetRef="subEnd"/>
             <endEvent id="subEnd"/>
           </subProcess>
           <sequenceFlow id="outside" sourceRef="start" targetRef="sub"/>"#,
    ));
    assert!(process.find_transition("inside").is_some());
    assert!(process.find_transition("outside").is_some());
}

// ============================================================================
// CONDITIONS
// ============================================================================

fn conditional_flow(condition: &str) -> String {
    start_to_task(&format!(
        r#"<sequenceFlow id="f1" sourceRef="start" targetRef="review">{condition}</sequenceFlow>"#
    ))
}

#[test]
fn test_expression_condition() {
    let process = compile_process(&conditional_flow(
        r#"<conditionExpression xsi:type="tFormalExpression">${amount > 100}</conditionExpression>"#,
    ));
    let transition = process.find_transition("f1").unwrap();
    assert_eq!(transition.condition_text.as_deref(), Some("${amount > 100}"));
    match transition.condition.as_ref().unwrap() {
        Condition::Expression(expression) => assert_eq!(expression.text(), "${amount > 100}"),
        other => panic!("expected an expression condition, got {other:?}"),
    }
}

#[test]
fn test_script_condition() {
    let process = compile_process(&conditional_flow(
        r#"<conditionExpression language="groovy">amount > 100</conditionExpression>"#,
    ));
    let transition = process.find_transition("f1").unwrap();
    match transition.condition.as_ref().unwrap() {
        Condition::Script(script) => {
            assert_eq!(script.language, "groovy");
            assert!(matches!(&script.source, ScriptSource::Source(source) if &**source == "amount > 100"));
        }
        other => panic!("expected a script condition, got {other:?}"),
    }
}

#[test]
fn test_script_condition_from_resource() {
    let process = compile_process(&conditional_flow(
        r#"<conditionExpression language="javascript" operaton:resource="conditions/amount.js"/>"#,
    ));
    let transition = process.find_transition("f1").unwrap();
    assert!(matches!(
        transition.condition.as_ref(),
        Some(Condition::Script(script)) if matches!(&script.source, ScriptSource::Resource(_))
    ));
}

#[test]
fn test_unsupported_condition_type() {
    let errors = compile_errors(&conditional_flow(
        r#"<conditionExpression xsi:type="tExpression">${ok}</conditionExpression>"#,
    ));
    let error = find_containing(&errors, "Invalid type, only tFormalExpression is currently supported");
    assert_eq!(error.element_ids, ["f1"]);
}

#[test]
fn test_script_condition_without_language() {
    let errors = compile_errors(&conditional_flow(r#"<conditionExpression language="">${ok}</conditionExpression>"#));
    assert_error_containing(&errors, "Unable to process condition expression:Script language is required");
}

// ============================================================================
// LISTENERS
// ============================================================================

#[test]
fn test_take_listeners() {
    let process = compile_process(&start_to_task(
        r#"<sequenceFlow id="f1" sourceRef="start" targetRef="review">
             <extensionElements>
               <operaton:executionListener expression="${audit.taken(execution)}"/>
               <operaton:executionListener class="org.example.TakeListener"/>
             </extensionElements>
           </sequenceFlow>"#,
    ));
    let listeners = &process.find_transition("f1").unwrap().listeners;
    assert_eq!(listeners.len(), 2);
    assert!(matches!(&listeners[0], ListenerDefinition::Expression(e) if e.text() == "${audit.taken(execution)}"));
    assert!(matches!(&listeners[1], ListenerDefinition::Class { class_name, .. } if class_name == "org.example.TakeListener"));
}

#[test]
fn test_take_listener_without_implementation() {
    let errors = compile_errors(&start_to_task(
        r#"<sequenceFlow id="f1" sourceRef="start" targetRef="review">
             <extensionElements><operaton:executionListener event="take"/></extensionElements>
           </sequenceFlow>"#,
    ));
    assert_error_containing(
        &errors,
        "Element 'class', 'expression', 'delegateExpression' or 'script' is mandatory on executionListener",
    );
}

// ============================================================================
// ASYNC AFTER
// ============================================================================

#[test]
fn test_async_after_needs_flow_ids() {
    let errors = compile_errors(&process(
        r#"<startEvent id="start"/>
           <userTask id="review" operaton:asyncAfter="true"/>
           <endEvent id="end"/>
           <sequenceFlow id="f1" sourceRef="start" targetRef="review"/>
           <sequenceFlow sourceRef="review" targetRef="end"/>"#,
    ));
    let error = find_containing(
        &errors,
        "Sequence flow with sourceRef='review' must have an id, activity with id 'review' uses 'asyncAfter'.",
    );
    assert_eq!(error.element_ids, ["review"]);
}
