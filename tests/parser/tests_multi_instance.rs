#![allow(clippy::unwrap_used)]

//! Multi-instance bodies wrapping activities.

use bpmn::base::ScopeId;
use bpmn::base::constants::ASYNC_BEFORE;
use bpmn::model::{ActivityType, Behavior, MultiInstanceBehavior};
use rstest::rstest;

use crate::helpers::*;

// ============================================================================
// HELPERS
// ============================================================================

fn looped(task_attributes: &str, characteristics: &str) -> String {
    process(&format!(
        r#"<startEvent id="start"/>
           <sequenceFlow id="in" sourceRef="start" targetRef="t"/>
           <userTask id="t" {task_attributes}>{characteristics}</userTask>
           <sequenceFlow id="out" sourceRef="t" targetRef="end"/>
           <endEvent id="end"/>"#
    ))
}

fn loop_behavior(xml: &str) -> MultiInstanceBehavior {
    let process = compile_process(xml);
    match &process.activity_by_id("t#multiInstanceBody").unwrap().behavior {
        Some(Behavior::MultiInstance(behavior)) => behavior.clone(),
        other => panic!("expected a multi-instance body, got {other:?}"),
    }
}

// ============================================================================
// BODY STRUCTURE
// ============================================================================

#[test]
fn test_body_wraps_the_activity() {
    let process = compile_process(&looped(
        "",
        r#"<multiInstanceLoopCharacteristics isSequential="true">
             <loopCardinality>3</loopCardinality>
           </multiInstanceLoopCharacteristics>"#,
    ));

    let body_id = process.find_activity("t#multiInstanceBody").unwrap();
    let body = process.activity(body_id);
    assert_eq!(body.activity_type, ActivityType::MultiInstanceBody);
    assert!(body.is_scope);
    assert_eq!(body.flow_scope, ScopeId::Process);

    let inner = process.activity_by_id("t").unwrap();
    assert!(inner.is_multi_instance);
    assert_eq!(inner.flow_scope, ScopeId::Activity(body_id));

    // Flows attach to the body, not to the inner activity.
    assert_eq!(process.find_transition("in").unwrap().destination, body_id);
    assert_eq!(process.find_transition("out").unwrap().source, body_id);
    assert!(inner.incoming.is_empty());
    assert!(inner.outgoing.is_empty());
}

#[test]
fn test_loop_configuration() {
    let behavior = loop_behavior(&looped(
        "",
        r#"<multiInstanceLoopCharacteristics isSequential="true">
             <loopCardinality>${count}</loopCardinality>
             <completionCondition>${done}</completionCondition>
           </multiInstanceLoopCharacteristics>"#,
    ));
    assert!(behavior.sequential);
    assert_eq!(behavior.loop_cardinality.unwrap().text(), "${count}");
    assert_eq!(behavior.completion_condition.unwrap().text(), "${done}");
}

#[rstest]
#[case::variable(r#"operaton:collection="orders""#, Some("orders"), false)]
#[case::expression(r#"operaton:collection="${customer.orders}""#, None, true)]
fn test_collection(#[case] attribute: &str, #[case] variable: Option<&str>, #[case] expression: bool) {
    let behavior = loop_behavior(&looped(
        "",
        &format!(r#"<multiInstanceLoopCharacteristics {attribute} operaton:elementVariable="order"/>"#),
    ));
    assert!(!behavior.sequential);
    assert_eq!(behavior.collection_variable.as_deref(), variable);
    assert_eq!(behavior.collection_expression.is_some(), expression);
    assert_eq!(behavior.element_variable.as_deref(), Some("order"));
}

#[test]
fn test_loop_data_input_ref() {
    let behavior = loop_behavior(&looped(
        "",
        r#"<multiInstanceLoopCharacteristics>
             <loopDataInputRef>reviewers</loopDataInputRef>
             <inputDataItem name="reviewer"/>
           </multiInstanceLoopCharacteristics>"#,
    ));
    assert_eq!(behavior.collection_variable.as_deref(), Some("reviewers"));
    assert_eq!(behavior.element_variable.as_deref(), Some("reviewer"));
}

#[rstest]
#[case::empty_cardinality(
    "<multiInstanceLoopCharacteristics><loopCardinality/></multiInstanceLoopCharacteristics>",
    "loopCardinality must be defined for a multiInstanceLoopCharacteristics definition"
)]
#[case::nothing_to_loop_over(
    "<multiInstanceLoopCharacteristics/>",
    "Either loopCardinality or loopDataInputRef/activiti:collection must be set"
)]
#[case::element_variable_without_collection(
    r#"<multiInstanceLoopCharacteristics operaton:elementVariable="x">
         <loopCardinality>2</loopCardinality>
       </multiInstanceLoopCharacteristics>"#,
    "LoopDataInputRef/activiti:collection must be set when using inputDataItem or activiti:elementVariable"
)]
fn test_invalid_loop_characteristics(#[case] characteristics: &str, #[case] message: &str) {
    let errors = compile_errors(&looped("", characteristics));
    let error = find_containing(&errors, message);
    assert_eq!(error.element_ids, ["t#multiInstanceBody"]);
}

// ============================================================================
// ASYNC AND MAPPINGS
// ============================================================================

#[test]
fn test_async_flags_split_between_body_and_activity() {
    let output = compile(&looped(
        r#"operaton:asyncBefore="true""#,
        r#"<multiInstanceLoopCharacteristics operaton:asyncAfter="true">
             <loopCardinality>2</loopCardinality>
           </multiInstanceLoopCharacteristics>"#,
    ));
    let process = output.process("p").unwrap();

    let body = process.activity_by_id("t#multiInstanceBody").unwrap();
    assert!(body.async_before);
    assert!(!body.async_after);

    let inner = process.activity_by_id("t").unwrap();
    assert!(!inner.async_before);
    assert!(inner.async_after);

    let jobs = output.job_declarations_of("p");
    assert!(jobs.iter().any(|job| job.matches("t#multiInstanceBody", ASYNC_BEFORE)));
    assert!(!jobs.iter().any(|job| job.matches("t", ASYNC_BEFORE)));
}

#[test]
fn test_output_mapping_on_multi_instance() {
    let errors = compile_errors(&looped(
        "",
        r#"<extensionElements>
             <operaton:inputOutput>
               <operaton:outputParameter name="result">${value}</operaton:outputParameter>
             </operaton:inputOutput>
           </extensionElements>
           <multiInstanceLoopCharacteristics><loopCardinality>2</loopCardinality></multiInstanceLoopCharacteristics>"#,
    ));
    assert_error_containing(&errors, "operaton:outputParameter not allowed for multi-instance constructs");
}

#[test]
fn test_input_mapping_on_multi_instance() {
    let process = compile_process(&looped(
        "",
        r#"<extensionElements>
             <operaton:inputOutput>
               <operaton:inputParameter name="item">${value}</operaton:inputParameter>
             </operaton:inputOutput>
           </extensionElements>
           <multiInstanceLoopCharacteristics><loopCardinality>2</loopCardinality></multiInstanceLoopCharacteristics>"#,
    ));
    let inner = process.activity_by_id("t").unwrap();
    assert_eq!(inner.io_mapping.as_ref().unwrap().inputs.len(), 1);
    // The body already isolates each instance.
    assert!(!inner.is_scope);
}

#[test]
fn test_multi_instance_call_activity_is_not_a_scope() {
    let process = compile_process(&process(
        r#"<startEvent id="start"/>
           <callActivity id="call" calledElement="billing">
             <multiInstanceLoopCharacteristics><loopCardinality>2</loopCardinality></multiInstanceLoopCharacteristics>
           </callActivity>"#,
    ));
    assert!(!process.activity_by_id("call").unwrap().is_scope);
    assert!(process.activity_by_id("call#multiInstanceBody").unwrap().is_scope);
}

#[test]
fn test_boundary_event_attaches_to_body() {
    let process = compile_process(&process(
        r#"<startEvent id="start"/>
           <sequenceFlow id="in" sourceRef="start" targetRef="t"/>
           <userTask id="t">
             <multiInstanceLoopCharacteristics><loopCardinality>2</loopCardinality></multiInstanceLoopCharacteristics>
           </userTask>
           <boundaryEvent id="timeout" attachedToRef="t">
             <timerEventDefinition><timeDuration>PT1H</timeDuration></timerEventDefinition>
           </boundaryEvent>"#,
    ));
    let body = process.find_activity("t#multiInstanceBody").unwrap();
    let boundary = process.activity_by_id("timeout").unwrap();
    assert_eq!(boundary.event_scope, Some(ScopeId::Activity(body)));
}
