#![allow(clippy::unwrap_used)]

//! Gateways: exclusive gateway flow validation and event-based gateways.

use bpmn::Severity;
use bpmn::base::ScopeId;
use bpmn::model::{ActivityType, Behavior};
use rstest::rstest;

use crate::helpers::*;

// ============================================================================
// HELPERS
// ============================================================================

/// A process `start → gw` followed by `flows` and three tasks `a`, `b`, `c`.
fn exclusive(gateway_attributes: &str, flows: &str) -> String {
    process(&format!(
        r#"<startEvent id="start"/>
           <sequenceFlow id="in" sourceRef="start" targetRef="gw"/>
           <exclusiveGateway id="gw" {gateway_attributes}/>
           <task id="a"/>
           <task id="b"/>
           <task id="c"/>
           {flows}"#
    ))
}

fn flow(id: &str, target: &str, condition: Option<&str>) -> String {
    match condition {
        Some(condition) => format!(
            r#"<sequenceFlow id="{id}" sourceRef="gw" targetRef="{target}">
                 <conditionExpression xsi:type="tFormalExpression">{condition}</conditionExpression>
               </sequenceFlow>"#
        ),
        None => format!(r#"<sequenceFlow id="{id}" sourceRef="gw" targetRef="{target}"/>"#),
    }
}

// ============================================================================
// EXCLUSIVE GATEWAYS
// ============================================================================

#[test]
fn test_conditions_with_default_flow() {
    let flows = [
        flow("toA", "a", Some("${x > 1}")),
        flow("toB", "b", Some("${x &lt; 0}")),
        flow("toC", "c", None),
    ]
    .concat();
    let output = compile(&exclusive(r#"default="toC""#, &flows));
    let process = output.process("p").unwrap();

    let gateway = process.activity_by_id("gw").unwrap();
    assert_eq!(gateway.activity_type, ActivityType::ExclusiveGateway);
    assert!(matches!(gateway.behavior, Some(Behavior::ExclusiveGateway)));
    assert_eq!(gateway.default_flow.as_deref(), Some("toC"));
    assert_eq!(gateway.outgoing.len(), 3);
    assert!(output.report.warnings.is_empty());
}

#[test]
fn test_gateway_without_outgoing_flows() {
    let errors = compile_errors(&exclusive("", ""));
    let error = find_containing(&errors, "Exclusive Gateway 'gw' has no outgoing sequence flows.");
    assert_eq!(error.element_ids, ["gw"]);
}

#[test]
fn test_single_flow_with_condition() {
    let errors = compile_errors(&exclusive("", &flow("toA", "a", Some("${ok}"))));
    let error = find_containing(
        &errors,
        "Exclusive Gateway 'gw' has only one outgoing sequence flow ('toA'). This is not allowed to have a condition.",
    );
    assert_eq!(error.element_ids, ["gw", "toA"]);
}

#[test]
fn test_single_unconditional_flow_is_fine() {
    let process = compile_process(&exclusive("", &flow("toA", "a", None)));
    assert_eq!(process.activity_by_id("gw").unwrap().outgoing.len(), 1);
}

#[test]
fn test_default_flow_with_condition() {
    let flows = [flow("toA", "a", Some("${x}")), flow("toB", "b", Some("${y}"))].concat();
    let errors = compile_errors(&exclusive(r#"default="toB""#, &flows));
    assert_error_containing(
        &errors,
        "Exclusive Gateway 'gw' has outgoing sequence flow 'toB' which is the default flow but has a condition too.",
    );
}

#[rstest]
#[case::next_to_default(r#"default="toC""#, 1)]
#[case::two_without_default("", 2)]
fn test_unconditional_flows_that_are_not_the_default(#[case] attributes: &str, #[case] expected: usize) {
    let flows = match attributes {
        "" => [flow("toA", "a", None), flow("toB", "b", None), flow("toC", "c", Some("${z}"))].concat(),
        _ => [flow("toA", "a", Some("${x}")), flow("toB", "b", None), flow("toC", "c", None)].concat(),
    };
    let errors = compile_errors(&exclusive(attributes, &flows));
    let count = errors
        .iter()
        .filter(|e| e.message.contains("without condition which is not the default flow."))
        .count();
    assert_eq!(count, expected, "{:?}", messages(&errors));
}

#[test]
fn test_single_unconditional_flow_is_assumed_default() {
    let flows = [flow("toA", "a", Some("${x}")), flow("toB", "b", None)].concat();
    let warnings = compile_warnings(&exclusive("", &flows));
    let warning = find_containing(&warnings, "We assume it to be the default flow");
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(warning.element_ids, ["gw", "toB"]);
}

#[rstest]
#[case::inclusive("inclusiveGateway", ActivityType::InclusiveGateway)]
#[case::parallel("parallelGateway", ActivityType::ParallelGateway)]
fn test_other_gateways_are_not_validated(#[case] tag: &str, #[case] expected: ActivityType) {
    let process = compile_process(&process(&format!(
        r#"<startEvent id="start"/>
           <sequenceFlow id="in" sourceRef="start" targetRef="gw"/>
           <{tag} id="gw"/>"#
    )));
    assert_eq!(process.activity_by_id("gw").unwrap().activity_type, expected);
}

#[test]
fn test_unsupported_gateway_is_ignored() {
    let warnings = compile_warnings(&process(
        r#"<startEvent id="start"/>
           <complexGateway id="complex"/>"#,
    ));
    assert_error_containing(&warnings, "Ignoring unsupported activity type");
}

// ============================================================================
// EVENT-BASED GATEWAYS
// ============================================================================

const EVENT_BASED: &str = r#"
    <startEvent id="start"/>
    <sequenceFlow id="in" sourceRef="start" targetRef="gw"/>
    <eventBasedGateway id="gw"/>
    <sequenceFlow id="toTimer" sourceRef="gw" targetRef="timeout"/>
    <sequenceFlow id="toMessage" sourceRef="gw" targetRef="reply"/>
    <intermediateCatchEvent id="timeout">
      <timerEventDefinition><timeDuration>P1D</timeDuration></timerEventDefinition>
    </intermediateCatchEvent>
    <intermediateCatchEvent id="reply">
      <messageEventDefinition messageRef="answer"/>
    </intermediateCatchEvent>
    <endEvent id="end"/>
    <sequenceFlow id="afterTimer" sourceRef="timeout" targetRef="end"/>
"#;

fn event_based(extra: &str) -> String {
    process_with(
        r#"<message id="answer" name="answer"/>"#,
        &format!("{EVENT_BASED}{extra}"),
    )
}

#[test]
fn test_event_based_gateway_claims_its_catch_events() {
    let process = compile_process(&event_based(""));

    let gateway_id = process.find_activity("gw").unwrap();
    let gateway = process.activity(gateway_id);
    assert!(gateway.is_scope);
    assert!(matches!(gateway.behavior, Some(Behavior::EventBasedGateway)));

    for id in ["timeout", "reply"] {
        let catch_event = process.activity_by_id(id).unwrap();
        assert_eq!(catch_event.event_scope, Some(ScopeId::Activity(gateway_id)), "{id}");
        assert_eq!(catch_event.flow_scope, ScopeId::Process, "{id}");
        assert!(catch_event.is_event_based_gateway_target(gateway_id));
        assert!(matches!(
            catch_event.behavior,
            Some(Behavior::IntermediateCatchEvent { after_event_based_gateway: true })
        ));
    }

    // The gateway's own flows do not become transitions.
    assert!(gateway.outgoing.is_empty());
    assert!(process.find_transition("toTimer").is_none());
    assert!(process.find_transition("afterTimer").is_some());

    assert!(gateway.scope.timer_declarations.contains_key("timeout"));
    assert!(gateway.scope.event_subscriptions.contains_key("reply"));
}

#[test]
fn test_event_based_gateway_to_task() {
    let errors = compile_errors(&event_based(
        r#"<userTask id="review"/>
           <sequenceFlow id="toTask" sourceRef="gw" targetRef="review"/>"#,
    ));
    assert_error_containing(
        &errors,
        "Event based gateway can only be connected to elements of type intermediateCatchEvent",
    );
}

#[test]
fn test_event_based_gateway_rejects_async_after() {
    let xml = event_based("").replace(
        r#"<eventBasedGateway id="gw"/>"#,
        r#"<eventBasedGateway id="gw" operaton:asyncAfter="true"/>"#,
    );
    let errors = compile_errors(&xml);
    assert_error_containing(&errors, "'asyncAfter' not supported for eventBasedGateway elements.");
}

#[test]
fn test_link_catch_after_event_based_gateway() {
    let errors = compile_errors(&event_based(
        r#"<sequenceFlow id="toLink" sourceRef="gw" targetRef="landing"/>
           <intermediateCatchEvent id="landing">
             <linkEventDefinition name="jump"/>
           </intermediateCatchEvent>"#,
    ));
    assert_error_containing(&errors, "IntermediateCatchLinkEvent is not allowed after an EventBasedGateway.");
}
