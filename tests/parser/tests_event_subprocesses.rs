#![allow(clippy::unwrap_used)]

//! Event subprocesses: start event triggers, interruption and the handlers
//! they register on their enclosing scope.

use bpmn::base::ScopeId;
use bpmn::model::{ActivityStartBehavior, ActivityType, Behavior, EventType, TimerJobHandler};
use rstest::rstest;

use crate::helpers::*;

// ============================================================================
// HELPERS
// ============================================================================

const DECLARATIONS: &str = r#"
    <message id="cancel" name="cancel order"/>
    <signal id="alert" name="alert"/>
    <error id="failure" errorCode="E42"/>
    <escalation id="late" escalationCode="LATE"/>
"#;

/// A process with a main path and an event subprocess `handler` whose start
/// event `trigger` carries `definition`.
fn event_sub_process(start_attributes: &str, definition: &str) -> String {
    process_with(
        DECLARATIONS,
        &format!(
            r#"<startEvent id="start"/>
               <userTask id="work"/>
               <sequenceFlow id="f1" sourceRef="start" targetRef="work"/>
               <subProcess id="handler" triggeredByEvent="true">
                 <startEvent id="trigger" {start_attributes}>{definition}</startEvent>
                 <endEvent id="handled"/>
                 <sequenceFlow id="h1" sourceRef="trigger" targetRef="handled"/>
               </subProcess>"#
        ),
    )
}

// ============================================================================
// STRUCTURE
// ============================================================================

#[test]
fn test_event_subprocess_structure() {
    let process = compile_process(&event_sub_process(
        r#"isInterrupting="true""#,
        r#"<messageEventDefinition messageRef="cancel"/>"#,
    ));

    let handler_id = process.find_activity("handler").unwrap();
    let handler = process.activity(handler_id);
    assert!(handler.triggered_by_event);
    assert!(handler.is_sub_process_scope);
    assert!(handler.is_scope);
    assert!(!handler.consumes_compensation);
    assert!(matches!(handler.behavior, Some(Behavior::EventSubProcess)));
    assert_eq!(handler.event_scope, Some(ScopeId::Process));
    assert_eq!(handler.start_behavior, ActivityStartBehavior::InterruptEventScope);

    let trigger = process.activity_by_id("trigger").unwrap();
    assert_eq!(trigger.flow_scope, ScopeId::Activity(handler_id));
    assert_eq!(trigger.event_scope, Some(ScopeId::Process));
    assert!(matches!(trigger.behavior, Some(Behavior::EventSubProcessStart)));

    // The process keeps its own initial; the trigger is the handler's.
    assert_eq!(process.initial().map(|a| a.id()), Some("start"));
    assert_eq!(
        process.scope(ScopeId::Activity(handler_id)).initial,
        process.find_activity("trigger")
    );
}

#[rstest]
#[case::interrupting(r#"isInterrupting="true""#, ActivityStartBehavior::InterruptEventScope)]
#[case::non_interrupting(r#"isInterrupting="false""#, ActivityStartBehavior::ConcurrentInFlowScope)]
#[case::unspecified("", ActivityStartBehavior::InterruptEventScope)]
fn test_interrupting_attribute(#[case] attributes: &str, #[case] expected: ActivityStartBehavior) {
    let process = compile_process(&event_sub_process(
        attributes,
        r#"<signalEventDefinition signalRef="alert"/>"#,
    ));
    assert_eq!(process.activity_by_id("handler").unwrap().start_behavior, expected);
}

#[rstest]
#[case::incoming(r#"<sequenceFlow id="bad" sourceRef="work" targetRef="handler"/>"#, "Invalid incoming sequence flow of event subprocess")]
#[case::outgoing(r#"<sequenceFlow id="bad" sourceRef="handler" targetRef="work"/>"#, "Invalid outgoing sequence flow of event subprocess")]
fn test_event_subprocess_rejects_sequence_flows(#[case] flow: &str, #[case] message: &str) {
    let xml = event_sub_process("", r#"<signalEventDefinition signalRef="alert"/>"#)
        .replace("</process>", &format!("{flow}</process>"));
    let errors = compile_errors(&xml);
    assert_error_containing(&errors, message);
}

#[test]
fn test_start_event_without_trigger() {
    let errors = compile_errors(&event_sub_process("", ""));
    assert_error_containing(
        &errors,
        "start event of event subprocess must be of type 'error', 'message', 'timer', 'signal', 'compensation' or 'escalation'",
    );
}

// ============================================================================
// TRIGGERS
// ============================================================================

#[rstest]
#[case::message(r#"<messageEventDefinition messageRef="cancel"/>"#, EventType::Message, ActivityType::StartEventMessage)]
#[case::signal(r#"<signalEventDefinition signalRef="alert"/>"#, EventType::Signal, ActivityType::StartEventSignal)]
fn test_subscription_on_enclosing_scope(
    #[case] definition: &str,
    #[case] event_type: EventType,
    #[case] activity_type: ActivityType,
) {
    let process = compile_process(&event_sub_process(r#"isInterrupting="false""#, definition));

    let subscription = process.scope.event_subscriptions.get("trigger").unwrap();
    assert_eq!(subscription.event_type, event_type);
    assert!(!subscription.start_event);
    assert_eq!(subscription.event_scope_activity_id.as_deref(), Some("p"));
    assert_eq!(process.activity_by_id("trigger").unwrap().activity_type, activity_type);
}

#[test]
fn test_timer_trigger() {
    let output = compile(&event_sub_process(
        r#"isInterrupting="false""#,
        "<timerEventDefinition><timeDuration>PT15M</timeDuration></timerEventDefinition>",
    ));
    let process = output.process("p").unwrap();

    let timer = process.scope.timer_declarations.get("trigger").unwrap();
    assert_eq!(timer.job_handler, TimerJobHandler::StartEventSubprocess);
    assert_eq!(timer.raw_configuration, "handler");
    assert_eq!(timer.event_scope_activity_id.as_deref(), Some("p"));
    assert!(!timer.interrupting);
    assert_eq!(process.activity_by_id("trigger").unwrap().activity_type, ActivityType::StartEventTimer);
    assert!(output.job_declarations_of("p").iter().any(|job| job.activity_id() == "trigger"));
}

#[test]
fn test_interrupting_timer_trigger_with_cycle_warns() {
    let warnings = compile_warnings(&event_sub_process(
        r#"isInterrupting="true""#,
        "<timerEventDefinition><timeCycle>R/PT1H</timeCycle></timerEventDefinition>",
    ));
    assert_error_containing(
        &warnings,
        "It is not recommended to use a interrupting start timer event with a time cycle.",
    );
}

#[test]
fn test_error_trigger_outranks_boundary_events() {
    let xml = event_sub_process(
        r#"isInterrupting="true""#,
        r#"<errorEventDefinition errorRef="failure"/>"#,
    );
    let process = compile_process(&xml);

    let definitions = &process.scope.error_event_definitions;
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].handler_activity_id, "handler");
    assert_eq!(definitions[0].error_code.as_deref(), Some("E42"));
    assert!(definitions[0].precedence > 0);
    assert_eq!(process.activity_by_id("trigger").unwrap().activity_type, ActivityType::StartEventError);
}

#[test]
fn test_error_trigger_interrupts_by_default() {
    let process = compile_process(&event_sub_process("", r#"<errorEventDefinition errorRef="failure"/>"#));
    let handler = process.activity_by_id("handler").unwrap();
    assert_eq!(handler.start_behavior, ActivityStartBehavior::InterruptEventScope);
    assert_eq!(
        process.activity_by_id("trigger").unwrap().activity_type,
        ActivityType::StartEventError
    );
}

#[test]
fn test_non_interrupting_error_trigger() {
    let errors = compile_errors(&event_sub_process(
        r#"isInterrupting="false""#,
        r#"<errorEventDefinition errorRef="failure"/>"#,
    ));
    assert_error_containing(&errors, "error start event of event subprocess must be interrupting");
}

#[test]
fn test_escalation_trigger() {
    let process = compile_process(&event_sub_process(
        r#"isInterrupting="false""#,
        r#"<escalationEventDefinition escalationRef="late"/>"#,
    ));
    let definition = &process.scope.escalation_event_definitions[0];
    assert_eq!(definition.handler_activity_id, "handler");
    assert!(definition.handler_is_sub_process);
    assert!(!definition.cancel_activity);
    assert_eq!(definition.escalation_code.as_deref(), Some("LATE"));
}

#[test]
fn test_conditional_trigger() {
    let process = compile_process(&event_sub_process(
        r#"isInterrupting="true""#,
        "<conditionalEventDefinition><condition>${overdue}</condition></conditionalEventDefinition>",
    ));
    let trigger = process.activity_by_id("trigger").unwrap();
    assert_eq!(trigger.activity_type, ActivityType::StartEventConditional);
    let Some(Behavior::EventSubProcessStartConditional(conditional)) = &trigger.behavior else {
        panic!("expected a conditional start behavior, got {:?}", trigger.behavior);
    };
    assert!(conditional.interrupting);
    assert!(process.scope.event_subscriptions.contains_key("trigger"));
}

#[test]
fn test_two_event_subprocesses_with_the_same_message() {
    let xml = process_with(
        DECLARATIONS,
        r#"<startEvent id="start"/>
           <subProcess id="first" triggeredByEvent="true">
             <startEvent id="a"><messageEventDefinition messageRef="cancel"/></startEvent>
           </subProcess>
           <subProcess id="second" triggeredByEvent="true">
             <startEvent id="b"><messageEventDefinition messageRef="cancel"/></startEvent>
           </subProcess>"#,
    );
    let errors = compile_errors(&xml);
    assert_error_containing(
        &errors,
        "Cannot have more than one message event subscription with name 'cancel order' for scope 'p'",
    );
}

// ============================================================================
// COMPENSATION
// ============================================================================

#[test]
fn test_compensation_event_subprocess_in_embedded_subprocess() {
    let process = compile_process(&process(
        r#"<startEvent id="start"/>
           <subProcess id="booking">
             <startEvent id="bookingStart"/>
             <subProcess id="undoBooking" triggeredByEvent="true">
               <startEvent id="compensationStart"><compensateEventDefinition/></startEvent>
             </subProcess>
           </subProcess>"#,
    ));

    let handler = process.find_activity("undoBooking").unwrap();
    assert!(process.activity(handler).is_for_compensation);
    assert_eq!(process.activity_by_id("booking").unwrap().compensation_handler, Some(handler));
    assert_eq!(
        process.activity_by_id("compensationStart").unwrap().activity_type,
        ActivityType::StartEventCompensation
    );
}

#[test]
fn test_compensation_event_subprocess_on_process_level() {
    let errors = compile_errors(&event_sub_process("", "<compensateEventDefinition/>"));
    assert_error_containing(
        &errors,
        "event subprocess with compensation start event is only supported for embedded subprocess",
    );
}

#[test]
fn test_two_compensation_event_subprocesses() {
    let errors = compile_errors(&process(
        r#"<startEvent id="start"/>
           <subProcess id="booking">
             <startEvent id="bookingStart"/>
             <subProcess id="undoA" triggeredByEvent="true">
               <startEvent id="a"><compensateEventDefinition/></startEvent>
             </subProcess>
             <subProcess id="undoB" triggeredByEvent="true">
               <startEvent id="b"><compensateEventDefinition/></startEvent>
             </subProcess>
           </subProcess>"#,
    ));
    assert_error_containing(
        &errors,
        "multiple event subprocesses with compensation start event are not supported on the same scope",
    );
}
