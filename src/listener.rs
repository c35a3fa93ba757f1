//! Parse listener hooks.
//!
//! A [`ParseListener`] observes the graph while it is built. Every callback
//! runs right after its construct is complete and receives the originating
//! element together with the partially built [`ProcessDefinition`], so a
//! listener can inspect or replace what the compiler produced (for example
//! install a different behavior). Validation that depends on the behavior
//! runs after the callbacks.
//!
//! All methods default to no-ops; implement only what you need.

use thiserror::Error;

use crate::base::{ActivityId, ScopeId, TransitionId};
use crate::model::{ConditionalEventDefinition, ProcessDefinition};
use crate::xml::Element;

/// A listener callback failed; compilation is aborted.
#[derive(Debug, Error)]
#[error("parse listener failed: {message}")]
pub struct ListenerError {
    pub message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type ListenerResult = Result<(), ListenerError>;

/// Callbacks invoked while a document is compiled.
///
/// Activity callbacks receive the element, the scope the activity was
/// created in and the activity itself.
#[allow(unused_variables)]
pub trait ParseListener {
    // ------------------------------------------------------------------------
    // Document and process
    // ------------------------------------------------------------------------

    /// After every process of the document is compiled.
    fn parse_root_element(
        &mut self,
        root: &Element,
        processes: &mut [ProcessDefinition],
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_process(&mut self, element: &Element, process: &mut ProcessDefinition) -> ListenerResult {
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    fn parse_start_event(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_boundary_event(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_intermediate_catch_event(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_intermediate_throw_event(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_end_event(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Event definitions
    // ------------------------------------------------------------------------

    fn parse_boundary_timer_event_definition(
        &mut self,
        definition: &Element,
        interrupting: bool,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_boundary_error_event_definition(
        &mut self,
        definition: &Element,
        interrupting: bool,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_boundary_signal_event_definition(
        &mut self,
        definition: &Element,
        interrupting: bool,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_boundary_message_event_definition(
        &mut self,
        definition: &Element,
        interrupting: bool,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_boundary_escalation_event_definition(
        &mut self,
        definition: &Element,
        interrupting: bool,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_boundary_conditional_event_definition(
        &mut self,
        definition: &Element,
        interrupting: bool,
        activity: ActivityId,
        conditional: &ConditionalEventDefinition,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_intermediate_timer_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_intermediate_signal_catch_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_intermediate_message_catch_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_intermediate_conditional_event_definition(
        &mut self,
        definition: &Element,
        activity: ActivityId,
        conditional: &ConditionalEventDefinition,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_conditional_start_event_for_event_subprocess(
        &mut self,
        definition: &Element,
        activity: ActivityId,
        conditional: &ConditionalEventDefinition,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Gateways
    // ------------------------------------------------------------------------

    fn parse_exclusive_gateway(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_inclusive_gateway(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_parallel_gateway(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_event_based_gateway(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------------

    fn parse_task(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_manual_task(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_script_task(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_service_task(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_business_rule_task(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_user_task(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_send_task(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_receive_task(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Sub-processes and calls
    // ------------------------------------------------------------------------

    fn parse_sub_process(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_transaction(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_call_activity(
        &mut self,
        element: &Element,
        scope: ScopeId,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_multi_instance_loop_characteristics(
        &mut self,
        element: &Element,
        characteristics: &Element,
        body: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Flows, properties, mappings
    // ------------------------------------------------------------------------

    fn parse_sequence_flow(
        &mut self,
        element: &Element,
        scope: ScopeId,
        transition: TransitionId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_property(
        &mut self,
        element: &Element,
        scope: ScopeId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }

    fn parse_io_mapping(
        &mut self,
        element: &Element,
        activity: ActivityId,
        process: &mut ProcessDefinition,
    ) -> ListenerResult {
        Ok(())
    }
}
