//! The phases of one scope level, and compensation wiring through
//! associations.

use indexmap::IndexMap;
use tracing::trace;

use super::{BpmnParse, ParseResult};
use crate::base::{ActivityId, ScopeId};
use crate::diagnostics::codes;
use crate::model::ActivityType;
use crate::xml::Element;

impl BpmnParse<'_> {
    /// Populate `scope` from the children of `element`.
    ///
    /// The phase order is fixed: later phases look up activities created by
    /// earlier ones.
    pub(super) fn parse_scope(&mut self, element: &Element, scope: ScopeId) -> ParseResult {
        let mut catch_events = Vec::new();
        let mut handlers: IndexMap<&str, &Element> = IndexMap::new();
        let mut activities = Vec::new();
        for child in element.children() {
            if child.tag() == "intermediateCatchEvent" {
                catch_events.push(child);
            } else if is_compensation_handler(child) {
                handlers.insert(child.attribute_or("id", ""), child);
            } else {
                activities.push(child);
            }
        }

        trace!(scope = self.process.scope_element_id(scope), "start events");
        self.parse_start_events(element, scope)?;

        for child in activities {
            self.parse_activity(child, Some(element), scope)?;
        }

        for catch_event in catch_events {
            let id = catch_event.attribute_or("id", "");
            if self.process.find_activity_in_scope(scope, id).is_none() {
                if let Some(activity) = self.parse_intermediate_catch_event(catch_event, scope, None)? {
                    self.parse_activity_input_output(catch_event, activity)?;
                }
            }
        }

        self.parse_end_events(element, scope)?;
        self.parse_boundary_events(element, scope)?;
        self.parse_sequence_flows(element, scope, &handlers)?;
        self.parse_execution_listeners_on_scope(element, scope);
        self.parse_associations(element, scope, &mut handlers)?;

        for handler in handlers.into_values() {
            self.parse_activity(handler, None, scope)?;
        }

        self.drain_backlog(scope);

        if scope == ScopeId::Process {
            self.parse_start_authorization(element);
        }
        Ok(())
    }

    fn parse_associations<'e>(
        &mut self,
        element: &Element,
        scope: ScopeId,
        handlers: &mut IndexMap<&'e str, &'e Element>,
    ) -> ParseResult {
        for association in element.elements("association") {
            let source_ref = association.attribute("sourceRef");
            if source_ref.is_none() {
                self.diagnostics.error(
                    codes::INVALID_ASSOCIATION,
                    "association element missing attribute 'sourceRef'",
                    association,
                    &[],
                );
            }
            let target_ref = association.attribute("targetRef");
            if target_ref.is_none() {
                self.diagnostics.error(
                    codes::INVALID_ASSOCIATION,
                    "association element missing attribute 'targetRef'",
                    association,
                    &[],
                );
            }
            let (Some(source_ref), Some(target_ref)) = (source_ref, target_ref) else {
                continue;
            };

            let source = self.process.find_activity_in_scope(scope, source_ref);
            let mut target = self.process.find_activity_in_scope(scope, target_ref);

            // Associations may point at text annotations and other non-activities.
            if source.is_none() && !self.element_ids.contains(source_ref) {
                self.diagnostics.error(
                    codes::INVALID_ASSOCIATION,
                    format!("Invalid reference sourceRef '{source_ref}' of association element"),
                    association,
                    &[],
                );
                continue;
            }
            if target.is_none() && !self.element_ids.contains(target_ref) {
                self.diagnostics.error(
                    codes::INVALID_ASSOCIATION,
                    format!("Invalid reference targetRef '{target_ref}' of association element"),
                    association,
                    &[],
                );
                continue;
            }

            let Some(source) = source else {
                continue;
            };
            if self.process.activity(source).activity_type != ActivityType::BoundaryCompensation {
                continue;
            }

            if target.is_none() {
                if let Some(handler) = handlers.shift_remove(target_ref) {
                    target = self.parse_compensation_handler(scope, source, handler)?;
                }
            }
            if let Some(target) = target {
                self.wire_compensation_boundary(association, source, target);
            }
        }
        Ok(())
    }

    /// Parse a handler referenced by a compensation boundary event. Handlers of
    /// a multi-instance activity live in its body.
    fn parse_compensation_handler(
        &mut self,
        scope: ScopeId,
        boundary: ActivityId,
        handler: &Element,
    ) -> ParseResult<Option<ActivityId>> {
        let host = self
            .process
            .activity(boundary)
            .event_scope
            .and_then(|event_scope| event_scope.activity());
        let handler_scope = match host {
            Some(host) if self.process.activity(host).is_multi_instance => {
                self.process.activity(host).flow_scope
            }
            _ => scope,
        };

        let activity = self.parse_activity(handler, None, handler_scope)?;
        if let Some(activity) = activity {
            self.process.activity_mut(activity).compensation_boundary = Some(boundary);
        }
        Ok(activity)
    }

    fn wire_compensation_boundary(&mut self, association: &Element, boundary: ActivityId, target: ActivityId) {
        let boundary_id = self.process.activity(boundary).id.clone();
        let target_activity = self.process.activity(target);
        if !target_activity.is_compensation_handler() {
            self.diagnostics.error(
                codes::INVALID_COMPENSATION,
                "compensation boundary catch must be connected to element with isForCompensation=true",
                association,
                &[boundary_id.as_str(), target_activity.id()],
            );
            return;
        }

        let Some(compensated) = self
            .process
            .activity(boundary)
            .event_scope
            .and_then(|event_scope| event_scope.activity())
        else {
            return;
        };
        let existing = self.process.activity(compensated).compensation_handler;
        if existing.is_some_and(|handler| self.process.activity(handler).is_sub_process_scope) {
            let compensated_id = self.process.activity(compensated).id.clone();
            self.diagnostics.error(
                codes::INVALID_COMPENSATION,
                "compensation boundary event and event subprocess with compensation start event are not supported on the same scope",
                association,
                &[compensated_id.as_str(), boundary_id.as_str()],
            );
        } else {
            self.process.activity_mut(compensated).compensation_handler = Some(target);
        }
    }
}

pub(super) fn is_compensation_handler(element: &Element) -> bool {
    element
        .attribute("isForCompensation")
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
}
