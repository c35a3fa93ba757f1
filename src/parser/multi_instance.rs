//! Multi-instance bodies.

use smol_str::SmolStr;
use tracing::debug;

use super::util::parse_boolean_or;
use super::{BpmnParse, ParseResult, notify};
use crate::base::constants::MULTI_INSTANCE_BODY_ID_SUFFIX;
use crate::base::{ActivityId, ScopeId};
use crate::diagnostics::codes;
use crate::model::{ActivityType, Behavior, MultiInstanceBehavior};
use crate::xml::{Element, VENDOR_NS};

/// Id of the body wrapping the activity `id`.
pub fn multi_instance_body_id(id: &str) -> String {
    format!("{id}{MULTI_INSTANCE_BODY_ID_SUFFIX}")
}

impl BpmnParse<'_> {
    /// Create the body for an element with `multiInstanceLoopCharacteristics`.
    ///
    /// The body takes the element's place in `scope`; the activity itself is
    /// created inside it afterwards.
    pub(super) fn parse_multi_instance_loop_characteristics(
        &mut self,
        element: &Element,
        scope: ScopeId,
    ) -> ParseResult<Option<ActivityId>> {
        let Some(characteristics) = element.element("multiInstanceLoopCharacteristics") else {
            return Ok(None);
        };
        let activity_id = element.attribute_or("id", "");
        debug!(kind = "mi body for activity", id = activity_id, "parsing element");

        let id = multi_instance_body_id(activity_id);
        let body = self
            .process
            .create_activity(scope, id.as_str(), ActivityType::MultiInstanceBody)?;

        let mut behavior = MultiInstanceBehavior {
            sequential: parse_boolean_or(characteristics.attribute("isSequential"), false)
                .unwrap_or(false),
            ..MultiInstanceBehavior::default()
        };

        if let Some(cardinality) = characteristics.element("loopCardinality") {
            if cardinality.text().is_empty() {
                self.diagnostics.error(
                    codes::INVALID_MULTI_INSTANCE,
                    "loopCardinality must be defined for a multiInstanceLoopCharacteristics definition",
                    characteristics,
                    &[id.as_str()],
                );
            }
            behavior.loop_cardinality = Some(self.expressions.create_expression(cardinality.text()));
        }

        if let Some(condition) = characteristics.element("completionCondition") {
            behavior.completion_condition = Some(self.expressions.create_expression(condition.text()));
        }

        let collections = [
            characteristics.attribute_ns(&VENDOR_NS, "collection"),
            characteristics.element("loopDataInputRef").map(Element::text),
        ];
        for collection in collections.into_iter().flatten() {
            if collection.contains('{') {
                behavior.collection_expression = Some(self.expressions.create_expression(collection));
            } else {
                behavior.collection_variable = Some(SmolStr::new(collection));
            }
        }

        if let Some(variable) = characteristics.attribute_ns(&VENDOR_NS, "elementVariable") {
            behavior.element_variable = Some(SmolStr::new(variable));
        }
        if let Some(item) = characteristics.element("inputDataItem") {
            behavior.element_variable = item.attribute("name").map(SmolStr::new);
        }

        if behavior.loop_cardinality.is_none() && !behavior.has_collection() {
            self.diagnostics.error(
                codes::INVALID_MULTI_INSTANCE,
                "Either loopCardinality or loopDataInputRef/activiti:collection must be set",
                characteristics,
                &[id.as_str()],
            );
        }
        if !behavior.has_collection() && behavior.element_variable.is_some() {
            self.diagnostics.error(
                codes::INVALID_MULTI_INSTANCE,
                "LoopDataInputRef/activiti:collection must be set when using inputDataItem or activiti:elementVariable",
                characteristics,
                &[id.as_str()],
            );
        }

        {
            let activity = self.process.activity_mut(body);
            activity.is_scope = true;
            activity.line = element.line();
            activity.behavior = Some(Behavior::MultiInstance(behavior));
        }

        notify!(self.parse_multi_instance_loop_characteristics(element, characteristics, body));
        Ok(Some(body))
    }
}
