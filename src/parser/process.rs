//! Process level: executable processes, collaboration, lanes, start
//! authorization and the checks that need the complete graph.

use smol_str::SmolStr;
use tracing::{debug, info};

use super::util::{GROUP_PREFIX, USER_PREFIX, assignment_id, parse_documentation, split_comma_separated};
use super::{BpmnParse, ParseResult, notify};
use crate::base::{ActivityId, ScopeId};
use crate::diagnostics::{Diagnostic, DiagnosticCollector, codes};
use crate::model::{Behavior, Lane, LaneSet, ParticipantProcess, ProcessDefinition};
use crate::xml::{Element, VENDOR_NS};

impl BpmnParse<'_> {
    /// Compile every executable `process` of the document.
    pub(super) fn parse_process_definitions(&mut self, root: &Element) -> ParseResult {
        for element in root.elements("process") {
            let id = element.attribute_or("id", "");
            let executable = match element.attribute("isExecutable") {
                Some(value) => {
                    let executable = value.eq_ignore_ascii_case("true");
                    if !executable {
                        info!(process = id, "ignoring non-executable process");
                    }
                    executable
                }
                None => {
                    info!(process = id, "process has no 'isExecutable' attribute");
                    !self.options.deployment_is_new
                }
            };

            if executable {
                let process = self.parse_process(element)?;
                self.processes.push(process);
            }
        }
        Ok(())
    }

    /// Attach participants of the first collaboration to their processes.
    pub(super) fn parse_collaboration(&mut self, root: &Element) {
        let Some(collaboration) = root.element("collaboration") else {
            return;
        };
        for participant in collaboration.elements("participant") {
            let Some(process_ref) = participant.attribute("processRef") else {
                continue;
            };
            let Some(process) = self.processes.iter_mut().find(|p| p.key == process_ref) else {
                continue;
            };
            let id = SmolStr::new(participant.attribute_or("id", ""));
            process.participant = Some(ParticipantProcess {
                id: id.clone(),
                name: participant.attribute("name").map(SmolStr::new),
                bounds: None,
            });
            self.participant_processes.insert(id, SmolStr::new(process_ref));
        }
    }

    fn parse_process(&mut self, element: &Element) -> ParseResult<ProcessDefinition> {
        let key = element.attribute_or("id", "");
        self.process = ProcessDefinition::new(key);
        self.link_sources.clear();
        self.link_targets.clear();
        self.backlog.clear();

        self.process.name = element.attribute("name").map(SmolStr::new);
        self.process.category = self.registry.target_namespace.clone();
        self.process.documentation = parse_documentation(element);
        self.process.job_priority = self.parse_priority(element, "jobPriority");
        self.process.task_priority = self.parse_priority(element, "taskPriority");
        self.process.version_tag = element
            .attribute_ns(&VENDOR_NS, "versionTag")
            .map(SmolStr::new);
        self.process.history_time_to_live = self.parse_history_time_to_live(element);
        self.process.startable_in_tasklist = element
            .attribute_ns_or(&VENDOR_NS, "isStartableInTasklist", "true")
            .eq_ignore_ascii_case("true");

        debug!(kind = "process", id = key, "parsing element");
        self.parse_scope(element, ScopeId::Process)?;
        self.parse_lane_sets(element);

        notify!(self.parse_process(element));

        validate_activities(&self.process, &mut self.diagnostics);

        Ok(std::mem::replace(&mut self.process, ProcessDefinition::new("")))
    }

    /// `historyTimeToLive` in days, either plain or as `P<n>D`.
    fn parse_history_time_to_live(&mut self, element: &Element) -> Option<u32> {
        let key = element.attribute_or("id", "");
        let value = element
            .attribute_ns(&VENDOR_NS, "historyTimeToLive")
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let Some(value) = value else {
            if self.options.enforce_history_time_to_live && self.options.deployment_is_new {
                self.diagnostics.error(
                    codes::HISTORY_TIME_TO_LIVE,
                    "History Time To Live (TTL) cannot be null. TTL is necessary for the History Cleanup to work.",
                    element,
                    &[key],
                );
            }
            return None;
        };

        let days = value
            .strip_prefix('P')
            .and_then(|rest| rest.strip_suffix('D'))
            .unwrap_or(value);
        match days.parse::<i64>() {
            Ok(days) if days < 0 => {
                self.diagnostics.error(
                    codes::HISTORY_TIME_TO_LIVE,
                    "Cannot parse historyTimeToLive: negative value is not allowed",
                    element,
                    &[key],
                );
                None
            }
            Ok(days) => match u32::try_from(days) {
                Ok(days) => Some(days),
                Err(_) => {
                    self.diagnostics.error(
                        codes::HISTORY_TIME_TO_LIVE,
                        format!("Cannot parse historyTimeToLive: {value}"),
                        element,
                        &[key],
                    );
                    None
                }
            },
            Err(_) => {
                self.diagnostics.error(
                    codes::HISTORY_TIME_TO_LIVE,
                    format!("Cannot parse historyTimeToLive: {value}"),
                    element,
                    &[key],
                );
                None
            }
        }
    }

    fn parse_lane_sets(&mut self, element: &Element) {
        for lane_set_element in element.elements("laneSet") {
            let lanes = lane_set_element
                .elements("lane")
                .map(|lane| Lane {
                    id: lane.attribute("id").map(SmolStr::new),
                    name: lane.attribute("name").map(SmolStr::new),
                    flow_node_ids: lane
                        .elements("flowNodeRef")
                        .map(|node| SmolStr::new(node.text()))
                        .collect(),
                    bounds: None,
                })
                .collect();
            self.process.lane_sets.push(LaneSet {
                id: lane_set_element.attribute("id").map(SmolStr::new),
                name: lane_set_element.attribute("name").map(SmolStr::new),
                lanes,
            });
        }
    }

    /// Candidate starters of the process.
    pub(super) fn parse_start_authorization(&mut self, element: &Element) {
        if let Some(extensions) = element.extension_elements() {
            for starter in extensions.elements_ns(&VENDOR_NS, "potentialStarter") {
                let text = starter
                    .element("resourceAssignmentExpression")
                    .and_then(|assignment| assignment.element("formalExpression"))
                    .map(Element::text);
                let Some(text) = text else {
                    continue;
                };
                for entry in split_comma_separated(text) {
                    if entry.starts_with(USER_PREFIX) {
                        let user = self
                            .expressions
                            .create_expression(assignment_id(&entry, USER_PREFIX));
                        self.process.candidate_starter_users.push(user);
                    } else if entry.starts_with(GROUP_PREFIX) {
                        let group = self
                            .expressions
                            .create_expression(assignment_id(&entry, GROUP_PREFIX));
                        self.process.candidate_starter_groups.push(group);
                    } else {
                        let group = self.expressions.create_expression(&entry);
                        self.process.candidate_starter_groups.push(group);
                    }
                }
            }
        }

        if let Some(users) = element.attribute_ns(&VENDOR_NS, "candidateStarterUsers") {
            for user in split_comma_separated(users) {
                let user = self.expressions.create_expression(user.trim());
                self.process.candidate_starter_users.push(user);
            }
        }
        if let Some(groups) = element.attribute_ns(&VENDOR_NS, "candidateStarterGroups") {
            for group in split_comma_separated(groups) {
                let group = self.expressions.create_expression(group.trim());
                self.process.candidate_starter_groups.push(group);
            }
        }
    }
}

// ============================================================================
// GRAPH VALIDATION
// ============================================================================

/// Checks that run once the whole process, listeners included, is built.
fn validate_activities(process: &ProcessDefinition, diagnostics: &mut DiagnosticCollector) {
    for (id, activity) in process.activities() {
        if matches!(activity.behavior, Some(Behavior::ExclusiveGateway)) {
            validate_exclusive_gateway(process, id, diagnostics);
        }
        if activity.async_after {
            for _ in process.outgoing(id).filter(|flow| flow.id.is_none()) {
                diagnostics.add(
                    Diagnostic::error(format!(
                        "Sequence flow with sourceRef='{0}' must have an id, activity with id '{0}' uses 'asyncAfter'.",
                        activity.id
                    ))
                    .with_code(codes::INVALID_ASYNC)
                    .with_line(activity.line)
                    .with_element_id(activity.id.clone()),
                );
            }
        }
    }
}

fn validate_exclusive_gateway(
    process: &ProcessDefinition,
    gateway: ActivityId,
    diagnostics: &mut DiagnosticCollector,
) {
    let activity = process.activity(gateway);
    let id = activity.id.as_str();
    let report = |diagnostic: Diagnostic, flow: Option<&str>| {
        diagnostic
            .with_code(codes::EXCLUSIVE_GATEWAY_FLOW)
            .with_line(activity.line)
            .with_element_id(id)
            .with_element_ids(flow)
    };

    let outgoing: Vec<_> = process.outgoing(gateway).collect();
    match outgoing.as_slice() {
        [] => diagnostics.add(report(
            Diagnostic::error(format!("Exclusive Gateway '{id}' has no outgoing sequence flows.")),
            None,
        )),
        [flow] => {
            if flow.condition.is_some() {
                let flow_id = flow.id.as_deref().unwrap_or("null");
                diagnostics.add(report(
                    Diagnostic::error(format!(
                        "Exclusive Gateway '{id}' has only one outgoing sequence flow ('{flow_id}'). This is not allowed to have a condition."
                    )),
                    flow.id.as_deref(),
                ));
            }
        }
        flows => {
            let default_flow = activity.default_flow.as_deref().filter(|d| !d.is_empty());
            let mut without_condition = Vec::new();

            for flow in flows {
                let is_default = flow.id.is_some() && flow.id.as_deref() == activity.default_flow.as_deref();
                let has_condition = flow.condition.is_some();
                if !has_condition && !is_default {
                    without_condition.push(*flow);
                }
                if has_condition && is_default {
                    let flow_id = flow.id.as_deref().unwrap_or("null");
                    diagnostics.add(report(
                        Diagnostic::error(format!(
                            "Exclusive Gateway '{id}' has outgoing sequence flow '{flow_id}' which is the default flow but has a condition too."
                        )),
                        flow.id.as_deref(),
                    ));
                }
            }

            if default_flow.is_some() || without_condition.len() > 1 {
                for flow in without_condition {
                    let flow_id = flow.id.as_deref().unwrap_or("null");
                    diagnostics.add(report(
                        Diagnostic::error(format!(
                            "Exclusive Gateway '{id}' has outgoing sequence flow '{flow_id}' without condition which is not the default flow."
                        )),
                        flow.id.as_deref(),
                    ));
                }
            } else if let [flow] = without_condition.as_slice() {
                let flow_id = flow.id.as_deref().unwrap_or("null");
                diagnostics.add(
                    report(
                        Diagnostic::warning(format!(
                            "Exclusive Gateway '{id}' has outgoing sequence flow '{flow_id}' without condition which is not the default flow. We assume it to be the default flow, but it is bad modeling practice, better set the default flow in your gateway."
                        )),
                        flow.id.as_deref(),
                    )
                    .with_code(codes::IMPLICIT_DEFAULT_FLOW),
                );
            }
        }
    }
}
