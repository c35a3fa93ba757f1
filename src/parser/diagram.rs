//! Diagram interchange: shape bounds and edge waypoints.
//!
//! Runs after every process of the document is compiled, so shapes and
//! edges can refer to any process, participant or lane.

use super::BpmnParse;
use super::util::parse_boolean;
use crate::base::TransitionId;
use crate::diagnostics::codes;
use crate::model::Bounds;
use crate::xml::{BPMN_DI, Element, OMG_DC, OMG_DI};

/// Value reported for a coordinate that is missing or not a number.
const INVALID_COORDINATE: f64 = -1.0;

impl BpmnParse<'_> {
    pub(super) fn parse_diagram_interchange(&mut self, root: &Element) {
        for diagram in root.elements_ns(&BPMN_DI, "BPMNDiagram") {
            if let Some(plane) = diagram.element_ns(&BPMN_DI, "BPMNPlane") {
                self.parse_plane(plane);
            }
        }
    }

    fn parse_plane(&mut self, plane: &Element) {
        let Some(bpmn_element) = plane.attribute("bpmnElement").filter(|id| !id.is_empty()) else {
            self.diagnostics.error(
                codes::INVALID_DIAGRAM,
                "'bpmnElement' attribute is required on BPMNPlane ",
                plane,
                &[],
            );
            return;
        };

        if let Some(process) = self.processes.iter_mut().find(|p| p.key == bpmn_element) {
            process.graphical_notation_defined = true;
        }
        for shape in plane.elements_ns(&BPMN_DI, "BPMNShape") {
            self.parse_shape(shape);
        }
        for edge in plane.elements_ns(&BPMN_DI, "BPMNEdge") {
            self.parse_edge(edge);
        }
    }

    fn parse_shape(&mut self, shape: &Element) {
        let Some(bpmn_element) = shape.attribute("bpmnElement").filter(|id| !id.is_empty()) else {
            self.diagnostics.error(
                codes::INVALID_DIAGRAM,
                "'bpmnElement' attribute is required on BPMNShape",
                shape,
                &[],
            );
            return;
        };

        // Participant shapes carry the bounds of the pool of their process.
        if let Some(process_key) = self.participant_processes.get(bpmn_element).cloned() {
            let bounds = self.parse_bounds(shape);
            if let Some(process) = self.processes.iter_mut().find(|p| p.key == process_key) {
                process.graphical_notation_defined = true;
                if let Some(participant) = process.participant.as_mut() {
                    participant.bounds = bounds;
                }
            }
            return;
        }

        let mut found = false;
        for index in 0..self.processes.len() {
            if let Some(activity) = self.processes[index].find_activity(bpmn_element) {
                found = true;
                let bounds = self.parse_bounds(shape);
                let is_expanded = shape.attribute("isExpanded").and_then(parse_boolean);
                let target = self.processes[index].activity_mut(activity);
                target.bounds = bounds;
                if is_expanded.is_some() {
                    target.is_expanded = is_expanded;
                }
                continue;
            }

            let has_lane = self.processes[index]
                .lane_sets
                .iter()
                .flat_map(|lane_set| &lane_set.lanes)
                .any(|lane| lane.id.as_deref() == Some(bpmn_element));
            if has_lane {
                found = true;
                let bounds = self.parse_bounds(shape);
                let lane = self.processes[index]
                    .lane_sets
                    .iter_mut()
                    .flat_map(|lane_set| lane_set.lanes.iter_mut())
                    .find(|lane| lane.id.as_deref() == Some(bpmn_element));
                if let Some(lane) = lane {
                    lane.bounds = bounds;
                }
            }
        }

        if !found && !self.element_ids.contains(bpmn_element) {
            self.diagnostics.error(
                codes::INVALID_DIAGRAM,
                format!("Invalid reference in 'bpmnElement' attribute, activity {bpmn_element} not found"),
                shape,
                &[],
            );
        }
    }

    fn parse_bounds(&mut self, shape: &Element) -> Option<Bounds> {
        let Some(bounds) = shape.element_ns(&OMG_DC, "Bounds") else {
            self.diagnostics.error(codes::INVALID_DIAGRAM, "'Bounds' element is required", shape, &[]);
            return None;
        };
        Some(Bounds {
            x: self.parse_coordinate(shape, "x", bounds.attribute("x")) as i32,
            y: self.parse_coordinate(shape, "y", bounds.attribute("y")) as i32,
            width: self.parse_coordinate(shape, "width", bounds.attribute("width")) as i32,
            height: self.parse_coordinate(shape, "height", bounds.attribute("height")) as i32,
        })
    }

    fn parse_edge(&mut self, edge: &Element) {
        let Some(flow_id) = edge.attribute("bpmnElement").filter(|id| !id.is_empty()) else {
            self.diagnostics.error(
                codes::INVALID_DIAGRAM,
                "'bpmnElement' attribute is required on BPMNEdge",
                edge,
                &[],
            );
            return;
        };

        let transition = self.processes.iter().enumerate().find_map(|(index, process)| {
            process
                .transitions()
                .iter()
                .position(|transition| transition.id.as_deref() == Some(flow_id))
                .map(|position| (index, position))
        });
        let Some((process_index, transition_index)) = transition else {
            if !self.element_ids.contains(flow_id) {
                self.diagnostics.error(
                    codes::INVALID_DIAGRAM,
                    format!("Invalid reference in 'bpmnElement' attribute, sequenceFlow {flow_id} not found"),
                    edge,
                    &[],
                );
            }
            return;
        };

        let waypoint_elements: Vec<&Element> = edge.elements_ns(&OMG_DI, "waypoint").collect();
        if waypoint_elements.len() < 2 {
            self.diagnostics.error(
                codes::INVALID_DIAGRAM,
                "Minimum 2 waypoint elements must be defined for a 'BPMNEdge'",
                edge,
                &[],
            );
            return;
        }

        let mut waypoints = Vec::with_capacity(waypoint_elements.len() * 2);
        for waypoint in waypoint_elements {
            waypoints.push(self.parse_coordinate(waypoint, "x", waypoint.attribute("x")) as i32);
            waypoints.push(self.parse_coordinate(waypoint, "y", waypoint.attribute("y")) as i32);
        }
        let transition_id = TransitionId::new(transition_index);
        self.processes[process_index].transition_mut(transition_id).waypoints = waypoints;
    }

    /// A required coordinate; reported and replaced by `-1` when invalid.
    fn parse_coordinate(&mut self, element: &Element, name: &str, text: Option<&str>) -> f64 {
        let Some(text) = text.filter(|text| !text.is_empty()) else {
            self.diagnostics
                .error(codes::INVALID_DIAGRAM, format!("{name} is required"), element, &[]);
            return INVALID_COORDINATE;
        };
        match text.trim().parse::<f64>() {
            Ok(value) => value,
            Err(error) => {
                self.diagnostics.error(
                    codes::INVALID_DIAGRAM,
                    format!("Cannot parse {name}: {error}"),
                    element,
                    &[],
                );
                INVALID_COORDINATE
            }
        }
    }
}
