use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::ExplorerApp;
use super::super::style::segment_distance_sq;

const LINK_HOVER_TOLERANCE: f32 = 6.0;

impl ExplorerApp {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.camera.zoom_at(rect, pointer, zoom_factor);
    }

    /// Secondary or middle drag pans; so does a primary drag that did not start on a node.
    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        let background_drag =
            response.dragged_by(egui::PointerButton::Primary) && self.dragging.is_none();
        if background_drag
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.camera.pan_by(response.drag_delta());
        }
    }

    /// Dragging a node pins it under the pointer.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        response: &egui::Response,
        rect: Rect,
        hovered: Option<usize>,
    ) -> bool {
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.dragging = hovered;
        }

        let Some(index) = self.dragging else {
            return false;
        };

        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.layout
                .pin_at(index, self.camera.screen_to_world(rect, pointer));
        }
        if response.drag_stopped() {
            self.dragging = None;
        }
        true
    }
}

/// Closest node whose disc contains `pointer`.
pub(super) fn hovered_index(pointer: Pos2, screen_positions: &[Pos2], screen_radii: &[f32]) -> Option<usize> {
    screen_positions
        .iter()
        .zip(screen_radii)
        .enumerate()
        .filter_map(|(index, (position, radius))| {
            let distance = position.distance(pointer);
            (distance <= *radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Closest link segment within a few pixels of `pointer`. Segments are
/// `(link index, from node, to node)`.
pub(super) fn hovered_link(
    pointer: Pos2,
    screen_positions: &[Pos2],
    segments: &[(usize, usize, usize)],
) -> Option<usize> {
    let tolerance_sq = LINK_HOVER_TOLERANCE * LINK_HOVER_TOLERANCE;
    segments
        .iter()
        .filter_map(|&(link, from, to)| {
            let start = *screen_positions.get(from)?;
            let end = *screen_positions.get(to)?;
            let distance_sq = segment_distance_sq(pointer, start, end);
            (distance_sq <= tolerance_sq).then_some((link, distance_sq))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(link, _)| link)
}
