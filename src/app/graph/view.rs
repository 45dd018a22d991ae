use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, Ui, Vec2, vec2};

use crate::chain::NetworkGraph;
use crate::util::{format_amount, node_caption, short_address};

use super::super::ExplorerApp;
use super::super::controller::ViewPhase;
use super::super::layout::{FOCUS_ZOOM, LayoutMode};
use super::super::style::{
    HOVER_COLOR, NodeEmphasis, dim_color, draw_background, link_color, link_width,
};
use super::interaction::{hovered_index, hovered_link};

fn screen_radius(world_radius: f32, zoom: f32) -> f32 {
    (world_radius * zoom.powf(0.40)).clamp(2.5, 40.0)
}

impl ExplorerApp {
    /// Resets the layout whenever the displayed graph or mode changed, or a tournament
    /// layout no longer matches the viewport.
    fn sync_layout(&mut self, graph: &NetworkGraph, viewport: Vec2) {
        let revision = self.controller.display_revision();
        let resized = self.layout.mode() == LayoutMode::Tournament
            && (viewport - self.viewport).length() > 1.0;
        self.viewport = viewport;

        if self.layout_revision == Some(revision) && !resized {
            return;
        }

        self.layout
            .reset(graph, self.controller.layout_mode(), viewport, &mut rand::rng());
        self.layout_revision = Some(revision);
        self.dragging = None;
    }

    /// Puts the searched address back in the middle of the view.
    pub(in crate::app) fn center_on_root(&mut self) {
        let Some(index) = self
            .controller
            .displayed_graph()
            .and_then(|graph| graph.source_index())
        else {
            return;
        };
        if let Some(position) = self.layout.positions().get(index).copied() {
            self.camera.zoom_to(FOCUS_ZOOM);
            self.camera.center_on(position);
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.camera.pan, self.camera.zoom);

        let Some(graph) = self.controller.displayed_graph().map(Arc::clone) else {
            self.draw_empty_state(&painter, rect);
            self.draw_loading_overlay(ui, &painter, rect);
            return;
        };

        self.sync_layout(&graph, rect.size());
        if self.layout.step() {
            ui.ctx().request_repaint();
        }
        if let Some(command) = self.layout.take_camera_command() {
            self.camera.apply(command, rect.size());
        }

        self.handle_graph_zoom(ui, rect, &response);

        let zoom = self.camera.zoom;
        let mut screen_positions: Vec<Pos2> = self
            .layout
            .positions()
            .iter()
            .map(|position| self.camera.world_to_screen(rect, *position))
            .collect();
        let screen_radii: Vec<f32> = graph
            .nodes
            .iter()
            .map(|node| screen_radius(NodeEmphasis::of(node, self.controller.interaction()).radius(), zoom))
            .collect();

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer));
        let hovered = self.dragging.or_else(|| {
            pointer.and_then(|pointer| hovered_index(pointer, &screen_positions, &screen_radii))
        });

        if self.handle_node_drag(&response, rect, hovered) {
            ui.ctx().request_repaint();
        }
        self.handle_graph_pan(&response);
        if response.dragged() {
            screen_positions = self
                .layout
                .positions()
                .iter()
                .map(|position| self.camera.world_to_screen(rect, *position))
                .collect();
        }

        self.controller
            .on_node_hover(hovered.and_then(|index| graph.nodes.get(index)).map(|node| node.id.as_str()));
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(node) = hovered.and_then(|index| graph.nodes.get(index))
        {
            let job = self.controller.on_node_click(&node.id);
            self.dispatch(ui.ctx(), job);
        }

        let segments = graph.indexed_link_endpoints();
        let hovered_link = match (hovered, pointer) {
            (None, Some(pointer)) => hovered_link(pointer, &screen_positions, &segments),
            _ => None,
        };

        self.draw_links(&painter, &graph, &segments, &screen_positions, hovered, hovered_link);
        self.draw_nodes(&painter, &graph, &screen_positions);
        self.draw_hover_text(&painter, rect, &graph, hovered, hovered_link);
        self.draw_loading_overlay(ui, &painter, rect);
    }

    fn draw_links(
        &self,
        painter: &Painter,
        graph: &NetworkGraph,
        segments: &[(usize, usize, usize)],
        screen_positions: &[Pos2],
        hovered_node: Option<usize>,
        hovered_link: Option<usize>,
    ) {
        for &(link_index, from, to) in segments {
            let (Some(start), Some(end)) = (screen_positions.get(from), screen_positions.get(to))
            else {
                continue;
            };
            let value = graph.links[link_index].value;

            let mut color = link_color(value, self.link_value_ceiling);
            let mut width = link_width(value, self.link_value_ceiling);
            if hovered_link == Some(link_index) {
                color = HOVER_COLOR;
                width += 1.5;
            } else if let Some(node) = hovered_node
                && node != from
                && node != to
            {
                color = dim_color(color, 0.45);
            }

            painter.line_segment([*start, *end], Stroke::new(width, color));
        }
    }

    fn draw_nodes(&self, painter: &Painter, graph: &NetworkGraph, screen_positions: &[Pos2]) {
        let interaction = self.controller.interaction();
        let zoom = self.camera.zoom;
        // Every node is pinned in tournament mode; rings only mark dragged ones.
        let pin_rings = self.layout.mode() == LayoutMode::Center;

        let mut order: Vec<(usize, NodeEmphasis)> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (index, NodeEmphasis::of(node, interaction)))
            .collect();
        // Emphasized nodes paint last so they stay on top.
        order.sort_by(|a, b| b.1.cmp(&a.1));

        for (index, emphasis) in order {
            let (Some(node), Some(position)) = (graph.nodes.get(index), screen_positions.get(index))
            else {
                continue;
            };
            let radius = screen_radius(emphasis.radius(), zoom);

            painter.circle_filled(*position, radius, emphasis.color());
            painter.circle_stroke(
                *position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );
            if pin_rings && self.layout.is_pinned(index) {
                painter.circle_stroke(
                    *position,
                    radius + 3.0,
                    Stroke::new(1.2, Color32::from_rgba_unmultiplied(240, 240, 240, 150)),
                );
            }

            if emphasis != NodeEmphasis::Plain || zoom > 1.2 {
                painter.text(
                    *position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    node_caption(&node.label),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }
    }

    fn draw_hover_text(
        &self,
        painter: &Painter,
        rect: Rect,
        graph: &NetworkGraph,
        hovered_node: Option<usize>,
        hovered_link: Option<usize>,
    ) {
        let text = if let Some(node) = hovered_node.and_then(|index| graph.nodes.get(index)) {
            let mut text = format!("{}  |  {}", node.id, node.kind.as_str());
            if let Some(level) = hovered_node.and_then(|index| self.layout.level(index)) {
                text.push_str(&format!("  |  level {level}"));
            }
            text
        } else if let Some(link) = hovered_link.and_then(|index| graph.links.get(index)) {
            format!(
                "{} -> {}  |  {}",
                short_address(&link.source),
                short_address(&link.target),
                format_amount(link.value, self.active_chain())
            )
        } else {
            return;
        };

        painter.text(
            rect.left_top() + vec2(10.0, 10.0),
            Align2::LEFT_TOP,
            text,
            FontId::proportional(13.0),
            Color32::from_gray(240),
        );
    }

    fn draw_empty_state(&self, painter: &Painter, rect: Rect) {
        let message = match self.controller.phase() {
            ViewPhase::Failed => "No network to display. Adjust the search and try again.",
            ViewPhase::Loading => "",
            _ => "Enter a wallet address and press Search.",
        };
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            message,
            FontId::proportional(15.0),
            Color32::from_gray(200),
        );
    }

    /// Dims the graph while a fetch is in flight. The graph stays interactive underneath.
    fn draw_loading_overlay(&self, ui: &mut Ui, painter: &Painter, rect: Rect) {
        if !self.controller.is_loading() {
            return;
        }

        painter.rect_filled(rect, 0.0, Color32::from_rgba_unmultiplied(10, 10, 20, 120));
        let spinner_rect = Rect::from_center_size(rect.center(), vec2(36.0, 36.0));
        ui.put(spinner_rect, egui::Spinner::new().size(32.0));
        painter.text(
            rect.center() + vec2(0.0, 32.0),
            Align2::CENTER_TOP,
            "Loading...",
            FontId::proportional(14.0),
            Color32::from_gray(230),
        );
    }
}
