use eframe::egui::{self, Align, Color32, Layout, RichText, Sense, Ui, vec2};

use crate::util::{format_amount, short_address};

use super::super::ExplorerApp;
use super::super::controller::ViewPhase;
use super::super::style::{
    DEFAULT_COLOR, FOCUS_COLOR, HOVER_COLOR, SOURCE_COLOR, link_color, link_width,
};

const ERROR_COLOR: Color32 = Color32::from_rgb(0xef, 0x53, 0x50);

fn legend_swatch(ui: &mut Ui, color: Color32, text: &str) {
    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(vec2(14.0, 14.0), Sense::hover());
        ui.painter().circle_filled(rect.center(), 5.0, color);
        ui.label(text);
    });
}

impl ExplorerApp {
    pub(in crate::app) fn draw_top_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("chain-lens");
            ui.separator();
            ui.label(format!("api: {}", self.api_url));
            ui.separator();
            ui.label(match self.controller.phase() {
                ViewPhase::Idle => "idle",
                ViewPhase::Loading => "loading",
                ViewPhase::Displayed => "network",
                ViewPhase::DrillDown => "drill-down",
                ViewPhase::Failed => "no data",
            });
            if self.controller.is_loading() {
                ui.spinner();
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let Some(message) = self.controller.error().map(str::to_owned) else {
                    return;
                };
                if ui.small_button("Dismiss").clicked() {
                    self.controller.dismiss_error();
                }
                ui.label(RichText::new(message).color(ERROR_COLOR));
            });
        });
    }

    pub(in crate::app) fn draw_sidebar(&mut self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_search_form(ui);
                ui.separator();
                self.draw_network_info(ui);
                ui.separator();
                self.draw_legend(ui);
            });
    }

    fn draw_network_info(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Network").strong());

        let (Some(graph), Some(query)) = (self.controller.displayed_graph(), self.controller.root_query())
        else {
            ui.label("No network loaded.");
            return;
        };

        egui::Grid::new("network_info")
            .num_columns(2)
            .spacing([10.0, 3.0])
            .show(ui, |ui| {
                ui.label("Root");
                ui.label(short_address(&query.address))
                    .on_hover_text(query.address.as_str());
                ui.end_row();
                ui.label("Chain");
                ui.label(query.chain.label());
                ui.end_row();
                ui.label("Depth");
                ui.label(query.depth.to_string());
                ui.end_row();
                ui.label("Nodes");
                ui.label(graph.node_count().to_string());
                ui.end_row();
                ui.label("Links");
                ui.label(graph.link_count().to_string());
                ui.end_row();
                ui.label("Total value");
                ui.label(format_amount(graph.total_value(), query.chain));
                ui.end_row();
                ui.label("Layout");
                if self.layout.is_settled() {
                    ui.label(self.controller.layout_mode().label());
                } else {
                    ui.label(format!("{} (settling)", self.controller.layout_mode().label()));
                }
                ui.end_row();
            });

        if let Some(target) = self.controller.drill_target() {
            ui.add_space(4.0);
            ui.label(format!("Showing links to {}", short_address(target)));
            if let Some(full) = self.controller.full_graph() {
                ui.label(format!(
                    "Full network: {} nodes, {} links",
                    full.node_count(),
                    full.link_count()
                ));
            }
        }

        ui.add_space(4.0);
        if ui.button("Center on root").clicked() {
            self.center_on_root();
        }
    }

    fn draw_legend(&self, ui: &mut Ui) {
        ui.label(RichText::new("Legend").strong());
        legend_swatch(ui, SOURCE_COLOR, "Searched address");
        legend_swatch(ui, FOCUS_COLOR, "Focused address");
        legend_swatch(ui, HOVER_COLOR, "Hovered address");
        legend_swatch(ui, DEFAULT_COLOR, "Other address");

        ui.add_space(4.0);
        let ceiling = self.link_value_ceiling;
        ui.horizontal(|ui| {
            for value in [0.0, ceiling * 0.5, ceiling] {
                let (rect, _) = ui.allocate_exact_size(vec2(28.0, 14.0), Sense::hover());
                ui.painter().line_segment(
                    [rect.left_center(), rect.right_center()],
                    egui::Stroke::new(link_width(value, ceiling), link_color(value, ceiling)),
                );
            }
            ui.label(format!("link value 0 .. {ceiling}+"));
        });
    }
}
