use chrono::NaiveDate;
use eframe::egui::{self, Key, Ui};

use crate::chain::{Chain, DATE_FORMAT, DateRange, NetworkQuery};

use super::super::ExplorerApp;
use super::super::controller::{ExplorerError, MAX_DEPTH};
use super::super::layout::LayoutMode;

/// Raw text of the search form. Parsed into a [`NetworkQuery`] on submit.
pub(in crate::app) struct SearchForm {
    pub(in crate::app) chain: Chain,
    address: String,
    depth: u8,
    start_date: String,
    end_date: String,
    min_amount: String,
}

impl SearchForm {
    pub(in crate::app) fn new(chain: Chain, address: String, depth: u8) -> Self {
        let range = DateRange::current_month();
        Self {
            chain,
            address,
            depth: depth.clamp(1, MAX_DEPTH),
            start_date: range.start.format(DATE_FORMAT).to_string(),
            end_date: range.end.format(DATE_FORMAT).to_string(),
            min_amount: String::new(),
        }
    }

    pub(in crate::app) fn query(&self) -> Result<NetworkQuery, ExplorerError> {
        let min_amount = match self.min_amount.trim() {
            "" => None,
            raw => Some(raw.parse::<f64>().map_err(|_| {
                ExplorerError::InvalidInput(format!("Minimum amount is not a number: {raw}"))
            })?),
        };

        Ok(NetworkQuery {
            chain: self.chain,
            address: self.address.trim().to_owned(),
            depth: self.depth,
            range: DateRange {
                start: parse_date("Start date", &self.start_date)?,
                end: parse_date("End date", &self.end_date)?,
            },
            min_amount,
        })
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ExplorerError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ExplorerError::InvalidInput(format!("{field} must look like 2024-01-31")))
}

impl ExplorerApp {
    pub(in crate::app) fn draw_search_form(&mut self, ui: &mut Ui) {
        ui.heading("Search");
        ui.add_space(4.0);

        egui::ComboBox::from_label("Chain")
            .selected_text(self.form.chain.label())
            .show_ui(ui, |ui| {
                for chain in Chain::ALL {
                    ui.selectable_value(&mut self.form.chain, chain, chain.label());
                }
            });

        ui.label("Wallet address");
        let address_response = ui.add(
            egui::TextEdit::singleline(&mut self.form.address)
                .hint_text("0x... or bc1...")
                .desired_width(f32::INFINITY),
        );
        let submitted =
            address_response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));

        ui.add(
            egui::Slider::new(&mut self.form.depth, 1..=MAX_DEPTH)
                .text("Depth")
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text("Hops to follow outward from the searched address.");

        egui::Grid::new("search_dates")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("From");
                ui.add(egui::TextEdit::singleline(&mut self.form.start_date).desired_width(110.0));
                ui.end_row();
                ui.label("To");
                ui.add(egui::TextEdit::singleline(&mut self.form.end_date).desired_width(110.0));
                ui.end_row();
                ui.label("Min amount");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.min_amount)
                        .hint_text("optional")
                        .desired_width(110.0),
                );
                ui.end_row();
            });

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if ui.button("Search").clicked() || submitted {
                self.submit_search(ui.ctx());
            }
            if ui
                .button("Transactions only")
                .on_hover_text("List the address's transactions without loading its network.")
                .clicked()
            {
                self.submit_transaction_lookup(ui.ctx());
            }
        });

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label("Layout");
            let mut mode = self.controller.layout_mode();
            for candidate in [LayoutMode::Center, LayoutMode::Tournament] {
                ui.selectable_value(&mut mode, candidate, candidate.label());
            }
            self.controller.set_layout_mode(mode);
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn form(start: &str, end: &str, min_amount: &str) -> SearchForm {
        SearchForm {
            chain: Chain::Bitcoin,
            address: "  bc1qexample  ".to_owned(),
            depth: 2,
            start_date: start.to_owned(),
            end_date: end.to_owned(),
            min_amount: min_amount.to_owned(),
        }
    }

    #[test]
    fn form_parses_into_a_query() {
        let query = form("2024-01-01", "2024-01-31", " 0.5 ").query().unwrap();
        assert_eq!(query.address, "bc1qexample");
        assert_eq!(query.depth, 2);
        assert_eq!(query.min_amount, Some(0.5));
        assert_eq!(
            query.range.start,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );

        let query = form("2024-01-01", "2024-01-31", "").query().unwrap();
        assert_eq!(query.min_amount, None);
    }

    #[test]
    fn malformed_fields_are_invalid_input() {
        assert!(matches!(
            form("01/01/2024", "2024-01-31", "").query(),
            Err(ExplorerError::InvalidInput(_))
        ));
        assert!(matches!(
            form("2024-01-01", "2024-01-31", "lots").query(),
            Err(ExplorerError::InvalidInput(_))
        ));
    }

    #[test]
    fn new_form_defaults_to_the_current_month() {
        let form = SearchForm::new(Chain::Ethereum, String::new(), 9);
        let range = DateRange::current_month();
        assert_eq!(form.depth, MAX_DEPTH);
        assert_eq!(form.start_date, range.start.format(DATE_FORMAT).to_string());
        assert_eq!(form.end_date, range.end.format(DATE_FORMAT).to_string());
    }
}
