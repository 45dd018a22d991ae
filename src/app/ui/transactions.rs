use eframe::egui::{self, Align, Color32, Layout, RichText, Ui};

use crate::chain::{Chain, Transaction, TransactionStats};
use crate::util::{format_amount, short_address};

use super::super::ExplorerApp;
use super::super::pagination::ROWS_OPTIONS;

const SENT_COLOR: Color32 = Color32::from_rgb(0xef, 0x9a, 0x9a);
const RECEIVED_COLOR: Color32 = Color32::from_rgb(0xa5, 0xd6, 0xa7);

impl ExplorerApp {
    pub(in crate::app) fn draw_transactions(&mut self, ui: &mut Ui) {
        let Some((root, chain)) = self
            .controller
            .table_subject()
            .map(|(address, chain)| (address.to_owned(), chain))
        else {
            ui.add_space(6.0);
            ui.label("Search for an address to list its transactions.");
            return;
        };
        let in_network = self
            .controller
            .root_query()
            .is_some_and(|query| query.address == root);

        ui.horizontal(|ui| {
            let title = match self.controller.drill_target() {
                Some(target) => format!(
                    "Transactions between {} and {}",
                    short_address(&root),
                    short_address(target)
                ),
                None if in_network => "All transactions in network".to_owned(),
                None => format!("All transactions of {}", short_address(&root)),
            };
            ui.label(RichText::new(title).strong());

            let focused = self.controller.interaction().focused.is_some();
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.add_enabled(focused, egui::Button::new("Reset view")).clicked() {
                    self.controller.reset_focus();
                }
            });
        });

        if let Some(stats) = TransactionStats::compute(self.controller.transactions(), &root) {
            draw_stats(ui, &stats, chain);
        }

        let mut filter_changed = false;
        ui.horizontal(|ui| {
            ui.label("Filter");
            filter_changed |= ui
                .add(
                    egui::TextEdit::singleline(&mut self.filter.address_query)
                        .hint_text("address or txid")
                        .desired_width(220.0),
                )
                .changed();

            let mut min = self.filter.min_amount.unwrap_or(0.0);
            filter_changed |= ui
                .add(egui::DragValue::new(&mut min).speed(0.01).range(0.0..=f64::MAX).prefix("min "))
                .changed();
            self.filter.min_amount = (min > 0.0).then_some(min);

            let mut max = self.filter.max_amount.unwrap_or(0.0);
            filter_changed |= ui
                .add(egui::DragValue::new(&mut max).speed(0.01).range(0.0..=f64::MAX).prefix("max "))
                .on_hover_text("0 means no upper limit")
                .changed();
            self.filter.max_amount = (max > 0.0).then_some(max);

            if ui
                .add_enabled(self.filter.is_active(), egui::Button::new("Clear"))
                .clicked()
            {
                self.filter = Default::default();
                filter_changed = true;
            }
        });

        let mut pagination = self.controller.pagination();
        if filter_changed {
            pagination.reset();
        }

        let rows = self.filter.apply(self.controller.transactions());
        if rows.is_empty() {
            ui.add_space(6.0);
            ui.label("No transactions found for this selection.");
            self.controller.set_pagination(pagination);
            return;
        }

        let range = pagination.page_range(rows.len());
        let page_count = pagination.page_count(rows.len());
        let shown = rows.len();

        ui.separator();
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .max_height((ui.available_height() - 28.0).max(60.0))
            .show(ui, |ui| {
                egui::Grid::new("transaction_rows")
                    .striped(true)
                    .num_columns(6)
                    .spacing([14.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["Time", "From", "To", "Value", "Contract", "Tx"] {
                            ui.label(RichText::new(header).strong());
                        }
                        ui.end_row();

                        for transaction in &rows[range] {
                            draw_row(ui, transaction, &root, chain);
                        }
                    });
            });

        ui.horizontal(|ui| {
            ui.label(format!("{shown} rows"));
            egui::ComboBox::from_id_salt("rows_per_page")
                .selected_text(format!("{} / page", pagination.rows_per_page))
                .show_ui(ui, |ui| {
                    for option in ROWS_OPTIONS {
                        if ui
                            .selectable_label(pagination.rows_per_page == option, option.to_string())
                            .clicked()
                        {
                            pagination.set_rows_per_page(option);
                        }
                    }
                });

            if ui
                .add_enabled(pagination.page > 0, egui::Button::new("<"))
                .clicked()
            {
                pagination.page -= 1;
            }
            ui.label(format!("page {} of {page_count}", pagination.page + 1));
            if ui
                .add_enabled(pagination.page + 1 < page_count, egui::Button::new(">"))
                .clicked()
            {
                pagination.page += 1;
            }
        });

        self.controller.set_pagination(pagination);
    }
}

fn draw_stats(ui: &mut Ui, stats: &TransactionStats, chain: Chain) {
    ui.horizontal_wrapped(|ui| {
        ui.label(format!(
            "{} transactions ({} sent, {} received)",
            stats.total_transactions, stats.sent_transactions, stats.received_transactions
        ));
        ui.separator();
        ui.label(RichText::new(format!("out {}", format_amount(stats.total_sent, chain))).color(SENT_COLOR));
        ui.label(
            RichText::new(format!("in {}", format_amount(stats.total_received, chain)))
                .color(RECEIVED_COLOR),
        );
        ui.label(format!("balance {}", format_amount(stats.balance, chain)));
        ui.separator();
        ui.label(format!(
            "{} senders, {} receivers",
            stats.unique_senders, stats.unique_receivers
        ));
        ui.separator();
        ui.label(format!(
            "{} .. {}",
            stats.first_transaction.format("%Y-%m-%d %H:%M"),
            stats.last_transaction.format("%Y-%m-%d %H:%M")
        ));
    });
}

fn draw_row(ui: &mut Ui, transaction: &Transaction, root: &str, chain: Chain) {
    ui.label(transaction.timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
    ui.label(short_address(&transaction.from_address))
        .on_hover_text(transaction.from_address.as_str());
    ui.label(short_address(&transaction.to_address))
        .on_hover_text(transaction.to_address.as_str());

    let amount = format_amount(transaction.value, chain);
    let amount = if transaction.is_sent_by(root) {
        RichText::new(format!("-{amount}")).color(SENT_COLOR)
    } else if transaction.is_received_by(root) {
        RichText::new(format!("+{amount}")).color(RECEIVED_COLOR)
    } else {
        RichText::new(amount)
    };
    ui.label(amount);

    if transaction.is_contract_interaction {
        let method = transaction.contract_method.as_deref().unwrap_or("call");
        let label = ui.label(method);
        if let Some(contract) = &transaction.contract_address {
            label.on_hover_text(contract.as_str());
        }
    } else {
        ui.label("");
    }

    ui.label(short_address(&transaction.txid))
        .on_hover_text(transaction.txid.as_str());
    ui.end_row();
}
