use std::sync::Arc;

use eframe::egui::{self, Context, Vec2};

use crate::chain::{Chain, NetworkQuery, NetworkSource, TransactionFilter};

mod camera;
mod controller;
mod graph;
mod layout;
mod pagination;
mod style;
mod ui;
mod worker;

pub use layout::LayoutMode;

use camera::Camera;
use controller::{Controller, ExplorerError, FetchJob};
use layout::LayoutEngine;
use ui::SearchForm;
use worker::Worker;

/// Startup options for the explorer window.
#[derive(Clone, Debug)]
pub struct Settings {
    pub api_url: String,
    pub chain: Chain,
    pub address: Option<String>,
    pub depth: u8,
    pub layout: LayoutMode,
    pub link_value_ceiling: f64,
}

pub struct ExplorerApp {
    api_url: String,
    link_value_ceiling: f64,
    worker: Worker,
    controller: Controller,
    layout: LayoutEngine,
    camera: Camera,
    form: SearchForm,
    filter: TransactionFilter,
    layout_revision: Option<u64>,
    viewport: Vec2,
    dragging: Option<usize>,
    startup_search: bool,
}

impl ExplorerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        settings: Settings,
        source: Arc<dyn NetworkSource>,
    ) -> Self {
        let startup_search = settings.address.is_some();
        Self {
            form: SearchForm::new(settings.chain, settings.address.unwrap_or_default(), settings.depth),
            api_url: settings.api_url,
            link_value_ceiling: settings.link_value_ceiling,
            worker: Worker::new(source),
            controller: Controller::new(settings.layout),
            layout: LayoutEngine::default(),
            camera: Camera::default(),
            filter: TransactionFilter::default(),
            layout_revision: None,
            viewport: Vec2::ZERO,
            dragging: None,
            startup_search,
        }
    }

    fn dispatch(&self, ctx: &Context, job: Option<FetchJob>) {
        if let Some(job) = job {
            self.worker.dispatch(job, ctx);
        }
    }

    fn submit_search(&mut self, ctx: &Context) {
        self.submit(ctx, Controller::search);
    }

    fn submit_transaction_lookup(&mut self, ctx: &Context) {
        self.submit(ctx, Controller::lookup_transactions);
    }

    fn submit(
        &mut self,
        ctx: &Context,
        start: fn(&mut Controller, NetworkQuery) -> Result<FetchJob, ExplorerError>,
    ) {
        let job = match self.form.query() {
            Ok(query) => start(&mut self.controller, query).ok(),
            Err(error) => {
                self.controller.reject_input(&error);
                None
            }
        };
        if job.is_some() {
            self.filter = TransactionFilter::default();
            self.dragging = None;
        }
        self.dispatch(ctx, job);
    }

    /// Chain of the graph on screen, falling back to the form selection.
    fn active_chain(&self) -> Chain {
        self.controller
            .root_query()
            .map_or(self.form.chain, |query| query.chain)
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if std::mem::take(&mut self.startup_search) {
            self.submit_search(ctx);
        }

        for outcome in self.worker.poll() {
            if self.controller.apply(outcome) {
                ctx.request_repaint();
            }
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui));

        egui::SidePanel::left("search")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_sidebar(ui));

        egui::TopBottomPanel::bottom("transactions")
            .resizable(true)
            .default_height(300.0)
            .show(ctx, |ui| self.draw_transactions(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));

        if self.controller.is_loading() {
            ctx.request_repaint();
        }
    }
}
