use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use eframe::egui::Context;
use log::error;

use crate::chain::NetworkSource;

use super::controller::{FetchJob, FetchOutcome};

/// Runs fetch jobs off the UI thread. Outcomes come back in completion order.
pub(super) struct Worker {
    source: Arc<dyn NetworkSource>,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
}

impl Worker {
    pub(super) fn new(source: Arc<dyn NetworkSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { source, tx, rx }
    }

    pub(super) fn dispatch(&self, job: FetchJob, ctx: &Context) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let ctx = ctx.clone();

        let spawned = thread::Builder::new()
            .name("chain-lens-fetch".to_owned())
            .spawn(move || {
                let outcome = job.run(source.as_ref());
                let _ = tx.send(outcome);
                ctx.request_repaint();
            });

        if let Err(spawn_error) = spawned {
            error!("failed to start fetch thread: {spawn_error}");
        }
    }

    pub(super) fn poll(&self) -> Vec<FetchOutcome> {
        self.rx.try_iter().collect()
    }
}
