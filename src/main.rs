mod app;
mod chain;
mod util;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use log::{error, info};

use crate::app::{ExplorerApp, LayoutMode, Settings};
use crate::chain::{ApiClient, Chain};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the address network API.
    #[arg(long, env = "CHAIN_LENS_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    #[arg(long, value_enum, default_value_t = Chain::Bitcoin)]
    chain: Chain,

    /// Address to search for as soon as the window opens.
    #[arg(long)]
    address: Option<String>,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    depth: u8,

    #[arg(long, value_enum, default_value_t = LayoutMode::Center)]
    layout: LayoutMode,

    /// Link value at which width and opacity stop growing.
    #[arg(long, default_value_t = 10.0)]
    link_value_ceiling: f64,

    /// HTTP timeout per request, in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level.as_str()))
        .init();

    let client = ApiClient::new(&args.api_url, Duration::from_secs(args.timeout_secs))
        .context("failed to configure the API client")?;
    info!("using API at {}", client.base_url());

    let settings = Settings {
        api_url: client.base_url().to_string(),
        chain: args.chain,
        address: args.address.filter(|address| !address.trim().is_empty()),
        depth: args.depth,
        layout: args.layout,
        link_value_ceiling: args.link_value_ceiling,
    };
    let source = Arc::new(client);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "chain-lens",
        options,
        Box::new(move |cc| Ok(Box::new(ExplorerApp::new(cc, settings, source)))),
    )
    .map_err(|run_error| {
        error!("window closed with an error: {run_error}");
        anyhow::anyhow!("failed to run the explorer window: {run_error}")
    })
}
