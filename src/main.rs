mod app;
mod assistant;
mod chart;
mod color;
mod config;
mod data;
mod insight;
mod state;
mod ui;

use app::InsightBridgeApp;
use clap::Parser;
use config::Args;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();
    log::info!("Starting with dataset {}", args.data.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 860.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "InsightBridge – Food Desert Analysis",
        options,
        Box::new(move |_cc| Ok(Box::new(InsightBridgeApp::new(&args)?))),
    )
}
