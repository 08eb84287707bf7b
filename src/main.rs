mod app;
mod data;
mod kpi;
mod state;
mod ui;

use std::path::PathBuf;

use app::CreditPandaApp;
use eframe::egui;

/// Environment variable naming the dataset to open at start-up.
const DATA_ENV: &str = "CREDIT_RISK_DATA";
const DEFAULT_DATA: &str = "data/application_train.csv";

/// First CLI argument, else `$CREDIT_RISK_DATA`, else the default file if present.
fn startup_dataset(arg: Option<String>, env: Option<String>) -> Option<PathBuf> {
    arg.or(env)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from(DEFAULT_DATA)).filter(|p| p.exists()))
}

fn main() -> eframe::Result {
    env_logger::init();

    let dataset = startup_dataset(std::env::args().nth(1), std::env::var(DATA_ENV).ok());
    match &dataset {
        Some(path) => log::info!("Opening {} at start-up", path.display()),
        None => log::info!("No dataset configured; use File → Open"),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 840.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Credit Panda – Credit Risk Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(CreditPandaApp::with_initial_file(dataset)))),
    )
}
