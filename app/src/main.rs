mod app;
mod ui;

use app::DemoApp;
use pseudolab::config::DEFAULT_CONFIG_FILE;
use pseudolab::{DemoConfig, logging};
use std::path::Path;

fn main() -> eframe::Result<()> {
    if let Err(err) = logging::init() {
        eprintln!("{err}");
    }
    let config = DemoConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE)).unwrap_or_else(|err| {
        tracing::warn!("{err}; falling back to defaults");
        DemoConfig::default()
    });

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "pseudolab",
        native_options,
        Box::new(|_cc| Ok(Box::new(DemoApp::new(config)))),
    )
}
