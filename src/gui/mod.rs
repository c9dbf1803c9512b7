//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;
mod inspector;

pub use app::DeltaViewerApp;
pub use chart_viewer::ChartViewer;
pub use control_panel::{ControlPanel, ControlPanelAction, UserSettings};
pub use inspector::{Inspector, InspectorAction};

use crate::config::AppConfig;
use eframe::egui;

/// Open the viewer window and block until it is closed.
pub fn run(config: AppConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("GNSS Delta Viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "GNSS Delta Viewer",
        options,
        Box::new(|cc| Ok(Box::new(DeltaViewerApp::new(cc, config)))),
    )
}
