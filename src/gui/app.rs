//! GNSS Delta Viewer Main Application
//! Main window with control panel, chart viewer and NMEA inspector.

use crate::charts::{build_chart_set, ChartData, ChartKind, StaticChartRenderer, Units};
use crate::config::AppConfig;
use crate::data::{delta_rows, dop_rows, group_records, save_delta_csv, save_dop_csv, Record};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, Inspector, InspectorAction};
use egui::SidePanel;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use tracing::{error, info, warn};

/// File loading result from background thread
enum LoadResult {
    Progress(String),
    Charts(Vec<ChartData>),
    Records { path: PathBuf, records: Vec<Record> },
    /// Failure reported to the tab that started the load
    Error { origin: Tab, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Charts,
    Inspector,
}

/// Next pending message; a worker that hung up without a result becomes an error.
fn next_message(rx: &Receiver<LoadResult>, origin: Tab) -> Option<LoadResult> {
    match rx.try_recv() {
        Ok(result) => Some(result),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => {
            error!(?origin, "Background load stopped unexpectedly");
            Some(LoadResult::Error {
                origin,
                message: "Loading stopped unexpectedly".to_string(),
            })
        }
    }
}

/// Main application window.
pub struct DeltaViewerApp {
    config: AppConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    inspector: Inspector,
    tab: Tab,

    // Async file loading
    load_rx: Option<Receiver<LoadResult>>,
    load_origin: Tab,
    is_loading: bool,
}

impl DeltaViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        Self {
            config,
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            inspector: Inspector::new(),
            tab: Tab::Charts,
            load_rx: None,
            load_origin: Tab::Charts,
            is_loading: false,
        }
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.control_panel
                .set_status(&format!("Selected {}", path.display()));
            self.control_panel.settings.csv_path = Some(path);
        }
    }

    /// Read the selected CSV and build its charts in a background thread
    fn start_read(&mut self) {
        if self.is_loading {
            return;
        }
        let Some(path) = self.control_panel.settings.csv_path.clone() else {
            self.control_panel.set_status("Error: No file selected");
            return;
        };
        let kind = self.control_panel.settings.kind;
        let units = self.control_panel.settings.units();

        self.chart_viewer.clear();
        self.control_panel.export_enabled = false;
        self.control_panel.set_status("Reading file...");
        self.tab = Tab::Charts;
        self.load_origin = Tab::Charts;
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || Self::run_read(tx, path, kind, units));
    }

    /// Read and extract charts (called from background thread)
    fn run_read(tx: Sender<LoadResult>, path: PathBuf, kind: ChartKind, units: Units) {
        let result = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                let _ = tx.send(LoadResult::Progress("Building charts...".to_string()));
                build_chart_set(&text, kind, units).map_err(|e| e.to_string())
            });

        let message = match result {
            Ok(charts) => LoadResult::Charts(charts),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read CSV");
                LoadResult::Error {
                    origin: Tab::Charts,
                    message: format!("Failed to read file ({})", e),
                }
            }
        };
        let _ = tx.send(message);
    }

    /// Pick an NMEA log and group it into records in a background thread
    fn start_open_log(&mut self) {
        if self.is_loading {
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .add_filter("NMEA logs", &["nmea", "txt", "log"])
            .pick_file()
        else {
            return;
        };
        let grouping = self.config.nmea.record_grouping();

        self.inspector.status = "Reading log...".to_string();
        self.load_origin = Tab::Inspector;
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let message = match std::fs::read_to_string(&path) {
                Ok(text) => LoadResult::Records {
                    records: group_records(&text, grouping),
                    path,
                },
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to read NMEA log");
                    LoadResult::Error {
                        origin: Tab::Inspector,
                        message: format!("Failed to read file ({})", e),
                    }
                }
            };
            let _ = tx.send(message);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Some(result) = next_message(&rx, self.load_origin) {
                match result {
                    LoadResult::Progress(status) => {
                        self.control_panel.set_status(&status);
                    }
                    LoadResult::Charts(charts) => {
                        let skipped: usize = charts.iter().map(|c| c.series.rejected.len()).sum();
                        let status = if skipped > 0 {
                            format!("Loaded {} charts, {} rows skipped", charts.len(), skipped)
                        } else {
                            format!("Loaded {} charts", charts.len())
                        };
                        self.control_panel.set_status(&status);
                        self.control_panel.export_enabled = !charts.is_empty();
                        self.chart_viewer.set_charts(charts);
                        self.is_loading = false;
                        should_keep_receiver = false;
                        break;
                    }
                    LoadResult::Records { path, records } => {
                        info!(path = %path.display(), records = records.len(), "Opened NMEA log");
                        self.inspector.set_records(path, records);
                        self.is_loading = false;
                        should_keep_receiver = false;
                        break;
                    }
                    LoadResult::Error { origin, message } => {
                        self.report_error(origin, &format!("Error: {}", message));
                        self.is_loading = false;
                        should_keep_receiver = false;
                        break;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    fn report_error(&mut self, origin: Tab, status: &str) {
        match origin {
            Tab::Charts => self.control_panel.set_status(status),
            Tab::Inspector => self.inspector.status = status.to_string(),
        }
    }

    /// Write the current charts as PNG files and open the folder
    fn handle_export_png(&mut self) {
        if self.chart_viewer.charts.is_empty() {
            self.control_panel.set_status("No charts to export");
            return;
        }

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        let (width, height) = (self.config.chart.width, self.config.chart.height);
        match StaticChartRenderer::write_chart_set(&self.chart_viewer.charts, &dir, width, height)
        {
            Ok(written) => {
                self.control_panel
                    .set_status(&format!("Exported {} images", written.len()));
                if let Err(e) = open::that(&dir) {
                    warn!(dir = %dir.display(), error = %e, "Could not open export folder");
                }
            }
            Err(e) => {
                self.control_panel
                    .set_status(&format!("Error: Export failed ({})", e));
            }
        }
    }

    /// Save the filtered inspector records as a DOP or delta table
    fn handle_export_table(&mut self, action: InspectorAction) {
        let name = match action {
            InspectorAction::ExportDop => "dop.csv",
            InspectorAction::ExportDelta => "delta.csv",
            _ => return,
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(name)
            .save_file()
        else {
            return;
        };

        self.inspector.status = match self.write_table(&action, &path) {
            Ok(()) => format!("Exported {}", path.display()),
            Err(e) => format!("Error: Export failed ({})", e),
        };
    }

    fn write_table(&self, action: &InspectorAction, path: &Path) -> anyhow::Result<()> {
        let records = &self.inspector.visible;
        match action {
            InspectorAction::ExportDelta => {
                save_delta_csv(&delta_rows(records, self.config.earth_radius_m), path)?
            }
            _ => save_dop_csv(&dop_rows(records), path)?,
        }
        Ok(())
    }
}

impl eframe::App for DeltaViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Charts, "📈 Charts");
                ui.selectable_value(&mut self.tab, Tab::Inspector, "🔍 NMEA Inspector");
            });
        });

        match self.tab {
            Tab::Charts => {
                SidePanel::left("control_panel")
                    .min_width(260.0)
                    .max_width(320.0)
                    .show(ctx, |ui| {
                        let action = self.control_panel.show(ui, self.is_loading);

                        match action {
                            ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                            ControlPanelAction::Read => self.start_read(),
                            ControlPanelAction::UnitsChanged => {
                                if !self.chart_viewer.charts.is_empty() {
                                    self.start_read();
                                }
                            }
                            ControlPanelAction::ExportPng => self.handle_export_png(),
                            ControlPanelAction::None => {}
                        }
                    });

                egui::CentralPanel::default().show(ctx, |ui| {
                    self.chart_viewer.show(ui);
                });
            }
            Tab::Inspector => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    let action = self.inspector.show(ui, self.is_loading);
                    match action {
                        InspectorAction::OpenLog => self.start_open_log(),
                        InspectorAction::ExportDop | InspectorAction::ExportDelta => {
                            self.handle_export_table(action)
                        }
                        InspectorAction::None => {}
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_channel_yields_nothing() {
        let (_tx, rx) = channel::<LoadResult>();
        assert!(next_message(&rx, Tab::Charts).is_none());
    }

    #[test]
    fn test_message_is_passed_through() {
        let (tx, rx) = channel();
        tx.send(LoadResult::Charts(Vec::new())).unwrap();
        assert!(matches!(
            next_message(&rx, Tab::Charts),
            Some(LoadResult::Charts(charts)) if charts.is_empty()
        ));
    }

    #[test]
    fn test_dead_worker_reports_error_to_its_tab() {
        let (tx, rx) = channel::<LoadResult>();
        let worker = thread::spawn(move || {
            let _tx = tx;
            panic!("worker failed");
        });
        assert!(worker.join().is_err());

        assert!(matches!(
            next_message(&rx, Tab::Inspector),
            Some(LoadResult::Error { origin: Tab::Inspector, .. })
        ));
    }
}
