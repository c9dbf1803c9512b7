//! Control Panel Widget
//! Left side panel with file selection, chart options and status.

use crate::charts::{ChartKind, Units};
use egui::{Color32, RichText};
use std::path::PathBuf;

/// What to read and how to plot it
#[derive(Default, Clone)]
pub struct UserSettings {
    pub csv_path: Option<PathBuf>,
    pub kind: ChartKind,
    pub show_meters: bool,
}

impl UserSettings {
    pub fn units(&self) -> Units {
        if self.show_meters {
            Units::Meters
        } else {
            Units::Degrees
        }
    }
}

/// Left side control panel with file selection and processing controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub status: String,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            status: "Ready".to_string(),
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, busy: bool) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🛰 GNSS Delta Viewer")
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    let path_color = if self.settings.csv_path.is_some() {
                        ui.visuals().strong_text_color()
                    } else {
                        Color32::GRAY
                    };
                    ui.label(RichText::new(&path_text).size(12.0).color(path_color));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Chart Options Section =====
        ui.label(RichText::new("⚙️ Charts").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.radio_value(&mut self.settings.kind, ChartKind::Delta, "Position delta");
            ui.radio_value(&mut self.settings.kind, ChartKind::Dop, "DOP");
        });

        ui.add_space(5.0);
        ui.add_enabled_ui(self.settings.kind == ChartKind::Delta, |ui| {
            if ui
                .checkbox(&mut self.settings.show_meters, "Show in meters")
                .changed()
            {
                action = ControlPanelAction::UnitsChanged;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!busy, |ui| {
                let button = egui::Button::new(RichText::new("▶ Read").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Read;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(self.export_enabled && !busy, |ui| {
                let png_button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(png_button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        if busy {
            ui.add(egui::Spinner::new());
        }
        ui.label(
            RichText::new(&self.status)
                .size(11.0)
                .color(status_color(&self.status)),
        );

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Red for errors, green for finished work, grey otherwise
pub fn status_color(status: &str) -> Color32 {
    if status.starts_with("Error") {
        Color32::from_rgb(220, 53, 69)
    } else if status.starts_with("Loaded") || status.starts_with("Exported") {
        Color32::from_rgb(40, 167, 69)
    } else {
        Color32::GRAY
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    UnitsChanged,
    Read,
    ExportPng,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_follow_checkbox() {
        let mut settings = UserSettings::default();
        assert_eq!(settings.units(), Units::Degrees);
        settings.show_meters = true;
        assert_eq!(settings.units(), Units::Meters);
    }

    #[test]
    fn test_status_color() {
        assert_eq!(
            status_color("Error: No file selected"),
            Color32::from_rgb(220, 53, 69)
        );
        assert_eq!(
            status_color("Loaded 3 charts"),
            Color32::from_rgb(40, 167, 69)
        );
        assert_eq!(status_color("Ready"), Color32::GRAY);
    }
}
