//! Chart Viewer Widget
//! Right side scrollable panel with the charts of the current set stacked
//! vertically.

use crate::charts::{ChartData, ChartPlotter};
use egui::{Color32, RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;
const MIN_CHART_HEIGHT: f32 = 220.0;

#[derive(Default)]
pub struct ChartViewer {
    pub charts: Vec<ChartData>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.charts.clear();
    }

    pub fn set_charts(&mut self, charts: Vec<ChartData>) {
        self.charts = charts;
    }

    /// Draw every chart; heights share the visible area with a floor.
    pub fn show(&self, ui: &mut egui::Ui) {
        if self.charts.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        let count = self.charts.len() as f32;
        let chart_height =
            ((ui.available_height() / count) - 90.0 - CHART_SPACING).max(MIN_CHART_HEIGHT);

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for chart in &self.charts {
                    Self::draw_chart_card(ui, chart, chart_height);
                    ui.add_space(CHART_SPACING);
                }
            });
    }

    fn draw_chart_card(ui: &mut egui::Ui, chart: &ChartData, height: f32) {
        let border_color = if chart.series.is_empty() {
            Color32::from_rgb(220, 53, 69)
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke.color
        };

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.5, border_color))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(RichText::new(&chart.spec.title).size(16.0).strong());
                    ui.add_space(6.0);

                    if chart.series.is_empty() {
                        ui.label(RichText::new("No valid rows").color(border_color));
                    }
                    ChartPlotter::draw_line_chart(ui, chart, height);

                    ui.add_space(6.0);
                    ChartPlotter::draw_stats_strip(ui, &chart.stats, chart.series.rejected.len());
                });
            });
    }
}
