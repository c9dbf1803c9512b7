//! Chart Plotter Module
//! Draws interactive line charts using egui_plot.

use crate::charts::ChartData;
use crate::data::XSource;
use crate::stats::SeriesStats;
use chrono::DateTime;
use egui::{Color32, RichText};
use egui_plot::{Line, Plot, PlotPoints};

pub const LINE_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const WARN_COLOR: Color32 = Color32::from_rgb(220, 53, 69); // Red

/// Creates line charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// X tick/label text: sample number, or UTC wall time for epoch milliseconds.
    pub fn format_x(x_source: XSource, value: f64) -> String {
        match x_source {
            XSource::RowIndex => {
                if value >= 0.0 && value.fract() == 0.0 {
                    format!("{}", value as i64)
                } else {
                    String::new()
                }
            }
            XSource::Column(_) => DateTime::from_timestamp_millis(value as i64)
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default(),
        }
    }

    /// Draw one zoomable line chart
    pub fn draw_line_chart(ui: &mut egui::Ui, chart: &ChartData, height: f32) {
        let x_source = chart.spec.x_source;
        let title = chart.spec.title.clone();

        let points: PlotPoints = chart.series.points.iter().map(|p| [p.x, p.y]).collect();

        Plot::new(format!("line_{}", chart.spec.id))
            .height(height)
            .allow_zoom(true)
            .allow_drag(true)
            .allow_scroll(false)
            .x_axis_label(chart.spec.x_label)
            .y_axis_label(chart.spec.y_label.clone())
            .x_axis_formatter(move |mark, _range| Self::format_x(x_source, mark.value))
            .label_formatter(move |_name, value| {
                format!("{}\n{:.6}", Self::format_x(x_source, value.x.round()), value.y)
            })
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(points)
                        .color(LINE_COLOR)
                        .width(1.5)
                        .name(title),
                );
            });
    }

    /// Draw the one-line statistics summary under a chart
    pub fn draw_stats_strip(ui: &mut egui::Ui, stats: &SeriesStats, rejected: usize) {
        let cell = |ui: &mut egui::Ui, name: &str, value: String| {
            ui.label(RichText::new(name).strong().size(11.0));
            ui.label(RichText::new(value).size(11.0));
            ui.add_space(8.0);
        };

        ui.horizontal_wrapped(|ui| {
            cell(ui, "N", stats.count.to_string());
            cell(ui, "Mean", format!("{:.4}", stats.mean));
            cell(ui, "Median", format!("{:.4}", stats.median));
            cell(ui, "Std", format!("{:.4}", stats.std));
            cell(ui, "Min", format!("{:.4}", stats.min));
            cell(ui, "Max", format!("{:.4}", stats.max));
            cell(ui, "P05", format!("{:.4}", stats.p05));
            cell(ui, "P95", format!("{:.4}", stats.p95));

            if let Some((lo, hi)) = stats.mean_ci95 {
                cell(ui, "Mean 95% CI", format!("[{:.4}, {:.4}]", lo, hi));
            }
            if let Some(p) = stats.p_value_zero_mean {
                let color = if stats.is_biased() {
                    WARN_COLOR
                } else {
                    ui.visuals().text_color()
                };
                ui.label(RichText::new("P(mean=0)").strong().size(11.0));
                ui.label(RichText::new(format!("{:.4}", p)).size(11.0).color(color));
                ui.add_space(8.0);
            }

            if rejected > 0 {
                ui.label(
                    RichText::new(format!("⚠ {} rows skipped", rejected))
                        .size(11.0)
                        .color(WARN_COLOR),
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_x_row_index() {
        assert_eq!(ChartPlotter::format_x(XSource::RowIndex, 12.0), "12");
        assert_eq!(ChartPlotter::format_x(XSource::RowIndex, 2.5), "");
        assert_eq!(ChartPlotter::format_x(XSource::RowIndex, -1.0), "");
    }

    #[test]
    fn test_format_x_time_column_is_utc() {
        // 2020-07-04T12:34:56Z
        let ms = 1_593_866_096_000.0;
        assert_eq!(ChartPlotter::format_x(XSource::Column(3), ms), "12:34:56");
    }
}
