//! Static Chart Renderer
//! Renders chart sets to PNG files with plotters.
//!
//! Layout of each image:
//! 1. Title centered on top
//! 2. Line chart with labelled axes and a light mesh
//! 3. Footer with N / mean / std and the skipped row count

use crate::charts::plotter::ChartPlotter;
use crate::charts::ChartData;
use crate::data::XSource;
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Image buffer has wrong size")]
    Buffer,
    #[error("Invalid image size {width}x{height}")]
    Size { width: u32, height: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

const LINE: RGBColor = RGBColor(52, 152, 219);
const GRID: RGBColor = RGBColor(220, 220, 220);

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Padded axis range; empty or flat data falls back to a unit window.
    pub fn axis_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
        let (min, max) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min.is_infinite() {
            return (-1.0, 1.0);
        }
        if min == max {
            return (min - 1.0, max + 1.0);
        }
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    }

    /// RGB buffer size; zero or overflowing dimensions are rejected.
    pub fn buffer_len(width: u32, height: u32) -> Result<usize, RenderError> {
        let invalid = RenderError::Size { width, height };
        if width == 0 || height == 0 {
            return Err(invalid);
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .filter(|&len| len <= isize::MAX as usize)
            .ok_or(invalid)
    }

    /// Render one chart into PNG bytes.
    pub fn render_png(chart: &ChartData, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let mut buffer = vec![0u8; Self::buffer_len(width, height)?];
        Self::draw(chart, &mut buffer, width, height)
            .map_err(|e| RenderError::Drawing(e.to_string()))?;

        let image = RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer)?;
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }

    fn draw(
        chart: &ChartData,
        buffer: &mut [u8],
        width: u32,
        height: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::with_buffer(buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        let (plot_area, footer) = root.split_vertically(height.saturating_sub(24));

        let points = &chart.series.points;
        let x_range = Self::axis_range(points.iter().map(|p| p.x));
        let y_range = Self::axis_range(points.iter().map(|p| p.y));
        let x_source = chart.spec.x_source;

        let mut ctx = ChartBuilder::on(&plot_area)
            .caption(&chart.spec.title, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(36)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;

        ctx.configure_mesh()
            .light_line_style(GRID)
            .x_desc(chart.spec.x_label)
            .y_desc(chart.spec.y_label.as_str())
            .x_label_formatter(&|x| match x_source {
                XSource::RowIndex => format!("{:.0}", x),
                XSource::Column(_) => ChartPlotter::format_x(x_source, *x),
            })
            .y_label_formatter(&|y| format!("{:.4}", y))
            .draw()?;

        ctx.draw_series(LineSeries::new(
            points.iter().map(|p| (p.x, p.y)),
            LINE.stroke_width(2),
        ))?;

        let stats = &chart.stats;
        let summary = format!(
            "N = {}   mean = {:.4}   std = {:.4}   skipped rows = {}",
            stats.count,
            stats.mean,
            stats.std,
            chart.series.rejected.len()
        );
        footer.draw_text(&summary, &("sans-serif", 14).into_font().color(&BLACK), (12, 4))?;

        root.present()?;
        Ok(())
    }

    /// Write `<chart id>.png` for every chart into `out_dir`.
    pub fn write_chart_set(
        charts: &[ChartData],
        out_dir: &Path,
        width: u32,
        height: u32,
    ) -> Result<Vec<PathBuf>, RenderError> {
        std::fs::create_dir_all(out_dir)?;
        let mut written = Vec::with_capacity(charts.len());

        for chart in charts {
            let png = Self::render_png(chart, width, height)?;
            let path = out_dir.join(format!("{}.png", chart.spec.id));
            std::fs::write(&path, png)?;
            info!(path = %path.display(), "Wrote chart image");
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_range_pads_five_percent() {
        let (lo, hi) = StaticChartRenderer::axis_range([0.0, 10.0].into_iter());
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_axis_range_fallbacks() {
        assert_eq!(
            StaticChartRenderer::axis_range(std::iter::empty()),
            (-1.0, 1.0)
        );
        assert_eq!(
            StaticChartRenderer::axis_range([3.0, 3.0].into_iter()),
            (2.0, 4.0)
        );
        assert_eq!(
            StaticChartRenderer::axis_range([f64::NAN, 2.0, 2.0].into_iter()),
            (1.0, 3.0)
        );
    }

    #[test]
    fn test_buffer_len_rejects_bad_sizes() {
        assert_eq!(StaticChartRenderer::buffer_len(1200, 400).unwrap(), 1_440_000);
        assert!(matches!(
            StaticChartRenderer::buffer_len(0, 400),
            Err(RenderError::Size { width: 0, height: 400 })
        ));
        assert!(matches!(
            StaticChartRenderer::buffer_len(640, 0),
            Err(RenderError::Size { .. })
        ));
        // 4.8e9 bytes overflows u32 arithmetic but not usize on 64-bit targets
        #[cfg(target_pointer_width = "64")]
        assert_eq!(
            StaticChartRenderer::buffer_len(40_000, 40_000).unwrap(),
            4_800_000_000
        );
        assert!(StaticChartRenderer::buffer_len(u32::MAX, u32::MAX).is_err());
    }
}
