//! Chart Set Module
//! Which columns feed which chart, and turning a CSV into chart-ready data.

use crate::data::{extract_series, Series, SeriesError, XSource, DOP_TIME_COLUMN};
use crate::stats::{SeriesStats, StatsCalculator};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DELTA_CSV_HEADER: [&str; 6] =
    ["latitude", "longitude", "time", "lat_m", "long_m", "sat_q"];
pub const DOP_CSV_HEADER: [&str; 7] =
    ["longitude", "latitude", "altitude", "time", "hdop", "vdop", "pdop"];

/// Units of the delta charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    #[default]
    Degrees,
    Meters,
}

impl Units {
    pub fn label(&self) -> &'static str {
        match self {
            Units::Degrees => "degrees",
            Units::Meters => "meters",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Delta,
    Dop,
}

/// One chart: title plus where its coordinates come from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub id: &'static str,
    pub title: String,
    pub x_label: &'static str,
    pub y_label: String,
    pub x_source: XSource,
    pub y_column: usize,
}

/// Extracted series and statistics for one chart.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub spec: ChartSpec,
    pub series: Series,
    pub stats: SeriesStats,
}

/// Latitude delta, longitude delta and satellite count charts.
pub fn delta_charts(units: Units) -> [ChartSpec; 3] {
    let (lat_column, lon_column) = match units {
        Units::Degrees => (0, 1),
        Units::Meters => (3, 4),
    };
    let unit = units.label();

    [
        ChartSpec {
            id: "latitude_delta",
            title: format!("Latitude Delta (in {})", unit),
            x_label: "Sample",
            y_label: unit.to_string(),
            x_source: XSource::RowIndex,
            y_column: lat_column,
        },
        ChartSpec {
            id: "longitude_delta",
            title: format!("Longitude Delta (in {})", unit),
            x_label: "Sample",
            y_label: unit.to_string(),
            x_source: XSource::RowIndex,
            y_column: lon_column,
        },
        ChartSpec {
            id: "satellite_count",
            title: "Satellite count".to_string(),
            x_label: "Sample",
            y_label: "satellites".to_string(),
            x_source: XSource::RowIndex,
            y_column: 5,
        },
    ]
}

/// HDOP, VDOP and PDOP against time.
pub fn dop_charts() -> [ChartSpec; 3] {
    let chart = |id, title: &str, y_column| ChartSpec {
        id,
        title: title.to_string(),
        x_label: "Time (UTC)",
        y_label: title.to_string(),
        x_source: XSource::Column(DOP_TIME_COLUMN),
        y_column,
    };
    [
        chart("hdop", "HDOP", 4),
        chart("vdop", "VDOP", 5),
        chart("pdop", "PDOP", 6),
    ]
}

pub fn chart_specs(kind: ChartKind, units: Units) -> [ChartSpec; 3] {
    match kind {
        ChartKind::Delta => delta_charts(units),
        ChartKind::Dop => dop_charts(),
    }
}

/// Extract every chart of the set from one CSV text, in parallel.
pub fn build_chart_set(
    csv: &str,
    kind: ChartKind,
    units: Units,
) -> Result<Vec<ChartData>, SeriesError> {
    let charts = chart_specs(kind, units)
        .into_par_iter()
        .map(|spec| {
            let series = extract_series(csv, spec.x_source, spec.y_column)?;
            let stats = StatsCalculator::compute_series_stats(&series.ys());
            Ok(ChartData {
                spec,
                series,
                stats,
            })
        })
        .collect::<Result<Vec<_>, SeriesError>>()?;

    info!(?kind, ?units, charts = charts.len(), "Built chart set");
    Ok(charts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: &str = "latitude,longitude,time,lat_m,long_m,sat_q\n\
        0.0001,-0.0002,1600000000000,11.1,-13.9,8\n\
        -0.0001,0.0002,1600000001000,-11.1,13.9,9\n";

    #[test]
    fn test_delta_titles_follow_units() {
        let degrees = delta_charts(Units::Degrees);
        assert_eq!(degrees[0].title, "Latitude Delta (in degrees)");
        assert_eq!(degrees[1].title, "Longitude Delta (in degrees)");
        assert_eq!(degrees[2].title, "Satellite count");
        assert_eq!((degrees[0].y_column, degrees[1].y_column), (0, 1));

        let meters = delta_charts(Units::Meters);
        assert_eq!(meters[0].title, "Latitude Delta (in meters)");
        assert_eq!(meters[1].title, "Longitude Delta (in meters)");
        assert_eq!((meters[0].y_column, meters[1].y_column), (3, 4));
        assert_eq!(meters[2].y_column, 5);
    }

    #[test]
    fn test_dop_charts_read_time_and_dop_columns() {
        let charts = dop_charts();
        assert!(charts
            .iter()
            .all(|c| c.x_source == XSource::Column(DOP_TIME_COLUMN)));
        assert_eq!(
            charts.iter().map(|c| c.y_column).collect::<Vec<_>>(),
            vec![4, 5, 6]
        );
        assert_eq!(DOP_CSV_HEADER[DOP_TIME_COLUMN], "time");
    }

    #[test]
    fn test_build_chart_set_keeps_chart_order() {
        let charts = build_chart_set(DELTA, ChartKind::Delta, Units::Meters).unwrap();
        let ids: Vec<&str> = charts.iter().map(|c| c.spec.id).collect();
        assert_eq!(ids, vec!["latitude_delta", "longitude_delta", "satellite_count"]);
        assert_eq!(charts[0].series.ys(), vec![11.1, -11.1]);
        assert_eq!(charts[2].stats.mean, 8.5);
    }

    #[test]
    fn test_build_chart_set_propagates_empty_input() {
        assert!(matches!(
            build_chart_set("", ChartKind::Dop, Units::Degrees),
            Err(SeriesError::EmptyInput)
        ));
    }
}
