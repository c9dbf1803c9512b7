//! Export Module
//! Builds the DOP and delta tables from NMEA records and writes them as CSV.

use crate::charts::{DELTA_CSV_HEADER, DOP_CSV_HEADER};
use crate::data::records::Record;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No records with a usable fix")]
    NoData,
}

/// One line of the DOP table.
#[derive(Debug, Clone, PartialEq)]
pub struct DopRow {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: Option<f64>,
    pub time: i64,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    pub pdop: Option<f64>,
}

/// One line of the delta table; deltas are taken from the mean position.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaRow {
    pub latitude: f64,
    pub longitude: f64,
    pub time: i64,
    pub lat_m: f64,
    pub long_m: f64,
    pub sat_q: Option<u32>,
}

/// Position entry of the JSON export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionEntry {
    pub latitude: String,
    pub lat_hemisphere: String,
    pub longitude: String,
    pub lon_hemisphere: String,
}

/// Records with a GGA position, a GSA and a date.
pub fn dop_rows(records: &[Record]) -> Vec<DopRow> {
    let rows: Vec<DopRow> = records
        .iter()
        .filter_map(|record| {
            let gga = record.gga()?;
            let position = gga.position?;
            let gsa = record.gsa()?;
            let time = record.timestamp_ms()?;
            Some(DopRow {
                longitude: position.longitude,
                latitude: position.latitude,
                altitude: gga.altitude,
                time,
                hdop: gsa.hdop,
                vdop: gsa.vdop,
                pdop: gsa.pdop,
            })
        })
        .collect();

    let skipped = records.len() - rows.len();
    if skipped > 0 {
        warn!(skipped, "Records without GGA, GSA or date left out of DOP table");
    }
    rows
}

/// Records with a GGA position and a date, as deltas from their mean position.
///
/// Metric deltas use a local equirectangular projection around the mean.
pub fn delta_rows(records: &[Record], earth_radius_m: f64) -> Vec<DeltaRow> {
    let fixes: Vec<(f64, f64, i64, Option<u32>)> = records
        .iter()
        .filter_map(|record| {
            let gga = record.gga()?;
            let position = gga.position?;
            let time = record.timestamp_ms()?;
            Some((
                position.latitude,
                position.longitude,
                time,
                gga.satellites.map(u32::from),
            ))
        })
        .collect();

    if fixes.is_empty() {
        return Vec::new();
    }

    let n = fixes.len() as f64;
    let ref_lat = fixes.iter().map(|f| f.0).sum::<f64>() / n;
    let ref_lon = fixes.iter().map(|f| f.1).sum::<f64>() / n;
    let cos_lat = ref_lat.to_radians().cos();

    fixes
        .into_iter()
        .map(|(lat, lon, time, sat_q)| {
            let d_lat = lat - ref_lat;
            let d_lon = lon - ref_lon;
            DeltaRow {
                latitude: d_lat,
                longitude: d_lon,
                time,
                lat_m: d_lat.to_radians() * earth_radius_m,
                long_m: d_lon.to_radians() * earth_radius_m * cos_lat,
                sat_q,
            }
        })
        .collect()
}

/// DOP table with columns `longitude,latitude,altitude,time,hdop,vdop,pdop`.
pub fn dop_frame(rows: &[DopRow]) -> Result<DataFrame, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NoData);
    }
    let [lon, lat, alt, time, hdop, vdop, pdop] = DOP_CSV_HEADER;

    let df = DataFrame::new(vec![
        Column::new(lon.into(), rows.iter().map(|r| r.longitude).collect::<Vec<f64>>()),
        Column::new(lat.into(), rows.iter().map(|r| r.latitude).collect::<Vec<f64>>()),
        Column::new(alt.into(), rows.iter().map(|r| r.altitude).collect::<Vec<Option<f64>>>()),
        Column::new(time.into(), rows.iter().map(|r| r.time).collect::<Vec<i64>>()),
        Column::new(hdop.into(), rows.iter().map(|r| r.hdop).collect::<Vec<Option<f64>>>()),
        Column::new(vdop.into(), rows.iter().map(|r| r.vdop).collect::<Vec<Option<f64>>>()),
        Column::new(pdop.into(), rows.iter().map(|r| r.pdop).collect::<Vec<Option<f64>>>()),
    ])?;
    Ok(df)
}

/// Delta table with columns `latitude,longitude,time,lat_m,long_m,sat_q`.
pub fn delta_frame(rows: &[DeltaRow]) -> Result<DataFrame, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NoData);
    }
    let [lat, lon, time, lat_m, long_m, sat_q] = DELTA_CSV_HEADER;

    let df = DataFrame::new(vec![
        Column::new(lat.into(), rows.iter().map(|r| r.latitude).collect::<Vec<f64>>()),
        Column::new(lon.into(), rows.iter().map(|r| r.longitude).collect::<Vec<f64>>()),
        Column::new(time.into(), rows.iter().map(|r| r.time).collect::<Vec<i64>>()),
        Column::new(lat_m.into(), rows.iter().map(|r| r.lat_m).collect::<Vec<f64>>()),
        Column::new(long_m.into(), rows.iter().map(|r| r.long_m).collect::<Vec<f64>>()),
        Column::new(sat_q.into(), rows.iter().map(|r| r.sat_q).collect::<Vec<Option<u32>>>()),
    ])?;
    Ok(df)
}

/// Write a table as comma-separated text with a header line.
pub fn write_csv<W: Write>(df: &mut DataFrame, writer: W) -> Result<(), ExportError> {
    CsvWriter::new(writer).include_header(true).finish(df)?;
    Ok(())
}

pub fn write_dop_csv<W: Write>(rows: &[DopRow], writer: W) -> Result<(), ExportError> {
    let mut df = dop_frame(rows)?;
    write_csv(&mut df, writer)?;
    info!(rows = rows.len(), "Wrote DOP table");
    Ok(())
}

pub fn write_delta_csv<W: Write>(rows: &[DeltaRow], writer: W) -> Result<(), ExportError> {
    let mut df = delta_frame(rows)?;
    write_csv(&mut df, writer)?;
    info!(rows = rows.len(), "Wrote delta table");
    Ok(())
}

/// Write the DOP table to `path`; nothing is created when there are no rows.
pub fn save_dop_csv(rows: &[DopRow], path: &Path) -> Result<(), ExportError> {
    let mut df = dop_frame(rows)?;
    write_csv(&mut df, BufWriter::new(File::create(path)?))?;
    info!(rows = rows.len(), path = %path.display(), "Saved DOP table");
    Ok(())
}

/// Write the delta table to `path`; nothing is created when there are no rows.
pub fn save_delta_csv(rows: &[DeltaRow], path: &Path) -> Result<(), ExportError> {
    let mut df = delta_frame(rows)?;
    write_csv(&mut df, BufWriter::new(File::create(path)?))?;
    info!(rows = rows.len(), path = %path.display(), "Saved delta table");
    Ok(())
}

/// Positions of every record with a GGA fix, coordinates to 2 decimals.
pub fn positions_json(records: &[Record]) -> Result<String, ExportError> {
    let entries: Vec<PositionEntry> = records
        .iter()
        .filter_map(|record| record.gga()?.position)
        .map(|position| PositionEntry {
            latitude: format!("{:.2}", position.latitude.abs()),
            lat_hemisphere: position.latitude_hemisphere().to_string(),
            longitude: format!("{:.2}", position.longitude.abs()),
            lon_hemisphere: position.longitude_hemisphere().to_string(),
        })
        .collect();

    if entries.is_empty() {
        return Err(ExportError::NoData);
    }
    Ok(serde_json::to_string(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::tests::LOG;
    use crate::data::records::{group_records, RecordGrouping};
    use crate::data::series::{delta_points, dop_points};

    const EARTH_RADIUS_M: f64 = 6_371_008.8;

    fn records() -> Vec<Record> {
        group_records(LOG, RecordGrouping::Delimited)
    }

    #[test]
    fn test_dop_rows_pick_gga_and_gsa() {
        let rows = dop_rows(&records());
        assert_eq!(rows.len(), 2);
        assert!((rows[0].latitude - 55.75).abs() < 1e-9);
        assert_eq!(rows[0].altitude, Some(150.0));
        assert_eq!(rows[0].pdop, Some(1.8));
        assert_eq!(rows[1].vdop, Some(1.7));
        assert_eq!(rows[1].time - rows[0].time, 86_400_000 + 1_000);
    }

    #[test]
    fn test_delta_rows_center_on_mean() {
        let rows = delta_rows(&records(), EARTH_RADIUS_M);
        assert_eq!(rows.len(), 2);
        let lat_sum: f64 = rows.iter().map(|r| r.latitude).sum();
        assert!(lat_sum.abs() < 1e-12);

        // 0.0001 degrees of latitude is about 11.1 m
        let spread = rows[1].lat_m - rows[0].lat_m;
        assert!((spread - 11.119).abs() < 0.01, "spread was {}", spread);
        assert!(rows[1].long_m > 0.0);
        assert_eq!(rows[0].sat_q, Some(8));
    }

    #[test]
    fn test_delta_csv_feeds_chart_series() {
        let rows = delta_rows(&records(), EARTH_RADIUS_M);
        let mut out = Vec::new();
        write_delta_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("latitude,longitude,time,lat_m,long_m,sat_q\n"));
        let sats = delta_points(&text, 5).unwrap();
        assert_eq!(sats.ys(), vec![8.0, 9.0]);
    }

    #[test]
    fn test_dop_csv_feeds_chart_series() {
        let rows = dop_rows(&records());
        let mut out = Vec::new();
        write_dop_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("longitude,latitude,altitude,time,hdop,vdop,pdop\n"));
        let hdop = dop_points(&text, 4).unwrap();
        assert_eq!(hdop.ys(), vec![0.9, 1.0]);
        assert_eq!(hdop.points[0].x, rows[0].time as f64);
    }

    #[test]
    fn test_empty_tables_are_rejected() {
        assert!(matches!(dop_frame(&[]), Err(ExportError::NoData)));
        assert!(matches!(delta_frame(&[]), Err(ExportError::NoData)));
        assert!(matches!(positions_json(&[]), Err(ExportError::NoData)));
    }

    #[test]
    fn test_saving_empty_table_creates_no_file() {
        let dir = std::env::temp_dir();
        let dop = dir.join(format!("gnss_empty_dop_{}.csv", std::process::id()));
        let delta = dir.join(format!("gnss_empty_delta_{}.csv", std::process::id()));

        assert!(matches!(save_dop_csv(&[], &dop), Err(ExportError::NoData)));
        assert!(matches!(save_delta_csv(&[], &delta), Err(ExportError::NoData)));
        assert!(!dop.exists());
        assert!(!delta.exists());
    }

    #[test]
    fn test_save_delta_csv_writes_file() {
        let path = std::env::temp_dir().join(format!("gnss_delta_{}.csv", std::process::id()));
        save_delta_csv(&delta_rows(&records(), EARTH_RADIUS_M), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(delta_points(&text, 5).unwrap().ys(), vec![8.0, 9.0]);
    }

    #[test]
    fn test_positions_json_format() {
        let json = positions_json(&records()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["latitude"], "55.75");
        assert_eq!(value[0]["latHemisphere"], "N");
        assert_eq!(value[0]["longitude"], "37.62");
        assert_eq!(value[0]["lonHemisphere"], "E");
    }
}
