//! Chart Series Module
//! Turns an in-memory delta/DOP CSV into ordered chart coordinates.

use csv::{ReaderBuilder, Trim};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("Input contains no rows")]
    EmptyInput,
    #[error("Failed to split CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// A single chart coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

/// Why a data row did not produce a point.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    MissingColumn { column: usize, found: usize },
    NotANumber { column: usize, value: String },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingColumn { column, found } => {
                write!(f, "column {} missing (row has {} fields)", column, found)
            }
            RejectReason::NotANumber { column, value } => {
                write!(f, "column {} is not a number: {:?}", column, value)
            }
        }
    }
}

/// A data row that was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// Data row ordinal, 1-based, header and blank lines excluded
    pub row: usize,
    /// Line in the source text, 1-based
    pub line: u64,
    pub reason: RejectReason,
}

/// Where the x coordinate of a point comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XSource {
    /// Zero-based data row ordinal
    RowIndex,
    /// A numeric column of the row
    Column(usize),
}

/// Column holding the epoch-millisecond time in a DOP CSV.
pub const DOP_TIME_COLUMN: usize = 3;

/// Ordered points extracted from one CSV plus the rows that were skipped.
#[derive(Debug, Clone, Default)]
pub struct Series {
    pub points: Vec<DataPoint>,
    pub rejected: Vec<RejectedRow>,
}

impl Series {
    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Points of a delta CSV: `y` from `column`, `x` is the sample index.
pub fn delta_points(csv: &str, column: usize) -> Result<Series, SeriesError> {
    extract_series(csv, XSource::RowIndex, column)
}

/// Points of a DOP CSV: `x` is the time column, `y` from `dop_column`.
pub fn dop_points(csv: &str, dop_column: usize) -> Result<Series, SeriesError> {
    extract_series(csv, XSource::Column(DOP_TIME_COLUMN), dop_column)
}

/// Non-blank lines with their 1-based line numbers.
///
/// `\n`, `\r\n` and a lone `\r` each end a line.
fn source_lines(text: &str) -> Vec<(u64, &str)> {
    text.split('\n')
        .flat_map(|piece| piece.strip_suffix('\r').unwrap_or(piece).split('\r'))
        .zip(1u64..)
        .filter(|(line, _)| !line.trim().is_empty())
        .map(|(line, number)| (number, line))
        .collect()
}

/// Skip the header (first non-blank line) and blank lines, split each row on
/// commas and coerce the requested columns to numbers.
///
/// Every data row ends up either in `points` or in `rejected`.
pub fn extract_series(csv: &str, x: XSource, y_column: usize) -> Result<Series, SeriesError> {
    let lines = source_lines(csv);
    let Some((_, data_lines)) = lines.split_first() else {
        return Err(SeriesError::EmptyInput);
    };

    // One record per kept line: no quoting, no empty lines left to drop.
    let body = lines
        .iter()
        .map(|(_, text)| *text)
        .collect::<Vec<_>>()
        .join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let mut series = Series::default();

    for (index, (result, (line, _))) in reader.records().zip(data_lines).enumerate() {
        let record = result?;
        let row = index + 1;
        let line = *line;

        let parsed = parse_field(&record, y_column).and_then(|y| {
            let x = match x {
                XSource::RowIndex => index as f64,
                XSource::Column(column) => parse_field(&record, column)?,
            };
            Ok(DataPoint { x, y })
        });

        match parsed {
            Ok(point) => series.points.push(point),
            Err(reason) => {
                warn!(row, line, %reason, "Skipping CSV row");
                series.rejected.push(RejectedRow { row, line, reason });
            }
        }
    }

    debug!(
        points = series.points.len(),
        rejected = series.rejected.len(),
        "Extracted series"
    );
    Ok(series)
}

fn parse_field(record: &csv::StringRecord, column: usize) -> Result<f64, RejectReason> {
    let value = record.get(column).ok_or(RejectReason::MissingColumn {
        column,
        found: record.len(),
    })?;

    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RejectReason::NotANumber {
            column,
            value: value.to_string(),
        })
}
