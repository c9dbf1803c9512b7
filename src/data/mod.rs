//! Data module - CSV series, NMEA parsing and table export

mod describe;
mod export;
mod nmea;
mod records;
mod series;

pub use describe::describe;
pub use export::{
    delta_rows, dop_rows, positions_json, save_delta_csv, save_dop_csv, write_delta_csv,
    write_dop_csv, DeltaRow, DopRow, ExportError,
};
pub use nmea::{parse_line, parse_sentence, NmeaError, Position, Sentence};
pub use records::{filter_by_date, group_records, Record, RecordGrouping};
pub use series::{
    delta_points, dop_points, extract_series, DataPoint, RejectReason, RejectedRow, Series,
    SeriesError, XSource, DOP_TIME_COLUMN,
};
