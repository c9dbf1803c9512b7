//! Stats module - Series statistics

mod calculator;

pub use calculator::{SeriesStats, StatsCalculator};
