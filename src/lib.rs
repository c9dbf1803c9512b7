//! GNSS Delta Viewer - position delta and DOP charts for GNSS logs
//!
//! Reads the delta/DOP CSV tables produced from NMEA-0183 receiver logs and
//! shows them as line charts, either in the desktop viewer or as PNG files.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod stats;
