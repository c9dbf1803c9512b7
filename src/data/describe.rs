//! Human-readable sentence descriptions for the record inspector.

use crate::data::nmea::Sentence;
use chrono::{NaiveTime, Timelike};
use std::fmt::Write;

fn opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

fn utc(time: &Option<NaiveTime>) -> String {
    time.map(|t| {
        format!(
            "{}h:{}m:{}s",
            t.hour(),
            t.minute(),
            (t.second() as f64 + t.nanosecond() as f64 / 1e9).round()
        )
    })
    .unwrap_or_else(|| "n/a".to_string())
}

fn fix_quality(quality: Option<u8>) -> &'static str {
    match quality {
        Some(0) => "invalid",
        Some(1) => "GPS fix",
        Some(2) => "DGPS fix",
        Some(3) => "PPS fix",
        Some(4) => "RTK fixed",
        Some(5) => "RTK float",
        Some(6) => "estimated",
        Some(7) => "manual input",
        Some(8) => "simulation",
        _ => "n/a",
    }
}

fn mode(mode: Option<char>) -> &'static str {
    match mode {
        Some('A') => "autonomous",
        Some('D') => "differential",
        Some('E') => "estimated",
        Some('M') => "manual",
        Some('S') => "simulator",
        Some('N') => "data not valid",
        _ => "n/a",
    }
}

fn validity(valid: bool) -> &'static str {
    if valid {
        "valid"
    } else {
        "not valid"
    }
}

/// Multi-line field listing for a sentence; empty for unknown sentences.
pub fn describe(sentence: &Sentence) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_description(&mut out, sentence);
    out
}

fn write_description(out: &mut String, sentence: &Sentence) -> std::fmt::Result {
    match sentence {
        Sentence::Gga(gga) => {
            writeln!(out, "UTC time: {}", utc(&gga.time))?;
            if let Some(pos) = gga.position {
                writeln!(
                    out,
                    "Latitude: {:.6}\u{00B0} {}",
                    pos.latitude.abs(),
                    pos.latitude_hemisphere()
                )?;
                writeln!(
                    out,
                    "Longitude: {:.6}\u{00B0} {}",
                    pos.longitude.abs(),
                    pos.longitude_hemisphere()
                )?;
            }
            writeln!(out, "Altitude above sea level: {} m", opt(&gga.altitude))?;
            writeln!(out, "Fix quality: {}", fix_quality(gga.fix_quality))?;
            writeln!(out, "Satellites in use: {}", opt(&gga.satellites))?;
            writeln!(out, "Horizontal dilution of precision (HDOP): {}", opt(&gga.hdop))
        }
        Sentence::Gll(gll) => {
            if let Some(pos) = gll.position {
                writeln!(
                    out,
                    "Latitude: {} {:.6}\u{00B0}",
                    pos.latitude_hemisphere(),
                    pos.latitude.abs()
                )?;
                writeln!(
                    out,
                    "Longitude: {} {:.6}\u{00B0}",
                    pos.longitude_hemisphere(),
                    pos.longitude.abs()
                )?;
            }
            writeln!(out, "UTC time: {}", utc(&gll.time))?;
            writeln!(out, "Position status: {}", validity(gll.valid))?;
            writeln!(out, "Positioning mode: {}", mode(gll.mode))
        }
        Sentence::Gsa(gsa) => {
            let selection = match gsa.selection_mode {
                Some('A') => "automatic",
                Some('M') => "manual",
                _ => "n/a",
            };
            let fix = match gsa.fix_type {
                Some(1) => "no fix",
                Some(2) => "2D",
                Some(3) => "3D",
                _ => "n/a",
            };
            let ids: Vec<String> = gsa.satellite_ids.iter().map(|id| id.to_string()).collect();
            writeln!(out, "2D/3D selection mode: {}", selection)?;
            writeln!(out, "Fix type: {}", fix)?;
            writeln!(out, "Active satellite ids: [{}]", ids.join(", "))?;
            writeln!(out, "Position dilution of precision (PDOP): {}", opt(&gsa.pdop))?;
            writeln!(out, "Horizontal dilution of precision (HDOP): {}", opt(&gsa.hdop))?;
            writeln!(out, "Vertical dilution of precision (VDOP): {}", opt(&gsa.vdop))?;
            writeln!(out, "Talker: {}", gsa.talker)
        }
        Sentence::Zda(zda) => {
            writeln!(out, "UTC time: {}", utc(&zda.time))?;
            let date = zda
                .date
                .map(|d| d.format("%d.%m.%Y").to_string())
                .unwrap_or_else(|| "n/a".to_string());
            writeln!(out, "Date: {}", date)
        }
        Sentence::Rmc(rmc) => {
            writeln!(out, "UTC time: {}", utc(&rmc.time))?;
            writeln!(out, "Position status: {}", validity(rmc.valid))?;
            if let Some(pos) = rmc.position {
                writeln!(out, "Latitude: {:.6}", pos.latitude)?;
                writeln!(out, "Longitude: {:.6}", pos.longitude)?;
            }
            writeln!(out, "Speed over ground: {} kn", opt(&rmc.speed_knots))?;
            writeln!(out, "Course over ground: {}\u{00B0}", opt(&rmc.course))?;
            writeln!(out, "Date: {}", opt(&rmc.date))?;
            writeln!(out, "Magnetic variation: {}", opt(&rmc.magnetic_variation))?;
            writeln!(out, "Positioning mode: {}", mode(rmc.mode))
        }
        Sentence::Gsv(gsv) => {
            writeln!(out, "Messages in cycle: {}", gsv.message_count)?;
            writeln!(out, "Message number: {}", gsv.message_index)?;
            writeln!(out, "Satellites in view: {}", gsv.satellites_in_view)?;
            for sat in &gsv.satellites {
                writeln!(
                    out,
                    "Satellite {}: elevation {}\u{00B0}, azimuth {}\u{00B0}, SNR {} dB",
                    sat.prn,
                    opt(&sat.elevation),
                    opt(&sat.azimuth),
                    opt(&sat.snr)
                )?;
            }
            Ok(())
        }
        Sentence::Vtg(vtg) => {
            writeln!(out, "True course: {}\u{00B0}", opt(&vtg.true_course))?;
            writeln!(out, "Magnetic course: {}\u{00B0}", opt(&vtg.magnetic_course))?;
            writeln!(out, "Speed: {} km/h", opt(&vtg.speed_kmh))?;
            writeln!(out, "Speed: {} kn", opt(&vtg.speed_knots))?;
            writeln!(out, "Speed and course mode: {}", mode(vtg.mode))
        }
        Sentence::Unknown { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::nmea::parse_sentence;

    #[test]
    fn test_describe_gga() {
        let gga = parse_sentence(
            "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47",
        )
        .unwrap();
        let text = describe(&gga);
        assert!(text.starts_with("UTC time: 12h:35m:19s\n"));
        assert!(text.contains("Latitude: 48.117300\u{00B0} N"));
        assert!(text.contains("Fix quality: GPS fix"));
        assert!(text.contains("Satellites in use: 8"));
        assert!(text.contains("(HDOP): 0.9"));
    }

    #[test]
    fn test_describe_gsa_lists_ids_and_dops() {
        let gsa = parse_sentence("$GPGSA,A,3,04,05,,,,,,,,,,,2.5,1.3,2.1").unwrap();
        let text = describe(&gsa);
        assert!(text.contains("Fix type: 3D"));
        assert!(text.contains("Active satellite ids: [4, 5]"));
        assert!(text.contains("(VDOP): 2.1"));
    }

    #[test]
    fn test_describe_zda_date() {
        let zda = parse_sentence("$GPZDA,201530.00,04,07,2002,00,00").unwrap();
        assert_eq!(describe(&zda), "UTC time: 20h:15m:30s\nDate: 04.07.2002\n");
    }

    #[test]
    fn test_unknown_sentence_has_no_description() {
        let unknown = Sentence::Unknown {
            raw: "$PUBX,00".to_string(),
        };
        assert_eq!(describe(&unknown), "");
    }

    #[test]
    fn test_missing_values_show_placeholder() {
        let vtg = parse_sentence("$GPVTG,,T,,M,0.0,N,0.0,K,N").unwrap();
        let text = describe(&vtg);
        assert!(text.contains("True course: n/a"));
        assert!(text.contains("mode: data not valid"));
    }
}
