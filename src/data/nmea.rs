//! NMEA-0183 Sentence Parser
//! Parses receiver log lines into typed sentences.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq)]
pub enum NmeaError {
    #[error("Sentence must start with '$' or '!'")]
    MissingStart,
    #[error("Sentence address too short: {0:?}")]
    BadAddress(String),
    #[error("Invalid checksum field: {0:?}")]
    BadChecksum(String),
    #[error("Checksum mismatch: expected {expected:02X}, computed {computed:02X}")]
    ChecksumMismatch { expected: u8, computed: u8 },
    #[error("{sentence} has {found} fields, needs {needed}")]
    TooFewFields {
        sentence: &'static str,
        found: usize,
        needed: usize,
    },
    #[error("Invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Signed decimal-degree position (north and east positive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn latitude_hemisphere(&self) -> char {
        if self.latitude < 0.0 {
            'S'
        } else {
            'N'
        }
    }

    pub fn longitude_hemisphere(&self) -> char {
        if self.longitude < 0.0 {
            'W'
        } else {
            'E'
        }
    }
}

/// GGA: fix data.
#[derive(Debug, Clone, PartialEq)]
pub struct Gga {
    pub talker: String,
    pub time: Option<NaiveTime>,
    pub position: Option<Position>,
    pub fix_quality: Option<u8>,
    pub satellites: Option<u8>,
    pub hdop: Option<f64>,
    pub altitude: Option<f64>,
    pub geoid_separation: Option<f64>,
    pub dgps_age: Option<f64>,
    pub dgps_station: Option<String>,
}

/// GSA: DOP and active satellites.
#[derive(Debug, Clone, PartialEq)]
pub struct Gsa {
    pub talker: String,
    pub selection_mode: Option<char>,
    pub fix_type: Option<u8>,
    pub satellite_ids: Vec<u16>,
    pub pdop: Option<f64>,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteInfo {
    pub prn: u16,
    pub elevation: Option<u8>,
    pub azimuth: Option<u16>,
    pub snr: Option<u8>,
}

/// GSV: satellites in view.
#[derive(Debug, Clone, PartialEq)]
pub struct Gsv {
    pub talker: String,
    pub message_count: u8,
    pub message_index: u8,
    pub satellites_in_view: u16,
    pub satellites: Vec<SatelliteInfo>,
}

/// ZDA: UTC date and time.
#[derive(Debug, Clone, PartialEq)]
pub struct Zda {
    pub talker: String,
    pub time: Option<NaiveTime>,
    pub date: Option<NaiveDate>,
    pub zone_hours: Option<i8>,
    pub zone_minutes: Option<u8>,
}

/// RMC: recommended minimum data.
#[derive(Debug, Clone, PartialEq)]
pub struct Rmc {
    pub talker: String,
    pub time: Option<NaiveTime>,
    pub valid: bool,
    pub position: Option<Position>,
    pub speed_knots: Option<f64>,
    pub course: Option<f64>,
    pub date: Option<NaiveDate>,
    pub magnetic_variation: Option<f64>,
    pub mode: Option<char>,
}

/// VTG: course and speed over ground.
#[derive(Debug, Clone, PartialEq)]
pub struct Vtg {
    pub talker: String,
    pub true_course: Option<f64>,
    pub magnetic_course: Option<f64>,
    pub speed_knots: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub mode: Option<char>,
}

/// GLL: geographic position.
#[derive(Debug, Clone, PartialEq)]
pub struct Gll {
    pub talker: String,
    pub position: Option<Position>,
    pub time: Option<NaiveTime>,
    pub valid: bool,
    pub mode: Option<char>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    Gga(Gga),
    Gsa(Gsa),
    Gsv(Gsv),
    Zda(Zda),
    Rmc(Rmc),
    Vtg(Vtg),
    Gll(Gll),
    Unknown { raw: String },
}

impl Sentence {
    /// Three-letter sentence id, `None` for unrecognised lines.
    pub fn id(&self) -> Option<&'static str> {
        match self {
            Sentence::Gga(_) => Some("GGA"),
            Sentence::Gsa(_) => Some("GSA"),
            Sentence::Gsv(_) => Some("GSV"),
            Sentence::Zda(_) => Some("ZDA"),
            Sentence::Rmc(_) => Some("RMC"),
            Sentence::Vtg(_) => Some("VTG"),
            Sentence::Gll(_) => Some("GLL"),
            Sentence::Unknown { .. } => None,
        }
    }

    pub fn talker(&self) -> Option<&str> {
        match self {
            Sentence::Gga(s) => Some(&s.talker),
            Sentence::Gsa(s) => Some(&s.talker),
            Sentence::Gsv(s) => Some(&s.talker),
            Sentence::Zda(s) => Some(&s.talker),
            Sentence::Rmc(s) => Some(&s.talker),
            Sentence::Vtg(s) => Some(&s.talker),
            Sentence::Gll(s) => Some(&s.talker),
            Sentence::Unknown { .. } => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Sentence::Unknown { .. })
    }
}

impl std::fmt::Display for Sentence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentence::Unknown { raw } => write!(f, "{}", raw),
            known => write!(
                f,
                "{}{}",
                known.talker().unwrap_or_default(),
                known.id().unwrap_or_default()
            ),
        }
    }
}

/// Parse a line, turning every failure into `Sentence::Unknown`.
pub fn parse_line(line: &str) -> Sentence {
    match parse_sentence(line) {
        Ok(sentence) => sentence,
        Err(e) => {
            debug!(line, error = %e, "Unparsable NMEA line");
            Sentence::Unknown {
                raw: line.to_string(),
            }
        }
    }
}

/// Parse one NMEA-0183 sentence.
///
/// The checksum is optional; when present it must match the XOR of every
/// byte between the start character and `*`. Unsupported sentence ids and
/// proprietary (`$P...`) sentences come back as `Sentence::Unknown`.
pub fn parse_sentence(line: &str) -> Result<Sentence, NmeaError> {
    let line = line.trim();
    let body = line
        .strip_prefix('$')
        .or_else(|| line.strip_prefix('!'))
        .ok_or(NmeaError::MissingStart)?;

    let body = match body.split_once('*') {
        Some((data, checksum)) => {
            let expected = u8::from_str_radix(checksum.trim(), 16)
                .map_err(|_| NmeaError::BadChecksum(checksum.to_string()))?;
            let computed = checksum_of(data);
            if expected != computed {
                return Err(NmeaError::ChecksumMismatch { expected, computed });
            }
            data
        }
        None => body,
    };

    let fields: Vec<&str> = body.split(',').collect();
    let address = fields[0];
    if address.starts_with('P') {
        return Ok(Sentence::Unknown {
            raw: line.to_string(),
        });
    }
    if address.len() < 5 || !address.is_ascii() {
        return Err(NmeaError::BadAddress(address.to_string()));
    }

    let talker = address[..2].to_string();
    let data = &fields[1..];
    let sentence = match &address[2..] {
        "GGA" => Sentence::Gga(parse_gga(talker, data)?),
        "GSA" => Sentence::Gsa(parse_gsa(talker, data)?),
        "GSV" => Sentence::Gsv(parse_gsv(talker, data)?),
        "ZDA" => Sentence::Zda(parse_zda(talker, data)?),
        "RMC" => Sentence::Rmc(parse_rmc(talker, data)?),
        "VTG" => Sentence::Vtg(parse_vtg(talker, data)?),
        "GLL" => Sentence::Gll(parse_gll(talker, data)?),
        _ => Sentence::Unknown {
            raw: line.to_string(),
        },
    };
    Ok(sentence)
}

pub fn checksum_of(data: &str) -> u8 {
    data.bytes().fold(0u8, |acc, b| acc ^ b)
}

fn require(sentence: &'static str, data: &[&str], needed: usize) -> Result<(), NmeaError> {
    if data.len() < needed {
        return Err(NmeaError::TooFewFields {
            sentence,
            found: data.len(),
            needed,
        });
    }
    Ok(())
}

fn field<'a>(data: &[&'a str], idx: usize) -> Option<&'a str> {
    data.get(idx).copied().map(str::trim).filter(|s| !s.is_empty())
}

/// Numeric field types; floats must be finite.
trait FieldValue: std::str::FromStr {
    fn is_valid(&self) -> bool {
        true
    }
}

impl FieldValue for u8 {}
impl FieldValue for u16 {}
impl FieldValue for u32 {}
impl FieldValue for i8 {}
impl FieldValue for i32 {}

impl FieldValue for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

fn number<T: FieldValue>(
    data: &[&str],
    idx: usize,
    name: &'static str,
) -> Result<Option<T>, NmeaError> {
    field(data, idx)
        .map(|v| {
            v.parse::<T>()
                .ok()
                .filter(T::is_valid)
                .ok_or_else(|| NmeaError::InvalidField {
                    field: name,
                    value: v.to_string(),
                })
        })
        .transpose()
}

fn flag(data: &[&str], idx: usize) -> Option<char> {
    field(data, idx).and_then(|v| v.chars().next())
}

fn time(data: &[&str], idx: usize) -> Result<Option<NaiveTime>, NmeaError> {
    let Some(v) = field(data, idx) else {
        return Ok(None);
    };
    let invalid = || NmeaError::InvalidField {
        field: "time",
        value: v.to_string(),
    };
    if v.len() < 6 || !v.is_ascii() {
        return Err(invalid());
    }

    let hours: u32 = v[0..2].parse().map_err(|_| invalid())?;
    let minutes: u32 = v[2..4].parse().map_err(|_| invalid())?;
    let seconds: f64 = v[4..].parse().map_err(|_| invalid())?;
    let whole = seconds.trunc() as u32;
    let millis = ((seconds - seconds.trunc()) * 1000.0).round() as u32;

    NaiveTime::from_hms_milli_opt(hours, minutes, whole, millis.min(999))
        .map(Some)
        .ok_or_else(invalid)
}

/// `ddmm.mmmm` / `dddmm.mmmm` plus hemisphere into signed degrees.
fn coordinate(
    data: &[&str],
    idx: usize,
    hemi_idx: usize,
    name: &'static str,
) -> Result<Option<f64>, NmeaError> {
    let Some(raw) = number::<f64>(data, idx, name)? else {
        return Ok(None);
    };
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    let value = degrees + minutes / 60.0;

    match flag(data, hemi_idx) {
        Some('S') | Some('W') => Ok(Some(-value)),
        Some('N') | Some('E') | None => Ok(Some(value)),
        Some(other) => Err(NmeaError::InvalidField {
            field: "hemisphere",
            value: other.to_string(),
        }),
    }
}

fn position(data: &[&str], lat_idx: usize) -> Result<Option<Position>, NmeaError> {
    let latitude = coordinate(data, lat_idx, lat_idx + 1, "latitude")?;
    let longitude = coordinate(data, lat_idx + 2, lat_idx + 3, "longitude")?;
    Ok(latitude
        .zip(longitude)
        .map(|(latitude, longitude)| Position {
            latitude,
            longitude,
        }))
}

fn parse_gga(talker: String, data: &[&str]) -> Result<Gga, NmeaError> {
    require("GGA", data, 9)?;
    Ok(Gga {
        talker,
        time: time(data, 0)?,
        position: position(data, 1)?,
        fix_quality: number(data, 5, "fix quality")?,
        satellites: number(data, 6, "satellite count")?,
        hdop: number(data, 7, "HDOP")?,
        altitude: number(data, 8, "altitude")?,
        geoid_separation: number(data, 10, "geoid separation")?,
        dgps_age: number(data, 12, "DGPS age")?,
        dgps_station: field(data, 13).map(str::to_string),
    })
}

fn parse_gsa(talker: String, data: &[&str]) -> Result<Gsa, NmeaError> {
    require("GSA", data, 17)?;
    let satellite_ids = (2..14)
        .map(|idx| number::<u16>(data, idx, "satellite id"))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .collect();
    Ok(Gsa {
        talker,
        selection_mode: flag(data, 0),
        fix_type: number(data, 1, "fix type")?,
        satellite_ids,
        pdop: number(data, 14, "PDOP")?,
        hdop: number(data, 15, "HDOP")?,
        vdop: number(data, 16, "VDOP")?,
    })
}

fn parse_gsv(talker: String, data: &[&str]) -> Result<Gsv, NmeaError> {
    require("GSV", data, 3)?;
    let mut satellites = Vec::new();
    let mut idx = 3;
    while idx < data.len() {
        if let Some(prn) = number::<u16>(data, idx, "PRN")? {
            satellites.push(SatelliteInfo {
                prn,
                elevation: number(data, idx + 1, "elevation")?,
                azimuth: number(data, idx + 2, "azimuth")?,
                snr: number(data, idx + 3, "SNR")?,
            });
        }
        idx += 4;
    }
    Ok(Gsv {
        talker,
        message_count: number(data, 0, "message count")?.unwrap_or(0),
        message_index: number(data, 1, "message index")?.unwrap_or(0),
        satellites_in_view: number(data, 2, "satellites in view")?.unwrap_or(0),
        satellites,
    })
}

fn parse_zda(talker: String, data: &[&str]) -> Result<Zda, NmeaError> {
    require("ZDA", data, 4)?;
    let day: Option<u32> = number(data, 1, "day")?;
    let month: Option<u32> = number(data, 2, "month")?;
    let year: Option<i32> = number(data, 3, "year")?;
    let date = match (year, month, day) {
        (Some(y), Some(m), Some(d)) => Some(NaiveDate::from_ymd_opt(y, m, d).ok_or(
            NmeaError::InvalidField {
                field: "date",
                value: format!("{:02}.{:02}.{}", d, m, y),
            },
        )?),
        _ => None,
    };
    Ok(Zda {
        talker,
        time: time(data, 0)?,
        date,
        zone_hours: number(data, 4, "zone hours")?,
        zone_minutes: number(data, 5, "zone minutes")?,
    })
}

fn parse_rmc(talker: String, data: &[&str]) -> Result<Rmc, NmeaError> {
    require("RMC", data, 9)?;
    let date = field(data, 8)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%d%m%y").map_err(|_| NmeaError::InvalidField {
                field: "date",
                value: v.to_string(),
            })
        })
        .transpose()?;
    let magnetic_variation = number::<f64>(data, 9, "magnetic variation")?.map(|v| {
        if flag(data, 10) == Some('W') {
            -v
        } else {
            v
        }
    });
    Ok(Rmc {
        talker,
        time: time(data, 0)?,
        valid: flag(data, 1) == Some('A'),
        position: position(data, 2)?,
        speed_knots: number(data, 6, "speed")?,
        course: number(data, 7, "course")?,
        date,
        magnetic_variation,
        mode: flag(data, 11),
    })
}

fn parse_vtg(talker: String, data: &[&str]) -> Result<Vtg, NmeaError> {
    require("VTG", data, 8)?;
    Ok(Vtg {
        talker,
        true_course: number(data, 0, "true course")?,
        magnetic_course: number(data, 2, "magnetic course")?,
        speed_knots: number(data, 4, "speed knots")?,
        speed_kmh: number(data, 6, "speed km/h")?,
        mode: flag(data, 8),
    })
}

fn parse_gll(talker: String, data: &[&str]) -> Result<Gll, NmeaError> {
    require("GLL", data, 6)?;
    Ok(Gll {
        talker,
        position: position(data, 0)?,
        time: time(data, 4)?,
        valid: flag(data, 5) == Some('A'),
        mode: flag(data, 6),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    pub const GGA: &str =
        "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

    #[test]
    fn test_parse_gga() {
        let Sentence::Gga(gga) = parse_sentence(GGA).unwrap() else {
            panic!("expected GGA");
        };
        assert_eq!(gga.talker, "GP");
        assert_eq!(gga.time, NaiveTime::from_hms_opt(12, 35, 19));
        let pos = gga.position.unwrap();
        assert!((pos.latitude - 48.1173).abs() < 1e-4);
        assert!((pos.longitude - 11.516_666).abs() < 1e-4);
        assert_eq!(gga.fix_quality, Some(1));
        assert_eq!(gga.satellites, Some(8));
        assert_eq!(gga.hdop, Some(0.9));
        assert_eq!(gga.altitude, Some(545.4));
        assert_eq!(gga.dgps_station, None);
    }

    #[test]
    fn test_checksum_mismatch_is_rejected() {
        let bad = GGA.replace("*47", "*48");
        assert!(matches!(
            parse_sentence(&bad),
            Err(NmeaError::ChecksumMismatch { expected: 0x48, computed: 0x47 })
        ));
    }

    #[test]
    fn test_sentence_without_checksum_is_accepted() {
        let line = "$GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1";
        let Sentence::Gsa(gsa) = parse_sentence(line).unwrap() else {
            panic!("expected GSA");
        };
        assert_eq!(gsa.selection_mode, Some('A'));
        assert_eq!(gsa.fix_type, Some(3));
        assert_eq!(gsa.satellite_ids, vec![4, 5, 9, 12, 24]);
        assert_eq!(gsa.pdop, Some(2.5));
        assert_eq!(gsa.hdop, Some(1.3));
        assert_eq!(gsa.vdop, Some(2.1));
    }

    #[test]
    fn test_southern_western_hemispheres_are_negative() {
        let line = "$GNRMC,083559.00,A,3352.1234,S,15112.5000,W,0.004,77.52,091202,,,A";
        let Sentence::Rmc(rmc) = parse_sentence(line).unwrap() else {
            panic!("expected RMC");
        };
        let pos = rmc.position.unwrap();
        assert!(pos.latitude < 0.0);
        assert!(pos.longitude < 0.0);
        assert_eq!(pos.latitude_hemisphere(), 'S');
        assert_eq!(pos.longitude_hemisphere(), 'W');
        assert!(rmc.valid);
        assert_eq!(rmc.date, NaiveDate::from_ymd_opt(2002, 12, 9));
        assert_eq!(rmc.mode, Some('A'));
    }

    #[test]
    fn test_parse_zda_and_fractional_seconds() {
        let line = "$GPZDA,201530.25,04,07,2002,00,00";
        let Sentence::Zda(zda) = parse_sentence(line).unwrap() else {
            panic!("expected ZDA");
        };
        assert_eq!(zda.date, NaiveDate::from_ymd_opt(2002, 7, 4));
        assert_eq!(zda.time, NaiveTime::from_hms_milli_opt(20, 15, 30, 250));
    }

    #[test]
    fn test_parse_gsv_satellites() {
        let line = "$GPGSV,2,1,08,01,40,083,46,02,17,308,41,12,07,344,,14,22,228,45";
        let Sentence::Gsv(gsv) = parse_sentence(line).unwrap() else {
            panic!("expected GSV");
        };
        assert_eq!(gsv.message_count, 2);
        assert_eq!(gsv.satellites_in_view, 8);
        assert_eq!(gsv.satellites.len(), 4);
        assert_eq!(gsv.satellites[2].snr, None);
    }

    #[test]
    fn test_parse_vtg_and_gll() {
        let vtg = parse_sentence("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K,A").unwrap();
        assert_eq!(vtg.id(), Some("VTG"));
        let gll = parse_sentence("$GPGLL,4916.45,N,12311.12,W,225444,A,A").unwrap();
        let Sentence::Gll(gll) = gll else {
            panic!("expected GLL");
        };
        assert!(gll.valid);
        assert!(gll.position.unwrap().longitude < 0.0);
    }

    #[test]
    fn test_unsupported_and_proprietary_are_unknown() {
        assert!(parse_sentence("$GPTXT,01,01,02,ANTSTATUS=OK").unwrap().is_unknown());
        assert!(parse_sentence("$PUBX,00,081350.00").unwrap().is_unknown());
    }

    #[test]
    fn test_parse_line_never_fails() {
        let sentence = parse_line("garbage");
        assert_eq!(
            sentence,
            Sentence::Unknown {
                raw: "garbage".to_string()
            }
        );
        assert_eq!(sentence.id(), None);
        assert_eq!(parse_line(GGA).to_string(), "GPGGA");
    }

    #[test]
    fn test_non_ascii_time_is_unknown() {
        let line = "$GPGGA,1\u{e9}3456,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        assert!(matches!(
            parse_sentence(line),
            Err(NmeaError::InvalidField { field: "time", .. })
        ));
        assert!(parse_line(line).is_unknown());
        assert!(parse_line("$GPZDA,\u{e9}\u{e9}\u{e9},04,07,2002,00,00").is_unknown());
    }

    #[test]
    fn test_non_finite_numbers_are_invalid() {
        assert!(matches!(
            parse_sentence("$GPGGA,123519,NaN,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,"),
            Err(NmeaError::InvalidField { field: "latitude", .. })
        ));
        assert!(matches!(
            parse_sentence("$GPGGA,123519,4807.038,N,01131.000,E,1,08,inf,545.4,M,46.9,M,,"),
            Err(NmeaError::InvalidField { field: "HDOP", .. })
        ));
        assert!(parse_line("$GPGSA,A,3,04,05,,,,,,,,,,,NaN,1.3,2.1").is_unknown());
    }

    #[test]
    fn test_malformed_known_sentence_is_an_error() {
        assert!(matches!(
            parse_sentence("$GPGGA,12"),
            Err(NmeaError::TooFewFields { sentence: "GGA", .. })
        ));
        assert!(matches!(
            parse_sentence("$GPGGA,123519,48x7.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,"),
            Err(NmeaError::InvalidField { field: "latitude", .. })
        ));
    }
}
