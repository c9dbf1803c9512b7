//! Record Module
//! Groups parsed NMEA sentences into per-epoch records.

use crate::data::nmea::{parse_line, Gga, Gsa, Sentence};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::info;

/// How consecutive log lines are cut into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordGrouping {
    /// A record ends after the first sentence that is not recognised
    #[default]
    Delimited,
    /// Every `lines` log lines form one record
    FixedLength { lines: usize, include_gsv: bool },
}

/// One receiver epoch: the sentences emitted together.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub number: usize,
    pub sentences: Vec<Sentence>,
}

impl Record {
    pub fn name(&self) -> String {
        format!("Record {}", self.number)
    }

    pub fn gga(&self) -> Option<&Gga> {
        self.sentences.iter().find_map(|s| match s {
            Sentence::Gga(gga) => Some(gga),
            _ => None,
        })
    }

    pub fn gsa(&self) -> Option<&Gsa> {
        self.sentences.iter().find_map(|s| match s {
            Sentence::Gsa(gsa) => Some(gsa),
            _ => None,
        })
    }

    /// ZDA date, falling back to the RMC date.
    pub fn date(&self) -> Option<NaiveDate> {
        let zda = self.sentences.iter().find_map(|s| match s {
            Sentence::Zda(zda) => zda.date,
            _ => None,
        });
        zda.or_else(|| {
            self.sentences.iter().find_map(|s| match s {
                Sentence::Rmc(rmc) => rmc.date,
                _ => None,
            })
        })
    }

    fn time(&self) -> Option<NaiveTime> {
        self.sentences.iter().find_map(|s| match s {
            Sentence::Gga(gga) => gga.time,
            Sentence::Zda(zda) => zda.time,
            Sentence::Rmc(rmc) => rmc.time,
            _ => None,
        })
    }

    /// UTC date and time of the epoch in epoch milliseconds.
    pub fn timestamp_ms(&self) -> Option<i64> {
        let date = self.date()?;
        let time = self.time()?;
        Some(NaiveDateTime::new(date, time).and_utc().timestamp_millis())
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parse a whole log and cut it into records numbered from 1.
///
/// Blank lines are ignored. A trailing group at end of input becomes a last
/// record when it holds at least one sentence.
pub fn group_records(text: &str, grouping: RecordGrouping) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current: Vec<Sentence> = Vec::new();
    let mut lines_in_record = 0usize;

    fn close(sentences: &mut Vec<Sentence>, records: &mut Vec<Record>) {
        if !sentences.is_empty() {
            records.push(Record {
                number: records.len() + 1,
                sentences: std::mem::take(sentences),
            });
        }
    }

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let sentence = parse_line(line);
        match grouping {
            RecordGrouping::Delimited => {
                let delimiter = sentence.is_unknown();
                current.push(sentence);
                if delimiter {
                    close(&mut current, &mut records);
                }
            }
            RecordGrouping::FixedLength { lines, include_gsv } => {
                if include_gsv || !matches!(sentence, Sentence::Gsv(_)) {
                    current.push(sentence);
                }
                lines_in_record += 1;
                if lines_in_record >= lines.max(1) {
                    lines_in_record = 0;
                    close(&mut current, &mut records);
                }
            }
        }
    }
    close(&mut current, &mut records);

    info!(records = records.len(), ?grouping, "Grouped NMEA records");
    records
}

/// Records whose date lies in `[from, to]`; undated records are dropped.
pub fn filter_by_date(records: &[Record], from: NaiveDate, to: NaiveDate) -> Vec<Record> {
    records
        .iter()
        .filter(|record| {
            record
                .date()
                .map(|date| from <= date && date <= to)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two epochs, each closed by a proprietary sentence.
    pub(crate) const LOG: &str = "\
$GPGGA,120000,5545.0000,N,03737.0000,E,1,08,0.9,150.0,M,14.0,M,,
$GPGSA,A,3,01,02,03,04,05,06,07,08,,,,,1.8,0.9,1.5
$GPGSV,1,1,02,01,40,083,46,02,17,308,41
$GPZDA,120000.00,04,07,2020,00,00
$PUBX,00,120000.00
$GPGGA,120001,5545.0060,N,03737.0120,E,1,09,1.0,151.0,M,14.0,M,,
$GPGSA,A,3,01,02,03,04,05,06,07,08,09,,,,2.0,1.0,1.7
$GPZDA,120001.00,05,07,2020,00,00
$PUBX,00,120001.00
";

    #[test]
    fn test_delimited_grouping_closes_on_unknown() {
        let records = group_records(LOG, RecordGrouping::Delimited);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), "Record 1");
        assert_eq!(records[0].sentences.len(), 5);
        assert!(records[0].sentences[4].is_unknown());
        assert_eq!(records[1].number, 2);
    }

    #[test]
    fn test_trailing_sentences_form_last_record() {
        let text = format!("{}$GPGGA,120002,5545.0,N,03737.0,E,1,07,1.1,150.0,M,,M,,\n", LOG);
        let records = group_records(&text, RecordGrouping::Delimited);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].sentences.len(), 1);
    }

    #[test]
    fn test_fixed_length_grouping_can_drop_gsv() {
        let with_gsv = group_records(
            LOG,
            RecordGrouping::FixedLength {
                lines: 5,
                include_gsv: true,
            },
        );
        assert_eq!(with_gsv.len(), 2);
        assert_eq!(with_gsv[0].sentences.len(), 5);

        let without_gsv = group_records(
            LOG,
            RecordGrouping::FixedLength {
                lines: 5,
                include_gsv: false,
            },
        );
        assert_eq!(without_gsv[0].sentences.len(), 4);
        assert!(without_gsv
            .iter()
            .flat_map(|r| r.sentences.iter())
            .all(|s| !matches!(s, Sentence::Gsv(_))));
    }

    #[test]
    fn test_blank_lines_do_not_create_records() {
        let text = "\n\n$GPZDA,120000.00,04,07,2020,00,00\n\n";
        let records = group_records(text, RecordGrouping::Delimited);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_timestamp_combines_date_and_gga_time() {
        let records = group_records(LOG, RecordGrouping::Delimited);
        let expected = NaiveDate::from_ymd_opt(2020, 7, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        assert_eq!(records[0].timestamp_ms(), Some(expected));
    }

    #[test]
    fn test_filter_by_date_is_inclusive() {
        let records = group_records(LOG, RecordGrouping::Delimited);
        let day = |d| NaiveDate::from_ymd_opt(2020, 7, d).unwrap();

        assert_eq!(filter_by_date(&records, day(4), day(4)).len(), 1);
        assert_eq!(filter_by_date(&records, day(4), day(5)).len(), 2);
        assert!(filter_by_date(&records, day(6), day(9)).is_empty());
    }

    #[test]
    fn test_undated_records_are_filtered_out() {
        let records = group_records(
            "$GPGGA,120000,5545.0,N,03737.0,E,1,08,0.9,150.0,M,,M,,\n",
            RecordGrouping::Delimited,
        );
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(records[0].date().is_none());
        assert!(filter_by_date(&records, day, day).is_empty());
    }
}
