//! NMEA Inspector Widget
//! Record list, sentence list and decoded fields of an NMEA log.

use crate::data::{describe, filter_by_date, Record};
use chrono::NaiveDate;
use egui::{Color32, RichText, ScrollArea};
use std::path::PathBuf;

/// Actions triggered by the inspector
#[derive(Debug, Clone, PartialEq)]
pub enum InspectorAction {
    None,
    OpenLog,
    ExportDop,
    ExportDelta,
}

#[derive(Default)]
pub struct Inspector {
    pub log_path: Option<PathBuf>,
    records: Vec<Record>,
    /// Records left after the date filter
    pub visible: Vec<Record>,
    selected_record: Option<usize>,
    selected_sentence: Option<usize>,
    pub from_text: String,
    pub to_text: String,
    pub status: String,
}

/// Empty text is an open bound.
fn parse_date_bound(text: &str) -> Result<Option<NaiveDate>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| format!("Error: invalid date '{}' (expected YYYY-MM-DD)", text))
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_records(&mut self, path: PathBuf, records: Vec<Record>) {
        self.status = format!("Loaded {} records", records.len());
        self.log_path = Some(path);
        self.visible = records.clone();
        self.records = records;
        self.selected_record = None;
        self.selected_sentence = None;
    }

    /// Restrict the visible records to the typed date range.
    pub fn apply_filter(&mut self) {
        let bounds = parse_date_bound(&self.from_text)
            .and_then(|from| parse_date_bound(&self.to_text).map(|to| (from, to)));

        match bounds {
            Ok((None, None)) => {
                self.visible = self.records.clone();
                self.status = format!("Showing all {} records", self.visible.len());
            }
            Ok((from, to)) => {
                let from = from.unwrap_or(NaiveDate::MIN);
                let to = to.unwrap_or(NaiveDate::MAX);
                self.visible = filter_by_date(&self.records, from, to);
                self.status = format!(
                    "Showing {} of {} records",
                    self.visible.len(),
                    self.records.len()
                );
            }
            Err(message) => {
                self.status = message;
                return;
            }
        }
        self.selected_record = None;
        self.selected_sentence = None;
    }

    pub fn show(&mut self, ui: &mut egui::Ui, busy: bool) -> InspectorAction {
        let mut action = InspectorAction::None;

        ui.horizontal(|ui| {
            ui.add_enabled_ui(!busy, |ui| {
                if ui.button("📂 Open NMEA log").clicked() {
                    action = InspectorAction::OpenLog;
                }
            });
            if let Some(name) = self.log_path.as_ref().and_then(|p| p.file_name()) {
                ui.label(RichText::new(name.to_string_lossy()).strong());
            }

            ui.separator();
            ui.label("From");
            ui.add(egui::TextEdit::singleline(&mut self.from_text).desired_width(90.0));
            ui.label("To");
            ui.add(egui::TextEdit::singleline(&mut self.to_text).desired_width(90.0));
            if ui.button("Filter").clicked() {
                self.apply_filter();
            }

            ui.separator();
            ui.add_enabled_ui(!self.visible.is_empty() && !busy, |ui| {
                if ui.button("Export DOP CSV").clicked() {
                    action = InspectorAction::ExportDop;
                }
                if ui.button("Export delta CSV").clicked() {
                    action = InspectorAction::ExportDelta;
                }
            });
        });

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        ui.separator();

        ui.columns(3, |columns| {
            columns[0].label(RichText::new("Records").strong());
            ScrollArea::vertical()
                .id_salt("records")
                .auto_shrink([false, false])
                .show(&mut columns[0], |ui| {
                    for (idx, record) in self.visible.iter().enumerate() {
                        let text = match record.date() {
                            Some(date) => format!("{} ({})", record, date),
                            None => record.to_string(),
                        };
                        if ui
                            .selectable_label(self.selected_record == Some(idx), text)
                            .clicked()
                        {
                            self.selected_record = Some(idx);
                            self.selected_sentence = None;
                        }
                    }
                });

            columns[1].label(RichText::new("Sentences").strong());
            let record = self.selected_record.and_then(|idx| self.visible.get(idx));
            ScrollArea::vertical()
                .id_salt("sentences")
                .auto_shrink([false, false])
                .show(&mut columns[1], |ui| {
                    for (idx, sentence) in record.iter().flat_map(|r| r.sentences.iter()).enumerate()
                    {
                        if ui
                            .selectable_label(
                                self.selected_sentence == Some(idx),
                                sentence.to_string(),
                            )
                            .clicked()
                        {
                            self.selected_sentence = Some(idx);
                        }
                    }
                });

            columns[2].label(RichText::new("Fields").strong());
            let sentence = record.and_then(|r| r.sentences.get(self.selected_sentence?));
            if let Some(sentence) = sentence {
                let text = describe(sentence);
                if text.is_empty() {
                    columns[2].label(RichText::new("Unrecognised sentence").color(Color32::GRAY));
                } else {
                    columns[2].monospace(text);
                }
            }
        });

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{group_records, RecordGrouping};

    // Two epochs, 2020-07-04 and 2020-07-05
    const LOG: &str = "\
$GPZDA,120000.00,04,07,2020,00,00
$PUBX,00
$GPZDA,120000.00,05,07,2020,00,00
$PUBX,00
";

    fn inspector() -> Inspector {
        let mut inspector = Inspector::new();
        inspector.set_records(
            PathBuf::from("log.nmea"),
            group_records(LOG, RecordGrouping::Delimited),
        );
        inspector
    }

    #[test]
    fn test_parse_date_bound() {
        assert_eq!(parse_date_bound("  "), Ok(None));
        assert_eq!(
            parse_date_bound("2020-07-04"),
            Ok(NaiveDate::from_ymd_opt(2020, 7, 4))
        );
        assert!(parse_date_bound("04/07/2020").is_err());
    }

    #[test]
    fn test_filter_with_one_bound() {
        let mut inspector = inspector();
        assert_eq!(inspector.visible.len(), 2);

        inspector.from_text = "2020-07-05".to_string();
        inspector.apply_filter();
        assert_eq!(inspector.visible.len(), 1);
        assert_eq!(inspector.visible[0].number, 2);
    }

    #[test]
    fn test_invalid_date_keeps_previous_view() {
        let mut inspector = inspector();
        inspector.to_text = "yesterday".to_string();
        inspector.apply_filter();
        assert_eq!(inspector.visible.len(), 2);
        assert!(inspector.status.starts_with("Error"));
    }

    #[test]
    fn test_clearing_bounds_shows_all() {
        let mut inspector = inspector();
        inspector.from_text = "2020-07-06".to_string();
        inspector.apply_filter();
        assert!(inspector.visible.is_empty());

        inspector.from_text.clear();
        inspector.apply_filter();
        assert_eq!(inspector.visible.len(), 2);
    }
}
