//! Participant table construction.
//!
//! Labels come from the annotation table (CSV export of the source
//! spreadsheet); split assignments come from the four official split JSON
//! files. The merge is keyed by serial number and refuses to guess:
//! duplicate serials, double partition assignments, split entries for
//! unknown serials, and label/split disagreements are all hard errors.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{CaueegError, Result};
use crate::source::SourceLayout;
use crate::types::{split_tsv, DementiaLabel, NormalityLabel, ParticipantRecord, Split};

pub const PARTICIPANT_COLUMNS: &[&str] = &[
    "participant_id",
    "normality_label",
    "dementia_label",
    "dementia_split",
    "dementia_split_no_overlap",
    "normality_split",
    "normality_split_no_overlap",
];

/// Row of the annotation table. Only the diagnosis flags that feed the
/// derived labels are read; other columns are ignored.
#[derive(Debug, Deserialize)]
struct AnnotationRow {
    serial: String,
    #[serde(default, deserialize_with = "de_flag")]
    normal: bool,
    #[serde(default, deserialize_with = "de_flag")]
    mci: bool,
    #[serde(default, deserialize_with = "de_flag")]
    dementia: bool,
}

/// Accepts the spreadsheet export's notion of truth: 1/0, true/false,
/// TRUE/FALSE, or an empty cell.
fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let value = match raw {
        None => false,
        Some(s) => match s.trim() {
            "" | "0" | "false" | "False" | "FALSE" => false,
            "1" | "true" | "True" | "TRUE" => true,
            other => other.parse::<f64>().map(|v| v != 0.0).unwrap_or(false),
        },
    };
    Ok(value)
}

#[derive(Debug, Deserialize)]
struct SplitFile {
    #[serde(default)]
    train_split: Vec<SplitEntry>,
    #[serde(default)]
    validation_split: Vec<SplitEntry>,
    #[serde(default)]
    test_split: Vec<SplitEntry>,
}

#[derive(Debug, Deserialize)]
struct SplitEntry {
    serial: String,
    #[serde(default)]
    class_name: Option<String>,
}

/// Which of the four split columns a split file feeds.
#[derive(Debug, Clone, Copy)]
enum SplitColumn {
    Dementia,
    DementiaNoOverlap,
    Normality,
    NormalityNoOverlap,
}

impl SplitColumn {
    fn slot<'a>(&self, record: &'a mut ParticipantRecord) -> &'a mut Option<Split> {
        match self {
            SplitColumn::Dementia => &mut record.dementia_split,
            SplitColumn::DementiaNoOverlap => &mut record.dementia_split_no_overlap,
            SplitColumn::Normality => &mut record.normality_split,
            SplitColumn::NormalityNoOverlap => &mut record.normality_split_no_overlap,
        }
    }

    /// The label a split file's `class_name` must agree with.
    fn expected_label(&self, record: &ParticipantRecord) -> &'static str {
        match self {
            SplitColumn::Dementia | SplitColumn::DementiaNoOverlap => {
                record.dementia_label.as_tsv()
            }
            SplitColumn::Normality | SplitColumn::NormalityNoOverlap => {
                record.normality_label.as_str()
            }
        }
    }
}

/// The merged participants table, one row per serial, in serial order.
#[derive(Debug, Clone)]
pub struct ParticipantTable {
    rows: BTreeMap<String, ParticipantRecord>,
}

impl ParticipantTable {
    /// Build the table from a source tree: annotation table plus the four
    /// split files. Any ambiguity is a `MergeConflict`.
    pub fn load(source: &SourceLayout) -> Result<Self> {
        let mut table = Self::from_annotation_table(&source.annotation_table())?;
        table.apply_split_file(&source.dementia_split(), SplitColumn::Dementia)?;
        table.apply_split_file(
            &source.dementia_split_no_overlap(),
            SplitColumn::DementiaNoOverlap,
        )?;
        table.apply_split_file(&source.normality_split(), SplitColumn::Normality)?;
        table.apply_split_file(
            &source.normality_split_no_overlap(),
            SplitColumn::NormalityNoOverlap,
        )?;
        Ok(table)
    }

    fn from_annotation_table(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CaueegError::FileNotFound(path.display().to_string()));
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut rows = BTreeMap::new();
        for result in reader.deserialize::<AnnotationRow>() {
            let row = result?;
            let record = derive_labels(&row)?;
            let serial = record.serial.clone();
            if rows.insert(serial.clone(), record).is_some() {
                return Err(CaueegError::MergeConflict {
                    serial,
                    reason: "duplicate serial in the annotation table".to_string(),
                });
            }
        }
        log::info!("Loaded {} participants from {}", rows.len(), path.display());
        Ok(Self { rows })
    }

    fn apply_split_file(&mut self, path: &Path, column: SplitColumn) -> Result<()> {
        if !path.is_file() {
            return Err(CaueegError::FileNotFound(path.display().to_string()));
        }
        let file: SplitFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;

        let partitions = [
            (Split::Train, &file.train_split),
            (Split::Val, &file.validation_split),
            (Split::Test, &file.test_split),
        ];
        for (split, entries) in partitions {
            for entry in entries {
                let record = self.rows.get_mut(&entry.serial).ok_or_else(|| {
                    CaueegError::MergeConflict {
                        serial: entry.serial.clone(),
                        reason: format!(
                            "{} references a serial missing from the annotation table",
                            path.display()
                        ),
                    }
                })?;

                // Labels extracted from the annotation table and the split
                // file must agree.
                if let Some(class_name) = &entry.class_name {
                    let expected = column.expected_label(record);
                    if !class_name.eq_ignore_ascii_case(expected) {
                        return Err(CaueegError::MergeConflict {
                            serial: entry.serial.clone(),
                            reason: format!(
                                "label '{}' in {} disagrees with derived label '{}'",
                                class_name,
                                path.display(),
                                expected
                            ),
                        });
                    }
                }

                let slot = column.slot(record);
                match slot {
                    Some(existing) if *existing != split => {
                        return Err(CaueegError::MergeConflict {
                            serial: entry.serial.clone(),
                            reason: format!(
                                "listed in both '{}' and '{}' partitions of {}",
                                existing.as_str(),
                                split.as_str(),
                                path.display()
                            ),
                        });
                    }
                    _ => *slot = Some(split),
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, serial: &str) -> Option<&ParticipantRecord> {
        self.rows.get(serial)
    }

    pub fn rows(&self) -> impl Iterator<Item = &ParticipantRecord> {
        self.rows.values()
    }

    pub fn serials(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(|s| s.as_str())
    }

    /// Write the table as a BIDS `participants.tsv`.
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
        w.write_record(PARTICIPANT_COLUMNS)?;
        for record in self.rows.values() {
            w.write_record([
                format!("sub-{}", record.serial).as_str(),
                record.normality_label.as_str(),
                record.dementia_label.as_tsv(),
                split_tsv(&record.dementia_split),
                split_tsv(&record.dementia_split_no_overlap),
                split_tsv(&record.normality_split),
                split_tsv(&record.normality_split_no_overlap),
            ])?;
        }
        w.flush()?;
        Ok(())
    }
}

fn derive_labels(row: &AnnotationRow) -> Result<ParticipantRecord> {
    let flags = [row.normal, row.mci, row.dementia];
    if flags.iter().filter(|f| **f).count() > 1 {
        return Err(CaueegError::MergeConflict {
            serial: row.serial.clone(),
            reason: "normal/mci/dementia flags are not mutually exclusive".to_string(),
        });
    }

    let dementia_label = if row.normal {
        DementiaLabel::Normal
    } else if row.mci {
        DementiaLabel::Mci
    } else if row.dementia {
        DementiaLabel::Dementia
    } else {
        DementiaLabel::Missing
    };

    let normality_label = if row.normal {
        NormalityLabel::Normal
    } else {
        NormalityLabel::Abnormal
    };

    Ok(ParticipantRecord {
        serial: row.serial.clone(),
        normality_label,
        dementia_label,
        dementia_split: None,
        dementia_split_no_overlap: None,
        normality_split: None,
        normality_split_no_overlap: None,
    })
}
