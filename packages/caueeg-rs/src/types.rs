use serde::{Deserialize, Serialize};

/// Clinical normality label derived from the annotation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalityLabel {
    Normal,
    Abnormal,
}

impl NormalityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalityLabel::Normal => "normal",
            NormalityLabel::Abnormal => "abnormal",
        }
    }
}

/// Clinical dementia label derived from the annotation table.
///
/// These come from diagnosis fields, not from EEG-pattern classification;
/// a "normal" here is a clinical finding, not a clean-recording marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DementiaLabel {
    Normal,
    Mci,
    Dementia,
    Missing,
}

impl DementiaLabel {
    /// TSV cell value; `Missing` serializes as the BIDS missing marker.
    pub fn as_tsv(&self) -> &'static str {
        match self {
            DementiaLabel::Normal => "normal",
            DementiaLabel::Mci => "mci",
            DementiaLabel::Dementia => "dementia",
            DementiaLabel::Missing => "n/a",
        }
    }
}

/// Train/val/test partition assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

pub fn split_tsv(split: &Option<Split>) -> &'static str {
    match split {
        Some(s) => s.as_str(),
        None => "n/a",
    }
}

/// One row of the merged participants table.
///
/// The serial number identifies a recording, not a patient: the source
/// carries no true patient identifier, so two recordings of the same person
/// stay two rows.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantRecord {
    #[serde(rename = "participant_id")]
    pub serial: String,
    pub normality_label: NormalityLabel,
    pub dementia_label: DementiaLabel,
    pub dementia_split: Option<Split>,
    pub dementia_split_no_overlap: Option<Split>,
    pub normality_split: Option<Split>,
    pub normality_split_no_overlap: Option<Split>,
}

/// BIDS channel type assigned during harmonisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Eeg,
    Ecg,
    Stim,
}

impl ChannelType {
    /// Type code used in `_channels.tsv`.
    pub fn bids_code(&self) -> &'static str {
        match self {
            ChannelType::Eeg => "EEG",
            ChannelType::Ecg => "ECG",
            ChannelType::Stim => "TRIG",
        }
    }
}

/// A source channel resolved against the harmonisation table.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonisedChannel {
    pub name: String,
    pub kind: ChannelType,
    /// Standard 10-20 position in meters; `None` for non-EEG channels.
    pub position: Option<[f64; 3]>,
}

/// One normalized event annotation, in seconds from recording start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAnnotation {
    pub onset: f64,
    pub duration: f64,
    pub trial_type: String,
}

/// A recording that could not be converted, with the reason it failed.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingFailure {
    pub serial: String,
    pub reason: String,
}

/// Run-level result of a conversion batch.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    pub total: usize,
    pub converted: usize,
    /// Recordings not attempted because the run stopped early.
    pub skipped: usize,
    pub failed: Vec<RecordingFailure>,
    /// Serials whose events fall outside the recording bounds. Recomputed
    /// on every run from the data, never carried over.
    pub flagged_unreliable: Vec<String>,
    pub created_at: String,
}

impl ConversionSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            converted: 0,
            skipped: 0,
            failed: Vec::new(),
            flagged_unreliable: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn all_converted(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0
    }
}
