//! BIDS output tree writer.
//!
//! Writes the fixed target layout: dataset-level metadata, the merged
//! participants table, and per-recording EDF + sidecar files under
//! `sub-<serial>/eeg/`. Every writer emits fixed column orders and sorted
//! rows so a re-run over identical inputs reproduces identical bytes.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::edf::{self, EdfHeader};
use crate::error::Result;
use crate::events::ParsedEvents;
use crate::participants::ParticipantTable;
use crate::types::{ChannelType, HarmonisedChannel};

pub const TASK: &str = "rest";
const BIDS_VERSION: &str = "1.9.0";
/// Mains frequency at the recording site (South Korea).
const POWER_LINE_HZ: u32 = 60;

pub struct BidsWriter {
    root: PathBuf,
}

impl BidsWriter {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the output root. With `clean`, a pre-existing tree is
    /// removed first.
    pub fn prepare(&self, clean: bool) -> Result<()> {
        if clean && self.root.exists() {
            log::info!("Removing existing output tree {}", self.root.display());
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn write_dataset_description(&self) -> Result<()> {
        let description = json!({
            "Name": "CAUEEG: Chung-Ang University Hospital EEG dataset",
            "BIDSVersion": BIDS_VERSION,
            "DatasetType": "raw",
            "License": "Access to the source dataset is gated by a data use agreement; converted data inherits its terms",
            "Authors": ["CAUEEG-BIDS conversion pipeline"],
        });
        self.write_json(&self.root.join("dataset_description.json"), &description)
    }

    pub fn write_readme(&self) -> Result<()> {
        let text = "\
# CAUEEG

BIDS rendition of the CAUEEG clinical EEG dataset. Recordings are stored as
EDF with harmonised channel names; clinical labels and the official
train/val/test splits live in participants.tsv. participant_id is derived
from the source serial number, which identifies a recording rather than a
patient: the same person may appear under more than one participant_id.
Recordings whose event annotations fall outside the recorded time range are
reported by the conversion run summary and should be treated with care.
";
        fs::write(self.root.join("README"), text)?;
        Ok(())
    }

    pub fn write_participants(&self, table: &ParticipantTable) -> Result<()> {
        let file = File::create(self.root.join("participants.tsv"))?;
        table.write_tsv(BufWriter::new(file))?;

        let sidecar = json!({
            "participant_id": {
                "Description": "Source serial number. Serial numbers identify recordings, not patients; one patient may appear under several serials and this is not detectable from the source data."
            },
            "normality_label": {
                "Description": "Clinical normality assessment from the diagnosis fields (not an EEG-pattern classification)",
                "Levels": {"normal": "clinically normal", "abnormal": "any clinical abnormality"}
            },
            "dementia_label": {
                "Description": "Clinical dementia-spectrum diagnosis",
                "Levels": {"normal": "cognitively normal", "mci": "mild cognitive impairment", "dementia": "dementia"}
            },
            "dementia_split": {
                "Description": "Official train/val/test split for the dementia task; participants may overlap between partitions"
            },
            "dementia_split_no_overlap": {
                "Description": "Dementia task split with participant overlap removed from val/test"
            },
            "normality_split": {
                "Description": "Official train/val/test split for the normality task; participants may overlap between partitions"
            },
            "normality_split_no_overlap": {
                "Description": "Normality task split with participant overlap removed from val/test"
            }
        });
        self.write_json(&self.root.join("participants.json"), &sidecar)
    }

    fn eeg_dir(&self, serial: &str) -> PathBuf {
        self.root.join(format!("sub-{}", serial)).join("eeg")
    }

    fn eeg_basename(serial: &str) -> String {
        format!("sub-{}_task-{}", serial, TASK)
    }

    /// Write one converted recording: the relabeled EDF copy plus its
    /// channels/events/electrodes tables and JSON sidecars.
    ///
    /// `channels` pairs each source label with its harmonised form, in
    /// signal order.
    pub fn write_recording(
        &self,
        serial: &str,
        edf_src: &Path,
        header: &EdfHeader,
        channels: &[(String, HarmonisedChannel)],
        events: &ParsedEvents,
    ) -> Result<()> {
        let dir = self.eeg_dir(serial);
        fs::create_dir_all(&dir)?;
        let base = Self::eeg_basename(serial);

        let renames: BTreeMap<String, String> = channels
            .iter()
            .filter(|(old, ch)| *old != ch.name)
            .map(|(old, ch)| (old.clone(), ch.name.clone()))
            .collect();
        edf::copy_with_renamed_labels(edf_src, &dir.join(format!("{}_eeg.edf", base)), &renames)?;

        self.write_channels_tsv(&dir.join(format!("{}_channels.tsv", base)), header, channels)?;
        self.write_events_tsv(&dir.join(format!("{}_events.tsv", base)), events)?;
        self.write_electrodes_tsv(&dir.join(format!("{}_electrodes.tsv", base)), channels)?;

        let coordsystem = json!({
            "EEGCoordinateSystem": "CapTrak",
            "EEGCoordinateUnits": "m",
            "EEGCoordinateSystemDescription": "Idealized 10-20 positions on a spherical head model, not digitized per subject",
        });
        self.write_json(&dir.join(format!("{}_coordsystem.json", base)), &coordsystem)?;

        let counts = |kind: ChannelType| channels.iter().filter(|(_, c)| c.kind == kind).count();
        let sidecar = json!({
            "TaskName": TASK,
            "SamplingFrequency": header.sampling_rate(),
            "RecordingDuration": header.duration_secs(),
            "RecordingType": "continuous",
            "EEGChannelCount": counts(ChannelType::Eeg),
            "ECGChannelCount": counts(ChannelType::Ecg),
            "TriggerChannelCount": counts(ChannelType::Stim),
            "EEGReference": "average",
            "PowerLineFrequency": POWER_LINE_HZ,
            "SoftwareFilters": "n/a",
        });
        self.write_json(&dir.join(format!("{}_eeg.json", base)), &sidecar)
    }

    fn write_channels_tsv(
        &self,
        path: &Path,
        header: &EdfHeader,
        channels: &[(String, HarmonisedChannel)],
    ) -> Result<()> {
        let mut w = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(BufWriter::new(File::create(path)?));
        w.write_record(["name", "type", "units", "sampling_frequency", "status"])?;

        let mut signals = header.signals.iter().filter(|s| !s.is_annotation());
        for (old, channel) in channels {
            // channels is built from the header, so the zip stays aligned.
            let signal = signals.next().ok_or_else(|| {
                crate::error::CaueegError::ExecutionFailed(format!(
                    "channel list out of sync with EDF signals at '{}'",
                    old
                ))
            })?;
            let units = if signal.physical_dimension.is_empty() {
                "n/a".to_string()
            } else {
                signal.physical_dimension.clone()
            };
            w.write_record([
                channel.name.as_str(),
                channel.kind.bids_code(),
                units.as_str(),
                format_float(header.signal_rate(signal)).as_str(),
                "good",
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    fn write_events_tsv(&self, path: &Path, events: &ParsedEvents) -> Result<()> {
        let mut w = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(BufWriter::new(File::create(path)?));
        w.write_record(["onset", "duration", "trial_type"])?;
        for event in &events.events {
            w.write_record([
                format_float(event.onset).as_str(),
                format_float(event.duration).as_str(),
                event.trial_type.as_str(),
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    fn write_electrodes_tsv(
        &self,
        path: &Path,
        channels: &[(String, HarmonisedChannel)],
    ) -> Result<()> {
        let mut w = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(BufWriter::new(File::create(path)?));
        w.write_record(["name", "x", "y", "z"])?;
        for (_, channel) in channels {
            if let Some([x, y, z]) = channel.position {
                w.write_record([
                    channel.name.as_str(),
                    format!("{:.4}", x).as_str(),
                    format!("{:.4}", y).as_str(),
                    format!("{:.4}", z).as_str(),
                ])?;
            }
        }
        w.flush()?;
        Ok(())
    }

    fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<()> {
        let mut text = serde_json::to_string_pretty(value)?;
        text.push('\n');
        fs::write(path, text)?;
        Ok(())
    }
}

fn format_float(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels;
    use crate::events;
    use crate::fixtures;

    fn resolve_all(header: &EdfHeader) -> Vec<(String, HarmonisedChannel)> {
        header
            .channel_labels()
            .iter()
            .map(|l| (l.to_string(), channels::resolve(l).unwrap()))
            .collect()
    }

    #[test]
    fn writes_a_complete_recording_entry() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("00001.edf");
        fixtures::write_edf(&src, &["Fp1-AVG", "T3-AVG", "EKG", "Photic"], 200, 10).unwrap();
        let header = EdfHeader::read(&src).unwrap();
        let resolved = resolve_all(&header);

        let raw = vec![(0.0, "Eyes Open".to_string()), (400.0, "Paused".to_string())];
        let parsed = events::parse_events(&raw, 200.0, 10.0, &src).unwrap();

        let writer = BidsWriter::new(dir.path().join("rawdata"));
        writer.prepare(false).unwrap();
        writer
            .write_recording("00001", &src, &header, &resolved, &parsed)
            .unwrap();

        let eeg_dir = dir.path().join("rawdata/sub-00001/eeg");
        for suffix in ["eeg.edf", "eeg.json", "channels.tsv", "events.tsv", "electrodes.tsv", "coordsystem.json"] {
            let path = eeg_dir.join(format!("sub-00001_task-rest_{}", suffix));
            assert!(path.is_file(), "missing {}", path.display());
        }

        let channels_tsv =
            std::fs::read_to_string(eeg_dir.join("sub-00001_task-rest_channels.tsv")).unwrap();
        let mut lines = channels_tsv.lines();
        assert_eq!(lines.next().unwrap(), "name\ttype\tunits\tsampling_frequency\tstatus");
        assert_eq!(lines.next().unwrap(), "Fp1\tEEG\tuV\t200.0\tgood");
        assert_eq!(lines.next().unwrap(), "T7\tEEG\tuV\t200.0\tgood");
        assert_eq!(lines.next().unwrap(), "ECG\tECG\tuV\t200.0\tgood");
        assert_eq!(lines.next().unwrap(), "Photic\tTRIG\tuV\t200.0\tgood");

        let events_tsv =
            std::fs::read_to_string(eeg_dir.join("sub-00001_task-rest_events.tsv")).unwrap();
        assert_eq!(events_tsv, "onset\tduration\ttrial_type\n0.0\t2.0\tEyes Open\n");

        // Electrodes cover only EEG channels.
        let electrodes_tsv =
            std::fs::read_to_string(eeg_dir.join("sub-00001_task-rest_electrodes.tsv")).unwrap();
        let names: Vec<&str> = electrodes_tsv
            .lines()
            .skip(1)
            .map(|l| l.split('\t').next().unwrap())
            .collect();
        assert_eq!(names, vec!["Fp1", "T7"]);

        // The copied EDF carries the harmonised labels.
        let copied = EdfHeader::read(&eeg_dir.join("sub-00001_task-rest_eeg.edf")).unwrap();
        assert_eq!(copied.channel_labels(), vec!["Fp1", "T7", "ECG", "Photic"]);
    }

    #[test]
    fn rewrites_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("00001.edf");
        fixtures::write_edf(&src, &["Fp1-AVG"], 100, 5).unwrap();
        let header = EdfHeader::read(&src).unwrap();
        let resolved = resolve_all(&header);
        let parsed = events::parse_events(&[], 100.0, 5.0, &src).unwrap();

        let writer = BidsWriter::new(dir.path().join("rawdata"));
        writer.prepare(false).unwrap();
        writer.write_dataset_description().unwrap();
        writer
            .write_recording("00001", &src, &header, &resolved, &parsed)
            .unwrap();
        let first =
            std::fs::read(dir.path().join("rawdata/sub-00001/eeg/sub-00001_task-rest_eeg.edf"))
                .unwrap();
        let first_desc = std::fs::read(dir.path().join("rawdata/dataset_description.json")).unwrap();

        writer.prepare(false).unwrap();
        writer.write_dataset_description().unwrap();
        writer
            .write_recording("00001", &src, &header, &resolved, &parsed)
            .unwrap();
        let second =
            std::fs::read(dir.path().join("rawdata/sub-00001/eeg/sub-00001_task-rest_eeg.edf"))
                .unwrap();
        let second_desc = std::fs::read(dir.path().join("rawdata/dataset_description.json")).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_desc, second_desc);
    }
}
