//! Minimal EDF header access.
//!
//! The converter never loads sample data: it reads the header to learn the
//! channel list, sampling rate, and duration, and copies the byte stream
//! with the 16-byte label fields rewritten to harmonised names. Field
//! offsets follow the EDF specification (256-byte fixed header, then one
//! 256-byte block per signal laid out field-major).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{CaueegError, Result};

pub const FIXED_HEADER_SIZE: usize = 256;
const LABEL_LEN: usize = 16;
const MAX_SIGNALS: i64 = 640;

/// Label of the EDF+ annotations pseudo-signal; not a data channel.
pub const ANNOTATION_SIGNAL: &str = "EDF Annotations";

#[derive(Debug, Clone)]
pub struct EdfSignal {
    pub label: String,
    pub transducer: String,
    pub physical_dimension: String,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: i64,
    pub digital_max: i64,
    pub prefiltering: String,
    pub samples_per_record: u32,
}

impl EdfSignal {
    pub fn is_annotation(&self) -> bool {
        self.label == ANNOTATION_SIGNAL
    }
}

#[derive(Debug, Clone)]
pub struct EdfHeader {
    pub patient: String,
    pub recording: String,
    pub start_date: String,
    pub start_time: String,
    pub data_records: i64,
    pub record_duration: f64,
    pub signals: Vec<EdfSignal>,
}

impl EdfHeader {
    pub fn read(path: &Path) -> Result<EdfHeader> {
        let file = File::open(path)
            .map_err(|_| CaueegError::FileNotFound(path.display().to_string()))?;
        let mut reader = BufReader::new(file);
        parse_header(&mut reader, path)
    }

    /// Total recording length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.data_records as f64 * self.record_duration
    }

    /// Sampling rate of the first data signal, in Hz.
    pub fn sampling_rate(&self) -> Option<f64> {
        self.signals
            .iter()
            .find(|s| !s.is_annotation())
            .map(|s| s.samples_per_record as f64 / self.record_duration)
    }

    /// Per-signal sampling rate in Hz.
    pub fn signal_rate(&self, signal: &EdfSignal) -> f64 {
        signal.samples_per_record as f64 / self.record_duration
    }

    /// Labels of all data signals, excluding the annotations pseudo-signal.
    pub fn channel_labels(&self) -> Vec<&str> {
        self.signals
            .iter()
            .filter(|s| !s.is_annotation())
            .map(|s| s.label.as_str())
            .collect()
    }
}

/// Copy `src` to `dst`, rewriting signal labels per `renames`.
///
/// Keys are trimmed source labels; values must fit the 16-byte label field.
/// Everything outside the label fields is copied byte for byte, so the
/// result is identical across re-runs.
pub fn copy_with_renamed_labels(
    src: &Path,
    dst: &Path,
    renames: &BTreeMap<String, String>,
) -> Result<()> {
    let file = File::open(src)
        .map_err(|_| CaueegError::FileNotFound(src.display().to_string()))?;
    let mut reader = BufReader::new(file);

    let mut fixed = [0u8; FIXED_HEADER_SIZE];
    reader.read_exact(&mut fixed)?;
    let signal_count = parse_signal_count(&fixed, src)?;

    let mut signal_header = vec![0u8; signal_count * 256];
    reader.read_exact(&mut signal_header)?;

    for i in 0..signal_count {
        let start = i * LABEL_LEN;
        let old = field_str(&signal_header[start..start + LABEL_LEN]);
        if let Some(new) = renames.get(&old) {
            if new.len() > LABEL_LEN || !new.is_ascii() {
                return Err(CaueegError::InvalidEdfHeader {
                    path: dst.display().to_string(),
                    reason: format!("replacement label '{}' does not fit the EDF label field", new),
                });
            }
            let mut field = [b' '; LABEL_LEN];
            field[..new.len()].copy_from_slice(new.as_bytes());
            signal_header[start..start + LABEL_LEN].copy_from_slice(&field);
        }
    }

    let mut writer = BufWriter::new(File::create(dst)?);
    writer.write_all(&fixed)?;
    writer.write_all(&signal_header)?;
    std::io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn parse_header<R: Read>(reader: &mut R, path: &Path) -> Result<EdfHeader> {
    let mut fixed = [0u8; FIXED_HEADER_SIZE];
    reader.read_exact(&mut fixed).map_err(|_| CaueegError::InvalidEdfHeader {
        path: path.display().to_string(),
        reason: "file shorter than the fixed EDF header".to_string(),
    })?;

    let version = field_str(&fixed[0..8]);
    if version != "0" {
        return Err(invalid(path, format!("not an EDF file (version '{}')", version)));
    }

    let signal_count = parse_signal_count(&fixed, path)?;

    let header_bytes = field_i64(&fixed[184..192], path, "header size")?;
    if header_bytes != (signal_count as i64 + 1) * 256 {
        return Err(invalid(path, format!("header size field {} does not match signal count", header_bytes)));
    }

    let data_records = field_i64(&fixed[236..244], path, "data record count")?;
    if data_records < 0 {
        return Err(invalid(path, "unknown data record count (-1)".to_string()));
    }

    let record_duration = field_f64(&fixed[244..252], path, "data record duration")?;
    if !(record_duration > 0.0) {
        return Err(invalid(path, format!("non-positive data record duration {}", record_duration)));
    }

    let mut signal_header = vec![0u8; signal_count * 256];
    reader.read_exact(&mut signal_header).map_err(|_| CaueegError::InvalidEdfHeader {
        path: path.display().to_string(),
        reason: "file shorter than the declared signal header".to_string(),
    })?;

    let ns = signal_count;
    let mut signals = Vec::with_capacity(ns);
    for i in 0..ns {
        let slice = |block_start: usize, width: usize| {
            let start = block_start + i * width;
            &signal_header[start..start + width]
        };

        let samples_per_record = field_i64(slice(ns * 216, 8), path, "samples per record")?;
        if samples_per_record < 1 {
            return Err(invalid(path, format!("non-positive samples per record for signal {}", i)));
        }

        signals.push(EdfSignal {
            label: field_str(slice(0, 16)),
            transducer: field_str(slice(ns * 16, 80)),
            physical_dimension: field_str(slice(ns * 96, 8)),
            physical_min: field_f64(slice(ns * 104, 8), path, "physical minimum")?,
            physical_max: field_f64(slice(ns * 112, 8), path, "physical maximum")?,
            digital_min: field_i64(slice(ns * 120, 8), path, "digital minimum")?,
            digital_max: field_i64(slice(ns * 128, 8), path, "digital maximum")?,
            prefiltering: field_str(slice(ns * 136, 80)),
            samples_per_record: samples_per_record as u32,
        });
    }

    Ok(EdfHeader {
        patient: field_str(&fixed[8..88]),
        recording: field_str(&fixed[88..168]),
        start_date: field_str(&fixed[168..176]),
        start_time: field_str(&fixed[176..184]),
        data_records,
        record_duration,
        signals,
    })
}

fn parse_signal_count(fixed: &[u8], path: &Path) -> Result<usize> {
    let count = field_i64(&fixed[252..256], path, "signal count")?;
    if count < 1 || count > MAX_SIGNALS {
        return Err(invalid(path, format!("signal count {} out of range", count)));
    }
    Ok(count as usize)
}

fn invalid(path: &Path, reason: String) -> CaueegError {
    CaueegError::InvalidEdfHeader {
        path: path.display().to_string(),
        reason,
    }
}

fn field_str(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

fn field_i64(bytes: &[u8], path: &Path, what: &str) -> Result<i64> {
    let s = field_str(bytes);
    s.parse::<i64>()
        .map_err(|_| invalid(path, format!("invalid {}: '{}'", what, s)))
}

fn field_f64(bytes: &[u8], path: &Path, what: &str) -> Result<f64> {
    let s = field_str(bytes);
    s.parse::<f64>()
        .map_err(|_| invalid(path, format!("invalid {}: '{}'", what, s)))
}
