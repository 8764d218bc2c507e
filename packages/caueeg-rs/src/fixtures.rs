//! Synthetic source-data builders for tests.
//!
//! Not part of the public API. Generates minimal but structurally valid
//! EDF files, event JSONs, annotation tables, and split files so tests can
//! assemble a complete source tree in a temporary directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::json;

use crate::source::SourceLayout;

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn push_field(buf: &mut Vec<u8>, value: &str, width: usize) {
    let bytes = value.as_bytes();
    let take = bytes.len().min(width);
    buf.extend_from_slice(&bytes[..take]);
    buf.resize(buf.len() + (width - take), b' ');
}

/// Write a valid EDF file with the given signal labels, one-second data
/// records of zeros, `sfreq` samples per record per signal.
pub fn write_edf(path: &Path, labels: &[&str], sfreq: u32, records: u32) -> std::io::Result<()> {
    ensure_parent(path)?;
    let ns = labels.len();

    let mut header = Vec::with_capacity((ns + 1) * 256);
    push_field(&mut header, "0", 8);
    push_field(&mut header, "X X X X", 80);
    push_field(&mut header, "Startdate 01-JAN-2015 X X X", 80);
    push_field(&mut header, "01.01.15", 8);
    push_field(&mut header, "09.00.00", 8);
    push_field(&mut header, &((ns + 1) * 256).to_string(), 8);
    push_field(&mut header, "", 44);
    push_field(&mut header, &records.to_string(), 8);
    push_field(&mut header, "1", 8);
    push_field(&mut header, &ns.to_string(), 4);

    for label in labels {
        push_field(&mut header, label, 16);
    }
    for _ in labels {
        push_field(&mut header, "AgAgCl electrode", 80);
    }
    for _ in labels {
        push_field(&mut header, "uV", 8);
    }
    for _ in labels {
        push_field(&mut header, "-3200", 8);
    }
    for _ in labels {
        push_field(&mut header, "3200", 8);
    }
    for _ in labels {
        push_field(&mut header, "-32768", 8);
    }
    for _ in labels {
        push_field(&mut header, "32767", 8);
    }
    for _ in labels {
        push_field(&mut header, "", 80);
    }
    for _ in labels {
        push_field(&mut header, &sfreq.to_string(), 8);
    }
    for _ in labels {
        push_field(&mut header, "", 32);
    }

    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(&header)?;
    file.write_all(&vec![0u8; records as usize * ns * sfreq as usize * 2])?;
    file.flush()
}

/// Write a raw event file: a JSON array of `[onset_samples, description]`.
pub fn write_events_json(path: &Path, events: &[(i64, &str)]) -> std::io::Result<()> {
    ensure_parent(path)?;
    let entries: Vec<serde_json::Value> =
        events.iter().map(|(onset, desc)| json!([onset, desc])).collect();
    fs::write(path, serde_json::Value::Array(entries).to_string())
}

/// Write an annotation table. `label` is one of `normal`, `mci`,
/// `dementia`, or empty for a missing diagnosis.
pub fn write_annotation_csv(path: &Path, rows: &[(&str, &str)]) -> std::io::Result<()> {
    ensure_parent(path)?;
    let mut out = String::from("serial,normal,mci,dementia\n");
    for (serial, label) in rows {
        let flags = match *label {
            "normal" => "1,0,0",
            "mci" => "0,1,0",
            "dementia" => "0,0,1",
            _ => "0,0,0",
        };
        out.push_str(&format!("{},{}\n", serial, flags));
    }
    fs::write(path, out)
}

/// Write a split file with the given `(serial, class_name)` partitions.
pub fn write_split(
    path: &Path,
    train: &[(&str, &str)],
    val: &[(&str, &str)],
    test: &[(&str, &str)],
) -> std::io::Result<()> {
    ensure_parent(path)?;
    let entry = |(serial, class_name): &(&str, &str)| {
        json!({"serial": serial, "class_name": class_name})
    };
    let value = json!({
        "train_split": train.iter().map(entry).collect::<Vec<_>>(),
        "validation_split": val.iter().map(entry).collect::<Vec<_>>(),
        "test_split": test.iter().map(entry).collect::<Vec<_>>(),
    });
    fs::write(path, serde_json::to_string_pretty(&value)?)
}

/// Write all four split files with empty partitions.
pub fn write_empty_splits(layout: &SourceLayout) -> std::io::Result<()> {
    for path in [
        layout.dementia_split(),
        layout.dementia_split_no_overlap(),
        layout.normality_split(),
        layout.normality_split_no_overlap(),
    ] {
        write_split(&path, &[], &[], &[])?;
    }
    Ok(())
}
