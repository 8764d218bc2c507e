//! Event annotation parsing.
//!
//! Each recording has a JSON file with `[onset_in_samples, description]`
//! pairs ordered by onset. Interval markers (eyes open/closed, photic
//! stimulation, hyperventilation) are paired with their end marker;
//! free-text artifact notes are normalized to instantaneous annotations;
//! anything else (impedance checks, pause markers, photic-off markers, …)
//! is filtered out by design.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{CaueegError, Result};
use crate::types::EventAnnotation;

/// Terminators for an eyes-open/eyes-closed segment.
const EYES_TERMINATORS: &[&str] = &["Eyes Open", "Eyes Closed", "Paused"];
/// Terminators for a photic stimulation segment.
const PHOTIC_TERMINATORS: &[&str] = &["Photic Off", "Paused"];
/// Terminators for a hyperventilation segment.
const HV_TERMINATORS: &[&str] = &["HV - Off", "Paused"];

/// Free-text fragments mapped to normalized instantaneous annotations.
/// Checked in order; `couch` is a recurring typo for `cough` in the source.
const KEYWORD_EVENTS: &[(&[&str], &str)] = &[
    (&["drowsy"], "drowsy"),
    (&["cough", "couch"], "cough"),
    (&["chew"], "chewing"),
    (&["sweat"], "sweating"),
    (&["blink"], "eye blink"),
    (&["eye movement"], "eye movement"),
    (&["move", "jerk"], "movement"),
    (&["seizure"], "seizure"),
    (&["artifact"], "artifact"),
];

/// Outcome of parsing one recording's events.
#[derive(Debug, Clone)]
pub struct ParsedEvents {
    pub events: Vec<EventAnnotation>,
    /// Entry count of the source file, before filtering.
    pub source_count: usize,
    /// Events whose time range falls outside the recording bounds. They
    /// are retained in `events`; the recording is reported as unreliable.
    pub out_of_range: usize,
}

impl ParsedEvents {
    pub fn reliable(&self) -> bool {
        self.out_of_range == 0
    }

    /// Source entries that produced no annotation (excluded categories and
    /// bare end markers).
    pub fn excluded(&self) -> usize {
        self.source_count - self.events.len()
    }
}

/// Read a raw event file: a JSON array of `[onset_samples, description]`.
pub fn read_event_file(path: &Path) -> Result<Vec<(f64, String)>> {
    let file = File::open(path)
        .map_err(|_| CaueegError::FileNotFound(path.display().to_string()))?;
    let raw: Vec<(f64, String)> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| CaueegError::MalformedEvents {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(raw)
}

/// Normalize raw events against the recording's sampling rate and duration.
///
/// Out-of-range events (negative onset, or end past the recording length)
/// are kept but counted, so consumers can flag the recording instead of
/// silently losing or correcting data.
pub fn parse_events(
    raw: &[(f64, String)],
    sfreq: f64,
    recording_duration: f64,
    path: &Path,
) -> Result<ParsedEvents> {
    if !(sfreq > 0.0) {
        return Err(CaueegError::MalformedEvents {
            path: path.display().to_string(),
            reason: format!("non-positive sampling rate {}", sfreq),
        });
    }
    if let Some(w) = raw.windows(2).find(|w| w[1].0 < w[0].0) {
        return Err(CaueegError::MalformedEvents {
            path: path.display().to_string(),
            reason: format!(
                "events are not ordered by onset ({} after {})",
                w[1].0, w[0].0
            ),
        });
    }

    let mut events = Vec::new();
    for (i, (onset_samples, description)) in raw.iter().enumerate() {
        let onset = onset_samples / sfreq;
        let desc = description.as_str();

        let terminators = if desc == "Eyes Open" || desc == "Eyes Closed" {
            Some(EYES_TERMINATORS)
        } else if desc.starts_with("Photic On") {
            Some(PHOTIC_TERMINATORS)
        } else if desc.starts_with("HV") && desc.ends_with("On") {
            Some(HV_TERMINATORS)
        } else {
            None
        };

        if let Some(terminators) = terminators {
            let end = raw[i + 1..]
                .iter()
                .find(|(_, d)| terminators.contains(&d.as_str()))
                .map(|(s, _)| s / sfreq)
                // Unterminated segments run to the end of the recording.
                .unwrap_or(recording_duration);
            events.push(EventAnnotation {
                onset,
                duration: end - onset,
                trial_type: desc.to_string(),
            });
            continue;
        }

        let lower = desc.to_lowercase();
        if let Some((_, normalized)) = KEYWORD_EVENTS
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        {
            events.push(EventAnnotation {
                onset,
                duration: 0.0,
                trial_type: (*normalized).to_string(),
            });
        }
        // Anything else is an excluded category.
    }

    let out_of_range = events
        .iter()
        .filter(|e| !in_range(e, recording_duration))
        .count();
    if out_of_range > 0 {
        log::warn!(
            "{}: {} event(s) outside the recording bounds; events marked unreliable",
            path.display(),
            out_of_range
        );
    }

    Ok(ParsedEvents {
        events,
        source_count: raw.len(),
        out_of_range,
    })
}

/// In-range rule: onset must be non-negative and the event must end within
/// the recording, with zero tolerance.
fn in_range(event: &EventAnnotation, recording_duration: f64) -> bool {
    event.onset >= 0.0 && event.onset + event.duration.max(0.0) <= recording_duration
}
