//! Channel name/type harmonisation.
//!
//! The source vendor exports average-referenced derivations (`Fp1-AVG`, …)
//! using the old 10-20 temporal nomenclature. Harmonisation maps each of
//! them to the modern electrode name (`T3` becomes `T7`, `T5` becomes `P7`,
//! and so on), assigns a BIDS channel type, and attaches the standard
//! montage position for EEG channels.

use crate::montage;
use crate::types::{ChannelType, HarmonisedChannel};

/// Vendor label → harmonised name/type, covering the CAUEEG montage.
pub const VENDOR_CHANNELS: &[(&str, &str, ChannelType)] = &[
    ("Fp1-AVG", "Fp1", ChannelType::Eeg),
    ("F3-AVG", "F3", ChannelType::Eeg),
    ("C3-AVG", "C3", ChannelType::Eeg),
    ("P3-AVG", "P3", ChannelType::Eeg),
    ("O1-AVG", "O1", ChannelType::Eeg),
    ("Fp2-AVG", "Fp2", ChannelType::Eeg),
    ("F4-AVG", "F4", ChannelType::Eeg),
    ("C4-AVG", "C4", ChannelType::Eeg),
    ("P4-AVG", "P4", ChannelType::Eeg),
    ("O2-AVG", "O2", ChannelType::Eeg),
    ("F7-AVG", "F7", ChannelType::Eeg),
    ("T3-AVG", "T7", ChannelType::Eeg),
    ("T5-AVG", "P7", ChannelType::Eeg),
    ("F8-AVG", "F8", ChannelType::Eeg),
    ("T4-AVG", "T8", ChannelType::Eeg),
    ("T6-AVG", "P8", ChannelType::Eeg),
    ("FZ-AVG", "Fz", ChannelType::Eeg),
    ("CZ-AVG", "Cz", ChannelType::Eeg),
    ("PZ-AVG", "Pz", ChannelType::Eeg),
    ("EKG", "ECG", ChannelType::Ecg),
    ("Photic", "Photic", ChannelType::Stim),
];

/// Old 10-20 temporal names → modern equivalents.
const OLD_TO_NEW: &[(&str, &str)] = &[
    ("T3", "T7"),
    ("T4", "T8"),
    ("T5", "P7"),
    ("T6", "P8"),
];

/// Resolve a source channel name to its harmonised form.
///
/// Resolution order: exact vendor label, already-harmonised name
/// (idempotent re-runs), then the name with a reference suffix stripped,
/// folding old nomenclature into new at each step. Returns `None` for
/// names the table cannot account for; callers treat that as an error,
/// never as a pass-through.
pub fn resolve(raw: &str) -> Option<HarmonisedChannel> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    lookup(trimmed).or_else(|| {
        let base = trimmed.split('-').next().unwrap_or(trimmed).trim();
        if base == trimmed {
            None
        } else {
            lookup(base)
        }
    })
}

fn lookup(name: &str) -> Option<HarmonisedChannel> {
    // Exact vendor label.
    if let Some((_, new, kind)) = VENDOR_CHANNELS.iter().find(|(v, _, _)| *v == name) {
        return Some(harmonised(new, *kind));
    }
    // Already-harmonised name, case-folded.
    if let Some((_, new, kind)) = VENDOR_CHANNELS
        .iter()
        .find(|(_, n, _)| n.eq_ignore_ascii_case(name))
    {
        return Some(harmonised(new, *kind));
    }
    // Old temporal nomenclature.
    if let Some((_, new)) = OLD_TO_NEW.iter().find(|(old, _)| old.eq_ignore_ascii_case(name)) {
        if let Some((_, n, kind)) = VENDOR_CHANNELS.iter().find(|(_, n, _)| n == new) {
            return Some(harmonised(n, *kind));
        }
    }
    None
}

fn harmonised(name: &str, kind: ChannelType) -> HarmonisedChannel {
    let position = match kind {
        ChannelType::Eeg => montage::position(name),
        _ => None,
    };
    HarmonisedChannel {
        name: name.to_string(),
        kind,
        position,
    }
}
