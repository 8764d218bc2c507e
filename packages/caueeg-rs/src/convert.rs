//! The conversion pipeline.
//!
//! One linear batch: load and merge the ancillary tables (fatal on any
//! ambiguity), write the dataset-level files, then process each recording
//! independently. A recording that fails is reported and skipped, never
//! silently dropped; recordings whose events fall outside the recorded
//! time range are converted but flagged in the run summary.

use rayon::prelude::*;

use crate::bids::BidsWriter;
use crate::channels;
use crate::edf::EdfHeader;
use crate::error::{CaueegError, Result};
use crate::events;
use crate::participants::ParticipantTable;
use crate::source::SourceLayout;
use crate::types::{ConversionSummary, HarmonisedChannel, RecordingFailure};

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Remove a pre-existing output tree before writing.
    pub clean: bool,
    /// Stop at the first recording that fails instead of skip-and-report.
    pub fail_fast: bool,
    /// Worker threads for the per-recording loop; 1 runs sequentially.
    pub jobs: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            clean: false,
            fail_fast: false,
            jobs: 1,
        }
    }
}

enum Outcome {
    Converted { serial: String, reliable: bool },
    Failed { serial: String, reason: String },
}

pub struct Converter {
    source: SourceLayout,
    writer: BidsWriter,
    options: ConvertOptions,
}

impl Converter {
    pub fn new(source: SourceLayout, writer: BidsWriter, options: ConvertOptions) -> Self {
        Self {
            source,
            writer,
            options,
        }
    }

    /// Run the full batch and return the run summary.
    pub fn run(&self) -> Result<ConversionSummary> {
        self.source.check()?;
        let table = ParticipantTable::load(&self.source)?;

        self.writer.prepare(self.options.clean)?;
        self.writer.write_dataset_description()?;
        self.writer.write_readme()?;
        self.writer.write_participants(&table)?;

        let serials: Vec<&str> = table.serials().collect();
        let total = serials.len();
        log::info!("Converting {} recording(s)", total);

        let mut summary = ConversionSummary::new(total);
        let outcomes = if self.options.fail_fast {
            let mut outcomes = Vec::new();
            for serial in &serials {
                let outcome = self.convert_one(serial);
                let failed = matches!(outcome, Outcome::Failed { .. });
                outcomes.push(outcome);
                if failed {
                    break;
                }
            }
            outcomes
        } else if self.options.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.jobs)
                .build()
                .map_err(|e| CaueegError::ExecutionFailed(e.to_string()))?;
            pool.install(|| {
                serials
                    .par_iter()
                    .map(|serial| self.convert_one(serial))
                    .collect()
            })
        } else {
            serials.iter().map(|serial| self.convert_one(serial)).collect()
        };

        summary.skipped = total - outcomes.len();
        for outcome in outcomes {
            match outcome {
                Outcome::Converted { serial, reliable } => {
                    summary.converted += 1;
                    if !reliable {
                        summary.flagged_unreliable.push(serial);
                    }
                }
                Outcome::Failed { serial, reason } => {
                    summary.failed.push(RecordingFailure { serial, reason });
                }
            }
        }
        summary.flagged_unreliable.sort();
        summary.failed.sort_by(|a, b| a.serial.cmp(&b.serial));

        log::info!(
            "Conversion finished: {}/{} converted, {} failed, {} flagged",
            summary.converted,
            summary.total,
            summary.failed.len(),
            summary.flagged_unreliable.len()
        );
        Ok(summary)
    }

    /// Recordings the batch would process, in order.
    pub fn plan(&self) -> Result<Vec<String>> {
        self.source.check()?;
        let table = ParticipantTable::load(&self.source)?;
        Ok(table.serials().map(|s| s.to_string()).collect())
    }

    fn convert_one(&self, serial: &str) -> Outcome {
        match self.try_convert(serial) {
            Ok(reliable) => {
                log::debug!("Converted {}", serial);
                Outcome::Converted {
                    serial: serial.to_string(),
                    reliable,
                }
            }
            Err(e) => {
                log::warn!("Failed to convert {}: {}", serial, e);
                Outcome::Failed {
                    serial: serial.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn try_convert(&self, serial: &str) -> Result<bool> {
        let edf_path = self.source.edf_file(serial);
        let header = EdfHeader::read(&edf_path)?;

        let resolved: Vec<(String, HarmonisedChannel)> = header
            .channel_labels()
            .iter()
            .map(|label| {
                channels::resolve(label)
                    .map(|ch| (label.to_string(), ch))
                    .ok_or_else(|| CaueegError::UnresolvedChannel {
                        path: edf_path.display().to_string(),
                        channel: label.to_string(),
                    })
            })
            .collect::<Result<_>>()?;

        let sfreq = header.sampling_rate().ok_or_else(|| {
            CaueegError::InvalidEdfHeader {
                path: edf_path.display().to_string(),
                reason: "no data signals".to_string(),
            }
        })?;

        let event_path = self.source.event_file(serial);
        let raw_events = events::read_event_file(&event_path)?;
        let parsed = events::parse_events(&raw_events, sfreq, header.duration_secs(), &event_path)?;

        self.writer
            .write_recording(serial, &edf_path, &header, &resolved, &parsed)?;
        Ok(parsed.reliable())
    }
}
