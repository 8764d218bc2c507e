use std::path::Path;

use serde::Serialize;

use caueeg_rs::channels;
use caueeg_rs::edf::EdfHeader;
use caueeg_rs::events;

use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct ValidateOutput {
    file: String,
    exists: bool,
    header_ok: bool,
    signals: usize,
    sampling_rate: Option<f64>,
    duration_secs: Option<f64>,
    unresolved_channels: Vec<String>,
    event_file: Option<String>,
    event_count: Option<usize>,
    excluded_events: Option<usize>,
    out_of_range_events: Option<usize>,
    events_reliable: Option<bool>,
    error: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let path = Path::new(&args.edf);
    let mut result = ValidateOutput {
        file: args.edf.clone(),
        exists: path.is_file(),
        header_ok: false,
        signals: 0,
        sampling_rate: None,
        duration_secs: None,
        unresolved_channels: Vec::new(),
        event_file: args.events.clone(),
        event_count: None,
        excluded_events: None,
        out_of_range_events: None,
        events_reliable: None,
        error: None,
    };

    if !result.exists {
        result.error = Some(format!("File not found: {}", args.edf));
    } else {
        match EdfHeader::read(path) {
            Ok(header) => {
                result.header_ok = true;
                result.signals = header.signals.len();
                result.sampling_rate = header.sampling_rate();
                result.duration_secs = Some(header.duration_secs());

                for label in header.channel_labels() {
                    if channels::resolve(label).is_none() {
                        result.unresolved_channels.push(label.to_string());
                    }
                }
                if !result.unresolved_channels.is_empty() {
                    result.error = Some(format!(
                        "Unresolvable channel name(s): {}",
                        result.unresolved_channels.join(", ")
                    ));
                }

                if let (Some(event_path), Some(sfreq)) =
                    (args.events.as_deref(), result.sampling_rate)
                {
                    match events::read_event_file(Path::new(event_path)).and_then(|raw| {
                        events::parse_events(
                            &raw,
                            sfreq,
                            header.duration_secs(),
                            Path::new(event_path),
                        )
                    }) {
                        Ok(parsed) => {
                            result.event_count = Some(parsed.events.len());
                            result.excluded_events = Some(parsed.excluded());
                            result.out_of_range_events = Some(parsed.out_of_range);
                            result.events_reliable = Some(parsed.reliable());
                        }
                        Err(e) => {
                            if result.error.is_none() {
                                result.error = Some(e.to_string());
                            }
                        }
                    }
                }
            }
            Err(e) => {
                result.error = Some(e.to_string());
            }
        }
    }

    if args.json {
        match output::to_json(&result, false) {
            Ok(json) => {
                if let Err(e) = output::write_output(&json, None) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
        }
    } else if let Some(ref err) = result.error {
        eprintln!("Error: {}", err);
    } else {
        println!(
            "Recording '{}' is valid ({} signals, {} Hz, {:.1} s)",
            args.edf,
            result.signals,
            result.sampling_rate.unwrap_or(0.0),
            result.duration_secs.unwrap_or(0.0)
        );
        if let Some(false) = result.events_reliable {
            println!(
                "Warning: {} event(s) fall outside the recording bounds; events are unreliable",
                result.out_of_range_events.unwrap_or(0)
            );
        } else if let Some(count) = result.event_count {
            println!(
                "Events: {} kept, {} excluded by category",
                count,
                result.excluded_events.unwrap_or(0)
            );
        }
    }

    if result.error.is_some() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
