use caueeg_rs::bids::BidsWriter;
use caueeg_rs::source::SourceLayout;
use caueeg_rs::{ConversionSummary, ConvertOptions, Converter};

use crate::cli::ConvertArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: ConvertArgs) -> i32 {
    let source = SourceLayout::new(args.source.as_str());
    let writer = BidsWriter::new(args.output.as_str());
    let options = ConvertOptions {
        clean: args.clean,
        fail_fast: args.fail_fast,
        jobs: args.jobs.max(1),
    };
    let converter = Converter::new(source, writer, options);

    if args.dry_run {
        return match converter.plan() {
            Ok(serials) => {
                for serial in &serials {
                    println!("{}", serial);
                }
                if !args.quiet {
                    eprintln!("Found {} recording(s)", serials.len());
                }
                exit_codes::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                exit_codes::for_error(&e)
            }
        };
    }

    if !args.quiet {
        eprintln!("Converting {} -> {}...", args.source, args.output);
    }

    let summary = match converter.run() {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if let Some(ref path) = args.summary_out {
        match output::to_json(&summary, args.compact) {
            Ok(json) => {
                if let Err(e) = output::write_output(&json, Some(path.as_str())) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
                if !args.quiet {
                    eprintln!("Summary written to {}", path);
                }
            }
            Err(e) => {
                eprintln!("Error serializing summary: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
        }
    }

    if !args.quiet {
        report(&summary);
    }

    if summary.all_converted() {
        exit_codes::SUCCESS
    } else if summary.converted > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::EXECUTION_ERROR
    }
}

fn report(summary: &ConversionSummary) {
    eprintln!(
        "Conversion complete: {}/{} recordings converted.",
        summary.converted, summary.total
    );
    if summary.skipped > 0 {
        eprintln!(
            "{} of {} recordings not attempted (stopped early).",
            summary.skipped, summary.total
        );
    }
    if !summary.failed.is_empty() {
        eprintln!(
            "{} of {} recordings failed:",
            summary.failed.len(),
            summary.total
        );
        for failure in &summary.failed {
            eprintln!("  {}: {}", failure.serial, failure.reason);
        }
    }
    if !summary.flagged_unreliable.is_empty() {
        eprintln!(
            "{} of {} recordings flagged for event/time-range inconsistencies: {}",
            summary.flagged_unreliable.len(),
            summary.total,
            summary.flagged_unreliable.join(", ")
        );
    }
}
