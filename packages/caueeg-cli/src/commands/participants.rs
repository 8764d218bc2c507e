use caueeg_rs::participants::ParticipantTable;
use caueeg_rs::source::SourceLayout;
use caueeg_rs::ParticipantRecord;

use crate::cli::ParticipantsArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: ParticipantsArgs) -> i32 {
    let source = SourceLayout::new(args.source.as_str());
    if let Err(e) = source.check() {
        eprintln!("Error: {}", e);
        return exit_codes::for_error(&e);
    }

    let table = match ParticipantTable::load(&source) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if args.json {
        let rows: Vec<&ParticipantRecord> = table.rows().collect();
        return match output::to_json(&rows, false) {
            Ok(json) => {
                if let Err(e) = output::write_output(&json, args.output.as_deref()) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
                exit_codes::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                exit_codes::EXECUTION_ERROR
            }
        };
    }

    let mut buffer = Vec::new();
    if let Err(e) = table.write_tsv(&mut buffer) {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }
    let tsv = String::from_utf8_lossy(&buffer);
    match args.output.as_deref() {
        Some(path) => {
            if let Err(e) = std::fs::write(path, tsv.as_bytes()) {
                eprintln!("Error: Failed to write '{}': {}", path, e);
                return exit_codes::EXECUTION_ERROR;
            }
        }
        None => print!("{}", tsv),
    }
    exit_codes::SUCCESS
}
