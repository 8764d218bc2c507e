use serde::Serialize;

use caueeg_rs::source::{SourceInventory, SourceLayout};

use crate::cli::InfoArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct InfoOutput {
    cli_version: String,
    #[serde(flatten)]
    inventory: SourceInventory,
}

pub fn execute(args: InfoArgs) -> i32 {
    let layout = SourceLayout::new(args.source.as_str());
    let info = InfoOutput {
        cli_version: env!("CARGO_PKG_VERSION").to_string(),
        inventory: SourceInventory::scan(&layout),
    };

    if args.json {
        match output::to_json(&info, false) {
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
    } else {
        println!("caueeg CLI v{}", info.cli_version);
        println!("Source root: {}", info.inventory.root);
        if !info.inventory.exists {
            println!("Source root does not exist");
        } else {
            println!();
            println!("EDF recordings: {}", info.inventory.edf_files);
            println!("Event files: {}", info.inventory.event_files);
            println!(
                "Annotation table: {}",
                if info.inventory.annotation_table {
                    "present"
                } else {
                    "missing"
                }
            );
            if !info.inventory.split_files_present.is_empty() {
                println!(
                    "Split files present: {}",
                    info.inventory.split_files_present.join(", ")
                );
            }
            if !info.inventory.split_files_missing.is_empty() {
                println!(
                    "Split files missing: {}",
                    info.inventory.split_files_missing.join(", ")
                );
            }
        }
    }

    if info.inventory.exists {
        exit_codes::SUCCESS
    } else {
        exit_codes::INPUT_ERROR
    }
}
