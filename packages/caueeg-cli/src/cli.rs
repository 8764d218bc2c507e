use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "caueeg",
    version,
    about = "CAUEEG to BIDS dataset converter",
    long_about = "Convert the CAUEEG clinical EEG dataset (EDF recordings, event\n\
                  annotations, labels, and official splits) into a BIDS tree with\n\
                  harmonised channel metadata and a merged participants table."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert the source dataset to a BIDS tree
    Convert(ConvertArgs),
    /// Build and print the merged participants table
    Participants(ParticipantsArgs),
    /// Validate a single recording against the conversion rules
    Validate(ValidateArgs),
    /// Summarize a source dataset tree
    Info(InfoArgs),
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Source dataset root
    #[arg(long, default_value = "sourcedata/caueeg-dataset", env = "CAUEEG_SOURCE")]
    pub source: String,

    /// Output BIDS root
    #[arg(long, default_value = "rawdata", env = "CAUEEG_OUTPUT")]
    pub output: String,

    /// Remove an existing output tree before writing
    #[arg(long, default_value_t = false)]
    pub clean: bool,

    /// Stop at the first recording that fails
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// List the recordings that would be converted and exit
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Worker threads for the per-recording loop
    #[arg(long, default_value_t = 1)]
    pub jobs: usize,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    pub summary_out: Option<String>,

    /// Compact JSON summary (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ParticipantsArgs {
    /// Source dataset root
    #[arg(long, default_value = "sourcedata/caueeg-dataset", env = "CAUEEG_SOURCE")]
    pub source: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output as JSON rows instead of TSV
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// EDF recording to check
    #[arg(long)]
    pub edf: String,

    /// Matching event annotation file
    #[arg(long)]
    pub events: Option<String>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Source dataset root
    #[arg(long, default_value = "sourcedata/caueeg-dataset", env = "CAUEEG_SOURCE")]
    pub source: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
