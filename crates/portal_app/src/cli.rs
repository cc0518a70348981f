use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use portal_core::OutputType;

/// Terminal client for the CV sorter and contact card tools.
#[derive(Parser, Debug)]
#[command(name = "portal", version, about)]
pub struct Cli {
    /// RON config file. Defaults to ./portal.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Requester email attached to jobs and activity records.
    #[arg(long, global = true, env = "PORTAL_USER_EMAIL")]
    pub email: Option<String>,

    /// Write logs to ./portal.log instead of the terminal.
    #[arg(long, global = true, conflicts_with = "log_both")]
    pub log_file: bool,

    /// Write logs to the terminal and ./portal.log.
    #[arg(long, global = true)]
    pub log_both: bool,

    /// Debug-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the manifest and print its entries.
    List {
        /// Case-insensitive filter over key or file name.
        #[arg(long)]
        search: Option<String>,
    },
    /// Validate pasted keys against the manifest.
    Check {
        /// File with one key per line, or `-` for stdin.
        input: PathBuf,
    },
    /// Submit a sort job and wait for it to finish.
    Sort(SortArgs),
    /// Probe the remote job status once.
    Status,
    /// Follow a job that is already processing until it ends.
    Watch,
    /// Generate a vCard file from the student roster.
    Vcf(VcfArgs),
    /// Summarize the activity log.
    Activity {
        /// Number of recent records to show.
        #[arg(long, default_value_t = 10)]
        recent: usize,
    },
}

#[derive(Args, Debug)]
pub struct SortArgs {
    /// Output file or folder name.
    #[arg(long)]
    pub name: String,

    /// `zip` or `gdrive`.
    #[arg(long = "type", default_value = "zip")]
    pub output_type: OutputType,

    /// File with pasted keys, or `-` for stdin.
    #[arg(long, conflicts_with = "key", required_unless_present = "key")]
    pub paste: Option<PathBuf>,

    /// Key to select from the manifest, e.g. "24BC581 A". Repeatable.
    #[arg(long)]
    pub key: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VcfArgs {
    /// File with one roll number per line, or `-` for stdin.
    #[arg(long, conflicts_with = "all", required_unless_present = "all")]
    pub paste: Option<PathBuf>,

    /// Every student in the roster.
    #[arg(long)]
    pub all: bool,

    /// Appended to each contact's display name.
    #[arg(long)]
    pub suffix: Option<String>,
}
