//! ibmi-cdc CLI - operator tools for IBM i journal capture.

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{checkpoint, config, decode, dump, receivers};

#[derive(Parser)]
#[command(name = "ibmi-cdc")]
#[command(about = "Inspect IBM i journal buffers, receiver listings, checkpoints and capture config")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a captured host buffer
    Decode {
        /// Path to the raw buffer
        buffer: String,
        /// What the buffer holds
        #[arg(long, value_enum, default_value_t = decode::Kind::Entries)]
        kind: decode::Kind,
        /// CCSID of text fields (37, 1208 or 1200)
        #[arg(long, default_value_t = 37)]
        ccsid: u16,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
        /// Stop quietly at a truncated entry instead of failing
        #[arg(long)]
        permissive: bool,
    },
    /// Hex and text dump of a file
    Dump {
        /// Path to the file
        file: String,
        /// First byte to show
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Number of bytes to show (default: to end of file)
        #[arg(long)]
        len: Option<usize>,
        /// CCSID for the text column
        #[arg(long, default_value_t = 37)]
        ccsid: u16,
    },
    /// Show receiver chains from a JSON receiver listing
    Receivers {
        /// Path to the listing (JSON array of receivers)
        listing: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Receiver to locate, as LIBRARY/NAME (default: the attached receiver)
        #[arg(long)]
        from: Option<String>,
    },
    /// Show or reset a persisted checkpoint
    Checkpoint {
        /// Path to the checkpoint file
        file: String,
        /// Reset to start of journal
        #[arg(long)]
        reset: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a capture configuration and print the effective settings
    Config {
        /// Path to the TOML file
        file: String,
    },
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    setup_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode {
            buffer,
            kind,
            ccsid,
            json,
            permissive,
        } => decode::run(buffer, kind, ccsid, json, permissive),
        Commands::Dump {
            file,
            offset,
            len,
            ccsid,
        } => dump::run(file, offset, len, ccsid),
        Commands::Receivers {
            listing,
            json,
            from,
        } => receivers::run(listing, json, from),
        Commands::Checkpoint { file, reset, json } => checkpoint::run(file, reset, json),
        Commands::Config { file } => config::run(file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
