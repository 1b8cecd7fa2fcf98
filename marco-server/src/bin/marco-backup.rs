//! Marco local backup tool
//!
//! Exports a local Marco database to a portable JSON backup, or merges a
//! backup back into a database.
//!
//! Usage:
//!   marco-backup export --db marco.db --out backup.json
//!   marco-backup import --db marco.db backup.json --merge keep-newer

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marco_server::init_tracing;
use marco_storage::{BackupEngine, BackupPayload, MergeStrategy, StorageError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "marco-backup")]
#[command(about = "Export and import Marco local backups")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write every collection of a database as a backup document
    Export {
        /// Path to the database file
        #[arg(long)]
        db: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Merge a backup document into a database
    Import {
        /// Path to the database file
        #[arg(long)]
        db: PathBuf,

        /// Backup file to import
        file: PathBuf,

        /// How to resolve records that already exist
        #[arg(long, default_value_t = MergeStrategy::KeepNewer)]
        merge: MergeStrategy,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Export { db, out } => {
            let payload = BackupEngine::new(&db)
                .export()
                .with_context(|| format!("failed to export {}", db.display()))?;
            let json = payload.to_json_pretty()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Wrote {} record(s) to {}", payload.data.len(), path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Command::Import { db, file, merge } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let payload = BackupPayload::from_json(&json)
                .with_context(|| format!("{} is not a backup document", file.display()))?;

            match BackupEngine::new(&db).import(&payload, merge) {
                Ok(summary) => {
                    println!("{summary}");
                    Ok(())
                }
                Err(StorageError::PartialImport { summary, failures }) => {
                    println!("{summary}");
                    for failure in &failures {
                        eprintln!("  failed: {failure}");
                    }
                    anyhow::bail!("import partially applied ({} collection(s) failed)", failures.len())
                }
                Err(e) => {
                    Err(e).with_context(|| format!("failed to import into {}", db.display()))
                }
            }
        }
    }
}
