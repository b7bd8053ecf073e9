use super::{Ledger, report_warning};
use chrono::Utc;
use clap::Args;
use leave_ledger::errors::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub(crate) struct ExportArgs {
    /// File to write; prints to stdout when omitted
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub(crate) struct ImportArgs {
    /// Backup file produced by `export`
    path: PathBuf,
}

pub(crate) fn export(ledger: &Ledger, args: ExportArgs) -> Result<()> {
    let json = ledger.export(None, Utc::now()).to_json()?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)?;
            info!("Exported {} records to {}", ledger.records().len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub(crate) async fn import(ledger: &mut Ledger, args: &ImportArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.path)?;
    let snapshot = ledger.import(&raw).await?;
    report_warning(&snapshot);
    println!(
        "Imported {} record(s) from {}",
        snapshot.records.len(),
        args.path.display()
    );
    Ok(())
}
