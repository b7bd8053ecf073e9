use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use leave_ledger::{
    core::{
        holidays::HolidayCalendar,
        leave::{LeaveType, parse_calendar_date},
        ledger::{LeaveLedger, Snapshot},
    },
    errors::Result,
    storage::SystemStateStore,
};
use std::path::PathBuf;
use tracing::warn;

mod calendar;
mod data;
mod leave;
mod quota;
mod report;

/// The ledger as the command layer uses it.
pub(crate) type Ledger = LeaveLedger<SystemStateStore>;

#[derive(Debug, Parser)]
#[command(name = "leave-ledger", about = "Personal leave tracker", long_about = None)]
pub(crate) struct Cli {
    /// Path to the TOML file with default quotas and holidays
    #[arg(long, global = true, default_value = "config.toml")]
    pub(crate) config: PathBuf,

    /// SQLite connection string
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub(crate) database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List all leave records
    List(leave::ListArgs),
    /// Record a new leave
    Add(leave::AddArgs),
    /// Change an existing leave
    Edit(leave::EditArgs),
    /// Delete a leave
    Remove(leave::RemoveArgs),
    /// Attach a metadata field (mood, tags, notes, ...) to a leave
    Tag(leave::TagArgs),
    /// Show leaves and holidays on one day
    Day(calendar::DayArgs),
    /// Show leaves and holidays day by day over a range
    Range(calendar::RangeArgs),
    /// List public holidays for a year
    Holidays(calendar::HolidaysArgs),
    /// Show quota usage
    Quotas,
    /// Change a quota's allowance
    SetQuota(quota::SetQuotaArgs),
    /// Restore configured default allowances
    ResetQuotas,
    /// Leave analytics by type and month
    Report(report::ReportArgs),
    /// Write all records to a JSON backup
    Export(data::ExportArgs),
    /// Replace all records from a JSON backup
    Import(data::ImportArgs),
}

impl Cli {
    pub(crate) async fn run(self, ledger: &mut Ledger, holidays: &HolidayCalendar) -> Result<()> {
        match self.command {
            Commands::List(args) => leave::list(ledger, &args),
            Commands::Add(args) => leave::add(ledger, args).await,
            Commands::Edit(args) => leave::edit(ledger, args).await,
            Commands::Remove(args) => leave::remove(ledger, &args).await,
            Commands::Tag(args) => leave::tag(ledger, args).await,
            Commands::Day(args) => calendar::day(ledger, holidays, &args),
            Commands::Range(args) => calendar::range(ledger, holidays, &args),
            Commands::Holidays(args) => calendar::holidays(holidays, &args),
            Commands::Quotas => quota::show(ledger),
            Commands::SetQuota(args) => quota::set(ledger, &args).await,
            Commands::ResetQuotas => quota::reset(ledger).await,
            Commands::Report(args) => report::run(ledger, &args),
            Commands::Export(args) => data::export(ledger, args),
            Commands::Import(args) => data::import(ledger, &args).await,
        }
    }
}

/// Surfaces a persistence warning to the user.
pub(crate) fn report_warning(snapshot: &Snapshot) {
    if let Some(warning) = &snapshot.warning {
        warn!("{}", warning);
        eprintln!("warning: {warning}");
    }
}

/// Clap value parser for calendar dates.
pub(crate) fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    parse_calendar_date(raw).map_err(|error| error.to_string())
}

/// Clap value parser for leave types.
pub(crate) fn parse_leave_type(raw: &str) -> std::result::Result<LeaveType, String> {
    raw.parse::<LeaveType>().map_err(|error| error.to_string())
}
