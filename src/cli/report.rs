use super::Ledger;
use chrono::{Datelike, Local};
use clap::Args;
use leave_ledger::{
    core::report::{days_by_type, format_days, monthly_breakdown, requests_per_month},
    errors::Result,
};

#[derive(Debug, Args)]
pub(crate) struct ReportArgs {
    /// Calendar year for the monthly breakdown; defaults to the current year
    #[arg(long)]
    year: Option<i32>,
}

pub(crate) fn run(ledger: &Ledger, args: &ReportArgs) -> Result<()> {
    let records = ledger.records();
    let year = args.year.unwrap_or_else(|| Local::now().year());

    println!("Days taken by type");
    for (leave_type, days) in days_by_type(&records) {
        println!("  {:<14} {}", leave_type.label(), format_days(days));
    }

    println!();
    println!("Monthly breakdown for {year}");
    println!("  {:<10} {:>6} {:>6} {:>9}", "Month", "Local", "Sick", "Vacation");
    for summary in monthly_breakdown(&records, year) {
        println!(
            "  {:<10} {:>6} {:>6} {:>9}",
            summary.month.name(),
            format_days(summary.local),
            format_days(summary.sick),
            format_days(summary.vacation),
        );
    }

    println!();
    println!(
        "{} request(s), {:.1} per month on average",
        records.len(),
        requests_per_month(&records)
    );
    Ok(())
}
