use super::{Ledger, parse_date};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use leave_ledger::{
    core::{
        calendar::{DaySummary, day_summary, leaves_between, range_summary},
        holidays::HolidayCalendar,
    },
    errors::{Error, Result},
};

#[derive(Debug, Args)]
pub(crate) struct DayArgs {
    /// Day to look up (YYYY-MM-DD); defaults to today
    #[arg(value_parser = parse_date)]
    date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub(crate) struct HolidaysArgs {
    /// Calendar year; defaults to the current year
    #[arg(long)]
    year: Option<i32>,
}

#[derive(Debug, Args)]
pub(crate) struct RangeArgs {
    /// First day of the range (YYYY-MM-DD)
    #[arg(value_parser = parse_date)]
    from: NaiveDate,

    /// Last day of the range (YYYY-MM-DD)
    #[arg(value_parser = parse_date)]
    to: NaiveDate,
}

pub(crate) fn day(ledger: &Ledger, holidays: &HolidayCalendar, args: &DayArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let records = ledger.records();
    let summary = day_summary(&records, holidays, date);

    println!("{}", format_day(&summary));
    for leave in &summary.leaves {
        let reason = if leave.reason.is_empty() {
            String::new()
        } else {
            format!(": {}", leave.reason)
        };
        println!("  {} ({}){reason}", leave.leave_type.label(), leave.id);
    }
    Ok(())
}

pub(crate) fn range(ledger: &Ledger, holidays: &HolidayCalendar, args: &RangeArgs) -> Result<()> {
    if args.from > args.to {
        return Err(Error::Validation {
            message: format!("range start {} is after its end {}", args.from, args.to),
        });
    }

    let records = ledger.records();
    let summaries = range_summary(&records, holidays, args.from, args.to);
    let busy = summaries.iter().filter(|s| !s.leaves.is_empty()).count();

    for summary in &summaries {
        println!("{}", format_day(summary));
    }
    println!("{} of {} day(s) with leave", busy, summaries.len());

    let overlapping = leaves_between(&records, args.from, args.to);
    if !overlapping.is_empty() {
        println!();
        for leave in overlapping {
            println!(
                "  {} {} → {} ({})",
                leave.leave_type.label(),
                leave.start_date,
                leave.end_date,
                leave.id
            );
        }
    }
    Ok(())
}

pub(crate) fn holidays(calendar: &HolidayCalendar, args: &HolidaysArgs) -> Result<()> {
    let year = args.year.unwrap_or_else(|| Local::now().year());
    for (date, holiday) in calendar.in_year(year) {
        println!("{} {:<3} {}", date, date.weekday(), holiday.name);
    }
    Ok(())
}

fn format_day(summary: &DaySummary<'_>) -> String {
    let mut line = format!("{} {}", summary.date, summary.date.weekday());
    if let Some(holiday) = summary.holiday {
        line.push_str(&format!(" 🎉 {}", holiday.name));
    }
    if summary.is_free() {
        line.push_str(" -");
    } else if !summary.leaves.is_empty() {
        let types: Vec<&str> = summary.leaves.iter().map(|l| l.leave_type.label()).collect();
        line.push_str(&format!(" | {}", types.join(", ")));
    }
    line
}
