use super::{Ledger, parse_date, parse_leave_type, report_warning};
use chrono::{Local, NaiveDate, Utc};
use clap::Args;
use leave_ledger::{
    core::{
        leave::{LeaveDraft, LeaveId, LeaveRecord, LeaveStatus, LeaveType, group_by_month},
        report::format_days,
    },
    errors::{Error, Result},
};
use serde_json::Value;

#[derive(Debug, Args)]
pub(crate) struct ListArgs {
    /// Group records by the month they start in
    #[arg(long)]
    by_month: bool,
}

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Leave type: local, sick, vacation, halfLocal or halfSick
    #[arg(long = "type", value_parser = parse_leave_type)]
    leave_type: LeaveType,

    /// First day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,

    /// Last day (YYYY-MM-DD); defaults to the start day
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,

    /// Reason for the leave
    #[arg(long, default_value = "")]
    reason: String,

    /// Name of an attached document
    #[arg(long)]
    attachment: Option<String>,
}

impl AddArgs {
    fn into_draft(self) -> LeaveDraft {
        LeaveDraft {
            start_date: self.start,
            end_date: self.end.unwrap_or(self.start),
            leave_type: self.leave_type,
            reason: self.reason,
            attachment_name: self.attachment,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct EditArgs {
    /// Id of the leave to change
    id: String,

    #[command(flatten)]
    leave: AddArgs,
}

#[derive(Debug, Args)]
pub(crate) struct RemoveArgs {
    /// Id of the leave to delete
    id: String,
}

#[derive(Debug, Args)]
pub(crate) struct TagArgs {
    /// Id of the leave
    id: String,

    /// Field name, e.g. mood, location, tags, notes
    key: String,

    /// JSON value (plain text is stored as a string, `null` clears the field)
    value: String,
}

pub(crate) fn list(ledger: &Ledger, args: &ListArgs) -> Result<()> {
    let records = ledger.records();
    if records.is_empty() {
        println!("No leave recorded yet. Add one with `leave-ledger add`.");
        return Ok(());
    }

    let today = Local::now().date_naive();
    if args.by_month {
        for (month, group) in group_by_month(&records) {
            println!("{month}");
            for record in group {
                println!("  {}", format_record(record, today));
            }
        }
    } else {
        for record in &records {
            println!("{}", format_record(record, today));
        }
    }
    Ok(())
}

pub(crate) async fn add(ledger: &mut Ledger, args: AddArgs) -> Result<()> {
    let snapshot = ledger.submit(args.into_draft(), Utc::now()).await?;
    report_warning(&snapshot);

    if let Some(record) = snapshot.records.last() {
        println!("Added {}", format_record(record, Local::now().date_naive()));
    }
    Ok(())
}

pub(crate) async fn edit(ledger: &mut Ledger, args: EditArgs) -> Result<()> {
    let id = LeaveId::from(args.id);
    if ledger.record(&id).is_none() {
        return Err(Error::LeaveNotFound { id: id.to_string() });
    }

    let snapshot = ledger.edit(&id, args.leave.into_draft()).await?;
    report_warning(&snapshot);
    println!("Updated {id}");
    Ok(())
}

pub(crate) async fn remove(ledger: &mut Ledger, args: &RemoveArgs) -> Result<()> {
    let id = LeaveId::from(args.id.as_str());
    let existed = ledger.record(&id).is_some();

    let snapshot = ledger.remove(&id).await;
    report_warning(&snapshot);
    if existed {
        println!("Removed {id}");
    } else {
        println!("No leave with id {id}; nothing removed");
    }
    Ok(())
}

pub(crate) async fn tag(ledger: &mut Ledger, args: TagArgs) -> Result<()> {
    let value = serde_json::from_str(&args.value).unwrap_or(Value::String(args.value));
    let id = LeaveId::from(args.id);

    let snapshot = ledger.set_metadata(&id, &args.key, value).await?;
    report_warning(&snapshot);

    let fields = ledger
        .metadata(&id)
        .map(serde_json::to_string)
        .transpose()?
        .unwrap_or_else(|| "{}".to_string());
    println!("{id}: {fields}");
    Ok(())
}

pub(crate) fn format_record(record: &LeaveRecord, today: NaiveDate) -> String {
    let status = match record.status_on(today) {
        LeaveStatus::Upcoming => "upcoming",
        LeaveStatus::Active => "active",
        LeaveStatus::Past => "past",
    };
    let span = if record.start_date == record.end_date {
        record.start_date.to_string()
    } else {
        format!("{} → {}", record.start_date, record.end_date)
    };
    let mut line = format!(
        "{} | {} | {} | {} day(s) | {}",
        record.id,
        record.leave_type.label(),
        span,
        format_days(record.consumed_days()),
        status
    );
    if !record.reason.is_empty() {
        line.push_str(" | ");
        line.push_str(&record.reason);
    }
    if let Some(attachment) = &record.attachment_name {
        line.push_str(" | 📎 ");
        line.push_str(attachment);
    }
    line
}
