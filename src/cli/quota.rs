use super::{Ledger, parse_leave_type, report_warning};
use clap::Args;
use leave_ledger::{
    core::{leave::LeaveType, report::format_quota_line},
    errors::Result,
};

#[derive(Debug, Args)]
pub(crate) struct SetQuotaArgs {
    /// Leave type whose allowance changes
    #[arg(value_parser = parse_leave_type)]
    leave_type: LeaveType,

    /// New allowance in days
    total: f64,
}

pub(crate) fn show(ledger: &Ledger) -> Result<()> {
    for quota in ledger.quotas() {
        println!("{}", format_quota_line(quota));
    }
    Ok(())
}

pub(crate) async fn set(ledger: &mut Ledger, args: &SetQuotaArgs) -> Result<()> {
    let snapshot = ledger.set_quota_total(args.leave_type, args.total).await?;
    report_warning(&snapshot);
    show(ledger)
}

pub(crate) async fn reset(ledger: &mut Ledger) -> Result<()> {
    let snapshot = ledger.reset_quotas().await;
    report_warning(&snapshot);
    show(ledger)
}
