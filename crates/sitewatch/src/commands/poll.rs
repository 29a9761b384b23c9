//! Poll command: one monitor cycle, then print what it found.

use std::sync::Arc;

use tabled::Tabled;

use sitewatch_core::{
    CycleReport, Monitor, MonitorConfig, MonitorParts, PollStatus, SitePoll, TracingNotifier,
};

use crate::cli::{GlobalOpts, PollArgs};
use crate::config::Runtime;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct SitePollRow {
    #[tabled(rename = "Site")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Poll")]
    status: String,
    #[tabled(rename = "Devices")]
    devices: usize,
}

fn to_row(poll: &SitePoll) -> SitePollRow {
    SitePollRow {
        id: poll.site_id.clone(),
        name: poll.site_name.clone(),
        status: match poll.poll_status {
            PollStatus::Success => "success".into(),
            PollStatus::Failed => "failed".into(),
        },
        devices: poll.device_count,
    }
}

/// Build a monitor over the uncached fleet client and the profile's
/// snapshot backend.
pub fn build_monitor(runtime: &Runtime, config: MonitorConfig) -> Result<Monitor, CliError> {
    let fleet = Arc::new(runtime.monitor_fleet()?);
    let parts = MonitorParts::from_fleet(fleet, runtime.snapshot_backend()?, Arc::new(TracingNotifier));
    Ok(Monitor::new(config, parts))
}

/// Key/value summary of a cycle, followed by any transitions.
pub fn report_detail(report: &CycleReport) -> String {
    use std::fmt::Write;

    let mut out = output::detail_block(&[
        ("Started", report.started_at.to_rfc3339()),
        ("Skipped", report.skipped.to_string()),
        ("Sites", format!("{}/{}", report.successful_sites, report.total_sites)),
        ("Devices", report.total_devices.to_string()),
        ("Changed", report.changed.to_string()),
        ("Notified", report.notified.to_string()),
    ]);
    for t in &report.transitions {
        let _ = write!(out, "\n  {} @ {}: {} -> {}", t.device_name, t.site_name, t.from, t.to);
    }
    out
}

pub async fn handle(runtime: &Runtime, args: &PollArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = build_monitor(runtime, runtime.monitor.clone())?;
    monitor.bootstrap().await;
    let report = monitor.run_cycle().await;

    let out = output::render_single(&global.output, &report, report_detail, |r| {
        r.changed.to_string()
    });
    output::print_output(&out, global.quiet);

    if args.sites {
        if let Some(snapshot) = monitor.current_snapshot() {
            let out = output::render_list(&global.output, &snapshot.sites, to_row, |p| p.site_id.clone());
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}
