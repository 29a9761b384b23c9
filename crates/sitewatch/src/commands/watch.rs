//! Watch command: run the monitor until Ctrl-C.

use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config::Runtime;
use crate::error::CliError;
use crate::output;

use super::poll;

pub async fn handle(runtime: &Runtime, args: &WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = runtime.monitor.clone();
    if let Some(interval) = args.interval {
        if interval.is_zero() {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be greater than zero".into(),
            });
        }
        config.poll_interval = interval;
    }

    let monitor = poll::build_monitor(runtime, config)?;
    // Subscribe before starting so the first report is not missed
    let mut reports = monitor.subscribe_reports();
    monitor.start().await;

    if !global.quiet {
        eprintln!(
            "Watching '{}' every {} (Ctrl-C to stop)",
            monitor.config().directory,
            humantime::format_duration(monitor.config().poll_interval)
        );
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            res = &mut shutdown => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                break;
            }

            report = reports.recv() => match report {
                Ok(report) => {
                    let out = output::render_single(
                        &global.output,
                        report.as_ref(),
                        poll::report_detail,
                        |r| r.changed.to_string(),
                    );
                    output::print_output(&out, global.quiet);
                }
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "report output fell behind"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    monitor.stop().await;
    Ok(())
}
