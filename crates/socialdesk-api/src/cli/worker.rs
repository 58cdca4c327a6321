//! Standalone scheduled publisher.

use anyhow::Result;
use chrono::Utc;
use console::style;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub async fn run_worker(state: &AppState, once: bool, json: bool) -> Result<()> {
    let expired = state.account_service.refresh_statuses(Utc::now()).await?;
    if expired > 0 {
        tracing::warn!(expired, "accounts with expired tokens");
    }

    let scheduler = state.scheduler();
    if once {
        let report = scheduler.run_once(Utc::now()).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        println!();
        println!(
            "  {} {} due, {} published, {} partial, {} failed",
            style("⏱").bold(),
            report.due,
            style(report.published).green(),
            style(report.partial).magenta(),
            style(report.failed).red()
        );
        for (id, error) in &report.errors {
            println!("    {} {id}: {error}", style("✗").red());
        }
        println!();
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        crate::shutdown_signal().await;
        signal.cancel();
    });

    println!(
        "  {} Scheduler running every {}s. {}",
        style("⏱").bold(),
        state.config.scheduler.tick_interval_secs,
        style("Press Ctrl+C to stop").dim()
    );
    scheduler.run(cancel).await;
    Ok(())
}
