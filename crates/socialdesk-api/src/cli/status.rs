//! System status dashboard command.

use anyhow::Result;
use console::style;

use socialdesk_core::repository::conversation::ConversationFilter;
use socialdesk_core::repository::post::PostFilter;
use socialdesk_types::inbox::ConversationStatus;
use socialdesk_types::post::PostStatus;

use crate::state::AppState;

const INTEGRATIONS: [&str; 4] = ["meta-webhooks", "gemini", "cloudinary", "unsplash"];

/// Display system status: brands with their queues, integrations, storage.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let brands = state.brand_service.list().await?;

    let mut rows = Vec::with_capacity(brands.len());
    for brand in &brands {
        let accounts = state.account_service.list(&brand.id).await?.len();
        let scheduled = state
            .post_service
            .list(
                &brand.id,
                PostFilter {
                    status: Some(PostStatus::Scheduled),
                    ..Default::default()
                },
            )
            .await?
            .len();
        let awaiting_review = state
            .post_service
            .list(
                &brand.id,
                PostFilter {
                    status: Some(PostStatus::PendingApproval),
                    ..Default::default()
                },
            )
            .await?
            .len();
        let open = state
            .inbox_service
            .list(
                &brand.id,
                ConversationFilter {
                    status: Some(ConversationStatus::Open),
                    ..Default::default()
                },
            )
            .await?
            .len();
        rows.push((brand, accounts, scheduled, awaiting_review, open));
    }

    if json {
        let brands: Vec<_> = rows
            .iter()
            .map(|(b, accounts, scheduled, review, open)| {
                serde_json::json!({
                    "slug": b.slug,
                    "accounts": accounts,
                    "scheduled": scheduled,
                    "pending_approval": review,
                    "open_conversations": open,
                })
            })
            .collect();
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "brands": brands,
            "integrations": state.integrations,
            "scheduler": state.config.scheduler.enabled,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} SocialDesk v{}", style("⚡").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Brands ──").dim());
    if rows.is_empty() {
        println!("  {}", style("none yet").dim());
    }
    for (brand, accounts, scheduled, review, open) in &rows {
        println!(
            "  {:<20} {} accounts, {} scheduled, {} to review, {} open",
            style(&brand.slug).cyan(),
            accounts,
            style(scheduled).bold(),
            if *review > 0 { style(*review).yellow() } else { style(*review).dim() },
            if *open > 0 { style(*open).yellow() } else { style(*open).dim() },
        );
    }
    println!();

    println!("  {}", style("── Integrations ──").dim());
    for name in INTEGRATIONS {
        let mark = if state.integrations.contains(&name) {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {mark} {name}");
    }
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir:  {}", style(state.data_dir.display()).dim());
    println!("  Database:  {}", style("SQLite (WAL mode)").dim());
    println!(
        "  Scheduler: {}",
        if state.config.scheduler.enabled {
            style(format!("every {}s", state.config.scheduler.tick_interval_secs)).green()
        } else {
            style("disabled".to_string()).dim()
        }
    );
    println!();
    Ok(())
}
