//! Month view of the content calendar.

use anyhow::Result;
use chrono::{Datelike, Utc};
use comfy_table::{Cell, ContentArrangement, Table, presets};
use console::style;

use socialdesk_core::service::calendar::calendar_time;

use crate::cli::{require_brand, status_cell, truncate};
use crate::state::AppState;

pub async fn show_month(
    state: &AppState,
    brand: Option<&str>,
    year: Option<i32>,
    month: Option<u32>,
    json: bool,
) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let today = Utc::now().date_naive();
    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month());
    let days = state.calendar_service.month(&brand.id, year, month).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} - {year}-{month:02}",
        style("📅").bold(),
        style(&brand.name).cyan()
    );
    println!();
    if days.is_empty() {
        println!("  {}", style("Nothing planned this month.").dim());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Day", "Time", "Status", "Caption"]);
    for day in &days {
        for (i, post) in day.posts.iter().enumerate() {
            let label = if i == 0 {
                day.date.format("%a %d").to_string()
            } else {
                String::new()
            };
            let time = calendar_time(post)
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(label),
                Cell::new(time),
                status_cell(post.status),
                Cell::new(truncate(&post.content, 56)),
            ]);
        }
    }
    println!("{table}");
    println!();
    Ok(())
}
