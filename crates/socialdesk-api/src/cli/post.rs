//! Post commands: compose, review, schedule, publish.
//!
//! The CLI acts as the local operator (`Actor::system()`), so it may
//! approve and schedule regardless of the brand's approval setting.

use anyhow::{Result, anyhow};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use socialdesk_core::repository::post::PostFilter;
use socialdesk_core::service::Actor;
use socialdesk_types::id::{AccountId, PostId};
use socialdesk_types::post::{CreatePostRequest, ItemStatus, Post, PostStatus, ReviewDecision};

use crate::cli::{parse_time, print_ok, require_brand, status_cell, truncate};
use crate::state::AppState;

fn parse_post_id(raw: &str) -> Result<PostId> {
    raw.parse().map_err(|_| anyhow!("invalid post id '{raw}'"))
}

pub struct NewPost {
    pub content: String,
    pub accounts: Vec<String>,
    pub title: Option<String>,
    pub media_urls: Vec<String>,
    pub hashtags: Vec<String>,
    pub at: Option<String>,
}

pub async fn create_post(state: &AppState, brand: Option<&str>, new: NewPost, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let account_ids = new
        .accounts
        .iter()
        .map(|a| a.parse::<AccountId>().map_err(|_| anyhow!("invalid account id '{a}'")))
        .collect::<Result<Vec<_>>>()?;
    let scheduled_at = new.at.as_deref().map(parse_time).transpose()?;

    let post = state
        .post_service
        .create_post(
            &brand.id,
            Actor::system(),
            CreatePostRequest {
                title: new.title,
                content: new.content,
                media_urls: new.media_urls,
                hashtags: new.hashtags,
                account_ids,
                scheduled_at,
                media_type: None,
            },
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&post)?);
        return Ok(());
    }
    print_ok(&format!("Post created ({})", post.status));
    print_post(&post);
    Ok(())
}

pub async fn list_posts(
    state: &AppState,
    brand: Option<&str>,
    status: Option<String>,
    sort: &str,
    limit: i64,
    json: bool,
) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let status = status
        .map(|s| s.parse::<PostStatus>().map_err(|e| anyhow!(e)))
        .transpose()?;
    let posts = state
        .post_service
        .list(
            &brand.id,
            PostFilter {
                status,
                sort_by: Some(sort.to_string()),
                limit: Some(limit),
                ..Default::default()
            },
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }
    if posts.is_empty() {
        println!();
        println!(
            "  {} No posts found. Compose one with: {}",
            style("i").blue().bold(),
            style("sdesk post create").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Status", "Caption", "Platforms", "When"]);
    for post in &posts {
        let platforms = post
            .items
            .iter()
            .map(|i| i.platform.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let when = post
            .published_at
            .or(post.scheduled_at)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(post.id.to_string()).fg(Color::DarkGrey),
            status_cell(post.status),
            Cell::new(truncate(&post.content, 48)),
            Cell::new(platforms),
            Cell::new(when),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub async fn show_post(state: &AppState, brand: Option<&str>, id: &str, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let post = state.post_service.get(&brand.id, &parse_post_id(id)?).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&post)?);
        return Ok(());
    }
    println!();
    print_post(&post);
    Ok(())
}

pub async fn review_post(
    state: &AppState,
    brand: Option<&str>,
    id: &str,
    approve: bool,
    note: Option<String>,
    json: bool,
) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let post = state
        .post_service
        .review(&brand.id, &parse_post_id(id)?, Actor::system(), ReviewDecision { approve, note })
        .await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&post)?);
    } else {
        print_ok(&format!("Post is now {}", post.status));
    }
    Ok(())
}

pub async fn schedule_post(state: &AppState, brand: Option<&str>, id: &str, at: &str, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let at = parse_time(at)?;
    let post = state
        .post_service
        .schedule(&brand.id, &parse_post_id(id)?, Actor::system(), at)
        .await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&post)?);
    } else {
        print_ok(&format!("Scheduled for {}", at.format("%Y-%m-%d %H:%M UTC")));
    }
    Ok(())
}

pub async fn publish_post(state: &AppState, brand: Option<&str>, id: &str, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let id = parse_post_id(id)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Publishing...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let result = state
        .publish_service
        .publish_now(&brand.id, &id, Actor::system())
        .await;
    spinner.finish_and_clear();
    let post = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&post)?);
        return Ok(());
    }
    println!();
    print_post(&post);
    Ok(())
}

pub async fn delete_post(state: &AppState, brand: Option<&str>, id: &str, force: bool, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let id = parse_post_id(id)?;
    let post = state.post_service.get(&brand.id, &id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete post \"{}\"?", truncate(&post.content, 40)))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.post_service.delete_post(&brand.id, &id, Actor::system()).await?;
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        print_ok("Post deleted");
    }
    Ok(())
}

fn print_post(post: &Post) {
    if let Some(title) = &post.title {
        println!("  {}", style(title).bold());
    }
    println!("  {}  {}", style("ID:").bold(), style(post.id.to_string()).dim());
    println!("  {}  {}", style("Status:").bold(), post.status);
    if let Some(at) = post.scheduled_at {
        println!("  {}  {}", style("Scheduled:").bold(), at.format("%Y-%m-%d %H:%M UTC"));
    }
    if let Some(note) = &post.review_note {
        println!("  {}  {}", style("Review note:").bold(), note);
    }
    println!();
    println!("  {}", post.content);
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Platform", "Type", "Status", "Link / error"]);
    for item in &post.items {
        let status = match item.status {
            ItemStatus::Pending => Cell::new("pending").fg(Color::DarkGrey),
            ItemStatus::Publishing => Cell::new("publishing").fg(Color::Blue),
            ItemStatus::Published => Cell::new("published").fg(Color::Green),
            ItemStatus::Failed => Cell::new("failed").fg(Color::Red),
        };
        let detail = item
            .permalink
            .clone()
            .or_else(|| item.error.clone())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(item.platform.to_string()),
            Cell::new(item.media_type.to_string()),
            status,
            Cell::new(detail),
        ]);
    }
    println!("{table}");
    println!();
}
