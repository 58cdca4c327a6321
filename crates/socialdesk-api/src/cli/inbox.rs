//! Inbox commands.

use anyhow::{Result, anyhow};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use socialdesk_core::repository::conversation::ConversationFilter;
use socialdesk_core::service::Actor;
use socialdesk_types::id::ConversationId;
use socialdesk_types::inbox::{ConversationStatus, MessageDirection};

use crate::cli::{print_ok, require_brand, truncate};
use crate::state::AppState;

fn parse_conversation_id(raw: &str) -> Result<ConversationId> {
    raw.parse().map_err(|_| anyhow!("invalid conversation id '{raw}'"))
}

pub async fn list_conversations(
    state: &AppState,
    brand: Option<&str>,
    status: Option<String>,
    unread: bool,
    json: bool,
) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let status = status
        .map(|s| s.parse::<ConversationStatus>().map_err(|e| anyhow!(e)))
        .transpose()?;
    let conversations = state
        .inbox_service
        .list(
            &brand.id,
            ConversationFilter {
                status,
                unread_only: unread,
                ..Default::default()
            },
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversations)?);
        return Ok(());
    }
    if conversations.is_empty() {
        println!();
        println!("  {} Inbox zero.", style("✓").green().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Kind", "From", "Status", "Unread", "Last message"]);
    for c in &conversations {
        let unread = if c.unread_count > 0 {
            Cell::new(c.unread_count).fg(Color::Yellow)
        } else {
            Cell::new("-").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(c.id.to_string()).fg(Color::DarkGrey),
            Cell::new(c.kind.to_string()),
            Cell::new(
                c.participant_handle
                    .as_deref()
                    .map(|h| format!("@{h}"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(c.status.to_string()),
            unread,
            Cell::new(truncate(c.last_message_preview.as_deref().unwrap_or(""), 48)),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub async fn show_thread(state: &AppState, brand: Option<&str>, id: &str, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let id = parse_conversation_id(id)?;
    let thread = state.inbox_service.get_thread(&brand.id, &id).await?;
    state.inbox_service.mark_read(&brand.id, &id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&thread)?);
        return Ok(());
    }

    let c = &thread.conversation;
    println!();
    println!(
        "  {} {} with {} ({})",
        style("💬").bold(),
        c.kind,
        style(c.participant_handle.as_deref().unwrap_or("unknown")).cyan(),
        c.status
    );
    println!();
    for m in &thread.messages {
        let who = match m.direction {
            MessageDirection::Inbound => style(m.sender_handle.clone().unwrap_or_else(|| "them".to_string())).cyan(),
            MessageDirection::Outbound => style("you".to_string()).green(),
        };
        println!("  {} {}", style(m.sent_at.format("%m-%d %H:%M")).dim(), who);
        for line in m.body.lines() {
            println!("    {line}");
        }
    }
    println!();
    Ok(())
}

pub async fn reply(state: &AppState, brand: Option<&str>, id: &str, text: &str, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let id = parse_conversation_id(id)?;
    let message = state
        .inbox_service
        .reply(&brand.id, &id, Actor::system(), text)
        .await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&message)?);
    } else {
        print_ok("Reply sent");
    }
    Ok(())
}
