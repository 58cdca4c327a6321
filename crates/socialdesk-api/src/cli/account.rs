//! Connected account commands.

use anyhow::{Result, anyhow};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Password};

use socialdesk_types::account::{AccountStatus, ConnectAccountRequest, Platform};
use socialdesk_types::id::AccountId;

use crate::cli::{parse_time, print_ok, require_brand};
use crate::state::AppState;

#[allow(clippy::too_many_arguments)]
pub async fn connect_account(
    state: &AppState,
    brand: Option<&str>,
    platform: &str,
    handle: String,
    external_id: String,
    display_name: Option<String>,
    token: Option<String>,
    expires_at: Option<&str>,
    json: bool,
) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let platform: Platform = platform.parse().map_err(|e: String| anyhow!(e))?;
    let access_token = match token {
        Some(t) => t,
        None => Password::new().with_prompt("Access token").interact()?,
    };
    let token_expires_at = expires_at.map(parse_time).transpose()?;

    let account = state
        .account_service
        .connect(
            &brand.id,
            ConnectAccountRequest {
                platform,
                handle,
                external_id,
                display_name,
                access_token,
                token_expires_at,
            },
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
        return Ok(());
    }
    print_ok(&format!("Connected {} @{}", account.platform, account.handle));
    println!("  {}  {}", style("ID:").bold(), style(account.id.to_string()).dim());
    println!();
    Ok(())
}

pub async fn list_accounts(state: &AppState, brand: Option<&str>, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let accounts = state.account_service.list(&brand.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }
    if accounts.is_empty() {
        println!();
        println!(
            "  {} No accounts connected. Use: {}",
            style("i").blue().bold(),
            style("sdesk account connect").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Platform", "Handle", "Status", "Token expires"]);
    for account in &accounts {
        let status = match account.status {
            AccountStatus::Active => Cell::new("● active").fg(Color::Green),
            AccountStatus::Expired => Cell::new("○ expired").fg(Color::Yellow),
            AccountStatus::Disconnected => Cell::new("◌ disconnected").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(account.id.to_string()).fg(Color::DarkGrey),
            Cell::new(account.platform.to_string()),
            Cell::new(format!("@{}", account.handle)).fg(Color::Cyan),
            status,
            Cell::new(
                account
                    .token_expires_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub async fn disconnect_account(
    state: &AppState,
    brand: Option<&str>,
    id: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let id: AccountId = id.parse().map_err(|_| anyhow!("invalid account id '{id}'"))?;
    let account = state.account_service.get(&brand.id, &id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Disconnect {} @{}?", account.platform, account.handle))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let account = state.account_service.disconnect(&brand.id, &id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
    } else {
        print_ok(&format!("Disconnected @{}", account.handle));
    }
    Ok(())
}
