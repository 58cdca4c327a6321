//! Brand, team and API key commands.

use anyhow::{Result, anyhow};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Input};

use socialdesk_types::brand::{CreateBrandRequest, CreateUserRequest, UserRole};

use crate::cli::{print_ok, require_brand};
use crate::state::AppState;

/// Create a brand. Missing fields are asked for interactively.
///
/// ```bash
/// sdesk brand create --name "Acme Coffee" --requires-approval
/// ```
pub async fn create_brand(
    state: &AppState,
    name: Option<String>,
    industry: Option<String>,
    website: Option<String>,
    requires_approval: bool,
    json: bool,
) -> Result<()> {
    let name = match name {
        Some(n) => n,
        None => Input::<String>::new().with_prompt("Brand name").interact_text()?,
    };
    let requires_approval = requires_approval
        || (!json
            && Confirm::new()
                .with_prompt("Require approval before posts go out?")
                .default(false)
                .interact()?);

    let brand = state
        .brand_service
        .create_brand(CreateBrandRequest {
            name,
            industry,
            website,
            requires_approval,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&brand)?);
        return Ok(());
    }

    print_ok("Brand created");
    println!("  {}  {}", style("Name:").bold(), style(&brand.name).cyan());
    println!("  {}  {}", style("Slug:").bold(), &brand.slug);
    println!(
        "  {}  {}",
        style("Approval:").bold(),
        if brand.requires_approval { "required" } else { "not required" }
    );
    println!();
    println!(
        "  Next: {}",
        style(format!("sdesk --brand {} user create --email you@example.com --name You", brand.slug)).yellow()
    );
    println!();
    Ok(())
}

pub async fn list_brands(state: &AppState, json: bool) -> Result<()> {
    let brands = state.brand_service.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&brands)?);
        return Ok(());
    }
    if brands.is_empty() {
        println!();
        println!(
            "  {} No brands yet. Create one with: {}",
            style("i").blue().bold(),
            style("sdesk brand create").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Slug", "Industry", "Approval", "Created"]);
    for brand in &brands {
        let approval = if brand.requires_approval {
            Cell::new("required").fg(Color::Yellow)
        } else {
            Cell::new("-").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(&brand.name).fg(Color::Cyan),
            Cell::new(&brand.slug),
            Cell::new(brand.industry.as_deref().unwrap_or("-")),
            approval,
            Cell::new(brand.created_at.format("%Y-%m-%d").to_string()),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub async fn create_user(
    state: &AppState,
    brand: Option<&str>,
    email: String,
    name: String,
    role: Option<String>,
    json: bool,
) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let role = role
        .map(|r| r.parse::<UserRole>().map_err(|e| anyhow!(e)))
        .transpose()?;
    let user = state
        .brand_service
        .add_user(&brand.id, CreateUserRequest { email, name, role })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }
    print_ok(&format!("{} added to {} as {}", user.email, brand.name, user.role));
    Ok(())
}

pub async fn list_users(state: &AppState, brand: Option<&str>, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let users = state.brand_service.list_users(&brand.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec!["Name", "Email", "Role", "Since"]);
    for user in &users {
        table.add_row(vec![
            Cell::new(&user.name),
            Cell::new(&user.email),
            Cell::new(user.role.to_string()),
            Cell::new(user.created_at.format("%Y-%m-%d").to_string()),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Issue an API key. The plaintext is shown here and never again.
pub async fn create_key(
    state: &AppState,
    brand: Option<&str>,
    email: &str,
    label: Option<&str>,
    json: bool,
) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let user = state
        .brand_service
        .list_users(&brand.id)
        .await?
        .into_iter()
        .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
        .ok_or_else(|| anyhow!("no member '{email}' in brand '{}'", brand.slug))?;

    let (key, info) = state.api_keys.issue(&user, label).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "key": key, "info": info }))?
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} API key for {} (save this, it won't be shown again):",
        style("🔑").bold(),
        style(&user.email).cyan()
    );
    println!();
    println!("  {}", style(&key).yellow().bold());
    println!();
    Ok(())
}

pub async fn list_keys(state: &AppState, brand: Option<&str>, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    let keys = state.api_keys.list(&brand.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&keys)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec!["Prefix", "Label", "Created", "Last used"]);
    for key in &keys {
        table.add_row(vec![
            Cell::new(&key.prefix).fg(Color::Cyan),
            Cell::new(key.label.as_deref().unwrap_or("-")),
            Cell::new(key.created_at.format("%Y-%m-%d").to_string()),
            Cell::new(
                key.last_used_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string()),
            ),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub async fn revoke_key(state: &AppState, brand: Option<&str>, prefix: &str, json: bool) -> Result<()> {
    let brand = require_brand(state, brand).await?;
    state.api_keys.revoke(&brand.id, prefix).await?;
    if json {
        println!("{}", serde_json::json!({ "revoked": prefix }));
    } else {
        print_ok(&format!("Key {prefix} revoked"));
    }
    Ok(())
}
