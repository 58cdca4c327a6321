//! CLI command definitions and dispatch for the `sdesk` binary.
//!
//! Uses clap derive macros for argument parsing. Commands follow a
//! noun-verb pattern (`sdesk post create`, `sdesk inbox reply`). Every
//! brand-scoped command needs `--brand <slug>` (or `SOCIALDESK_BRAND`).

pub mod account;
pub mod brand;
pub mod calendar;
pub mod inbox;
pub mod post;
pub mod status;
pub mod worker;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use comfy_table::{Cell, Color};
use console::style;

use socialdesk_types::brand::Brand;
use socialdesk_types::post::PostStatus;

use crate::state::AppState;

/// Plan, approve, publish and answer social media for your brands.
#[derive(Parser)]
#[command(name = "sdesk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format: text or json.
    #[arg(long, global = true, default_value = "text", env = "SOCIALDESK_LOG_FORMAT")]
    pub log_format: String,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Brand slug for brand-scoped commands.
    #[arg(long, short = 'b', global = true, env = "SOCIALDESK_BRAND")]
    pub brand: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server (and the scheduler, when enabled).
    Serve {
        /// Port to listen on. Defaults to `[server].port`.
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to. Defaults to `[server].host`.
        #[arg(long)]
        host: Option<String>,

        /// Do not run the scheduled publisher in this process.
        #[arg(long)]
        no_scheduler: bool,
    },

    /// Run the scheduled publisher on its own.
    Worker {
        /// Publish what is due right now and exit.
        #[arg(long)]
        once: bool,
    },

    /// Manage brands.
    Brand {
        #[command(subcommand)]
        action: BrandCommand,
    },

    /// Manage brand team members.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Manage API keys.
    Key {
        #[command(subcommand)]
        action: KeyCommand,
    },

    /// Manage connected social accounts.
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },

    /// Compose, review, schedule and publish posts.
    Post {
        #[command(subcommand)]
        action: PostCommand,
    },

    /// Show the content calendar for a month.
    Calendar {
        /// Year (defaults to the current one).
        #[arg(long)]
        year: Option<i32>,

        /// Month 1-12 (defaults to the current one).
        #[arg(long)]
        month: Option<u32>,
    },

    /// Read and answer messages and comments.
    Inbox {
        #[command(subcommand)]
        action: InboxCommand,
    },

    /// System status dashboard.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum BrandCommand {
    /// Create a brand. Prompts for missing fields.
    Create {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        #[arg(long)]
        website: Option<String>,

        /// Require an approver to sign off every post.
        #[arg(long)]
        requires_approval: bool,
    },

    /// List all brands.
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Add a team member to the brand.
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// owner, admin, editor or viewer.
        #[arg(long)]
        role: Option<String>,
    },

    /// List the brand's team.
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum KeyCommand {
    /// Issue an API key for a team member. The key is printed once.
    Create {
        /// Member email.
        #[arg(long)]
        email: String,

        #[arg(long)]
        label: Option<String>,
    },

    /// List the brand's keys (prefixes only).
    #[command(alias = "ls")]
    List,

    /// Revoke a key by prefix.
    Revoke { prefix: String },
}

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Connect an Instagram or Facebook account with a long-lived token.
    Connect {
        /// instagram or facebook.
        #[arg(long)]
        platform: String,

        /// Public handle, e.g. @acme.
        #[arg(long)]
        handle: String,

        /// Platform id (Instagram business user id or page id).
        #[arg(long)]
        external_id: String,

        #[arg(long)]
        display_name: Option<String>,

        /// Access token. Prompted for when omitted.
        #[arg(long, env = "SOCIALDESK_ACCESS_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Token expiry (RFC 3339).
        #[arg(long)]
        expires_at: Option<String>,
    },

    /// List connected accounts.
    #[command(alias = "ls")]
    List,

    /// Disconnect an account. Its token is wiped.
    Disconnect {
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum PostCommand {
    /// Compose a post for one or more accounts.
    Create {
        /// Caption text.
        #[arg(long)]
        content: String,

        /// Target account id (repeatable).
        #[arg(long = "account", required = true)]
        accounts: Vec<String>,

        #[arg(long)]
        title: Option<String>,

        /// Media URL (repeatable).
        #[arg(long = "media")]
        media_urls: Vec<String>,

        /// Hashtag without the # (repeatable).
        #[arg(long = "hashtag")]
        hashtags: Vec<String>,

        /// Publish time (RFC 3339).
        #[arg(long)]
        at: Option<String>,
    },

    /// List posts.
    #[command(alias = "ls")]
    List {
        /// Filter by status.
        #[arg(long)]
        status: Option<String>,

        /// Sort field: created_at, scheduled_at, updated_at, published_at.
        #[arg(long, default_value = "created_at")]
        sort: String,

        #[arg(long, default_value = "50")]
        limit: i64,
    },

    /// Show one post and its platform items.
    Show { id: String },

    /// Approve a post waiting for review.
    Approve {
        id: String,

        #[arg(long)]
        note: Option<String>,
    },

    /// Reject a post waiting for review.
    Reject {
        id: String,

        #[arg(long)]
        note: Option<String>,
    },

    /// Schedule a post.
    Schedule {
        id: String,

        /// Publish time (RFC 3339).
        at: String,
    },

    /// Publish a post now (or retry its failed items).
    Publish { id: String },

    /// Delete a post that has not gone out.
    #[command(alias = "rm")]
    Delete {
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum InboxCommand {
    /// List conversations, newest activity first.
    #[command(alias = "ls")]
    List {
        /// open, pending, resolved or archived.
        #[arg(long)]
        status: Option<String>,

        /// Only conversations with unread messages.
        #[arg(long)]
        unread: bool,
    },

    /// Show a conversation thread and mark it read.
    Show { id: String },

    /// Reply on the platform.
    Reply { id: String, text: String },
}

/// Resolve `--brand` to a brand, with a hint when it is missing.
pub async fn require_brand(state: &AppState, slug: Option<&str>) -> Result<Brand> {
    let slug = slug.context("this command needs a brand: pass --brand <slug> or set SOCIALDESK_BRAND")?;
    state
        .brand_service
        .get_by_slug(slug)
        .await
        .with_context(|| format!("brand '{slug}'"))
}

/// Parse an RFC 3339 timestamp given on the command line.
pub fn parse_time(raw: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    let parsed = chrono::DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("'{raw}' is not an RFC 3339 time (e.g. 2026-03-01T09:00:00Z)"))?;
    Ok(parsed.with_timezone(&chrono::Utc))
}

pub fn status_cell(status: PostStatus) -> Cell {
    let color = match status {
        PostStatus::Draft => Color::DarkGrey,
        PostStatus::PendingApproval => Color::Yellow,
        PostStatus::Approved | PostStatus::Scheduled => Color::Cyan,
        PostStatus::Publishing => Color::Blue,
        PostStatus::Published => Color::Green,
        PostStatus::PartiallyPublished => Color::Magenta,
        PostStatus::Rejected | PostStatus::Failed => Color::Red,
    };
    Cell::new(status.as_str()).fg(color)
}

/// Single-line preview of a caption for tables.
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

pub fn print_ok(message: &str) {
    println!();
    println!("  {} {}", style("✓").green().bold(), message);
    println!();
}
