//! SocialDesk CLI and REST API entry point.
//!
//! Binary name: `sdesk`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use cli::{AccountCommand, BrandCommand, Cli, Commands, InboxCommand, KeyCommand, PostCommand, UserCommand};
use socialdesk_observe::tracing_setup::{DEFAULT_FILTER, LogFormat, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Verbosity flags only matter when RUST_LOG is unset.
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 if matches!(cli.command, Commands::Serve { .. } | Commands::Worker { .. }) => DEFAULT_FILTER,
        0 => "warn",
        1 => "info,socialdesk=debug",
        _ => "trace",
    };
    let format: LogFormat = cli.log_format.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    init_tracing(format, cli.otel, Some(filter)).map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "sdesk", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = dispatch(cli, state).await;
    shutdown_tracing();
    result
}

async fn dispatch(cli: Cli, state: AppState) -> anyhow::Result<()> {
    let brand = cli.brand.as_deref();
    let json = cli.json;

    match cli.command {
        Commands::Serve {
            port,
            host,
            no_scheduler,
        } => serve(state, host, port, no_scheduler).await?,

        Commands::Worker { once } => cli::worker::run_worker(&state, once, json).await?,

        Commands::Brand { action } => match action {
            BrandCommand::Create {
                name,
                industry,
                website,
                requires_approval,
            } => cli::brand::create_brand(&state, name, industry, website, requires_approval, json).await?,
            BrandCommand::List => cli::brand::list_brands(&state, json).await?,
        },

        Commands::User { action } => match action {
            UserCommand::Create { email, name, role } => {
                cli::brand::create_user(&state, brand, email, name, role, json).await?
            }
            UserCommand::List => cli::brand::list_users(&state, brand, json).await?,
        },

        Commands::Key { action } => match action {
            KeyCommand::Create { email, label } => {
                cli::brand::create_key(&state, brand, &email, label.as_deref(), json).await?
            }
            KeyCommand::List => cli::brand::list_keys(&state, brand, json).await?,
            KeyCommand::Revoke { prefix } => cli::brand::revoke_key(&state, brand, &prefix, json).await?,
        },

        Commands::Account { action } => match action {
            AccountCommand::Connect {
                platform,
                handle,
                external_id,
                display_name,
                token,
                expires_at,
            } => {
                cli::account::connect_account(
                    &state,
                    brand,
                    &platform,
                    handle,
                    external_id,
                    display_name,
                    token,
                    expires_at.as_deref(),
                    json,
                )
                .await?
            }
            AccountCommand::List => cli::account::list_accounts(&state, brand, json).await?,
            AccountCommand::Disconnect { id, force } => {
                cli::account::disconnect_account(&state, brand, &id, force, json).await?
            }
        },

        Commands::Post { action } => match action {
            PostCommand::Create {
                content,
                accounts,
                title,
                media_urls,
                hashtags,
                at,
            } => {
                let new = cli::post::NewPost {
                    content,
                    accounts,
                    title,
                    media_urls,
                    hashtags,
                    at,
                };
                cli::post::create_post(&state, brand, new, json).await?
            }
            PostCommand::List { status, sort, limit } => {
                cli::post::list_posts(&state, brand, status, &sort, limit, json).await?
            }
            PostCommand::Show { id } => cli::post::show_post(&state, brand, &id, json).await?,
            PostCommand::Approve { id, note } => cli::post::review_post(&state, brand, &id, true, note, json).await?,
            PostCommand::Reject { id, note } => cli::post::review_post(&state, brand, &id, false, note, json).await?,
            PostCommand::Schedule { id, at } => cli::post::schedule_post(&state, brand, &id, &at, json).await?,
            PostCommand::Publish { id } => cli::post::publish_post(&state, brand, &id, json).await?,
            PostCommand::Delete { id, force } => cli::post::delete_post(&state, brand, &id, force, json).await?,
        },

        Commands::Calendar { year, month } => cli::calendar::show_month(&state, brand, year, month, json).await?,

        Commands::Inbox { action } => match action {
            InboxCommand::List { status, unread } => {
                cli::inbox::list_conversations(&state, brand, status, unread, json).await?
            }
            InboxCommand::Show { id } => cli::inbox::show_thread(&state, brand, &id, json).await?,
            InboxCommand::Reply { id, text } => cli::inbox::reply(&state, brand, &id, &text, json).await?,
        },

        Commands::Status => cli::status::status(&state, json).await?,

        Commands::Completions { .. } => unreachable!("handled before state init"),
    }
    Ok(())
}

/// Run the REST API, plus the scheduled publisher unless disabled.
async fn serve(state: AppState, host: Option<String>, port: Option<u16>, no_scheduler: bool) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let cancel = CancellationToken::new();
    let worker = if state.config.scheduler.enabled && !no_scheduler {
        let scheduler = state.scheduler();
        let token = cancel.clone();
        Some(tokio::spawn(async move { scheduler.run(token).await }))
    } else {
        None
    };

    println!(
        "  {} SocialDesk API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());
    tracing::info!(%addr, scheduler = worker.is_some(), "server started");

    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    if let Some(handle) = worker
        && let Err(e) = handle.await
    {
        tracing::error!(error = %e, "scheduler task ended abnormally");
    }
    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
