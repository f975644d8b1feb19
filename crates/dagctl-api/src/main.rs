//! dagctl CLI and REST control API entry point.
//!
//! Binary name: `dagctl`
//!
//! Parses CLI arguments, loads configuration, opens the database and the DAG
//! folder, then dispatches to a command handler or starts the API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, DagsAction, UsersAction};
use dagctl_infra::config::load_config;
use dagctl_infra::filesystem::{config_path, resolve_data_dir};
use dagctl_observe::tracing_setup::{init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "dagctl", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let config_file = cli
        .config
        .clone()
        .unwrap_or_else(|| config_path(&data_dir));
    let config = load_config(&config_file).await?;

    let serving = matches!(cli.command, Commands::Serve { .. });
    init_tracing(config.observe.otel, log_filter(cli.verbose, cli.quiet, serving))
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    tracing::debug!(config = %config_file.display(), data_dir = %data_dir.display(), "starting");

    let state = AppState::init(data_dir, config).await?;

    let result = run(cli, state).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} dagctl API listening on {} ({} DAGs loaded)",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}/api/experimental")).cyan(),
                    state.registry.len()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }
            tracing::info!(%addr, backend = ?state.config.auth.backend, "serving control API");

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Users { action } => match action {
            UsersAction::Add { username, password } => {
                cli::users::add_user(&state, &username, password, cli.json).await?;
            }
            UsersAction::List => {
                cli::users::list_users(&state, cli.json).await?;
            }
        },

        Commands::Dags { action } => match action {
            DagsAction::List => {
                cli::dags::list_dags(&state, cli.json).await?;
            }
        },

        Commands::Completions { .. } => unreachable!("handled in main"),
    }

    Ok(())
}

/// Default filter directives when `RUST_LOG` is unset.
///
/// The server logs requests and login failures at `info`; one-shot commands
/// stay at `warn` unless asked.
fn log_filter(verbose: u8, quiet: bool, serving: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 if serving => "info",
        0 => "warn",
        1 => "info,dagctl=debug,tower_http=debug",
        _ => "trace",
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
