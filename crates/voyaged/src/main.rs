use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use voyage_core::config::{DEFAULT_GENERATION_ENDPOINT, DEFAULT_HISTORY_WINDOW, DEFAULT_MAX_CONTEXT_FIELDS};
use voyage_core::{CoreConfig, MemorySessionStore, MemoryStepStore, Orchestrator, Scenario};

mod client;
mod routes;
mod state;

use client::HttpGenerationService;
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "voyaged", about = "Text adventure game daemon")]
struct Args {
    /// Address to bind.
    #[arg(long, env = "BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on for HTTP clients.
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Base URL of the narrative generation service.
    #[arg(long = "llm-url", env = "LLM_SERVICE_URL", default_value = DEFAULT_GENERATION_ENDPOINT)]
    llm_url: String,

    /// Milliseconds allowed for one generation call.
    #[arg(long = "llm-timeout-ms", env = "LLM_TIMEOUT_MS", default_value_t = 30_000u64)]
    llm_timeout_ms: u64,

    /// Model name forwarded to the generation service.
    #[arg(long, env = "LLM_MODEL")]
    model: Option<String>,

    /// Largest number of fields a game state may hold.
    #[arg(long = "max-fields", env = "CONTEXT_MAX_FIELDS", default_value_t = DEFAULT_MAX_CONTEXT_FIELDS)]
    max_fields: usize,

    /// Recent steps folded into the history summary.
    #[arg(long = "history-window", env = "HISTORY_WINDOW", default_value_t = DEFAULT_HISTORY_WINDOW)]
    history_window: usize,

    /// Seconds between sweeps for expired sessions.
    #[arg(long = "reap-secs", env = "SESSION_REAP_SECS", default_value_t = 3_600u64)]
    reap_secs: u64,

    /// Scenario JSON document; the built-in crash landing is used otherwise.
    #[arg(long, env = "SCENARIO")]
    scenario: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn core_config(&self) -> CoreConfig {
        CoreConfig {
            max_context_fields: self.max_fields,
            generation_timeout: Duration::from_millis(self.llm_timeout_ms),
            generation_endpoint: self.llm_url.clone(),
            history_window: self.history_window,
            model: self.model.clone(),
            ..CoreConfig::default()
        }
    }
}

fn load_scenario(args: &Args) -> Result<Scenario> {
    match &args.scenario {
        Some(path) => Scenario::load_from_path(path)
            .with_context(|| format!("failed to load scenario from {:?}", path)),
        None => Ok(Scenario::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&args.log_level)
            .with_context(|| format!("invalid log level {:?}", args.log_level))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = args.core_config();
    let scenario = load_scenario(&args)?;
    let generator = HttpGenerationService::new(&config.generation_endpoint, config.generation_timeout)?;
    info!(
        endpoint = %config.generation_endpoint,
        timeout_ms = args.llm_timeout_ms,
        max_fields = config.max_context_fields,
        scenario = %scenario.name,
        "configured game core"
    );

    let orchestrator = Orchestrator::new(
        config,
        Arc::new(MemoryStepStore::new()),
        Arc::new(MemorySessionStore::new()),
        Arc::new(generator),
    )
    .with_scenario(scenario);
    let state = AppState::new(orchestrator);

    // Spawn session reaper.
    let reaper = Arc::clone(&state.orchestrator);
    let reap_every = Duration::from_secs(args.reap_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(reap_every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match reaper.reap_sessions().await {
                Ok(0) => {}
                Ok(reaped) => info!(reaped, "expired sessions removed"),
                Err(err) => error!(%err, "session reaping failed"),
            }
        }
    });

    let app = routes::router(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.bind, args.port))?;

    info!(%addr, "starting voyaged");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_core_config() {
        let args = Args::try_parse_from(["voyaged"]).expect("defaults parse");
        let config = args.core_config();
        assert_eq!(config.max_context_fields, DEFAULT_MAX_CONTEXT_FIELDS);
        assert_eq!(config.history_window, DEFAULT_HISTORY_WINDOW);
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert!(config.model.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "voyaged",
            "--port",
            "9000",
            "--llm-url",
            "http://narrator:8011",
            "--llm-timeout-ms",
            "1500",
            "--max-fields",
            "8",
            "--model",
            "tiny",
        ])
        .expect("flags parse");
        assert_eq!(args.port, 9000);
        let config = args.core_config();
        assert_eq!(config.generation_endpoint, "http://narrator:8011");
        assert_eq!(config.generation_timeout, Duration::from_millis(1500));
        assert_eq!(config.max_context_fields, 8);
        assert_eq!(config.model.as_deref(), Some("tiny"));
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(Args::try_parse_from(["voyaged", "--port", "eighty"]).is_err());
    }

    #[test]
    fn missing_scenario_file_is_an_error() {
        let args = Args::try_parse_from(["voyaged", "--scenario", "/nonexistent/scenario.json"])
            .expect("flags parse");
        assert!(load_scenario(&args).is_err());
    }
}
