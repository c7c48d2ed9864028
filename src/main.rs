//! PromptGuard - Sensitive data detection, redaction and safe rewriting
//!
//! Command-line front end: scan, redact or rewrite a prompt, list the rule
//! table, or serve the Guard HTTP API for host integrations.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use promptguard::{api::build_app, config::PromptGuardConfig, privacy::Category, PromptGuard};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "promptguard")]
#[command(author = "A3S Lab Team")]
#[command(version)]
#[command(about = "Sensitive data detection, redaction and safe rewriting for AI prompts")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PROMPTGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect sensitive data and print the analysis report
    Scan {
        /// Text to scan (read from stdin when omitted)
        text: Option<String>,

        /// Platform label passed through to the report
        #[arg(long, default_value = "cli")]
        platform: String,
    },

    /// Redact sensitive data and print the result with its audit trail
    Redact {
        /// Text to redact (read from stdin when omitted)
        text: Option<String>,
    },

    /// Redact, then attempt a remote rewrite with local fallback
    Rewrite {
        /// Text to rewrite (read from stdin when omitted)
        text: Option<String>,
    },

    /// List the detection rules
    Rules {
        /// Only show rules in this category
        #[arg(long)]
        category: Option<Category>,
    },

    /// Serve the Guard HTTP API
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays machine-readable
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("promptguard={},tower_http=info", log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    let config = match &cli.config {
        Some(path) => PromptGuardConfig::load(path)?,
        None => PromptGuardConfig::default(),
    };

    match cli.command {
        Commands::Scan { text, platform } => {
            let guard = PromptGuard::from_config(&config)?;
            let text = read_input(text).await?;
            print_json(&guard.analyze(Some(&text), &platform))?;
        }
        Commands::Redact { text } => {
            let guard = PromptGuard::from_config(&config)?;
            let text = read_input(text).await?;
            print_json(&guard.redact(&text))?;
        }
        Commands::Rewrite { text } => {
            let guard = PromptGuard::from_config(&config)?;
            let text = read_input(text).await?;
            print_json(&guard.rewrite(&text).await)?;
        }
        Commands::Rules { category } => {
            let guard = PromptGuard::from_config(&config)?;
            list_rules(&guard, category);
        }
        Commands::Serve { host, port } => {
            run_server(config, host, port).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn read_input(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read text from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn list_rules(guard: &PromptGuard, category: Option<Category>) {
    println!(
        "{:<24} {:<10} {:<9} {:<28} {}",
        "ID", "CATEGORY", "RISK", "TOKEN", "CONTEXT"
    );
    for rule in guard
        .registry()
        .all_rules()
        .iter()
        .filter(|r| category.map_or(true, |c| r.category() == c))
    {
        println!(
            "{:<24} {:<10} {:<9} {:<28} {}",
            rule.id(),
            rule.category().to_string(),
            rule.risk_level().to_string(),
            rule.replacement_token(),
            rule.context_keywords().join(",")
        );
    }
}

async fn run_server(config: PromptGuardConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let guard = Arc::new(PromptGuard::from_config(&config)?);
    let app = build_app(guard, &config.server.cors_origins);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(%addr, "PromptGuard API listening. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}

fn show_config(config: Option<&PromptGuardConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    println!("{}", config.to_toml()?);
    Ok(())
}
