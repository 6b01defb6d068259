//! tutor - terminal client for the AI tutor backend
//!
//! Chat with the tutor, take its quizzes, save cheatsheets and browse the
//! resources it suggests, all from the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutor_client::config::{ClientConfig, Config};
use tutor_client::repl::Repl;
use tutor_client::{App, HttpGateway};

/// Terminal client for the AI tutor
#[derive(Parser)]
#[command(name = "tutor", about, version)]
struct Cli {
    /// Backend base URL (overrides TUTOR_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Backend user to chat as (overrides TUTOR_USER_ID)
    #[arg(short, long)]
    user: Option<i64>,

    /// TOML configuration file
    #[arg(short, long, env = "TUTOR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutor_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let file = cli
        .config
        .as_deref()
        .map(ClientConfig::from_file)
        .transpose()
        .with_context(|| format!("Failed to load config {:?}", cli.config))?;

    let mut config = Config::from_env(file)?;
    if let Some(url) = cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(user) = cli.user {
        config.user_id = user;
    }

    tracing::info!("🎓 Tutor client for {} (user {})", config.api_url, config.user_id);

    let gateway = Arc::new(HttpGateway::new(config.api_url.clone()));
    let app = App::new(gateway, config);

    let mut repl = Repl::new(app, BufReader::new(tokio::io::stdin()), std::io::stdout());
    repl.run().await?;

    Ok(())
}
