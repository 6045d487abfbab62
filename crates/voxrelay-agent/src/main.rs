//! `voxrelay`
//!
//! Line-oriented driver for the relay: each stdin line is a question handed
//! to the relay manager, and narrations are printed to stdout as they would
//! be spoken.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use voxrelay_agent::{ChannelSink, RelayManager};
use voxrelay_core::RelayConfig;
use voxrelay_core::config::load_config;

#[derive(Parser, Debug)]
#[command(name = "voxrelay")]
#[command(version, about = "Deep-reasoning relay with spoken progress narration")]
struct Args {
    /// Config file (defaults to `$XDG_CONFIG_HOME/voxrelay/config.toml`)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Upstream gateway base URL
    #[arg(long)]
    gateway_url: Option<String>,

    /// Bearer token for the gateway
    #[arg(long)]
    token: Option<String>,

    /// Upstream model identifier
    #[arg(long)]
    model: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Seconds between filler phrases while streaming (0 disables)
    #[arg(long)]
    heartbeat_secs: Option<u64>,

    /// Never condense long answers
    #[arg(long)]
    no_summarize: bool,

    /// Session identifier used in logs
    #[arg(long, default_value = "voice")]
    session_id: String,

    /// Ask one question, wait for its outcome, and exit
    #[arg(long)]
    ask: Option<String>,

    /// Log level filter (e.g. "info", "debug")
    #[arg(long, default_value = "info", env = "VOXRELAY_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "VOXRELAY_LOG_JSON")]
    log_json: bool,
}

impl Args {
    /// Flags win over file and environment settings.
    fn apply_overrides(&self, config: &mut RelayConfig) {
        if let Some(url) = &self.gateway_url {
            config.gateway.base_url.clone_from(url);
        }
        if let Some(token) = &self.token {
            config.gateway.token.clone_from(token);
        }
        if let Some(model) = &self.model {
            config.gateway.model.clone_from(model);
        }
        if let Some(secs) = self.timeout_secs {
            config.gateway.timeout_secs = secs;
        }
        if let Some(secs) = self.heartbeat_secs {
            config.narration.heartbeat_interval_secs = secs;
        }
        if self.no_summarize {
            config.summarizer.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = &args.log_level;
    let log_filter = format!("voxrelay={level},voxrelay_agent={level},voxrelay_core={level}");
    voxrelay_core::tracing_init::init_tracing(&log_filter, args.log_json)?;

    let mut config = load_config(args.config.as_deref()).context("Failed to load config")?;
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        gateway = %config.gateway.base_url,
        model = %config.gateway.model,
        timeout_secs = config.gateway.timeout_secs,
        summarizer = config.summarizer.is_active(),
        "Starting voxrelay"
    );

    let (sink, rx) = ChannelSink::channel(32);
    let printer = tokio::spawn(print_narrations(rx));
    let manager = RelayManager::new(args.session_id.clone(), &config, sink)
        .context("Failed to build relay manager")?;

    if let Some(question) = &args.ask {
        say(manager.submit(question).message());
    } else {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            say(manager.submit(question).message());
        }
        info!("Input closed, waiting for the relay to finish");
    }

    manager.wait_idle().await;
    info!(outcome = ?manager.last_outcome(), "Relay idle, shutting down");

    // Dropping the manager closes the narration channel and ends the printer.
    drop(manager);
    if let Err(e) = printer.await {
        warn!(error = %e, "Narration printer failed");
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn say(text: &str) {
    println!("> {text}");
}

async fn print_narrations(mut rx: mpsc::Receiver<String>) {
    while let Some(text) = rx.recv().await {
        say(&text);
    }
}
