//! alertd CLI entry point

use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::info;
use uuid::Uuid;

use alertd::cli::{Cli, Command, OutputFormat, SilenceCommand};
use alertd::client::ApiClient;
use alertd::config::Config;
use alerttypes::SilenceUpdate;

fn setup_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(server = %config.server.url, "loaded config");

    let client = ApiClient::new(&config.server.url, Duration::from_millis(config.server.timeout_ms))
        .context("Failed to build API client")?;

    match cli.command {
        Command::Config { output } => cmd_config(&client, output).await,
        Command::Silence {
            command:
                SilenceCommand::Update {
                    ids,
                    duration,
                    start,
                    end,
                    comment,
                },
        } => cmd_silence_update(&client, ids, duration, start, end, comment).await,
    }
}

async fn cmd_config(client: &ApiClient, output: OutputFormat) -> Result<()> {
    let status = client.status().await.context("Failed to query remote status")?;

    match output {
        OutputFormat::Simple => {
            println!("{}", status.config_yaml);
        }
        OutputFormat::Extended => {
            println!("{}", status.config_yaml);
            if let Some(uptime) = &status.uptime {
                println!("{} {}", "uptime:".bold(), uptime);
            }
            let mut keys: Vec<_> = status.version_info.keys().collect();
            keys.sort();
            for key in keys {
                println!("{} {}", format!("{key}:").bold(), status.version_info[key]);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

async fn cmd_silence_update(
    client: &ApiClient,
    ids: Vec<Uuid>,
    duration: Option<String>,
    start: Option<String>,
    end: Option<String>,
    comment: Option<String>,
) -> Result<()> {
    let update = build_update(duration, start, end, comment)?;

    let mut updated = Vec::with_capacity(ids.len());
    for id in ids {
        let new_id = client
            .update_silence(id, &update)
            .await
            .context(format!("Failed to update silence {id}"))?;
        updated.push(new_id);
    }

    for id in updated {
        println!("{id}");
    }
    Ok(())
}

fn build_update(
    duration: Option<String>,
    start: Option<String>,
    end: Option<String>,
    comment: Option<String>,
) -> Result<SilenceUpdate> {
    let duration = duration
        .map(|raw| {
            humantime::parse_duration(&raw)
                .context(format!("Invalid duration: {raw}"))
                .and_then(|d| chrono::Duration::from_std(d).context("Duration out of range"))
        })
        .transpose()?;

    let start = start.map(|raw| parse_rfc3339(&raw)).transpose()?;
    let end = end.map(|raw| parse_rfc3339(&raw)).transpose()?;

    Ok(SilenceUpdate {
        start,
        end,
        duration,
        comment,
    })
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw).context(format!("Invalid RFC3339 timestamp: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}
