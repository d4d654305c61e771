//! Frontleaf Forwarder — reads newline-delimited analytics messages and
//! forwards each one to the Frontleaf data collection API.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use frontleaf_core::config::AppConfig;
use frontleaf_core::types::Message;
use frontleaf_integrations::Forwarder;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "frontleaf-forwarder")]
#[command(about = "Forward identify, group and track messages to Frontleaf")]
#[command(version)]
struct Cli {
    /// Optional TOML config file (environment variables take precedence)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frontleaf API token (overrides config)
    #[arg(long, env = "FRONTLEAF__SETTINGS__TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Frontleaf stream name (overrides config)
    #[arg(long, env = "FRONTLEAF__SETTINGS__STREAM")]
    stream: Option<String>,

    /// Ingestion API base URL (overrides config)
    #[arg(long, env = "FRONTLEAF__ENDPOINT__BASE_URL")]
    endpoint: Option<String>,

    /// Input file with one JSON message per line; reads stdin when omitted
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Print mapped payloads instead of sending them
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RunSummary {
    processed: u64,
    failed: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so dry-run payloads on stdout stay machine readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "frontleaf_forwarder=info,frontleaf_integrations=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    let forwarder = Forwarder::from_config(&config).context("invalid Frontleaf settings")?;

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &cli.input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };

    let summary = run(&forwarder, reader, cli.dry_run).await?;
    info!(
        processed = summary.processed,
        failed = summary.failed,
        dry_run = cli.dry_run,
        "Frontleaf forwarder finished"
    );

    if summary.failed > 0 {
        anyhow::bail!("{} of {} messages failed", summary.failed, summary.processed);
    }
    Ok(())
}

/// An explicit config file must load; environment-only loading falls back
/// to defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(Some(path))
            .with_context(|| format!("failed to load config file {}", path.display())),
        None => Ok(AppConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        })),
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(token) = &cli.token {
        config.settings.token = token.clone();
    }
    if let Some(stream) = &cli.stream {
        config.settings.stream = stream.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint.base_url = endpoint.clone();
    }
}

/// Handle every non-blank line independently; one bad line does not stop
/// the rest.
async fn run(
    forwarder: &Forwarder,
    reader: Box<dyn AsyncRead + Unpin + Send>,
    dry_run: bool,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();
    let mut lines = BufReader::new(reader).lines();
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        summary.processed += 1;

        if let Err(e) = handle_line(forwarder, &line, dry_run).await {
            summary.failed += 1;
            error!(line = line_no, error = %e, "Message not forwarded");
        }
    }

    Ok(summary)
}

async fn handle_line(forwarder: &Forwarder, line: &str, dry_run: bool) -> anyhow::Result<()> {
    let message: Message = serde_json::from_str(line).context("malformed message")?;

    if dry_run {
        let payload = forwarder.prepare(&message)?;
        println!(
            "{}",
            serde_json::json!({
                "path": payload.endpoint_path(),
                "payload": payload.to_json()?,
            })
        );
        return Ok(());
    }

    forwarder.forward(&message).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use frontleaf_core::types::Settings;

    fn test_forwarder() -> Forwarder {
        let config = AppConfig {
            settings: Settings::new("tok", "test"),
            ..AppConfig::default()
        };
        Forwarder::from_config(&config).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "frontleaf-forwarder",
            "--token",
            "cli-token",
            "--stream",
            "cli-stream",
            "--endpoint",
            "http://localhost:8080/api/track",
            "--dry-run",
        ]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.settings.token, "cli-token");
        assert_eq!(config.settings.stream, "cli-stream");
        assert_eq!(config.endpoint.base_url, "http://localhost:8080/api/track");
        assert!(cli.dry_run);
    }

    #[test]
    fn test_explicit_config_file_errors_are_fatal() {
        let missing = std::env::temp_dir().join(format!(
            "frontleaf-missing-{}.toml",
            std::process::id()
        ));
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(err.to_string().starts_with("failed to load config file"));

        let path = std::env::temp_dir().join(format!(
            "frontleaf-bad-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[retry]\nmax_retries = \"many\"\n").unwrap();
        let result = load_config(Some(&path));
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());

        assert!(load_config(None).is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_counts_failures_per_line() {
        let input = concat!(
            "{\"type\":\"identify\",\"userId\":\"u1\",\"traits\":{\"name\":\"Ann\"}}\n",
            "\n",
            "not json\n",
            "{\"type\":\"track\",\"event\":\"Clicked\"}\n",
            "{\"type\":\"track\",\"userId\":\"u1\",\"event\":\"Clicked\"}\n",
        );
        let reader: Box<dyn AsyncRead + Unpin + Send> = Box::new(input.as_bytes());

        let summary = run(&test_forwarder(), reader, true).await.unwrap();
        assert_eq!(
            summary,
            RunSummary {
                processed: 4,
                failed: 2
            }
        );
    }
}
