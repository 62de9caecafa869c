#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod serve;

use cbstatus_core::config::DEFAULT_STATUS_CONTEXT;
use cbstatus_core::http::auth::DEFAULT_METADATA_HOST;
use cbstatus_core::http::client::DEFAULT_GITHUB_API_URL;
use cbstatus_core::http::sourcerepo::DEFAULT_SOURCEREPO_API_URL;
use cbstatus_core::{decode_event, Config};
use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cbstatus",
    version,
    about = "Report Cloud Build results as GitHub commit statuses"
)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "CBSTATUS_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Report a single build event and exit
    Report(ReportArgs),
    /// Serve a Pub/Sub push endpoint
    Serve(ServeArgs),
}

#[derive(clap::Args)]
struct ConnArgs {
    /// GitHub token for API access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
    github_api_url: String,

    /// Source Repositories API base URL
    #[arg(long, env = "SOURCEREPO_API_URL", default_value = DEFAULT_SOURCEREPO_API_URL)]
    sourcerepo_api_url: String,

    /// Commit status context label
    #[arg(long, env = "CBSTATUS_CONTEXT", default_value = DEFAULT_STATUS_CONTEXT)]
    context: String,

    /// Google access token (default: mint from the metadata server)
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    google_access_token: Option<String>,

    /// Metadata server host
    #[arg(long, env = "GCE_METADATA_HOST", default_value = DEFAULT_METADATA_HOST)]
    metadata_host: String,
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Event payload (base64, Pub/Sub message or envelope, or build JSON)
    #[arg(long, conflicts_with = "file")]
    payload: Option<String>,

    /// Read the event from a file (default: stdin)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Decode and print what would be reported, without calling any API
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    conn: ConnArgs,
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Listen address
    #[arg(long, env = "CBSTATUS_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    #[command(flatten)]
    conn: ConnArgs,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let code = match cli.command {
        Commands::Report(args) => run_report(args),
        Commands::Serve(args) => run_serve(args),
    };
    std::process::exit(code);
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

impl ConnArgs {
    /// Resolve flags through `Config::from_lookup`; empty values count as unset
    fn into_config(self) -> anyhow::Result<Config> {
        let lookup = |key: &str| -> Option<String> {
            let value = match key {
                "GITHUB_TOKEN" => self.github_token.as_deref(),
                "GITHUB_API_URL" => Some(self.github_api_url.as_str()),
                "SOURCEREPO_API_URL" => Some(self.sourcerepo_api_url.as_str()),
                "CBSTATUS_CONTEXT" => Some(self.context.as_str()),
                "GOOGLE_OAUTH_ACCESS_TOKEN" => self.google_access_token.as_deref(),
                "GCE_METADATA_HOST" => Some(self.metadata_host.as_str()),
                _ => None,
            };
            value.map(str::to_string)
        };

        Config::from_lookup(lookup)
            .map_err(|e| anyhow::anyhow!("{} (use --github-token)", e.message()))
    }
}

fn read_event(args: &ReportArgs) -> anyhow::Result<Vec<u8>> {
    if let Some(payload) = &args.payload {
        return Ok(payload.clone().into_bytes());
    }
    if let Some(path) = &args.file {
        return std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e));
    }
    let mut buf = Vec::new();
    std::io::stdin().lock().read_to_end(&mut buf)?;
    Ok(buf)
}

fn run_report(args: ReportArgs) -> i32 {
    match report(args) {
        Ok(line) => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            let _ = writeln!(lock, "{}", line);
            0
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            1
        }
    }
}

fn report(args: ReportArgs) -> anyhow::Result<serde_json::Value> {
    let event = read_event(&args)?;

    if args.dry_run {
        return dry_run(&event, &args.conn.context);
    }

    let config = args.conn.into_config()?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = rt.block_on(cbstatus_core::report_build_status(&config, &event))?;
    Ok(serde_json::to_value(outcome)?)
}

/// Describe what would be posted for `event`
fn dry_run(event: &[u8], context: &str) -> anyhow::Result<serde_json::Value> {
    let notification = decode_event(event)?;
    let source = notification.repo_source();
    let commit_ref = source.and_then(|s| s.commit_ref());

    Ok(serde_json::json!({
        "notification": notification,
        "reference": commit_ref.map(|r| serde_json::json!({"kind": r.kind(), "value": r.as_str()})),
        "state": notification.status.commit_state(),
        "context": context,
        "would_report": source.is_some(),
    }))
}

fn run_serve(args: ServeArgs) -> i32 {
    let addr = format!("{}:{}", args.host, args.port);
    let result = args.conn.into_config().and_then(|config| {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        rt.block_on(serve::run(config, &addr))
    });

    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{:#}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    fn conn_args(args: &[&str]) -> ConnArgs {
        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            conn: ConnArgs,
        }
        let argv = std::iter::once("cbstatus").chain(args.iter().copied());
        Wrapper::parse_from(argv).conn
    }

    #[test]
    fn test_flags_resolve_through_config() {
        let config = conn_args(&[
            "--github-token",
            "ghp_flag",
            "--github-api-url",
            "https://ghe.example.com/api/v3",
            "--context",
            "ci/cloudbuild/staging",
            "--google-access-token",
            "ya29.flag",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.github_token, "ghp_flag");
        assert_eq!(config.github_api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.status_context, "ci/cloudbuild/staging");
        assert_eq!(config.google_access_token.as_deref(), Some("ya29.flag"));
        assert_eq!(config.sourcerepo_api_url, DEFAULT_SOURCEREPO_API_URL);
        assert_eq!(config.metadata_host, DEFAULT_METADATA_HOST);
    }

    #[test]
    fn test_empty_flags_count_as_unset() {
        let config = conn_args(&[
            "--github-token",
            "ghp_flag",
            "--context",
            "",
            "--google-access-token",
            "",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.status_context, DEFAULT_STATUS_CONTEXT);
        assert!(config.google_access_token.is_none());

        let err = conn_args(&["--github-token", " "]).into_config().unwrap_err();
        assert!(err.to_string().contains("GITHUB_TOKEN not set"), "{}", err);
    }

    #[test]
    fn test_dry_run_describes_status() {
        let event = br#"{
            "status": "TIMEOUT",
            "statusDetail": "took too long",
            "source": {"projectId": "p", "repoName": "r", "tagName": "v1"}
        }"#;
        let out = dry_run(event, "ci/cloudbuild").unwrap();
        assert_eq!(out["state"], "failure");
        assert_eq!(out["reference"]["kind"], "tag");
        assert_eq!(out["reference"]["value"], "v1");
        assert_eq!(out["would_report"], true);
        assert_eq!(out["notification"]["statusDetail"], "took too long");
    }

    #[test]
    fn test_dry_run_without_source() {
        let out = dry_run(br#"{"status": "QUEUED"}"#, "ci/cloudbuild").unwrap();
        assert_eq!(out["would_report"], false);
        assert!(out["reference"].is_null());
        assert_eq!(out["state"], "pending");
    }
}
