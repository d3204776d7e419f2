//! valor — command-line client for redemption-code identity verification.

mod config;
mod logging;

use anyhow::bail;
use clap::Parser;
use config::AppConfig;
use logging::LogFormat;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use valor_gateway::HttpGateway;
use valor_sheerid::{DeviceFingerprint, FingerprintProvider, SheerIdClient};
use valor_store::FileStore;
use valor_verification::{SessionState, VerificationEngine};

#[derive(Parser)]
#[command(name = "valor", about = "Redemption-code identity verification client")]
struct Cli {
    /// Base URL of the record gateway backend.
    #[arg(long, env = "VALOR_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VALOR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VALOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run one verification session end to end.
    Verify {
        /// Redemption code to verify against.
        #[arg(long)]
        code: String,

        /// Verification URL containing the session id.
        #[arg(long)]
        url: String,

        /// Email address the confirmation token is sent to.
        #[arg(long)]
        email: String,

        /// Email confirmation token, if already known. When omitted and the
        /// service pauses for the email loop, the token is read from stdin.
        #[arg(long)]
        token: Option<String>,
    },

    /// Print the device fingerprint, creating and caching it if needed.
    Fingerprint,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match AppConfig::from_toml_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("failed to load config file {}: {e}, using defaults", path.display());
                AppConfig::default()
            }
        },
        None => AppConfig::default(),
    };
    if let Some(url) = cli.gateway_url {
        config.gateway_url = url;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    logging::init_logging(LogFormat::from_config(&config.log_format), &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    let store = Arc::new(FileStore::open(&config.state_path)?);
    let fingerprints = DeviceFingerprint::with_udid_url(store, &config.udid_url);

    match cli.command {
        Command::Fingerprint => {
            println!("{}", fingerprints.fingerprint().await);
            Ok(())
        }
        Command::Verify {
            code,
            url,
            email,
            token,
        } => {
            let engine = VerificationEngine::new(
                HttpGateway::new(&config.gateway_url),
                SheerIdClient::with_base_url(&config.service_url),
                fingerprints,
            );
            run_verify(&engine, &code, &url, &email, token).await
        }
    }
}

async fn run_verify<G, A, F>(
    engine: &VerificationEngine<G, A, F>,
    code: &str,
    url: &str,
    email: &str,
    token: Option<String>,
) -> anyhow::Result<()>
where
    G: valor_gateway::RecordGateway,
    A: valor_sheerid::VerificationApi,
    F: FingerprintProvider,
{
    let mut report = engine.begin(code, url, email).await;
    println!("{}", report.message);

    // The email-loop pause hands the session back; feed it the token from
    // the flag or from the terminal, retrying while the service stays
    // unreachable.
    let mut token = token;
    while report.state == SessionState::AwaitingEmailToken {
        let Some(session) = report.session.take() else {
            break;
        };
        let input = match token.take() {
            Some(t) => t,
            None => prompt("email token (or pasted link): ")?,
        };
        if input.is_empty() {
            bail!("verification paused: no email token supplied");
        }
        report = engine.resume(session, &input).await;
        println!("{}", report.message);
    }

    if !report.success {
        bail!("verification failed");
    }
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
