//! Operator CLI for the hosted fhirlite deployment.
//!
//! Talks to the Render REST API with the `RENDER_API_KEY` bearer token:
//! list services, trigger and watch redeploys, tail logs, and inspect or set
//! environment variables. Secret-bearing variable values are never printed.

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod client;
mod error;

use client::{DeployClient, DeployStatus};
use error::CliError;

/// Seconds between deploy status polls.
const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Polls before a watch gives up (10 minutes).
const MAX_POLLS: u32 = 120;

/// Env var values never shown in clear text.
const SENSITIVE_KEYS: &[&str] = &["API_KEY", "DATABASE_URL", "RENDER_API_KEY"];

#[derive(Parser)]
#[command(name = "fhirlite")]
#[command(about = "fhirlite deployment operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the account's services
    Services,
    /// Show the most recent deploy status of a service
    Status {
        /// Service name (exact or unambiguous substring)
        service: String,
    },
    /// Trigger a new deploy
    Redeploy {
        /// Service name (exact or unambiguous substring)
        service: String,
        /// Poll until the deploy reaches a terminal state
        #[arg(long)]
        watch: bool,
        /// Rebuild without the build cache
        #[arg(long)]
        clear_cache: bool,
    },
    /// Tail recent service logs
    Logs {
        /// Service name (exact or unambiguous substring)
        service: String,
        /// Number of log lines to fetch
        #[arg(long, default_value_t = 100)]
        lines: u32,
    },
    /// Inspect or set environment variables
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
}

#[derive(Subcommand)]
enum EnvCommands {
    /// List a service's environment variables (secrets redacted)
    List { service: String },
    /// Set one environment variable
    Set {
        service: String,
        key: String,
        value: String,
    },
}

fn display_value(key: &str, value: &str) -> String {
    if SENSITIVE_KEYS.contains(&key) {
        "<redacted>".into()
    } else {
        value.into()
    }
}

/// Poll a deploy every [`POLL_INTERVAL`] until it is terminal. On failure the
/// last log lines are printed before the error is returned.
async fn watch_deploy(
    client: &DeployClient,
    service_id: &str,
    deploy_id: &str,
) -> Result<DeployStatus, CliError> {
    for _ in 0..MAX_POLLS {
        let deploy = client.deploy(service_id, deploy_id).await?;
        println!("deploy {}: {:?}", deploy.id, deploy.status);

        if deploy.status.is_success() {
            return Ok(deploy.status);
        }
        if deploy.status.is_failure() {
            eprintln!("deploy failed, recent logs:");
            for line in client.service_logs(service_id, 50).await? {
                eprintln!("  {}", line.message);
            }
            return Err(CliError::DeployFailed(deploy.status));
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
    Err(CliError::Timeout(MAX_POLLS))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let token = std::env::var("RENDER_API_KEY").context("RENDER_API_KEY not set in environment")?;
    let client = DeployClient::new(token);

    match cli.command {
        Commands::Services => {
            let services = client.list_services().await?;
            if services.is_empty() {
                println!("No services found.");
            }
            for service in services {
                let url = service
                    .service_details
                    .and_then(|d| d.url)
                    .unwrap_or_else(|| "-".into());
                println!("{}  {}  {}", service.id, service.name, url);
            }
        }
        Commands::Status { service } => {
            let service = client.find_service(&service).await?;
            match client.recent_deploys(&service.id, 1).await?.first() {
                Some(deploy) => {
                    println!("{}: deploy {} is {:?}", service.name, deploy.id, deploy.status)
                }
                None => println!("{}: no deploys yet", service.name),
            }
            if let Some(url) = service.service_details.and_then(|d| d.url) {
                println!("url: {url}");
            }
        }
        Commands::Redeploy {
            service,
            watch,
            clear_cache,
        } => {
            let service = client.find_service(&service).await?;
            let deploy = client.trigger_deploy(&service.id, clear_cache).await?;
            println!("triggered deploy {} for {}", deploy.id, service.name);

            if watch {
                let status = watch_deploy(&client, &service.id, &deploy.id).await?;
                println!("deploy finished: {status:?}");
                if let Some(url) = service.service_details.and_then(|d| d.url) {
                    println!("service is live at {url}");
                }
            }
        }
        Commands::Logs { service, lines } => {
            let service = client.find_service(&service).await?;
            for line in client.service_logs(&service.id, lines).await? {
                match line.timestamp {
                    Some(ts) => println!("{ts}  {}", line.message),
                    None => println!("{}", line.message),
                }
            }
        }
        Commands::Env { command } => match command {
            EnvCommands::List { service } => {
                let service = client.find_service(&service).await?;
                for var in client.env_vars(&service.id).await? {
                    println!("{}={}", var.key, display_value(&var.key, &var.value));
                }
            }
            EnvCommands::Set {
                service,
                key,
                value,
            } => {
                let service = client.find_service(&service).await?;
                let var = client.set_env_var(&service.id, &key, &value).await?;
                println!(
                    "{}: set {}={}",
                    service.name,
                    var.key,
                    display_value(&var.key, &var.value)
                );
            }
        },
    }

    Ok(())
}
