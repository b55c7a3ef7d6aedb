//! rusty-transfer: move portal files to the bucket their audit names, or
//! publish the file manifest.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::instrument::WithSubscriber;
use tracing::{error, info};

use rusty_transfer::{ExportOutcome, FileTransfer, SyncOutcome};
use rusty_transfer_portal::{BatchSize, HttpPortalClient, PortalCredentials, QueryFilter};
use rusty_transfer_storage::AwsCredentials;
use rusty_transfer_storage_crt::CrtStorageClient;

mod config;
mod run_log;

use config::RunConfig;
use run_log::RunLog;

/// Reconcile portal file records with bucket contents
#[derive(Parser, Debug)]
#[command(name = "rusty-transfer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Type of operation to run
    #[arg(value_enum, default_value_t = RunType::Sync)]
    run_type: RunType,

    /// Portal access key
    #[arg(long, env = "PORTAL_KEY", hide_env_values = true)]
    portal_key: Option<String>,

    /// Portal secret key
    #[arg(long, env = "PORTAL_SECRET_KEY", hide_env_values = true)]
    portal_secret_key: Option<String>,

    /// AWS access key id
    #[arg(long, env = "ACCESS_KEY", hide_env_values = true)]
    access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    /// Audit search limit: a number or "all" [default: all]
    #[arg(long)]
    batch_size: Option<BatchSize>,

    /// Extra audit search terms as a JSON object, e.g. '{"file_size": "gt:2300"}'
    #[arg(long, value_parser = parse_query_filter)]
    query_filter: Option<QueryFilter>,

    /// Portal base URL
    #[arg(long)]
    server: Option<String>,

    /// JSON config file with transfer, portal and storage sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prefer a copy already in the public bucket as the source
    #[arg(long)]
    initial_transfer: bool,

    /// Directory for the run log
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Log filter directive
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum RunType {
    /// Move audited files and patch the portal
    Sync,
    /// Export and publish the file manifest
    Metadata,
}

fn parse_query_filter(s: &str) -> Result<QueryFilter, String> {
    QueryFilter::from_json_str(s).map_err(|e| e.to_string())
}

/// Whether the run finished or was turned away by the indexer gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunStatus {
    Completed,
    NotReady,
}

/// Credentials resolved from flags or the environment.
struct Credentials {
    portal: PortalCredentials,
    aws: AwsCredentials,
}

impl Cli {
    fn credentials(&self) -> Result<Credentials> {
        let (Some(key), Some(secret)) = (&self.portal_key, &self.portal_secret_key) else {
            bail!("Portal credentials must be provided via environment variables or command line arguments");
        };
        let (Some(access_key), Some(secret_access_key)) =
            (&self.access_key, &self.secret_access_key)
        else {
            bail!("AWS credentials must be provided via environment variables or command line arguments");
        };
        Ok(Credentials {
            portal: PortalCredentials::new(key, secret),
            aws: AwsCredentials::new(access_key, secret_access_key),
        })
    }

    /// Apply flag overrides on top of the loaded config.
    fn apply(&self, mut config: RunConfig) -> RunConfig {
        if let Some(server) = &self.server {
            config.portal = config.portal.with_server(server);
        }
        let batch_size: BatchSize = self
            .batch_size
            .or(config.portal.batch_size)
            .unwrap_or(BatchSize::All);
        config.portal = config.portal.with_batch_size(batch_size);
        if let Some(filter) = &self.query_filter {
            config.portal = config.portal.with_query_filter(filter.clone());
        }
        if self.initial_transfer {
            config.transfer = config.transfer.with_initial_transfer(true);
        }
        config
    }
}

async fn run(run_type: RunType, config: RunConfig, credentials: Credentials) -> Result<RunStatus> {
    info!("Running as {:?} against {}", run_type, config.portal.server);
    let portal = HttpPortalClient::new(config.portal, Some(credentials.portal));
    let storage = CrtStorageClient::new(config.storage.with_credentials(credentials.aws))
        .await
        .context("failed to create storage client")?;
    let transfer = FileTransfer::new(&portal, &storage, config.transfer);

    let status: RunStatus = match run_type {
        RunType::Sync => match transfer.sync().await? {
            SyncOutcome::Completed(summary) => {
                info!("{:?}", summary);
                RunStatus::Completed
            }
            SyncOutcome::NotReady => RunStatus::NotReady,
        },
        RunType::Metadata => match transfer.dump_file_metadata().await? {
            ExportOutcome::Completed { records, location } => {
                info!("Published {} records to {}", records, location);
                RunStatus::Completed
            }
            ExportOutcome::NotReady => RunStatus::NotReady,
        },
    };
    Ok(status)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match try_main(cli) {
        Ok(RunStatus::Completed) => ExitCode::SUCCESS,
        Ok(RunStatus::NotReady) => {
            eprintln!("Portal still indexing, exiting");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> Result<RunStatus> {
    let credentials: Credentials = cli.credentials()?;
    let config: RunConfig = cli.apply(RunConfig::load(cli.config.as_deref())?);
    let log: RunLog = RunLog::open(&cli.log_dir, &cli.log_level)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let dispatch = log.dispatch().clone();
    let status: Result<RunStatus> = runtime.block_on(
        async {
            let result = run(cli.run_type, config, credentials).await;
            if let Err(e) = &result {
                error!("{:#}", e);
            }
            result
        }
        .with_subscriber(dispatch),
    );
    log.close()?;
    status
}
