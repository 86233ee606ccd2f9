//! netdiscovery-agent: one-shot network discovery job runner.

use anyhow::{Context, Result};
use clap::Parser;
use netdiscovery_agent::config;
use netdiscovery_agent::discovery::coordinator::{Coordinator, Job};
use netdiscovery_agent::discovery::reporter::HttpReporter;
use netdiscovery_agent::discovery::spool::Spool;
use netdiscovery_agent::model::credential::Credential;
use netdiscovery_agent::model::dictionary::Dictionary;
use netdiscovery_agent::model::range::Range;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "netdiscovery-agent", about = "Network discovery job runner")]
struct Cli {
    /// Path to the job description (ranges, credentials, dictionary) the
    /// server prolog supplied for this run.
    job: PathBuf,

    /// Configuration directory (defaults to NETDISCOVERY_HOME or $HOME).
    #[arg(short, long)]
    config: Option<String>,
}

/// One entry of the server prolog's `PARAM` array.
#[derive(Deserialize)]
struct JobParam {
    #[serde(rename = "THREADS_DISCOVERY", default)]
    threads_discovery: Option<usize>,
}

/// On-disk shape of a `NETDISCOVERY` job description, matching the
/// server's prolog response fields (§6).
#[derive(Deserialize)]
struct JobFile {
    #[serde(rename = "PARAM", default)]
    param: Vec<JobParam>,
    #[serde(rename = "RANGEIP", default)]
    ranges: Vec<Range>,
    #[serde(rename = "AUTHENTICATION", default)]
    credentials: Vec<Credential>,
    #[serde(rename = "DICO", default)]
    dico: Option<Dictionary>,
    #[serde(rename = "DICOHASH", default)]
    dico_hash: Option<String>,
}

fn load_job(path: &Path) -> Result<Job> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read job file {}", path.display()))?;
    let job: JobFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse job file {}", path.display()))?;
    let threads_discovery = job.param.first().and_then(|p| p.threads_discovery);
    Ok(Job {
        ranges: job.ranges,
        credentials: job.credentials,
        server_dictionary: job.dico,
        expected_dictionary_hash: job.dico_hash,
        threads_discovery,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    let config = Arc::new(config::load_config(cli.config.as_deref().map(Path::new))?);
    tracing::info!("netdiscovery-agent {} starting", netdiscovery_agent::VERSION);

    let spool = Spool::open(Path::new(&config.spool_path)).await?;
    spool.ping().await?;

    let reporter = Arc::new(HttpReporter::new(config.server_url.clone()));
    let coordinator = Coordinator::new(config, spool, reporter);

    let job = load_job(&cli.job)?;
    coordinator.run(job).await
}
