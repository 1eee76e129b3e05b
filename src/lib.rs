pub mod api;
pub mod client;
pub mod error;
pub mod load_config;
pub mod poll;
pub mod publish;
pub mod report;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use api::LearnApi;
use client::LearnClient;
use error::ApiError;
use load_config::{load_config, Settings};
use poll::BuildPoller;
use publish::PublishOutcome;
use report::{notify_ops, report_run, RunTimer};

/// CLI for learn-cli: publish and preview curriculum content on Learn.
#[derive(Parser)]
#[clap(
    name = "learn",
    version,
    about = "Publish curriculum repositories to the Learn build service"
)]
pub struct Cli {
    /// Path to the YAML settings file (environment variables win over the file)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the block for a repository, trigger a release build and wait for it
    Publish {
        /// Repository name the block is keyed by, e.g. org/algebra-unit
        #[clap(long)]
        repo: String,
    },
    /// Notify Learn of already-uploaded content and wait for the preview build
    Preview {
        /// Storage key of the uploaded content
        #[clap(long)]
        key: String,
        /// The storage key names a directory rather than a single file
        #[clap(long)]
        directory: bool,
    },
    /// Fetch delegated storage credentials for the current token
    Credentials,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_config(cli.config.as_deref())?;
    let client = LearnClient::new(&settings.base_url, &settings.api_token);
    let poller = BuildPoller::default();

    match cli.command {
        Commands::Publish { repo } => {
            let mut timer = RunTimer::start("publish");
            println!("Publishing {repo}...");
            let result = publish::publish(&client, &repo, &poller, &mut timer).await;
            finish_command(&client, &settings, timer, result).await
        }
        Commands::Preview { key, directory } => {
            let timer = RunTimer::start("preview");
            println!("Requesting preview build for {key}...");
            let result = publish::preview(&client, &key, directory, &poller).await;
            finish_command(&client, &settings, timer, result).await
        }
        Commands::Credentials => {
            let creds = client.storage_credentials().await?;
            // Secrets stay out of the terminal; prefix and bucket are
            // what callers need to address their uploads.
            println!("key_prefix: {}", creds.key_prefix);
            println!("bucket:     {}", creds.bucket_name);
            Ok(())
        }
    }
}

/// Renders the terminal outcome, then sends the run benchmark. The
/// benchmark goes out regardless of how the flow ended; a reporter
/// failure never rewrites the primary outcome but still exits non-zero
/// as a secondary failure.
async fn finish_command(
    client: &LearnClient,
    settings: &Settings,
    timer: RunTimer,
    result: Result<PublishOutcome, ApiError>,
) -> Result<()> {
    let bench = timer.finish();
    let cmd_name = bench.cmd_name.clone();

    let primary = match result {
        Ok(outcome) => render_outcome(outcome),
        // main() renders the failure; here it only decides the exit.
        Err(e) => Err(e.into()),
    };

    if let Err(e) = report_run(client, bench).await {
        error!(error = %e, "[CLI] run metadata report failed");
        notify_ops(
            client.http(),
            settings.ops_webhook.as_deref(),
            &format!("learn {cmd_name}: metadata report failed: {e}"),
        )
        .await;
        // Secondary failure only surfaces when the publish itself succeeded.
        return primary.and(Err(e.into()));
    }

    primary
}

fn render_outcome(outcome: PublishOutcome) -> Result<()> {
    if let Some(errors) = outcome.errors.as_deref().filter(|e| !e.is_empty()) {
        eprintln!(
            "Build for release {} finished with status '{}': {errors}",
            outcome.release_id, outcome.status
        );
        anyhow::bail!("build failed on Learn: {errors}");
    }

    if outcome.block_id != 0 {
        println!("Block {} released! (release {})", outcome.block_id, outcome.release_id);
    } else {
        println!("Release {} built! (status '{}')", outcome.release_id, outcome.status);
    }
    if let Some(url) = &outcome.preview_url {
        println!("Preview available at {url}");
    }
    Ok(())
}
