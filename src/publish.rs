//! Orchestration of the publish and preview workflows.
//!
//! Two paths converge on the poller: `publish` resolves a block and
//! triggers a release for it, `preview` notifies Learn of content that
//! was already uploaded. Every failure propagates to the caller as an
//! [`ApiError`] kind; only the CLI layer decides exit codes and
//! user-facing text.

use tracing::{error, info};

use crate::api::{Block, BuildStatus, LearnApi};
use crate::error::ApiError;
use crate::poll::BuildPoller;
use crate::report::RunTimer;

/// Terminal outcome of a publish or preview invocation.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub block_id: i64,
    pub release_id: i64,
    /// Final status as Learn reported it, uninterpreted.
    pub status: String,
    pub preview_url: Option<String>,
    pub errors: Option<String>,
}

impl PublishOutcome {
    fn from_status(block_id: i64, status: BuildStatus) -> Self {
        PublishOutcome {
            block_id,
            release_id: status.release_id,
            status: status.status,
            preview_url: status.preview_url,
            errors: status.errors,
        }
    }
}

/// Map a repository name to its remote block, creating one if absent.
///
/// Find-then-create, no retry: at most one create per invocation, and
/// the exists decision rests on the zero-id sentinel, not on HTTP
/// status (Learn answers 200 for "found nothing" too). Transport and
/// decode failures pass through unchanged.
pub async fn resolve_block<A: LearnApi + ?Sized>(
    api: &A,
    repo_name: &str,
) -> Result<Block, ApiError> {
    let block = api.find_block(repo_name).await?;
    if block.exists() {
        info!(repo_name, block_id = block.id, "[PUBLISH] found existing block");
        return Ok(block);
    }

    info!(repo_name, "[PUBLISH] no block for repository, creating one");
    let created = api.create_block(repo_name).await?;
    info!(repo_name, block_id = created.id, "[PUBLISH] block created");
    Ok(created)
}

/// Full publish flow: resolve the block, trigger a release build, and
/// wait for the build to settle. The timer brackets the
/// release-and-build phase for the run benchmark.
pub async fn publish<A: LearnApi + ?Sized>(
    api: &A,
    repo_name: &str,
    poller: &BuildPoller,
    timer: &mut RunTimer,
) -> Result<PublishOutcome, ApiError> {
    let block = resolve_block(api, repo_name).await?;

    timer.enter_release_and_build();
    let release_id = api.create_release(block.id).await?;
    info!(block_id = block.id, release_id, "[PUBLISH] release created, polling build");

    let status = poller.wait_for_build(api, release_id).await?;
    timer.leave_release_and_build();
    // Poller hands terminal statuses back verbatim; a build-side
    // failure still lands here with its errors field populated.
    if let Some(errors) = &status.errors {
        if !errors.is_empty() {
            error!(release_id, errors = %errors, "[PUBLISH] build settled with errors");
        }
    }

    Ok(PublishOutcome::from_status(block.id, status))
}

/// Preview flow: notify Learn of freshly uploaded content and wait for
/// the preview build keyed by the release id Learn hands back.
pub async fn preview<A: LearnApi + ?Sized>(
    api: &A,
    storage_key: &str,
    is_directory: bool,
    poller: &BuildPoller,
) -> Result<PublishOutcome, ApiError> {
    let accepted = api.publish_content(storage_key, is_directory).await?;
    info!(
        storage_key,
        is_directory,
        release_id = accepted.release_id,
        "[PUBLISH] content accepted, polling preview build"
    );

    let status = poller.wait_for_build(api, accepted.release_id).await?;
    Ok(PublishOutcome::from_status(0, status))
}
