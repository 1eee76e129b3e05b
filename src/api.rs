//! Wire types and the `LearnApi` seam.
//!
//! This module is the *interface* to the Learn build service: plain
//! serde data shapes plus one async trait that every orchestration
//! path depends on. The trait is annotated for `mockall` so the
//! resolve/poll/publish logic can be tested against deterministic
//! mocks; the real client lives in [`crate::client`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::ApiError;

/// A curriculum unit tied to exactly one source repository.
///
/// Learn replies 200 for both "found" and "found nothing"; existence
/// is carried entirely by the id. A default (zero-id) `Block` is the
/// canonical not-found sentinel and never a valid remote state.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Block {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub repo_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sync_errors: Vec<String>,
    #[serde(default)]
    pub cohorts_using: Vec<i64>,
}

impl Block {
    /// Reports whether the block exists remotely, i.e. has a nonzero id.
    pub fn exists(&self) -> bool {
        self.id != 0
    }
}

/// Envelope around block lookups and creations: `{"blocks": [...]}`.
#[derive(Debug, Deserialize)]
pub struct BlockEnvelope {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// Request body for block creation: `{"block": {"repo_name": ...}}`.
#[derive(Debug, Serialize)]
pub struct BlockPayload<'a> {
    pub block: NewBlock<'a>,
}

#[derive(Debug, Serialize)]
pub struct NewBlock<'a> {
    pub repo_name: &'a str,
}

/// Response to release creation: `{"release_id": n}`.
#[derive(Debug, Deserialize)]
pub struct ReleaseCreated {
    #[serde(default)]
    pub release_id: i64,
}

/// Transient status snapshot for one release build, recreated on every
/// poll and never persisted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildStatus {
    #[serde(default)]
    pub release_id: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub errors: Option<String>,
    #[serde(default)]
    pub glearn_credentials: Option<StorageCredentials>,
}

impl BuildStatus {
    /// A build is pending while Learn has not yet settled it. Every
    /// other status value is terminal and returned to the caller
    /// verbatim, success and build-side failure alike.
    pub fn is_pending(&self) -> bool {
        matches!(self.status.as_str(), "pending" | "processing")
    }
}

/// Short-lived delegated storage credentials scoped to one user token.
/// Fetched on demand and held only in memory.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageCredentials {
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub key_prefix: String,
    #[serde(default)]
    pub bucket_name: String,
}

/// Envelope for the credentials endpoint, which reuses the poll shape.
#[derive(Debug, Deserialize)]
pub struct CredentialsEnvelope {
    pub glearn_credentials: StorageCredentials,
}

/// Phase durations (milliseconds) for one command invocation.
/// Constructed once per run and sent once at the end.
#[derive(Debug, Clone, Serialize)]
pub struct RunBenchmark {
    pub cmd_name: String,
    pub master_release_and_build: i64,
    pub total_cmd_time: i64,
}

/// Wrapper shape Learn expects for benchmark submissions.
#[derive(Debug, Serialize)]
pub struct BenchmarkPayload {
    pub cli_benchmark: RunBenchmark,
}

/// Client-side contract for the Learn build service.
///
/// One method per remote operation, all taking `&self`: the
/// implementor holds the base URL, bearer token and connection pool as
/// read-only state, so a single client is shared across the whole
/// invocation. Implemented by [`crate::client::LearnClient`] and by
/// test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait LearnApi: Send + Sync {
    /// Look up the block for a repository name. Returns the zero-id
    /// sentinel when no single match exists.
    async fn find_block(&self, repo_name: &str) -> Result<Block, ApiError>;

    /// Create a block for a repository name.
    async fn create_block(&self, repo_name: &str) -> Result<Block, ApiError>;

    /// Trigger a new release build for a block, returning the release id.
    async fn create_release(&self, block_id: i64) -> Result<i64, ApiError>;

    /// Fetch the current build status of a release. One fetch; the
    /// retry loop lives in [`crate::poll::BuildPoller`].
    async fn release_status(&self, release_id: i64) -> Result<BuildStatus, ApiError>;

    /// Notify Learn of freshly uploaded content. Directories start a
    /// release build, single files a content-file build; both answer
    /// with the poll shape.
    async fn publish_content(
        &self,
        storage_key: &str,
        is_directory: bool,
    ) -> Result<BuildStatus, ApiError>;

    /// Fetch delegated storage credentials for the current user token.
    async fn storage_credentials(&self) -> Result<StorageCredentials, ApiError>;

    /// Best-effort submission of run metadata.
    async fn send_benchmark(&self, bench: RunBenchmark) -> Result<(), ApiError>;
}
