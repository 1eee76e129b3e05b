//! Authenticated reqwest client for the Learn build service.
//!
//! One `LearnClient` is constructed per invocation and shared,
//! read-only, by every operation: base URL, bearer token and the
//! reqwest connection pool are never mutated after construction.
//! Transport policy is uniform across endpoints: decode on success,
//! classify on failure, never swallow a non-2xx response.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response};
use tracing::debug;

use crate::api::{
    BenchmarkPayload, Block, BlockEnvelope, BlockPayload, BuildStatus, CredentialsEnvelope,
    LearnApi, NewBlock, ReleaseCreated, RunBenchmark, StorageCredentials,
};
use crate::error::ApiError;

/// Endpoint for notifying Learn of uploaded content. Directories build
/// a full release, single files a content-file preview.
fn content_endpoint(is_directory: bool) -> &'static str {
    if is_directory {
        "/api/v1/releases"
    } else {
        "/api/v1/content_files"
    }
}

pub struct LearnClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl LearnClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        LearnClient {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// The shared connection pool, for callers that post outside the
    /// Learn API (e.g. the ops webhook).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Turn a non-2xx response into a `RemoteRejection`, opportunistically
    /// decoding the poll-shaped `errors` field for the server's message.
    async fn reject(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let message = response
            .json::<BuildStatus>()
            .await
            .ok()
            .and_then(|body| body.errors)
            .filter(|msg| !msg.is_empty());
        ApiError::rejection(status, message)
    }

    async fn execute(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(ApiError::wire)?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl LearnApi for LearnClient {
    async fn find_block(&self, repo_name: &str) -> Result<Block, ApiError> {
        debug!(repo_name, "[API] looking up block");
        let response = Self::execute(
            self.request(Method::GET, "/api/v1/blocks")
                .query(&[("repo_name", repo_name)]),
        )
        .await?;

        let mut envelope: BlockEnvelope = response.json().await.map_err(ApiError::wire)?;
        // Learn answers 200 with an empty list when nothing matches;
        // the zero-id sentinel carries "not found" to the caller.
        if envelope.blocks.len() == 1 {
            Ok(envelope.blocks.remove(0))
        } else {
            Ok(Block::default())
        }
    }

    async fn create_block(&self, repo_name: &str) -> Result<Block, ApiError> {
        debug!(repo_name, "[API] creating block");
        let payload = BlockPayload {
            block: NewBlock { repo_name },
        };
        let response =
            Self::execute(self.request(Method::POST, "/api/v1/blocks").json(&payload)).await?;

        let mut envelope: BlockEnvelope = response.json().await.map_err(ApiError::wire)?;
        if envelope.blocks.len() == 1 {
            Ok(envelope.blocks.remove(0))
        } else {
            Err(ApiError::Decode(
                "block creation response held no block".to_string(),
            ))
        }
    }

    async fn create_release(&self, block_id: i64) -> Result<i64, ApiError> {
        debug!(block_id, "[API] creating release");
        let response = Self::execute(
            self.request(Method::POST, &format!("/api/v1/blocks/{block_id}/releases")),
        )
        .await?;

        let created: ReleaseCreated = response.json().await.map_err(ApiError::wire)?;
        if created.release_id == 0 {
            return Err(ApiError::Decode(
                "release creation response held no release id".to_string(),
            ));
        }
        Ok(created.release_id)
    }

    async fn release_status(&self, release_id: i64) -> Result<BuildStatus, ApiError> {
        let response = Self::execute(self.request(
            Method::GET,
            &format!("/api/v1/releases/{release_id}/release_polling"),
        ))
        .await?;

        response.json().await.map_err(ApiError::wire)
    }

    async fn publish_content(
        &self,
        storage_key: &str,
        is_directory: bool,
    ) -> Result<BuildStatus, ApiError> {
        debug!(storage_key, is_directory, "[API] notifying uploaded content");
        let payload = serde_json::json!({ "s3_key": storage_key });
        let response = Self::execute(
            self.request(Method::POST, content_endpoint(is_directory))
                .json(&payload),
        )
        .await?;

        response.json().await.map_err(ApiError::wire)
    }

    async fn storage_credentials(&self) -> Result<StorageCredentials, ApiError> {
        let response =
            Self::execute(self.request(Method::GET, "/api/v1/users/glearn_credentials")).await?;

        let envelope: CredentialsEnvelope = response.json().await.map_err(ApiError::wire)?;
        Ok(envelope.glearn_credentials)
    }

    async fn send_benchmark(&self, bench: RunBenchmark) -> Result<(), ApiError> {
        debug!(cmd_name = %bench.cmd_name, "[API] sending run benchmark");
        let payload = BenchmarkPayload {
            cli_benchmark: bench,
        };
        // Reporter failures are a distinct kind: they never alter the
        // publish outcome that already happened.
        Self::execute(
            self.request(Method::POST, "/api/v1/cli_benchmarks")
                .json(&payload),
        )
        .await
        .map_err(|e| ApiError::Reporter(e.to_string()))?;
        Ok(())
    }
}
