use thiserror::Error;

/// Error kinds for every call against the Learn API.
///
/// Callers branch on the kind, never on message text. Nothing here is
/// retried internally; the only bounded retry in the crate is the
/// pending-status loop in [`crate::poll::BuildPoller`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or connection failure before a response was received.
    #[error("request to Learn failed: {0}")]
    Transport(reqwest::Error),

    /// Learn answered with a non-2xx status. Carries the server's own
    /// error message when the body was decodable.
    #[error("Learn responded with status {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    RemoteRejection { status: u16, message: Option<String> },

    /// The response body did not match the expected shape.
    #[error("could not decode Learn response: {0}")]
    Decode(String),

    /// The build stayed pending through the whole attempts budget.
    #[error("build was still pending after {attempts} polls; giving up")]
    RetryExhausted { attempts: u8 },

    /// Best-effort run-metadata send failed. Never overrides a publish
    /// outcome that already happened.
    #[error("failed to report run metadata: {0}")]
    Reporter(String),
}

impl ApiError {
    /// Classify a reqwest error: body-decode failures are shape
    /// problems, everything else is transport.
    pub fn wire(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }

    pub fn rejection(status: u16, message: Option<String>) -> Self {
        ApiError::RemoteRejection { status, message }
    }
}
