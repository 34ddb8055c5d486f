//! Error types shared by the API client and the controllers.

use reqwest::StatusCode;
use thiserror::Error;

/// A failure reported by (or while talking to) the InfluxDB API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response, decoded from the `{code, message}` error body when present.
    #[error("HTTP {status}: {message}")]
    Http {
        status: StatusCode,
        code: String,
        message: String,
    },

    /// Error without a status code. Legacy lookups report absence this way.
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build an HTTP error from a status and a raw response body.
    pub fn http(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let (code, message) = match parsed {
            Some(ErrorBody { code, message }) => (code, message),
            None => (String::new(), body.to_string()),
        };
        Self::Http {
            status,
            code,
            message,
        }
    }

    /// The typed status code, if the failure carried one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// A failed reconciliation step, tagged with a static description of the
/// operation so repeated failures aggregate by message.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{context}: {source}")]
    Api {
        context: &'static str,
        #[source]
        source: ApiError,
    },
}

impl ReconcileError {
    pub fn context(&self) -> &'static str {
        match self {
            Self::Api { context, .. } => context,
        }
    }
}

/// Adapter for `map_err` that wraps an [`ApiError`] with `context`.
pub fn wrap(context: &'static str) -> impl FnOnce(ApiError) -> ReconcileError {
    move |source| ReconcileError::Api { context, source }
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
