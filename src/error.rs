use std::path::PathBuf;

use reqwest::Method;
use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} environment variable is missing")]
    Missing { var: &'static str },

    #[error("{var} environment variable is not a valid url: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} environment variable is not a valid number: '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Sample data file is not present at {}", path.display())]
    MissingFile { var: &'static str, path: PathBuf },

    #[error("{var} still holds a placeholder value, set your tenant, client id, client secret and base url in the environment")]
    Placeholder { var: &'static str },

    #[error("Cannot load {}: {reason}", path.display())]
    EnvFile { path: PathBuf, reason: String },
}

/// Errors raised before a response could be read.
///
/// When one of these is returned there is no status code to inspect.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid request url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("cannot build http client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing {0} for the token request")]
    MissingCredential(&'static str),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Failed to fetch access token: HTTP {status}")]
    Rejected { status: u16, body: String },

    #[error("cannot parse token response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token response did not contain an access_token")]
    MissingAccessToken,
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no instance named '{name}' exists in the CMS")]
    InstanceNotFound { name: String },

    #[error("{count} instances named '{name}' exist in the CMS")]
    AmbiguousInstance { name: String, count: usize },

    #[error("{operation}: {failed} of {total} items failed")]
    Incomplete {
        operation: &'static str,
        failed: usize,
        total: usize,
    },

    #[error("deadline of {0}s for the batch elapsed")]
    DeadlineElapsed(u64),

    #[error("cancelled: {0}")]
    Cancelled(&'static str),
}

/// A convenient Result type alias for operations that may fail.
pub type Res<T> = std::result::Result<T, Error>;
