//! Error types.
//!
//! Blocking a navigation is a policy decision, not an error: it is expressed as
//! [`NavigationAction::BlockSilently`](crate::navigation::NavigationAction) and never
//! appears here.

use std::io;

use thiserror::Error;

/// Errors raised while resolving configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("trust host is empty")]
    EmptyTrustHost,

    #[error("trust host `{0}` is not a valid host")]
    InvalidTrustHost(String),

    #[error("main URL `{0}` has no host")]
    MissingHost(String),

    #[error("main URL `{url}` is invalid: {source}")]
    InvalidMainUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot access config file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failures reported by the host shell while executing a decision.
///
/// None of these are fatal: they are logged, surfaced to the user through a
/// [`Notice`](crate::host::Notice), and page state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("no application can handle `{url}`")]
    ExternalHandlerMissing { url: String },

    #[error("download could not be enqueued: {0}")]
    TransferFailure(String),

    #[error("file picker unavailable: {0}")]
    FilePickerUnavailable(String),
}
