//! Error types for trusted-endpoint validation.

use thiserror::Error;

/// Result type for endpoint validation.
pub type Result<T> = std::result::Result<T, EndpointError>;

/// Errors produced when a host may not receive a credential.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The host is not recognized as a trusted endpoint.
    #[error(
        "host '{host}' is not a trusted Kusto endpoint for login authority '{}': {reason}",
        .authority.as_deref().unwrap_or("<none>")
    )]
    Untrusted {
        /// Offending host (or the raw address when no host could be parsed).
        host: String,
        /// Login authority the host was checked against, if one was given.
        authority: Option<String>,
        /// Which check rejected the host.
        reason: String,
    },
}

impl EndpointError {
    pub(crate) fn untrusted(host: &str, authority: &str, reason: impl Into<String>) -> Self {
        let authority = authority.trim();
        Self::Untrusted {
            host: host.to_string(),
            authority: (!authority.is_empty()).then(|| authority.to_string()),
            reason: reason.into(),
        }
    }

    /// The host that was rejected.
    pub fn host(&self) -> &str {
        match self {
            Self::Untrusted { host, .. } => host,
        }
    }
}

/// Failure to extract a host from an address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("invalid address: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },

    #[error("address has no host")]
    MissingHost,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
