use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Invalid span data: {0}")]
    InvalidSpan(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Timeout error: operation took longer than {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Result type alias for traceloom operations
pub type Result<T> = std::result::Result<T, LoomError>;

impl LoomError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new authentication error
    pub fn auth<S: Into<String>>(msg: S) -> Self {
        Self::Auth(msg.into())
    }

    /// Creates a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Creates a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Creates an error for a non-2xx backend response, mapping
    /// authentication failures onto their own variant.
    pub fn http_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Auth(format!("backend rejected credentials (HTTP {})", status)),
            _ => Self::Http { status, body },
        }
    }

    /// Returns true if this error is recoverable by retrying the call
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => matches!(status, 429 | 500..=599),
            Self::Client(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Auth(_) => "auth",
            Self::Network(_) | Self::Http { .. } | Self::Client(_) => "network",
            Self::Parse { .. } | Self::Serialization(_) => "parse",
            Self::InvalidSpan(_) | Self::InvalidQuery(_) => "validation",
            Self::Io(_) => "io",
            Self::Timeout { .. } => "timeout",
        }
    }
}
