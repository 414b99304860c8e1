//! Error classification for upstream requests

/// Error from a single upstream API call.
///
/// `Http` covers the transport layer (connect failure, timeout, HTTP error
/// status) and is safe to retry. `Decode` means the response arrived but
/// its body was not the expected shape; retrying would fail the same way.
#[derive(Debug)]
pub enum FetchError {
    Http {
        status: Option<u16>,
        message: String,
    },
    Decode(String),
    /// Defensive: the retry loop ran out of attempts without producing a
    /// result. Unreachable with a well-formed policy.
    RetriesExhausted {
        attempts: u32,
    },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Decode(message) => write!(f, "invalid response: {message}"),
            Self::RetriesExhausted { attempts } => {
                write!(f, "max retries ({attempts}) exceeded")
            }
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Classify a reqwest failure: body decode errors are permanent,
    /// everything else is a transport-layer failure.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Http {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { .. })
    }
}
