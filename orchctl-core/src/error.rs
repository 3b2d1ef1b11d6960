use crate::model::LogLine;

/// Failure talking to the orchestrator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientError {
    /// Connection, DNS, timeout or other transport failure
    Transport { message: String },
    /// The orchestrator answered with a non-success status
    Status { code: u16, body: String },
    /// The response body could not be decoded
    Malformed { message: String },
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { message } => write!(f, "request failed: {}", message),
            Self::Status { code, body } if body.is_empty() => {
                write!(f, "orchestrator returned HTTP {}", code)
            }
            Self::Status { code, body } => {
                write!(f, "orchestrator returned HTTP {}: {}", code, body)
            }
            Self::Malformed { message } => write!(f, "malformed response: {}", message),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::malformed(e.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::malformed(e.to_string())
        } else {
            ClientError::transport(e.to_string())
        }
    }
}

/// A log fetch that ended before the log was exhausted.
///
/// Both variants carry the lines collected so far, oldest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFetchError {
    Transport {
        offset: usize,
        source: ClientError,
        partial: Vec<LogLine>,
    },
    /// The orchestrator sent an empty page without signalling the end
    EmptyPage { offset: usize, partial: Vec<LogLine> },
}

impl LogFetchError {
    pub fn partial(&self) -> &[LogLine] {
        match self {
            Self::Transport { partial, .. } | Self::EmptyPage { partial, .. } => partial,
        }
    }

    pub fn into_partial(self) -> Vec<LogLine> {
        match self {
            Self::Transport { partial, .. } | Self::EmptyPage { partial, .. } => partial,
        }
    }
}

impl std::fmt::Display for LogFetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { offset, source, .. } => {
                write!(f, "log page at offset {} failed: {}", offset, source)
            }
            Self::EmptyPage { offset, .. } => {
                write!(f, "empty log page at offset {} without end of log", offset)
            }
        }
    }
}

impl std::error::Error for LogFetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport { source, .. } => Some(source),
            Self::EmptyPage { .. } => None,
        }
    }
}
