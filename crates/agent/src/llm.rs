use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// A hosted text-completion backend: one prompt in, raw model text out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceErrorKind {
    Transport,
    Status,
    Decode,
    Timeout,
    Cancelled,
}

impl ServiceErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Status => "status",
            Self::Decode => "decode",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("completion service {kind} failure: {message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ServiceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self { kind: ServiceErrorKind::Transport, status: None, message: message.into() }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ServiceErrorKind::Status,
            status: Some(status),
            message: format!("HTTP {status}: {}", message.into()),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self { kind: ServiceErrorKind::Decode, status: None, message: message.into() }
    }

    pub fn timeout(after: Duration) -> Self {
        Self {
            kind: ServiceErrorKind::Timeout,
            status: None,
            message: format!("no response within {}s", after.as_secs_f32()),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self { kind: ServiceErrorKind::Cancelled, status: None, message: message.into() }
    }

    /// Rate limits, server errors, timeouts and transport drops are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ServiceErrorKind::Transport | ServiceErrorKind::Timeout => true,
            ServiceErrorKind::Status => {
                self.status.map(|code| code == 429 || code >= 500).unwrap_or(false)
            }
            ServiceErrorKind::Decode | ServiceErrorKind::Cancelled => false,
        }
    }
}
