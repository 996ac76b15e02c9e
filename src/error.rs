use std::time::Duration;

use crate::render::classify::FailureKind;

pub type MatvizResult<T> = Result<T, MatvizError>;

#[derive(thiserror::Error, Debug)]
pub enum MatvizError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("dimension error: {0}")]
    Dimension(String),

    #[error("missing tools: {}", .0.join(", "))]
    ToolMissing(Vec<String>),

    #[error("render error ({kind}): {message}")]
    Render { kind: FailureKind, message: String },

    #[error("render timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("busy: {0}")]
    Busy(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MatvizError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn dimension(msg: impl Into<String>) -> Self {
        Self::Dimension(msg.into())
    }

    pub fn render(kind: FailureKind, msg: impl Into<String>) -> Self {
        Self::Render {
            kind,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }
}
