use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Transport error reaching the report source: {0}")]
    Transport(String),

    #[error("Report rejected by Tally: {0}")]
    ReportRejected(String),

    #[error("Could not parse report payload: {message}")]
    Parse { message: String, snippet: String },

    #[error("No tabular data found in report payload")]
    NoTabularData,

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation service error: {0}")]
    Generation(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TallyError {
    /// Builds a `Parse` error keeping at most 500 characters of the raw text.
    pub fn parse(message: impl Into<String>, raw: &str) -> Self {
        Self::Parse {
            message: message.into(),
            snippet: raw.chars().take(500).collect(),
        }
    }

    /// Whether retrying the whole request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for TallyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {}", err))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<image::ImageError> for TallyError {
    fn from(err: image::ImageError) -> Self {
        Self::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TallyError>;
