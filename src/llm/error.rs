use thiserror::Error;

const BODY_EXCERPT_CHARS: usize = 300;

/// Failures of a single generative extraction attempt. None of these abort a run;
/// the orchestrator decides whether to fall back.
#[derive(Error, Debug)]
pub enum GenerativeError {
    #[error("No API key configured for the language model endpoint")]
    MissingCredential,

    #[error("Request to the language model failed: {0}")]
    Transport(String),

    #[error("Language model did not answer within {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Language model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Language model response is not valid JSON: {0}")]
    InvalidResponse(String),
}

impl GenerativeError {
    pub fn status(status: u16, body: &str) -> Self {
        let body: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        GenerativeError::Status { status, body }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            GenerativeError::Transport(_) | GenerativeError::Timeout { .. } => true,
            GenerativeError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
