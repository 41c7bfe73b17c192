//! Error types shared by the session state machine, the question providers and startup.

use thiserror::Error;

use crate::domain::Phase;

/// Errors returned by session operations. None of them is fatal: the session
/// is always left in a valid, resumable phase.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("invalid setting: {0}")]
    InvalidConfig(String),
    #[error("please select at least one category")]
    EmptySelection,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("please select an answer first")]
    NoSelection,
    #[error("option {0} does not exist; pick one of A-D")]
    OptionOutOfRange(usize),
    #[error("the answer is already revealed")]
    AlreadyRevealed,
    #[error("`{op}` is not allowed during {phase}")]
    InvalidTransition { op: &'static str, phase: Phase },
    #[error("questions are still being generated")]
    Busy,
}

impl QuizError {
    /// Stable snake_case tag used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            QuizError::InvalidConfig(_) => "invalid_config",
            QuizError::EmptySelection => "empty_selection",
            QuizError::Generation(_) => "generation_error",
            QuizError::NoSelection => "no_selection",
            QuizError::OptionOutOfRange(_) => "option_out_of_range",
            QuizError::AlreadyRevealed => "already_revealed",
            QuizError::InvalidTransition { .. } => "invalid_transition",
            QuizError::Busy => "busy",
        }
    }
}

/// Failure of a question provider call: transport, malformed reply or schema violation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("question provider request failed: {0}")]
    Transport(String),
    #[error("question provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("question provider returned an empty reply")]
    EmptyReply,
    #[error("question provider reply is not valid JSON: {0}")]
    Parse(String),
    #[error("question provider reply is malformed: {0}")]
    Schema(String),
    #[error("question provider returned {got} questions, expected {expected}")]
    Count { expected: usize, got: usize },
}

/// Errors that stop the process before the server starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("OPENAI_API_KEY is not set. Add it to the environment or a .env file, or set QUIZ_OFFLINE=1 to play with the built-in question bank.")]
    MissingApiKey,
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
