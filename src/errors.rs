/// Domain-specific error types for the tracker.
/// All validation is local and recoverable (reject + message); only a
/// failed initial load escalates, by holding the session in a blocked
/// phase that suppresses saves.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("insufficient funds: need {needed:.2}, available {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("blocked: {0} is only allowed on the day the bet was placed")]
    SameDayOnly(&'static str),

    #[error("wager {0} is not open")]
    NotOpen(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("session not ready: {0}")]
    NotReady(&'static str),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("sync error: {0}")]
    Sync(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for TrackerError {
    fn from(e: rusqlite::Error) -> Self {
        TrackerError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(e: serde_json::Error) -> Self {
        TrackerError::Storage(format!("serialize: {e}"))
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(e: reqwest::Error) -> Self {
        TrackerError::Sync(e.to_string())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(e: std::io::Error) -> Self {
        TrackerError::Storage(e.to_string())
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
