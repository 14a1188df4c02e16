use std::path::PathBuf;

/// Everything that can go wrong while handling a request about ideas.
///
/// All of these are recoverable: the bot tells the user and carries on.
#[derive(Debug, thiserror::Error)]
pub enum IdeaError {
    #[error("idea text is empty")]
    EmptyIdea,
    #[error("reply text is empty")]
    EmptyReply,
    #[error("caller is not an admin")]
    PermissionDenied,
    #[error("no idea with id {0}")]
    NotFound(i64),
    #[error("idea {0} has no author to reply to")]
    NoAuthor(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IdeaError {
    /// Short text to show to whoever caused this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            IdeaError::EmptyIdea => {
                "Empty idea? Please write your suggestion in a few words.".to_string()
            }
            IdeaError::EmptyReply => "Write the reply text after the idea ID.".to_string(),
            IdeaError::PermissionDenied => "You don't have access to this command.".to_string(),
            IdeaError::NotFound(id) => format!("There is no idea #{id}."),
            IdeaError::NoAuthor(id) => {
                format!("Idea #{id} was sent anonymously, so there's nobody to reply to.")
            }
            IdeaError::Database(_) => "Something went wrong, please try again later.".to_string(),
        }
    }
}

/// Failure of the external mirror. Never fatal, only logged.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no row at position {0}")]
    NoSuchRow(u64),
    #[error("bad sink configuration: {0}")]
    BadConfig(String),
}

/// Errors that stop the bot from starting at all.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("could not read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file: {0}")]
    ConfigJson(#[from] serde_json::Error),
    #[error("could not read bot key file {path}: {source}")]
    KeyIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("bot key file {0} is empty")]
    EmptyKey(PathBuf),
    #[error("could not open the database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
}
