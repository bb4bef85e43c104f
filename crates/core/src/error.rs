use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration parse error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Duplicate route '{0}'")]
    DuplicateRoute(String),

    #[error("Invalid route '{path}': {reason}")]
    InvalidRoute { path: String, reason: String },

    #[error("Render failed for '{route}': {message}")]
    Render { route: String, message: String },

    #[error("{target} bundle failed: {message}")]
    Bundle { target: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(io) => Error::Io(io),
            None => Error::Io(std::io::Error::other("filesystem loop detected")),
        }
    }
}

impl Error {
    pub fn render(route: impl Into<String>, message: impl ToString) -> Self {
        Error::Render {
            route: route.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
