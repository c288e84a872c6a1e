//! Error types for the CLI

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("connection error: {message}")]
    Connection { message: String },

    #[error("api error: {0}")]
    Api(#[from] kube::Error),

    #[error("command failed: {message}")]
    CommandFailed { message: String },

    #[error("timed out: {message}")]
    Timeout { message: String },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Error::Connection {
            message: message.into(),
        }
    }

    pub fn command_failed(message: impl Into<String>) -> Self {
        Error::CommandFailed {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Error::Timeout {
            message: message.into(),
        }
    }

    /// Whether this error is a Kubernetes 404.
    ///
    /// Drives the create-vs-patch branch in the reconciler and the
    /// retry-vs-abort branch in the health poller.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(kube::Error::Api(ae)) if ae.code == 404)
    }
}
