/// All error types that can occur when talking to Daikin units.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An HTTP request to a unit failed before a body could be read.
    ///
    /// This is the primary signal that a unit has gone offline.
    #[error("http {action} error: {err}")]
    Http { action: String, err: reqwest::Error },

    /// A UDP socket operation failed while discovering units.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// The unit replied without a `ret` status field.
    #[error("no status in response")]
    InvalidResponse,

    /// The unit replied with a status other than `OK`.
    #[error("status was not OK: {0}")]
    StatusNotOk(String),
}

impl Error {
    /// Create a new HTTP error
    pub fn http(action: &str, err: reqwest::Error) -> Self {
        Error::Http {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Whether this error means the unit could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::Http { .. } | Error::Socket { .. })
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
