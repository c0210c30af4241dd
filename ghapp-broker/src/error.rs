use crate::storage::StorageError;
use thiserror::Error;

/// Failures surfaced by broker operations.
///
/// An organization without an installation is not an error: it yields an
/// empty token instead, so callers can tell it apart from transport and
/// authentication failures by inspecting the payload.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("configuration missing")]
    ConfigMissing,

    #[error("provided key has wrong format: {0}")]
    KeyFormat(String),

    #[error("failed to sign assertion: {0}")]
    Signing(String),

    #[error("github responded with status: {code}")]
    RemoteStatus { code: u16 },

    #[error("failed to decode github response: {0}")]
    Decode(String),

    #[error("failed to reach github: {0}")]
    Transport(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("operation cancelled")]
    Cancelled,
}

impl BrokerError {
    /// Classifies a reqwest failure. Client timeouts map to `Cancelled`.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Cancelled
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
