use thiserror::Error;

/// Errors surfaced by the codec, the stores and the cookie jar.
///
/// None of them is fatal: a store that returns a decoding or integrity error
/// has already reset the session to a fresh, empty state.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session value could not be serialized.
    #[error("session value could not be encoded: {0}")]
    Encoding(#[source] serde_json::Error),
    /// The stored payload is malformed, truncated or has the wrong shape.
    #[error("session payload could not be decoded: {0}")]
    Decoding(#[from] DecodeError),
    /// The companion signature of a signed cookie is missing or wrong.
    #[error("signature of cookie `{name}` did not verify")]
    Integrity { name: String },
    /// A signed cookie was to be written but the jar holds no signing key.
    #[error("cookie `{name}` must be signed but no signing keys are configured")]
    MissingKeys { name: String },
    /// `save`/`destroy` was called on a session no store ever loaded.
    #[error("session `{0}` is not bound to a store")]
    Unbound(String),
}

/// Which step of the decode pipeline rejected the payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    pub fn is_decoding(&self) -> bool {
        matches!(self, SessionError::Decoding(_))
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, SessionError::Integrity { .. })
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
