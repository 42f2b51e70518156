//! Error taxonomy for sync, cache and configuration

/// Why a remote fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Unauthorized,
    NotFound,
    Network,
    Http,
    Parse,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Unauthorized => "unauthorized",
            FetchErrorKind::NotFound => "not found",
            FetchErrorKind::Network => "network",
            FetchErrorKind::Http => "http",
            FetchErrorKind::Parse => "parse",
        }
    }
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the sync core.
///
/// Cloneable so that callers sharing one coalesced fetch all receive the same error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    /// A present blob could not be decompressed or parsed
    #[error("Malformed snapshot blob '{blob}': {reason}")]
    MalformedSnapshot { blob: String, reason: String },

    /// Network or auth failure while fetching the blob container
    #[error("Sync fetch failed ({kind}): {message}")]
    SyncFetch { kind: FetchErrorKind, message: String },

    /// Local persistence failure; the cache layer never lets this escape
    #[error("Cache IO error: {0}")]
    CacheIo(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn malformed(blob: &str, reason: impl std::fmt::Display) -> Self {
        SyncError::MalformedSnapshot {
            blob: blob.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn fetch(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        SyncError::SyncFetch {
            kind,
            message: message.into(),
        }
    }

    pub fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            SyncError::SyncFetch { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
