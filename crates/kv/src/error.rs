use ks_domain::error::Error;

/// Errors raised by the key-value store.
#[derive(thiserror::Error, Debug)]
pub enum KvError {
    /// The key does not exist or has expired.
    #[error("not found")]
    NotFound,

    #[error("database is closed")]
    Closed,

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

impl KvError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

pub type KvResult<T> = std::result::Result<T, KvError>;

impl From<KvError> for Error {
    fn from(err: KvError) -> Self {
        match err {
            KvError::Io(e) => Error::Io(e),
            other => Error::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable() {
        assert!(KvError::NotFound.is_not_found());
        assert!(!KvError::Closed.is_not_found());
    }

    #[test]
    fn converts_into_store_error() {
        let err: Error = KvError::Closed.into();
        assert!(matches!(err, Error::Store(ref msg) if msg == "database is closed"));
    }
}
