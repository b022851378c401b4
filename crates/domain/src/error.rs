/// Shared error type used across all kvsession crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Any failure reported by the key-value store other than a missing key.
    #[error("store: {0}")]
    Store(String),

    /// Encoding or decoding a session payload failed.
    #[error("codec: {0}")]
    Codec(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn label(err: &Error) -> &'static str {
        match err {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Store(_) => "store",
            Error::Codec(_) => "codec",
            Error::Cancelled => "cancelled",
            Error::DeadlineExceeded => "deadline",
            Error::Config(_) => "config",
        }
    }

    #[test]
    fn every_variant_has_a_distinct_message() {
        let errors = [
            Error::Io(std::io::Error::other("disk")),
            Error::Json(serde_json::from_str::<u8>("x").unwrap_err()),
            Error::Store("locked".into()),
            Error::Codec("bad payload".into()),
            Error::Cancelled,
            Error::DeadlineExceeded,
            Error::Config("store.path".into()),
        ];
        let messages: std::collections::HashSet<String> =
            errors.iter().map(|e| format!("{}: {e}", label(e))).collect();
        assert_eq!(messages.len(), errors.len());
        assert_eq!(Error::Store("locked".into()).to_string(), "store: locked");
        assert_eq!(Error::Cancelled.to_string(), "request cancelled");
    }
}
