//! Typed error taxonomy (spec §7). Library operations that callers
//! branch on (store transactions, the query pipeline) return
//! [`Error`]; the CLI wraps it in `anyhow` at the edge, the way the
//! teacher's `main.rs` wraps `sqlx`/`anyhow` errors.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: yaml header not found")]
    HeaderNotFound { path: PathBuf },

    #[error("{path}: failed to parse yaml header: {source}")]
    HeaderParse {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("{path}: failed to parse date {value:?}")]
    DateParse { path: PathBuf, value: String },

    #[error("invalid filter spec {spec:?}: {reason}")]
    FilterSpec { spec: String, reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("unknown token at byte {offset} in query")]
    LexUnknownToken { offset: usize },

    #[error("unexpected token at byte {offset}: {reason}")]
    ParseToken { offset: usize, reason: String },

    #[error("could not parse {value:?} as a datetime")]
    DatetimeTokenParse { value: String },

    #[error("compile error: {reason}")]
    Compile { reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("no document indexed at path {path:?}")]
    NotFound { path: String },

    #[error("operation timed out")]
    Timeout,

    #[error(transparent)]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, Error>;
