//! Error types for editor operations.
//!
//! Stale paths are not errors: resolving a path that no longer exists yields
//! `None` and the operation is skipped. Only template resolution and
//! persistence failures surface through this type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("page not found: {0}")]
    PageNotFound(usize),

    #[error("a catalogue needs at least one page")]
    LastPage,

    #[error("invalid style value: {0}")]
    InvalidStyle(String),

    #[error("node not found")]
    NodeNotFound,

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, Error>;
