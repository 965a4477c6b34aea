use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Malformed segment: {0}")]
    MalformedSegment(String),
    #[error("Cursor {cursor} is outside the document (length {len})")]
    CursorOutOfRange { cursor: usize, len: usize },
    #[error("Cursor is inside a comment")]
    InsideComment,
    #[error("Cursor is inside a long string")]
    InsideLongString,
}

pub type Result<T> = std::result::Result<T, ResolveError>;
