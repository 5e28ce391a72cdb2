use thiserror::Error;

pub type Result<T> = std::result::Result<T, StegError>;

/// Everything that can go wrong while hiding or recovering a message.
#[derive(Error, Debug)]
pub enum StegError {
    #[error("could not read carrier: {0}")]
    UnreadableCarrier(String),

    #[error("unsupported carrier format: {0}")]
    UnsupportedFormat(String),

    #[error("carrier is too small for message: need {required} positions but only have {available}")]
    InsufficientCapacity { required: usize, available: usize },

    #[error("video has no frames")]
    NoFramesAvailable,

    #[error("no hidden message found in carrier")]
    TerminatorNotFound,

    #[error("character {character:?} at position {position} does not fit in 8 bits")]
    UnencodableCharacter { character: char, position: usize },

    #[error("could not write carrier: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) fn unreadable<E: std::fmt::Display>(err: E) -> StegError {
    StegError::UnreadableCarrier(err.to_string())
}

pub(crate) fn write_failure<E: std::fmt::Display>(err: E) -> StegError {
    StegError::Write(err.to_string())
}
