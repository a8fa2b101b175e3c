//! Error types for chosei-core.

use thiserror::Error;

/// Errors that can occur while building or editing scheduling state.
#[derive(Error, Debug)]
pub enum ChoseiError {
    #[error("Invalid month '{0}'. Expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Invalid slot date '{0}'. Expected M/D")]
    InvalidSlotDate(String),

    #[error("Invalid slot time '{0}'. Expected H:MM~H:MM")]
    InvalidSlotTime(String),

    #[error("Unknown meeting duration '{0}'")]
    InvalidDuration(String),

    #[error("No time slot is open for editing")]
    ModalNotOpen,

    #[error("A meeting invite is already being sent")]
    SubmitInProgress,

    #[error("Schedule error: {0}")]
    Schedule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for chosei-core operations.
pub type ChoseiResult<T> = Result<T, ChoseiError>;
