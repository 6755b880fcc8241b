/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, Completion, HabitStats) and
/// their validation rules. Nothing in here touches storage or the network.

pub mod habit;
pub mod completion;
pub mod streak;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use completion::*;
pub use streak::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Habit description cannot be empty")]
    EmptyDescription,

    #[error("Invalid habit type '{0}'. Valid options: Health, Learning, Creativity, Productivity")]
    InvalidCategory(String),

    #[error("Invalid day '{0}'. Expected a weekday name such as Monday")]
    InvalidDay(String),

    #[error("Invalid time period '{0}'. Valid options: Morning, Afternoon, Evening")]
    InvalidTimePeriod(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
