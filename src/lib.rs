//! Balanço is a personal-finance tracker core: income, fixed and variable
//! expenses, debts, investments, and savings goals, with a yearly
//! monthly-balance summary.
//!
//! The centrepiece is the recurrence and installment expansion engine in
//! [schedule]: a single submitted entry can fan out into one ledger row per
//! month (a subscription) or into N installment rows whose amounts sum back
//! to the original total exactly. Each entity module owns its table schema,
//! queries, and the mapping from expanded entries onto its rows.

#![warn(missing_docs)]

pub mod catalog;
pub mod database_id;
pub mod date_input;
pub mod db;
pub mod debt;
pub mod fixed_expense;
pub mod goal;
pub mod income;
pub mod investment;
pub mod money;
pub mod report;
pub mod schedule;
pub mod status;
pub mod user;
pub mod variable_expense;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used as an entry description.
    #[error("description cannot be empty")]
    EmptyDescription,

    /// An empty string was used as a name for a goal or catalog entry.
    #[error("name cannot be empty")]
    EmptyName,

    /// A zero or negative amount was submitted for expansion.
    ///
    /// Submitted entries record money that actually moved, so a zero or
    /// negative total has no meaningful expansion.
    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(f64),

    /// A negative amount was used where only zero or positive values are
    /// stored (row updates, annual limits, goal targets).
    #[error("amount must not be negative, got {0}")]
    NegativeAmount(f64),

    /// A non-positive quantity was used for an investment.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    /// An installment count outside the supported range of 1 to 12.
    #[error("installment count must be between 1 and 12, got {0}")]
    InvalidInstallmentCount(u8),

    /// A textual date did not match the expected day-first format.
    ///
    /// Callers should pass the underlying reason and the input string that
    /// caused the error.
    #[error("could not parse date \"{1}\": {0}")]
    InvalidDateInput(String, String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a row that does not exist.
    #[error("tried to update a row that is not in the database")]
    UpdateMissingRow,

    /// Tried to delete a row that does not exist.
    #[error("tried to delete a row that is not in the database")]
    DeleteMissingRow,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
