//! Debt ledger rows and their database queries.
//!
//! Debts carry a due date and a payment status. Recurrence advances the due
//! date one calendar month per row; installments split the owed total the
//! same way expenses do.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    date_input::{parse_day_month_year, parse_month_year, year_end, year_start},
    schedule::{Schedule, expand},
    status::PaymentStatus,
    user::UserId,
};

/// Money owed to someone: a loan repayment, a bill, an IOU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    /// The ID of the debt row.
    pub id: DatabaseId,
    /// The user that owns this row.
    pub user_id: UserId,
    /// A text description of the debt.
    pub description: String,
    /// Who the money is owed to.
    pub creditor: String,
    /// The amount owed.
    pub amount: f64,
    /// When the payment is due.
    pub due_date: Date,
    /// Whether the debt has been settled.
    pub status: PaymentStatus,
}

/// A submitted debt entry, before expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct DebtIntent {
    /// The user recording the debt.
    pub user_id: UserId,
    /// A text description of the debt.
    pub description: String,
    /// Who the money is owed to.
    pub creditor: String,
    /// The total amount owed.
    pub amount: f64,
    /// The due date of the (first) entry.
    pub due_date: Date,
    /// Whether the debt has been settled.
    pub status: PaymentStatus,
    /// How the entry fans out into rows.
    pub schedule: Schedule,
}

impl DebtIntent {
    /// Build an intent from the raw submission fields: a `dd/mm/yyyy` due
    /// date, an optional installment count, and an optional `mm/yyyy`
    /// recurrence end month.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateInput] for a malformed date string, or
    /// [Error::InvalidInstallmentCount] for an out-of-range count.
    pub fn from_form(
        user_id: UserId,
        description: &str,
        creditor: &str,
        amount: f64,
        due_date: &str,
        status: PaymentStatus,
        installments: Option<u8>,
        repeat_until: Option<&str>,
    ) -> Result<Self, Error> {
        let due_date = parse_day_month_year(due_date)?;
        let repeat_until = repeat_until.map(parse_month_year).transpose()?;

        Ok(Self {
            user_id,
            description: description.to_owned(),
            creditor: creditor.to_owned(),
            amount,
            due_date,
            status,
            schedule: Schedule::from_parts(installments, repeat_until, due_date)?,
        })
    }
}

/// Expand a debt intent and insert all produced rows in one transaction.
///
/// # Errors
/// Returns a validation error from [expand], or [Error::SqlError] if the
/// batch cannot be persisted.
pub fn create_debts(intent: DebtIntent, connection: &Connection) -> Result<Vec<Debt>, Error> {
    let entries = expand(
        &intent.description,
        intent.amount,
        intent.due_date,
        intent.schedule,
    )?;

    let transaction = connection.unchecked_transaction()?;
    let mut rows = Vec::with_capacity(entries.len());

    for entry in &entries {
        let row = transaction
            .prepare(
                "INSERT INTO debt (user_id, description, creditor, amount, due_date, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING id, user_id, description, creditor, amount, due_date, status",
            )?
            .query_one(
                (
                    intent.user_id,
                    &entry.description,
                    &intent.creditor,
                    entry.amount,
                    entry.date,
                    intent.status,
                ),
                map_debt_row,
            )?;

        rows.push(row);
    }

    transaction.commit()?;
    tracing::debug!("created {} debt row(s)", rows.len());

    Ok(rows)
}

/// Retrieve a debt row by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid row, or
/// [Error::SqlError] on some other SQL error.
pub fn get_debt(id: DatabaseId, connection: &Connection) -> Result<Debt, Error> {
    let debt = connection
        .prepare(
            "SELECT id, user_id, description, creditor, amount, due_date, status FROM debt
             WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_debt_row)?;

    Ok(debt)
}

/// Retrieve a user's debt rows due within `year`, ordered by due date.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_debts_for_year(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<Debt>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, description, creditor, amount, due_date, status FROM debt
             WHERE user_id = ?1 AND due_date BETWEEN ?2 AND ?3
             ORDER BY due_date ASC, id ASC",
        )?
        .query_map((user_id, year_start(year), year_end(year)), map_debt_row)?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

/// Overwrite a single debt row, e.g. to mark it paid.
///
/// # Errors
/// Returns [Error::EmptyDescription] or [Error::NegativeAmount] for invalid
/// fields, [Error::UpdateMissingRow] if the row does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn update_debt(debt: &Debt, connection: &Connection) -> Result<(), Error> {
    if debt.description.trim().is_empty() {
        return Err(Error::EmptyDescription);
    }

    if debt.amount < 0.0 {
        return Err(Error::NegativeAmount(debt.amount));
    }

    let rows_updated = connection.execute(
        "UPDATE debt SET description = ?1, creditor = ?2, amount = ?3, due_date = ?4, status = ?5
         WHERE id = ?6 AND user_id = ?7",
        (
            &debt.description,
            &debt.creditor,
            debt.amount,
            debt.due_date,
            debt.status,
            debt.id,
            debt.user_id,
        ),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingRow);
    }

    Ok(())
}

/// Delete a single debt row.
///
/// # Errors
/// Returns [Error::DeleteMissingRow] if the row does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn delete_debt(id: DatabaseId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM debt WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingRow);
    }

    Ok(())
}

/// Create the debt table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_debt_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS debt (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                creditor TEXT NOT NULL,
                amount REAL NOT NULL,
                due_date TEXT NOT NULL,
                status TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_debt_row(row: &Row) -> Result<Debt, rusqlite::Error> {
    Ok(Debt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        creditor: row.get(3)?,
        amount: row.get(4)?,
        due_date: row.get(5)?,
        status: row.get(6)?,
    })
}
