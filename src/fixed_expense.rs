//! Fixed expense ledger rows and their database queries.
//!
//! Fixed expenses are the predictable monthly bills: rent, utilities,
//! subscriptions billed on a due date. They carry a payment status, an
//! optional payment date, and an optional payment method. Expansion advances
//! the due date; the payment date, if supplied, applies to the first row
//! only since later occurrences have not been paid yet.

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

/// A predictable, recurring expense such as rent or an electricity bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedExpense {
    /// The ID of the expense row.
    pub id: DatabaseId,
    /// The user that owns this row.
    pub user_id: UserId,
    /// A text description of the expense.
    pub description: String,
    /// The expense category label, e.g. "Housing".
    pub category: String,
    /// The amount of money owed.
    pub amount: f64,
    /// When the payment is due.
    pub due_date: Date,
    /// Whether the expense has been paid.
    pub status: PaymentStatus,
    /// When the expense was paid, if it has been.
    pub paid_on: Option<Date>,
    /// The payment method label, e.g. "Credit card".
    pub payment_method: Option<String>,
}

/// A submitted fixed expense, before expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedExpenseIntent {
    /// The user recording the expense.
    pub user_id: UserId,
    /// A text description of the expense.
    pub description: String,
    /// The expense category label.
    pub category: String,
    /// The total amount owed.
    pub amount: f64,
    /// The due date of the (first) entry.
    pub due_date: Date,
    /// Whether the expense has been paid.
    pub status: PaymentStatus,
    /// When the expense was paid, if it has been.
    pub paid_on: Option<Date>,
    /// The payment method label.
    pub payment_method: Option<String>,
    /// How the entry fans out into rows.
    pub schedule: Schedule,
}

impl FixedExpenseIntent {
    /// Build an intent from the raw submission fields: `dd/mm/yyyy` due and
    /// payment dates, an optional installment count, and an optional
    /// `mm/yyyy` recurrence end month.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateInput] for a malformed date string, or
    /// [Error::InvalidInstallmentCount] for an out-of-range count.
    #[allow(clippy::too_many_arguments)]
    pub fn from_form(
        user_id: UserId,
        description: &str,
        category: &str,
        amount: f64,
        due_date: &str,
        status: PaymentStatus,
        paid_on: Option<&str>,
        payment_method: Option<&str>,
        installments: Option<u8>,
        repeat_until: Option<&str>,
    ) -> Result<Self, Error> {
        let due_date = parse_day_month_year(due_date)?;
        let paid_on = paid_on.map(parse_day_month_year).transpose()?;
        let repeat_until = repeat_until.map(parse_month_year).transpose()?;

        Ok(Self {
            user_id,
            description: description.to_owned(),
            category: category.to_owned(),
            amount,
            due_date,
            status,
            paid_on,
            payment_method: payment_method.map(str::to_owned),
            schedule: Schedule::from_parts(installments, repeat_until, due_date)?,
        })
    }
}

/// Expand a fixed expense intent and insert all produced rows in one
/// transaction.
///
/// # Errors
/// Returns a validation error from [expand], or [Error::SqlError] if the
/// batch cannot be persisted.
pub fn create_fixed_expenses(
    intent: FixedExpenseIntent,
    connection: &Connection,
) -> Result<Vec<FixedExpense>, Error> {
    let entries = expand(
        &intent.description,
        intent.amount,
        intent.due_date,
        intent.schedule,
    )?;

    let transaction = connection.unchecked_transaction()?;
    let mut rows = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        // Only the first occurrence can already have been paid.
        let paid_on = if index == 0 { intent.paid_on } else { None };

        let row = transaction
            .prepare(
                "INSERT INTO fixed_expense
                    (user_id, description, category, amount, due_date, status, paid_on, payment_method)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 RETURNING id, user_id, description, category, amount, due_date, status, paid_on,
                           payment_method",
            )?
            .query_one(
                (
                    intent.user_id,
                    &entry.description,
                    &intent.category,
                    entry.amount,
                    entry.date,
                    intent.status,
                    paid_on,
                    &intent.payment_method,
                ),
                map_fixed_expense_row,
            )?;

        rows.push(row);
    }

    transaction.commit()?;
    tracing::debug!("created {} fixed expense row(s)", rows.len());

    Ok(rows)
}

/// Retrieve a fixed expense row by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid row, or
/// [Error::SqlError] on some other SQL error.
pub fn get_fixed_expense(id: DatabaseId, connection: &Connection) -> Result<FixedExpense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, user_id, description, category, amount, due_date, status, paid_on,
                    payment_method
             FROM fixed_expense WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_fixed_expense_row)?;

    Ok(expense)
}

/// Retrieve a user's fixed expense rows due within `year`, ordered by due
/// date.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_fixed_expenses_for_year(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<FixedExpense>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, description, category, amount, due_date, status, paid_on,
                    payment_method
             FROM fixed_expense
             WHERE user_id = ?1 AND due_date BETWEEN ?2 AND ?3
             ORDER BY due_date ASC, id ASC",
        )?
        .query_map(
            (user_id, year_start(year), year_end(year)),
            map_fixed_expense_row,
        )?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

/// Overwrite a single fixed expense row, e.g. to mark it paid.
///
/// # Errors
/// Returns [Error::EmptyDescription] or [Error::NegativeAmount] for invalid
/// fields, [Error::UpdateMissingRow] if the row does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn update_fixed_expense(expense: &FixedExpense, connection: &Connection) -> Result<(), Error> {
    if expense.description.trim().is_empty() {
        return Err(Error::EmptyDescription);
    }

    if expense.amount < 0.0 {
        return Err(Error::NegativeAmount(expense.amount));
    }

    let rows_updated = connection.execute(
        "UPDATE fixed_expense
         SET description = ?1, category = ?2, amount = ?3, due_date = ?4, status = ?5,
             paid_on = ?6, payment_method = ?7
         WHERE id = ?8 AND user_id = ?9",
        (
            &expense.description,
            &expense.category,
            expense.amount,
            expense.due_date,
            expense.status,
            expense.paid_on,
            &expense.payment_method,
            expense.id,
            expense.user_id,
        ),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingRow);
    }

    Ok(())
}

/// Delete a single fixed expense row.
///
/// # Errors
/// Returns [Error::DeleteMissingRow] if the row does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn delete_fixed_expense(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM fixed_expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingRow);
    }

    Ok(())
}

/// Create the fixed expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_fixed_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS fixed_expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                due_date TEXT NOT NULL,
                status TEXT NOT NULL,
                paid_on TEXT,
                payment_method TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_fixed_expense_row(row: &Row) -> Result<FixedExpense, rusqlite::Error> {
    Ok(FixedExpense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        amount: row.get(4)?,
        due_date: row.get(5)?,
        status: row.get(6)?,
        paid_on: row.get(7)?,
        payment_method: row.get(8)?,
    })
}
