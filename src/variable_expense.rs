//! Variable expense ledger rows and their database queries.
//!
//! Variable expenses are the unpredictable spending: groceries, fuel, a
//! night out. Besides the occurrence date they carry a **balance month**, the
//! first-of-month bucket the expense counts against in reports. Expansion
//! advances the balance month while the occurrence date stays fixed — a
//! purchase made today in three installments still happened today, but its
//! parts weigh on three successive months.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    date_input::{parse_day_month_year, parse_month_year, year_end, year_start},
    schedule::{Schedule, expand},
    user::UserId,
};

/// A one-off expense attributed to a monthly balance bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableExpense {
    /// The ID of the expense row.
    pub id: DatabaseId,
    /// The user that owns this row.
    pub user_id: UserId,
    /// A text description of the expense.
    pub description: String,
    /// The expense category label, e.g. "Groceries".
    pub category: String,
    /// The amount of money spent.
    pub amount: f64,
    /// When the expense happened.
    pub date: Date,
    /// The payment method label, e.g. "Credit card".
    pub payment_method: Option<String>,
    /// The first day of the month this expense counts against in reports.
    pub balance_month: Date,
}

/// A submitted variable expense, before expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpenseIntent {
    /// The user recording the expense.
    pub user_id: UserId,
    /// A text description of the expense.
    pub description: String,
    /// The expense category label.
    pub category: String,
    /// The total amount spent.
    pub amount: f64,
    /// When the expense happened.
    pub date: Date,
    /// The payment method label.
    pub payment_method: Option<String>,
    /// The month bucket of the (first) entry; any day-of-month is accepted
    /// and normalized to the first of the month.
    pub balance_month: Date,
    /// How the entry fans out into rows.
    pub schedule: Schedule,
}

impl VariableExpenseIntent {
    /// Build an intent from the raw submission fields: a `dd/mm/yyyy`
    /// occurrence date, a `mm/yyyy` balance month, an optional installment
    /// count, and an optional `mm/yyyy` recurrence end month.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateInput] for a malformed date string, or
    /// [Error::InvalidInstallmentCount] for an out-of-range count.
    pub fn from_form(
        user_id: UserId,
        description: &str,
        category: &str,
        amount: f64,
        date: &str,
        payment_method: Option<&str>,
        balance_month: &str,
        installments: Option<u8>,
        repeat_until: Option<&str>,
    ) -> Result<Self, Error> {
        let date = parse_day_month_year(date)?;
        let balance_month = parse_month_year(balance_month)?;
        let repeat_until = repeat_until.map(parse_month_year).transpose()?;

        Ok(Self {
            user_id,
            description: description.to_owned(),
            category: category.to_owned(),
            amount,
            date,
            payment_method: payment_method.map(str::to_owned),
            balance_month,
            schedule: Schedule::from_parts(installments, repeat_until, balance_month)?,
        })
    }
}

/// Expand a variable expense intent and insert all produced rows in one
/// transaction.
///
/// The expansion runs over the balance month: each produced entry lands in
/// the next month's bucket while every row keeps the submitted occurrence
/// date.
///
/// # Errors
/// Returns a validation error from [expand], or [Error::SqlError] if the
/// batch cannot be persisted.
pub fn create_variable_expenses(
    intent: VariableExpenseIntent,
    connection: &Connection,
) -> Result<Vec<VariableExpense>, Error> {
    let start = intent.balance_month.replace_day(1).unwrap();
    let entries = expand(&intent.description, intent.amount, start, intent.schedule)?;

    let transaction = connection.unchecked_transaction()?;
    let mut rows = Vec::with_capacity(entries.len());

    for entry in &entries {
        let row = transaction
            .prepare(
                "INSERT INTO variable_expense
                    (user_id, description, category, amount, date, payment_method, balance_month)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING id, user_id, description, category, amount, date, payment_method,
                           balance_month",
            )?
            .query_one(
                (
                    intent.user_id,
                    &entry.description,
                    &intent.category,
                    entry.amount,
                    intent.date,
                    &intent.payment_method,
                    entry.date,
                ),
                map_variable_expense_row,
            )?;

        rows.push(row);
    }

    transaction.commit()?;
    tracing::debug!("created {} variable expense row(s)", rows.len());

    Ok(rows)
}

/// Retrieve a variable expense row by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid row, or
/// [Error::SqlError] on some other SQL error.
pub fn get_variable_expense(
    id: DatabaseId,
    connection: &Connection,
) -> Result<VariableExpense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, user_id, description, category, amount, date, payment_method, balance_month
             FROM variable_expense WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_variable_expense_row)?;

    Ok(expense)
}

/// Retrieve a user's variable expense rows bucketed within `year`, ordered
/// by balance month and occurrence date.
///
/// The filter runs over the balance month, not the occurrence date, so an
/// installment bought in December and bucketed into January belongs to the
/// new year.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_variable_expenses_for_year(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<VariableExpense>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, description, category, amount, date, payment_method, balance_month
             FROM variable_expense
             WHERE user_id = ?1 AND balance_month BETWEEN ?2 AND ?3
             ORDER BY balance_month ASC, date ASC, id ASC",
        )?
        .query_map(
            (user_id, year_start(year), year_end(year)),
            map_variable_expense_row,
        )?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

/// Overwrite a single variable expense row.
///
/// The balance month is normalized to the first of its month.
///
/// # Errors
/// Returns [Error::EmptyDescription] or [Error::NegativeAmount] for invalid
/// fields, [Error::UpdateMissingRow] if the row does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn update_variable_expense(
    expense: &VariableExpense,
    connection: &Connection,
) -> Result<(), Error> {
    if expense.description.trim().is_empty() {
        return Err(Error::EmptyDescription);
    }

    if expense.amount < 0.0 {
        return Err(Error::NegativeAmount(expense.amount));
    }

    let rows_updated = connection.execute(
        "UPDATE variable_expense
         SET description = ?1, category = ?2, amount = ?3, date = ?4, payment_method = ?5,
             balance_month = ?6
         WHERE id = ?7 AND user_id = ?8",
        (
            &expense.description,
            &expense.category,
            expense.amount,
            expense.date,
            &expense.payment_method,
            expense.balance_month.replace_day(1).unwrap(),
            expense.id,
            expense.user_id,
        ),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingRow);
    }

    Ok(())
}

/// Delete a single variable expense row.
///
/// # Errors
/// Returns [Error::DeleteMissingRow] if the row does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn delete_variable_expense(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM variable_expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingRow);
    }

    Ok(())
}

/// Create the variable expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_variable_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS variable_expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                payment_method TEXT,
                balance_month TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_variable_expense_row(row: &Row) -> Result<VariableExpense, rusqlite::Error> {
    Ok(VariableExpense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        payment_method: row.get(6)?,
        balance_month: row.get(7)?,
    })
}
