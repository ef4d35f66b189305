//! Income ledger rows and their database queries.
//!
//! Income supports monthly recurrence (a salary recorded through an end
//! month) and installments; the expanded entries' dates land on the
//! occurrence date column.

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

/// Money earned: a salary payment, a dividend, a side job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    /// The ID of the income row.
    pub id: DatabaseId,
    /// The user that owns this row.
    pub user_id: UserId,
    /// A text description of the income.
    pub description: String,
    /// The income source label, e.g. "Salary".
    pub source: String,
    /// The amount of money earned.
    pub amount: f64,
    /// When the money was (or will be) received.
    pub date: Date,
}

/// A submitted income entry, before expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeIntent {
    /// The user recording the income.
    pub user_id: UserId,
    /// A text description of the income.
    pub description: String,
    /// The income source label.
    pub source: String,
    /// The total amount of money earned.
    pub amount: f64,
    /// The occurrence date of the (first) entry.
    pub date: Date,
    /// How the entry fans out into rows.
    pub schedule: Schedule,
}

impl IncomeIntent {
    /// Build an intent from the raw submission fields: a `dd/mm/yyyy`
    /// occurrence date, an optional installment count, and an optional
    /// `mm/yyyy` recurrence end month.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateInput] for a malformed date string, or
    /// [Error::InvalidInstallmentCount] for an out-of-range count.
    pub fn from_form(
        user_id: UserId,
        description: &str,
        source: &str,
        amount: f64,
        date: &str,
        installments: Option<u8>,
        repeat_until: Option<&str>,
    ) -> Result<Self, Error> {
        let date = parse_day_month_year(date)?;
        let repeat_until = repeat_until.map(parse_month_year).transpose()?;

        Ok(Self {
            user_id,
            description: description.to_owned(),
            source: source.to_owned(),
            amount,
            date,
            schedule: Schedule::from_parts(installments, repeat_until, date)?,
        })
    }
}

/// Expand an income intent and insert all produced rows in one transaction.
///
/// Either every row is committed or none are.
///
/// # Errors
/// Returns a validation error from [expand], or [Error::SqlError] if the
/// batch cannot be persisted.
pub fn create_incomes(intent: IncomeIntent, connection: &Connection) -> Result<Vec<Income>, Error> {
    let entries = expand(&intent.description, intent.amount, intent.date, intent.schedule)?;

    let transaction = connection.unchecked_transaction()?;
    let mut rows = Vec::with_capacity(entries.len());

    for entry in &entries {
        let row = transaction
            .prepare(
                "INSERT INTO income (user_id, description, source, amount, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING id, user_id, description, source, amount, date",
            )?
            .query_one(
                (
                    intent.user_id,
                    &entry.description,
                    &intent.source,
                    entry.amount,
                    entry.date,
                ),
                map_income_row,
            )?;

        rows.push(row);
    }

    transaction.commit()?;
    tracing::debug!("created {} income row(s)", rows.len());

    Ok(rows)
}

/// Retrieve an income row by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid row, or
/// [Error::SqlError] on some other SQL error.
pub fn get_income(id: DatabaseId, connection: &Connection) -> Result<Income, Error> {
    let income = connection
        .prepare("SELECT id, user_id, description, source, amount, date FROM income WHERE id = :id")?
        .query_one(&[(":id", &id)], map_income_row)?;

    Ok(income)
}

/// Retrieve a user's income rows dated within `year`, ordered by date.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_incomes_for_year(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<Income>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, description, source, amount, date FROM income
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date ASC, id ASC",
        )?
        .query_map(
            (user_id, year_start(year), year_end(year)),
            map_income_row,
        )?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

/// Overwrite a single income row. Sibling rows from the same expansion are
/// untouched.
///
/// # Errors
/// Returns [Error::EmptyDescription] or [Error::NegativeAmount] for invalid
/// fields, [Error::UpdateMissingRow] if the row does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn update_income(income: &Income, connection: &Connection) -> Result<(), Error> {
    if income.description.trim().is_empty() {
        return Err(Error::EmptyDescription);
    }

    if income.amount < 0.0 {
        return Err(Error::NegativeAmount(income.amount));
    }

    let rows_updated = connection.execute(
        "UPDATE income SET description = ?1, source = ?2, amount = ?3, date = ?4
         WHERE id = ?5 AND user_id = ?6",
        (
            &income.description,
            &income.source,
            income.amount,
            income.date,
            income.id,
            income.user_id,
        ),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingRow);
    }

    Ok(())
}

/// Delete a single income row.
///
/// # Errors
/// Returns [Error::DeleteMissingRow] if the row does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn delete_income(id: DatabaseId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM income WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingRow);
    }

    Ok(())
}

/// Create the income table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_income_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS income (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                source TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_income_row(row: &Row) -> Result<Income, rusqlite::Error> {
    Ok(Income {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        source: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        schedule::Schedule,
        user::{UserId, create_user, delete_user},
    };

    use super::{
        IncomeIntent, create_incomes, delete_income, get_income, get_incomes_for_year,
        update_income,
    };

    fn get_test_connection() -> (Connection, UserId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("Test", &conn).unwrap();
        (conn, user.id)
    }

    fn salary_intent(user_id: UserId, schedule: Schedule) -> IncomeIntent {
        IncomeIntent {
            user_id,
            description: "Salary".to_owned(),
            source: "Work".to_owned(),
            amount: 4200.0,
            date: date!(2026 - 01 - 05),
            schedule,
        }
    }

    #[test]
    fn from_form_parses_day_first_dates() {
        let intent = IncomeIntent::from_form(
            1,
            "Salary",
            "Work",
            4200.0,
            "5/1/2026",
            None,
            Some("06/2026"),
        )
        .unwrap();

        assert_eq!(intent.date, date!(2026 - 01 - 05));
        assert_eq!(intent.schedule, Schedule::MonthlyUntil(date!(2026 - 06 - 01)));
    }

    #[test]
    fn from_form_rejects_month_first_date() {
        let result = IncomeIntent::from_form(1, "Salary", "Work", 4200.0, "01/31/2026", None, None);

        assert!(matches!(result, Err(Error::InvalidDateInput(_, _))));
    }

    #[test]
    fn create_single_income() {
        let (conn, user_id) = get_test_connection();

        let rows = create_incomes(salary_intent(user_id, Schedule::Single), &conn).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 4200.0);
        assert_eq!(get_income(rows[0].id, &conn).unwrap(), rows[0]);
    }

    #[test]
    fn create_recurring_income_produces_one_row_per_month() {
        let (conn, user_id) = get_test_connection();

        let rows = create_incomes(
            salary_intent(user_id, Schedule::MonthlyUntil(date!(2026 - 06 - 01))),
            &conn,
        )
        .unwrap();

        assert_eq!(rows.len(), 6);

        let stored = get_incomes_for_year(user_id, 2026, &conn).unwrap();
        assert_eq!(stored, rows);
        assert_eq!(stored[3].date, date!(2026 - 04 - 05));
    }

    #[test]
    fn create_rejects_invalid_intent_without_inserting() {
        let (conn, user_id) = get_test_connection();

        let mut intent = salary_intent(user_id, Schedule::Single);
        intent.amount = 0.0;

        assert_eq!(
            create_incomes(intent, &conn),
            Err(Error::NonPositiveAmount(0.0))
        );
        assert_eq!(get_incomes_for_year(user_id, 2026, &conn).unwrap(), []);
    }

    #[test]
    fn year_filter_excludes_other_years() {
        let (conn, user_id) = get_test_connection();

        create_incomes(
            salary_intent(user_id, Schedule::MonthlyUntil(date!(2027 - 02 - 01))),
            &conn,
        )
        .unwrap();

        assert_eq!(get_incomes_for_year(user_id, 2026, &conn).unwrap().len(), 12);
        assert_eq!(get_incomes_for_year(user_id, 2027, &conn).unwrap().len(), 2);
    }

    #[test]
    fn update_edits_one_row_only() {
        let (conn, user_id) = get_test_connection();

        let rows = create_incomes(
            salary_intent(user_id, Schedule::MonthlyUntil(date!(2026 - 03 - 01))),
            &conn,
        )
        .unwrap();

        let mut edited = rows[1].clone();
        edited.amount = 5000.0;
        update_income(&edited, &conn).unwrap();

        let stored = get_incomes_for_year(user_id, 2026, &conn).unwrap();
        assert_eq!(stored[1].amount, 5000.0);
        assert_eq!(stored[0].amount, 4200.0);
        assert_eq!(stored[2].amount, 4200.0);
    }

    #[test]
    fn update_missing_row_fails() {
        let (conn, user_id) = get_test_connection();

        let mut row = create_incomes(salary_intent(user_id, Schedule::Single), &conn)
            .unwrap()
            .remove(0);
        row.id += 1;

        assert_eq!(update_income(&row, &conn), Err(Error::UpdateMissingRow));
    }

    #[test]
    fn delete_removes_one_row_only() {
        let (conn, user_id) = get_test_connection();

        let rows = create_incomes(
            salary_intent(user_id, Schedule::MonthlyUntil(date!(2026 - 03 - 01))),
            &conn,
        )
        .unwrap();

        delete_income(rows[0].id, user_id, &conn).unwrap();

        let remaining = get_incomes_for_year(user_id, 2026, &conn).unwrap();
        assert_eq!(remaining, rows[1..]);
    }

    #[test]
    fn delete_missing_row_fails() {
        let (conn, user_id) = get_test_connection();

        assert_eq!(
            delete_income(42, user_id, &conn),
            Err(Error::DeleteMissingRow)
        );
    }

    #[test]
    fn deleting_user_cascades_to_income() {
        let (conn, user_id) = get_test_connection();
        create_incomes(salary_intent(user_id, Schedule::Single), &conn).unwrap();

        delete_user(user_id, &conn).unwrap();

        assert_eq!(get_incomes_for_year(user_id, 2026, &conn).unwrap(), []);
    }
}
