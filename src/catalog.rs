//! User-defined labels: income sources, expense categories, and payment
//! methods.
//!
//! All three kinds share one table and one shape: a name, an optional icon,
//! and an optional annual spending limit. The limit only means something for
//! expense categories, where reports compare the year's actual spending
//! against it, but the column is kept uniform to avoid three near-identical
//! tables.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId, user::UserId};

/// Which dropdown a catalog entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogKind {
    /// Where income comes from, e.g. "Salary".
    IncomeSource,
    /// What an expense was for, e.g. "Groceries".
    ExpenseCategory,
    /// How an expense was paid, e.g. "Credit card".
    PaymentMethod,
}

impl CatalogKind {
    /// The stable string stored in the database for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::IncomeSource => "income_source",
            CatalogKind::ExpenseCategory => "expense_category",
            CatalogKind::PaymentMethod => "payment_method",
        }
    }
}

impl ToSql for CatalogKind {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>, rusqlite::Error> {
        Ok(self.as_str().into())
    }
}

impl FromSql for CatalogKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income_source" => Ok(CatalogKind::IncomeSource),
            "expense_category" => Ok(CatalogKind::ExpenseCategory),
            "payment_method" => Ok(CatalogKind::PaymentMethod),
            other => Err(FromSqlError::Other(
                format!("invalid catalog kind {other}").into(),
            )),
        }
    }
}

/// A named label a user picks when recording an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The ID of the catalog entry.
    pub id: DatabaseId,
    /// The user that owns this entry.
    pub user_id: UserId,
    /// Which dropdown the entry belongs to.
    pub kind: CatalogKind,
    /// The display name.
    pub name: String,
    /// An icon name for display.
    pub icon: Option<String>,
    /// The yearly spending limit, for expense categories that have one.
    pub annual_limit: Option<f64>,
}

/// Create a catalog entry.
///
/// # Errors
/// Returns [Error::EmptyName] if `name` is blank, [Error::NegativeAmount]
/// for a negative annual limit, or [Error::SqlError] on an SQL error.
pub fn create_catalog_entry(
    user_id: UserId,
    kind: CatalogKind,
    name: &str,
    icon: Option<&str>,
    annual_limit: Option<f64>,
    connection: &Connection,
) -> Result<CatalogEntry, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    if let Some(limit) = annual_limit
        && limit < 0.0
    {
        return Err(Error::NegativeAmount(limit));
    }

    let entry = connection
        .prepare(
            "INSERT INTO catalog (user_id, kind, name, icon, annual_limit)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, kind, name, icon, annual_limit",
        )?
        .query_one((user_id, kind, name, icon, annual_limit), map_catalog_row)?;

    Ok(entry)
}

/// Retrieve a catalog entry by its `id`, scoped to its owner.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an entry owned by
/// `user_id`, or [Error::SqlError] on some other SQL error.
pub fn get_catalog_entry(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<CatalogEntry, Error> {
    let entry = connection
        .prepare(
            "SELECT id, user_id, kind, name, icon, annual_limit FROM catalog
             WHERE id = ?1 AND user_id = ?2",
        )?
        .query_one((id, user_id), map_catalog_row)?;

    Ok(entry)
}

/// Retrieve a user's catalog entries of one kind, ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_catalog_entries(
    user_id: UserId,
    kind: CatalogKind,
    connection: &Connection,
) -> Result<Vec<CatalogEntry>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, kind, name, icon, annual_limit FROM catalog
             WHERE user_id = ?1 AND kind = ?2
             ORDER BY name ASC",
        )?
        .query_map((user_id, kind), map_catalog_row)?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

/// Overwrite a catalog entry's name, icon, and annual limit. The kind cannot
/// change.
///
/// Ledger rows store the label text, not the entry ID, so renaming an entry
/// does not rewrite existing rows.
///
/// # Errors
/// Returns [Error::EmptyName] or [Error::NegativeAmount] for invalid fields,
/// [Error::UpdateMissingRow] if the entry does not exist for this user, or
/// [Error::SqlError] on an SQL error.
pub fn update_catalog_entry(entry: &CatalogEntry, connection: &Connection) -> Result<(), Error> {
    if entry.name.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    if let Some(limit) = entry.annual_limit
        && limit < 0.0
    {
        return Err(Error::NegativeAmount(limit));
    }

    let rows_updated = connection.execute(
        "UPDATE catalog SET name = ?1, icon = ?2, annual_limit = ?3
         WHERE id = ?4 AND user_id = ?5 AND kind = ?6",
        (
            &entry.name,
            &entry.icon,
            entry.annual_limit,
            entry.id,
            entry.user_id,
            entry.kind,
        ),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingRow);
    }

    Ok(())
}

/// Delete a catalog entry. Ledger rows that used the label keep its text.
///
/// # Errors
/// Returns [Error::DeleteMissingRow] if the entry does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn delete_catalog_entry(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM catalog WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingRow);
    }

    Ok(())
}

/// Create the catalog table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_catalog_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS catalog (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                icon TEXT,
                annual_limit REAL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_catalog_row(row: &Row) -> Result<CatalogEntry, rusqlite::Error> {
    Ok(CatalogEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        name: row.get(3)?,
        icon: row.get(4)?,
        annual_limit: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        user::{UserId, create_user},
    };

    use super::{
        CatalogKind, create_catalog_entry, delete_catalog_entry, get_catalog_entries,
        get_catalog_entry, update_catalog_entry,
    };

    fn get_test_connection() -> (Connection, UserId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("Test", &conn).unwrap();
        (conn, user.id)
    }

    #[test]
    fn create_and_get_entry() {
        let (conn, user_id) = get_test_connection();

        let entry = create_catalog_entry(
            user_id,
            CatalogKind::ExpenseCategory,
            "Groceries",
            Some("Cart"),
            Some(6000.0),
            &conn,
        )
        .unwrap();

        assert_eq!(get_catalog_entry(entry.id, user_id, &conn).unwrap(), entry);
    }

    #[test]
    fn list_filters_by_kind_and_orders_by_name() {
        let (conn, user_id) = get_test_connection();

        create_catalog_entry(user_id, CatalogKind::ExpenseCategory, "Transport", None, None, &conn)
            .unwrap();
        create_catalog_entry(user_id, CatalogKind::ExpenseCategory, "Food", None, None, &conn)
            .unwrap();
        create_catalog_entry(user_id, CatalogKind::PaymentMethod, "Cash", None, None, &conn)
            .unwrap();

        let names: Vec<String> =
            get_catalog_entries(user_id, CatalogKind::ExpenseCategory, &conn)
                .unwrap()
                .into_iter()
                .map(|entry| entry.name)
                .collect();

        assert_eq!(names, vec!["Food", "Transport"]);
    }

    #[test]
    fn create_rejects_blank_name() {
        let (conn, user_id) = get_test_connection();

        assert_eq!(
            create_catalog_entry(user_id, CatalogKind::IncomeSource, "  ", None, None, &conn),
            Err(Error::EmptyName)
        );
    }

    #[test]
    fn create_rejects_negative_limit() {
        let (conn, user_id) = get_test_connection();

        assert_eq!(
            create_catalog_entry(
                user_id,
                CatalogKind::ExpenseCategory,
                "Food",
                None,
                Some(-1.0),
                &conn
            ),
            Err(Error::NegativeAmount(-1.0))
        );
    }

    #[test]
    fn update_changes_limit() {
        let (conn, user_id) = get_test_connection();
        let mut entry = create_catalog_entry(
            user_id,
            CatalogKind::ExpenseCategory,
            "Food",
            None,
            Some(6000.0),
            &conn,
        )
        .unwrap();

        entry.annual_limit = Some(7200.0);
        update_catalog_entry(&entry, &conn).unwrap();

        assert_eq!(
            get_catalog_entry(entry.id, user_id, &conn)
                .unwrap()
                .annual_limit,
            Some(7200.0)
        );
    }

    #[test]
    fn delete_removes_entry() {
        let (conn, user_id) = get_test_connection();
        let entry =
            create_catalog_entry(user_id, CatalogKind::PaymentMethod, "Cash", None, None, &conn)
                .unwrap();

        delete_catalog_entry(entry.id, user_id, &conn).unwrap();

        assert_eq!(
            get_catalog_entry(entry.id, user_id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_catalog_entry(entry.id, user_id, &conn),
            Err(Error::DeleteMissingRow)
        );
    }
}
