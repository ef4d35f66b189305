//! The user that owns a set of ledger rows.
//!
//! Every ledger table carries a `user_id` foreign key with `ON DELETE
//! CASCADE`; deleting a user removes their rows and nothing else. There is
//! no authentication here, just ownership.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId};

/// Alias for the integer type used for user IDs.
pub type UserId = DatabaseId;

/// The owner of a set of ledger rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The ID of the user.
    pub id: UserId,
    /// The user's display name.
    pub name: String,
}

/// Create a new user.
///
/// # Errors
/// Returns [Error::EmptyName] if `name` is blank, or [Error::SqlError] on an
/// SQL error.
pub fn create_user(name: &str, connection: &Connection) -> Result<User, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    let user = connection
        .prepare("INSERT INTO user (name) VALUES (?1) RETURNING id, name")?
        .query_one((name,), map_user_row)?;

    Ok(user)
}

/// Retrieve a user by their `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid user, or
/// [Error::SqlError] on some other SQL error.
pub fn get_user(id: UserId, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare("SELECT id, name FROM user WHERE id = :id")?
        .query_one(&[(":id", &id)], map_user_row)?;

    Ok(user)
}

/// Delete a user and, via foreign key cascade, all of their ledger rows.
///
/// # Errors
/// Returns [Error::DeleteMissingRow] if `id` does not refer to a valid user,
/// or [Error::SqlError] on an SQL error.
pub fn delete_user(id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM user WHERE id = ?1", (id,))?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingRow);
    }

    Ok(())
}

/// Create the user table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}
