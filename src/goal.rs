//! Savings goals and contributions toward them.
//!
//! A goal is a named target amount. Contributions are not stored on the goal
//! itself: each one becomes an investment row whose product is the goal name
//! and whose asset type is [GOAL_ASSET_TYPE], so goal progress falls out of
//! the same investment rollup the dashboard already runs.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    investment::{Investment, NewInvestment, create_investments},
    schedule::{Schedule, expand},
    user::UserId,
};

/// The asset type marking an investment row as a goal contribution.
pub const GOAL_ASSET_TYPE: &str = "Financial goal";

/// A savings target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// The ID of the goal.
    pub id: DatabaseId,
    /// The user that owns this goal.
    pub user_id: UserId,
    /// The goal's name, e.g. "House deposit".
    pub name: String,
    /// An icon name for display.
    pub icon: Option<String>,
    /// The target amount to save.
    pub target: f64,
}

/// Create a new goal.
///
/// # Errors
/// Returns [Error::EmptyName] if `name` is blank, [Error::NegativeAmount]
/// for a negative target, or [Error::SqlError] on an SQL error.
pub fn create_goal(
    user_id: UserId,
    name: &str,
    icon: Option<&str>,
    target: f64,
    connection: &Connection,
) -> Result<Goal, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    if target < 0.0 {
        return Err(Error::NegativeAmount(target));
    }

    let goal = connection
        .prepare(
            "INSERT INTO goal (user_id, name, icon, target) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, user_id, name, icon, target",
        )?
        .query_one((user_id, name, icon, target), map_goal_row)?;

    Ok(goal)
}

/// Retrieve a goal by its `id`, scoped to its owner.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a goal owned by
/// `user_id`, or [Error::SqlError] on some other SQL error.
pub fn get_goal(id: DatabaseId, user_id: UserId, connection: &Connection) -> Result<Goal, Error> {
    let goal = connection
        .prepare("SELECT id, user_id, name, icon, target FROM goal WHERE id = ?1 AND user_id = ?2")?
        .query_one((id, user_id), map_goal_row)?;

    Ok(goal)
}

/// Retrieve a user's goals, ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_goals(user_id: UserId, connection: &Connection) -> Result<Vec<Goal>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, icon, target FROM goal WHERE user_id = ?1 ORDER BY name ASC",
        )?
        .query_map((user_id,), map_goal_row)?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

/// Overwrite a goal's name, icon, and target.
///
/// Contributions already recorded keep the old product name; renaming a goal
/// disconnects them from its progress.
///
/// # Errors
/// Returns [Error::EmptyName] or [Error::NegativeAmount] for invalid fields,
/// [Error::UpdateMissingRow] if the goal does not exist for this user, or
/// [Error::SqlError] on an SQL error.
pub fn update_goal(goal: &Goal, connection: &Connection) -> Result<(), Error> {
    if goal.name.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    if goal.target < 0.0 {
        return Err(Error::NegativeAmount(goal.target));
    }

    let rows_updated = connection.execute(
        "UPDATE goal SET name = ?1, icon = ?2, target = ?3 WHERE id = ?4 AND user_id = ?5",
        (&goal.name, &goal.icon, goal.target, goal.id, goal.user_id),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingRow);
    }

    Ok(())
}

/// Delete a goal. Contributions already recorded as investment rows remain.
///
/// # Errors
/// Returns [Error::DeleteMissingRow] if the goal does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn delete_goal(id: DatabaseId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM goal WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingRow);
    }

    Ok(())
}

/// Record a contribution toward a goal, as one investment row per month.
///
/// With `repeat_until` set to a month at or after `date`'s month, one
/// contribution is recorded per calendar month through that month,
/// inclusive; otherwise a single row is recorded. Installment splitting does
/// not apply to contributions.
///
/// # Errors
/// Returns [Error::NotFound] if the goal does not exist for this user, a
/// validation error for a non-positive amount, or [Error::SqlError] if the
/// batch cannot be persisted.
pub fn contribute_to_goal(
    goal_id: DatabaseId,
    user_id: UserId,
    amount: f64,
    date: Date,
    repeat_until: Option<Date>,
    connection: &Connection,
) -> Result<Vec<Investment>, Error> {
    let goal = get_goal(goal_id, user_id, connection)?;
    let schedule = Schedule::from_parts(None, repeat_until, date)?;
    let entries = expand(&goal.name, amount, date, schedule)?;

    let contributions = entries
        .into_iter()
        .map(|entry| NewInvestment {
            user_id,
            product: goal.name.clone(),
            company: String::new(),
            amount: entry.amount,
            quantity: 1,
            asset_type: GOAL_ASSET_TYPE.to_owned(),
            yield_amount: 0.0,
            yield_frequency: String::new(),
            date: entry.date,
        })
        .collect();

    create_investments(contributions, connection)
}

/// Create the goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                icon TEXT,
                target REAL NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<Goal, rusqlite::Error> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        icon: row.get(3)?,
        target: row.get(4)?,
    })
}
