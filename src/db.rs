//! Functions for managing the application's database.

use rusqlite::Connection;

use crate::{
    Error, catalog::create_catalog_table, debt::create_debt_table,
    fixed_expense::create_fixed_expense_table, goal::create_goal_table,
    income::create_income_table, investment::create_investment_table, user::create_user_table,
    variable_expense::create_variable_expense_table,
};

/// Create the tables and enable foreign key enforcement.
///
/// Safe to call on a database that already has the tables.
///
/// # Errors
/// Returns [Error::SqlError] if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_catalog_table(&transaction)?;
    create_income_table(&transaction)?;
    create_fixed_expense_table(&transaction)?;
    create_variable_expense_table(&transaction)?;
    create_debt_table(&transaction)?;
    create_investment_table(&transaction)?;
    create_goal_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
