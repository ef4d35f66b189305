//! Investment ledger rows and their database queries.
//!
//! Investments track assets bought: product, company, unit amount, quantity,
//! and an optional yield. Savings-goal contributions are stored here too, as
//! rows with a dedicated asset type (see [crate::goal]).

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    date_input::{year_end, year_start},
    money::round_to_cents,
    user::UserId,
};

/// An asset purchase or a savings-goal contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    /// The ID of the investment row.
    pub id: DatabaseId,
    /// The user that owns this row.
    pub user_id: UserId,
    /// The product bought, e.g. a ticker or fund name.
    pub product: String,
    /// The company or broker behind the product.
    pub company: String,
    /// The unit amount paid.
    pub amount: f64,
    /// How many units were bought.
    pub quantity: i64,
    /// The asset type label, e.g. "Stock".
    pub asset_type: String,
    /// The yield paid per period, if any.
    pub yield_amount: f64,
    /// How often the yield is paid, e.g. "Monthly". Empty when not
    /// applicable.
    pub yield_frequency: String,
    /// When the purchase happened.
    pub date: Date,
}

impl Investment {
    /// The total position value: unit amount times quantity, to the cent.
    pub fn total(&self) -> f64 {
        round_to_cents(self.amount * self.quantity as f64)
    }
}

/// The fields of a new investment row, before it has an ID.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvestment {
    /// The user recording the investment.
    pub user_id: UserId,
    /// The product bought.
    pub product: String,
    /// The company or broker behind the product.
    pub company: String,
    /// The unit amount paid.
    pub amount: f64,
    /// How many units were bought.
    pub quantity: i64,
    /// The asset type label.
    pub asset_type: String,
    /// The yield paid per period, if any.
    pub yield_amount: f64,
    /// How often the yield is paid.
    pub yield_frequency: String,
    /// When the purchase happened.
    pub date: Date,
}

/// Insert a single investment row.
///
/// # Errors
/// Returns [Error::EmptyDescription] if the product is blank,
/// [Error::NegativeAmount] for a negative amount or yield,
/// [Error::InvalidQuantity] for a quantity below 1, or [Error::SqlError] on
/// an SQL error.
pub fn create_investment(
    investment: NewInvestment,
    connection: &Connection,
) -> Result<Investment, Error> {
    validate(&investment)?;

    let mut rows = insert_investments(&[investment], connection)?;

    Ok(rows.remove(0))
}

/// Insert a batch of investment rows in one transaction.
///
/// Used by goal contributions, where one submission can expand into a row
/// per month. Either every row is committed or none are.
///
/// # Errors
/// Returns a validation error for any invalid row (checked before anything
/// is inserted), or [Error::SqlError] if the batch cannot be persisted.
pub fn create_investments(
    investments: Vec<NewInvestment>,
    connection: &Connection,
) -> Result<Vec<Investment>, Error> {
    for investment in &investments {
        validate(investment)?;
    }

    insert_investments(&investments, connection)
}

fn insert_investments(
    investments: &[NewInvestment],
    connection: &Connection,
) -> Result<Vec<Investment>, Error> {
    let transaction = connection.unchecked_transaction()?;
    let mut rows = Vec::with_capacity(investments.len());

    for investment in investments {
        let row = transaction
            .prepare(
                "INSERT INTO investment
                    (user_id, product, company, amount, quantity, asset_type, yield_amount,
                     yield_frequency, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 RETURNING id, user_id, product, company, amount, quantity, asset_type,
                           yield_amount, yield_frequency, date",
            )?
            .query_one(
                (
                    investment.user_id,
                    &investment.product,
                    &investment.company,
                    investment.amount,
                    investment.quantity,
                    &investment.asset_type,
                    investment.yield_amount,
                    &investment.yield_frequency,
                    investment.date,
                ),
                map_investment_row,
            )?;

        rows.push(row);
    }

    transaction.commit()?;
    tracing::debug!("created {} investment row(s)", rows.len());

    Ok(rows)
}

fn validate(investment: &NewInvestment) -> Result<(), Error> {
    if investment.product.trim().is_empty() {
        return Err(Error::EmptyDescription);
    }

    if investment.amount < 0.0 {
        return Err(Error::NegativeAmount(investment.amount));
    }

    if investment.yield_amount < 0.0 {
        return Err(Error::NegativeAmount(investment.yield_amount));
    }

    if investment.quantity < 1 {
        return Err(Error::InvalidQuantity(investment.quantity));
    }

    Ok(())
}

/// Retrieve an investment row by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid row, or
/// [Error::SqlError] on some other SQL error.
pub fn get_investment(id: DatabaseId, connection: &Connection) -> Result<Investment, Error> {
    let investment = connection
        .prepare(
            "SELECT id, user_id, product, company, amount, quantity, asset_type, yield_amount,
                    yield_frequency, date
             FROM investment WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_investment_row)?;

    Ok(investment)
}

/// Retrieve a user's investment rows dated within `year`, ordered by date.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_investments_for_year(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<Investment>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, product, company, amount, quantity, asset_type, yield_amount,
                    yield_frequency, date
             FROM investment
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date ASC, id ASC",
        )?
        .query_map(
            (user_id, year_start(year), year_end(year)),
            map_investment_row,
        )?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

/// Overwrite a single investment row.
///
/// # Errors
/// Returns a validation error for invalid fields, [Error::UpdateMissingRow]
/// if the row does not exist for this user, or [Error::SqlError] on an SQL
/// error.
pub fn update_investment(investment: &Investment, connection: &Connection) -> Result<(), Error> {
    validate(&NewInvestment {
        user_id: investment.user_id,
        product: investment.product.clone(),
        company: investment.company.clone(),
        amount: investment.amount,
        quantity: investment.quantity,
        asset_type: investment.asset_type.clone(),
        yield_amount: investment.yield_amount,
        yield_frequency: investment.yield_frequency.clone(),
        date: investment.date,
    })?;

    let rows_updated = connection.execute(
        "UPDATE investment
         SET product = ?1, company = ?2, amount = ?3, quantity = ?4, asset_type = ?5,
             yield_amount = ?6, yield_frequency = ?7, date = ?8
         WHERE id = ?9 AND user_id = ?10",
        (
            &investment.product,
            &investment.company,
            investment.amount,
            investment.quantity,
            &investment.asset_type,
            investment.yield_amount,
            &investment.yield_frequency,
            investment.date,
            investment.id,
            investment.user_id,
        ),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingRow);
    }

    Ok(())
}

/// Delete a single investment row.
///
/// # Errors
/// Returns [Error::DeleteMissingRow] if the row does not exist for this
/// user, or [Error::SqlError] on an SQL error.
pub fn delete_investment(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM investment WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_deleted == 0 {
        return Err(Error::DeleteMissingRow);
    }

    Ok(())
}

/// Create the investment table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_investment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS investment (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                product TEXT NOT NULL,
                company TEXT NOT NULL,
                amount REAL NOT NULL,
                quantity INTEGER NOT NULL,
                asset_type TEXT NOT NULL,
                yield_amount REAL NOT NULL,
                yield_frequency TEXT NOT NULL,
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_investment_row(row: &Row) -> Result<Investment, rusqlite::Error> {
    Ok(Investment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        product: row.get(2)?,
        company: row.get(3)?,
        amount: row.get(4)?,
        quantity: row.get(5)?,
        asset_type: row.get(6)?,
        yield_amount: row.get(7)?,
        yield_frequency: row.get(8)?,
        date: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        user::{UserId, create_user},
    };

    use super::{
        NewInvestment, create_investment, delete_investment, get_investment,
        get_investments_for_year, update_investment,
    };

    fn get_test_connection() -> (Connection, UserId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("Test", &conn).unwrap();
        (conn, user.id)
    }

    fn stock_purchase(user_id: UserId) -> NewInvestment {
        NewInvestment {
            user_id,
            product: "VT".to_owned(),
            company: "Vanguard".to_owned(),
            amount: 110.5,
            quantity: 4,
            asset_type: "ETF".to_owned(),
            yield_amount: 0.8,
            yield_frequency: "Quarterly".to_owned(),
            date: date!(2026 - 03 - 09),
        }
    }

    #[test]
    fn create_and_get_investment() {
        let (conn, user_id) = get_test_connection();

        let investment = create_investment(stock_purchase(user_id), &conn).unwrap();

        assert_eq!(get_investment(investment.id, &conn).unwrap(), investment);
    }

    #[test]
    fn total_multiplies_amount_by_quantity() {
        let (conn, user_id) = get_test_connection();

        let investment = create_investment(stock_purchase(user_id), &conn).unwrap();

        assert_eq!(investment.total(), 442.0);
    }

    #[test]
    fn create_rejects_zero_quantity() {
        let (conn, user_id) = get_test_connection();

        let mut purchase = stock_purchase(user_id);
        purchase.quantity = 0;

        assert_eq!(
            create_investment(purchase, &conn),
            Err(Error::InvalidQuantity(0))
        );
    }

    #[test]
    fn create_rejects_blank_product() {
        let (conn, user_id) = get_test_connection();

        let mut purchase = stock_purchase(user_id);
        purchase.product = " ".to_owned();

        assert_eq!(
            create_investment(purchase, &conn),
            Err(Error::EmptyDescription)
        );
    }

    #[test]
    fn update_and_delete_single_row() {
        let (conn, user_id) = get_test_connection();
        let mut investment = create_investment(stock_purchase(user_id), &conn).unwrap();

        investment.quantity = 10;
        update_investment(&investment, &conn).unwrap();
        assert_eq!(get_investment(investment.id, &conn).unwrap().quantity, 10);

        delete_investment(investment.id, user_id, &conn).unwrap();
        assert_eq!(
            get_investments_for_year(user_id, 2026, &conn).unwrap(),
            []
        );
    }
}
