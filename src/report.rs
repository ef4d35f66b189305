//! Yearly rollups over the ledger: monthly balances, annual limit usage per
//! catalog kind, and goal progress.
//!
//! Everything here is computed from the year-filtered queries each entity
//! module exposes. Fixed expenses and debts are bucketed by due date, income
//! by its occurrence date, and variable expenses by their balance month, so
//! an installment purchase weighs on the months its parts were assigned to
//! rather than the day the card was swiped.
//!
//! Each catalog kind gets the same rollup: the year's actual total per entry
//! compared against the entry's annual limit as a whole percentage. For
//! income sources the limit is an annual target rather than a cap, but the
//! arithmetic is identical.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    catalog::{CatalogKind, get_catalog_entries},
    database_id::DatabaseId,
    debt::get_debts_for_year,
    fixed_expense::get_fixed_expenses_for_year,
    goal::{GOAL_ASSET_TYPE, get_goals},
    income::get_incomes_for_year,
    investment::get_investments_for_year,
    money::round_to_cents,
    user::UserId,
    variable_expense::get_variable_expenses_for_year,
};

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBalance {
    /// The calendar month, 1 through 12.
    pub month: u8,
    /// Total income received this month.
    pub income: f64,
    /// Total expenses attributed to this month.
    pub expenses: f64,
}

/// How much of a catalog entry's annual limit the year has used.
///
/// For income sources the limit is an annual target; the percentage then
/// reads as progress toward it rather than consumption of a cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitUsage {
    /// The ID of the catalog entry.
    pub id: DatabaseId,
    /// The catalog entry's name.
    pub name: String,
    /// Total attributed to this entry during the year.
    pub actual: f64,
    /// The annual limit or target, if one is set.
    pub limit: Option<f64>,
    /// The actual total as a whole percentage of the limit, 0 when no limit
    /// is set.
    pub percent: i64,
}

/// How far along a savings goal is, over one year's contributions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    /// The ID of the goal.
    pub id: DatabaseId,
    /// The goal's name.
    pub name: String,
    /// An icon name for display.
    pub icon: Option<String>,
    /// The target amount.
    pub target: f64,
    /// Total contributed during the year.
    pub invested: f64,
    /// What is left to reach the target.
    pub remaining: f64,
    /// Contributions as a whole percentage of the target, 0 for a zero
    /// target.
    pub percent: i64,
}

/// The full dashboard payload for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    /// The year the summary covers.
    pub year: i32,
    /// Per-month income and expense totals, always 12 entries.
    pub monthly_balances: Vec<MonthlyBalance>,
    /// Total income for the year.
    pub total_income: f64,
    /// Total expenses for the year.
    pub total_expenses: f64,
    /// Annual target progress per income source.
    pub source_usage: Vec<LimitUsage>,
    /// Annual limit usage per expense category.
    pub category_usage: Vec<LimitUsage>,
    /// Annual limit usage per payment method.
    pub payment_method_usage: Vec<LimitUsage>,
    /// Progress toward each savings goal.
    pub goal_progress: Vec<GoalProgress>,
}

/// Express `actual` as a whole percentage of `limit`.
///
/// Returns 0 when no limit is set or the limit is not positive, so a
/// category without a budget never shows as overspent.
pub fn percent_of_limit(actual: f64, limit: Option<f64>) -> i64 {
    match limit {
        Some(limit) if limit > 0.0 => (actual / limit * 100.0).round() as i64,
        _ => 0,
    }
}

/// Compute per-month income and expense totals for `year`.
///
/// Always returns 12 entries, one per calendar month, with zero totals for
/// quiet months. Expenses sum fixed expenses and debts by due date and
/// variable expenses by balance month.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn monthly_balances(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<MonthlyBalance>, Error> {
    let mut income = [0.0f64; 12];
    let mut expenses = [0.0f64; 12];

    for row in get_incomes_for_year(user_id, year, connection)? {
        income[u8::from(row.date.month()) as usize - 1] += row.amount;
    }

    for row in get_fixed_expenses_for_year(user_id, year, connection)? {
        expenses[u8::from(row.due_date.month()) as usize - 1] += row.amount;
    }

    for row in get_debts_for_year(user_id, year, connection)? {
        expenses[u8::from(row.due_date.month()) as usize - 1] += row.amount;
    }

    for row in get_variable_expenses_for_year(user_id, year, connection)? {
        expenses[u8::from(row.balance_month.month()) as usize - 1] += row.amount;
    }

    Ok((0..12)
        .map(|index| MonthlyBalance {
            month: index as u8 + 1,
            income: round_to_cents(income[index]),
            expenses: round_to_cents(expenses[index]),
        })
        .collect())
}

/// Compare the year's income per source against each source's annual target,
/// ordered by source name.
///
/// Every income source in the catalog gets an entry, including ones with no
/// income and ones with no target.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn source_usage(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<LimitUsage>, Error> {
    let actuals = group_totals(
        get_incomes_for_year(user_id, year, connection)?
            .into_iter()
            .map(|row| (row.source, row.amount)),
    );

    usage_for_kind(user_id, CatalogKind::IncomeSource, &actuals, connection)
}

/// Compare the year's spending per expense category against each category's
/// annual limit, ordered by category name.
///
/// Fixed and variable expenses both count. Every expense category in the
/// catalog gets an entry, including ones with no spending and ones with no
/// limit.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn category_usage(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<LimitUsage>, Error> {
    let actuals = group_totals(
        get_fixed_expenses_for_year(user_id, year, connection)?
            .into_iter()
            .map(|row| (row.category, row.amount))
            .chain(
                get_variable_expenses_for_year(user_id, year, connection)?
                    .into_iter()
                    .map(|row| (row.category, row.amount)),
            ),
    );

    usage_for_kind(user_id, CatalogKind::ExpenseCategory, &actuals, connection)
}

/// Compare the year's spending per payment method against each method's
/// annual limit, ordered by method name.
///
/// Fixed and variable expenses both count; rows without a recorded payment
/// method are skipped. Every payment method in the catalog gets an entry.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn payment_method_usage(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<LimitUsage>, Error> {
    let fixed = get_fixed_expenses_for_year(user_id, year, connection)?
        .into_iter()
        .filter_map(|row| row.payment_method.map(|method| (method, row.amount)));
    let variable = get_variable_expenses_for_year(user_id, year, connection)?
        .into_iter()
        .filter_map(|row| row.payment_method.map(|method| (method, row.amount)));
    let actuals = group_totals(fixed.chain(variable));

    usage_for_kind(user_id, CatalogKind::PaymentMethod, &actuals, connection)
}

/// Compute each goal's progress from the year's contribution rows.
///
/// A contribution counts toward a goal when its asset type marks it as a
/// goal contribution and its product matches the goal's name exactly.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn goal_progress(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<GoalProgress>, Error> {
    let contributions: Vec<_> = get_investments_for_year(user_id, year, connection)?
        .into_iter()
        .filter(|row| row.asset_type == GOAL_ASSET_TYPE)
        .collect();

    let progress = get_goals(user_id, connection)?
        .into_iter()
        .map(|goal| {
            let invested = round_to_cents(
                contributions
                    .iter()
                    .filter(|row| row.product == goal.name)
                    .map(|row| row.total())
                    .sum(),
            );

            GoalProgress {
                id: goal.id,
                name: goal.name,
                icon: goal.icon,
                invested,
                remaining: round_to_cents(goal.target - invested),
                percent: percent_of_limit(invested, Some(goal.target)),
                target: goal.target,
            }
        })
        .collect();

    Ok(progress)
}

/// Build the full dashboard payload for `year`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn summarize_year(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<YearSummary, Error> {
    let monthly = monthly_balances(user_id, year, connection)?;
    let total_income = round_to_cents(monthly.iter().map(|month| month.income).sum());
    let total_expenses = round_to_cents(monthly.iter().map(|month| month.expenses).sum());

    Ok(YearSummary {
        year,
        total_income,
        total_expenses,
        source_usage: source_usage(user_id, year, connection)?,
        category_usage: category_usage(user_id, year, connection)?,
        payment_method_usage: payment_method_usage(user_id, year, connection)?,
        goal_progress: goal_progress(user_id, year, connection)?,
        monthly_balances: monthly,
    })
}

fn usage_for_kind(
    user_id: UserId,
    kind: CatalogKind,
    actuals: &[(String, f64)],
    connection: &Connection,
) -> Result<Vec<LimitUsage>, Error> {
    let usage = get_catalog_entries(user_id, kind, connection)?
        .into_iter()
        .map(|entry| {
            let actual = actuals
                .iter()
                .find(|(name, _)| *name == entry.name)
                .map(|(_, total)| *total)
                .unwrap_or(0.0);

            LimitUsage {
                id: entry.id,
                name: entry.name,
                actual,
                limit: entry.annual_limit,
                percent: percent_of_limit(actual, entry.annual_limit),
            }
        })
        .collect();

    Ok(usage)
}

fn group_totals(amounts: impl Iterator<Item = (String, f64)>) -> Vec<(String, f64)> {
    let mut groups: Vec<(String, f64)> = Vec::new();

    for (name, amount) in amounts {
        match groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, total)) => *total += amount,
            None => groups.push((name, amount)),
        }
    }

    for (_, total) in &mut groups {
        *total = round_to_cents(*total);
    }

    groups
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        catalog::{CatalogKind, create_catalog_entry},
        db::initialize,
        debt::{DebtIntent, create_debts},
        fixed_expense::{FixedExpenseIntent, create_fixed_expenses},
        goal::{contribute_to_goal, create_goal},
        income::{IncomeIntent, create_incomes},
        schedule::Schedule,
        status::PaymentStatus,
        user::{UserId, create_user},
        variable_expense::{VariableExpenseIntent, create_variable_expenses},
    };

    use super::{
        category_usage, goal_progress, monthly_balances, payment_method_usage, percent_of_limit,
        source_usage, summarize_year,
    };

    fn get_test_connection() -> (Connection, UserId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("Test", &conn).unwrap();
        (conn, user.id)
    }

    fn record_salary(user_id: UserId, schedule: Schedule, conn: &Connection) {
        create_incomes(
            IncomeIntent {
                user_id,
                description: "Salary".to_owned(),
                source: "Work".to_owned(),
                amount: 4000.0,
                date: date!(2026 - 01 - 05),
                schedule,
            },
            conn,
        )
        .unwrap();
    }

    #[test]
    fn percent_is_rounded_half_away_from_zero() {
        assert_eq!(percent_of_limit(543.0, Some(1086.0)), 50);
        assert_eq!(percent_of_limit(100.0, Some(300.0)), 33);
        assert_eq!(percent_of_limit(400.0, Some(300.0)), 133);
    }

    #[test]
    fn percent_is_zero_without_a_positive_limit() {
        assert_eq!(percent_of_limit(543.0, None), 0);
        assert_eq!(percent_of_limit(543.0, Some(0.0)), 0);
    }

    #[test]
    fn monthly_balances_cover_all_twelve_months() {
        let (conn, user_id) = get_test_connection();
        record_salary(user_id, Schedule::MonthlyUntil(date!(2026 - 03 - 01)), &conn);

        let months = monthly_balances(user_id, 2026, &conn).unwrap();

        assert_eq!(months.len(), 12);
        assert_eq!(months[0].month, 1);
        assert_eq!(months[0].income, 4000.0);
        assert_eq!(months[2].income, 4000.0);
        assert_eq!(months[3].income, 0.0);
        assert!(months.iter().all(|month| month.expenses == 0.0));
    }

    #[test]
    fn expenses_combine_fixed_variable_and_debt_rows() {
        let (conn, user_id) = get_test_connection();

        create_fixed_expenses(
            FixedExpenseIntent {
                user_id,
                description: "Rent".to_owned(),
                category: "Housing".to_owned(),
                amount: 1800.0,
                due_date: date!(2026 - 02 - 01),
                status: PaymentStatus::Pending,
                paid_on: None,
                payment_method: None,
                schedule: Schedule::Single,
            },
            &conn,
        )
        .unwrap();

        create_debts(
            DebtIntent {
                user_id,
                description: "Car loan".to_owned(),
                creditor: "Bank".to_owned(),
                amount: 450.0,
                due_date: date!(2026 - 02 - 10),
                status: PaymentStatus::Pending,
                schedule: Schedule::Single,
            },
            &conn,
        )
        .unwrap();

        // Bought in January, bucketed into February.
        create_variable_expenses(
            VariableExpenseIntent {
                user_id,
                description: "Groceries".to_owned(),
                category: "Food".to_owned(),
                amount: 320.5,
                date: date!(2026 - 01 - 28),
                payment_method: None,
                balance_month: date!(2026 - 02 - 01),
                schedule: Schedule::Single,
            },
            &conn,
        )
        .unwrap();

        let months = monthly_balances(user_id, 2026, &conn).unwrap();

        assert_eq!(months[0].expenses, 0.0);
        assert_eq!(months[1].expenses, 2570.5);
    }

    #[test]
    fn source_usage_compares_income_against_annual_target() {
        let (conn, user_id) = get_test_connection();
        create_catalog_entry(
            user_id,
            CatalogKind::IncomeSource,
            "Work",
            None,
            Some(50000.0),
            &conn,
        )
        .unwrap();
        create_catalog_entry(user_id, CatalogKind::IncomeSource, "Side job", None, None, &conn)
            .unwrap();

        record_salary(user_id, Schedule::MonthlyUntil(date!(2026 - 12 - 01)), &conn);
        create_incomes(
            IncomeIntent {
                user_id,
                description: "Tutoring".to_owned(),
                source: "Side job".to_owned(),
                amount: 150.0,
                date: date!(2026 - 01 - 20),
                schedule: Schedule::Single,
            },
            &conn,
        )
        .unwrap();

        let usage = source_usage(user_id, 2026, &conn).unwrap();

        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].name, "Side job");
        assert_eq!(usage[0].actual, 150.0);
        assert_eq!(usage[0].percent, 0);
        assert_eq!(usage[1].name, "Work");
        assert_eq!(usage[1].actual, 48000.0);
        assert_eq!(usage[1].percent, 96);
    }

    #[test]
    fn category_usage_reports_every_category() {
        let (conn, user_id) = get_test_connection();
        create_catalog_entry(
            user_id,
            CatalogKind::ExpenseCategory,
            "Food",
            None,
            Some(1086.0),
            &conn,
        )
        .unwrap();
        create_catalog_entry(user_id, CatalogKind::ExpenseCategory, "Transport", None, None, &conn)
            .unwrap();

        create_variable_expenses(
            VariableExpenseIntent {
                user_id,
                description: "Groceries".to_owned(),
                category: "Food".to_owned(),
                amount: 543.0,
                date: date!(2026 - 03 - 02),
                payment_method: None,
                balance_month: date!(2026 - 03 - 01),
                schedule: Schedule::Single,
            },
            &conn,
        )
        .unwrap();

        let usage = category_usage(user_id, 2026, &conn).unwrap();

        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].name, "Food");
        assert_eq!(usage[0].actual, 543.0);
        assert_eq!(usage[0].percent, 50);
        assert_eq!(usage[1].name, "Transport");
        assert_eq!(usage[1].actual, 0.0);
        assert_eq!(usage[1].percent, 0);
    }

    #[test]
    fn payment_method_usage_combines_fixed_and_variable_spending() {
        let (conn, user_id) = get_test_connection();
        create_catalog_entry(
            user_id,
            CatalogKind::PaymentMethod,
            "Credit card",
            None,
            Some(1000.0),
            &conn,
        )
        .unwrap();
        create_catalog_entry(user_id, CatalogKind::PaymentMethod, "Cash", None, None, &conn)
            .unwrap();

        create_fixed_expenses(
            FixedExpenseIntent {
                user_id,
                description: "Internet".to_owned(),
                category: "Utilities".to_owned(),
                amount: 300.0,
                due_date: date!(2026 - 04 - 10),
                status: PaymentStatus::Pending,
                paid_on: None,
                payment_method: Some("Credit card".to_owned()),
                schedule: Schedule::Single,
            },
            &conn,
        )
        .unwrap();
        create_variable_expenses(
            VariableExpenseIntent {
                user_id,
                description: "Fuel".to_owned(),
                category: "Transport".to_owned(),
                amount: 200.0,
                date: date!(2026 - 04 - 12),
                payment_method: Some("Credit card".to_owned()),
                balance_month: date!(2026 - 04 - 01),
                schedule: Schedule::Single,
            },
            &conn,
        )
        .unwrap();
        // No recorded payment method, so it counts toward no entry.
        create_variable_expenses(
            VariableExpenseIntent {
                user_id,
                description: "Market".to_owned(),
                category: "Food".to_owned(),
                amount: 80.0,
                date: date!(2026 - 04 - 13),
                payment_method: None,
                balance_month: date!(2026 - 04 - 01),
                schedule: Schedule::Single,
            },
            &conn,
        )
        .unwrap();

        let usage = payment_method_usage(user_id, 2026, &conn).unwrap();

        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].name, "Cash");
        assert_eq!(usage[0].actual, 0.0);
        assert_eq!(usage[0].percent, 0);
        assert_eq!(usage[1].name, "Credit card");
        assert_eq!(usage[1].actual, 500.0);
        assert_eq!(usage[1].percent, 50);
    }

    #[test]
    fn goal_progress_sums_contributions_by_name() {
        let (conn, user_id) = get_test_connection();
        let goal = create_goal(user_id, "House", None, 200000.0, &conn).unwrap();
        create_goal(user_id, "Wedding", None, 50000.0, &conn).unwrap();

        contribute_to_goal(
            goal.id,
            user_id,
            500.0,
            date!(2026 - 01 - 15),
            Some(date!(2026 - 04 - 01)),
            &conn,
        )
        .unwrap();

        let progress = goal_progress(user_id, 2026, &conn).unwrap();

        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].name, "House");
        assert_eq!(progress[0].invested, 2000.0);
        assert_eq!(progress[0].remaining, 198000.0);
        assert_eq!(progress[0].percent, 1);
        assert_eq!(progress[1].invested, 0.0);
        assert_eq!(progress[1].remaining, 50000.0);
    }

    #[test]
    fn summary_rolls_up_every_catalog_kind() {
        let (conn, user_id) = get_test_connection();
        create_catalog_entry(
            user_id,
            CatalogKind::IncomeSource,
            "Work",
            None,
            Some(50000.0),
            &conn,
        )
        .unwrap();
        create_catalog_entry(
            user_id,
            CatalogKind::ExpenseCategory,
            "Food",
            None,
            Some(7200.0),
            &conn,
        )
        .unwrap();
        create_catalog_entry(user_id, CatalogKind::PaymentMethod, "Cash", None, None, &conn)
            .unwrap();

        record_salary(user_id, Schedule::MonthlyUntil(date!(2026 - 12 - 01)), &conn);

        let summary = summarize_year(user_id, 2026, &conn).unwrap();

        assert_eq!(summary.year, 2026);
        assert_eq!(summary.total_income, 48000.0);
        assert_eq!(summary.total_expenses, 0.0);
        assert_eq!(summary.monthly_balances.len(), 12);
        assert_eq!(summary.source_usage.len(), 1);
        assert_eq!(summary.source_usage[0].percent, 96);
        assert_eq!(summary.category_usage.len(), 1);
        assert_eq!(summary.payment_method_usage.len(), 1);
    }
}
