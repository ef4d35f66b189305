//! Creates an SQLite database populated with test data and prints the
//! resulting year summary as JSON.

use std::{error::Error, path::PathBuf, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::macros::date;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use balanco::{
    catalog::{CatalogKind, create_catalog_entry},
    date_input::format_day_month_year,
    db::initialize,
    debt::{DebtIntent, create_debts},
    fixed_expense::{FixedExpenseIntent, create_fixed_expenses},
    goal::{contribute_to_goal, create_goal},
    income::{IncomeIntent, create_incomes},
    report::summarize_year,
    schedule::Schedule,
    status::PaymentStatus,
    user::create_user,
    variable_expense::{VariableExpenseIntent, create_variable_expenses},
};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The file path where the SQLite database file should be created.
    #[arg(short = 'o', long, default_value = "test.db")]
    output_path: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.output_path.extension() {
        Some(extension) if extension == "db" => {}
        _ => {
            error!(
                "output path must end in .db, got {}",
                args.output_path.display()
            );
            exit(1);
        }
    }

    if args.output_path.exists() {
        error!(
            "{} already exists, refusing to overwrite",
            args.output_path.display()
        );
        exit(1);
    }

    if let Err(error) = create_test_database(&args.output_path) {
        error!("could not create test database: {error}");
        exit(1);
    }

    info!("created test database at {}", args.output_path.display());
}

fn create_test_database(path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let connection = Connection::open(path)?;
    initialize(&connection)?;

    let user = create_user("Test User", &connection)?;

    create_catalog_entry(
        user.id,
        CatalogKind::IncomeSource,
        "Work",
        None,
        Some(50400.0),
        &connection,
    )?;
    create_catalog_entry(
        user.id,
        CatalogKind::ExpenseCategory,
        "Housing",
        Some("House"),
        None,
        &connection,
    )?;
    create_catalog_entry(
        user.id,
        CatalogKind::ExpenseCategory,
        "Food",
        Some("Cart"),
        Some(7200.0),
        &connection,
    )?;
    create_catalog_entry(
        user.id,
        CatalogKind::PaymentMethod,
        "Credit card",
        Some("Card"),
        None,
        &connection,
    )?;

    // Dates arrive the way a submission form sends them, day-first.
    let incomes = create_incomes(
        IncomeIntent::from_form(
            user.id,
            "Salary",
            "Work",
            4200.0,
            "05/01/2026",
            None,
            Some("12/2026"),
        )?,
        &connection,
    )?;
    info!(
        "seeded salary from {}",
        format_day_month_year(incomes[0].date)
    );

    create_fixed_expenses(
        FixedExpenseIntent {
            user_id: user.id,
            description: "Rent".to_owned(),
            category: "Housing".to_owned(),
            amount: 1800.0,
            due_date: date!(2026 - 01 - 01),
            status: PaymentStatus::Pending,
            paid_on: None,
            payment_method: Some("Bank transfer".to_owned()),
            schedule: Schedule::MonthlyUntil(date!(2026 - 12 - 01)),
        },
        &connection,
    )?;

    create_variable_expenses(
        VariableExpenseIntent::from_form(
            user.id,
            "New fridge",
            "Food",
            1499.99,
            "17/01/2026",
            Some("Credit card"),
            "02/2026",
            Some(3),
            None,
        )?,
        &connection,
    )?;

    create_debts(
        DebtIntent::from_form(
            user.id,
            "Car loan",
            "Bank",
            5400.0,
            "20/01/2026",
            PaymentStatus::Pending,
            Some(12),
            None,
        )?,
        &connection,
    )?;

    let goal = create_goal(user.id, "House deposit", Some("House"), 60000.0, &connection)?;
    contribute_to_goal(
        goal.id,
        user.id,
        750.0,
        date!(2026 - 01 - 10),
        Some(date!(2026 - 12 - 01)),
        &connection,
    )?;

    let summary = summarize_year(user.id, 2026, &connection)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
