//! The recurrence and installment expansion engine.
//!
//! A submitted entry is expanded into one or more ledger entries before
//! anything touches the database:
//!
//! - **Monthly recurrence** (a subscription): one identical entry per
//!   calendar month from the start month through an end month, inclusive.
//! - **Installments**: the total is split into N monthly parts whose amounts
//!   sum back to the original total exactly, with the rounding remainder
//!   absorbed by the last part.
//! - **Single**: the entry passes through unchanged.
//!
//! Expansion is pure; persisting the produced entries (atomically, as one
//! batch) is the caller's responsibility. Each persisted row is independent
//! afterwards: editing or deleting one installment never affects its
//! siblings.

use time::{Date, Month, util::days_in_month};

use crate::{
    Error,
    money::round_to_cents,
};

/// The largest supported installment count.
pub const MAX_INSTALLMENTS: u8 = 12;

/// How a submitted entry fans out into ledger rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule {
    /// One entry, as submitted.
    Single,
    /// Split the total into this many monthly installments.
    Installments(u8),
    /// Repeat the entry monthly through the given end month (inclusive).
    ///
    /// The date carried here is normalized to the first day of the end month.
    MonthlyUntil(Date),
}

impl Schedule {
    /// Resolve a schedule from the raw submission parameters.
    ///
    /// A recurrence end month at or after the start month takes precedence
    /// over an installment count; this mirrors how the submission form is
    /// used in practice and is a documented precedence rule rather than a
    /// validation error. An end month before the start month is ignored.
    ///
    /// # Errors
    /// Returns [Error::InvalidInstallmentCount] if `installments` is outside
    /// `1..=12`. The range is checked even when recurrence wins precedence.
    pub fn from_parts(
        installments: Option<u8>,
        repeat_until: Option<Date>,
        start: Date,
    ) -> Result<Self, Error> {
        let installments = installments.unwrap_or(1);

        if !(1..=MAX_INSTALLMENTS).contains(&installments) {
            return Err(Error::InvalidInstallmentCount(installments));
        }

        if let Some(end) = repeat_until {
            if month_start(end) >= month_start(start) {
                return Ok(Self::MonthlyUntil(month_start(end)));
            }
        }

        if installments > 1 {
            Ok(Self::Installments(installments))
        } else {
            Ok(Self::Single)
        }
    }
}

/// One entry produced by [expand], ready to be mapped onto an entity row.
///
/// `date` is the entry's scheduled date. Entity modules decide which column
/// it lands in: occurrence date for income and debts, the balance-month
/// bucket for variable expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedEntry {
    /// Description for this entry; installments get a ` {i}/{n}` suffix.
    pub description: String,
    /// Amount for this entry, rounded to cents.
    pub amount: f64,
    /// Scheduled date of this entry.
    pub date: Date,
}

/// Expand a submitted entry into the ledger entries it produces.
///
/// The returned entries' amounts always sum to `amount` to the cent.
///
/// # Errors
/// Returns [Error::EmptyDescription] if `description` is blank,
/// [Error::NonPositiveAmount] if `amount` is zero or negative, or
/// [Error::InvalidInstallmentCount] for an out-of-range installment count.
pub fn expand(
    description: &str,
    amount: f64,
    start: Date,
    schedule: Schedule,
) -> Result<Vec<ExpandedEntry>, Error> {
    let description = description.trim();

    if description.is_empty() {
        return Err(Error::EmptyDescription);
    }

    if amount <= 0.0 {
        return Err(Error::NonPositiveAmount(amount));
    }

    if let Schedule::Installments(count) = schedule
        && !(1..=MAX_INSTALLMENTS).contains(&count)
    {
        return Err(Error::InvalidInstallmentCount(count));
    }

    let entries = match schedule {
        Schedule::MonthlyUntil(end) if month_start(end) >= month_start(start) => {
            expand_monthly(description, amount, start, end)
        }
        Schedule::Installments(count) if count > 1 => {
            expand_installments(description, amount, start, count)
        }
        // Single, a one-part installment plan, or an end month before the
        // start month all collapse to the entry as submitted.
        _ => vec![ExpandedEntry {
            description: description.to_owned(),
            amount: round_to_cents(amount),
            date: start,
        }],
    };

    Ok(entries)
}

fn expand_monthly(description: &str, amount: f64, start: Date, end: Date) -> Vec<ExpandedEntry> {
    let count = months_between(start, end) + 1;
    let amount = round_to_cents(amount);

    (0..count)
        .map(|offset| ExpandedEntry {
            description: description.to_owned(),
            amount,
            date: months_after(start, offset),
        })
        .collect()
}

fn expand_installments(description: &str, total: f64, start: Date, count: u8) -> Vec<ExpandedEntry> {
    let base = round_to_cents(total / f64::from(count));
    let count = u32::from(count);

    (0..count)
        .map(|offset| {
            let amount = if offset == count - 1 {
                // The last installment absorbs the rounding remainder so the
                // parts sum back to the original total exactly.
                round_to_cents(total - base * f64::from(count - 1))
            } else {
                base
            };

            ExpandedEntry {
                description: format!("{description} {}/{count}", offset + 1),
                amount,
                date: months_after(start, offset),
            }
        })
        .collect()
}

/// The date `months` calendar months after `start`, keeping the day-of-month
/// and clipping it to the target month's length (Jan 31 + 1 month = Feb 28).
pub fn months_after(start: Date, months: u32) -> Date {
    let total = month_index(start) + months as i32;
    let year = total.div_euclid(12);
    let month = Month::try_from((total.rem_euclid(12) + 1) as u8).unwrap();
    let day = start.day().min(days_in_month(month, year));

    Date::from_calendar_date(year, month, day).unwrap()
}

/// The number of whole calendar months from `start`'s month to `end`'s month.
///
/// Day-of-month is ignored; months before `start` count as zero.
pub fn months_between(start: Date, end: Date) -> u32 {
    (month_index(end) - month_index(start)).max(0) as u32
}

fn month_index(date: Date) -> i32 {
    date.year() * 12 + i32::from(u8::from(date.month())) - 1
}

fn month_start(date: Date) -> Date {
    date.replace_day(1).unwrap()
}
