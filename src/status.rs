//! Payment status shared by fixed expenses and debts.

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

/// Whether an expense or debt has been settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// The row has been settled.
    Paid,
    /// The row is still outstanding.
    Pending,
}

impl PaymentStatus {
    /// The text stored in the database for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Pending => "Pending",
        }
    }
}

impl ToSql for PaymentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for PaymentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "Paid" => Ok(PaymentStatus::Paid),
            "Pending" => Ok(PaymentStatus::Pending),
            other => Err(FromSqlError::Other(
                format!("unknown payment status: {other}").into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::PaymentStatus;

    #[test]
    fn round_trips_through_sql() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (status TEXT NOT NULL)", ())
            .unwrap();

        for status in [PaymentStatus::Paid, PaymentStatus::Pending] {
            conn.execute("INSERT INTO t (status) VALUES (?1)", (status,))
                .unwrap();
        }

        let stored: Vec<PaymentStatus> = conn
            .prepare("SELECT status FROM t")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(stored, vec![PaymentStatus::Paid, PaymentStatus::Pending]);
    }

    #[test]
    fn rejects_unknown_status_text() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (status TEXT NOT NULL)", ())
            .unwrap();
        conn.execute("INSERT INTO t (status) VALUES ('Maybe')", ())
            .unwrap();

        let result: Result<PaymentStatus, _> =
            conn.query_row("SELECT status FROM t", [], |row| row.get(0));

        assert!(result.is_err());
    }
}
