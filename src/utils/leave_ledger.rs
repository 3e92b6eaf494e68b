//! Leave balances are the sum of non-cancelled ledger entries per employee
//! and leave type. Allocations and compensatory credits are positive,
//! approved applications negative.

use chrono::NaiveDate;
use sqlx::{Executor, MySql};

use crate::model::leave_request::LeaveBalance;

pub async fn balance<'e, E>(ex: E, employee_id: u64, leave_type: &str) -> Result<f64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_scalar::<_, f64>(
        r#"
        SELECT CAST(COALESCE(SUM(leaves), 0) AS DOUBLE)
        FROM leave_ledger_entries
        WHERE employee_id = ? AND leave_type = ? AND is_cancelled = FALSE
        "#,
    )
    .bind(employee_id)
    .bind(leave_type)
    .fetch_one(ex)
    .await
}

pub async fn balances<'e, E>(ex: E, employee_id: u64) -> Result<Vec<LeaveBalance>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, LeaveBalance>(
        r#"
        SELECT leave_type, CAST(SUM(leaves) AS DOUBLE) AS balance
        FROM leave_ledger_entries
        WHERE employee_id = ? AND is_cancelled = FALSE
        GROUP BY leave_type
        ORDER BY leave_type
        "#,
    )
    .bind(employee_id)
    .fetch_all(ex)
    .await
}

pub struct LedgerEntry<'a> {
    pub employee_id: u64,
    pub leave_type: &'a str,
    pub leaves: f64,
    pub transaction_type: &'a str,
    pub transaction_id: Option<u64>,
    pub posting_date: NaiveDate,
}

pub async fn post<'e, E>(ex: E, entry: LedgerEntry<'_>) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let res = sqlx::query(
        r#"
        INSERT INTO leave_ledger_entries
            (employee_id, leave_type, leaves, transaction_type, transaction_id, posting_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.employee_id)
    .bind(entry.leave_type)
    .bind(entry.leaves)
    .bind(entry.transaction_type)
    .bind(entry.transaction_id)
    .bind(entry.posting_date)
    .execute(ex)
    .await?;
    Ok(res.last_insert_id())
}

/// Marks the entries a document posted as cancelled.
pub async fn cancel_for<'e, E>(ex: E, transaction_type: &str, transaction_id: u64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let res = sqlx::query(
        r#"
        UPDATE leave_ledger_entries
        SET is_cancelled = TRUE
        WHERE transaction_type = ? AND transaction_id = ? AND is_cancelled = FALSE
        "#,
    )
    .bind(transaction_type)
    .bind(transaction_id)
    .execute(ex)
    .await?;
    Ok(res.rows_affected())
}
