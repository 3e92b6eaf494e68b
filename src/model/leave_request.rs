use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveApplication {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: String,
    #[schema(value_type = String, format = "date")]
    pub from_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to_date: NaiveDate,
    pub half_day: bool,
    #[schema(value_type = Option<String>, format = "date")]
    pub half_day_date: Option<NaiveDate>,
    pub total_leave_days: f64,
    pub description: Option<String>,
    pub approver_user_id: Option<u64>,
    pub status: String,
    #[schema(value_type = String, format = "date")]
    pub posting_date: NaiveDate,
    pub decided_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CompensatoryLeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: String,
    #[schema(value_type = String, format = "date")]
    pub work_from_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub work_end_date: NaiveDate,
    pub half_day: bool,
    pub reason: Option<String>,
    pub approver_user_id: Option<u64>,
    pub status: String,
    pub decided_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ExpenseClaim {
    pub id: u64,
    pub employee_id: u64,
    pub expense_type: String,
    pub description: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub expense_date: NaiveDate,
    pub total_claimed_amount: f64,
    pub total_sanctioned_amount: Option<f64>,
    pub currency: String,
    pub approver_user_id: Option<u64>,
    pub status: String,
    #[schema(value_type = String, format = "date")]
    pub posting_date: NaiveDate,
    pub decided_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TravelRequest {
    pub id: u64,
    pub employee_id: u64,
    pub purpose: String,
    pub destination: String,
    #[schema(value_type = String, format = "date")]
    pub from_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to_date: NaiveDate,
    pub estimated_cost: Option<f64>,
    pub approver_user_id: Option<u64>,
    pub status: String,
    pub decided_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveType {
    pub name: String,
    pub is_compensatory: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct LeaveBalance {
    pub leave_type: String,
    pub balance: f64,
}

/// Ledger transaction types.
pub const LEDGER_ALLOCATION: &str = "Leave Allocation";
pub const LEDGER_APPLICATION: &str = "Leave Application";
pub const LEDGER_COMPENSATORY: &str = "Compensatory Leave Request";

/// Days requested by a leave application. A half day inside the range
/// counts for 0.5.
pub fn leave_days(from: NaiveDate, to: NaiveDate, half_day: bool) -> f64 {
    let days = (to - from).num_days() as f64 + 1.0;
    if half_day { days - 0.5 } else { days }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn counts_inclusive_days() {
        assert_eq!(leave_days(d(2), d(2), false), 1.0);
        assert_eq!(leave_days(d(2), d(6), false), 5.0);
    }

    #[test]
    fn half_day_subtracts_half() {
        assert_eq!(leave_days(d(2), d(2), true), 0.5);
        assert_eq!(leave_days(d(2), d(4), true), 2.5);
    }
}
