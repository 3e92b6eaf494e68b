use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
pub enum EmployeeStatus {
    Active,
    Inactive,
    Left,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "employee_name": "Nusrat Jahan",
        "email": "nusrat@company.com",
        "department_id": 2,
        "designation": "Software Engineer",
        "status": "Active",
        "wfh_eligible": true,
        "wfh_enabled": false,
        "office_location_id": 1,
        "holiday_list_id": 1,
        "leave_approver_user_id": 3,
        "expense_approver_user_id": 3,
        "notifications_enabled": true,
        "attendance_reminders": true,
        "project_reminders": true,
        "created_at": "2026-01-01T09:00:00"
    })
)]
pub struct Employee {
    pub id: u64,
    pub employee_code: String,
    pub employee_name: String,
    pub email: Option<String>,
    pub department_id: Option<u64>,
    pub designation: Option<String>,
    pub status: String,
    pub wfh_eligible: bool,
    pub wfh_enabled: bool,
    pub office_location_id: Option<u64>,
    pub holiday_list_id: Option<u64>,
    pub leave_approver_user_id: Option<u64>,
    pub expense_approver_user_id: Option<u64>,
    pub notifications_enabled: bool,
    pub attendance_reminders: bool,
    pub project_reminders: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active.to_string()
    }
}

pub const EMPLOYEE_COLUMNS: &str = "id, employee_code, employee_name, email, department_id, designation, \
     status, wfh_eligible, wfh_enabled, office_location_id, holiday_list_id, \
     leave_approver_user_id, expense_approver_user_id, notifications_enabled, \
     attendance_reminders, project_reminders, created_at";

pub async fn find_employee(
    pool: &sqlx::MySqlPool,
    employee_id: u64,
) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
    ))
    .bind(employee_id)
    .fetch_optional(pool)
    .await
}

/// Active employee with the fields the daily attendance views need.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct RosterEntry {
    pub id: u64,
    pub employee_name: String,
    pub department_id: Option<u64>,
    pub department: Option<String>,
    pub designation: Option<String>,
    #[serde(skip)]
    pub holiday_list_id: Option<u64>,
}

pub async fn active_roster(
    pool: &sqlx::MySqlPool,
    department_id: Option<u64>,
) -> Result<Vec<RosterEntry>, sqlx::Error> {
    sqlx::query_as::<_, RosterEntry>(
        r#"
        SELECT e.id, e.employee_name, e.department_id, d.name AS department,
               e.designation, e.holiday_list_id
        FROM employees e
        LEFT JOIN departments d ON d.id = e.department_id
        WHERE e.status = 'Active' AND (? IS NULL OR e.department_id = ?)
        ORDER BY e.employee_name
        "#,
    )
    .bind(department_id)
    .bind(department_id)
    .fetch_all(pool)
    .await
}
