use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Project {
    pub id: u64,
    pub project_name: String,
    pub status: String,
    #[schema(value_type = Option<String>, format = "date")]
    pub expected_start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub expected_end_date: Option<NaiveDate>,
    pub percent_complete: f64,
    #[schema(value_type = String, format = "date-time")]
    pub modified_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ProjectMember {
    pub id: u64,
    pub project_id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    pub role_in_project: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Task {
    pub id: u64,
    pub project_id: u64,
    pub subject: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    #[schema(value_type = Option<String>, format = "date")]
    pub exp_start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub exp_end_date: Option<NaiveDate>,
    pub progress: f64,
    #[schema(value_type = String, format = "date-time")]
    pub modified_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct TaskLog {
    pub id: u64,
    pub project_id: u64,
    pub task_id: u64,
    pub employee_id: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub log_time: NaiveDateTime,
    pub description: String,
    pub created_by: u64,
}
