use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    #[schema(value_type = String, format = "date")]
    pub holiday_date: NaiveDate,
    pub description: Option<String>,
    pub weekly_off: bool,
}
