use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

/// Active shift assignment joined with its shift type.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ShiftAssignment {
    pub id: u64,
    pub shift_type_id: u64,
    #[schema(example = "General")]
    pub shift_type: String,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "18:00:00")]
    pub end_time: NaiveTime,
}

pub const SHIFT_ASSIGNMENT_SELECT: &str = "SELECT sa.id, sa.shift_type_id, st.name AS shift_type, \
     sa.start_date, sa.end_date, st.start_time, st.end_time \
     FROM shift_assignments sa JOIN shift_types st ON st.id = sa.shift_type_id";
