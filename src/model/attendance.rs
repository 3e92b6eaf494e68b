use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
pub enum AttendanceStatus {
    Present,
    Absent,
    #[strum(serialize = "Work From Home")]
    #[serde(rename = "Work From Home")]
    WorkFromHome,
    #[strum(serialize = "Half Day")]
    #[serde(rename = "Half Day")]
    HalfDay,
    #[strum(serialize = "On Leave")]
    #[serde(rename = "On Leave")]
    OnLeave,
}

/// Submission state of an attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocStatus {
    Draft = 0,
    Submitted = 1,
    Cancelled = 2,
}

impl DocStatus {
    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            0 => Some(DocStatus::Draft),
            1 => Some(DocStatus::Submitted),
            2 => Some(DocStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
pub enum GeoAction {
    #[strum(serialize = "Check-In")]
    #[serde(rename = "Check-In")]
    CheckIn,
    #[strum(serialize = "Check-Out")]
    #[serde(rename = "Check-Out")]
    CheckOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
pub enum WorkType {
    Office,
    #[strum(serialize = "WFH")]
    #[serde(rename = "WFH")]
    Wfh,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub attendance_date: NaiveDate,
    pub status: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub in_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub out_time: Option<NaiveDateTime>,
    pub work_type: Option<String>,
    pub working_hours: Option<f64>,
    pub docstatus: i8,
    #[schema(value_type = String, format = "date-time")]
    pub modified_at: NaiveDateTime,
    pub modified_by: Option<u64>,
}

pub const ATTENDANCE_COLUMNS: &str = "id, employee_id, attendance_date, status, in_time, out_time, \
     work_type, working_hours, docstatus, modified_at, modified_by";

pub const GEO_LOG_COLUMNS: &str = "id, employee_id, action, logged_at, latitude, longitude, distance_m, \
     work_type, status, attendance_id";

/// Geo logs are always written as approved; rejected attempts are never stored.
pub const GEO_LOG_APPROVED: &str = "Approved";

impl Attendance {
    pub fn doc_status(&self) -> Option<DocStatus> {
        DocStatus::from_i8(self.docstatus)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct GeoLog {
    pub id: u64,
    pub employee_id: u64,
    pub action: String,
    #[schema(value_type = String, format = "date-time")]
    pub logged_at: NaiveDateTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_m: Option<f64>,
    pub work_type: Option<String>,
    pub status: String,
    pub attendance_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn statuses_use_display_names() {
        assert_eq!(AttendanceStatus::WorkFromHome.to_string(), "Work From Home");
        assert_eq!(
            AttendanceStatus::from_str("On Leave").ok(),
            Some(AttendanceStatus::OnLeave)
        );
        assert_eq!(GeoAction::CheckIn.to_string(), "Check-In");
        assert!(GeoAction::from_str("checkin").is_err());
        assert_eq!(WorkType::from_str("WFH").ok(), Some(WorkType::Wfh));
    }

    #[test]
    fn docstatus_values() {
        assert_eq!(DocStatus::from_i8(1), Some(DocStatus::Submitted));
        assert_eq!(DocStatus::Cancelled.as_i8(), 2);
        assert_eq!(DocStatus::from_i8(3), None);
    }
}
