use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
pub enum DeviceType {
    Android,
    #[strum(serialize = "iOS")]
    #[serde(rename = "iOS")]
    Ios,
}

impl DeviceType {
    /// Accepts the spellings mobile clients send ("android", "ios", "IOS", ...).
    pub fn normalise(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "android" => Some(DeviceType::Android),
            "ios" | "iphone" | "ipad" => Some(DeviceType::Ios),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Notification {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub message: String,
    pub from_user_id: Option<u64>,
    pub is_read: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct NotificationSettings {
    pub notifications_enabled: bool,
    pub attendance_reminders: bool,
    pub project_reminders: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_types_are_normalised() {
        assert_eq!(DeviceType::normalise(" Android "), Some(DeviceType::Android));
        assert_eq!(DeviceType::normalise("IOS"), Some(DeviceType::Ios));
        assert_eq!(DeviceType::Ios.to_string(), "iOS");
        assert_eq!(DeviceType::normalise("web"), None);
    }
}
