use std::str::FromStr;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::notification::{DeviceType, Notification, NotificationSettings},
    push::{
        self,
        fcm::{FcmClient, PushMessage},
    },
    utils::clock,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use strum_macros::EnumString;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeviceTokenReq {
    #[schema(example = "fcm-registration-token")]
    pub fcm_token: String,
    /// Android or iOS, any case
    #[schema(example = "android")]
    pub device_type: String,
}

/// Register or refresh the caller's device token
#[utoipa::path(
    post,
    path = "/api/devices/token",
    request_body = DeviceTokenReq,
    responses(
        (status = 200, description = "Token stored", body = Object, example = json!({
            "status": "success", "message": "Device token registered", "device_type": "Android"
        })),
        (status = 400, description = "Empty token or unknown device type")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn register_device(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Json<DeviceTokenReq>,
) -> ApiResult<HttpResponse> {
    let token = body.fcm_token.trim();
    if token.is_empty() {
        return Err(ApiError::bad_request("fcm_token is required"));
    }
    let device_type = DeviceType::normalise(&body.device_type)
        .ok_or_else(|| ApiError::bad_request("device_type must be Android or iOS"))?;
    let now = clock::now_local(config.business_offset());

    let mut tx = pool.begin().await?;
    // A token moves with the physical device: drop it from whoever had it before.
    let moved = sqlx::query("DELETE FROM mobile_devices WHERE fcm_token = ? AND user_id <> ?")
        .bind(token)
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query(
        r#"
        INSERT INTO mobile_devices (user_id, fcm_token, device_type, last_active)
        VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE fcm_token = VALUES(fcm_token),
                                device_type = VALUES(device_type),
                                last_active = VALUES(last_active)
        "#,
    )
    .bind(auth.user_id)
    .bind(token)
    .bind(device_type.to_string())
    .bind(now)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(user_id = auth.user_id, %device_type, reassigned = moved > 0, "Device token registered");
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Device token registered",
        "device_type": device_type,
    })))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BroadcastTarget {
    All,
    Department,
    Specific,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BroadcastReq {
    #[schema(example = "Office closed")]
    pub title: String,
    #[schema(example = "The office is closed tomorrow for maintenance")]
    pub message: String,
    /// `all`, `department` or `specific`
    #[schema(example = "all")]
    pub target: String,
    pub department_id: Option<u64>,
    #[serde(default)]
    pub employee_ids: Vec<u64>,
}

fn broadcast_target(req: &BroadcastReq) -> ApiResult<BroadcastTarget> {
    if req.title.trim().is_empty() || req.message.trim().is_empty() {
        return Err(ApiError::bad_request("title and message are required"));
    }
    let target = BroadcastTarget::from_str(req.target.trim())
        .map_err(|_| ApiError::bad_request("target must be all, department or specific"))?;
    match target {
        BroadcastTarget::Department if req.department_id.is_none() => {
            Err(ApiError::bad_request("department_id is required for a department broadcast"))
        }
        BroadcastTarget::Specific if req.employee_ids.is_empty() => {
            Err(ApiError::bad_request("employee_ids is required for a specific broadcast"))
        }
        t => Ok(t),
    }
}

/// Push a message to all, one department or chosen employees (HR)
#[utoipa::path(
    post,
    path = "/api/notifications/broadcast",
    request_body = BroadcastReq,
    responses(
        (status = 200, description = "Broadcast sent", body = Object, example = json!({
            "status": "success",
            "recipients": 40,
            "report": {"success_count": 37, "failure_count": 3, "responses": []}
        })),
        (status = 400, description = "Missing fields or unknown target"),
        (status = 403, description = "HR only")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn broadcast(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    fcm: web::Data<FcmClient>,
    body: web::Json<BroadcastReq>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let target = broadcast_target(&body)?;

    let employee_ids: Vec<u64> = match target {
        BroadcastTarget::All => {
            sqlx::query_scalar("SELECT id FROM employees WHERE status = 'Active'")
                .fetch_all(pool.get_ref())
                .await?
        }
        BroadcastTarget::Department => {
            sqlx::query_scalar("SELECT id FROM employees WHERE status = 'Active' AND department_id = ?")
                .bind(body.department_id)
                .fetch_all(pool.get_ref())
                .await?
        }
        BroadcastTarget::Specific => body.employee_ids.clone(),
    };

    let msg = PushMessage::new(body.title.trim(), body.message.trim())
        .with_data("type", "broadcast")
        .with_data("sender", &auth.username);
    let report = push::notify_employees(pool.get_ref(), fcm.get_ref(), &employee_ids, &msg, Some(auth.user_id)).await;

    tracing::info!(
        ?target,
        recipients = employee_ids.len(),
        success = report.success_count,
        failure = report.failure_count,
        "Broadcast sent"
    );
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "recipients": employee_ids.len(),
        "report": report,
    })))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u32>,
}

/// The caller's in-app notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(InboxQuery),
    responses((status = 200, description = "Notifications", body = [Notification])),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn inbox(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<InboxQuery>,
) -> ApiResult<HttpResponse> {
    let rows = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, title, message, from_user_id, is_read, created_at
        FROM notifications
        WHERE user_id = ? AND (? = FALSE OR is_read = FALSE)
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(auth.user_id)
    .bind(query.unread_only)
    .bind(query.limit.unwrap_or(50).clamp(1, 200))
    .fetch_all(pool.get_ref())
    .await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses((status = 200, description = "Unread count", body = Object, example = json!({"unread": 3}))),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn unread_count(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let unread = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = FALSE")
        .bind(auth.user_id)
        .fetch_one(pool.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(json!({"unread": unread})))
}

#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses((status = 200, description = "All marked read", body = Object, example = json!({"status": "success", "updated": 3}))),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_all_read(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let updated = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = ? AND is_read = FALSE")
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await?
        .rows_affected();
    Ok(HttpResponse::Ok().json(json!({"status": "success", "updated": updated})))
}

/// Notification preferences of the caller's employee record
#[utoipa::path(
    get,
    path = "/api/notifications/settings",
    responses(
        (status = 200, description = "Settings", body = NotificationSettings),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn get_settings(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let employee_id = auth.employee_id()?;
    let settings = load_settings(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(settings))
}

async fn load_settings(pool: &MySqlPool, employee_id: u64) -> ApiResult<NotificationSettings> {
    sqlx::query_as::<_, NotificationSettings>(
        "SELECT notifications_enabled, attendance_reminders, project_reminders FROM employees WHERE id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Employee record not found"))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SettingsUpdate {
    pub notifications_enabled: Option<bool>,
    pub attendance_reminders: Option<bool>,
    pub project_reminders: Option<bool>,
}

impl SettingsUpdate {
    fn apply(&self, current: NotificationSettings) -> NotificationSettings {
        NotificationSettings {
            notifications_enabled: self.notifications_enabled.unwrap_or(current.notifications_enabled),
            attendance_reminders: self.attendance_reminders.unwrap_or(current.attendance_reminders),
            project_reminders: self.project_reminders.unwrap_or(current.project_reminders),
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/notifications/settings",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Updated settings", body = NotificationSettings),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn update_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<SettingsUpdate>,
) -> ApiResult<HttpResponse> {
    let employee_id = auth.employee_id()?;
    let settings = body.apply(load_settings(pool.get_ref(), employee_id).await?);

    sqlx::query(
        r#"
        UPDATE employees
        SET notifications_enabled = ?, attendance_reminders = ?, project_reminders = ?
        WHERE id = ?
        "#,
    )
    .bind(settings.notifications_enabled)
    .bind(settings.attendance_reminders)
    .bind(settings.project_reminders)
    .bind(employee_id)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(target: &str) -> BroadcastReq {
        BroadcastReq {
            title: "Office closed".into(),
            message: "Tomorrow".into(),
            target: target.into(),
            department_id: None,
            employee_ids: vec![],
        }
    }

    #[test]
    fn broadcast_targets() {
        assert_eq!(broadcast_target(&req("ALL")).unwrap(), BroadcastTarget::All);
        assert!(broadcast_target(&req("department")).is_err());
        assert!(broadcast_target(&req("specific")).is_err());
        assert!(broadcast_target(&req("team")).is_err());

        let mut dept = req("department");
        dept.department_id = Some(3);
        assert_eq!(broadcast_target(&dept).unwrap(), BroadcastTarget::Department);
    }

    #[test]
    fn broadcast_needs_title_and_message() {
        let mut blank = req("all");
        blank.message = " ".into();
        assert!(matches!(broadcast_target(&blank), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn settings_update_is_partial() {
        let current = NotificationSettings {
            notifications_enabled: true,
            attendance_reminders: true,
            project_reminders: true,
        };
        let update = SettingsUpdate {
            notifications_enabled: None,
            attendance_reminders: Some(false),
            project_reminders: None,
        };
        let next = update.apply(current);
        assert!(next.notifications_enabled);
        assert!(!next.attendance_reminders);
        assert!(next.project_reminders);
    }
}
