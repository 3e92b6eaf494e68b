//! Work-from-home eligibility and requests.

use std::str::FromStr;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::{
        employee::{Employee, find_employee},
        wfh_request::{WfhRequest, WfhStatus},
    },
    push::{
        self,
        fcm::{FcmClient, PushMessage},
    },
    utils::clock,
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const DEFAULT_REQUEST_TYPE: &str = "Work From Home";

const WFH_SELECT: &str = r#"
    SELECT w.id, w.employee_id, w.request_type, w.from_date, w.to_date, w.reason, w.status,
           w.approved_by, w.approval_date, w.created_at, e.employee_name
    FROM wfh_requests w
    JOIN employees e ON e.id = w.employee_id
"#;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct WfhRequestView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub request: WfhRequest,
    pub employee_name: String,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct WfhEligibility {
    pub id: u64,
    pub employee_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub wfh_eligible: bool,
    pub wfh_enabled: bool,
}

/// WFH flags of the caller
#[utoipa::path(
    get,
    path = "/api/wfh/me",
    responses(
        (status = 200, description = "Caller's WFH flags", body = Object, example = json!({
            "employee_id": 12, "employee_name": "Nusrat Jahan", "wfh_eligible": true, "wfh_enabled": false
        })),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Work From Home"
)]
pub async fn my_wfh(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let employee_id = auth.employee_id()?;
    let employee = find_employee(pool.get_ref(), employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee record not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "employee_id": employee.id,
        "employee_name": employee.employee_name,
        "designation": employee.designation,
        "wfh_eligible": employee.wfh_eligible,
        "wfh_enabled": employee.wfh_enabled,
    })))
}

/// WFH eligibility of every active employee (HR)
#[utoipa::path(
    get,
    path = "/api/wfh/employees",
    responses(
        (status = 200, description = "Eligibility list", body = [WfhEligibility]),
        (status = 403, description = "HR only")
    ),
    security(("bearer_auth" = [])),
    tag = "Work From Home"
)]
pub async fn wfh_employees(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let rows = sqlx::query_as::<_, WfhEligibility>(
        r#"
        SELECT e.id, e.employee_name, d.name AS department, e.designation, e.wfh_eligible, e.wfh_enabled
        FROM employees e
        LEFT JOIN departments d ON d.id = e.department_id
        WHERE e.status = 'Active'
        ORDER BY e.employee_name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EligibilityReq {
    #[schema(example = true)]
    pub wfh_eligible: bool,
}

/// Turn WFH eligibility on or off (Admin / HR Manager)
#[utoipa::path(
    put,
    path = "/api/wfh/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee id")),
    request_body = EligibilityReq,
    responses(
        (status = 200, description = "Eligibility updated", body = Object, example = json!({
            "status": "success", "message": "WFH eligibility enabled", "employee_id": 12
        })),
        (status = 403, description = "Admin or HR Manager only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Work From Home"
)]
pub async fn toggle_eligibility(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<EligibilityReq>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_manager()?;
    let employee_id = path.into_inner();

    // Revoking eligibility also switches WFH off.
    let result = sqlx::query(
        "UPDATE employees SET wfh_eligible = ?, wfh_enabled = (wfh_enabled AND ?) WHERE id = ?",
    )
    .bind(body.wfh_eligible)
    .bind(body.wfh_eligible)
    .bind(employee_id)
    .execute(pool.get_ref())
    .await?;
    if result.rows_affected() == 0 && find_employee(pool.get_ref(), employee_id).await?.is_none() {
        return Err(ApiError::not_found(format!("Employee {employee_id} not found")));
    }

    tracing::info!(employee_id, wfh_eligible = body.wfh_eligible, by = auth.user_id, "WFH eligibility changed");

    let state = if body.wfh_eligible { "enabled" } else { "disabled" };
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("WFH eligibility {state}"),
        "employee_id": employee_id,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWfhReq {
    #[schema(example = "Work From Home")]
    pub request_type: Option<String>,
    #[schema(example = "2026-05-04", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-05-06", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = "Renovation at home")]
    pub reason: Option<String>,
}

async fn overlapping_request(
    pool: &MySqlPool,
    employee_id: u64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Option<WfhRequest>, sqlx::Error> {
    sqlx::query_as::<_, WfhRequest>(
        r#"
        SELECT id, employee_id, request_type, from_date, to_date, reason, status,
               approved_by, approval_date, created_at
        FROM wfh_requests
        WHERE employee_id = ? AND status IN ('Pending', 'Approved')
          AND from_date <= ? AND to_date >= ?
        ORDER BY from_date
        LIMIT 1
        "#,
    )
    .bind(employee_id)
    .bind(to)
    .bind(from)
    .fetch_optional(pool)
    .await
}

/// Ask to work from home; HR is notified
#[utoipa::path(
    post,
    path = "/api/wfh/requests",
    request_body = CreateWfhReq,
    responses(
        (status = 200, description = "Request submitted", body = Object, example = json!({
            "status": "success", "message": "WFH request submitted successfully", "id": 7
        })),
        (status = 400, description = "Invalid dates"),
        (status = 409, description = "Overlaps a pending or approved request")
    ),
    security(("bearer_auth" = [])),
    tag = "Work From Home"
)]
pub async fn create_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    fcm: web::Data<FcmClient>,
    body: web::Json<CreateWfhReq>,
) -> ApiResult<HttpResponse> {
    let employee_id = auth.employee_id()?;
    if body.to_date < body.from_date {
        return Err(ApiError::bad_request("To date cannot be before from date"));
    }
    let employee: Employee = find_employee(pool.get_ref(), employee_id)
        .await?
        .filter(Employee::is_active)
        .ok_or_else(|| ApiError::not_found("Employee record not found"))?;

    if let Some(existing) = overlapping_request(pool.get_ref(), employee.id, body.from_date, body.to_date).await? {
        return Err(ApiError::conflict(format!(
            "You already have a WFH request for overlapping dates: {} to {} ({})",
            existing.from_date, existing.to_date, existing.status
        )));
    }

    let request_type = body
        .request_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_REQUEST_TYPE);

    let id = sqlx::query(
        r#"
        INSERT INTO wfh_requests (employee_id, request_type, from_date, to_date, reason, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee.id)
    .bind(request_type)
    .bind(body.from_date)
    .bind(body.to_date)
    .bind(body.reason.as_deref())
    .bind(WfhStatus::Pending.to_string())
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    tracing::info!(id, employee_id = employee.id, from = %body.from_date, to = %body.to_date, "WFH request created");

    let msg = PushMessage::new(
        "New WFH Request",
        format!(
            "{} has requested work from home from {} to {}",
            employee.employee_name, body.from_date, body.to_date
        ),
    )
    .with_data("type", "wfh_request")
    .with_data("request_id", id);
    push::notify_hr(pool.get_ref(), fcm.get_ref(), &msg, Some(auth.user_id)).await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "WFH request submitted successfully",
        "id": id,
    })))
}

/// The caller's WFH requests
#[utoipa::path(
    get,
    path = "/api/wfh/requests",
    responses((status = 200, description = "Own requests, newest first", body = [WfhRequestView])),
    security(("bearer_auth" = [])),
    tag = "Work From Home"
)]
pub async fn my_requests(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let employee_id = auth.employee_id()?;
    let rows = sqlx::query_as::<_, WfhRequestView>(&format!(
        "{WFH_SELECT} WHERE w.employee_id = ? ORDER BY w.created_at DESC"
    ))
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Requests awaiting a decision (HR)
#[utoipa::path(
    get,
    path = "/api/wfh/requests/pending",
    responses(
        (status = 200, description = "Pending requests", body = [WfhRequestView]),
        (status = 403, description = "HR only")
    ),
    security(("bearer_auth" = [])),
    tag = "Work From Home"
)]
pub async fn pending_requests(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let rows = sqlx::query_as::<_, WfhRequestView>(&format!(
        "{WFH_SELECT} WHERE w.status = ? ORDER BY w.created_at DESC"
    ))
    .bind(WfhStatus::Pending.to_string())
    .fetch_all(pool.get_ref())
    .await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AllRequestsQuery {
    /// Pending, Approved or Rejected
    pub status: Option<String>,
    pub employee_id: Option<u64>,
}

/// Every WFH request, optionally filtered (HR)
#[utoipa::path(
    get,
    path = "/api/wfh/requests/all",
    params(AllRequestsQuery),
    responses(
        (status = 200, description = "Requests", body = [WfhRequestView]),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "HR only")
    ),
    security(("bearer_auth" = [])),
    tag = "Work From Home"
)]
pub async fn all_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AllRequestsQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let status = query
        .status
        .as_deref()
        .map(|s| WfhStatus::from_str(s.trim()).map_err(|_| ApiError::bad_request(format!("Unknown status: {s}"))))
        .transpose()?
        .map(|s| s.to_string());

    let rows = sqlx::query_as::<_, WfhRequestView>(&format!(
        "{WFH_SELECT} WHERE (? IS NULL OR w.status = ?) AND (? IS NULL OR w.employee_id = ?) ORDER BY w.created_at DESC"
    ))
    .bind(status.as_deref())
    .bind(status.as_deref())
    .bind(query.employee_id)
    .bind(query.employee_id)
    .fetch_all(pool.get_ref())
    .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Withdraw a pending request (owner or HR)
#[utoipa::path(
    delete,
    path = "/api/wfh/requests/{request_id}",
    params(("request_id" = u64, Path, description = "WFH request id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Neither owner nor HR"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Work From Home"
)]
pub async fn delete_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let request_id = path.into_inner();
    let mut tx = pool.begin().await?;

    let (owner, status) = sqlx::query_as::<_, (u64, String)>(
        "SELECT employee_id, status FROM wfh_requests WHERE id = ? FOR UPDATE",
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("WFH request {request_id} not found")))?;

    if !auth.is_hr() && auth.employee_id != Some(owner) {
        return Err(ApiError::forbidden("You can only delete your own WFH requests"));
    }
    if status != WfhStatus::Pending.to_string() {
        return Err(ApiError::conflict(format!("Only pending requests can be deleted; this one is {status}")));
    }

    sqlx::query("DELETE FROM wfh_requests WHERE id = ?")
        .bind(request_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(request_id, by = auth.user_id, "WFH request deleted");
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "WFH request deleted successfully",
    })))
}

fn decision_target(action: &str) -> ApiResult<WfhStatus> {
    match action {
        "approve" => Ok(WfhStatus::Approved),
        "reject" => Ok(WfhStatus::Rejected),
        other => Err(ApiError::not_found(format!("Unknown action: {other}"))),
    }
}

/// Approve or reject a pending request (HR). Approval turns WFH on for the employee.
#[utoipa::path(
    put,
    path = "/api/wfh/requests/{request_id}/{action}",
    params(
        ("request_id" = u64, Path, description = "WFH request id"),
        ("action" = String, Path, description = "approve or reject")
    ),
    responses(
        (status = 200, description = "Decision recorded", body = Object, example = json!({
            "status": "success", "message": "WFH request approved successfully"
        })),
        (status = 403, description = "HR only"),
        (status = 404, description = "Not found or unknown action"),
        (status = 409, description = "Already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Work From Home"
)]
pub async fn decide_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    path: web::Path<(u64, String)>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let (request_id, action) = path.into_inner();
    let target = decision_target(&action)?;
    let now = clock::now_local(config.business_offset());

    let mut tx = pool.begin().await?;
    let request = sqlx::query_as::<_, WfhRequest>(
        r#"
        SELECT id, employee_id, request_type, from_date, to_date, reason, status,
               approved_by, approval_date, created_at
        FROM wfh_requests WHERE id = ? FOR UPDATE
        "#,
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("WFH request {request_id} not found")))?;

    if request.status != WfhStatus::Pending.to_string() {
        return Err(ApiError::conflict(format!("Request is already {}", request.status)));
    }

    sqlx::query("UPDATE wfh_requests SET status = ?, approved_by = ?, approval_date = ? WHERE id = ?")
        .bind(target.to_string())
        .bind(auth.user_id)
        .bind(now)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

    if target == WfhStatus::Approved {
        sqlx::query("UPDATE employees SET wfh_eligible = TRUE, wfh_enabled = TRUE WHERE id = ?")
            .bind(request.employee_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::info!(request_id, employee_id = request.employee_id, status = %target, by = auth.user_id, "WFH request decided");

    let verb = target.to_string().to_lowercase();
    let msg = PushMessage::new(
        format!("WFH Request {target}"),
        format!(
            "Your WFH request from {} to {} has been {verb}",
            request.from_date, request.to_date
        ),
    )
    .with_data("type", "wfh_response")
    .with_data("request_id", request_id)
    .with_data("status", target);
    push::notify_employee(pool.get_ref(), fcm.get_ref(), request.employee_id, &msg, Some(auth.user_id)).await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("WFH request {verb} successfully"),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_actions() {
        assert_eq!(decision_target("approve").unwrap(), WfhStatus::Approved);
        assert_eq!(decision_target("reject").unwrap(), WfhStatus::Rejected);
        assert!(matches!(decision_target("cancel"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn status_strings_match_stored_values() {
        assert_eq!(WfhStatus::Pending.to_string(), "Pending");
        assert_eq!(WfhStatus::from_str("Approved").unwrap(), WfhStatus::Approved);
    }
}
