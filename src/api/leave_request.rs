use crate::{
    api::workflow_docs::{self, DocFilter, Page},
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::{
        leave_request::{LEDGER_ALLOCATION, LeaveApplication, LeaveBalance, LeaveType, leave_days},
        workflow::{WorkflowAction, WorkflowDoc, WorkflowStatus},
    },
    push::{
        self,
        fcm::{FcmClient, PushMessage},
    },
    utils::{
        clock,
        leave_ledger::{self, LedgerEntry},
        workflow::ActionInput,
    },
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, from_date, to_date, half_day, half_day_date, \
     total_leave_days, description, approver_user_id, status, posting_date, decided_by, decided_at, created_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeave {
    /// Defaults to the caller's employee record
    pub employee_id: Option<u64>,
    #[schema(example = "Casual Leave")]
    pub leave_type: String,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-03-04", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[serde(default)]
    pub half_day: bool,
    #[schema(example = "2026-03-04", format = "date", value_type = Option<String>)]
    pub half_day_date: Option<NaiveDate>,
    #[schema(example = "Family event")]
    pub description: Option<String>,
}

/// Checked shape of a new application.
#[derive(Debug, Clone, PartialEq)]
struct ValidLeave {
    half_day_date: Option<NaiveDate>,
    days: f64,
}

fn validate_leave(req: &CreateLeave) -> ApiResult<ValidLeave> {
    if req.leave_type.trim().is_empty() {
        return Err(ApiError::bad_request("leave_type is required"));
    }
    if req.to_date < req.from_date {
        return Err(ApiError::bad_request("To date cannot be before from date"));
    }

    let half_day_date = if req.half_day {
        let date = match req.half_day_date {
            Some(d) => d,
            None if req.from_date == req.to_date => req.from_date,
            None => return Err(ApiError::bad_request("half_day_date is required for a multi-day half day leave")),
        };
        if date < req.from_date || date > req.to_date {
            return Err(ApiError::bad_request("Half day date must be between from date and to date"));
        }
        Some(date)
    } else {
        None
    };

    Ok(ValidLeave {
        half_day_date,
        days: leave_days(req.from_date, req.to_date, req.half_day),
    })
}

async fn leave_type_exists(pool: &MySqlPool, name: &str) -> ApiResult<()> {
    let found = sqlx::query_scalar::<_, String>("SELECT name FROM leave_types WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found(format!("Leave type {name} not found")))
}

async fn overlapping_leave(pool: &MySqlPool, employee_id: u64, from: NaiveDate, to: NaiveDate) -> ApiResult<Option<u64>> {
    Ok(sqlx::query_scalar::<_, u64>(
        r#"
        SELECT id FROM leave_applications
        WHERE employee_id = ? AND status IN ('Open', 'Approved')
          AND from_date <= ? AND to_date >= ?
        LIMIT 1
        "#,
    )
    .bind(employee_id)
    .bind(to)
    .bind(from)
    .fetch_optional(pool)
    .await?)
}

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(content = CreateLeave, description = "Leave application", content_type = "application/json"),
    responses(
        (status = 200, description = "Leave application submitted", body = Object, example = json!({
            "status": "success",
            "message": "Leave application submitted",
            "data": {"id": 31, "total_leave_days": 2.5, "status": "Open"}
        })),
        (status = 400, description = "Invalid dates or insufficient balance"),
        (status = 404, description = "Employee or leave type not found"),
        (status = 409, description = "Overlaps an existing application")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    payload: web::Json<CreateLeave>,
) -> ApiResult<HttpResponse> {
    let valid = validate_leave(&payload)?;
    let employee = workflow_docs::filing_employee(pool.get_ref(), &auth, payload.employee_id).await?;
    let leave_type = payload.leave_type.trim();
    leave_type_exists(pool.get_ref(), leave_type).await?;

    if let Some(existing) = overlapping_leave(pool.get_ref(), employee.id, payload.from_date, payload.to_date).await? {
        return Err(ApiError::conflict(format!(
            "Leave application {existing} already covers part of this period"
        )));
    }

    let available = leave_ledger::balance(pool.get_ref(), employee.id, leave_type).await?;
    if available < valid.days {
        return Err(ApiError::bad_request(format!(
            "Insufficient leave balance for {leave_type}: {available} available, {} requested",
            valid.days
        )));
    }

    let today = clock::today(config.business_offset());
    let id = sqlx::query(
        r#"
        INSERT INTO leave_applications
            (employee_id, leave_type, from_date, to_date, half_day, half_day_date,
             total_leave_days, description, approver_user_id, posting_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee.id)
    .bind(leave_type)
    .bind(payload.from_date)
    .bind(payload.to_date)
    .bind(payload.half_day)
    .bind(valid.half_day_date)
    .bind(valid.days)
    .bind(payload.description.as_deref())
    .bind(employee.leave_approver_user_id)
    .bind(today)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    tracing::info!(id, employee_id = employee.id, leave_type, days = valid.days, "Leave application created");

    if let Some(approver) = employee.leave_approver_user_id {
        let msg = PushMessage::new(
            "Leave Application",
            format!(
                "{} applied for {} day(s) of {leave_type} from {}",
                employee.employee_name, valid.days, payload.from_date
            ),
        )
        .with_data("doctype", WorkflowDoc::LeaveApplication.label())
        .with_data("docname", id);
        push::notify_users(pool.get_ref(), fcm.get_ref(), &[approver], &msg, Some(auth.user_id)).await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Leave application submitted",
        "data": {"id": id, "total_leave_days": valid.days, "status": WorkflowStatus::Open},
    })))
}

/// Leave applications: own, awaiting the caller's approval, or all (HR)
#[utoipa::path(
    get,
    path = "/api/leave",
    params(DocFilter),
    responses(
        (status = 200, description = "Paginated leave applications", body = Object, example = json!({
            "data": [{"id": 31, "employee_id": 12, "leave_type": "Casual Leave", "status": "Open"}],
            "page": 1, "per_page": 20, "total": 1
        })),
        (status = 400, description = "Unknown scope or status"),
        (status = 403, description = "Scope all without an HR role")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DocFilter>,
) -> ApiResult<HttpResponse> {
    let page: Page<LeaveApplication> =
        workflow_docs::list_docs(pool.get_ref(), &auth, WorkflowDoc::LeaveApplication, LEAVE_COLUMNS, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// One leave application
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "Leave application id")),
    responses(
        (status = 200, description = "Leave application", body = LeaveApplication),
        (status = 403, description = "Neither owner, approver nor HR"),
        (status = 404, description = "Leave application not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(auth: AuthUser, pool: web::Data<MySqlPool>, path: web::Path<u64>) -> ApiResult<HttpResponse> {
    let leave: LeaveApplication = workflow_docs::get_doc(
        pool.get_ref(),
        &auth,
        WorkflowDoc::LeaveApplication,
        LEAVE_COLUMNS,
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Approve a leave application (HR or designated approver)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "Leave application id")),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "status": "success",
            "message": "Leave Application approved",
            "data": {"id": 31, "employee_id": 12, "from": "Open", "to": "Approved"}
        })),
        (status = 403, description = "Not the approver"),
        (status = 404, description = "Leave application not found"),
        (status = 409, description = "Not open, or the balance no longer covers it")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    decide(auth, pool, config, fcm, path, WorkflowAction::Approve).await
}

/// Reject a leave application (HR or designated approver)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "Leave application id")),
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 403, description = "Not the approver"),
        (status = 404, description = "Leave application not found"),
        (status = 409, description = "Not open")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    decide(auth, pool, config, fcm, path, WorkflowAction::Reject).await
}

/// Cancel an approved or rejected leave application (HR or owner)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(("leave_id" = u64, Path, description = "Leave application id")),
    responses(
        (status = 200, description = "Leave cancelled; an approved leave gives its days back"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Leave application not found"),
        (status = 409, description = "Still open or already cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    decide(auth, pool, config, fcm, path, WorkflowAction::Cancel).await
}

async fn decide(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    path: web::Path<u64>,
    action: WorkflowAction,
) -> ApiResult<HttpResponse> {
    workflow_docs::decide(
        pool.get_ref(),
        fcm.get_ref(),
        config.get_ref(),
        &auth,
        WorkflowDoc::LeaveApplication,
        path.into_inner(),
        action,
        ActionInput::default(),
    )
    .await
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub employee_id: u64,
    pub balances: Vec<LeaveBalance>,
}

/// Leave balances of the caller
#[utoipa::path(
    get,
    path = "/api/leave/balances",
    responses(
        (status = 200, description = "Balance per leave type", body = BalanceResponse, example = json!({
            "employee_id": 12,
            "balances": [{"leave_type": "Casual Leave", "balance": 8.5}]
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_balances(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    balances_for(pool.get_ref(), auth.employee_id()?).await
}

/// Leave balances of an employee (own, or any for HR)
#[utoipa::path(
    get,
    path = "/api/leave/balances/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Balance per leave type", body = BalanceResponse),
        (status = 403, description = "Someone else's balances without an HR role")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn employee_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let employee_id = auth.target_employee(Some(path.into_inner()))?;
    balances_for(pool.get_ref(), employee_id).await
}

async fn balances_for(pool: &MySqlPool, employee_id: u64) -> ApiResult<HttpResponse> {
    let balances = leave_ledger::balances(pool, employee_id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse { employee_id, balances }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AllocationReq {
    #[schema(example = 12)]
    pub employee_id: u64,
    #[schema(example = "Casual Leave")]
    pub leave_type: String,
    #[schema(example = 10.0)]
    pub days: f64,
}

/// Allocate leave days to an employee (HR)
#[utoipa::path(
    post,
    path = "/api/leave/allocations",
    request_body = AllocationReq,
    responses(
        (status = 200, description = "Allocation posted", body = Object, example = json!({
            "status": "success", "ledger_entry_id": 88, "balance": 18.5
        })),
        (status = 400, description = "Days must be positive"),
        (status = 403, description = "HR only"),
        (status = 404, description = "Employee or leave type not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn allocate_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<AllocationReq>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    if !payload.days.is_finite() || payload.days <= 0.0 {
        return Err(ApiError::bad_request("days must be a positive number"));
    }
    let employee = workflow_docs::filing_employee(pool.get_ref(), &auth, Some(payload.employee_id)).await?;
    let leave_type = payload.leave_type.trim();
    leave_type_exists(pool.get_ref(), leave_type).await?;

    let entry_id = leave_ledger::post(
        pool.get_ref(),
        LedgerEntry {
            employee_id: employee.id,
            leave_type,
            leaves: payload.days,
            transaction_type: LEDGER_ALLOCATION,
            transaction_id: None,
            posting_date: clock::today(config.business_offset()),
        },
    )
    .await?;
    let balance = leave_ledger::balance(pool.get_ref(), employee.id, leave_type).await?;

    tracing::info!(employee_id = employee.id, leave_type, days = payload.days, by = auth.user_id, "Leave allocated");

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "ledger_entry_id": entry_id,
        "balance": balance,
    })))
}

/// Configured leave types
#[utoipa::path(
    get,
    path = "/api/leave/types",
    responses((status = 200, description = "Leave types", body = [LeaveType])),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_types(pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let types = sqlx::query_as::<_, LeaveType>("SELECT name, is_compensatory FROM leave_types ORDER BY name")
        .fetch_all(pool.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(types))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn req(from: u32, to: u32, half_day: bool, half_day_date: Option<u32>) -> CreateLeave {
        CreateLeave {
            employee_id: None,
            leave_type: "Casual Leave".into(),
            from_date: d(from),
            to_date: d(to),
            half_day,
            half_day_date: half_day_date.map(d),
            description: None,
        }
    }

    #[test]
    fn full_days_are_counted_inclusively() {
        let v = validate_leave(&req(2, 4, false, Some(3))).unwrap();
        assert_eq!(v, ValidLeave { half_day_date: None, days: 3.0 });
    }

    #[test]
    fn half_day_inside_range_subtracts_half() {
        let v = validate_leave(&req(2, 4, true, Some(4))).unwrap();
        assert_eq!(v.days, 2.5);
        assert_eq!(v.half_day_date, Some(d(4)));
    }

    #[test]
    fn single_half_day_defaults_its_date() {
        let v = validate_leave(&req(5, 5, true, None)).unwrap();
        assert_eq!(v, ValidLeave { half_day_date: Some(d(5)), days: 0.5 });
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(matches!(validate_leave(&req(4, 2, false, None)), Err(ApiError::BadRequest(_))));
        assert!(validate_leave(&req(2, 4, true, Some(9))).is_err());
        assert!(validate_leave(&req(2, 4, true, None)).is_err());

        let mut blank = req(2, 2, false, None);
        blank.leave_type = "  ".into();
        assert!(validate_leave(&blank).is_err());
    }
}
