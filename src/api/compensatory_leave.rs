//! Compensatory leave: an employee who worked on holidays asks for the days
//! back. Approval credits the leave ledger.

use std::collections::BTreeSet;

use crate::{
    api::workflow_docs::{self, DocFilter, Page},
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::{
        leave_request::{CompensatoryLeaveRequest, leave_days},
        workflow::{WorkflowDoc, WorkflowStatus},
    },
    push::{
        self,
        fcm::{FcmClient, PushMessage},
    },
    utils::{attendance_calc::DateRange, clock, holidays, workflow::ActionInput},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

const COMP_COLUMNS: &str = "id, employee_id, leave_type, work_from_date, work_end_date, half_day, reason, \
     approver_user_id, status, decided_by, decided_at, created_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCompensatory {
    pub employee_id: Option<u64>,
    #[schema(example = "Compensatory Off")]
    pub leave_type: String,
    #[schema(example = "2026-03-06", format = "date", value_type = String)]
    pub work_from_date: NaiveDate,
    #[schema(example = "2026-03-07", format = "date", value_type = String)]
    pub work_end_date: NaiveDate,
    #[serde(default)]
    pub half_day: bool,
    #[schema(example = "Release weekend")]
    pub reason: Option<String>,
}

/// Dates of `range` missing from `covered`.
fn uncovered(range: &DateRange, covered: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
    range.days().filter(|d| !covered.contains(d)).collect()
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
}

async fn attended_dates(pool: &MySqlPool, employee_id: u64, range: &DateRange) -> ApiResult<BTreeSet<NaiveDate>> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT attendance_date FROM attendance
        WHERE employee_id = ? AND attendance_date BETWEEN ? AND ?
          AND docstatus < 2 AND status IN ('Present', 'Work From Home', 'Half Day')
        "#,
    )
    .bind(employee_id)
    .bind(range.start)
    .bind(range.end)
    .fetch_all(pool)
    .await?;
    Ok(dates.into_iter().collect())
}

/// Request compensatory leave for worked holidays
#[utoipa::path(
    post,
    path = "/api/compensatory-leave",
    request_body = CreateCompensatory,
    responses(
        (status = 200, description = "Request submitted", body = Object, example = json!({
            "status": "success",
            "message": "Compensatory leave request submitted",
            "data": {"id": 4, "days": 2.0, "status": "Open"}
        })),
        (status = 400, description = "Invalid dates, not holidays, or no attendance on them"),
        (status = 404, description = "Employee or compensatory leave type not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Compensatory Leave"
)]
pub async fn create_compensatory(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    payload: web::Json<CreateCompensatory>,
) -> ApiResult<HttpResponse> {
    let range = DateRange::new(payload.work_from_date, payload.work_end_date)
        .ok_or_else(|| ApiError::bad_request("Work end date cannot be before work from date"))?;
    if range.end > clock::today(config.business_offset()) {
        return Err(ApiError::bad_request("Compensatory leave cannot be requested for future dates"));
    }

    let employee = workflow_docs::filing_employee(pool.get_ref(), &auth, payload.employee_id).await?;
    let leave_type = payload.leave_type.trim();
    let is_compensatory = sqlx::query_scalar::<_, bool>("SELECT is_compensatory FROM leave_types WHERE name = ?")
        .bind(leave_type)
        .fetch_optional(pool.get_ref())
        .await?;
    if is_compensatory != Some(true) {
        return Err(ApiError::not_found(format!("Compensatory leave type {leave_type} not found")));
    }

    let holidays = holidays::for_list(pool.get_ref(), employee.holiday_list_id).await?;
    let not_holidays = uncovered(&range, &holidays);
    if !not_holidays.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Not holidays: {}",
            join_dates(&not_holidays)
        )));
    }

    let attended = attended_dates(pool.get_ref(), employee.id, &range).await?;
    let absent = uncovered(&range, &attended);
    if !absent.is_empty() {
        return Err(ApiError::bad_request(format!(
            "No attendance marked on: {}",
            join_dates(&absent)
        )));
    }

    let id = sqlx::query(
        r#"
        INSERT INTO compensatory_leave_requests
            (employee_id, leave_type, work_from_date, work_end_date, half_day, reason, approver_user_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee.id)
    .bind(leave_type)
    .bind(range.start)
    .bind(range.end)
    .bind(payload.half_day)
    .bind(payload.reason.as_deref())
    .bind(employee.leave_approver_user_id)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    let days = leave_days(range.start, range.end, payload.half_day);
    tracing::info!(id, employee_id = employee.id, days, "Compensatory leave request created");

    if let Some(approver) = employee.leave_approver_user_id {
        let msg = PushMessage::new(
            "Compensatory Leave Request",
            format!("{} requested {days} compensatory day(s)", employee.employee_name),
        )
        .with_data("doctype", WorkflowDoc::CompensatoryLeave.label())
        .with_data("docname", id);
        push::notify_users(pool.get_ref(), fcm.get_ref(), &[approver], &msg, Some(auth.user_id)).await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Compensatory leave request submitted",
        "data": {"id": id, "days": days, "status": WorkflowStatus::Open},
    })))
}

/// Compensatory leave requests
#[utoipa::path(
    get,
    path = "/api/compensatory-leave",
    params(DocFilter),
    responses((status = 200, description = "Paginated requests")),
    security(("bearer_auth" = [])),
    tag = "Compensatory Leave"
)]
pub async fn list_compensatory(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DocFilter>,
) -> ApiResult<HttpResponse> {
    let page: Page<CompensatoryLeaveRequest> =
        workflow_docs::list_docs(pool.get_ref(), &auth, WorkflowDoc::CompensatoryLeave, COMP_COLUMNS, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    get,
    path = "/api/compensatory-leave/{id}",
    params(("id" = u64, Path, description = "Request id")),
    responses(
        (status = 200, description = "Compensatory leave request", body = CompensatoryLeaveRequest),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Compensatory Leave"
)]
pub async fn get_compensatory(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let doc: CompensatoryLeaveRequest = workflow_docs::get_doc(
        pool.get_ref(),
        &auth,
        WorkflowDoc::CompensatoryLeave,
        COMP_COLUMNS,
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(doc))
}

/// Approve, reject or cancel; approval credits the ledger
#[utoipa::path(
    put,
    path = "/api/compensatory-leave/{id}/{action}",
    params(
        ("id" = u64, Path, description = "Request id"),
        ("action" = String, Path, description = "approve, reject or cancel")
    ),
    responses(
        (status = 200, description = "Transition applied"),
        (status = 403, description = "Not allowed to act"),
        (status = 404, description = "Not found or unknown action"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    security(("bearer_auth" = [])),
    tag = "Compensatory Leave"
)]
pub async fn decide_compensatory(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    path: web::Path<(u64, String)>,
) -> ApiResult<HttpResponse> {
    let (id, action) = path.into_inner();
    let action = workflow_docs::parse_action(&action)?;
    workflow_docs::decide(
        pool.get_ref(),
        fcm.get_ref(),
        config.get_ref(),
        &auth,
        WorkflowDoc::CompensatoryLeave,
        id,
        action,
        ActionInput::default(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::workflow::WorkflowAction;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn lists_dates_outside_the_covered_set() {
        let range = DateRange::new(d(6), d(9)).unwrap();
        let covered: BTreeSet<_> = [d(6), d(7), d(9)].into_iter().collect();
        assert_eq!(uncovered(&range, &covered), vec![d(8)]);
        assert_eq!(join_dates(&[d(8), d(10)]), "2026-03-08, 2026-03-10");
    }

    #[test]
    fn fully_covered_range_has_nothing_missing() {
        let range = DateRange::new(d(6), d(6)).unwrap();
        let covered: BTreeSet<_> = [d(6)].into_iter().collect();
        assert!(uncovered(&range, &covered).is_empty());
    }

    #[test]
    fn action_names_parse() {
        assert_eq!(workflow_docs::parse_action("approve").unwrap(), WorkflowAction::Approve);
        assert!(workflow_docs::parse_action("submit").is_err());
    }
}
