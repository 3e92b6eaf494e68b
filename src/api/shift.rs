use crate::{
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::{
        employee::find_employee,
        shift::{SHIFT_ASSIGNMENT_SELECT, ShiftAssignment},
    },
    utils::attendance_calc::DateRange,
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct ShiftQuery {
    /// Defaults to the caller. Other employees need an HR role.
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
pub struct AssignmentQuery {
    pub employee_id: Option<u64>,
    #[param(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[param(value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

fn assignment_range(start: NaiveDate, end: NaiveDate) -> ApiResult<DateRange> {
    DateRange::new(start, end).ok_or_else(|| ApiError::bad_request("End date cannot be before start date"))
}

async fn known_employee(pool: &MySqlPool, auth: &AuthUser, requested: Option<u64>) -> ApiResult<u64> {
    let employee_id = auth.target_employee(requested)?;
    find_employee(pool, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Employee {employee_id} does not exist")))?;
    Ok(employee_id)
}

/// All active shift assignments of an employee, oldest first
#[utoipa::path(
    get,
    path = "/api/shifts",
    params(ShiftQuery),
    responses(
        (status = 200, description = "Shift assignments", body = [ShiftAssignment]),
        (status = 403, description = "Not allowed to view this employee"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Shifts"
)]
pub async fn list_shifts(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ShiftQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = known_employee(pool.get_ref(), &auth, query.employee_id).await?;

    let shifts = sqlx::query_as::<_, ShiftAssignment>(&format!(
        "{SHIFT_ASSIGNMENT_SELECT} WHERE sa.employee_id = ? AND sa.status = 'Active' ORDER BY sa.start_date"
    ))
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(shifts))
}

/// Active shift assignments overlapping a date range
#[utoipa::path(
    get,
    path = "/api/shift-assignments",
    params(AssignmentQuery),
    responses(
        (status = 200, description = "Assignments in range", body = Object, example = json!({
            "status": "success",
            "message": "Shift assignments fetched successfully",
            "data": [{"id": 3, "shift_type": "General", "start_date": "2026-01-01", "end_date": null}]
        })),
        (status = 400, description = "End date before start date"),
        (status = 403, description = "Not allowed to view this employee"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Shifts"
)]
pub async fn shift_assignments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AssignmentQuery>,
) -> ApiResult<HttpResponse> {
    let range = assignment_range(query.start_date, query.end_date)?;
    let employee_id = known_employee(pool.get_ref(), &auth, query.employee_id).await?;

    let data = sqlx::query_as::<_, ShiftAssignment>(&format!(
        "{SHIFT_ASSIGNMENT_SELECT} \
         WHERE sa.employee_id = ? AND sa.status = 'Active' \
           AND sa.start_date <= ? AND (sa.end_date IS NULL OR sa.end_date >= ?) \
         ORDER BY sa.start_date"
    ))
    .bind(employee_id)
    .bind(range.end)
    .bind(range.start)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Shift assignments fetched successfully",
        "data": data,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(matches!(assignment_range(d(10), d(9)), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn single_day_range_is_fine() {
        let range = assignment_range(d(10), d(10)).unwrap();
        assert_eq!((range.start, range.end), (d(10), d(10)));
    }
}
