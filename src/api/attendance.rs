use std::collections::BTreeMap;
use std::str::FromStr;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    db::is_duplicate_key,
    error::{ApiError, ApiResult},
    model::{
        attendance::{
            ATTENDANCE_COLUMNS, Attendance, AttendanceStatus, DocStatus, GEO_LOG_APPROVED,
            GEO_LOG_COLUMNS, GeoAction, GeoLog, WorkType,
        },
        employee::{Employee, find_employee},
        holiday::Holiday,
        office::OfficeLocation,
    },
    utils::{
        attendance_calc::{DateRange, can_submit, display_status, round_to, working_hours},
        clock,
        geo::Coordinates,
        holidays,
    },
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct GeoAttendanceReq {
    /// Defaults to the caller's employee record. Acting for someone else needs an HR role.
    #[schema(example = 12)]
    pub employee_id: Option<u64>,
    #[schema(example = "Check-In")]
    pub action: String,
    #[schema(example = 23.7806)]
    pub latitude: Option<f64>,
    #[schema(example = 90.4074)]
    pub longitude: Option<f64>,
    /// `Office` (default) or `WFH`
    #[schema(example = "Office")]
    pub work_type: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct EmployeeParam {
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
pub struct RangeQuery {
    pub employee_id: Option<u64>,
    #[param(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[param(value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceView {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub attendance_date: NaiveDate,
    /// Derived status: drafts with a check-in show as Present.
    pub status: String,
    pub docstatus: i8,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub in_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub out_time: Option<NaiveDateTime>,
    pub working_hours: Option<f64>,
    pub work_type: String,
}

impl From<Attendance> for AttendanceView {
    fn from(a: Attendance) -> Self {
        Self {
            status: display_status(a.docstatus, &a.status, a.in_time),
            working_hours: a.working_hours.or_else(|| working_hours(a.in_time, a.out_time)),
            work_type: a.work_type.unwrap_or_else(|| WorkType::Office.to_string()),
            id: a.id,
            employee_id: a.employee_id,
            attendance_date: a.attendance_date,
            docstatus: a.docstatus,
            in_time: a.in_time,
            out_time: a.out_time,
        }
    }
}

fn parse_work_type(raw: Option<&str>) -> ApiResult<WorkType> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(WorkType::Office),
        Some(raw) => WorkType::from_str(raw)
            .map_err(|_| ApiError::bad_request("Invalid work type: Must be Office or WFH")),
    }
}

async fn active_employee(pool: &MySqlPool, employee_id: u64) -> ApiResult<Employee> {
    find_employee(pool, employee_id)
        .await?
        .filter(Employee::is_active)
        .ok_or_else(|| ApiError::not_found("Invalid Employee ID"))
}

async fn office_for(pool: &MySqlPool, employee: &Employee) -> ApiResult<OfficeLocation> {
    let office_id = employee
        .office_location_id
        .ok_or_else(|| ApiError::bad_request("No office location assigned to employee"))?;

    sqlx::query_as::<_, OfficeLocation>(
        "SELECT id, name, latitude, longitude, radius_m FROM office_locations WHERE id = ?",
    )
    .bind(office_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Office location {office_id} not found")))
}

/// Distance from the office, or an error when the point lies outside its radius.
async fn check_geofence(pool: &MySqlPool, employee: &Employee, point: Coordinates) -> ApiResult<f64> {
    let office = office_for(pool, employee).await?;
    let fence = office
        .geofence()
        .map_err(|e| ApiError::Internal(format!("office location {} is invalid: {e}", office.id)))?;

    let distance = fence.distance_m(point);
    if !fence.contains(point) {
        return Err(ApiError::bad_request(format!(
            "You are outside the office geofence: {:.0} m from {} (allowed {:.0} m)",
            distance, office.name, fence.radius_m
        )));
    }
    Ok(round_to(distance, 1))
}

/// Coordinates to record for a geo action. Office attendance needs a valid
/// pair; WFH accepts anything and keeps the pair only when it is valid.
fn position_for(
    work_type: WorkType,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> ApiResult<Option<Coordinates>> {
    match work_type {
        WorkType::Office => Coordinates::from_optional(latitude, longitude)?
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("Location coordinates are required for non-WFH attendance")),
        WorkType::Wfh => Ok(Coordinates::from_optional(latitude, longitude).ok().flatten()),
    }
}

/// Same-day guards: one approved log per action, and Check-Out only after a Check-In.
fn precheck(action: GeoAction, same_action_today: i64, check_ins_today: i64) -> ApiResult<()> {
    if same_action_today > 0 {
        return Err(ApiError::conflict(format!("You have already performed {action} today")));
    }
    if action == GeoAction::CheckOut && check_ins_today == 0 {
        return Err(ApiError::bad_request("No Check-In found for today"));
    }
    Ok(())
}

async fn count_geo_logs(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    action: GeoAction,
    since: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM geo_logs
        WHERE employee_id = ? AND action = ? AND status = ? AND logged_at >= ?
        "#,
    )
    .bind(employee_id)
    .bind(action.to_string())
    .bind(GEO_LOG_APPROVED)
    .bind(since)
    .fetch_one(&mut **tx)
    .await
}

async fn active_attendance_for_update(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
         WHERE employee_id = ? AND attendance_date = ? AND docstatus < 2 FOR UPDATE"
    ))
    .bind(employee_id)
    .bind(date)
    .fetch_optional(&mut **tx)
    .await
}

/// Creates the day's draft attendance.
async fn open_attendance(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    at: NaiveDateTime,
    work_type: WorkType,
    user_id: u64,
) -> ApiResult<u64> {
    if active_attendance_for_update(tx, employee_id, at.date()).await?.is_some() {
        return Err(ApiError::conflict("Attendance already marked for today"));
    }

    let status = match work_type {
        WorkType::Wfh => AttendanceStatus::WorkFromHome,
        WorkType::Office => AttendanceStatus::Present,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO attendance
            (employee_id, attendance_date, status, in_time, work_type, docstatus, modified_by)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(at.date())
    .bind(status.to_string())
    .bind(at)
    .bind(work_type.to_string())
    .bind(DocStatus::Draft.as_i8())
    .bind(user_id)
    .execute(&mut **tx)
    .await;

    match result {
        Ok(res) => Ok(res.last_insert_id()),
        Err(e) if is_duplicate_key(&e) => Err(ApiError::conflict("Attendance already marked for today")),
        Err(e) => Err(e.into()),
    }
}

/// Records the check-out on the day's attendance. Drafts become WFH when
/// checking out as WFH and are submitted once out_time > in_time; submitted
/// records only get their out_time updated.
async fn close_attendance(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    at: NaiveDateTime,
    work_type: WorkType,
    user_id: u64,
) -> ApiResult<u64> {
    let attendance = active_attendance_for_update(tx, employee_id, at.date())
        .await?
        .ok_or_else(|| ApiError::bad_request("No attendance found for Check-Out"))?;
    let hours = working_hours(attendance.in_time, Some(at));

    if attendance.doc_status() == Some(DocStatus::Submitted) {
        sqlx::query(
            "UPDATE attendance SET out_time = ?, working_hours = ?, modified_by = ? WHERE id = ?",
        )
        .bind(at)
        .bind(hours)
        .bind(user_id)
        .bind(attendance.id)
        .execute(&mut **tx)
        .await?;
        return Ok(attendance.id);
    }

    let status = if work_type == WorkType::Wfh {
        AttendanceStatus::WorkFromHome.to_string()
    } else {
        attendance.status.clone()
    };
    let docstatus = if can_submit(attendance.in_time, Some(at)) {
        DocStatus::Submitted
    } else {
        DocStatus::Draft
    };

    sqlx::query(
        r#"
        UPDATE attendance
        SET out_time = ?, working_hours = ?, status = ?, docstatus = ?, modified_by = ?
        WHERE id = ?
        "#,
    )
    .bind(at)
    .bind(hours)
    .bind(status)
    .bind(docstatus.as_i8())
    .bind(user_id)
    .bind(attendance.id)
    .execute(&mut **tx)
    .await?;

    if docstatus == DocStatus::Draft {
        info!(attendance_id = attendance.id, "Check-out recorded, attendance left in draft");
    }
    Ok(attendance.id)
}

/// Geo-fenced check-in / check-out
#[utoipa::path(
    post,
    path = "/api/attendance/geo",
    request_body = GeoAttendanceReq,
    responses(
        (status = 200, description = "Action recorded", body = Object, example = json!({
            "status": "Approved",
            "message": "Check-In Successfully",
            "geo_log": {"id": 41, "action": "Check-In"},
            "attendance": {"id": 17, "status": "Present", "docstatus": 0}
        })),
        (status = 400, description = "Invalid input, outside the geofence or no check-in today"),
        (status = 403, description = "Not WFH eligible, or acting for another employee"),
        (status = 404, description = "Employee not found or inactive"),
        (status = 409, description = "Action already performed today")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(
    name = "geo_attendance",
    skip(auth, pool, config, body),
    fields(user_id = auth.user_id, action = %body.action)
)]
pub async fn geo_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Json<GeoAttendanceReq>,
) -> ApiResult<HttpResponse> {
    let employee_id = auth.target_employee(body.employee_id)?;
    let employee = active_employee(pool.get_ref(), employee_id).await?;

    let action = GeoAction::from_str(body.action.trim())
        .map_err(|_| ApiError::bad_request("Invalid action: Must be Check-In or Check-Out"))?;
    let work_type = parse_work_type(body.work_type.as_deref())?;

    if work_type == WorkType::Wfh && !employee.wfh_eligible {
        return Err(ApiError::forbidden(
            "You are not authorized to mark Work From Home attendance",
        ));
    }

    let point = position_for(work_type, body.latitude, body.longitude)?;
    let distance = match (work_type, point) {
        (WorkType::Office, Some(point)) => Some(check_geofence(pool.get_ref(), &employee, point).await?),
        _ => None,
    };

    let now = clock::now_local(config.business_offset());
    let day_start = now.date().and_time(NaiveTime::MIN);

    let mut tx = pool.begin().await?;

    // serialises concurrent requests for the same employee
    sqlx::query("SELECT id FROM employees WHERE id = ? FOR UPDATE")
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

    let same_action_today = count_geo_logs(&mut tx, employee_id, action, day_start).await?;
    let check_ins_today = match action {
        GeoAction::CheckIn => same_action_today,
        GeoAction::CheckOut => count_geo_logs(&mut tx, employee_id, GeoAction::CheckIn, day_start).await?,
    };
    precheck(action, same_action_today, check_ins_today)?;

    let geo_log_id = sqlx::query(
        r#"
        INSERT INTO geo_logs
            (employee_id, action, logged_at, latitude, longitude, distance_m, work_type, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(action.to_string())
    .bind(now)
    .bind(point.map(|p| p.latitude))
    .bind(point.map(|p| p.longitude))
    .bind(distance)
    .bind(work_type.to_string())
    .bind(GEO_LOG_APPROVED)
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    let attendance_id = match action {
        GeoAction::CheckIn => open_attendance(&mut tx, employee_id, now, work_type, auth.user_id).await?,
        GeoAction::CheckOut => close_attendance(&mut tx, employee_id, now, work_type, auth.user_id).await?,
    };

    sqlx::query("UPDATE geo_logs SET attendance_id = ? WHERE id = ?")
        .bind(attendance_id)
        .bind(geo_log_id)
        .execute(&mut *tx)
        .await?;

    let geo_log = sqlx::query_as::<_, GeoLog>(&format!(
        "SELECT {GEO_LOG_COLUMNS} FROM geo_logs WHERE id = ?"
    ))
    .bind(geo_log_id)
    .fetch_one(&mut *tx)
    .await?;
    let attendance = sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?"
    ))
    .bind(attendance_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(employee_id, attendance_id, geo_log_id, ?distance, "Geo attendance recorded");

    Ok(HttpResponse::Ok().json(json!({
        "status": "Approved",
        "message": format!("{action} Successfully"),
        "geo_log": geo_log,
        "attendance": attendance,
    })))
}

/// Office location and radius assigned to an employee
#[utoipa::path(
    get,
    path = "/api/attendance/office-location",
    params(EmployeeParam),
    responses(
        (status = 200, description = "Office geofence", body = Object, example = json!({
            "name": "Dhaka HQ", "latitude": 23.7806, "longitude": 90.4074, "radius": 100.0
        })),
        (status = 400, description = "No office location assigned"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn office_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeParam>,
) -> ApiResult<HttpResponse> {
    let employee_id = auth.target_employee(query.employee_id)?;
    let employee = find_employee(pool.get_ref(), employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invalid Employee ID"))?;
    let office = office_for(pool.get_ref(), &employee).await?;

    Ok(HttpResponse::Ok().json(json!({
        "name": office.name,
        "latitude": office.latitude,
        "longitude": office.longitude,
        "radius": office.radius_m,
    })))
}

pub(crate) async fn employee_records(
    pool: &MySqlPool,
    employee_id: u64,
    range: DateRange,
) -> Result<Vec<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
         WHERE employee_id = ? AND attendance_date BETWEEN ? AND ? AND docstatus < 2 \
         ORDER BY attendance_date DESC"
    ))
    .bind(employee_id)
    .bind(range.start)
    .bind(range.end)
    .fetch_all(pool)
    .await
}

fn checked_range(start: NaiveDate, end: NaiveDate) -> ApiResult<DateRange> {
    DateRange::new(start, end).ok_or_else(|| ApiError::bad_request("End date cannot be before start date"))
}

/// Own attendance records (HR may pass `employee_id`)
#[utoipa::path(
    get,
    path = "/api/attendance/my",
    params(RangeQuery),
    responses(
        (status = 200, description = "Attendance records with derived status", body = Object, example = json!({
            "status": "success",
            "message": "Attendance records fetched successfully",
            "data": [{
                "id": 17, "employee_id": 12, "attendance_date": "2026-03-02",
                "status": "Present", "docstatus": 0,
                "in_time": "2026-03-02T09:12:00", "out_time": null,
                "working_hours": null, "work_type": "Office"
            }]
        })),
        (status = 400, description = "Invalid date range")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RangeQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = auth.target_employee(query.employee_id)?;
    let range = checked_range(query.start_date, query.end_date)?;

    let records: Vec<AttendanceView> = employee_records(pool.get_ref(), employee_id, range)
        .await?
        .into_iter()
        .map(AttendanceView::from)
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Attendance records fetched successfully",
        "data": records,
    })))
}

/// Date → status map: submitted records first, then holidays.
pub fn calendar_events(
    range: DateRange,
    submitted: &BTreeMap<NaiveDate, String>,
    holidays: &std::collections::BTreeSet<NaiveDate>,
) -> BTreeMap<String, String> {
    range
        .days()
        .filter_map(|day| {
            let status = submitted
                .get(&day)
                .cloned()
                .or_else(|| holidays.contains(&day).then(|| "Holiday".to_string()))?;
            Some((day.format("%Y-%m-%d").to_string(), status))
        })
        .collect()
}

/// Calendar of submitted attendance and holidays
#[utoipa::path(
    get,
    path = "/api/attendance/calendar",
    params(RangeQuery),
    responses(
        (status = 200, description = "Date to status map", body = Object, example = json!({
            "2026-03-02": "Present", "2026-03-06": "Holiday"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn calendar(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RangeQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = auth.target_employee(query.employee_id)?;
    let range = checked_range(query.start_date, query.end_date)?;
    let employee = find_employee(pool.get_ref(), employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invalid Employee ID"))?;

    let submitted: BTreeMap<NaiveDate, String> = sqlx::query_as::<_, (NaiveDate, String)>(
        r#"
        SELECT attendance_date, status FROM attendance
        WHERE employee_id = ? AND attendance_date BETWEEN ? AND ? AND docstatus = 1
        "#,
    )
    .bind(employee_id)
    .bind(range.start)
    .bind(range.end)
    .fetch_all(pool.get_ref())
    .await?
    .into_iter()
    .collect();

    let holidays = holidays::for_list(pool.get_ref(), employee.holiday_list_id).await?;

    Ok(HttpResponse::Ok().json(calendar_events(range, &submitted, &holidays)))
}

/// Holidays in a date range (the caller's holiday list when they have one)
#[utoipa::path(
    get,
    path = "/api/attendance/holidays",
    params(RangeQuery),
    responses(
        (status = 200, description = "Holidays", body = Object, example = json!({
            "status": "success",
            "message": "Holidays fetched successfully",
            "data": [{"holiday_date": "2026-03-26", "description": "Independence Day", "weekly_off": false}]
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn holidays_in_range(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RangeQuery>,
) -> ApiResult<HttpResponse> {
    let range = checked_range(query.start_date, query.end_date)?;

    let list_id = match auth.employee_id {
        Some(id) => find_employee(pool.get_ref(), id)
            .await?
            .and_then(|e| e.holiday_list_id),
        None => None,
    };

    let data = match list_id {
        Some(list_id) => {
            sqlx::query_as::<_, Holiday>(
                r#"
                SELECT holiday_date, description, weekly_off FROM holidays
                WHERE holiday_list_id = ? AND holiday_date BETWEEN ? AND ?
                ORDER BY holiday_date
                "#,
            )
            .bind(list_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(pool.get_ref())
            .await?
        }
        None => {
            sqlx::query_as::<_, Holiday>(
                r#"
                SELECT holiday_date, MIN(description) AS description, MIN(weekly_off) AS weekly_off
                FROM holidays
                WHERE holiday_date BETWEEN ? AND ?
                GROUP BY holiday_date
                ORDER BY holiday_date
                "#,
            )
            .bind(range.start)
            .bind(range.end)
            .fetch_all(pool.get_ref())
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Holidays fetched successfully",
        "data": data,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn office_needs_a_valid_pair() {
        let point = position_for(WorkType::Office, Some(23.78), Some(90.40)).unwrap();
        assert_eq!(point, Some(Coordinates { latitude: 23.78, longitude: 90.40 }));
        assert!(matches!(position_for(WorkType::Office, None, None), Err(ApiError::BadRequest(_))));
        assert!(matches!(position_for(WorkType::Office, Some(200.0), Some(0.0)), Err(ApiError::BadRequest(_))));
        assert!(matches!(position_for(WorkType::Office, Some(23.7), None), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn wfh_accepts_any_coordinates() {
        assert_eq!(position_for(WorkType::Wfh, Some(200.0), Some(0.0)).unwrap(), None);
        assert_eq!(position_for(WorkType::Wfh, Some(23.7), None).unwrap(), None);
        assert_eq!(position_for(WorkType::Wfh, None, None).unwrap(), None);
        assert!(position_for(WorkType::Wfh, Some(23.7), Some(90.4)).unwrap().is_some());
    }

    #[test]
    fn second_check_in_or_out_same_day_conflicts() {
        assert!(matches!(precheck(GeoAction::CheckIn, 1, 1), Err(ApiError::Conflict(_))));
        assert!(matches!(precheck(GeoAction::CheckOut, 1, 1), Err(ApiError::Conflict(_))));
    }

    #[test]
    fn check_out_requires_check_in() {
        assert!(matches!(precheck(GeoAction::CheckOut, 0, 0), Err(ApiError::BadRequest(_))));
        assert!(precheck(GeoAction::CheckOut, 0, 1).is_ok());
        assert!(precheck(GeoAction::CheckIn, 0, 0).is_ok());
    }

    #[test]
    fn work_type_defaults_to_office() {
        assert_eq!(parse_work_type(None).unwrap(), WorkType::Office);
        assert_eq!(parse_work_type(Some("  ")).unwrap(), WorkType::Office);
        assert_eq!(parse_work_type(Some("WFH")).unwrap(), WorkType::Wfh);
        assert!(matches!(parse_work_type(Some("Remote")), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn calendar_prefers_attendance_over_holiday() {
        let range = DateRange::new(d(1), d(4)).unwrap();
        let submitted: BTreeMap<_, _> = [(d(2), "Present".to_string()), (d(3), "Work From Home".to_string())].into();
        let holidays: BTreeSet<_> = [d(3), d(4)].into();

        let events = calendar_events(range, &submitted, &holidays);
        assert_eq!(events.len(), 3);
        assert_eq!(events["2026-03-02"], "Present");
        assert_eq!(events["2026-03-03"], "Work From Home");
        assert_eq!(events["2026-03-04"], "Holiday");
        assert!(!events.contains_key("2026-03-01"));
    }

    #[test]
    fn view_derives_status_and_defaults() {
        let at = d(2).and_hms_opt(9, 0, 0).unwrap();
        let view = AttendanceView::from(Attendance {
            id: 1,
            employee_id: 2,
            attendance_date: d(2),
            status: "Work From Home".into(),
            in_time: Some(at),
            out_time: Some(d(2).and_hms_opt(17, 30, 0).unwrap()),
            work_type: None,
            working_hours: None,
            docstatus: 0,
            modified_at: at,
            modified_by: None,
        });
        assert_eq!(view.status, "Present");
        assert_eq!(view.work_type, "Office");
        assert_eq!(view.working_hours, Some(8.5));
    }
}
