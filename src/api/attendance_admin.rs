//! HR attendance correction and the daily attendance views.
//!
//! Corrections lock the attendance row, validate the resulting check-in /
//! check-out pair and recompute working hours in the same statement. The
//! bulk variants run each item on its own and report per-item outcomes.

use std::collections::HashSet;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::{
        attendance::{ATTENDANCE_COLUMNS, Attendance, AttendanceStatus, DocStatus},
        employee::{RosterEntry, active_roster},
    },
    utils::{
        attendance_calc::{is_late, late_minutes, percentage, working_hours},
        clock, holidays,
    },
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ManualCheckoutReq {
    /// Defaults to the configured end of day on the attendance date.
    #[schema(example = "2026-03-02 18:00:00")]
    pub checkout_time: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkCheckoutReq {
    #[schema(example = json!([17, 18]))]
    pub attendance_ids: Vec<u64>,
    pub default_checkout_time: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTimesReq {
    #[schema(example = "2026-03-02T09:00:00+06:00")]
    pub check_in_time: Option<String>,
    #[schema(example = "2026-03-02 17:45:00")]
    pub check_out_time: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TimesUpdateItem {
    pub attendance_id: u64,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkTimesReq {
    pub updates: Vec<TimesUpdateItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemFailure {
    pub attendance_id: u64,
    pub error: String,
}

/// Outcome of a bulk correction.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct BulkReport {
    pub successful: usize,
    pub failed: usize,
    pub successful_ids: Vec<u64>,
    pub failed_updates: Vec<ItemFailure>,
}

impl BulkReport {
    fn record<T>(&mut self, attendance_id: u64, result: ApiResult<T>) {
        match result {
            Ok(_) => {
                self.successful += 1;
                self.successful_ids.push(attendance_id);
            }
            Err(e) => {
                self.failed += 1;
                self.failed_updates.push(ItemFailure {
                    attendance_id,
                    error: e.to_string(),
                });
            }
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct DeleteQuery {
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct DateQuery {
    /// Defaults to today.
    #[param(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
pub struct ByDateQuery {
    #[param(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub employee_id: Option<u64>,
    pub department_id: Option<u64>,
}

/// Attendance joined with employee details.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct DayRecord {
    pub id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub attendance_date: NaiveDate,
    pub status: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub in_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub out_time: Option<NaiveDateTime>,
    pub working_hours: Option<f64>,
    pub work_type: Option<String>,
    pub docstatus: i8,
}

const DAY_RECORD_SELECT: &str = r#"
    SELECT a.id, a.employee_id, e.employee_name, d.name AS department, e.designation,
           a.attendance_date, a.status, a.in_time, a.out_time, a.working_hours,
           a.work_type, a.docstatus
    FROM attendance a
    JOIN employees e ON e.id = a.employee_id
    LEFT JOIN departments d ON d.id = e.department_id
"#;

fn parse_time_field(raw: Option<&str>, label: &str, config: &Config) -> ApiResult<Option<NaiveDateTime>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => clock::parse_datetime(raw, config.business_offset())
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid {label} time format: {raw}"))),
    }
}

/// Final check-in / check-out after applying the requested changes.
pub fn resolve_times(
    current: (Option<NaiveDateTime>, Option<NaiveDateTime>),
    new_in: Option<NaiveDateTime>,
    new_out: Option<NaiveDateTime>,
) -> ApiResult<(Option<NaiveDateTime>, Option<NaiveDateTime>)> {
    if new_in.is_none() && new_out.is_none() {
        return Err(ApiError::bad_request("No valid time provided for update"));
    }
    let in_time = new_in.or(current.0);
    let out_time = new_out.or(current.1);
    if let (Some(i), Some(o)) = (in_time, out_time) {
        if o <= i {
            return Err(ApiError::bad_request("Check-out time must be after check-in time"));
        }
    }
    Ok((in_time, out_time))
}

async fn lock_attendance(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    attendance_id: u64,
) -> ApiResult<Attendance> {
    let attendance = sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ? FOR UPDATE"
    ))
    .bind(attendance_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Attendance record not found"))?;

    if attendance.doc_status() == Some(DocStatus::Cancelled) {
        return Err(ApiError::conflict("Attendance record is cancelled"));
    }
    Ok(attendance)
}

async fn checkout_one(
    pool: &MySqlPool,
    config: &Config,
    attendance_id: u64,
    checkout: Option<NaiveDateTime>,
    user_id: u64,
) -> ApiResult<NaiveDateTime> {
    let mut tx = pool.begin().await?;
    let attendance = lock_attendance(&mut tx, attendance_id).await?;

    let in_time = attendance
        .in_time
        .ok_or_else(|| ApiError::bad_request("Cannot add checkout time without check-in time"))?;
    if attendance.out_time.is_some() {
        return Err(ApiError::conflict("Employee has already checked out"));
    }

    let checkout = checkout.unwrap_or_else(|| attendance.attendance_date.and_time(config.default_checkout_time));
    if checkout <= in_time {
        return Err(ApiError::bad_request("Checkout time must be after check-in time"));
    }

    // drafts are submitted once they have a valid check-out
    sqlx::query(
        r#"
        UPDATE attendance
        SET out_time = ?, working_hours = ?, docstatus = GREATEST(docstatus, ?), modified_by = ?
        WHERE id = ?
        "#,
    )
    .bind(checkout)
    .bind(working_hours(Some(in_time), Some(checkout)))
    .bind(DocStatus::Submitted.as_i8())
    .bind(user_id)
    .bind(attendance_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(attendance_id, employee_id = attendance.employee_id, %checkout, by = user_id, "Manual checkout added");
    Ok(checkout)
}

async fn update_times_one(
    pool: &MySqlPool,
    attendance_id: u64,
    new_in: Option<NaiveDateTime>,
    new_out: Option<NaiveDateTime>,
    user_id: u64,
) -> ApiResult<Attendance> {
    let mut tx = pool.begin().await?;
    let current = lock_attendance(&mut tx, attendance_id).await?;
    let (in_time, out_time) = resolve_times((current.in_time, current.out_time), new_in, new_out)?;

    sqlx::query(
        "UPDATE attendance SET in_time = ?, out_time = ?, working_hours = ?, modified_by = ? WHERE id = ?",
    )
    .bind(in_time)
    .bind(out_time)
    .bind(working_hours(in_time, out_time))
    .bind(user_id)
    .bind(attendance_id)
    .execute(&mut *tx)
    .await?;

    let updated = sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?"
    ))
    .bind(attendance_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(attendance_id, employee_id = current.employee_id, ?in_time, ?out_time, by = user_id, "Attendance times updated");
    Ok(updated)
}

/// Add a missing check-out
#[utoipa::path(
    post,
    path = "/api/attendance/{id}/manual-checkout",
    params(("id" = u64, Path, description = "Attendance ID")),
    request_body = ManualCheckoutReq,
    responses(
        (status = 200, description = "Checkout added", body = Object, example = json!({
            "status": "success",
            "message": "Checkout time added successfully",
            "attendance_id": 17,
            "checkout_time": "2026-03-02 18:00:00"
        })),
        (status = 400, description = "No check-in, or checkout not after check-in"),
        (status = 403, description = "HR roles only"),
        (status = 404, description = "Attendance not found"),
        (status = 409, description = "Already checked out")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn manual_checkout(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    body: web::Json<ManualCheckoutReq>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let attendance_id = path.into_inner();
    let checkout = parse_time_field(body.checkout_time.as_deref(), "checkout", &config)?;

    let checkout = checkout_one(pool.get_ref(), &config, attendance_id, checkout, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Checkout time added successfully",
        "attendance_id": attendance_id,
        "checkout_time": checkout.format("%Y-%m-%d %H:%M:%S").to_string(),
    })))
}

/// Add check-outs to several records
#[utoipa::path(
    post,
    path = "/api/attendance/bulk-checkout",
    request_body = BulkCheckoutReq,
    responses(
        (status = 200, description = "Per-item report", body = BulkReport),
        (status = 400, description = "Invalid default checkout time"),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn bulk_checkout(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Json<BulkCheckoutReq>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let checkout = parse_time_field(body.default_checkout_time.as_deref(), "checkout", &config)?;

    let mut report = BulkReport::default();
    for &id in &body.attendance_ids {
        let result = checkout_one(pool.get_ref(), &config, id, checkout, auth.user_id).await;
        report.record(id, result);
    }

    info!(successful = report.successful, failed = report.failed, "Bulk checkout processed");
    Ok(HttpResponse::Ok().json(report))
}

/// Correct check-in and/or check-out
#[utoipa::path(
    put,
    path = "/api/attendance/{id}/times",
    params(("id" = u64, Path, description = "Attendance ID")),
    request_body = UpdateTimesReq,
    responses(
        (status = 200, description = "Updated record", body = Attendance),
        (status = 400, description = "Nothing to update, bad format or check-out not after check-in"),
        (status = 403, description = "HR roles only"),
        (status = 404, description = "Attendance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn update_times(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    body: web::Json<UpdateTimesReq>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let new_in = parse_time_field(body.check_in_time.as_deref(), "check-in", &config)?;
    let new_out = parse_time_field(body.check_out_time.as_deref(), "check-out", &config)?;

    let updated = update_times_one(pool.get_ref(), path.into_inner(), new_in, new_out, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Correct times on several records
#[utoipa::path(
    post,
    path = "/api/attendance/bulk-times",
    request_body = BulkTimesReq,
    responses(
        (status = 200, description = "Per-item report", body = BulkReport),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn bulk_update_times(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Json<BulkTimesReq>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;

    let mut report = BulkReport::default();
    for item in &body.updates {
        let result = async {
            let new_in = parse_time_field(item.check_in_time.as_deref(), "check-in", &config)?;
            let new_out = parse_time_field(item.check_out_time.as_deref(), "check-out", &config)?;
            update_times_one(pool.get_ref(), item.attendance_id, new_in, new_out, auth.user_id).await
        }
        .await;
        report.record(item.attendance_id, result);
    }

    info!(successful = report.successful, failed = report.failed, "Bulk time update processed");
    Ok(HttpResponse::Ok().json(report))
}

/// Cancel a submitted record or delete a draft
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance ID"), DeleteQuery),
    responses(
        (status = 200, description = "Cancelled or deleted", body = Object, example = json!({
            "status": "success", "message": "Attendance record cancelled successfully", "attendance_id": 17
        })),
        (status = 403, description = "Admin or HR Manager only"),
        (status = 404, description = "Attendance not found"),
        (status = 409, description = "Already cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<DeleteQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_manager()?;
    let attendance_id = path.into_inner();

    let mut tx = pool.begin().await?;
    let attendance = lock_attendance(&mut tx, attendance_id).await?;

    let outcome = if attendance.doc_status() == Some(DocStatus::Submitted) {
        sqlx::query("UPDATE attendance SET docstatus = ?, modified_by = ? WHERE id = ?")
            .bind(DocStatus::Cancelled.as_i8())
            .bind(auth.user_id)
            .bind(attendance_id)
            .execute(&mut *tx)
            .await?;
        "cancelled"
    } else {
        sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(attendance_id)
            .execute(&mut *tx)
            .await?;
        "deleted"
    };
    tx.commit().await?;

    warn!(
        attendance_id,
        employee_id = attendance.employee_id,
        by = auth.user_id,
        reason = query.reason.as_deref().unwrap_or("Not provided"),
        "Attendance record {outcome}"
    );

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("Attendance record {outcome} successfully"),
        "attendance_id": attendance_id,
    })))
}

async fn day_records(pool: &MySqlPool, date: NaiveDate, extra: &str) -> Result<Vec<DayRecord>, sqlx::Error> {
    sqlx::query_as::<_, DayRecord>(&format!(
        "{DAY_RECORD_SELECT} WHERE a.attendance_date = ? AND a.docstatus < 2 {extra} ORDER BY a.in_time DESC"
    ))
    .bind(date)
    .fetch_all(pool)
    .await
}

fn target_date(query: &DateQuery, config: &Config) -> NaiveDate {
    query.date.unwrap_or_else(|| clock::today(config.business_offset()))
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Checked in but not out
#[utoipa::path(
    get,
    path = "/api/attendance/pending-checkouts",
    params(DateQuery),
    responses(
        (status = 200, description = "Records missing a check-out", body = Object, example = json!({
            "pending_checkouts": [], "total_pending": 0, "date": "2026-03-02"
        })),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn pending_checkouts(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let date = target_date(&query, &config);
    let pending = day_records(pool.get_ref(), date, "AND a.in_time IS NOT NULL AND a.out_time IS NULL").await?;

    Ok(HttpResponse::Ok().json(json!({
        "total_pending": pending.len(),
        "pending_checkouts": pending,
        "date": fmt_date(date),
    })))
}

/// Every active record on a date
#[utoipa::path(
    get,
    path = "/api/attendance/records",
    params(DateQuery),
    responses(
        (status = 200, description = "Records", body = Object, example = json!({
            "attendance_records": [], "total_records": 0, "date": "2026-03-02"
        })),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn records_for_date(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let date = target_date(&query, &config);
    let records = day_records(pool.get_ref(), date, "").await?;

    Ok(HttpResponse::Ok().json(json!({
        "total_records": records.len(),
        "attendance_records": records,
        "date": fmt_date(date),
    })))
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct RecordCounts {
    pub total_records: usize,
    pub has_checkin: usize,
    pub has_checkout: usize,
    pub missing_checkout: usize,
    pub missing_checkin: usize,
    pub submitted_records: usize,
    pub draft_records: usize,
    pub complete_records: usize,
}

impl RecordCounts {
    pub fn from_records(records: &[DayRecord]) -> Self {
        let count = |f: &dyn Fn(&DayRecord) -> bool| records.iter().filter(|r| f(r)).count();
        let has_checkin = count(&|r| r.in_time.is_some());
        let missing_checkout = count(&|r| r.in_time.is_some() && r.out_time.is_none());
        Self {
            total_records: records.len(),
            has_checkin,
            has_checkout: count(&|r| r.out_time.is_some()),
            missing_checkout,
            missing_checkin: count(&|r| r.in_time.is_none()),
            submitted_records: count(&|r| r.docstatus == DocStatus::Submitted.as_i8()),
            draft_records: count(&|r| r.docstatus == DocStatus::Draft.as_i8()),
            complete_records: has_checkin - missing_checkout,
        }
    }
}

/// Record counts and attendance rate for a date
#[utoipa::path(
    get,
    path = "/api/attendance/statistics",
    params(DateQuery),
    responses(
        (status = 200, description = "Statistics", body = Object, example = json!({
            "date": "2026-03-02",
            "total_employees": 40,
            "working_employees": 38,
            "employees_on_holiday": 2,
            "attendance_statistics": {"total_records": 35, "missing_checkout": 4},
            "attendance_rate": 92.1
        })),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn statistics(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let date = target_date(&query, &config);

    let records = day_records(pool.get_ref(), date, "").await?;
    let roster = active_roster(pool.get_ref(), None).await?;
    let on_holiday = holidays::roster_on_holiday(pool.get_ref(), &roster, date).await?;
    let working = roster.len() - on_holiday.len();
    let counts = RecordCounts::from_records(&records);

    Ok(HttpResponse::Ok().json(json!({
        "date": fmt_date(date),
        "total_employees": roster.len(),
        "working_employees": working,
        "employees_on_holiday": on_holiday.len(),
        "attendance_rate": percentage(counts.total_records as f64, working as f64),
        "attendance_statistics": counts,
    })))
}

fn counts_as_present(status: &str) -> bool {
    status == AttendanceStatus::Present.to_string() || status == AttendanceStatus::WorkFromHome.to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterStatus {
    pub employee_id: u64,
    pub employee_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub status: String,
}

impl RosterStatus {
    fn new(entry: &RosterEntry, status: &str) -> Self {
        Self {
            employee_id: entry.id,
            employee_name: entry.employee_name.clone(),
            department: entry.department.clone(),
            designation: entry.designation.clone(),
            status: status.to_string(),
        }
    }
}

/// Splits the roster employees without a qualifying record into absent and
/// holiday lists.
pub fn split_absent(
    roster: &[RosterEntry],
    accounted: &HashSet<u64>,
    on_holiday: &HashSet<u64>,
) -> (Vec<RosterStatus>, Vec<RosterStatus>) {
    let mut absent = Vec::new();
    let mut holiday = Vec::new();
    for entry in roster.iter().filter(|e| !accounted.contains(&e.id)) {
        if on_holiday.contains(&entry.id) {
            holiday.push(RosterStatus::new(entry, "Holiday"));
        } else {
            absent.push(RosterStatus::new(entry, &AttendanceStatus::Absent.to_string()));
        }
    }
    (absent, holiday)
}

/// Present, absent and holiday lists for a date
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    params(DateQuery),
    responses(
        (status = 200, description = "Daily overview", body = Object, example = json!({
            "present": [], "absent": [], "holiday": [],
            "total_employees": 40, "working_employees": 38, "date": "2026-03-02"
        })),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn today_overview(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let date = target_date(&query, &config);

    let present: Vec<DayRecord> = day_records(pool.get_ref(), date, "")
        .await?
        .into_iter()
        .filter(|r| counts_as_present(&r.status))
        .collect();
    let present_ids: HashSet<u64> = present.iter().map(|r| r.employee_id).collect();

    let roster = active_roster(pool.get_ref(), None).await?;
    let on_holiday = holidays::roster_on_holiday(pool.get_ref(), &roster, date).await?;
    let (absent, holiday) = split_absent(&roster, &present_ids, &on_holiday);

    Ok(HttpResponse::Ok().json(json!({
        "present": present,
        "absent": absent,
        "total_employees": roster.len(),
        "working_employees": roster.len() - holiday.len(),
        "holiday": holiday,
        "date": fmt_date(date),
    })))
}

/// Employees with no record today who are not on holiday
#[utoipa::path(
    get,
    path = "/api/attendance/absent",
    responses(
        (status = 200, description = "Absent employees", body = Object, example = json!({
            "absent_employees": [], "total_absent": 0, "date": "2026-03-02"
        })),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn absent_today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let date = clock::today(config.business_offset());

    let recorded: HashSet<u64> = day_records(pool.get_ref(), date, "")
        .await?
        .iter()
        .map(|r| r.employee_id)
        .collect();
    let roster = active_roster(pool.get_ref(), None).await?;
    let on_holiday = holidays::roster_on_holiday(pool.get_ref(), &roster, date).await?;
    let (absent, _) = split_absent(&roster, &recorded, &on_holiday);

    Ok(HttpResponse::Ok().json(json!({
        "total_absent": absent.len(),
        "absent_employees": absent,
        "date": fmt_date(date),
    })))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LateArrival {
    pub employee_id: u64,
    pub employee_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub check_in_time: NaiveDateTime,
    pub late_by_minutes: i64,
}

/// Present records checked in after `threshold`, latest first.
pub fn late_arrivals(records: &[DayRecord], threshold: chrono::NaiveTime) -> Vec<LateArrival> {
    let present = AttendanceStatus::Present.to_string();
    let mut late: Vec<LateArrival> = records
        .iter()
        .filter(|r| r.status == present)
        .filter_map(|r| {
            let in_time = r.in_time.filter(|t| is_late(*t, threshold))?;
            Some(LateArrival {
                employee_id: r.employee_id,
                employee_name: r.employee_name.clone(),
                department: r.department.clone(),
                designation: r.designation.clone(),
                check_in_time: in_time,
                late_by_minutes: late_minutes(in_time, threshold),
            })
        })
        .collect();
    late.sort_by(|a, b| b.late_by_minutes.cmp(&a.late_by_minutes));
    late
}

/// Late arrivals today
#[utoipa::path(
    get,
    path = "/api/attendance/late",
    responses(
        (status = 200, description = "Late arrivals sorted by minutes late", body = Object, example = json!({
            "late_arrivals": [{"employee_id": 12, "employee_name": "Nusrat Jahan", "late_by_minutes": 25}],
            "total_late": 1,
            "standard_time": "10:05",
            "date": "2026-03-02"
        })),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn late_today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let date = clock::today(config.business_offset());
    let records = day_records(pool.get_ref(), date, "").await?;
    let late = late_arrivals(&records, config.late_after);

    Ok(HttpResponse::Ok().json(json!({
        "total_late": late.len(),
        "late_arrivals": late,
        "standard_time": config.late_after.format("%H:%M").to_string(),
        "date": fmt_date(date),
    })))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: DayRecord,
    pub is_late: bool,
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct DaySummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub missing_checkout: usize,
    pub draft: usize,
}

impl DaySummary {
    pub fn from_records(records: &[DayRecord]) -> Self {
        let mut summary = DaySummary::default();
        for r in records {
            summary.total += 1;
            if r.docstatus == DocStatus::Draft.as_i8() {
                summary.draft += 1;
            } else if counts_as_present(&r.status) {
                summary.present += 1;
                if r.in_time.is_some() && r.out_time.is_none() {
                    summary.missing_checkout += 1;
                }
            } else {
                summary.absent += 1;
            }
        }
        summary
    }
}

/// Records on a date, filtered by employee and/or department
#[utoipa::path(
    get,
    path = "/api/attendance/by-date",
    params(ByDateQuery),
    responses(
        (status = 200, description = "Records with summary", body = Object, example = json!({
            "attendance_records": [],
            "total_records": 0,
            "date": "2026-03-02",
            "summary": {"total": 0, "present": 0, "absent": 0, "missing_checkout": 0, "draft": 0}
        })),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance Admin"
)]
pub async fn by_date(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ByDateQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;

    let mut records = sqlx::query_as::<_, DayRecord>(&format!(
        "{DAY_RECORD_SELECT} WHERE a.attendance_date = ? AND a.docstatus < 2 \
         AND (? IS NULL OR a.employee_id = ?) \
         AND (? IS NULL OR (e.department_id = ? AND e.status = 'Active')) \
         ORDER BY a.in_time DESC"
    ))
    .bind(query.date)
    .bind(query.employee_id)
    .bind(query.employee_id)
    .bind(query.department_id)
    .bind(query.department_id)
    .fetch_all(pool.get_ref())
    .await?;

    for r in &mut records {
        if r.working_hours.is_none() {
            r.working_hours = working_hours(r.in_time, r.out_time);
        }
    }
    let summary = DaySummary::from_records(&records);
    let enriched: Vec<EnrichedRecord> = records
        .into_iter()
        .map(|record| EnrichedRecord {
            is_late: record.in_time.is_some_and(|t| is_late(t, config.late_after)),
            record,
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "total_records": enriched.len(),
        "attendance_records": enriched,
        "date": fmt_date(query.date),
        "summary": summary,
    })))
}

pub(crate) async fn records_on(pool: &MySqlPool, date: NaiveDate) -> Result<Vec<DayRecord>, sqlx::Error> {
    day_records(pool, date, "").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn record(id: u64, status: &str, docstatus: i8, in_time: Option<NaiveDateTime>, out_time: Option<NaiveDateTime>) -> DayRecord {
        DayRecord {
            id,
            employee_id: id,
            employee_name: format!("Employee {id}"),
            department: None,
            designation: None,
            attendance_date: at(0, 0).date(),
            status: status.into(),
            in_time,
            out_time,
            working_hours: None,
            work_type: None,
            docstatus,
        }
    }

    fn roster(id: u64) -> RosterEntry {
        RosterEntry {
            id,
            employee_name: format!("Employee {id}"),
            department_id: None,
            department: None,
            designation: None,
            holiday_list_id: None,
        }
    }

    #[test]
    fn resolve_times_rejects_inverted_pair() {
        let current = (Some(at(9, 0)), None);
        let err = resolve_times(current, None, Some(at(8, 0))).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = resolve_times((Some(at(9, 0)), Some(at(17, 0))), Some(at(17, 0)), None).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn resolve_times_needs_a_change() {
        assert!(resolve_times((Some(at(9, 0)), None), None, None).is_err());
    }

    #[test]
    fn resolve_times_keeps_untouched_side() {
        let (i, o) = resolve_times((Some(at(9, 0)), Some(at(17, 0))), None, Some(at(18, 30))).unwrap();
        assert_eq!(i, Some(at(9, 0)));
        assert_eq!(o, Some(at(18, 30)));

        let (i, o) = resolve_times((None, None), Some(at(9, 15)), None).unwrap();
        assert_eq!((i, o), (Some(at(9, 15)), None));
    }

    #[test]
    fn counts_split_checkins_and_docstatus() {
        let records = vec![
            record(1, "Present", 1, Some(at(9, 0)), Some(at(17, 0))),
            record(2, "Present", 0, Some(at(9, 30)), None),
            record(3, "Absent", 1, None, None),
        ];
        let counts = RecordCounts::from_records(&records);
        assert_eq!(counts.total_records, 3);
        assert_eq!(counts.has_checkin, 2);
        assert_eq!(counts.has_checkout, 1);
        assert_eq!(counts.missing_checkout, 1);
        assert_eq!(counts.missing_checkin, 1);
        assert_eq!(counts.submitted_records, 2);
        assert_eq!(counts.draft_records, 1);
        assert_eq!(counts.complete_records, 1);
    }

    #[test]
    fn day_summary_counts_drafts_separately() {
        let records = vec![
            record(1, "Present", 1, Some(at(9, 0)), None),
            record(2, "Work From Home", 1, Some(at(9, 0)), Some(at(17, 0))),
            record(3, "Present", 0, Some(at(9, 0)), None),
            record(4, "On Leave", 1, None, None),
        ];
        assert_eq!(
            DaySummary::from_records(&records),
            DaySummary { total: 4, present: 2, absent: 1, missing_checkout: 1, draft: 1 }
        );
    }

    #[test]
    fn absentees_exclude_holidays_and_present() {
        let roster = vec![roster(1), roster(2), roster(3)];
        let accounted: HashSet<u64> = [1].into();
        let holiday: HashSet<u64> = [3].into();

        let (absent, off) = split_absent(&roster, &accounted, &holiday);
        assert_eq!(absent.iter().map(|a| a.employee_id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(absent[0].status, "Absent");
        assert_eq!(off.iter().map(|a| a.employee_id).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn late_arrivals_sorted_latest_first() {
        let threshold = NaiveTime::from_hms_opt(10, 5, 0).unwrap();
        let records = vec![
            record(1, "Present", 1, Some(at(10, 15)), None),
            record(2, "Present", 0, Some(at(10, 5)), None),
            record(3, "Present", 1, Some(at(11, 0)), None),
            record(4, "Work From Home", 1, Some(at(12, 0)), None),
        ];
        let late = late_arrivals(&records, threshold);
        assert_eq!(late.iter().map(|l| l.employee_id).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(late[0].late_by_minutes, 55);
    }
}
