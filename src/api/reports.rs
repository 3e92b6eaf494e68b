//! Attendance reports: per-employee history, organisation summaries, daily
//! analytics, the dashboard figures and file export.
//!
//! Every percentage uses working days (or working employees) as the
//! denominator, i.e. holidays are removed first.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use crate::{
    api::attendance_admin::records_on,
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::{
        attendance::{ATTENDANCE_COLUMNS, Attendance, AttendanceStatus},
        employee::{RosterEntry, active_roster, find_employee},
        workflow::WorkflowStatus,
    },
    utils::{
        attendance_calc::{DateRange, SummaryStats, Trend, is_late, percentage, round_to, summarize, trend, working_hours},
        clock,
        export::{self, Cell, ExportFormat, MAX_EXPORT_DAYS, Report},
        holidays::{self, HolidaySet},
    },
};
use actix_web::{HttpResponse, web};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
pub struct ReportQuery {
    #[param(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    pub department_id: Option<u64>,
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
pub struct ExportQuery {
    pub employee_id: Option<u64>,
    #[param(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[param(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    /// `pdf` (default) or `xlsx`
    pub format: Option<String>,
    pub department_id: Option<u64>,
}

fn resolve_range(start: Option<NaiveDate>, end: Option<NaiveDate>, config: &Config) -> ApiResult<DateRange> {
    let range = DateRange::resolve(start, end, clock::today(config.business_offset()))
        .ok_or_else(|| ApiError::bad_request("Start date cannot be after end date"))?;
    capped(range)
}

/// Every report walks the range day by day, so the span is limited.
fn capped(range: DateRange) -> ApiResult<DateRange> {
    if (range.end - range.start).num_days() > MAX_EXPORT_DAYS {
        return Err(ApiError::bad_request(format!("Date range cannot exceed {MAX_EXPORT_DAYS} days")));
    }
    Ok(range)
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ShiftWindow {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl ShiftWindow {
    fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end| date <= end)
    }
}

/// Shift in force on `date`; the most recently started assignment wins.
pub fn shift_on(shifts: &[ShiftWindow], date: NaiveDate) -> Option<&ShiftWindow> {
    shifts
        .iter()
        .filter(|s| s.covers(date))
        .max_by_key(|s| s.start_date)
}

async fn shifts_for(pool: &MySqlPool, employee_id: u64, range: DateRange) -> Result<Vec<ShiftWindow>, sqlx::Error> {
    sqlx::query_as::<_, ShiftWindow>(
        r#"
        SELECT sa.start_date, sa.end_date, st.start_time, st.end_time
        FROM shift_assignments sa
        JOIN shift_types st ON st.id = sa.shift_type_id
        WHERE sa.employee_id = ? AND sa.status = 'Active' AND sa.start_date <= ?
          AND (sa.end_date IS NULL OR sa.end_date >= ?)
        "#,
    )
    .bind(employee_id)
    .bind(range.end)
    .bind(range.start)
    .fetch_all(pool)
    .await
}

/// Non-cancelled attendance in `range`, optionally narrowed to an employee
/// or a department.
async fn range_records(
    pool: &MySqlPool,
    range: DateRange,
    employee_id: Option<u64>,
    department_id: Option<u64>,
) -> Result<Vec<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
         WHERE attendance_date BETWEEN ? AND ? AND docstatus < 2 \
         AND (? IS NULL OR employee_id = ?) \
         AND (? IS NULL OR employee_id IN (SELECT id FROM employees WHERE department_id = ?)) \
         ORDER BY attendance_date DESC"
    ))
    .bind(range.start)
    .bind(range.end)
    .bind(employee_id)
    .bind(employee_id)
    .bind(department_id)
    .bind(department_id)
    .fetch_all(pool)
    .await
}

fn group_by_employee(records: Vec<Attendance>) -> HashMap<u64, Vec<Attendance>> {
    let mut grouped: HashMap<u64, Vec<Attendance>> = HashMap::new();
    for r in records {
        grouped.entry(r.employee_id).or_default().push(r);
    }
    grouped
}

/// Roster employees with their holiday sets.
async fn roster_with_holidays(
    pool: &MySqlPool,
    department_id: Option<u64>,
    employee_id: Option<u64>,
) -> Result<Vec<(RosterEntry, HolidaySet)>, sqlx::Error> {
    let roster = active_roster(pool, department_id).await?;
    let mut out = Vec::with_capacity(roster.len());
    for entry in roster.into_iter().filter(|e| employee_id.is_none_or(|id| e.id == id)) {
        let set = holidays::for_list(pool, entry.holiday_list_id).await?;
        out.push((entry, set));
    }
    Ok(out)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryRecord {
    pub id: u64,
    #[schema(value_type = String, format = "date")]
    pub attendance_date: NaiveDate,
    pub status: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub in_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub out_time: Option<NaiveDateTime>,
    pub working_hours: Option<f64>,
    pub late_arrival: bool,
    #[schema(value_type = Option<String>)]
    pub shift_start: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub shift_end: Option<NaiveTime>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeHistory {
    pub employee_id: u64,
    pub employee_name: String,
    pub attendance_records: Vec<HistoryRecord>,
    pub summary_stats: SummaryStats,
    pub start_date: String,
    pub end_date: String,
}

pub fn build_history(
    employee_id: u64,
    employee_name: String,
    records: &[Attendance],
    range: DateRange,
    holidays: &BTreeSet<NaiveDate>,
    shifts: &[ShiftWindow],
    late_after: NaiveTime,
) -> EmployeeHistory {
    let attendance_records = records
        .iter()
        .map(|r| {
            let shift = shift_on(shifts, r.attendance_date);
            HistoryRecord {
                id: r.id,
                attendance_date: r.attendance_date,
                status: r.status.clone(),
                in_time: r.in_time,
                out_time: r.out_time,
                working_hours: r.working_hours.or_else(|| working_hours(r.in_time, r.out_time)),
                late_arrival: r.in_time.is_some_and(|t| is_late(t, late_after)),
                shift_start: shift.map(|s| s.start_time),
                shift_end: shift.map(|s| s.end_time),
            }
        })
        .collect();

    EmployeeHistory {
        employee_id,
        employee_name,
        attendance_records,
        summary_stats: summarize(records, range, holidays, late_after),
        start_date: fmt_date(range.start),
        end_date: fmt_date(range.end),
    }
}

async fn load_history(pool: &MySqlPool, config: &Config, employee_id: u64, range: DateRange) -> ApiResult<EmployeeHistory> {
    let employee = find_employee(pool, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Employee {employee_id} does not exist")))?;

    let records = range_records(pool, range, Some(employee_id), None).await?;
    let holidays = holidays::for_list(pool, employee.holiday_list_id).await?;
    let shifts = shifts_for(pool, employee_id, range).await?;

    Ok(build_history(
        employee_id,
        employee.employee_name,
        &records,
        range,
        &holidays,
        &shifts,
        config.late_after,
    ))
}

/// One employee's attendance history with summary statistics
#[utoipa::path(
    get,
    path = "/api/reports/history/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID"), ReportQuery),
    responses(
        (status = 200, description = "History", body = EmployeeHistory),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "HR roles only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn employee_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    query: web::Query<ReportQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let range = resolve_range(query.start_date, query.end_date, &config)?;
    let history = load_history(pool.get_ref(), &config, path.into_inner(), range).await?;
    Ok(HttpResponse::Ok().json(history))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeSummaryRow {
    pub employee_id: u64,
    pub employee_name: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    #[serde(flatten)]
    pub stats: SummaryStats,
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct OverallStats {
    pub total_employees: usize,
    pub total_present_days: usize,
    pub total_wfh_days: usize,
    pub total_absent_days: usize,
    pub total_working_hours: f64,
    pub avg_attendance_percentage: f64,
    /// Days in range minus any date that is a holiday for at least one employee.
    pub total_working_days: usize,
    pub date_range_days: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganisationSummary {
    pub employees_data: Vec<EmployeeSummaryRow>,
    pub overall_stats: OverallStats,
    pub start_date: String,
    pub end_date: String,
}

pub fn overall(rows: &[EmployeeSummaryRow], range: DateRange, holiday_union: &BTreeSet<NaiveDate>) -> OverallStats {
    let holiday_days = holiday_union.iter().filter(|d| range.contains(**d)).count();
    let total_pct: f64 = rows.iter().map(|r| r.stats.attendance_percentage).sum();
    OverallStats {
        total_employees: rows.len(),
        total_present_days: rows.iter().map(|r| r.stats.present_days).sum(),
        total_wfh_days: rows.iter().map(|r| r.stats.wfh_days).sum(),
        total_absent_days: rows.iter().map(|r| r.stats.absent_days).sum(),
        total_working_hours: round_to(rows.iter().map(|r| r.stats.total_working_hours).sum(), 2),
        avg_attendance_percentage: if rows.is_empty() {
            0.0
        } else {
            round_to(total_pct / rows.len() as f64, 1)
        },
        total_working_days: (range.num_days() as usize).saturating_sub(holiday_days),
        date_range_days: range.num_days(),
    }
}

async fn load_summary(
    pool: &MySqlPool,
    config: &Config,
    range: DateRange,
    department_id: Option<u64>,
) -> ApiResult<OrganisationSummary> {
    let members = roster_with_holidays(pool, department_id, None).await?;
    let mut records = group_by_employee(range_records(pool, range, None, department_id).await?);

    let mut holiday_union = BTreeSet::new();
    let employees_data: Vec<EmployeeSummaryRow> = members
        .into_iter()
        .map(|(entry, holidays)| {
            holiday_union.extend(holidays.iter().copied());
            let own = records.remove(&entry.id).unwrap_or_default();
            EmployeeSummaryRow {
                stats: summarize(&own, range, &holidays, config.late_after),
                employee_id: entry.id,
                employee_name: entry.employee_name,
                department: entry.department,
                designation: entry.designation,
            }
        })
        .collect();

    Ok(OrganisationSummary {
        overall_stats: overall(&employees_data, range, &holiday_union),
        employees_data,
        start_date: fmt_date(range.start),
        end_date: fmt_date(range.end),
    })
}

/// Attendance summary for every active employee
#[utoipa::path(
    get,
    path = "/api/reports/summary",
    params(ReportQuery),
    responses(
        (status = 200, description = "Per-employee and overall statistics", body = OrganisationSummary),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let range = resolve_range(query.start_date, query.end_date, &config)?;
    let summary = load_summary(pool.get_ref(), &config, range, query.department_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyStat {
    pub date: String,
    pub day_name: String,
    pub total_employees: usize,
    pub working_employees: usize,
    pub employees_on_holiday: usize,
    pub total_attendance: usize,
    pub present_count: usize,
    pub wfh_count: usize,
    pub late_count: usize,
    pub attendance_rate: f64,
}

/// Per-day counts over `range`. Rates use the employees not on holiday
/// that day as the denominator.
pub fn daily_stats(
    range: DateRange,
    holidays_by_employee: &[&BTreeSet<NaiveDate>],
    records: &[Attendance],
    late_after: NaiveTime,
) -> Vec<DailyStat> {
    let present = AttendanceStatus::Present.to_string();
    let wfh = AttendanceStatus::WorkFromHome.to_string();

    let mut by_date: HashMap<NaiveDate, Vec<&Attendance>> = HashMap::new();
    for r in records {
        by_date.entry(r.attendance_date).or_default().push(r);
    }

    range
        .days()
        .map(|day| {
            let on_holiday = holidays_by_employee.iter().filter(|h| h.contains(&day)).count();
            let working = holidays_by_employee.len() - on_holiday;
            let day_records = by_date.get(&day).map(Vec::as_slice).unwrap_or_default();
            let count = |f: &dyn Fn(&Attendance) -> bool| day_records.iter().filter(|r| f(r)).count();

            DailyStat {
                date: fmt_date(day),
                day_name: day.format("%A").to_string(),
                total_employees: holidays_by_employee.len(),
                working_employees: working,
                employees_on_holiday: on_holiday,
                total_attendance: day_records.len(),
                present_count: count(&|r| r.status == present),
                wfh_count: count(&|r| r.status == wfh),
                late_count: count(&|r| r.status == present && r.in_time.is_some_and(|t| is_late(t, late_after))),
                attendance_rate: percentage(day_records.len() as f64, working as f64),
            }
        })
        .collect()
}

/// Total attendance over total working employee-days.
pub fn average_rate(stats: &[DailyStat]) -> f64 {
    let attended: usize = stats.iter().map(|d| d.total_attendance).sum();
    let working: usize = stats.iter().map(|d| d.working_employees).sum();
    percentage(attended as f64, working as f64)
}

async fn load_daily(
    pool: &MySqlPool,
    config: &Config,
    range: DateRange,
    department_id: Option<u64>,
    employee_id: Option<u64>,
) -> ApiResult<Vec<DailyStat>> {
    let members = roster_with_holidays(pool, department_id, employee_id).await?;
    let records = range_records(pool, range, employee_id, department_id).await?;
    let sets: Vec<&BTreeSet<NaiveDate>> = members.iter().map(|(_, h)| &**h).collect();
    Ok(daily_stats(range, &sets, &records, config.late_after))
}

/// Daily attendance analytics with trend
#[utoipa::path(
    get,
    path = "/api/reports/analytics",
    params(ReportQuery),
    responses(
        (status = 200, description = "Daily stats and trend", body = Object, example = json!({
            "daily_stats": [{"date": "2026-03-02", "day_name": "Monday", "attendance_rate": 92.1}],
            "summary": {"total_days": 1, "avg_attendance": 92.1, "trend": "stable",
                        "start_date": "2026-03-02", "end_date": "2026-03-02"}
        })),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn analytics(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let range = resolve_range(query.start_date, query.end_date, &config)?;
    let daily = load_daily(pool.get_ref(), &config, range, query.department_id, query.employee_id).await?;

    let rates: Vec<f64> = daily.iter().map(|d| d.attendance_rate).collect();
    let trend: Trend = trend(&rates);

    Ok(HttpResponse::Ok().json(json!({
        "summary": {
            "total_days": daily.len(),
            "avg_attendance": average_rate(&daily),
            "trend": trend,
            "start_date": fmt_date(range.start),
            "end_date": fmt_date(range.end),
        },
        "daily_stats": daily,
    })))
}

/// Attendance rates for the last seven days
#[utoipa::path(
    get,
    path = "/api/reports/weekly",
    responses(
        (status = 200, description = "Weekly trend", body = Object, example = json!({
            "weekly_trend": [{"date": "2026-03-02", "day": "Mon", "present": 35, "working": 38, "percentage": 92.1}],
            "average_attendance": 90.4
        })),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn weekly(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let today = clock::today(config.business_offset());
    let range = DateRange::new(today - Duration::days(6), today)
        .ok_or_else(|| ApiError::Internal("invalid weekly range".into()))?;
    let daily = load_daily(pool.get_ref(), &config, range, None, None).await?;

    let mut attended = 0;
    let mut working = 0;
    let trend: Vec<_> = daily
        .iter()
        .map(|d| {
            let present = d.present_count + d.wfh_count;
            attended += present;
            working += d.working_employees;
            json!({
                "date": d.date,
                "day": &d.day_name[..3],
                "present": present,
                "total": d.total_employees,
                "working": d.working_employees,
                "holiday": d.employees_on_holiday,
                "percentage": percentage(present as f64, d.working_employees as f64),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "weekly_trend": trend,
        "average_attendance": percentage(attended as f64, working as f64),
    })))
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_employees: usize,
    pub present_today: usize,
    pub wfh_today: usize,
    pub absent_today: usize,
    pub on_leave: i64,
    pub late_arrivals: usize,
    pub employees_on_holiday: usize,
    pub working_employees: usize,
    pub attendance_rate: f64,
}

/// Today's headline figures
#[utoipa::path(
    get,
    path = "/api/reports/dashboard",
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardStats),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let today = clock::today(config.business_offset());
    let present = AttendanceStatus::Present.to_string();
    let wfh = AttendanceStatus::WorkFromHome.to_string();

    let records = records_on(pool.get_ref(), today).await?;
    let roster = active_roster(pool.get_ref(), None).await?;
    let on_holiday = holidays::roster_on_holiday(pool.get_ref(), &roster, today).await?;

    let attended: std::collections::HashSet<u64> = records
        .iter()
        .filter(|r| r.status == present || r.status == wfh)
        .map(|r| r.employee_id)
        .collect();
    let absent = roster
        .iter()
        .filter(|e| !attended.contains(&e.id) && !on_holiday.contains(&e.id))
        .count();

    let on_leave = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM leave_applications WHERE status = ? AND from_date <= ? AND to_date >= ?",
    )
    .bind(WorkflowStatus::Approved.to_string())
    .bind(today)
    .bind(today)
    .fetch_one(pool.get_ref())
    .await?;

    let working = roster.len() - on_holiday.len();
    let stats = DashboardStats {
        total_employees: roster.len(),
        present_today: records.iter().filter(|r| r.status == present).count(),
        wfh_today: records.iter().filter(|r| r.status == wfh).count(),
        absent_today: absent,
        on_leave,
        late_arrivals: records
            .iter()
            .filter(|r| r.status == present && r.in_time.is_some_and(|t| is_late(t, config.late_after)))
            .count(),
        employees_on_holiday: on_holiday.len(),
        working_employees: working,
        attendance_rate: percentage(records.len() as f64, working as f64),
    };

    Ok(HttpResponse::Ok().json(stats))
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct DepartmentStat {
    pub department: String,
    pub total: usize,
    pub working_today: usize,
    pub present: usize,
    pub holiday: usize,
    pub attendance_percentage: f64,
}

/// Groups today's roster by department, largest first.
pub fn department_stats(
    roster: &[RosterEntry],
    attended: &std::collections::HashSet<u64>,
    on_holiday: &std::collections::HashSet<u64>,
) -> Vec<DepartmentStat> {
    let mut by_dept: HashMap<String, DepartmentStat> = HashMap::new();
    for e in roster {
        let name = e.department.clone().unwrap_or_else(|| "Not Assigned".to_string());
        let stat = by_dept.entry(name.clone()).or_insert_with(|| DepartmentStat {
            department: name,
            ..Default::default()
        });
        stat.total += 1;
        if on_holiday.contains(&e.id) {
            stat.holiday += 1;
        } else {
            stat.working_today += 1;
            if attended.contains(&e.id) {
                stat.present += 1;
            }
        }
    }

    let mut stats: Vec<DepartmentStat> = by_dept
        .into_values()
        .map(|mut s| {
            s.attendance_percentage = percentage(s.present as f64, s.working_today as f64);
            s
        })
        .collect();
    stats.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.department.cmp(&b.department)));
    stats
}

/// Department-wise attendance today
#[utoipa::path(
    get,
    path = "/api/reports/departments",
    responses(
        (status = 200, description = "Per-department figures", body = [DepartmentStat]),
        (status = 403, description = "HR roles only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn departments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let today = clock::today(config.business_offset());
    let present = AttendanceStatus::Present.to_string();
    let wfh = AttendanceStatus::WorkFromHome.to_string();

    let attended = records_on(pool.get_ref(), today)
        .await?
        .into_iter()
        .filter(|r| r.status == present || r.status == wfh)
        .map(|r| r.employee_id)
        .collect();
    let roster = active_roster(pool.get_ref(), None).await?;
    let on_holiday = holidays::roster_on_holiday(pool.get_ref(), &roster, today).await?;

    Ok(HttpResponse::Ok().json(department_stats(&roster, &attended, &on_holiday)))
}

fn opt_time(t: Option<NaiveDateTime>) -> Cell {
    t.map(|t| t.format("%H:%M").to_string()).unwrap_or_else(|| "-".into()).into()
}

pub fn history_report(history: &EmployeeHistory, generated_at: NaiveDateTime) -> Report {
    let s = &history.summary_stats;
    Report {
        title: "Attendance Report".into(),
        subtitle: Some(history.employee_name.clone()),
        period: format!("{} to {}", history.start_date, history.end_date),
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        stats: vec![
            ("Working Days".into(), s.total_working_days.to_string()),
            ("Present Days".into(), s.present_days.to_string()),
            ("WFH Days".into(), s.wfh_days.to_string()),
            ("Absent Days".into(), s.absent_days.to_string()),
            ("Holidays".into(), s.holiday_days.to_string()),
            ("Late Arrivals".into(), s.late_arrivals.to_string()),
            ("Total Hours".into(), s.total_working_hours.to_string()),
            ("Attendance %".into(), s.attendance_percentage.to_string()),
        ],
        headers: ["Date", "Status", "Check In", "Check Out", "Working Hours", "Late Arrival"]
            .map(String::from)
            .to_vec(),
        rows: history
            .attendance_records
            .iter()
            .map(|r| {
                vec![
                    fmt_date(r.attendance_date).into(),
                    r.status.as_str().into(),
                    opt_time(r.in_time),
                    opt_time(r.out_time),
                    r.working_hours.map(Cell::from).unwrap_or_else(|| "-".into()),
                    Cell::from(if r.late_arrival { "Yes" } else { "No" }),
                ]
            })
            .collect(),
    }
}

pub fn summary_report(summary: &OrganisationSummary, generated_at: NaiveDateTime) -> Report {
    let o = &summary.overall_stats;
    Report {
        title: "Attendance Summary - All Employees".into(),
        subtitle: None,
        period: format!("{} to {}", summary.start_date, summary.end_date),
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        stats: vec![
            ("Employees".into(), o.total_employees.to_string()),
            ("Working Days".into(), o.total_working_days.to_string()),
            ("Present Days".into(), o.total_present_days.to_string()),
            ("WFH Days".into(), o.total_wfh_days.to_string()),
            ("Absent Days".into(), o.total_absent_days.to_string()),
            ("Average Attendance %".into(), o.avg_attendance_percentage.to_string()),
        ],
        headers: ["Employee", "Department", "Working Days", "Present", "WFH", "Absent", "Late", "Hours", "Attendance %"]
            .map(String::from)
            .to_vec(),
        rows: summary
            .employees_data
            .iter()
            .map(|e| {
                vec![
                    e.employee_name.as_str().into(),
                    e.department.as_deref().unwrap_or("Not Assigned").into(),
                    e.stats.total_working_days.into(),
                    e.stats.present_days.into(),
                    e.stats.wfh_days.into(),
                    e.stats.absent_days.into(),
                    e.stats.late_arrivals.into(),
                    e.stats.total_working_hours.into(),
                    e.stats.attendance_percentage.into(),
                ]
            })
            .collect(),
    }
}

/// Export an attendance report as PDF or XLSX
#[utoipa::path(
    get,
    path = "/api/reports/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "Base64 file payload", body = export::ExportPayload),
        (status = 400, description = "Invalid range, range over 365 days or unknown format"),
        (status = 403, description = "HR roles only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn export_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ExportQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let range = DateRange::new(query.start_date, query.end_date)
        .ok_or_else(|| ApiError::bad_request("Start date cannot be after end date"))
        .and_then(capped)?;
    let format = match query.format.as_deref() {
        None => ExportFormat::Pdf,
        Some(raw) => ExportFormat::from_str(raw.trim())
            .map_err(|_| ApiError::bad_request("Export format must be pdf or xlsx"))?,
    };
    let now = clock::now_local(config.business_offset());

    let payload = match query.employee_id {
        Some(employee_id) => {
            let history = load_history(pool.get_ref(), &config, employee_id, range).await?;
            let stem = format!("attendance_report_{employee_id}_{}_{}", history.start_date, history.end_date);
            export::export(&history_report(&history, now), format, &stem)?
        }
        None => {
            let summary = load_summary(pool.get_ref(), &config, range, query.department_id).await?;
            let stem = format!("attendance_summary_{}_{}", summary.start_date, summary.end_date);
            export::export(&summary_report(&summary, now), format, &stem)?
        }
    };

    info!(user_id = auth.user_id, file = %payload.file_name, "Attendance report exported");
    Ok(HttpResponse::Ok().json(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn att(employee_id: u64, day: u32, status: &str, h: u32, m: u32) -> Attendance {
        let in_time = d(day).and_hms_opt(h, m, 0).unwrap();
        Attendance {
            id: employee_id * 100 + day as u64,
            employee_id,
            attendance_date: d(day),
            status: status.into(),
            in_time: Some(in_time),
            out_time: None,
            work_type: None,
            working_hours: None,
            docstatus: 1,
            modified_at: in_time,
            modified_by: None,
        }
    }

    fn late_after() -> NaiveTime {
        NaiveTime::from_hms_opt(10, 5, 0).unwrap()
    }

    #[test]
    fn report_ranges_are_capped_at_a_year() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let year = DateRange::new(start, start + Duration::days(MAX_EXPORT_DAYS)).unwrap();
        assert!(capped(year).is_ok());
        let too_long = DateRange::new(start, start + Duration::days(MAX_EXPORT_DAYS + 1)).unwrap();
        assert!(matches!(capped(too_long), Err(ApiError::BadRequest(_))));

        let config = Config::for_tests();
        assert!(resolve_range(Some(start), Some(start + Duration::days(400)), &config).is_err());
        assert!(resolve_range(Some(start), Some(start + Duration::days(30)), &config).is_ok());
    }

    #[test]
    fn latest_shift_wins() {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let shifts = [
            ShiftWindow { start_date: d(1), end_date: None, start_time: t(9), end_time: t(17) },
            ShiftWindow { start_date: d(10), end_date: Some(d(15)), start_time: t(13), end_time: t(21) },
        ];
        assert_eq!(shift_on(&shifts, d(5)).map(|s| s.start_time), Some(t(9)));
        assert_eq!(shift_on(&shifts, d(12)).map(|s| s.start_time), Some(t(13)));
        assert_eq!(shift_on(&shifts, d(20)).map(|s| s.start_time), Some(t(9)));
    }

    #[test]
    fn daily_rates_exclude_employees_on_holiday() {
        let range = DateRange::new(d(2), d(3)).unwrap();
        let none = BTreeSet::new();
        let off_on_3rd: BTreeSet<_> = [d(3)].into();
        let sets = vec![&none, &off_on_3rd];
        let records = vec![
            att(1, 2, "Present", 9, 0),
            att(2, 2, "Present", 10, 30),
            att(1, 3, "Work From Home", 9, 0),
        ];

        let stats = daily_stats(range, &sets, &records, late_after());
        assert_eq!(stats[0].working_employees, 2);
        assert_eq!(stats[0].late_count, 1);
        assert_eq!(stats[0].attendance_rate, 100.0);
        assert_eq!(stats[1].employees_on_holiday, 1);
        assert_eq!(stats[1].wfh_count, 1);
        assert_eq!(stats[1].attendance_rate, 100.0);
        assert_eq!(stats[1].day_name, "Tuesday");
        assert_eq!(average_rate(&stats), 100.0);
    }

    #[test]
    fn departments_sorted_by_size() {
        let entry = |id, dept: Option<&str>| RosterEntry {
            id,
            employee_name: format!("E{id}"),
            department_id: None,
            department: dept.map(String::from),
            designation: None,
            holiday_list_id: None,
        };
        let roster = vec![entry(1, Some("Eng")), entry(2, Some("Eng")), entry(3, None), entry(4, Some("Eng"))];
        let attended: HashSet<u64> = [1, 3].into();
        let holiday: HashSet<u64> = [4].into();

        let stats = department_stats(&roster, &attended, &holiday);
        assert_eq!(stats[0].department, "Eng");
        assert_eq!((stats[0].total, stats[0].working_today, stats[0].present, stats[0].holiday), (3, 2, 1, 1));
        assert_eq!(stats[0].attendance_percentage, 50.0);
        assert_eq!(stats[1].department, "Not Assigned");
        assert_eq!(stats[1].attendance_percentage, 100.0);
    }

    #[test]
    fn history_marks_late_and_fills_hours() {
        let range = DateRange::new(d(2), d(6)).unwrap();
        let mut rec = att(7, 2, "Present", 10, 20);
        rec.out_time = Some(d(2).and_hms_opt(18, 20, 0).unwrap());
        let holidays: BTreeSet<_> = [d(6)].into();

        let history = build_history(7, "Nusrat".into(), &[rec], range, &holidays, &[], late_after());
        let first = &history.attendance_records[0];
        assert!(first.late_arrival);
        assert_eq!(first.working_hours, Some(8.0));
        assert_eq!(history.summary_stats.total_working_days, 4);
        assert_eq!(history.summary_stats.absent_days, 3);

        let report = history_report(&history, d(7).and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0][5], Cell::Text("Yes".into()));
    }

    #[test]
    fn overall_averages_percentages() {
        let range = DateRange::new(d(1), d(10)).unwrap();
        let row = |pct| EmployeeSummaryRow {
            employee_id: 1,
            employee_name: "E".into(),
            department: None,
            designation: None,
            stats: SummaryStats {
                present_days: 4,
                attendance_percentage: pct,
                ..Default::default()
            },
        };
        let union: BTreeSet<_> = [d(1), d(20)].into();
        let o = overall(&[row(80.0), row(55.0)], range, &union);
        assert_eq!(o.total_present_days, 8);
        assert_eq!(o.avg_attendance_percentage, 67.5);
        assert_eq!(o.total_working_days, 9);
        assert_eq!(o.date_range_days, 10);
    }
}
