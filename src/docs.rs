use crate::api::{
    attendance::{AttendanceView, GeoAttendanceReq},
    attendance_admin::{
        BulkCheckoutReq, BulkReport, BulkTimesReq, DayRecord, DaySummary, EnrichedRecord, ItemFailure,
        LateArrival, ManualCheckoutReq, RecordCounts, RosterStatus, TimesUpdateItem, UpdateTimesReq,
    },
    compensatory_leave::CreateCompensatory,
    employee::{CreateEmployee, CurrentEmployee, EmployeeListResponse},
    expense_claim::{CreateExpense, ExpenseTotals, StatusTotal},
    leave_request::{AllocationReq, BalanceResponse, CreateLeave},
    notification::{BroadcastReq, DeviceTokenReq, SettingsUpdate},
    project::{AddMembersReq, CreateProject, CreateTask, CreateTaskLog, MemberChanges, TaskCounts},
    reports::{
        DailyStat, DashboardStats, DepartmentStat, EmployeeHistory, EmployeeSummaryRow, HistoryRecord,
        OrganisationSummary, OverallStats,
    },
    travel_request::CreateTravel,
    wfh::{CreateWfhReq, EligibilityReq, WfhEligibility, WfhRequestView},
    workflow_docs::{DecisionReq, DocFilter},
};
use crate::auth::handlers::{CurrentUser, LoginResponse};
use crate::model::{
    attendance::{Attendance, AttendanceStatus, GeoAction, GeoLog, WorkType},
    department::Department,
    employee::{Employee, EmployeeStatus, RosterEntry},
    holiday::Holiday,
    leave_request::{
        CompensatoryLeaveRequest, ExpenseClaim, LeaveApplication, LeaveBalance, LeaveType, TravelRequest,
    },
    notification::{DeviceType, Notification, NotificationSettings},
    office::OfficeLocation,
    project::{Project, ProjectMember, Task, TaskLog, TaskPriority},
    shift::ShiftAssignment,
    wfh_request::{WfhRequest, WfhStatus},
    workflow::WorkflowStatus,
};
use crate::models::{LoginReqDto, UserReq};
use crate::push::fcm::{PushReport, SendResponse};
use crate::utils::{
    attendance_calc::{SummaryStats, Trend},
    export::ExportPayload,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRMS Geo Attendance API",
        version = "1.0.0",
        description = r#"
## Geo-fenced Attendance & HR Workflows

Backend for a mobile HR app: employees check in and out from their phones, and
the server validates the position against their assigned office.

### 🔹 Key Features
- **Geo Attendance**
  - Check-in / check-out with a haversine geofence, WFH bypass for eligible staff
  - HR corrections: manual and bulk checkout, time edits, deletion
- **Reports**
  - Per-employee history, organisation summary, weekly trend, dashboard
  - XLSX / PDF export
- **Leave & Claims**
  - Leave applications with ledger-backed balances, compensatory leave,
    expense claims and travel requests sharing one approval workflow
- **Work From Home**
  - Eligibility management and WFH requests
- **Projects**
  - Members, tasks and hourly task logs
- **Notifications**
  - In-app inbox plus FCM push, scheduled attendance/project reminders

### 🔐 Security
Endpoints under the API prefix require a **JWT Bearer** access token.
HR endpoints are limited to Admin, HR Manager and HR User roles.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::register,
        crate::auth::handlers::me,

        crate::api::attendance::geo_attendance,
        crate::api::attendance::office_location,
        crate::api::attendance::my_attendance,
        crate::api::attendance::calendar,
        crate::api::attendance::holidays_in_range,

        crate::api::attendance_admin::manual_checkout,
        crate::api::attendance_admin::bulk_checkout,
        crate::api::attendance_admin::update_times,
        crate::api::attendance_admin::bulk_update_times,
        crate::api::attendance_admin::delete_attendance,
        crate::api::attendance_admin::pending_checkouts,
        crate::api::attendance_admin::records_for_date,
        crate::api::attendance_admin::statistics,
        crate::api::attendance_admin::today_overview,
        crate::api::attendance_admin::absent_today,
        crate::api::attendance_admin::late_today,
        crate::api::attendance_admin::by_date,

        crate::api::reports::employee_history,
        crate::api::reports::summary,
        crate::api::reports::analytics,
        crate::api::reports::weekly,
        crate::api::reports::dashboard,
        crate::api::reports::departments,
        crate::api::reports::export_report,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::my_balances,
        crate::api::leave_request::employee_balances,
        crate::api::leave_request::allocate_leave,
        crate::api::leave_request::leave_types,

        crate::api::compensatory_leave::create_compensatory,
        crate::api::compensatory_leave::list_compensatory,
        crate::api::compensatory_leave::get_compensatory,
        crate::api::compensatory_leave::decide_compensatory,

        crate::api::expense_claim::create_expense,
        crate::api::expense_claim::list_expenses,
        crate::api::expense_claim::get_expense,
        crate::api::expense_claim::decide_expense,
        crate::api::expense_claim::expense_summary,

        crate::api::travel_request::create_travel,
        crate::api::travel_request::list_travel,
        crate::api::travel_request::get_travel,
        crate::api::travel_request::decide_travel,

        crate::api::wfh::my_wfh,
        crate::api::wfh::wfh_employees,
        crate::api::wfh::toggle_eligibility,
        crate::api::wfh::create_request,
        crate::api::wfh::my_requests,
        crate::api::wfh::pending_requests,
        crate::api::wfh::all_requests,
        crate::api::wfh::delete_request,
        crate::api::wfh::decide_request,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::current_employee,
        crate::api::employee::employee_count,
        crate::api::employee::departments,

        crate::api::shift::list_shifts,
        crate::api::shift::shift_assignments,

        crate::api::project::create_project,
        crate::api::project::list_projects,
        crate::api::project::add_members,
        crate::api::project::remove_member,
        crate::api::project::project_summary,
        crate::api::project::list_tasks,
        crate::api::project::create_task,
        crate::api::project::list_task_logs,
        crate::api::project::create_task_log,

        crate::api::notification::register_device,
        crate::api::notification::broadcast,
        crate::api::notification::inbox,
        crate::api::notification::unread_count,
        crate::api::notification::mark_all_read,
        crate::api::notification::get_settings,
        crate::api::notification::update_settings
    ),
    components(
        schemas(
            UserReq, LoginReqDto, LoginResponse, CurrentUser,
            GeoAttendanceReq, AttendanceView, Attendance, AttendanceStatus, GeoAction, GeoLog, WorkType,
            OfficeLocation, Holiday,
            ManualCheckoutReq, BulkCheckoutReq, UpdateTimesReq, TimesUpdateItem, BulkTimesReq,
            ItemFailure, BulkReport, DayRecord, RecordCounts, RosterStatus, LateArrival,
            EnrichedRecord, DaySummary,
            HistoryRecord, EmployeeHistory, EmployeeSummaryRow, OverallStats, OrganisationSummary,
            DailyStat, DashboardStats, DepartmentStat, SummaryStats, Trend, ExportPayload,
            WorkflowStatus, DocFilter, DecisionReq,
            LeaveApplication, LeaveType, LeaveBalance, CreateLeave, BalanceResponse, AllocationReq,
            CompensatoryLeaveRequest, CreateCompensatory,
            ExpenseClaim, CreateExpense, StatusTotal, ExpenseTotals,
            TravelRequest, CreateTravel,
            WfhRequest, WfhStatus, WfhRequestView, WfhEligibility, EligibilityReq, CreateWfhReq,
            Employee, EmployeeStatus, RosterEntry, Department, ShiftAssignment,
            CreateEmployee, EmployeeListResponse, CurrentEmployee,
            Project, ProjectMember, Task, TaskLog, TaskPriority,
            CreateProject, AddMembersReq, MemberChanges, TaskCounts, CreateTask, CreateTaskLog,
            Notification, NotificationSettings, DeviceType, DeviceTokenReq, BroadcastReq,
            SettingsUpdate, PushReport, SendResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and user accounts"),
        (name = "Attendance", description = "Geo check-in/out and the employee's own records"),
        (name = "Attendance Admin", description = "HR corrections and daily views"),
        (name = "Reports", description = "Attendance reports and export"),
        (name = "Leave", description = "Leave applications and balances"),
        (name = "Compensatory Leave", description = "Compensatory leave for holiday work"),
        (name = "Expense Claims", description = "Expense claims"),
        (name = "Travel Requests", description = "Travel requests"),
        (name = "Work From Home", description = "Work-from-home eligibility and requests"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Shifts", description = "Shift assignments"),
        (name = "Projects", description = "Projects, tasks and task logs"),
        (name = "Notifications", description = "Inbox, device tokens and push"),
    )
)]
pub struct ApiDoc;
