use crate::{
    auth::auth::AuthUser,
    db::is_duplicate_key,
    error::{ApiError, ApiResult},
    model::{
        department::Department,
        employee::{EMPLOYEE_COLUMNS, Employee, EmployeeStatus, find_employee},
    },
    utils::db_utils::{build_update_sql, execute_update, page_window},
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

/// Columns HR may change through `PUT /employees/{id}`.
const UPDATABLE_COLUMNS: &[&str] = &[
    "employee_name",
    "email",
    "department_id",
    "designation",
    "status",
    "wfh_eligible",
    "wfh_enabled",
    "office_location_id",
    "holiday_list_id",
    "leave_approver_user_id",
    "expense_approver_user_id",
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "Nusrat Jahan")]
    pub employee_name: String,
    #[schema(example = "nusrat@company.com", format = "email")]
    pub email: Option<String>,
    #[schema(example = 2)]
    pub department_id: Option<u64>,
    #[schema(example = "Software Engineer")]
    pub designation: Option<String>,
    #[schema(example = 1)]
    pub office_location_id: Option<u64>,
    #[schema(example = 1)]
    pub holiday_list_id: Option<u64>,
    pub leave_approver_user_id: Option<u64>,
    pub expense_approver_user_id: Option<u64>,
    #[serde(default)]
    pub wfh_eligible: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub department_id: Option<u64>,
    /// Active, Inactive or Left
    pub status: Option<String>,
    /// Matches name, code or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub per_page: u64,
    #[schema(example = 42)]
    pub total: i64,
}

enum Binding {
    U64(u64),
    Str(String),
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully", "id": 42
        })),
        (status = 400, description = "Missing code or name"),
        (status = 403, description = "HR only"),
        (status = 409, description = "Employee code already exists")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    if payload.employee_code.trim().is_empty() || payload.employee_name.trim().is_empty() {
        return Err(ApiError::bad_request("employee_code and employee_name are required"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees
            (employee_code, employee_name, email, department_id, designation, office_location_id,
             holiday_list_id, leave_approver_user_id, expense_approver_user_id, wfh_eligible)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_code.trim())
    .bind(payload.employee_name.trim())
    .bind(payload.email.as_deref())
    .bind(payload.department_id)
    .bind(payload.designation.as_deref())
    .bind(payload.office_location_id)
    .bind(payload.holiday_list_id)
    .bind(payload.leave_approver_user_id)
    .bind(payload.expense_approver_user_id)
    .bind(payload.wfh_eligible)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            let id = res.last_insert_id();
            info!(id, code = %payload.employee_code, by = auth.user_id, "Employee created");
            Ok(HttpResponse::Ok().json(json!({
                "message": "Employee created successfully",
                "id": id
            })))
        }
        Err(e) if is_duplicate_key(&e) => Err(ApiError::conflict(format!(
            "Employee code {} already exists",
            payload.employee_code.trim()
        ))),
        Err(e) => {
            error!(error = %e, "Failed to Create Employee");
            Err(e.into())
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "HR only")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;

    let (page, per_page, offset) = page_window(query.page, query.per_page)?;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<Binding> = Vec::new();

    if let Some(department_id) = query.department_id {
        conditions.push("department_id = ?");
        bindings.push(Binding::U64(department_id));
    }

    if let Some(status) = &query.status {
        let status = EmployeeStatus::from_str(status.trim())
            .map_err(|_| ApiError::bad_request(format!("Unknown status: {status}")))?;
        conditions.push("status = ?");
        bindings.push(Binding::Str(status.to_string()));
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("(employee_name LIKE ? OR employee_code LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(Binding::Str(like.clone()));
        bindings.push(Binding::Str(like.clone()));
        bindings.push(Binding::Str(like));
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM employees {}", where_clause);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            Binding::U64(v) => count_query.bind(*v),
            Binding::Str(s) => count_query.bind(s.as_str()),
        };
    }
    let total = count_query.fetch_one(pool.get_ref()).await?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = match b {
            Binding::U64(v) => data_query.bind(*v),
            Binding::Str(s) => data_query.bind(s.as_str()),
        };
    }
    let employees = data_query
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body(content = Object, description = "Any of: employee_name, email, department_id, designation, \
        status, wfh_eligible, wfh_enabled, office_location_id, holiday_list_id, leave_approver_user_id, \
        expense_approver_user_id", example = json!({"designation": "Team Lead", "wfh_eligible": true})),
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "Field not updatable or invalid status"),
        (status = 403, description = "HR only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    auth.require_hr()?;
    let employee_id = path.into_inner();

    if let Some(status) = body.get("status") {
        let valid = status.as_str().is_some_and(|s| EmployeeStatus::from_str(s).is_ok());
        if !valid {
            return Err(ApiError::bad_request("status must be Active, Inactive or Left"));
        }
    }

    let update = build_update_sql("employees", &body, UPDATABLE_COLUMNS, "id", employee_id)?;
    let affected = execute_update(pool.get_ref(), update).await?;

    if affected == 0 && find_employee(pool.get_ref(), employee_id).await?.is_none() {
        return Err(ApiError::not_found("Employee not found"));
    }

    info!(employee_id, by = auth.user_id, "Employee updated");
    Ok(HttpResponse::Ok().json(json!({"message": "Employee updated successfully"})))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 403, description = "Admin or HR Manager only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_manager()?;
    let employee_id = path.into_inner();

    let res = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await
        .inspect_err(|e| error!(error = %e, employee_id, "Failed to delete employee"))?;

    if res.rows_affected() == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }

    info!(employee_id, by = auth.user_id, "Employee deleted");
    Ok(HttpResponse::Ok().json(json!({"message": "Successfully deleted"})))
}

/// Get Employee by ID (own record, or any for HR)
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Someone else's record without an HR role"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "status": "error", "message": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let employee_id = auth.target_employee(Some(path.into_inner()))?;
    let employee = find_employee(pool.get_ref(), employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    Ok(HttpResponse::Ok().json(employee))
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct CurrentEmployee {
    pub id: u64,
    pub employee_code: String,
    pub employee_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub status: String,
    pub wfh_eligible: bool,
    pub office_location: Option<String>,
}

/// The caller's employee record with department and office names
#[utoipa::path(
    get,
    path = "/api/employees/me",
    responses(
        (status = 200, description = "Current employee", body = CurrentEmployee),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn current_employee(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let employee_id = auth.employee_id()?;
    let employee = sqlx::query_as::<_, CurrentEmployee>(
        r#"
        SELECT e.id, e.employee_code, e.employee_name, e.email, d.name AS department,
               e.designation, e.status, e.wfh_eligible, o.name AS office_location
        FROM employees e
        LEFT JOIN departments d ON d.id = e.department_id
        LEFT JOIN office_locations o ON o.id = e.office_location_id
        WHERE e.id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Number of active employees, optionally in one department
#[utoipa::path(
    get,
    path = "/api/employees/count",
    params(("department_id" = Option<u64>, Query, description = "Department filter")),
    responses((status = 200, description = "Active employee count", body = Object, example = json!({"count": 42}))),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn employee_count(
    pool: web::Data<MySqlPool>,
    query: web::Query<DepartmentFilter>,
) -> ApiResult<HttpResponse> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM employees WHERE status = 'Active' AND (? IS NULL OR department_id = ?)",
    )
    .bind(query.department_id)
    .bind(query.department_id)
    .fetch_one(pool.get_ref())
    .await?;
    Ok(HttpResponse::Ok().json(json!({"count": count})))
}

#[derive(Debug, Deserialize)]
pub struct DepartmentFilter {
    pub department_id: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, description = "All departments", body = [Department])),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn departments(pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let rows = sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY name")
        .fetch_all(pool.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_whitelist_excludes_identity_columns() {
        for forbidden in ["id", "employee_code", "created_at"] {
            assert!(!UPDATABLE_COLUMNS.contains(&forbidden));
        }
        let payload = json!({"employee_code": "X"});
        assert!(build_update_sql("employees", &payload, UPDATABLE_COLUMNS, "id", 1).is_err());
    }

    #[test]
    fn update_accepts_employee_fields() {
        let payload = json!({"designation": "Lead", "holiday_list_id": 2});
        let update = build_update_sql("employees", &payload, UPDATABLE_COLUMNS, "id", 7).unwrap();
        assert_eq!(
            update.sql,
            "UPDATE employees SET designation = ?, holiday_list_id = ? WHERE id = ?"
        );
    }
}
