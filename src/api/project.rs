//! Projects, their members, tasks and task logs.
//!
//! Admin, HR Manager and Project Manager see and manage every project; other
//! users only see projects where they hold an active membership.

use std::collections::HashSet;
use std::str::FromStr;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::project::{Project, ProjectMember, Task, TaskLog, TaskPriority},
    utils::{clock, db_utils::placeholders},
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const PROJECT_COLUMNS: &str =
    "p.id, p.project_name, p.status, p.expected_start_date, p.expected_end_date, p.percent_complete, p.modified_at";
const TASK_COLUMNS: &str = "t.id, t.project_id, t.subject, t.description, t.status, t.priority, \
     t.exp_start_date, t.exp_end_date, t.progress, t.modified_at";
const LOG_COLUMNS: &str = "l.id, l.project_id, l.task_id, l.employee_id, l.log_time, l.description, l.created_by";

fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(50).clamp(1, 200)
}

async fn is_active_member(pool: &MySqlPool, project_id: u64, employee_id: u64) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM project_members WHERE project_id = ? AND employee_id = ? AND active = TRUE LIMIT 1",
    )
    .bind(project_id)
    .bind(employee_id)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

async fn find_project(pool: &MySqlPool, project_id: u64) -> ApiResult<Project> {
    sqlx::query_as::<_, Project>(&format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?"))
        .bind(project_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Project {project_id} not found")))
}

/// Privileged roles always pass; everyone else needs an active membership.
async fn ensure_project_access(pool: &MySqlPool, auth: &AuthUser, project_id: u64) -> ApiResult<Project> {
    let project = find_project(pool, project_id).await?;
    if auth.role.is_project_privileged() {
        return Ok(project);
    }
    let member = match auth.employee_id {
        Some(employee_id) => is_active_member(pool, project_id, employee_id).await?,
        None => false,
    };
    if member {
        Ok(project)
    } else {
        Err(ApiError::forbidden("You are not a member of this project"))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProject {
    #[schema(example = "Mobile App Revamp")]
    pub project_name: String,
    #[schema(example = "2026-04-01", format = "date", value_type = Option<String>)]
    pub expected_start_date: Option<NaiveDate>,
    #[schema(example = "2026-06-30", format = "date", value_type = Option<String>)]
    pub expected_end_date: Option<NaiveDate>,
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProject,
    responses(
        (status = 200, description = "Project created", body = Object, example = json!({
            "status": "success", "id": 5
        })),
        (status = 400, description = "Missing name or reversed dates"),
        (status = 403, description = "Admin, HR Manager or Project Manager only")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn create_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateProject>,
) -> ApiResult<HttpResponse> {
    auth.require_project_privileged()?;
    let name = body.project_name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("project_name is required"));
    }
    if matches!((body.expected_start_date, body.expected_end_date), (Some(start), Some(end)) if end < start) {
        return Err(ApiError::bad_request("Expected end date cannot be before the start date"));
    }

    let id = sqlx::query("INSERT INTO projects (project_name, expected_start_date, expected_end_date) VALUES (?, ?, ?)")
        .bind(name)
        .bind(body.expected_start_date)
        .bind(body.expected_end_date)
        .execute(pool.get_ref())
        .await?
        .last_insert_id();

    tracing::info!(id, project = name, by = auth.user_id, "Project created");
    Ok(HttpResponse::Ok().json(json!({"status": "success", "id": id})))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProjectQuery {
    /// Substring of the project name
    pub q: Option<String>,
    pub limit: Option<u32>,
}

/// Projects visible to the caller
#[utoipa::path(
    get,
    path = "/api/projects",
    params(ProjectQuery),
    responses((status = 200, description = "Projects, most recently modified first", body = [Project])),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn list_projects(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ProjectQuery>,
) -> ApiResult<HttpResponse> {
    let like = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{q}%"));
    let limit = clamp_limit(query.limit);

    let projects = if auth.role.is_project_privileged() {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS} FROM projects p
            WHERE (? IS NULL OR p.project_name LIKE ?)
            ORDER BY p.modified_at DESC LIMIT ?
            "#
        ))
        .bind(like.as_deref())
        .bind(like.as_deref())
        .bind(limit)
        .fetch_all(pool.get_ref())
        .await?
    } else {
        let Some(employee_id) = auth.employee_id else {
            return Ok(HttpResponse::Ok().json(Vec::<Project>::new()));
        };
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT DISTINCT {PROJECT_COLUMNS} FROM projects p
            JOIN project_members m ON m.project_id = p.id AND m.active = TRUE
            WHERE m.employee_id = ? AND (? IS NULL OR p.project_name LIKE ?)
            ORDER BY p.modified_at DESC LIMIT ?
            "#
        ))
        .bind(employee_id)
        .bind(like.as_deref())
        .bind(like.as_deref())
        .bind(limit)
        .fetch_all(pool.get_ref())
        .await?
    };

    Ok(HttpResponse::Ok().json(projects))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMembersReq {
    #[schema(example = json!([12, 14]))]
    pub employee_ids: Vec<u64>,
    #[schema(example = "Contributor")]
    pub role_in_project: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct MemberChanges {
    pub added: Vec<u64>,
    pub skipped: Vec<u64>,
}

/// Splits requested ids into those to add and those skipped because they are
/// unknown or already active. Duplicates in the request are skipped.
fn plan_members(requested: &[u64], known: &HashSet<u64>, active: &HashSet<u64>) -> MemberChanges {
    let mut seen = HashSet::new();
    let mut changes = MemberChanges::default();
    for &id in requested {
        if seen.insert(id) && known.contains(&id) && !active.contains(&id) {
            changes.added.push(id);
        } else {
            changes.skipped.push(id);
        }
    }
    changes
}

async fn id_set(pool: &MySqlPool, sql: &str, project_id: Option<u64>, ids: &[u64]) -> Result<HashSet<u64>, sqlx::Error> {
    let mut query = sqlx::query_scalar::<_, u64>(sql);
    if let Some(project_id) = project_id {
        query = query.bind(project_id);
    }
    for id in ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?.into_iter().collect())
}

#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/members",
    params(("project_id" = u64, Path, description = "Project id")),
    request_body = AddMembersReq,
    responses(
        (status = 200, description = "Members added", body = MemberChanges),
        (status = 403, description = "Admin, HR Manager or Project Manager only"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn add_members(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<AddMembersReq>,
) -> ApiResult<HttpResponse> {
    auth.require_project_privileged()?;
    let project_id = path.into_inner();
    find_project(pool.get_ref(), project_id).await?;

    if body.employee_ids.is_empty() {
        return Err(ApiError::bad_request("employee_ids cannot be empty"));
    }
    let marks = placeholders(body.employee_ids.len());
    let known = id_set(
        pool.get_ref(),
        &format!("SELECT id FROM employees WHERE status = 'Active' AND id IN ({marks})"),
        None,
        &body.employee_ids,
    )
    .await?;
    let active = id_set(
        pool.get_ref(),
        &format!("SELECT employee_id FROM project_members WHERE project_id = ? AND active = TRUE AND employee_id IN ({marks})"),
        Some(project_id),
        &body.employee_ids,
    )
    .await?;

    let changes = plan_members(&body.employee_ids, &known, &active);
    let role = body
        .role_in_project
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("Contributor");

    let mut tx = pool.begin().await?;
    for employee_id in &changes.added {
        // Reactivate a past membership before inserting a new one.
        let revived = sqlx::query(
            "UPDATE project_members SET active = TRUE, role_in_project = ? WHERE project_id = ? AND employee_id = ?",
        )
        .bind(role)
        .bind(project_id)
        .bind(employee_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if revived == 0 {
            sqlx::query("INSERT INTO project_members (project_id, employee_id, role_in_project) VALUES (?, ?, ?)")
                .bind(project_id)
                .bind(employee_id)
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }
    }
    tx.commit().await?;

    tracing::info!(project_id, added = changes.added.len(), skipped = changes.skipped.len(), "Project members added");
    Ok(HttpResponse::Ok().json(changes))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{project_id}/members/{employee_id}",
    params(
        ("project_id" = u64, Path, description = "Project id"),
        ("employee_id" = u64, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Membership deactivated"),
        (status = 403, description = "Admin, HR Manager or Project Manager only"),
        (status = 404, description = "No active membership")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn remove_member(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
) -> ApiResult<HttpResponse> {
    auth.require_project_privileged()?;
    let (project_id, employee_id) = path.into_inner();

    let affected = sqlx::query(
        "UPDATE project_members SET active = FALSE WHERE project_id = ? AND employee_id = ? AND active = TRUE",
    )
    .bind(project_id)
    .bind(employee_id)
    .execute(pool.get_ref())
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::not_found("No active membership for this employee"));
    }
    tracing::info!(project_id, employee_id, by = auth.user_id, "Project member removed");
    Ok(HttpResponse::Ok().json(json!({"status": "success", "message": "Member removed"})))
}

async fn active_members(pool: &MySqlPool, project_id: u64) -> Result<Vec<ProjectMember>, sqlx::Error> {
    sqlx::query_as::<_, ProjectMember>(
        r#"
        SELECT m.id, m.project_id, m.employee_id, e.employee_name, m.role_in_project, m.active
        FROM project_members m
        JOIN employees e ON e.id = m.employee_id
        WHERE m.project_id = ? AND m.active = TRUE
        ORDER BY e.employee_name
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct TaskCounts {
    pub total: usize,
    pub open: usize,
    pub completed: usize,
    pub average_progress: f64,
}

impl TaskCounts {
    fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.status == "Completed").count();
        let progress: f64 = tasks.iter().map(|t| t.progress).sum();
        Self {
            total,
            open: total - completed,
            completed,
            average_progress: if total == 0 {
                0.0
            } else {
                crate::utils::attendance_calc::round_to(progress / total as f64, 1)
            },
        }
    }
}

/// Project with its tasks, recent logs and active members
#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/summary",
    params(("project_id" = u64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project summary", body = Object, example = json!({
            "project": {"id": 5, "project_name": "Mobile App Revamp"},
            "task_counts": {"total": 4, "open": 3, "completed": 1, "average_progress": 37.5},
            "tasks": [], "logs": [], "members": []
        })),
        (status = 403, description = "Not a member"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn project_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let project_id = path.into_inner();
    let project = ensure_project_access(pool.get_ref(), &auth, project_id).await?;

    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.project_id = ? ORDER BY t.modified_at DESC"
    ))
    .bind(project_id)
    .fetch_all(pool.get_ref())
    .await?;
    let logs = sqlx::query_as::<_, TaskLog>(&format!(
        "SELECT {LOG_COLUMNS} FROM task_logs l WHERE l.project_id = ? ORDER BY l.log_time DESC LIMIT 50"
    ))
    .bind(project_id)
    .fetch_all(pool.get_ref())
    .await?;
    let members = active_members(pool.get_ref(), project_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "project": project,
        "task_counts": TaskCounts::from_tasks(&tasks),
        "tasks": tasks,
        "logs": logs,
        "members": members,
    })))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TaskQuery {
    pub project_id: Option<u64>,
    pub status: Option<String>,
    pub limit: Option<u32>,
}

/// Tasks of one project, or of every project visible to the caller
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(TaskQuery),
    responses(
        (status = 200, description = "Tasks", body = [Task]),
        (status = 403, description = "Not a member of the project")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn list_tasks(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TaskQuery>,
) -> ApiResult<HttpResponse> {
    if let Some(project_id) = query.project_id {
        ensure_project_access(pool.get_ref(), &auth, project_id).await?;
    }
    let status = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let limit = clamp_limit(query.limit);

    // Non-privileged callers only see tasks of projects they belong to.
    let member_of = if auth.role.is_project_privileged() {
        None
    } else {
        Some(auth.employee_id()?)
    };

    let tasks = sqlx::query_as::<_, Task>(&format!(
        r#"
        SELECT {TASK_COLUMNS} FROM tasks t
        WHERE (? IS NULL OR t.project_id = ?)
          AND (? IS NULL OR t.status = ?)
          AND (? IS NULL OR t.project_id IN (
                SELECT project_id FROM project_members WHERE employee_id = ? AND active = TRUE))
        ORDER BY t.modified_at DESC
        LIMIT ?
        "#
    ))
    .bind(query.project_id)
    .bind(query.project_id)
    .bind(status)
    .bind(status)
    .bind(member_of)
    .bind(member_of)
    .bind(limit)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTask {
    #[schema(example = 5)]
    pub project_id: u64,
    #[schema(example = "Design login screen")]
    pub subject: String,
    pub description: Option<String>,
    /// Low, Medium (default), High or Urgent
    #[schema(example = "High")]
    pub priority: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub exp_start_date: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub exp_end_date: Option<NaiveDate>,
}

fn parse_priority(raw: Option<&str>) -> ApiResult<TaskPriority> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(TaskPriority::Medium),
        Some(p) => TaskPriority::from_str(p)
            .map_err(|_| ApiError::bad_request("priority must be Low, Medium, High or Urgent")),
    }
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTask,
    responses(
        (status = 200, description = "Task created", body = Object, example = json!({"status": "success", "id": 31})),
        (status = 400, description = "Missing subject or unknown priority"),
        (status = 403, description = "Not a member of the project"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn create_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateTask>,
) -> ApiResult<HttpResponse> {
    let subject = body.subject.trim();
    if subject.is_empty() {
        return Err(ApiError::bad_request("subject is required"));
    }
    let priority = parse_priority(body.priority.as_deref())?;
    ensure_project_access(pool.get_ref(), &auth, body.project_id).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO tasks (project_id, subject, description, status, priority, exp_start_date, exp_end_date)
        VALUES (?, ?, ?, 'Open', ?, ?, ?)
        "#,
    )
    .bind(body.project_id)
    .bind(subject)
    .bind(body.description.as_deref())
    .bind(priority.to_string())
    .bind(body.exp_start_date)
    .bind(body.exp_end_date)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    tracing::info!(id, project_id = body.project_id, by = auth.user_id, "Task created");
    Ok(HttpResponse::Ok().json(json!({"status": "success", "id": id})))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TaskLogQuery {
    pub project_id: Option<u64>,
    pub task_id: Option<u64>,
    pub limit: Option<u32>,
}

/// Task logs; without filters, the caller's own
#[utoipa::path(
    get,
    path = "/api/task-logs",
    params(TaskLogQuery),
    responses(
        (status = 200, description = "Task logs, newest first", body = [TaskLog]),
        (status = 403, description = "Not a member of the project")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn list_task_logs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TaskLogQuery>,
) -> ApiResult<HttpResponse> {
    if let Some(project_id) = query.project_id {
        ensure_project_access(pool.get_ref(), &auth, project_id).await?;
    }
    let own_only = query.project_id.is_none() && query.task_id.is_none();
    let created_by = own_only.then_some(auth.user_id);
    let member_of = if auth.role.is_project_privileged() || own_only {
        None
    } else {
        Some(auth.employee_id()?)
    };

    let logs = sqlx::query_as::<_, TaskLog>(&format!(
        r#"
        SELECT {LOG_COLUMNS} FROM task_logs l
        WHERE (? IS NULL OR l.project_id = ?)
          AND (? IS NULL OR l.task_id = ?)
          AND (? IS NULL OR l.created_by = ?)
          AND (? IS NULL OR l.project_id IN (
                SELECT project_id FROM project_members WHERE employee_id = ? AND active = TRUE))
        ORDER BY l.log_time DESC
        LIMIT ?
        "#
    ))
    .bind(query.project_id)
    .bind(query.project_id)
    .bind(query.task_id)
    .bind(query.task_id)
    .bind(created_by)
    .bind(created_by)
    .bind(member_of)
    .bind(member_of)
    .bind(clamp_limit(query.limit))
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(logs))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskLog {
    #[schema(example = 5)]
    pub project_id: u64,
    #[schema(example = 31)]
    pub task_id: u64,
    #[schema(example = "Wired up the login API")]
    pub description: String,
    /// Defaults to now in the business timezone
    #[schema(format = "date-time", value_type = Option<String>)]
    pub log_time: Option<NaiveDateTime>,
}

#[utoipa::path(
    post,
    path = "/api/task-logs",
    request_body = CreateTaskLog,
    responses(
        (status = 200, description = "Log recorded", body = Object, example = json!({"status": "success", "id": 210})),
        (status = 400, description = "Empty description or task outside the project"),
        (status = 403, description = "Not a member of the project")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn create_task_log(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Json<CreateTaskLog>,
) -> ApiResult<HttpResponse> {
    let description = body.description.trim();
    if description.is_empty() {
        return Err(ApiError::bad_request("description is required"));
    }
    ensure_project_access(pool.get_ref(), &auth, body.project_id).await?;

    let task_project = sqlx::query_scalar::<_, u64>("SELECT project_id FROM tasks WHERE id = ?")
        .bind(body.task_id)
        .fetch_optional(pool.get_ref())
        .await?;
    if task_project != Some(body.project_id) {
        return Err(ApiError::bad_request(format!(
            "Task {} does not belong to project {}",
            body.task_id, body.project_id
        )));
    }

    let log_time = body.log_time.unwrap_or_else(|| clock::now_local(config.business_offset()));
    let id = sqlx::query(
        r#"
        INSERT INTO task_logs (project_id, task_id, employee_id, log_time, description, created_by)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(body.project_id)
    .bind(body.task_id)
    .bind(auth.employee_id)
    .bind(log_time)
    .bind(description)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    Ok(HttpResponse::Ok().json(json!({"status": "success", "id": id})))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u64]) -> HashSet<u64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn members_skip_unknown_active_and_duplicates() {
        let changes = plan_members(&[1, 2, 3, 2, 4], &set(&[1, 2, 4]), &set(&[4]));
        assert_eq!(
            changes,
            MemberChanges {
                added: vec![1, 2],
                skipped: vec![3, 2, 4],
            }
        );
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(parse_priority(None).unwrap(), TaskPriority::Medium);
        assert_eq!(parse_priority(Some(" ")).unwrap(), TaskPriority::Medium);
        assert_eq!(parse_priority(Some("Urgent")).unwrap(), TaskPriority::Urgent);
        assert!(parse_priority(Some("Critical")).is_err());
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(5_000)), 200);
    }

    #[test]
    fn task_counts() {
        let task = |status: &str, progress: f64| Task {
            id: 1,
            project_id: 1,
            subject: "s".into(),
            description: None,
            status: status.into(),
            priority: "Medium".into(),
            exp_start_date: None,
            exp_end_date: None,
            progress,
            modified_at: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        };
        let counts = TaskCounts::from_tasks(&[task("Open", 25.0), task("Completed", 100.0)]);
        assert_eq!(
            counts,
            TaskCounts { total: 2, open: 1, completed: 1, average_progress: 62.5 }
        );
        assert_eq!(TaskCounts::from_tasks(&[]), TaskCounts::default());
    }
}
