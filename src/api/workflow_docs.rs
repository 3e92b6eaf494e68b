//! Listing, fetching and deciding workflow documents (leave applications,
//! compensatory leave, expense claims, travel requests). Each document module
//! supplies its table's columns and row type; scoping, pagination and the
//! approve / reject / cancel plumbing live here.

use std::str::FromStr;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::{
        employee::{Employee, find_employee},
        workflow::{WorkflowAction, WorkflowDoc, WorkflowStatus},
    },
    push::fcm::FcmClient,
    utils::{
        db_utils::page_window,
        workflow::{ActionInput, apply_action},
    },
};
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySqlPool, mysql::MySqlRow};
use strum_macros::EnumString;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ListScope {
    /// The caller's own documents
    #[default]
    Mine,
    /// Open documents awaiting the caller's decision (every open one for HR)
    Approval,
    /// Everything; HR only
    All,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DocFilter {
    /// `mine` (default), `approval` or `all`
    #[schema(example = "mine")]
    pub scope: Option<String>,
    /// Only with scope `all`
    pub employee_id: Option<u64>,
    #[schema(example = "Open")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: i64,
}

// Helper enum for typed binding of the dynamic WHERE clause
#[derive(Debug, Clone, PartialEq)]
enum FilterValue {
    U64(u64),
    Str(String),
}

/// WHERE clause and its arguments for a listing.
fn build_filter(auth: &AuthUser, filter: &DocFilter) -> ApiResult<(String, Vec<FilterValue>)> {
    let scope = match filter.scope.as_deref() {
        None => ListScope::default(),
        Some(raw) => ListScope::from_str(raw.trim())
            .map_err(|_| ApiError::bad_request("scope must be mine, approval or all"))?,
    };

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    match scope {
        ListScope::Mine => {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(auth.employee_id()?));
        }
        ListScope::Approval => {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(WorkflowStatus::Open.to_string()));
            if !auth.is_hr() {
                where_sql.push_str(" AND approver_user_id = ?");
                args.push(FilterValue::U64(auth.user_id));
            }
        }
        ListScope::All => {
            auth.require_hr()?;
            if let Some(id) = filter.employee_id {
                where_sql.push_str(" AND employee_id = ?");
                args.push(FilterValue::U64(id));
            }
        }
    }

    if let Some(status) = filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let status = WorkflowStatus::from_str(status)
            .map_err(|_| ApiError::bad_request(format!("Unknown status: {status}")))?;
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    Ok((where_sql, args))
}

pub async fn list_docs<T>(
    pool: &MySqlPool,
    auth: &AuthUser,
    doc: WorkflowDoc,
    columns: &str,
    filter: &DocFilter,
) -> ApiResult<Page<T>>
where
    T: for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Unpin,
{
    let (where_sql, args) = build_filter(auth, filter)?;
    let (page, per_page, offset) = page_window(filter.page, filter.per_page)?;

    let count_sql = format!("SELECT COUNT(*) FROM {}{}", doc.table(), where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.as_str()),
        };
    }
    let total = count_q.fetch_one(pool).await?;

    let data_sql = format!(
        "SELECT {columns} FROM {}{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        doc.table(),
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, T>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(s.as_str()),
        };
    }
    let data = data_q.bind(per_page).bind(offset).fetch_all(pool).await?;

    Ok(Page {
        data,
        page,
        per_page,
        total,
    })
}

/// Fetches one document the caller may see: their own, one they approve,
/// or any for HR.
pub async fn get_doc<T>(pool: &MySqlPool, auth: &AuthUser, doc: WorkflowDoc, columns: &str, id: u64) -> ApiResult<T>
where
    T: for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Unpin,
{
    let access = sqlx::query_as::<_, (u64, Option<u64>)>(&format!(
        "SELECT employee_id, approver_user_id FROM {} WHERE id = ?",
        doc.table()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("{} {id} not found", doc.label())))?;

    if !can_view(auth, access.0, access.1) {
        return Err(ApiError::forbidden(format!("You cannot view this {}", doc.label())));
    }

    Ok(sqlx::query_as::<_, T>(&format!("SELECT {columns} FROM {} WHERE id = ?", doc.table()))
        .bind(id)
        .fetch_one(pool)
        .await?)
}

fn can_view(auth: &AuthUser, owner: u64, approver: Option<u64>) -> bool {
    auth.is_hr() || auth.employee_id == Some(owner) || approver == Some(auth.user_id)
}

/// Active employee a new document is filed for.
pub async fn filing_employee(pool: &MySqlPool, auth: &AuthUser, requested: Option<u64>) -> ApiResult<Employee> {
    let employee_id = auth.target_employee(requested)?;
    find_employee(pool, employee_id)
        .await?
        .filter(Employee::is_active)
        .ok_or_else(|| ApiError::not_found(format!("Employee {employee_id} not found or inactive")))
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DecisionReq {
    /// Expense claims only; defaults to the claimed amount.
    #[schema(example = 1500.0)]
    pub sanctioned_amount: Option<f64>,
}

/// Action named in a `/{id}/{action}` path.
pub fn parse_action(raw: &str) -> ApiResult<WorkflowAction> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "approve" => Ok(WorkflowAction::Approve),
        "reject" => Ok(WorkflowAction::Reject),
        "cancel" => Ok(WorkflowAction::Cancel),
        other => Err(ApiError::not_found(format!("Unknown action: {other}"))),
    }
}

/// Runs a workflow action and renders the standard response.
pub async fn decide(
    pool: &MySqlPool,
    fcm: &FcmClient,
    config: &Config,
    auth: &AuthUser,
    doc: WorkflowDoc,
    id: u64,
    action: WorkflowAction,
    input: ActionInput,
) -> ApiResult<HttpResponse> {
    let outcome = apply_action(pool, fcm, config, doc, id, action, auth, input).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": format!("{} {}", doc.label(), action.past_tense()),
        "data": outcome,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 5,
            username: "u".into(),
            role,
            employee_id: Some(40),
        }
    }

    fn filter(scope: Option<&str>, status: Option<&str>) -> DocFilter {
        DocFilter {
            scope: scope.map(String::from),
            employee_id: Some(77),
            status: status.map(String::from),
            page: None,
            per_page: None,
        }
    }

    #[test]
    fn mine_scopes_to_own_employee() {
        let (sql, args) = build_filter(&user(Role::Employee), &filter(None, Some("Approved"))).unwrap();
        assert_eq!(sql, " WHERE 1=1 AND employee_id = ? AND status = ?");
        assert_eq!(args, vec![FilterValue::U64(40), FilterValue::Str("Approved".into())]);
    }

    #[test]
    fn approval_scope_for_approver_and_hr() {
        let (sql, args) = build_filter(&user(Role::Employee), &filter(Some("approval"), None)).unwrap();
        assert!(sql.ends_with("AND approver_user_id = ?"));
        assert_eq!(args[1], FilterValue::U64(5));

        let (sql, _) = build_filter(&user(Role::HrUser), &filter(Some("Approval"), None)).unwrap();
        assert!(!sql.contains("approver_user_id"));
    }

    #[test]
    fn all_scope_needs_hr() {
        assert!(matches!(
            build_filter(&user(Role::Employee), &filter(Some("all"), None)),
            Err(ApiError::Forbidden(_))
        ));
        let (_, args) = build_filter(&user(Role::HrManager), &filter(Some("all"), None)).unwrap();
        assert_eq!(args, vec![FilterValue::U64(77)]);
    }

    #[test]
    fn rejects_unknown_scope_and_status() {
        assert!(build_filter(&user(Role::Employee), &filter(Some("team"), None)).is_err());
        assert!(build_filter(&user(Role::Employee), &filter(None, Some("Pending"))).is_err());
    }

    #[test]
    fn paging_is_clamped() {
        let mut f = filter(None, None);
        f.page = Some(0);
        f.per_page = Some(1000);
        assert_eq!(page_window(f.page, f.per_page).unwrap(), (1, 100, 0));
        f.page = Some(u64::MAX);
        assert!(page_window(f.page, f.per_page).is_err());
    }

    #[test]
    fn visibility() {
        let emp = user(Role::Employee);
        assert!(can_view(&emp, 40, None));
        assert!(can_view(&emp, 41, Some(5)));
        assert!(!can_view(&emp, 41, Some(6)));
        assert!(can_view(&user(Role::HrUser), 41, None));
    }
}
