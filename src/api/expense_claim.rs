use crate::{
    api::workflow_docs::{self, DecisionReq, DocFilter, Page},
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::{
        leave_request::ExpenseClaim,
        workflow::{WorkflowAction, WorkflowDoc, WorkflowStatus},
    },
    push::{
        self,
        fcm::{FcmClient, PushMessage},
    },
    utils::{attendance_calc::round_to, clock, workflow::ActionInput},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const EXPENSE_COLUMNS: &str = "id, employee_id, expense_type, description, expense_date, total_claimed_amount, \
     total_sanctioned_amount, currency, approver_user_id, status, posting_date, decided_by, decided_at, created_at";

const DEFAULT_CURRENCY: &str = "BDT";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateExpense {
    pub employee_id: Option<u64>,
    #[schema(example = "Travel")]
    pub expense_type: String,
    #[schema(example = "Client visit taxi fare")]
    pub description: Option<String>,
    #[schema(example = "2026-03-03", format = "date", value_type = String)]
    pub expense_date: NaiveDate,
    #[schema(example = 1500.0)]
    pub amount: f64,
    /// Defaults to BDT
    #[schema(example = "BDT")]
    pub currency: Option<String>,
}

fn validate_expense(req: &CreateExpense, today: NaiveDate) -> ApiResult<String> {
    if req.expense_type.trim().is_empty() {
        return Err(ApiError::bad_request("expense_type is required"));
    }
    if !req.amount.is_finite() || req.amount <= 0.0 {
        return Err(ApiError::bad_request("amount must be greater than zero"));
    }
    if req.expense_date > today {
        return Err(ApiError::bad_request("Expense date cannot be in the future"));
    }
    let currency = req
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::bad_request("currency must be a three letter code"));
    }
    Ok(currency)
}

/// Submit an expense claim
#[utoipa::path(
    post,
    path = "/api/expense-claims",
    request_body = CreateExpense,
    responses(
        (status = 200, description = "Claim submitted", body = Object, example = json!({
            "status": "success",
            "message": "Expense claim submitted",
            "data": {"id": 9, "status": "Open"}
        })),
        (status = 400, description = "Missing type, non-positive amount or future date"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Expense Claims"
)]
pub async fn create_expense(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    payload: web::Json<CreateExpense>,
) -> ApiResult<HttpResponse> {
    let today = clock::today(config.business_offset());
    let currency = validate_expense(&payload, today)?;
    let employee = workflow_docs::filing_employee(pool.get_ref(), &auth, payload.employee_id).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO expense_claims
            (employee_id, expense_type, description, expense_date, total_claimed_amount,
             currency, approver_user_id, posting_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee.id)
    .bind(payload.expense_type.trim())
    .bind(payload.description.as_deref())
    .bind(payload.expense_date)
    .bind(payload.amount)
    .bind(&currency)
    .bind(employee.expense_approver_user_id)
    .bind(today)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    tracing::info!(id, employee_id = employee.id, amount = payload.amount, %currency, "Expense claim created");

    if let Some(approver) = employee.expense_approver_user_id {
        let msg = PushMessage::new(
            "Expense Claim",
            format!("{} claimed {currency} {}", employee.employee_name, payload.amount),
        )
        .with_data("doctype", WorkflowDoc::ExpenseClaim.label())
        .with_data("docname", id);
        push::notify_users(pool.get_ref(), fcm.get_ref(), &[approver], &msg, Some(auth.user_id)).await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Expense claim submitted",
        "data": {"id": id, "status": WorkflowStatus::Open},
    })))
}

/// Expense claims
#[utoipa::path(
    get,
    path = "/api/expense-claims",
    params(DocFilter),
    responses((status = 200, description = "Paginated expense claims")),
    security(("bearer_auth" = [])),
    tag = "Expense Claims"
)]
pub async fn list_expenses(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DocFilter>,
) -> ApiResult<HttpResponse> {
    let page: Page<ExpenseClaim> =
        workflow_docs::list_docs(pool.get_ref(), &auth, WorkflowDoc::ExpenseClaim, EXPENSE_COLUMNS, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    get,
    path = "/api/expense-claims/{id}",
    params(("id" = u64, Path, description = "Expense claim id")),
    responses(
        (status = 200, description = "Expense claim", body = ExpenseClaim),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Expense Claims"
)]
pub async fn get_expense(auth: AuthUser, pool: web::Data<MySqlPool>, path: web::Path<u64>) -> ApiResult<HttpResponse> {
    let claim: ExpenseClaim = workflow_docs::get_doc(
        pool.get_ref(),
        &auth,
        WorkflowDoc::ExpenseClaim,
        EXPENSE_COLUMNS,
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(claim))
}

/// Approve, reject or cancel a claim. Approval takes an optional sanctioned amount.
#[utoipa::path(
    put,
    path = "/api/expense-claims/{id}/{action}",
    params(
        ("id" = u64, Path, description = "Expense claim id"),
        ("action" = String, Path, description = "approve, reject or cancel")
    ),
    request_body(content = DecisionReq, description = "Sanctioned amount, approve only; the body may be omitted"),
    responses(
        (status = 200, description = "Transition applied", body = Object, example = json!({
            "status": "success",
            "message": "Expense Claim approved",
            "data": {"id": 9, "employee_id": 12, "from": "Open", "to": "Approved"}
        })),
        (status = 400, description = "Sanctioned amount outside 0..claimed"),
        (status = 403, description = "Not allowed to act"),
        (status = 404, description = "Not found or unknown action"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    security(("bearer_auth" = [])),
    tag = "Expense Claims"
)]
pub async fn decide_expense(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    path: web::Path<(u64, String)>,
    body: Option<web::Json<DecisionReq>>,
) -> ApiResult<HttpResponse> {
    let (id, action) = path.into_inner();
    let action = workflow_docs::parse_action(&action)?;
    let sanctioned_amount = match action {
        WorkflowAction::Approve => body.and_then(|b| b.into_inner().sanctioned_amount),
        _ => None,
    };
    workflow_docs::decide(
        pool.get_ref(),
        fcm.get_ref(),
        config.get_ref(),
        &auth,
        WorkflowDoc::ExpenseClaim,
        id,
        action,
        ActionInput { sanctioned_amount },
    )
    .await
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SummaryQuery {
    /// HR only; defaults to the caller
    pub employee_id: Option<u64>,
    #[param(value_type = Option<String>, format = "date")]
    pub from_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    pub to_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct StatusTotal {
    pub status: String,
    pub count: i64,
    pub claimed: f64,
    pub sanctioned: f64,
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct ExpenseTotals {
    pub claims: i64,
    pub total_claimed: f64,
    pub total_sanctioned: f64,
    pub pending_amount: f64,
}

impl ExpenseTotals {
    fn from_statuses(rows: &[StatusTotal]) -> Self {
        let mut totals = rows.iter().fold(Self::default(), |mut acc, row| {
            acc.claims += row.count;
            if row.status != WorkflowStatus::Cancelled.to_string() {
                acc.total_claimed += row.claimed;
            }
            if row.status == WorkflowStatus::Approved.to_string() {
                acc.total_sanctioned += row.sanctioned;
            }
            if row.status == WorkflowStatus::Open.to_string() {
                acc.pending_amount += row.claimed;
            }
            acc
        });
        totals.total_claimed = round_to(totals.total_claimed, 2);
        totals.total_sanctioned = round_to(totals.total_sanctioned, 2);
        totals.pending_amount = round_to(totals.pending_amount, 2);
        totals
    }
}

/// Claimed and sanctioned totals per status
#[utoipa::path(
    get,
    path = "/api/expense-claims/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Expense summary", body = Object, example = json!({
            "employee_id": 12,
            "by_status": [{"status": "Approved", "count": 3, "claimed": 4200.0, "sanctioned": 4000.0}],
            "totals": {"claims": 3, "total_claimed": 4200.0, "total_sanctioned": 4000.0, "pending_amount": 0.0}
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Expense Claims"
)]
pub async fn expense_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SummaryQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = auth.target_employee(query.employee_id)?;

    let by_status = sqlx::query_as::<_, StatusTotal>(
        r#"
        SELECT status,
               COUNT(*) AS count,
               CAST(COALESCE(SUM(total_claimed_amount), 0) AS DOUBLE) AS claimed,
               CAST(COALESCE(SUM(total_sanctioned_amount), 0) AS DOUBLE) AS sanctioned
        FROM expense_claims
        WHERE employee_id = ?
          AND (? IS NULL OR expense_date >= ?)
          AND (? IS NULL OR expense_date <= ?)
        GROUP BY status
        ORDER BY status
        "#,
    )
    .bind(employee_id)
    .bind(query.from_date)
    .bind(query.from_date)
    .bind(query.to_date)
    .bind(query.to_date)
    .fetch_all(pool.get_ref())
    .await?;

    let totals = ExpenseTotals::from_statuses(&by_status);
    Ok(HttpResponse::Ok().json(json!({
        "employee_id": employee_id,
        "by_status": by_status,
        "totals": totals,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn req(amount: f64, currency: Option<&str>) -> CreateExpense {
        CreateExpense {
            employee_id: None,
            expense_type: "Travel".into(),
            description: None,
            expense_date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            amount,
            currency: currency.map(String::from),
        }
    }

    #[test]
    fn currency_defaults_and_normalises() {
        assert_eq!(validate_expense(&req(10.0, None), today()).unwrap(), "BDT");
        assert_eq!(validate_expense(&req(10.0, Some(" usd ")), today()).unwrap(), "USD");
        assert!(validate_expense(&req(10.0, Some("TAKA")), today()).is_err());
    }

    #[test]
    fn rejects_bad_amounts_and_dates() {
        assert!(validate_expense(&req(0.0, None), today()).is_err());
        assert!(validate_expense(&req(f64::NAN, None), today()).is_err());

        let mut future = req(10.0, None);
        future.expense_date = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        assert!(validate_expense(&future, today()).is_err());
    }

    #[test]
    fn totals_skip_cancelled_claims() {
        let rows = vec![
            StatusTotal { status: "Approved".into(), count: 2, claimed: 300.0, sanctioned: 250.0 },
            StatusTotal { status: "Cancelled".into(), count: 1, claimed: 999.0, sanctioned: 0.0 },
            StatusTotal { status: "Open".into(), count: 1, claimed: 120.126, sanctioned: 0.0 },
        ];
        assert_eq!(
            ExpenseTotals::from_statuses(&rows),
            ExpenseTotals {
                claims: 4,
                total_claimed: 420.13,
                total_sanctioned: 250.0,
                pending_amount: 120.13,
            }
        );
    }
}
