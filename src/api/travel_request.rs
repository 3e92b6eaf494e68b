use crate::{
    api::workflow_docs::{self, DocFilter, Page},
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::{
        leave_request::TravelRequest,
        workflow::{WorkflowDoc, WorkflowStatus},
    },
    push::{
        self,
        fcm::{FcmClient, PushMessage},
    },
    utils::workflow::ActionInput,
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

const TRAVEL_COLUMNS: &str = "id, employee_id, purpose, destination, from_date, to_date, estimated_cost, \
     approver_user_id, status, decided_by, decided_at, created_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTravel {
    pub employee_id: Option<u64>,
    #[schema(example = "Client onboarding")]
    pub purpose: String,
    #[schema(example = "Chattogram")]
    pub destination: String,
    #[schema(example = "2026-04-12", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-04-14", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = 12000.0)]
    pub estimated_cost: Option<f64>,
}

fn validate_travel(req: &CreateTravel) -> ApiResult<()> {
    if req.purpose.trim().is_empty() || req.destination.trim().is_empty() {
        return Err(ApiError::bad_request("purpose and destination are required"));
    }
    if req.to_date < req.from_date {
        return Err(ApiError::bad_request("To date cannot be before from date"));
    }
    if req.estimated_cost.is_some_and(|c| !c.is_finite() || c < 0.0) {
        return Err(ApiError::bad_request("estimated_cost cannot be negative"));
    }
    Ok(())
}

/// Submit a travel request
#[utoipa::path(
    post,
    path = "/api/travel-requests",
    request_body = CreateTravel,
    responses(
        (status = 200, description = "Travel request submitted", body = Object, example = json!({
            "status": "success",
            "message": "Travel request submitted",
            "data": {"id": 3, "status": "Open"}
        })),
        (status = 400, description = "Missing fields or invalid dates"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Travel Requests"
)]
pub async fn create_travel(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    fcm: web::Data<FcmClient>,
    payload: web::Json<CreateTravel>,
) -> ApiResult<HttpResponse> {
    validate_travel(&payload)?;
    let employee = workflow_docs::filing_employee(pool.get_ref(), &auth, payload.employee_id).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO travel_requests
            (employee_id, purpose, destination, from_date, to_date, estimated_cost, approver_user_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee.id)
    .bind(payload.purpose.trim())
    .bind(payload.destination.trim())
    .bind(payload.from_date)
    .bind(payload.to_date)
    .bind(payload.estimated_cost)
    .bind(employee.leave_approver_user_id)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    tracing::info!(id, employee_id = employee.id, destination = %payload.destination, "Travel request created");

    if let Some(approver) = employee.leave_approver_user_id {
        let msg = PushMessage::new(
            "Travel Request",
            format!(
                "{} requested travel to {} from {}",
                employee.employee_name,
                payload.destination.trim(),
                payload.from_date
            ),
        )
        .with_data("doctype", WorkflowDoc::TravelRequest.label())
        .with_data("docname", id);
        push::notify_users(pool.get_ref(), fcm.get_ref(), &[approver], &msg, Some(auth.user_id)).await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Travel request submitted",
        "data": {"id": id, "status": WorkflowStatus::Open},
    })))
}

#[utoipa::path(
    get,
    path = "/api/travel-requests",
    params(DocFilter),
    responses((status = 200, description = "Paginated travel requests")),
    security(("bearer_auth" = [])),
    tag = "Travel Requests"
)]
pub async fn list_travel(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DocFilter>,
) -> ApiResult<HttpResponse> {
    let page: Page<TravelRequest> =
        workflow_docs::list_docs(pool.get_ref(), &auth, WorkflowDoc::TravelRequest, TRAVEL_COLUMNS, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    get,
    path = "/api/travel-requests/{id}",
    params(("id" = u64, Path, description = "Travel request id")),
    responses(
        (status = 200, description = "Travel request", body = TravelRequest),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Travel Requests"
)]
pub async fn get_travel(auth: AuthUser, pool: web::Data<MySqlPool>, path: web::Path<u64>) -> ApiResult<HttpResponse> {
    let doc: TravelRequest =
        workflow_docs::get_doc(pool.get_ref(), &auth, WorkflowDoc::TravelRequest, TRAVEL_COLUMNS, path.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(doc))
}

#[utoipa::path(
    put,
    path = "/api/travel-requests/{id}/{action}",
    params(
        ("id" = u64, Path, description = "Travel request id"),
        ("action" = String, Path, description = "approve, reject or cancel")
    ),
    responses(
        (status = 200, description = "Transition applied"),
        (status = 403, description = "Not allowed to act"),
        (status = 404, description = "Not found or unknown action"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    security(("bearer_auth" = [])),
    tag = "Travel Requests"
)]
pub async fn decide_travel(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    fcm: web::Data<FcmClient>,
    path: web::Path<(u64, String)>,
) -> ApiResult<HttpResponse> {
    let (id, action) = path.into_inner();
    workflow_docs::decide(
        pool.get_ref(),
        fcm.get_ref(),
        config.get_ref(),
        &auth,
        WorkflowDoc::TravelRequest,
        id,
        workflow_docs::parse_action(&action)?,
        ActionInput::default(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(from: u32, to: u32) -> CreateTravel {
        CreateTravel {
            employee_id: None,
            purpose: "Audit".into(),
            destination: "Sylhet".into(),
            from_date: NaiveDate::from_ymd_opt(2026, 4, from).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2026, 4, to).unwrap(),
            estimated_cost: Some(500.0),
        }
    }

    #[test]
    fn accepts_a_plain_trip() {
        assert!(validate_travel(&req(12, 14)).is_ok());
        assert!(validate_travel(&req(12, 12)).is_ok());
    }

    #[test]
    fn rejects_reversed_dates_and_blank_fields() {
        assert!(validate_travel(&req(14, 12)).is_err());

        let mut blank = req(12, 14);
        blank.destination = " ".into();
        assert!(validate_travel(&blank).is_err());

        let mut negative = req(12, 14);
        negative.estimated_cost = Some(-1.0);
        assert!(validate_travel(&negative).is_err());
    }
}
