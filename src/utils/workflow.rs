//! Approve / reject / cancel for workflow documents.
//!
//! The document row is locked, the caller's right to act is checked, and the
//! status is moved with a conditional `UPDATE` so that two concurrent
//! decisions cannot both succeed. Ledger side effects run in the same
//! transaction; the employee is notified after commit.

use std::str::FromStr;

use sqlx::{MySql, Transaction};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::model::leave_request::{LEDGER_APPLICATION, LEDGER_COMPENSATORY, leave_days};
use crate::model::workflow::{WorkflowAction, WorkflowDoc, WorkflowStatus, transition};
use crate::push::{self, fcm::{FcmClient, PushMessage}};
use crate::utils::clock;
use crate::utils::db_utils::placeholders;
use crate::utils::leave_ledger::{self, LedgerEntry};
use sqlx::MySqlPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocHeader {
    pub id: u64,
    pub employee_id: u64,
    pub status: String,
    pub approver_user_id: Option<u64>,
}

/// Approve and reject belong to HR or the document's designated approver;
/// cancel belongs to HR or the employee who owns the document.
pub fn authorize_action(user: &AuthUser, header: &DocHeader, action: WorkflowAction) -> ApiResult<()> {
    if user.is_hr() {
        return Ok(());
    }
    let allowed = match action {
        WorkflowAction::Approve | WorkflowAction::Reject => header.approver_user_id == Some(user.user_id),
        WorkflowAction::Cancel => user.employee_id == Some(header.employee_id),
    };
    if allowed {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!("You are not allowed to {action} this document")))
    }
}

/// Extra input some actions take.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionInput {
    /// Expense approval only; defaults to the claimed amount.
    pub sanctioned_amount: Option<f64>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ActionOutcome {
    pub id: u64,
    pub employee_id: u64,
    pub from: WorkflowStatus,
    pub to: WorkflowStatus,
}

async fn lock_header(
    tx: &mut Transaction<'_, MySql>,
    doc: WorkflowDoc,
    id: u64,
) -> ApiResult<DocHeader> {
    let sql = format!(
        "SELECT id, employee_id, status, approver_user_id FROM {} WHERE id = ? FOR UPDATE",
        doc.table()
    );
    sqlx::query_as::<_, DocHeader>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} {id} not found", doc.label())))
}

async fn apply_effects(
    tx: &mut Transaction<'_, MySql>,
    doc: WorkflowDoc,
    action: WorkflowAction,
    from: WorkflowStatus,
    header: &DocHeader,
    input: ActionInput,
    today: chrono::NaiveDate,
) -> ApiResult<()> {
    match (doc, action) {
        (WorkflowDoc::LeaveApplication, WorkflowAction::Approve) => {
            let (leave_type, days): (String, f64) = sqlx::query_as(
                "SELECT leave_type, total_leave_days FROM leave_applications WHERE id = ?",
            )
            .bind(header.id)
            .fetch_one(&mut **tx)
            .await?;

            let available = leave_ledger::balance(&mut **tx, header.employee_id, &leave_type).await?;
            if available < days {
                return Err(ApiError::conflict(format!(
                    "Insufficient {leave_type} balance: {available} available, {days} requested"
                )));
            }

            leave_ledger::post(
                &mut **tx,
                LedgerEntry {
                    employee_id: header.employee_id,
                    leave_type: &leave_type,
                    leaves: -days,
                    transaction_type: LEDGER_APPLICATION,
                    transaction_id: Some(header.id),
                    posting_date: today,
                },
            )
            .await?;
        }
        (WorkflowDoc::CompensatoryLeave, WorkflowAction::Approve) => {
            let (leave_type, from_date, to_date, half_day): (String, chrono::NaiveDate, chrono::NaiveDate, bool) =
                sqlx::query_as(
                    r#"
                    SELECT leave_type, work_from_date, work_end_date, half_day
                    FROM compensatory_leave_requests WHERE id = ?
                    "#,
                )
                .bind(header.id)
                .fetch_one(&mut **tx)
                .await?;

            leave_ledger::post(
                &mut **tx,
                LedgerEntry {
                    employee_id: header.employee_id,
                    leave_type: &leave_type,
                    leaves: leave_days(from_date, to_date, half_day),
                    transaction_type: LEDGER_COMPENSATORY,
                    transaction_id: Some(header.id),
                    posting_date: today,
                },
            )
            .await?;
        }
        (WorkflowDoc::LeaveApplication, WorkflowAction::Cancel) if from == WorkflowStatus::Approved => {
            leave_ledger::cancel_for(&mut **tx, LEDGER_APPLICATION, header.id).await?;
        }
        (WorkflowDoc::CompensatoryLeave, WorkflowAction::Cancel) if from == WorkflowStatus::Approved => {
            leave_ledger::cancel_for(&mut **tx, LEDGER_COMPENSATORY, header.id).await?;
        }
        (WorkflowDoc::ExpenseClaim, WorkflowAction::Approve) => {
            let claimed: f64 = sqlx::query_scalar("SELECT total_claimed_amount FROM expense_claims WHERE id = ?")
                .bind(header.id)
                .fetch_one(&mut **tx)
                .await?;
            let sanctioned = input.sanctioned_amount.unwrap_or(claimed);
            if !sanctioned.is_finite() || sanctioned < 0.0 || sanctioned > claimed {
                return Err(ApiError::bad_request(format!(
                    "Sanctioned amount must be between 0 and the claimed amount {claimed}"
                )));
            }
            sqlx::query("UPDATE expense_claims SET total_sanctioned_amount = ? WHERE id = ?")
                .bind(sanctioned)
                .bind(header.id)
                .execute(&mut **tx)
                .await?;
        }
        _ => {}
    }
    Ok(())
}

/// Runs `action` on document `id` and notifies its employee.
pub async fn apply_action(
    pool: &MySqlPool,
    fcm: &FcmClient,
    config: &Config,
    doc: WorkflowDoc,
    id: u64,
    action: WorkflowAction,
    user: &AuthUser,
    input: ActionInput,
) -> ApiResult<ActionOutcome> {
    let now = clock::now_local(config.business_offset());
    let mut tx = pool.begin().await?;

    let header = lock_header(&mut tx, doc, id).await?;
    authorize_action(user, &header, action)?;

    let from = WorkflowStatus::from_str(&header.status)
        .map_err(|_| ApiError::Internal(format!("{} {id} has unknown status {}", doc.label(), header.status)))?;
    let to = transition(from, action).ok_or_else(|| {
        ApiError::conflict(format!("Cannot {action} a {} in status {from}", doc.label()))
    })?;

    let sources = action.sources();
    let sql = format!(
        "UPDATE {} SET status = ?, decided_by = ?, decided_at = ? WHERE id = ? AND status IN ({})",
        doc.table(),
        placeholders(sources.len())
    );
    let mut update = sqlx::query(&sql)
        .bind(to.to_string())
        .bind(user.user_id)
        .bind(now)
        .bind(id);
    for s in sources {
        update = update.bind(s.to_string());
    }
    if update.execute(&mut *tx).await?.rows_affected() == 0 {
        return Err(ApiError::conflict(format!(
            "{} {id} was modified concurrently",
            doc.label()
        )));
    }

    apply_effects(&mut tx, doc, action, from, &header, input, now.date()).await?;
    tx.commit().await?;

    tracing::info!(
        doc = doc.label(),
        id,
        from = %from,
        to = %to,
        user_id = user.user_id,
        "Workflow transition applied"
    );

    let msg = PushMessage::new(
        format!("{} {}", doc.label(), to),
        format!("Your {} #{id} has been {}", doc.label(), action.past_tense()),
    )
    .with_data("doctype", doc.label())
    .with_data("docname", id)
    .with_tag(format!("{}-{id}", doc.table()));
    push::notify_employee(pool, fcm, header.employee_id, &msg, Some(user.user_id)).await;

    Ok(ActionOutcome {
        id,
        employee_id: header.employee_id,
        from,
        to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn header() -> DocHeader {
        DocHeader {
            id: 1,
            employee_id: 20,
            status: "Open".into(),
            approver_user_id: Some(5),
        }
    }

    fn user(user_id: u64, role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id,
            username: "x".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn designated_approver_may_decide() {
        let approver = user(5, Role::Employee, Some(30));
        assert!(authorize_action(&approver, &header(), WorkflowAction::Approve).is_ok());
        assert!(authorize_action(&approver, &header(), WorkflowAction::Reject).is_ok());
        assert!(authorize_action(&approver, &header(), WorkflowAction::Cancel).is_err());
    }

    #[test]
    fn owner_may_only_cancel() {
        let owner = user(8, Role::Employee, Some(20));
        assert!(authorize_action(&owner, &header(), WorkflowAction::Cancel).is_ok());
        assert!(matches!(
            authorize_action(&owner, &header(), WorkflowAction::Approve),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn hr_may_do_anything() {
        let hr = user(2, Role::HrUser, None);
        for action in [WorkflowAction::Approve, WorkflowAction::Reject, WorkflowAction::Cancel] {
            assert!(authorize_action(&hr, &header(), action).is_ok());
        }
    }

    #[test]
    fn strangers_are_forbidden() {
        let other = user(9, Role::ProjectManager, Some(99));
        assert!(authorize_action(&other, &header(), WorkflowAction::Approve).is_err());
        assert!(authorize_action(&other, &header(), WorkflowAction::Cancel).is_err());
    }
}
