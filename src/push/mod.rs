//! In-app notifications plus device push. Everything here is best effort:
//! failures are logged and never bubble up to the request that triggered
//! them.

pub mod fcm;

use sqlx::MySqlPool;

use crate::utils::db_utils::placeholders;

use fcm::{FcmClient, PushMessage, PushReport};

#[derive(sqlx::FromRow)]
struct Recipient {
    user_id: u64,
    /// NULL for accounts without an employee record.
    notifications_enabled: Option<bool>,
}

async fn store_in_app(
    pool: &MySqlPool,
    user_ids: &[u64],
    msg: &PushMessage,
    from_user_id: Option<u64>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for user_id in user_ids {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, title, message, from_user_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&msg.title)
        .bind(&msg.body)
        .bind(from_user_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

async fn device_tokens(pool: &MySqlPool, user_ids: &[u64]) -> Result<Vec<String>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    let marks = placeholders(user_ids.len());
    let sql = format!("SELECT fcm_token FROM mobile_devices WHERE user_id IN ({marks})");
    let mut query = sqlx::query_scalar::<_, String>(&sql);
    for id in user_ids {
        query = query.bind(id);
    }
    query.fetch_all(pool).await
}

async fn deliver(
    pool: &MySqlPool,
    fcm: &FcmClient,
    recipients: Vec<Recipient>,
    msg: &PushMessage,
    from_user_id: Option<u64>,
) -> PushReport {
    let all: Vec<u64> = recipients.iter().map(|r| r.user_id).collect();
    if all.is_empty() {
        return PushReport::default();
    }

    if let Err(e) = store_in_app(pool, &all, msg, from_user_id).await {
        tracing::error!(error = %e, title = %msg.title, "Failed to store in-app notifications");
    }

    let opted_in: Vec<u64> = recipients
        .iter()
        .filter(|r| r.notifications_enabled.unwrap_or(true))
        .map(|r| r.user_id)
        .collect();

    let tokens = match device_tokens(pool, &opted_in).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load device tokens");
            return PushReport::default();
        }
    };

    match fcm.send_each(&tokens, msg).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, title = %msg.title, "Push notification failed");
            PushReport::default()
        }
    }
}

/// Notifies the user accounts of the given active employees.
pub async fn notify_employees(
    pool: &MySqlPool,
    fcm: &FcmClient,
    employee_ids: &[u64],
    msg: &PushMessage,
    from_user_id: Option<u64>,
) -> PushReport {
    if employee_ids.is_empty() {
        return PushReport::default();
    }

    let marks = placeholders(employee_ids.len());
    let sql = format!(
        r#"
        SELECT u.id AS user_id, e.notifications_enabled
        FROM users u
        JOIN employees e ON e.id = u.employee_id
        WHERE e.status = 'Active' AND u.is_active = TRUE AND e.id IN ({marks})
        "#
    );
    let mut query = sqlx::query_as::<_, Recipient>(&sql);
    for id in employee_ids {
        query = query.bind(id);
    }

    match query.fetch_all(pool).await {
        Ok(recipients) => deliver(pool, fcm, recipients, msg, from_user_id).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to resolve notification recipients");
            PushReport::default()
        }
    }
}

pub async fn notify_employee(
    pool: &MySqlPool,
    fcm: &FcmClient,
    employee_id: u64,
    msg: &PushMessage,
    from_user_id: Option<u64>,
) -> PushReport {
    notify_employees(pool, fcm, &[employee_id], msg, from_user_id).await
}

/// Notifies specific user accounts, e.g. a document's approver.
pub async fn notify_users(
    pool: &MySqlPool,
    fcm: &FcmClient,
    user_ids: &[u64],
    msg: &PushMessage,
    from_user_id: Option<u64>,
) -> PushReport {
    if user_ids.is_empty() {
        return PushReport::default();
    }

    let marks = placeholders(user_ids.len());
    let sql = format!(
        r#"
        SELECT u.id AS user_id, e.notifications_enabled
        FROM users u
        LEFT JOIN employees e ON e.id = u.employee_id
        WHERE u.is_active = TRUE AND u.id IN ({marks})
        "#
    );
    let mut query = sqlx::query_as::<_, Recipient>(&sql);
    for id in user_ids {
        query = query.bind(id);
    }

    match query.fetch_all(pool).await {
        Ok(recipients) => deliver(pool, fcm, recipients, msg, from_user_id).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to resolve notification recipients");
            PushReport::default()
        }
    }
}

/// Notifies every active Admin, HR Manager and HR User account.
pub async fn notify_hr(
    pool: &MySqlPool,
    fcm: &FcmClient,
    msg: &PushMessage,
    from_user_id: Option<u64>,
) -> PushReport {
    let recipients = sqlx::query_as::<_, Recipient>(
        r#"
        SELECT u.id AS user_id, e.notifications_enabled
        FROM users u
        LEFT JOIN employees e ON e.id = u.employee_id
        WHERE u.is_active = TRUE AND u.role_id IN (1, 2, 3)
        "#,
    )
    .fetch_all(pool)
    .await;

    match recipients {
        Ok(recipients) => deliver(pool, fcm, recipients, msg, from_user_id).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to resolve HR recipients");
            PushReport::default()
        }
    }
}
