//! Background jobs. Only attendance and project reminders live here.

pub mod reminders;

use anyhow::Result;
use sqlx::MySqlPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::Config;
use crate::push::fcm::FcmClient;

/// Every half hour, on the hour and half past (UTC).
const REMINDER_CRON: &str = "0 0,30 * * * *";

/// Starts the reminder scheduler. Callers hold the returned handle for the
/// lifetime of the server.
pub async fn start_scheduler(pool: MySqlPool, fcm: FcmClient, config: Config) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(REMINDER_CRON, move |_uuid, _lock| {
        let pool = pool.clone();
        let fcm = fcm.clone();
        let config = config.clone();

        Box::pin(async move {
            if let Err(e) = reminders::run(&pool, &fcm, &config).await {
                tracing::error!(error = %e, "Reminder run failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(cron = REMINDER_CRON, "Reminder scheduler started");
    Ok(scheduler)
}
