use std::collections::HashSet;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use sqlx::MySqlPool;

use crate::config::Config;
use crate::model::employee::active_roster;
use crate::push::{self, fcm::{FcmClient, PushMessage}};
use crate::utils::{clock, holidays};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reminder {
    CheckIn,
    CheckOut,
    ProjectLog,
}

impl Reminder {
    fn message(self) -> PushMessage {
        let (title, body) = match self {
            Reminder::CheckIn => ("Check-In Reminder", "You have not checked in yet today."),
            Reminder::CheckOut => ("Check-Out Reminder", "Don't forget to check out before you leave."),
            Reminder::ProjectLog => ("Project Log Reminder", "Please log what you worked on this past hour."),
        };
        PushMessage::new(title, body).with_tag(format!("{self:?}").to_lowercase())
    }
}

/// Reminders whose half-hour slot contains `now`. The job fires twice an
/// hour, so each slot is seen exactly once even when the business offset is
/// not a whole number of hours.
pub fn due_reminders(now: NaiveDateTime) -> Vec<Reminder> {
    if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
        return Vec::new();
    }

    let slot = (now.hour(), now.minute() / 30);
    let mut due = Vec::new();
    if slot == (9, 1) {
        due.push(Reminder::CheckIn);
    }
    if slot == (18, 1) {
        due.push(Reminder::CheckOut);
    }
    if slot.1 == 0 && (10..=19).contains(&slot.0) {
        due.push(Reminder::ProjectLog);
    }
    due
}

/// Employees that have not recorded attendance today and are not on holiday.
async fn missing_check_in(pool: &MySqlPool, today: NaiveDate) -> Result<Vec<u64>> {
    let roster = active_roster(pool, None).await?;
    let off = holidays::roster_on_holiday(pool, &roster, today).await?;

    let present: HashSet<u64> = sqlx::query_scalar::<_, u64>(
        "SELECT employee_id FROM attendance WHERE attendance_date = ? AND docstatus < 2",
    )
    .bind(today)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let opted_in: HashSet<u64> = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM employees WHERE status = 'Active' AND attendance_reminders = TRUE",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    Ok(roster
        .iter()
        .map(|e| e.id)
        .filter(|id| opted_in.contains(id) && !off.contains(id) && !present.contains(id))
        .collect())
}

async fn missing_check_out(pool: &MySqlPool, today: NaiveDate) -> Result<Vec<u64>, sqlx::Error> {
    sqlx::query_scalar::<_, u64>(
        r#"
        SELECT a.employee_id
        FROM attendance a
        JOIN employees e ON e.id = a.employee_id
        WHERE a.attendance_date = ? AND a.docstatus < 2
          AND a.in_time IS NOT NULL AND a.out_time IS NULL
          AND e.status = 'Active' AND e.attendance_reminders = TRUE
        "#,
    )
    .bind(today)
    .fetch_all(pool)
    .await
}

async fn project_members(pool: &MySqlPool) -> Result<Vec<u64>, sqlx::Error> {
    sqlx::query_scalar::<_, u64>(
        r#"
        SELECT DISTINCT pm.employee_id
        FROM project_members pm
        JOIN employees e ON e.id = pm.employee_id
        WHERE pm.active = TRUE AND e.status = 'Active' AND e.project_reminders = TRUE
        "#,
    )
    .fetch_all(pool)
    .await
}

async fn recipients(pool: &MySqlPool, reminder: Reminder, today: NaiveDate) -> Result<Vec<u64>> {
    Ok(match reminder {
        Reminder::CheckIn => missing_check_in(pool, today).await?,
        Reminder::CheckOut => missing_check_out(pool, today).await?,
        Reminder::ProjectLog => project_members(pool).await?,
    })
}

/// One scheduler tick: sends whatever reminders are due right now.
pub async fn run(pool: &MySqlPool, fcm: &FcmClient, config: &Config) -> Result<()> {
    let now = clock::now_local(config.business_offset());
    let due = due_reminders(now);
    if due.is_empty() {
        tracing::debug!(%now, "No reminders due");
        return Ok(());
    }

    for reminder in due {
        let employee_ids = recipients(pool, reminder, now.date()).await?;
        if employee_ids.is_empty() {
            continue;
        }
        let report = push::notify_employees(pool, fcm, &employee_ids, &reminder.message(), None).await;
        tracing::info!(
            ?reminder,
            recipients = employee_ids.len(),
            sent = report.success_count,
            failed = report.failure_count,
            "Reminders sent"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        // 2026-03-02 is a Monday
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn check_in_reminder_at_half_past_nine() {
        assert_eq!(due_reminders(at(2, 9, 30)), vec![Reminder::CheckIn]);
        assert_eq!(due_reminders(at(2, 9, 44)), vec![Reminder::CheckIn]);
        assert!(due_reminders(at(2, 9, 0)).is_empty());
    }

    #[test]
    fn check_out_and_project_log_slots() {
        assert_eq!(due_reminders(at(2, 18, 30)), vec![Reminder::CheckOut]);
        assert_eq!(due_reminders(at(2, 10, 0)), vec![Reminder::ProjectLog]);
        assert_eq!(due_reminders(at(2, 19, 15)), vec![Reminder::ProjectLog]);
        assert!(due_reminders(at(2, 20, 0)).is_empty());
        assert!(due_reminders(at(2, 10, 30)).is_empty());
    }

    #[test]
    fn nothing_on_weekends() {
        // 2026-03-07 is a Saturday
        assert!(due_reminders(at(7, 9, 30)).is_empty());
        assert!(due_reminders(at(8, 12, 0)).is_empty());
    }
}
