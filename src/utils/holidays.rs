//! Holiday lookups. Each holiday list is loaded once and kept in an async TTL
//! cache, since every report walks every employee over every day.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use futures::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

use crate::model::employee::RosterEntry;

pub type HolidaySet = Arc<BTreeSet<NaiveDate>>;

static HOLIDAY_CACHE: Lazy<Cache<u64, HolidaySet>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(1_000)
        .time_to_live(Duration::from_secs(600))
        .build()
});

async fn load_list(pool: &MySqlPool, holiday_list_id: u64) -> Result<HolidaySet, sqlx::Error> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT holiday_date FROM holidays WHERE holiday_list_id = ?",
    )
    .bind(holiday_list_id)
    .fetch_all(pool)
    .await?;
    Ok(Arc::new(dates.into_iter().collect()))
}

/// Every date of a holiday list.
pub async fn holiday_dates(pool: &MySqlPool, holiday_list_id: u64) -> Result<HolidaySet, sqlx::Error> {
    HOLIDAY_CACHE
        .try_get_with(holiday_list_id, load_list(pool, holiday_list_id))
        .await
        .map_err(|e| match Arc::try_unwrap(e) {
            Ok(err) => err,
            Err(shared) => sqlx::Error::Protocol(shared.to_string()),
        })
}

/// Holidays of an employee's list; employees without a list have none.
pub async fn for_list(pool: &MySqlPool, holiday_list_id: Option<u64>) -> Result<HolidaySet, sqlx::Error> {
    match holiday_list_id {
        Some(id) => holiday_dates(pool, id).await,
        None => Ok(Arc::default()),
    }
}

/// Loads every holiday list that active employees use.
pub async fn warmup_holiday_cache(pool: &MySqlPool) -> Result<()> {
    let mut stream = sqlx::query_scalar::<_, u64>(
        r#"
        SELECT DISTINCT holiday_list_id
        FROM employees
        WHERE status = 'Active' AND holiday_list_id IS NOT NULL
        "#,
    )
    .fetch(pool);

    let mut lists = Vec::new();
    while let Some(row) = stream.next().await {
        lists.push(row?);
    }

    let loads = lists.iter().map(|id| holiday_dates(pool, *id));
    for result in futures::future::join_all(loads).await {
        result?;
    }

    tracing::info!(lists = lists.len(), "Holiday cache warmup complete");
    Ok(())
}

/// Ids of the roster employees whose holiday list contains `date`.
pub async fn roster_on_holiday(
    pool: &MySqlPool,
    roster: &[RosterEntry],
    date: NaiveDate,
) -> Result<HashSet<u64>, sqlx::Error> {
    let mut off = HashSet::new();
    for entry in roster {
        if for_list(pool, entry.holiday_list_id).await?.contains(&date) {
            off.insert(entry.id);
        }
    }
    Ok(off)
}
