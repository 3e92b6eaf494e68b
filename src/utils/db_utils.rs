use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

use crate::error::{ApiError, ApiResult};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

fn to_sql_value(value: &Value) -> ApiResult<SqlValue> {
    Ok(match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                SqlValue::Date(d)
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                SqlValue::DateTime(dt)
            } else {
                SqlValue::String(s.clone())
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::I64(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::F64(f)
            } else {
                return Err(ApiError::bad_request("Unsupported number"));
            }
        }
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        _ => return Err(ApiError::bad_request("Unsupported JSON value type")),
    })
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only keys listed in `allowed` may be set; anything else is a 400, so the
/// payload can never name an arbitrary column.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> ApiResult<SqlUpdate> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::bad_request("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ApiError::bad_request("No fields provided for update"));
    }

    if let Some(bad) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ApiError::bad_request(format!("Field '{bad}' cannot be updated")));
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);
    for value in obj.values() {
        values.push(to_sql_value(value)?);
    }

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// `?, ?, ?` for an `IN (...)` list of `n` items.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Page, page size and row offset for a paginated list. `per_page` defaults to
/// 20 and is clamped to 1..=100; pages whose offset would not fit a signed
/// 64-bit value are rejected.
pub fn page_window(page: Option<u64>, per_page: Option<u64>) -> ApiResult<(u64, u64, u64)> {
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    let offset = (page - 1)
        .checked_mul(per_page)
        .filter(|o| *o <= i64::MAX as u64)
        .ok_or_else(|| ApiError::bad_request(format!("page {page} is out of range")))?;
    Ok((page, per_page, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_window_clamps_and_offsets() {
        assert_eq!(page_window(None, None).unwrap(), (1, 20, 0));
        assert_eq!(page_window(Some(0), Some(1000)).unwrap(), (1, 100, 0));
        assert_eq!(page_window(Some(3), Some(25)).unwrap(), (3, 25, 50));
    }

    #[test]
    fn huge_page_is_a_bad_request() {
        assert!(matches!(page_window(Some(u64::MAX), Some(20)), Err(ApiError::BadRequest(_))));
        assert!(matches!(page_window(Some(u64::MAX / 2), Some(100)), Err(ApiError::BadRequest(_))));
    }

    const COLUMNS: &[&str] = &["employee_name", "designation", "wfh_eligible"];

    #[test]
    fn builds_set_clause_in_key_order() {
        let payload = json!({"designation": "Lead", "wfh_eligible": true});
        let update = build_update_sql("employees", &payload, COLUMNS, "id", 9).unwrap();
        assert_eq!(
            update.sql,
            "UPDATE employees SET designation = ?, wfh_eligible = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Lead".into()),
                SqlValue::Bool(true),
                SqlValue::U64(9)
            ]
        );
    }

    #[test]
    fn rejects_columns_outside_whitelist() {
        let payload = json!({"id": 1});
        assert!(matches!(
            build_update_sql("employees", &payload, COLUMNS, "id", 9),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("employees", &json!({}), COLUMNS, "id", 1).is_err());
        assert!(build_update_sql("employees", &json!([1]), COLUMNS, "id", 1).is_err());
    }

    #[test]
    fn placeholder_list() {
        assert_eq!(placeholders(3), "?, ?, ?");
        assert_eq!(placeholders(1), "?");
    }
}
