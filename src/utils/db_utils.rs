use serde_json::Value;
use chrono::{NaiveDate, NaiveDateTime};
use actix_web::error::ErrorBadRequest;
use sqlx::MySqlPool;


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


/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// `payload` is a typed update struct serialised to JSON, so its keys are
/// the struct's field names and never user input. Absent fields must be
/// skipped during serialisation; what remains is written.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    // Build SET clause
    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table, set_clause, id_column
    );

    let mut values = Vec::with_capacity(obj.len() + 1);

    // Convert JSON values → SqlValue
    for value in obj.values() {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) =
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    values.push(SqlValue::U64(u));
                } else if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(ErrorBadRequest("Unsupported JSON value type")),
        }
    }

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}


/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(
    pool: &MySqlPool,
    update: SqlUpdate,
) -> Result<u64, sqlx::Error> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_set_clause_with_trailing_id() {
        let update = build_update_sql(
            "employees",
            &json!({ "department_id": 3, "first_name": "Ada" }),
            "id",
            9,
        )
        .unwrap();

        assert_eq!(
            update.sql,
            "UPDATE employees SET department_id = ?, first_name = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::U64(3),
                SqlValue::String("Ada".into()),
                SqlValue::U64(9)
            ]
        );
    }

    #[test]
    fn dates_and_datetimes_are_typed() {
        let update = build_update_sql(
            "employees",
            &json!({ "joined": "2024-01-01T09:00:00", "photo": null }),
            "id",
            1,
        )
        .unwrap();

        let joined = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(update.values[0], SqlValue::DateTime(joined));
        assert_eq!(update.values[1], SqlValue::Null);
    }

    #[test]
    fn empty_or_non_object_payload_is_rejected() {
        assert!(build_update_sql("departments", &json!({}), "id", 1).is_err());
        assert!(build_update_sql("departments", &json!([1, 2]), "id", 1).is_err());
    }
}
