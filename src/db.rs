//! Campaign database access.
//!
//! Thin wrapper around a SQLite connection. Query planning is left to SQLite;
//! this module only binds parameters and converts result cells to JSON.

use crate::models::Details;
use crate::{Error, Result};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags, ToSql};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Rows returned by a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    /// Column names in select order
    pub columns: Vec<String>,
    /// One JSON value per column, per row
    pub rows: Vec<Vec<Value>>,
}

impl QueryRows {
    /// Rows as objects keyed by column name.
    pub fn records(&self) -> Vec<Details> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Connection to the campaign database.
pub struct Database {
    path: PathBuf,
    conn: Connection,
}

impl Database {
    /// Open an existing database file and verify it answers queries.
    pub fn open(path: &Path) -> Result<Self> {
        let connection_error = |reason: String| Error::Connection {
            path: path.to_path_buf(),
            reason,
        };

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| connection_error(e.to_string()))?;

        let db = Self {
            path: path.to_path_buf(),
            conn,
        };
        db.ping().map_err(|e| connection_error(e.to_string()))?;

        tracing::debug!(path = %path.display(), "opened campaign database");
        Ok(db)
    }

    /// Path the database was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `SELECT 1` against the connection.
    pub fn ping(&self) -> Result<()> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Whether the connection currently answers queries.
    pub fn test_connection(&self) -> bool {
        match self.ping() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "database connection check failed");
                false
            }
        }
    }

    /// Execute one SQL statement with optional named parameters.
    ///
    /// Parameter keys may be given with or without the leading `:`.
    /// Statements that produce no columns return an empty [`QueryRows`].
    pub fn execute(&self, sql: &str, params: Option<&Details>) -> Result<QueryRows> {
        tracing::debug!(sql, "executing statement");

        let bound: Vec<(String, SqlValue)> = params
            .map(|map| {
                map.iter()
                    .map(|(key, value)| (parameter_name(key), to_sql_value(value)))
                    .collect()
            })
            .unwrap_or_default();
        let named: Vec<(&str, &dyn ToSql)> = bound
            .iter()
            .map(|(key, value)| (key.as_str(), value as &dyn ToSql))
            .collect();

        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        if columns.is_empty() {
            stmt.execute(named.as_slice())?;
            return Ok(QueryRows::default());
        }

        let mut result = QueryRows {
            columns,
            rows: Vec::new(),
        };
        let width = result.columns.len();
        let mut rows = stmt.query(named.as_slice())?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(to_json_value(row.get_ref(i)?));
            }
            result.rows.push(cells);
        }

        Ok(result)
    }

    /// Direct access for schema introspection.
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn parameter_name(key: &str) -> String {
    if key.starts_with([':', '@', '$']) {
        key.to_string()
    } else {
        format!(":{}", key)
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn to_json_value(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;
    use serde_json::json;

    #[test]
    fn test_open_missing_file_is_connection_error() {
        let env = TestEnv::new();
        let missing = env.path().join("nope.db");
        assert!(matches!(
            Database::open(&missing),
            Err(Error::Connection { .. })
        ));
        assert!(!missing.exists());
    }

    #[test]
    fn test_execute_returns_typed_cells() {
        let env = TestEnv::new();
        let db = env.campaign_db();

        let rows = db
            .execute(
                "SELECT id, name, budget, NULL AS note FROM campaigns WHERE id = :id",
                Some(&json!({"id": 5}).as_object().unwrap().clone()),
            )
            .unwrap();
        assert_eq!(rows.columns, ["id", "name", "budget", "note"]);
        assert_eq!(rows.rows, vec![vec![json!(5), json!("Spring Sale"), json!(1500.0), Value::Null]]);

        let records = rows.records();
        assert_eq!(records[0]["name"], "Spring Sale");
    }

    #[test]
    fn test_execute_statement_without_rows() {
        let env = TestEnv::new();
        let db = env.campaign_db();

        let result = db
            .execute("UPDATE campaigns SET budget = budget + 1 WHERE id = 1", None)
            .unwrap();
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_execute_reports_sql_errors() {
        let env = TestEnv::new();
        let db = env.campaign_db();
        assert!(matches!(
            db.execute("SELECT * FROM missing_table", None),
            Err(Error::Database(_))
        ));
        assert!(db.test_connection());
    }

    #[test]
    fn test_parameter_name_prefix() {
        assert_eq!(parameter_name("id"), ":id");
        assert_eq!(parameter_name(":id"), ":id");
        assert_eq!(parameter_name("@id"), "@id");
    }
}
