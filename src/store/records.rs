use crate::error::FolioError;
use crate::store::schema::SQLITE_INIT;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Pool, Row, Sqlite, TypeInfo, ValueRef};

pub type SqlitePool = Pool<Sqlite>;

/// A row from a runtime-named table, keyed by column name.
pub type JsonRecord = Map<String, Value>;

/// CRUD executor over tables whose names are request parameters.
///
/// Table and column identifiers never reach the SQL text unescaped: every
/// identifier passes `quote_ident`, every value goes through a placeholder.
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), FolioError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert one record. Awaited to completion before the caller may
    /// report success.
    pub async fn create(&self, table: &str, fields: &[(&str, String)]) -> Result<(), FolioError> {
        let table_ident = quote_ident(table)?;
        if fields.is_empty() {
            return Err(FolioError::BadRequest("no fields to insert".to_string()));
        }

        let mut columns = Vec::with_capacity(fields.len());
        for (name, _) in fields {
            columns.push(quote_ident(name)?);
        }
        let placeholders = vec!["?"; fields.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table_ident,
            columns.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in fields {
            query = query.bind(value);
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    /// Full scan of `table`.
    pub async fn list(&self, table: &str) -> Result<Vec<JsonRecord>, FolioError> {
        let table_ident = quote_ident(table)?;
        let sql = format!("SELECT * FROM {table_ident}");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_json).collect()
    }

    /// Fetch one record by id.
    pub async fn get(&self, table: &str, id: i64) -> Result<JsonRecord, FolioError> {
        let table_ident = quote_ident(table)?;
        let sql = format!("SELECT * FROM {table_ident} WHERE id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => row_to_json(row),
            None => Err(FolioError::NotFound(format!("No record found with id {id}"))),
        }
    }

    /// Update the record matching `id`. Zero affected rows means the id did
    /// not match and is reported as not-found, not as a database error.
    pub async fn update(
        &self,
        table: &str,
        fields: &[(&str, String)],
        id: i64,
    ) -> Result<(), FolioError> {
        let table_ident = quote_ident(table)?;
        if fields.is_empty() {
            return Err(FolioError::BadRequest("no fields to update".to_string()));
        }

        let mut assignments = Vec::with_capacity(fields.len());
        for (name, _) in fields {
            assignments.push(format!("{} = ?", quote_ident(name)?));
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            table_ident,
            assignments.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in fields {
            query = query.bind(value);
        }
        let result = query.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(FolioError::NotFound(format!("No record found with id {id}")));
        }
        Ok(())
    }

    /// Delete the record matching `id`.
    pub async fn delete(&self, table: &str, id: i64) -> Result<(), FolioError> {
        let table_ident = quote_ident(table)?;
        let sql = format!("DELETE FROM {table_ident} WHERE id = ?");
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }
}

/// Escape a runtime-supplied identifier for inclusion in SQL text.
///
/// Identifiers are restricted to `[A-Za-z0-9_]` and then double-quoted, so
/// a hostile table or column name can neither terminate the quoting nor
/// smuggle in further statements.
fn quote_ident(name: &str) -> Result<String, FolioError> {
    if name.is_empty() {
        return Err(FolioError::BadRequest("table name is required".to_string()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(FolioError::BadRequest(format!(
            "invalid identifier: {name}"
        )));
    }
    Ok(format!("\"{name}\""))
}

fn row_to_json(row: SqliteRow) -> Result<JsonRecord, FolioError> {
    let mut record = Map::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => Value::from(row.try_get::<i64, _>(idx)?),
                "REAL" => Value::from(row.try_get::<f64, _>(idx)?),
                // Binary columns have no JSON rendering the API needs.
                "BLOB" => Value::Null,
                _ => Value::from(row.try_get::<String, _>(idx)?),
            }
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}
