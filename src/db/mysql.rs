//! MySQL database client implementation.
//!
//! The Sakila dataset ships for MySQL first, so this backend mirrors
//! `PostgresClient` over sqlx's MySQL driver.

use crate::config::ConnectionConfig;
use crate::db::{collect_row_sets, DatabaseClient, Row, RowSet, Value};
use crate::error::{DrillError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::time::Duration;
use tracing::debug;

/// How long to wait for the session's connection.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// MySQL session: a pool holding a single connection.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    /// Opens a session. Connection failures are not retried.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Opened MySQL session to {}", config.display_string());
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn execute_script(&self, sql: &str) -> Result<Vec<RowSet>> {
        // Text protocol: multi-statement scripts are allowed and values arrive as text.
        let stream = sqlx::raw_sql(sql).fetch_many(&self.pool);

        collect_row_sets::<MySql, _>(stream, convert_row)
            .await
            .map_err(|e| DrillError::execution(format_query_error(e)))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        debug!("Closed MySQL session");
        Ok(())
    }
}

/// Converts a sqlx MySqlRow to our Row type.
///
/// Text-protocol values are raw bytes; BLOB columns that are not UTF-8 stay bytes.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| {
            match row.try_get_unchecked::<Option<Vec<u8>>, _>(i).ok().flatten() {
                None => Value::Null,
                Some(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => Value::from_text(col.type_info().name(), text),
                    Err(e) => Value::Bytes(e.into_bytes()),
                },
            }
        })
        .collect()
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> DrillError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.effective_port();
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        DrillError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("access denied") {
        DrillError::connection(format!(
            "Access denied for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("unknown database") {
        DrillError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        DrillError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        DrillError::connection(error.to_string())
    }
}

/// Formats a query error, keeping MySQL's error code.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => match db_error.code() {
            Some(code) => format!("ERROR {code}: {}", db_error.message()),
            None => format!("ERROR: {}", db_error.message()),
        },
        None => error.to_string(),
    }
}
