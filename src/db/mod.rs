//! Database abstraction layer for db-drill.
//!
//! Provides a trait-based interface for running exercise scripts, allowing
//! different database backends to be used interchangeably.

mod mock;
mod mysql;
mod postgres;
mod types;

pub use mock::{MockConnector, MockDatabaseClient};
pub use mysql::MySqlClient;
pub use postgres::PostgresClient;
pub use types::{ColumnInfo, Row, RowRef, RowSet, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use sqlx::{Column as SqlxColumn, Either, Row as SqlxRow, TypeInfo};
use std::time::Instant;
use tracing::debug;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    #[serde(alias = "mariadb")]
    MySql,
}

/// Environment variable names a backend's client tools read.
#[derive(Debug, Clone, Copy)]
pub struct EnvVars {
    pub host: &'static str,
    pub port: &'static str,
    pub database: &'static str,
    pub user: &'static str,
    pub password: &'static str,
}

impl DatabaseBackend {
    /// Returns the backend as a string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
        }
    }

    /// Parses a backend from a string or URL scheme.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            _ => None,
        }
    }

    /// Returns the default port for this backend.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::MySql => 3306,
        }
    }

    /// Returns the URL scheme for this backend.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
        }
    }

    /// Returns the environment variables used as connection defaults.
    pub fn env_vars(&self) -> EnvVars {
        match self {
            Self::Postgres => EnvVars {
                host: "PGHOST",
                port: "PGPORT",
                database: "PGDATABASE",
                user: "PGUSER",
                password: "PGPASSWORD",
            },
            Self::MySql => EnvVars {
                host: "MYSQL_HOST",
                port: "MYSQL_TCP_PORT",
                database: "MYSQL_DATABASE",
                user: "MYSQL_USER",
                password: "MYSQL_PWD",
            },
        }
    }
}

/// Opens a session for the given backend and configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::MySql => {
            let client = MySqlClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for database sessions.
///
/// All database operations are async and return Results with DrillError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes `sql` as-is and returns one row set per statement, in order.
    async fn execute_script(&self, sql: &str) -> Result<Vec<RowSet>>;

    /// Closes the session.
    async fn close(&self) -> Result<()>;
}

/// Hands out a fresh session per exercise.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new session.
    async fn open(&self) -> Result<Box<dyn DatabaseClient>>;
}

/// Connector that opens real sessions from a connection config.
#[derive(Debug, Clone)]
pub struct ConfigConnector {
    config: ConnectionConfig,
}

impl ConfigConnector {
    /// Creates a connector for the given configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for ConfigConnector {
    async fn open(&self) -> Result<Box<dyn DatabaseClient>> {
        connect(&self.config).await
    }
}

/// Splits a multi-statement result stream into one row set per statement.
///
/// Each statement's rows arrive first, followed by its completion marker.
/// `convert` turns a driver row into values; column metadata comes from the
/// first row, so a statement with no rows yields a row set with no columns.
pub(crate) async fn collect_row_sets<DB, F>(
    mut stream: BoxStream<'_, std::result::Result<Either<DB::QueryResult, DB::Row>, sqlx::Error>>,
    convert: F,
) -> std::result::Result<Vec<RowSet>, sqlx::Error>
where
    DB: sqlx::Database,
    F: Fn(&DB::Row) -> Row,
{
    let mut sets = Vec::new();
    let mut current = RowSet::new();
    let mut start = Instant::now();

    while let Some(item) = stream.try_next().await? {
        match item {
            Either::Left(_done) => {
                let finished = std::mem::take(&mut current).with_execution_time(start.elapsed());
                debug!(
                    "Statement {} returned {} rows",
                    sets.len() + 1,
                    finished.len()
                );
                sets.push(finished);
                start = Instant::now();
            }
            Either::Right(row) => {
                if current.columns.is_empty() {
                    current.columns = row
                        .columns()
                        .iter()
                        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                        .collect();
                }
                current.rows.push(convert(&row));
            }
        }
    }

    // Rows with no trailing completion marker still belong to a statement.
    if !current.rows.is_empty() {
        sets.push(current.with_execution_time(start.elapsed()));
    }

    Ok(sets)
}
