//! Mock database client for testing.
//!
//! Returns scripted row sets keyed by SQL text, so fetch and run logic can be
//! exercised without a live database.

use super::{Connector, DatabaseClient, RowSet};
use crate::error::{DrillError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scripted reply for one SQL text.
#[derive(Debug, Clone)]
enum Reply {
    Rows(Vec<RowSet>),
    Error(String),
}

/// A mock database client that returns predefined results.
#[derive(Debug, Clone, Default)]
pub struct MockDatabaseClient {
    replies: HashMap<String, Reply>,
    executed: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockDatabaseClient {
    /// Creates a mock client with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the row sets returned for `sql` (matched after trimming).
    pub fn with_result(mut self, sql: &str, sets: Vec<RowSet>) -> Self {
        self.replies
            .insert(sql.trim().to_string(), Reply::Rows(sets));
        self
    }

    /// Scripts a database error for `sql`.
    pub fn with_error(mut self, sql: &str, message: &str) -> Self {
        self.replies
            .insert(sql.trim().to_string(), Reply::Error(message.to_string()));
        self
    }

    /// How many scripts were executed through this client or its clones.
    pub fn executed_count(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    /// How many times this client or its clones were closed.
    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_script(&self, sql: &str) -> Result<Vec<RowSet>> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        match self.replies.get(sql.trim()) {
            Some(Reply::Rows(sets)) => Ok(sets.clone()),
            Some(Reply::Error(message)) => Err(DrillError::execution(message.clone())),
            None => Err(DrillError::execution(format!(
                "no mock result scripted for: {}",
                sql.trim()
            ))),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector that hands out clones of one mock client and counts sessions.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    client: MockDatabaseClient,
    opened: Arc<AtomicUsize>,
    refuse: Option<String>,
}

impl MockConnector {
    /// Creates a connector serving `client`.
    pub fn new(client: MockDatabaseClient) -> Self {
        Self {
            client,
            ..Default::default()
        }
    }

    /// Creates a connector whose every `open` fails with `message`.
    pub fn refusing(message: &str) -> Self {
        Self {
            refuse: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Number of sessions opened so far.
    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// The shared mock client, for inspecting execute and close counts.
    pub fn client(&self) -> &MockDatabaseClient {
        &self.client
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self) -> Result<Box<dyn DatabaseClient>> {
        if let Some(message) = &self.refuse {
            return Err(DrillError::connection(message.clone()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.client.clone()))
    }
}
