//! Read-only statement guard.
//!
//! Exercise files are run verbatim against a shared dataset, so every
//! statement is parsed with sqlparser-rs and anything that could modify data
//! is refused before it reaches the database.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

use crate::db::DatabaseBackend;
use crate::error::FetchError;

/// Parses scripts in the dialect of one backend and vets their statements.
pub struct ReadOnlyGuard {
    dialect: Box<dyn Dialect + Send + Sync>,
}

impl std::fmt::Debug for ReadOnlyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOnlyGuard").finish_non_exhaustive()
    }
}

impl ReadOnlyGuard {
    /// Creates a guard using the SQL dialect of `backend`.
    pub fn for_backend(backend: DatabaseBackend) -> Self {
        let dialect: Box<dyn Dialect + Send + Sync> = match backend {
            DatabaseBackend::Postgres => Box::new(PostgreSqlDialect {}),
            DatabaseBackend::MySql => Box::new(MySqlDialect {}),
        };
        Self { dialect }
    }

    /// Checks that every statement in `sql` only reads data.
    ///
    /// Returns the number of statements; zero means the script is empty or
    /// holds only comments.
    pub fn check(&self, sql: &str) -> Result<usize, FetchError> {
        let statements = Parser::parse_sql(self.dialect.as_ref(), sql)
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        for (i, statement) in statements.iter().enumerate() {
            if !is_read_only(statement) {
                return Err(FetchError::NotReadOnly {
                    index: i + 1,
                    kind: leading_keyword(statement),
                });
            }
        }

        Ok(statements.len())
    }
}

/// The statement's first keyword, e.g. `DELETE`.
fn leading_keyword(statement: &Statement) -> String {
    if let Statement::Query(query) = statement {
        if matches!(query.body.as_ref(), SetExpr::Select(select) if select.into.is_some()) {
            return "SELECT INTO".to_string();
        }
    }
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
}

fn is_read_only(statement: &Statement) -> bool {
    match statement {
        // Query: may contain data-modifying CTEs, so recurse
        Statement::Query(query) => query_is_read_only(query),
        // EXPLAIN ANALYZE executes the inner statement
        Statement::Explain {
            analyze, statement, ..
        } => !*analyze || is_read_only(statement),
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowCollation { .. } => true,
        _ => false,
    }
}

fn query_is_read_only(query: &Query) -> bool {
    let ctes_ok = query
        .with
        .as_ref()
        .map_or(true, |with| {
            with.cte_tables.iter().all(|cte| query_is_read_only(&cte.query))
        });

    ctes_ok && set_expr_is_read_only(&query.body)
}

fn set_expr_is_read_only(set_expr: &SetExpr) -> bool {
    match set_expr {
        SetExpr::Select(select) => select_is_read_only(select),
        SetExpr::Query(query) => query_is_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_is_read_only(left) && set_expr_is_read_only(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => true,
        // INSERT/UPDATE and friends wrapped in a CTE body
        _ => false,
    }
}

fn select_is_read_only(select: &Select) -> bool {
    // SELECT ... INTO creates a table
    select.into.is_none() && select.from.iter().all(table_with_joins_is_read_only)
}

fn table_with_joins_is_read_only(twj: &TableWithJoins) -> bool {
    table_factor_is_read_only(&twj.relation)
        && twj
            .joins
            .iter()
            .all(|join| table_factor_is_read_only(&join.relation))
}

fn table_factor_is_read_only(factor: &TableFactor) -> bool {
    match factor {
        TableFactor::Derived { subquery, .. } => query_is_read_only(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => table_with_joins_is_read_only(table_with_joins),
        _ => true,
    }
}
