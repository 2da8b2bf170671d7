//! Optional EXPLAIN and LIMIT modifiers applied to report statements.

use super::Statement;

/// Prefix added when a caller asks for the execution plan.
pub const EXPLAIN_PREFIX: &str = "EXPLAIN ANALYZE VERBOSE ";

/// Modifiers a caller may request on any report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Return the analyzed execution plan instead of the report rows.
    pub explain: bool,

    /// Maximum number of rows to return.
    pub limit: Option<u64>,
}

impl QueryOptions {
    pub fn with_explain(mut self) -> Self {
        self.explain = true;
        self
    }

    pub fn with_limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }
}

/// Applies `options` to `statement`.
///
/// The explain prefix goes first and the limit suffix last; each is applied
/// independently and with neither set the statement comes back unchanged.
pub fn apply_options(statement: Statement, options: &QueryOptions) -> Statement {
    let statement = if options.explain {
        statement.with_prefix(EXPLAIN_PREFIX)
    } else {
        statement
    };

    match options.limit {
        Some(n) => statement.with_suffix(&format!(" LIMIT {n}")),
        None => statement,
    }
}
