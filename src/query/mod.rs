//! Statement construction and execution for incident reports.
//!
//! This module owns the `Statement` type, the EXPLAIN/LIMIT modifiers, and the
//! two executors that scope a database session around a single statement.

pub mod executor;
pub mod modifiers;

pub use executor::{commit, select_all};
pub use modifiers::{apply_options, QueryOptions, EXPLAIN_PREFIX};

use std::fmt;

/// A SQL statement with its bound integer values.
///
/// Placeholders are written `$1..$n` and refer to `binds()` in order. The SQL
/// text never contains caller-supplied values; `render()` inlines them only
/// for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    binds: Vec<i64>,
}

impl Statement {
    /// Creates a statement with no bound values.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// Binds the next placeholder (`$1` for the first call, `$2` for the second, ...).
    pub fn bind(mut self, value: impl Into<i64>) -> Self {
        self.binds.push(value.into());
        self
    }

    /// Returns the SQL text with placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the bound values in placeholder order.
    pub fn binds(&self) -> &[i64] {
        &self.binds
    }

    /// Returns a copy with `prefix` placed before the SQL text.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.sql.insert_str(0, prefix);
        self
    }

    /// Returns a copy with `suffix` placed after the SQL text.
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.sql.push_str(suffix);
        self
    }

    /// Returns the SQL text with every known placeholder replaced by its value.
    pub fn render(&self) -> String {
        let mut rendered = String::with_capacity(self.sql.len());
        let mut chars = self.sql.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            if c != '$' {
                rendered.push(c);
                continue;
            }

            let mut end = start + 1;
            while let Some(&(i, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                end = i + 1;
                chars.next();
            }

            let value = self.sql[start + 1..end]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.binds.get(i));

            match value {
                Some(v) => rendered.push_str(&v.to_string()),
                None => rendered.push_str(&self.sql[start..end]),
            }
        }

        rendered
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
