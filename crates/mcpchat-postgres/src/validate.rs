//! Input checks applied before any SQL is built
//!
//! Both checks are allow-list guards, not parsers.

use std::fmt;

use crate::error::{GatewayError, GatewayResult};

/// Schema used when a table name has no schema part
pub const DEFAULT_SCHEMA: &str = "public";

/// A validated `schema.table` or bare `table` name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    schema: Option<String>,
    table: String,
}

impl QualifiedName {
    /// Schema part, `public` when none was given
    pub fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The name as written, for interpolation into SQL
    pub fn as_sql(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// Accept only ASCII letters, digits, `_` and at most one `.`
pub fn validate_identifier(name: &str) -> GatewayResult<QualifiedName> {
    if name.is_empty() {
        return Err(GatewayError::validation("Invalid table name: empty"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_') {
        return Err(GatewayError::validation(format!("Invalid table name: {}", name)));
    }

    let parts: Vec<&str> = name.split('.').collect();
    match parts.as_slice() {
        [table] => Ok(QualifiedName {
            schema: None,
            table: table.to_string(),
        }),
        [schema, table] if !schema.is_empty() && !table.is_empty() => Ok(QualifiedName {
            schema: Some(schema.to_string()),
            table: table.to_string(),
        }),
        _ => Err(GatewayError::validation(format!("Invalid table name: {}", name))),
    }
}

/// Accept text that starts with `SELECT` (trimmed, any case).
///
/// Returns the statement with surrounding whitespace and trailing `;` removed.
pub fn validate_select(sql: &str) -> GatewayResult<&str> {
    let trimmed = sql.trim();
    if !trimmed.to_uppercase().starts_with("SELECT") {
        return Err(GatewayError::validation("Only SELECT statements are allowed"));
    }
    Ok(trimmed.trim_end_matches(|c: char| c == ';' || c.is_whitespace()))
}

/// Reject negative paging values
pub fn validate_paging(limit: i64, offset: i64) -> GatewayResult<()> {
    if limit < 0 {
        return Err(GatewayError::validation(format!("limit must not be negative, got {}", limit)));
    }
    if offset < 0 {
        return Err(GatewayError::validation(format!("offset must not be negative, got {}", offset)));
    }
    Ok(())
}
