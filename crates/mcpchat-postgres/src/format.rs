//! Markdown rendering of gateway results

use serde_json::Value;

use crate::gateway::{ConnectionReport, QueryResult, TableRef, TableSchema};

/// Tables grouped under one heading per schema
pub fn render_tables(tables: &[TableRef]) -> String {
    if tables.is_empty() {
        return "No tables found.".to_string();
    }

    let mut out = format!("**Found {} tables:**\n", tables.len());
    let mut current: Option<&str> = None;
    for table in tables {
        if current != Some(table.schema.as_str()) {
            out.push_str(&format!("\n**Schema: `{}`**\n", table.schema));
            current = Some(table.schema.as_str());
        }
        out.push_str(&format!("- `{}`\n", table.table));
    }
    out
}

/// Query rows as a Markdown table under `title`
pub fn render_query_result(title: &str, result: &QueryResult) -> String {
    if result.is_empty() {
        return format!("{}\n\nQuery returned no rows.", title);
    }

    let headers: Vec<String> = result.columns.iter().map(|c| escape(&c.name)).collect();
    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.values().map(render_value).collect())
        .collect();

    format!(
        "{}\n\n{}\n\n({} rows)",
        title,
        markdown_table(&headers, &rows),
        result.row_count()
    )
}

pub fn render_schema(schema: &TableSchema) -> String {
    let headers: Vec<String> = ["column", "type", "nullable", "default", "max_length", "key"]
        .iter()
        .map(|h| h.to_string())
        .collect();

    let rows: Vec<Vec<String>> = schema
        .columns
        .iter()
        .map(|c| {
            let key = match (c.is_primary_key, c.foreign_key.as_deref()) {
                (true, Some(target)) => format!("PK, FK → {}", target),
                (true, None) => "PK".to_string(),
                (false, Some(target)) => format!("FK → {}", target),
                (false, None) => String::new(),
            };
            vec![
                escape(&c.name),
                escape(&c.data_type),
                if c.is_nullable { "YES" } else { "NO" }.to_string(),
                c.default.as_deref().map(escape).unwrap_or_else(|| "NULL".to_string()),
                c.max_length.map(|n| n.to_string()).unwrap_or_else(|| "NULL".to_string()),
                escape(&key),
            ]
        })
        .collect();

    format!("**Schema for `{}`:**\n\n{}", schema.name, markdown_table(&headers, &rows))
}

pub fn render_connection(report: &ConnectionReport) -> String {
    format!(
        "**PostgreSQL connection successful**\n\nConnected to: `{}`\nServer version: {}",
        report.host, report.server_version
    )
}

/// Output of `describe_environment`
pub fn render_environment(vars: &[(String, Option<String>)]) -> String {
    let mut out = String::from("**PostgreSQL environment:**\n");
    for (name, value) in vars {
        match value {
            Some(value) => out.push_str(&format!("- `{}` is set: `{}`\n", name, value)),
            None => out.push_str(&format!("- `{}` is not set\n", name)),
        }
    }
    out
}

fn markdown_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("| {} |", headers.join(" | ")));
    lines.push(format!("| {} |", vec!["---"; headers.len()].join(" | ")));
    for row in rows {
        lines.push(format!("| {} |", row.join(" | ")));
    }
    lines.join("\n")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => escape(s),
        other => escape(&other.to_string()),
    }
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
