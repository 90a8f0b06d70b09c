//! Markdown rendering of catalog results

use crate::client::{CatalogTable, LookupFailure, TableLookup};

/// Descriptions longer than this are cut in table listings
pub const DESCRIPTION_LIMIT: usize = 100;
/// Columns shown in table details
pub const COLUMN_PREVIEW: usize = 10;

const NO_DESCRIPTION: &str = "No description";

/// Description with HTML tags removed and whitespace collapsed
pub fn clean_description(raw: Option<&str>) -> String {
    let text = strip_tags(raw.unwrap_or_default());
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        text
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut)
}

fn short_id(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    format!("{}...", prefix)
}

pub fn render_environment(vars: &[(String, String)]) -> String {
    let mut out = String::from("**OpenMetadata environment:**\n");
    for (name, value) in vars {
        out.push_str(&format!("- `{}`: {}\n", name, value));
    }
    out
}

pub fn render_connection(host: &str, version: &str) -> String {
    format!(
        "**OpenMetadata connection successful.**\n\n- Host: {}\n- Server version: {}\n\nTry `list_om_tables` to browse the catalog.",
        host, version
    )
}

pub fn render_tables(tables: &[CatalogTable]) -> String {
    if tables.is_empty() {
        return "No tables found in the OpenMetadata catalog.".to_string();
    }

    let mut out = format!("**Found {} tables in the OpenMetadata catalog:**\n", tables.len());
    for table in tables {
        out.push_str(&format!(
            "\n**{}**\n- Full path: `{}`\n- Description: {}\n- ID: `{}`\n",
            table.name,
            table.fully_qualified_name,
            truncate(&clean_description(table.description.as_deref()), DESCRIPTION_LIMIT),
            short_id(&table.id)
        ));
    }
    out
}

pub fn render_table(lookup: &TableLookup) -> String {
    let table = &lookup.table;
    let mut out = format!(
        "**Table details: {}**\n\n- Full name: `{}`\n- ID: `{}`\n- Description: {}\n- Retrieved via: {}\n\n",
        table.name,
        table.fully_qualified_name,
        short_id(&table.id),
        clean_description(table.description.as_deref()),
        lookup.method
    );

    if table.columns.is_empty() {
        out.push_str("No column information available.\n");
    } else {
        let shown = table.columns.len().min(COLUMN_PREVIEW);
        out.push_str(&format!(
            "**Columns ({} total, showing first {}):**\n",
            table.columns.len(),
            shown
        ));
        for column in &table.columns[..shown] {
            out.push_str(&format!("- **{}** ({})", column.name, column.data_type));
            if let Some(description) = column.description.as_deref().filter(|d| !d.trim().is_empty()) {
                out.push_str(&format!(" - {}", clean_description(Some(description))));
            }
            out.push('\n');
        }
        if table.columns.len() > shown {
            out.push_str(&format!("... and {} more columns\n", table.columns.len() - shown));
        }
    }

    out.push_str(&format!("\nAttempts: {}", lookup.attempts.join(", ")));
    out
}

pub fn render_lookup_failure(table_name: &str, failure: &LookupFailure) -> String {
    format!(
        "Failed to get table `{}`: {}\n\nAttempts: {}",
        table_name,
        failure.error,
        failure.attempts.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CatalogColumn;
    use crate::error::CatalogError;

    fn table(columns: usize) -> CatalogTable {
        CatalogTable {
            id: "5f0c1d2e-aaaa-bbbb-cccc-1234567890ab".into(),
            name: "orders".into(),
            fully_qualified_name: "warehouse.shop.public.orders".into(),
            description: Some("<p>All <b>orders</b>, one row each.</p>".into()),
            columns: (0..columns)
                .map(|i| CatalogColumn {
                    name: format!("col_{}", i),
                    data_type: "INT".into(),
                    description: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(
            clean_description(Some("<p>All <b>orders</b>, one row each.</p>")),
            "All orders , one row each."
        );
        assert_eq!(clean_description(Some("<p></p>")), "No description");
        assert_eq!(clean_description(None), "No description");
        assert_eq!(clean_description(Some("a < b")), "a");
    }

    #[test]
    fn test_listing_truncates_long_descriptions() {
        let mut long = table(0);
        long.description = Some("x".repeat(150));
        let out = render_tables(&[long]);
        assert!(out.contains(&format!("Description: {}...", "x".repeat(100))));
        assert!(!out.contains(&"x".repeat(101)));
        assert!(out.contains("ID: `5f0c1d2e...`"));
        assert!(out.starts_with("**Found 1 tables"));
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(render_tables(&[]), "No tables found in the OpenMetadata catalog.");
    }

    #[test]
    fn test_details_show_first_ten_columns() {
        let lookup = TableLookup {
            table: table(12),
            method: "name (orders)".into(),
            attempts: vec!["name orders - found".into()],
        };
        let out = render_table(&lookup);
        assert!(out.contains("**Columns (12 total, showing first 10):**"));
        assert!(out.contains("- **col_9** (INT)\n"));
        assert!(!out.contains("col_10"));
        assert!(out.contains("... and 2 more columns"));
        assert!(out.ends_with("Attempts: name orders - found"));
    }

    #[test]
    fn test_details_without_columns() {
        let lookup = TableLookup {
            table: table(0),
            method: "id".into(),
            attempts: vec![],
        };
        assert!(render_table(&lookup).contains("No column information available."));
    }

    #[test]
    fn test_lookup_failure_lists_attempts() {
        let failure = LookupFailure {
            attempts: vec!["name x - not found".into(), "id x - not found".into()],
            error: CatalogError::NotFound("table x".into()),
        };
        assert_eq!(
            render_lookup_failure("x", &failure),
            "Failed to get table `x`: Not found: table x\n\nAttempts: name x - not found, id x - not found"
        );
    }
}
