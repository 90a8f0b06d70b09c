//! Read-only query operations over the shared pool

use std::collections::HashSet;
use std::sync::Arc;

use mcpchat_core::logging::Logger;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{Column, Executor, Statement, TypeInfo};

use crate::error::{GatewayError, GatewayResult};
use crate::pool::PoolManager;
use crate::settings::ConnectionSettings;
use crate::validate::{validate_identifier, validate_paging, validate_select, QualifiedName};

pub const DEFAULT_LIMIT: i64 = 100;
pub const DEFAULT_OFFSET: i64 = 0;

const LIST_TABLES_SQL: &str = "
    SELECT schemaname::text, tablename::text
    FROM pg_tables
    WHERE schemaname NOT IN ('pg_catalog', 'information_schema')
    ORDER BY schemaname, tablename";

const TABLE_SCHEMA_SQL: &str = "
    SELECT
        c.column_name::text,
        c.data_type::text,
        (c.is_nullable = 'YES') AS is_nullable,
        c.column_default::text,
        c.character_maximum_length::int4,
        EXISTS (
            SELECT 1
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON kcu.constraint_name = tc.constraint_name
             AND kcu.table_schema = tc.table_schema
             AND kcu.table_name = tc.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = c.table_schema
              AND tc.table_name = c.table_name
              AND kcu.column_name = c.column_name
        ) AS is_primary_key,
        (
            SELECT (ccu.table_schema || '.' || ccu.table_name || '.' || ccu.column_name)::text
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON kcu.constraint_name = tc.constraint_name
             AND kcu.table_schema = tc.table_schema
            JOIN information_schema.constraint_column_usage ccu
              ON ccu.constraint_name = tc.constraint_name
             AND ccu.constraint_schema = tc.table_schema
            WHERE tc.constraint_type = 'FOREIGN KEY'
              AND tc.table_schema = c.table_schema
              AND tc.table_name = c.table_name
              AND kcu.column_name = c.column_name
            LIMIT 1
        ) AS foreign_ref
    FROM information_schema.columns c
    WHERE c.table_schema = $1 AND c.table_name = $2
    ORDER BY c.ordinal_position";

/// A user table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

/// Name and database type of a result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Rows of a query, each holding exactly the declared columns in order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Map<String, Value>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Build rows from `to_json` output keyed by positional aliases
    ///
    /// Row objects carry `c0`, `c1`, ... as written by [`wrap_select`]; each
    /// is mapped back to the column at that position.
    fn from_json_rows(columns: Vec<ColumnMeta>, texts: Vec<String>) -> GatewayResult<Self> {
        let rows = texts
            .iter()
            .map(|text| {
                let mut object = match serde_json::from_str::<Value>(text) {
                    Ok(Value::Object(object)) => object,
                    Ok(other) => return Err(GatewayError::Decode(format!("expected a row object, got {}", other))),
                    Err(e) => return Err(GatewayError::Decode(e.to_string())),
                };
                Ok(columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (c.name.clone(), object.remove(&alias(i)).unwrap_or(Value::Null)))
                    .collect())
            })
            .collect::<GatewayResult<Vec<_>>>()?;

        Ok(Self { columns, rows })
    }
}

fn alias(position: usize) -> String {
    format!("c{}", position)
}

/// Wrap `inner` so each row comes back as one JSON object.
///
/// Output columns are renamed positionally, so repeated or unnamed columns
/// (`SELECT 1, 1`) stay distinct. `inner` sits on its own lines so a
/// trailing `--` comment cannot swallow the closing parenthesis.
fn wrap_select(inner: &str, column_count: usize) -> String {
    let aliases = if column_count == 0 {
        String::new()
    } else {
        let list: Vec<String> = (0..column_count).map(alias).collect();
        format!("({})", list.join(", "))
    };
    format!("SELECT to_json(q)::text FROM (\n{}\n) AS q{}", inner, aliases)
}

/// Suffix repeated column names (`id`, `id_2`, ...) so every row key is unique
fn unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let mut candidate = name.to_string();
            let mut n = 2;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{}_{}", name, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

/// One column of a table's schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub max_length: Option<i32>,
    pub is_primary_key: bool,
    /// `schema.table.column` this column references
    pub foreign_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: QualifiedName,
    pub columns: Vec<ColumnInfo>,
}

/// Result of [`QueryGateway::connect`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub server_version: String,
    /// Target without credentials
    pub host: String,
}

type SchemaRow = (String, String, bool, Option<String>, Option<i32>, bool, Option<String>);

/// Safe, read-only access to the database
///
/// Every operation validates its input before it touches the pool.
pub struct QueryGateway {
    pool: Arc<PoolManager>,
    logger: Arc<dyn Logger>,
}

impl QueryGateway {
    pub fn new(pool: Arc<PoolManager>, logger: Arc<dyn Logger>) -> Self {
        Self { pool, logger }
    }

    pub fn pool_manager(&self) -> &Arc<PoolManager> {
        &self.pool
    }

    /// Create the pool if needed and report the server version
    pub async fn connect(&self) -> GatewayResult<ConnectionReport> {
        let pool = self.pool.pool().await?;
        let server_version: String = sqlx::query_scalar("SELECT version()").fetch_one(&pool).await?;
        let host = self.pool.settings().await.target.host_part();

        self.logger.info(&format!("[QueryGateway] Connected to {}", host));
        Ok(ConnectionReport { server_version, host })
    }

    /// Switch the pool to `settings` when they differ, then connect.
    ///
    /// A failed switch keeps the current pool and settings.
    pub async fn connect_with(&self, settings: ConnectionSettings) -> GatewayResult<ConnectionReport> {
        if settings != self.pool.settings().await {
            self.logger.info(&format!(
                "[QueryGateway] Connection settings changed, reconnecting to {}",
                settings.target.redacted()
            ));
            self.pool.reconnect(Some(settings)).await?;
        }
        self.connect().await
    }

    /// Tables outside the system schemas, ordered by schema then name
    pub async fn list_tables(&self) -> GatewayResult<Vec<TableRef>> {
        let pool = self.pool.pool().await?;
        let rows: Vec<(String, String)> = sqlx::query_as(LIST_TABLES_SQL).fetch_all(&pool).await?;

        self.logger.debug(&format!("[QueryGateway] Listed {} tables", rows.len()));
        Ok(rows
            .into_iter()
            .map(|(schema, table)| TableRef { schema, table })
            .collect())
    }

    /// Page through a table; `limit` defaults to 100, `offset` to 0
    pub async fn query_table(
        &self,
        table_name: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> GatewayResult<QueryResult> {
        let name = validate_identifier(table_name)?;
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let offset = offset.unwrap_or(DEFAULT_OFFSET);
        validate_paging(limit, offset)?;

        self.logger.info(&format!(
            "[QueryGateway] query_table {} limit={} offset={}",
            name, limit, offset
        ));

        let inner = format!("SELECT * FROM {}", name.as_sql());
        self.run_select(&inner, Some((limit, offset))).await
    }

    /// Run a caller-supplied SELECT
    pub async fn execute_query(&self, sql: &str) -> GatewayResult<QueryResult> {
        let statement = validate_select(sql)?;
        self.logger.info("[QueryGateway] execute_query");
        self.run_select(statement, None).await
    }

    /// Column layout of a table, with key membership
    pub async fn get_table_schema(&self, table_name: &str) -> GatewayResult<TableSchema> {
        let name = validate_identifier(table_name)?;
        let pool = self.pool.pool().await?;

        let rows: Vec<SchemaRow> = sqlx::query_as(TABLE_SCHEMA_SQL)
            .bind(name.schema())
            .bind(name.table())
            .fetch_all(&pool)
            .await?;

        if rows.is_empty() {
            return Err(GatewayError::NotFound(format!(
                "Could not find schema for table {}.{}",
                name.schema(),
                name.table()
            )));
        }

        let columns = rows
            .into_iter()
            .map(
                |(name, data_type, is_nullable, default, max_length, is_primary_key, foreign_key)| ColumnInfo {
                    name,
                    data_type,
                    is_nullable,
                    default,
                    max_length,
                    is_primary_key,
                    foreign_key,
                },
            )
            .collect();

        Ok(TableSchema { name, columns })
    }

    /// Describe `inner`'s columns, then fetch its rows as JSON on the same connection
    async fn run_select(&self, inner: &str, paging: Option<(i64, i64)>) -> GatewayResult<QueryResult> {
        let pool = self.pool.pool().await?;
        let mut conn = pool.acquire().await?;

        let columns: Vec<ColumnMeta> = {
            let statement = (&mut *conn).prepare(inner).await?;
            let names = unique_names(statement.columns().iter().map(|c| c.name()));
            statement
                .columns()
                .iter()
                .zip(names)
                .map(|(c, name)| ColumnMeta {
                    name,
                    type_name: c.type_info().name().to_string(),
                })
                .collect()
        };

        let wrapped = wrap_select(inner, columns.len());
        let texts: Vec<String> = match paging {
            Some((limit, offset)) => {
                let sql = format!("{} LIMIT $1 OFFSET $2", wrapped);
                sqlx::query_scalar(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&mut *conn)
                    .await?
            }
            None => sqlx::query_scalar(&wrapped).fetch_all(&mut *conn).await?,
        };

        let result = QueryResult::from_json_rows(columns, texts)?;
        self.logger.debug(&format!(
            "[QueryGateway] {} rows, {} columns",
            result.row_count(),
            result.columns.len()
        ));
        Ok(result)
    }
}
