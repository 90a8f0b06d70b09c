//! Tests against a real server
//!
//! Skipped unless `TEST_DATABASE_URL` points at a database the test may
//! create tables in.

use std::sync::Arc;

use mcpchat_core::logging::{Logger, NoOpLogger};
use mcpchat_postgres::{ConnectionSettings, PoolManager, QueryGateway};

fn live_gateway() -> Option<QueryGateway> {
    let url = std::env::var("TEST_DATABASE_URL").ok().filter(|u| !u.is_empty())?;
    let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
    let pool = Arc::new(PoolManager::new(ConnectionSettings::from_url(url), logger.clone()));
    Some(QueryGateway::new(pool, logger))
}

#[tokio::test]
async fn test_limit_larger_than_table() {
    let Some(gateway) = live_gateway() else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let pool = gateway.pool_manager().pool().await.unwrap();
    sqlx::query("DROP TABLE IF EXISTS mcpchat_live_items").execute(&pool).await.unwrap();
    sqlx::query("CREATE TABLE mcpchat_live_items (id INT PRIMARY KEY, label TEXT)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO mcpchat_live_items VALUES (1, 'a'), (2, 'b'), (3, NULL)")
        .execute(&pool)
        .await
        .unwrap();

    let result = gateway.query_table("public.mcpchat_live_items", Some(5), None).await.unwrap();
    assert_eq!(result.row_count(), 3);
    assert_eq!(result.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["id", "label"]);
    assert!(result.rows.iter().any(|r| r["label"].is_null()));

    let page = gateway.query_table("mcpchat_live_items", Some(1), Some(2)).await.unwrap();
    assert_eq!(page.row_count(), 1);

    let selected = gateway
        .execute_query("SELECT count(*) AS n FROM mcpchat_live_items;")
        .await
        .unwrap();
    assert_eq!(selected.rows[0]["n"], serde_json::json!(3));

    let schema = gateway.get_table_schema("mcpchat_live_items").await.unwrap();
    assert_eq!(schema.columns.len(), 2);
    assert!(schema.columns[0].is_primary_key);
    assert!(schema.columns[1].is_nullable);

    let tables = gateway.list_tables().await.unwrap();
    assert!(tables.iter().any(|t| t.table == "mcpchat_live_items"));

    let report = gateway.connect().await.unwrap();
    assert!(report.server_version.starts_with("PostgreSQL"));

    sqlx::query("DROP TABLE mcpchat_live_items").execute(&pool).await.unwrap();
}

#[tokio::test]
async fn test_missing_table_schema() {
    let Some(gateway) = live_gateway() else {
        return;
    };
    let err = gateway.get_table_schema("public.no_such_table_here").await.unwrap_err();
    assert!(matches!(err, mcpchat_postgres::GatewayError::NotFound(_)));
}

#[tokio::test]
async fn test_repeated_columns_and_trailing_comment() {
    let Some(gateway) = live_gateway() else {
        return;
    };

    let result = gateway.execute_query("SELECT 1 AS a, 2 AS a, 3, 4").await.unwrap();
    let names: Vec<_> = result.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "a_2", "?column?", "?column?_2"]);
    assert_eq!(result.rows[0]["a"], serde_json::json!(1));
    assert_eq!(result.rows[0]["a_2"], serde_json::json!(2));
    assert_eq!(result.rows[0]["?column?_2"], serde_json::json!(4));

    let commented = gateway.execute_query("SELECT 1 AS one -- trailing note").await.unwrap();
    assert_eq!(commented.rows[0]["one"], serde_json::json!(1));
}
