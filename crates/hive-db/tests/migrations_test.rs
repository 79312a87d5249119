//! Integration tests for the embedded migrations and pool helpers.

use sqlx::Row;

use hive_db::pool;
use hive_test_utils::TestDb;

/// Application tables created by the initial migration.
const EXPECTED_TABLES: &[&str] = &[
    "client_team_assignments",
    "clients",
    "monthly_content_plans",
    "users",
];

#[tokio::test]
async fn migrations_create_all_tables() {
    let db = TestDb::new().await;

    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT tablename::text FROM pg_tables \
         WHERE schemaname = 'public' AND tablename NOT LIKE '\\_sqlx%' \
         ORDER BY tablename",
    )
    .fetch_all(&db.pool)
    .await
    .expect("should list tables");

    let names: Vec<&str> = rows.iter().map(|(name,)| name.as_str()).collect();
    assert_eq!(names, EXPECTED_TABLES);

    db.cleanup().await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = TestDb::new().await;

    // TestDb::new already migrated once.
    pool::run_migrations(&db.pool)
        .await
        .expect("second migration run should succeed");

    for table in EXPECTED_TABLES {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS cnt FROM {table}"))
            .fetch_one(&db.pool)
            .await
            .unwrap_or_else(|e| panic!("failed to count {table}: {e}"));
        let count: i64 = row.get("cnt");
        assert_eq!(count, 0, "table {table} should be empty after migrations");
    }

    db.cleanup().await;
}

#[tokio::test]
async fn table_counts_lists_application_tables() {
    let db = TestDb::new().await;

    let counts = pool::table_counts(&db.pool)
        .await
        .expect("table_counts should succeed");

    assert_eq!(
        counts,
        vec![
            ("clients", 0),
            ("users", 0),
            ("client_team_assignments", 0),
            ("monthly_content_plans", 0),
        ]
    );

    db.cleanup().await;
}

#[tokio::test]
async fn schema_rejects_inconsistent_recurrence() {
    let db = TestDb::new().await;

    let result = sqlx::query(
        "INSERT INTO clients (client_name, due_date, is_recurring, recurring_interval) \
         VALUES ('Acme', DATE '2025-01-01', true, NULL)",
    )
    .execute(&db.pool)
    .await;
    assert!(result.is_err(), "recurring without interval must be rejected");

    let result = sqlx::query(
        "INSERT INTO clients (client_name, due_date, is_recurring, recurring_interval) \
         VALUES ('Acme', DATE '2025-01-01', false, 'monthly')",
    )
    .execute(&db.pool)
    .await;
    assert!(result.is_err(), "interval without recurring flag must be rejected");

    db.cleanup().await;
}

#[tokio::test]
async fn schema_rejects_malformed_month() {
    let db = TestDb::new().await;

    let client_id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO clients (client_name, due_date) VALUES ('Acme', DATE '2025-01-01') RETURNING id",
    )
    .fetch_one(&db.pool)
    .await
    .expect("insert client");

    for month in ["2025-13", "2025-1", "25-01", "2025-00"] {
        let result = sqlx::query(
            "INSERT INTO monthly_content_plans (client_id, month) VALUES ($1, $2)",
        )
        .bind(client_id)
        .bind(month)
        .execute(&db.pool)
        .await;
        assert!(result.is_err(), "month {month:?} should be rejected");
    }

    db.cleanup().await;
}
