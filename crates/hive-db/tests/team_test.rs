//! Integration tests for team assignment queries.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use hive_db::models::{TeamRole, User};
use hive_db::queries::clients::{self, NewClient};
use hive_db::queries::team;
use hive_db::queries::users::{self, NewUser};
use hive_test_utils::TestDb;

async fn seed_user(pool: &PgPool, name: &str) -> User {
    users::insert_user(
        pool,
        &NewUser {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            avatar_url: None,
            role: None,
        },
    )
    .await
    .unwrap()
}

async fn seed_client(pool: &PgPool) -> Uuid {
    let due = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    clients::insert_client(pool, &NewClient::new("Acme", due))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn replace_team_swaps_all_roles() {
    let db = TestDb::new().await;
    let client_id = seed_client(&db.pool).await;
    let ann = seed_user(&db.pool, "Ann").await;
    let bob = seed_user(&db.pool, "Bob").await;
    let cat = seed_user(&db.pool, "Cat").await;

    team::replace_team(
        &db.pool,
        client_id,
        &[(ann.id, TeamRole::Manager), (bob.id, TeamRole::Editor)],
    )
    .await
    .unwrap();

    team::replace_team(
        &db.pool,
        client_id,
        &[(cat.id, TeamRole::Manager), (ann.id, TeamRole::Scripting)],
    )
    .await
    .unwrap();

    let rows = team::list_team_for_client(&db.pool, client_id).await.unwrap();
    let pairs: Vec<(TeamRole, &str)> = rows.iter().map(|r| (r.role, r.user.name.as_str())).collect();
    assert_eq!(
        pairs,
        [(TeamRole::Manager, "Cat"), (TeamRole::Scripting, "Ann")]
    );

    db.cleanup().await;
}

#[tokio::test]
async fn failed_replacement_keeps_previous_team() {
    let db = TestDb::new().await;
    let client_id = seed_client(&db.pool).await;
    let ann = seed_user(&db.pool, "Ann").await;
    let bob = seed_user(&db.pool, "Bob").await;

    team::replace_team(&db.pool, client_id, &[(ann.id, TeamRole::Manager)])
        .await
        .unwrap();

    // A second manager violates the one-manager index mid-transaction.
    let result = team::replace_team(
        &db.pool,
        client_id,
        &[(bob.id, TeamRole::Manager), (ann.id, TeamRole::Manager)],
    )
    .await;
    assert!(result.is_err());

    let rows = team::list_team_for_client(&db.pool, client_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user.id, ann.id);
    assert_eq!(rows[0].role, TeamRole::Manager);

    db.cleanup().await;
}

#[tokio::test]
async fn insert_assignments_is_idempotent() {
    let db = TestDb::new().await;
    let client_id = seed_client(&db.pool).await;
    let ann = seed_user(&db.pool, "Ann").await;

    let first = team::insert_assignments(&db.pool, client_id, &[(ann.id, TeamRole::Editor)])
        .await
        .unwrap();
    let second = team::insert_assignments(&db.pool, client_id, &[(ann.id, TeamRole::Editor)])
        .await
        .unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(team::count_assignments(&db.pool, client_id).await.unwrap(), 1);

    db.cleanup().await;
}

#[tokio::test]
async fn deleting_client_cascades_to_assignments() {
    let db = TestDb::new().await;
    let client_id = seed_client(&db.pool).await;
    let ann = seed_user(&db.pool, "Ann").await;

    team::replace_team(&db.pool, client_id, &[(ann.id, TeamRole::Manager)])
        .await
        .unwrap();
    clients::delete_client(&db.pool, client_id).await.unwrap();

    assert_eq!(team::count_assignments(&db.pool, client_id).await.unwrap(), 0);

    db.cleanup().await;
}
