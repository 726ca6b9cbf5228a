//! Integration tests against a live PostgreSQL
//!
//! Run with `DATABASE_URL` set and `--ignored`.

use pgtable::prelude::*;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub settings: serde_json::Value,
    pub age: Option<i32>,
}

impl Record for Account {
    fn value(&self, column: &str) -> Option<PostgresValue> {
        match column {
            "id" => Some(self.id.into()),
            "email" => Some(self.email.as_str().into()),
            "settings" => Some(self.settings.clone().into()),
            "age" => Some(self.age.into()),
            _ => None,
        }
    }
}

fn accounts() -> Table<Account> {
    Table::new("pgtable_accounts", vec![
        Field::id("id").insert(VALUE),
        Field::column("email"),
        Field::new("settings")
            .insert("COALESCE({value}, '{}'::jsonb)")
            .update(VALUE)
            .bind(json!({})),
        Field::new("created_at").insert("NOW()"),
        Field::column("age").typed(FieldType::Integer),
    ])
    .select_columns("pgtable_accounts.id,pgtable_accounts.email,pgtable_accounts.settings,pgtable_accounts.age")
    .with_selector(
        Selector::default()
            .filter_field("pgtable_accounts.email", FieldType::Text)
            .sort_field("pgtable_accounts.email")
            .default_sort(vec![SortField::asc("pgtable_accounts.email")]),
    )
    .build()
    .unwrap()
}

async fn setup() -> PgTable {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database");
    let db = PgTable::from_pool(pool, QueryConfig::new(5_000, 100));

    cleanup(&db).await;
    sqlx::query(
        "CREATE TABLE pgtable_accounts (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            settings JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            age INTEGER
        )",
    )
    .execute(db.pool())
    .await
    .expect("Failed to create table");
    db
}

async fn cleanup(db: &PgTable) {
    let _ = sqlx::query("DROP TABLE IF EXISTS pgtable_accounts CASCADE")
        .execute(db.pool())
        .await;
}

fn account(email: &str) -> Account {
    Account {
        id: Uuid::new_v4(),
        email: email.to_string(),
        settings: json!({"theme": "dark"}),
        age: None,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_crud_round_trip() {
    let db = setup().await;
    let exec = db.executor();
    let table = accounts();

    let created = table.insert(&exec, &account("a@example.com")).await.unwrap();
    assert_eq!(created.settings["theme"], "dark");

    let fetched = table.get(&exec, &[created.id.into()]).await.unwrap();
    assert_eq!(fetched, created);

    let mut changed = fetched.clone();
    changed.email = "b@example.com".to_string();
    let updated = table.update(&exec, &changed).await.unwrap();
    assert_eq!(updated.email, "b@example.com");

    let mut replaced = updated.clone();
    replaced.settings = json!({"theme": "light"});
    let upserted = table.upsert(&exec, &replaced).await.unwrap();
    assert_eq!(upserted.settings["theme"], "light");

    assert_eq!(table.delete(&exec, &[created.id.into()]).await.unwrap(), 1);
    let err = table.get(&exec, &[created.id.into()]).await.unwrap_err();
    assert!(err.is_not_found());

    cleanup(&db).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_nullable_integer_column() {
    let db = setup().await;
    let exec = db.executor();
    let table = accounts();

    let created = table.insert(&exec, &account("null@example.com")).await.unwrap();
    assert_eq!(created.age, None);

    let mut aged = created.clone();
    aged.age = Some(30);
    assert_eq!(table.update(&exec, &aged).await.unwrap().age, Some(30));

    aged.age = None;
    assert_eq!(table.update(&exec, &aged).await.unwrap().age, None);

    cleanup(&db).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_is_classified() {
    let db = setup().await;
    let exec = db.executor();
    let table = accounts();

    table.insert(&exec, &account("dup@example.com")).await.unwrap();
    let err = table.insert(&exec, &account("dup@example.com")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);

    cleanup(&db).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_select_with_count_and_pagination() {
    let db = setup().await;
    let exec = db.executor();
    let table = accounts();

    for name in ["carol", "alice", "bob", "dave"] {
        table
            .insert(&exec, &account(&format!("{}@example.com", name)))
            .await
            .unwrap();
    }

    let params = db.params(
        QueryParameters::new()
            .filter(Filter::not_like("pgtable_accounts.email", "dave%"))
            .limit(2),
    );
    let (page, total) = table.select(&exec, &params).await.unwrap();
    assert_eq!(total, Some(3));
    assert_eq!(
        page.iter().map(|a| a.email.as_str()).collect::<Vec<_>>(),
        vec!["alice@example.com", "bob@example.com"]
    );

    let first = table
        .select_first(&exec, &QueryParameters::new().order_by("pgtable_accounts.email", SortOrder::Desc))
        .await
        .unwrap();
    assert_eq!(first.email, "dave@example.com");

    cleanup(&db).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_transaction_executor() {
    let db = setup().await;
    let table = accounts();

    let mut tx = db.pool().begin().await.unwrap();
    {
        let exec = ConnectionExecutor::new(&mut tx);
        table.insert(&exec, &account("tx@example.com")).await.unwrap();
    }
    tx.rollback().await.unwrap();

    let (rows, total) = table.select(&db.executor(), &QueryParameters::new()).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(total, Some(0));

    cleanup(&db).await;
}
