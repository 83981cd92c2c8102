//! Runs against a real database when `DATABASE_URL` is set; skipped otherwise.

#![cfg(feature = "pool")]

use pgrecord::{
    DatabaseConfig, DatabaseError, Entity, EntityDescriptor, Fields, PoolExecutor, RecordError,
    Value, create_pool_with_tls, fields,
};
use rust_decimal::Decimal;
use std::error::Error as _;
use tokio_postgres::error::SqlState;

fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").ok()
}

#[tokio::test]
async fn crud_against_postgres() {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let exec = PoolExecutor::from_config(&DatabaseConfig {
        url,
        max_size: 4,
        query_timeout_ms: Some(10_000),
    })
    .unwrap();

    let table = format!("pgrecord_live_{}", uuid::Uuid::new_v4().simple());
    let client = exec.pool().get().await.unwrap();
    client
        .batch_execute(&format!(
            "CREATE TABLE {table} (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                age INTEGER,
                joined DATE,
                price NUMERIC(10, 2),
                opens TIME
            )"
        ))
        .await
        .unwrap();
    drop(client);

    let users = Entity::new(
        EntityDescriptor::new(&table)
            .unwrap()
            .fields(["name", "age", "joined", "price", "opens"])
            .unwrap(),
        exec.clone(),
    );

    let joined = chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    let opens = chrono::NaiveTime::from_hms_opt(9, 30, 0).unwrap();
    let created = users
        .create(&fields! {
            "name" => "x",
            "age" => 30,
            "joined" => joined,
            "price" => Decimal::new(1950, 2),
            "opens" => opens,
        })
        .await
        .unwrap();
    assert_eq!(created.affected, 1);
    let id = created.id.unwrap();

    let row = users.find_by_id(id.clone()).await.unwrap().unwrap();
    assert_eq!(row.get("name"), Some(&Value::Text("x".into())));
    assert_eq!(row.get("age"), Some(&Value::Int(30)));
    assert_eq!(row.get("joined"), Some(&Value::Date(joined)));
    assert_eq!(row.get("opens"), Some(&Value::Time(opens)));

    let dup = users.create(&fields! { "name" => "x" }).await.unwrap_err();
    assert!(matches!(
        dup,
        RecordError::Database(DatabaseError::UniqueViolation { .. })
    ));
    assert!(dup.source().is_some(), "driver error is kept");
    assert_eq!(
        dup.as_database().and_then(DatabaseError::sqlstate),
        Some(&SqlState::UNIQUE_VIOLATION)
    );

    let priced = users
        .find_where(&fields! { "price" => 19.5 })
        .await
        .unwrap();
    assert_eq!(priced.len(), 1);
    assert_eq!(
        priced[0].get("price"),
        Some(&Value::Decimal(Decimal::new(1950, 2)))
    );

    assert_eq!(
        users
            .update(&fields! { "age" => None::<i32> }, id.clone())
            .await
            .unwrap(),
        1
    );
    let row = users.find_one(&fields! { "name" => "x" }).await.unwrap().unwrap();
    assert_eq!(row.get("age"), Some(&Value::Null));

    assert_eq!(users.find(&Fields::new()).await.unwrap().len(), 1);
    assert_eq!(users.delete(id.clone()).await.unwrap(), 1);
    assert_eq!(users.delete(id).await.unwrap(), 0);

    let client = exec.pool().get().await.unwrap();
    client
        .batch_execute(&format!("DROP TABLE {table}"))
        .await
        .unwrap();
}

#[tokio::test]
async fn custom_tls_connector_pool() {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let pool = create_pool_with_tls(&url, tokio_postgres::NoTls).unwrap();
    let exec = PoolExecutor::new(pool).with_query_timeout(std::time::Duration::from_secs(10));

    let rows = pgrecord::Executor::query(&exec, "SELECT $1::BIGINT + 1 AS n", &[Value::Int(41)])
        .await
        .unwrap();
    assert_eq!(rows[0].get("n"), Some(&Value::Int(42)));
}
