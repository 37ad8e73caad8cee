//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p document-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use document_store::{
    BoolQuery, DocumentStore, EntityId, Pageable, PostgresDocumentStore, Query, ScoreMode,
    SearchQuery,
};
use serde_json::{Value, json};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_documents_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and an empty documents table
async fn get_test_store() -> PostgresDocumentStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE documents")
        .execute(&pool)
        .await
        .unwrap();

    PostgresDocumentStore::new(pool)
}

async fn seed(store: &PostgresDocumentStore) {
    let users = [
        json!({
            "id": "a", "name": "Joumen Harzli", "age": 30,
            "jobs": [
                { "id": "j1", "name": "Software Engineer", "start_date": "2015-01-01T00:00:00Z" },
                { "id": "j2", "name": "Teacher", "start_date": "2019-06-01T00:00:00Z" }
            ],
            "addresses": [ { "id": "ad1", "name": "Tunis" } ]
        }),
        json!({
            "id": "b", "name": "Sami Ben Ali", "age": 18,
            "jobs": [ { "id": "j3", "name": "Engineer", "start_date": "2021-01-01T00:00:00Z" } ],
            "addresses": []
        }),
        json!({ "id": "c", "name": "joumen smith", "age": 45, "jobs": [], "addresses": [] }),
    ];

    for user in users {
        let id = EntityId::from(user["id"].as_str().unwrap());
        store.upsert("users", &id, user).await.unwrap();
    }
}

fn ids(page: &[Value]) -> Vec<&str> {
    page.iter().map(|doc| doc["id"].as_str().unwrap()).collect()
}

#[tokio::test]
#[serial]
async fn upsert_replaces_and_remove_deletes() {
    let store = get_test_store().await;
    let id = EntityId::from("a");

    store.upsert("users", &id, json!({ "name": "one" })).await.unwrap();
    store.upsert("users", &id, json!({ "name": "two" })).await.unwrap();
    assert_eq!(
        store.get("users", &id).await.unwrap(),
        Some(json!({ "name": "two" }))
    );
    assert_eq!(store.count("users").await.unwrap(), 1);

    assert!(store.remove("users", &id).await.unwrap());
    assert!(!store.remove("users", &id).await.unwrap());
    assert_eq!(store.get("users", &id).await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn indices_are_isolated() {
    let store = get_test_store().await;
    let id = EntityId::from("a");
    store.upsert("users", &id, json!({ "name": "x" })).await.unwrap();

    assert_eq!(store.get("other", &id).await.unwrap(), None);
    assert_eq!(store.count("other").await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn match_is_case_insensitive() {
    let store = get_test_store().await;
    seed(&store).await;

    let page = store
        .search("users", &SearchQuery::new(Query::match_query("name", "JOUMEN")))
        .await
        .unwrap();
    assert_eq!(ids(&page.content), vec!["a", "c"]);
}

#[tokio::test]
#[serial]
async fn numeric_range_and_conjunction() {
    let store = get_test_store().await;
    seed(&store).await;

    let query = Query::Bool(
        BoolQuery::new()
            .must(Query::match_query("name", "joumen"))
            .must(Query::greater_than("age", "20"))
            .must(Query::less_than("age", "40")),
    );
    let page = store.search("users", &SearchQuery::new(query)).await.unwrap();
    assert_eq!(ids(&page.content), vec!["a"]);
}

#[tokio::test]
#[serial]
async fn must_not_excludes() {
    let store = get_test_store().await;
    seed(&store).await;

    let query = Query::Bool(BoolQuery::new().must_not(Query::match_query("name", "joumen")));
    let page = store.search("users", &SearchQuery::new(query)).await.unwrap();
    assert_eq!(ids(&page.content), vec!["b"]);
}

#[tokio::test]
#[serial]
async fn nested_clauses_match_within_one_element() {
    let store = get_test_store().await;
    seed(&store).await;

    let query = Query::nested(
        "jobs",
        Query::Bool(
            BoolQuery::new()
                .must(Query::match_query("jobs.name", "engineer"))
                .must(Query::greater_than("jobs.start_date", "2016-01-01")),
        ),
        ScoreMode::None,
    );
    let page = store.search("users", &SearchQuery::new(query)).await.unwrap();
    assert_eq!(ids(&page.content), vec!["b"]);
}

#[tokio::test]
#[serial]
async fn paging_is_ordered_by_id() {
    let store = get_test_store().await;
    seed(&store).await;

    let first = SearchQuery::match_all().with_pageable(Pageable::new(0, 2).unwrap());
    let page = store.search("users", &first).await.unwrap();
    assert_eq!(ids(&page.content), vec!["a", "b"]);
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages(), 2);

    let second = SearchQuery::match_all().with_pageable(Pageable::new(1, 2).unwrap());
    let page = store.search("users", &second).await.unwrap();
    assert_eq!(ids(&page.content), vec!["c"]);

    let beyond = SearchQuery::match_all().with_pageable(Pageable::new(9, 2).unwrap());
    let page = store.search("users", &beyond).await.unwrap();
    assert!(page.content.is_empty());
    assert_eq!(page.total_elements, 3);
}

#[tokio::test]
#[serial]
async fn missing_fields_never_match() {
    let store = get_test_store().await;
    seed(&store).await;

    let page = store
        .search("users", &SearchQuery::new(Query::match_query("nickname", "joumen")))
        .await
        .unwrap();
    assert!(page.content.is_empty());

    let page = store
        .search("users", &SearchQuery::new(Query::greater_than("name", "1")))
        .await
        .unwrap();
    assert!(page.content.is_empty());
}
