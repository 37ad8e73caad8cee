//! Pipeline tests against PostgreSQL for both the stream and the store.
//!
//! Run with:
//!
//! ```bash
//! cargo test -p denormalizer --test postgres_pipeline -- --test-threads=1
//! ```

use std::sync::Arc;

use change_stream::{ChangeStream, PostgresChangeStream, TopicName};
use common::EntityId;
use denormalizer::{BatchDispatcher, DispatchOptions, HandlerRegistry};
use document_store::{PostgresDocumentStore, Repository};
use domain::UserDocument;
use serde_json::json;
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

const USER: &str = "123e4567-e89b-12d3-a456-426614174000";

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
            PostgresDocumentStore::new(temp_pool.clone())
                .run_migrations()
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

async fn get_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE documents, change_events, consumer_checkpoints RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn message(op: &str, after: serde_json::Value, ts_ms: i64) -> String {
    json!({ "schema": {}, "payload": { "before": null, "after": after, "op": op, "ts_ms": ts_ms } })
        .to_string()
}

#[tokio::test]
#[serial]
async fn projects_and_commits_through_postgres() {
    let pool = get_pool().await;
    let store = PostgresDocumentStore::new(pool.clone());
    let stream = PostgresChangeStream::new(pool, "denormalizer");
    let registry = Arc::new(HandlerRegistry::for_users(store.clone()));
    let dispatcher = BatchDispatcher::new(stream.clone(), registry, DispatchOptions::default());

    stream
        .publish(
            &TopicName::new("mysqlcdc.cdc.JOBS"),
            &message(
                "c",
                json!({ "ID": "00000000-0000-0000-0000-000000000002", "NAME": "Engineer", "USER_ID": USER }),
                101,
            ),
        )
        .await
        .unwrap();
    let last = stream
        .publish(
            &TopicName::new("mysqlcdc.cdc.USERS"),
            &message("c", json!({ "ID": USER, "NAME": "joumen", "AGE": 30 }), 100),
        )
        .await
        .unwrap();

    let report = dispatcher.process_batch().await.unwrap();
    assert_eq!(report.applied, 2);
    assert_eq!(report.committed, Some(last));
    assert_eq!(stream.committed().await.unwrap(), Some(last));

    let users = Repository::<UserDocument, _>::new(store);
    let user = users.find_by_id(&EntityId::from(USER)).await.unwrap().unwrap();
    assert_eq!(user.name.as_deref(), Some("joumen"));
    assert_eq!(user.jobs.len(), 1);

    let again = dispatcher.process_batch().await.unwrap();
    assert_eq!(again.polled, 0);
}
