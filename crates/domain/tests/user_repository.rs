//! User documents persisted through the typed repository.

use chrono::{TimeZone, Utc};
use common::EntityId;
use document_store::{
    Document, DocumentStore, InMemoryDocumentStore, Query, Repository, ScoreMode, SearchQuery,
};
use domain::{Address, Job, NestedEntity, UserDocument, UserRow};
use serde_json::json;

fn user(id: &str, name: &str, age: i32) -> UserDocument {
    UserDocument::from_row(
        UserRow {
            id: EntityId::from(id),
            name: Some(name.to_string()),
            age: Some(age),
        },
        1,
    )
}

#[tokio::test]
async fn save_and_load_with_nested_collections() {
    let repo = Repository::<UserDocument, _>::new(InMemoryDocumentStore::new());
    let mut joumen = user("u1", "Joumen Harzli", 30);
    Address::collection_mut(&mut joumen).upsert(Address {
        id: EntityId::from("a1"),
        name: Some("Tunis".into()),
    });
    Job::collection_mut(&mut joumen).upsert(Job {
        id: EntityId::from("j1"),
        name: Some("Software Engineer".into()),
        description: None,
        start_date: Some(Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()),
        end_date: None,
    });

    repo.save(&joumen).await.unwrap();

    let loaded = repo.find_by_id(&joumen.id).await.unwrap().unwrap();
    assert_eq!(loaded, joumen);

    let stored = repo
        .store()
        .get(UserDocument::INDEX, &joumen.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["jobs"][0]["start_date"], json!("2015-01-01T00:00:00Z"));
}

#[tokio::test]
async fn nested_search_finds_owner() {
    let repo = Repository::<UserDocument, _>::new(InMemoryDocumentStore::new());
    let mut joumen = user("u1", "Joumen", 30);
    joumen.jobs.upsert(Job {
        id: EntityId::from("j1"),
        name: Some("Engineer".into()),
        description: None,
        start_date: None,
        end_date: None,
    });
    repo.save(&joumen).await.unwrap();
    repo.save(&user("u2", "Sami", 20)).await.unwrap();

    let query = Query::nested(
        "jobs",
        Query::match_query("jobs.name", "engineer"),
        ScoreMode::None,
    );
    let page = repo.search(&SearchQuery::new(query)).await.unwrap();

    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].id, joumen.id);
}
