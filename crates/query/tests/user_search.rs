//! Filter expressions run against projected user documents.

use chrono::{TimeZone, Utc};
use common::EntityId;
use document_store::{InMemoryDocumentStore, Repository};
use domain::{Address, Job, UserDocument, UserRow};
use query::{QueryError, UserSearchService};

fn job(id: &str, name: &str, year: i32) -> Job {
    Job {
        id: EntityId::from(id),
        name: Some(name.to_string()),
        description: None,
        start_date: Some(Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()),
        end_date: None,
    }
}

async fn seeded() -> UserSearchService<InMemoryDocumentStore> {
    let store = InMemoryDocumentStore::new();
    let users = Repository::<UserDocument, _>::new(store.clone());

    let people = [
        ("u1", "Joumen Harzli", 30, Some(("j1", "Software Engineer", 2015)), Some("Tunis")),
        ("u2", "Sami Ben Ali", 45, Some(("j2", "Teacher", 2010)), Some("Sfax")),
        ("u3", "Amira Joumen", 19, None, None),
    ];
    for (id, name, age, job_spec, city) in people {
        let mut user = UserDocument::from_row(
            UserRow {
                id: EntityId::from(id),
                name: Some(name.to_string()),
                age: Some(age),
            },
            1,
        );
        if let Some((job_id, title, year)) = job_spec {
            user.jobs.upsert(job(job_id, title, year));
        }
        if let Some(city) = city {
            user.addresses.upsert(Address {
                id: EntityId::from(format!("a-{id}")),
                name: Some(city.to_string()),
            });
        }
        users.save(&user).await.unwrap();
    }

    UserSearchService::new(store)
}

fn ids(page: &document_store::Page<UserDocument>) -> Vec<&str> {
    page.content.iter().map(|u| u.id.as_str()).collect()
}

#[tokio::test]
async fn conjunction_of_match_and_range() {
    let service = seeded().await;
    let page = service.search(Some("name=joumen&age>20"), 0, 10).await.unwrap();
    assert_eq!(ids(&page), vec!["u1"]);
}

#[tokio::test]
async fn nested_fields_filter_on_sub_entities() {
    let service = seeded().await;

    let page = service.search(Some("jobs.name=engineer"), 0, 10).await.unwrap();
    assert_eq!(ids(&page), vec!["u1"]);

    let page = service
        .search(Some("addresses.name=sfax&age<50"), 0, 10)
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["u2"]);

    let page = service
        .search(Some("jobs.start_date>2012-01-01"), 0, 10)
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["u1"]);
}

#[tokio::test]
async fn not_equals_excludes() {
    let service = seeded().await;
    let page = service.search(Some("name!=joumen"), 0, 10).await.unwrap();
    assert_eq!(ids(&page), vec!["u2"]);
}

#[tokio::test]
async fn no_expression_pages_through_everyone() {
    let service = seeded().await;

    let first = service.search(None, 0, 2).await.unwrap();
    assert_eq!(ids(&first), vec!["u1", "u2"]);
    assert_eq!(first.total_elements, 3);
    assert_eq!(first.total_pages(), 2);

    let second = service.search(Some(""), 1, 2).await.unwrap();
    assert_eq!(ids(&second), vec!["u3"]);
}

#[tokio::test]
async fn caller_errors_are_reported() {
    let service = seeded().await;

    let error = service.search(Some("name~joumen"), 0, 10).await.unwrap_err();
    assert!(matches!(error, QueryError::UnsupportedOperator(_)));

    let error = service.search(Some("name="), 0, 10).await.unwrap_err();
    assert!(matches!(error, QueryError::MalformedFilterExpression(_)));

    let error = service.search(None, 0, 0).await.unwrap_err();
    assert!(matches!(error, QueryError::InvalidPageable(_)));
}

#[tokio::test]
async fn empty_filter_returns_first_page_with_total() {
    let store = InMemoryDocumentStore::new();
    let users = Repository::<UserDocument, _>::new(store.clone());
    for n in 0..12 {
        let user = UserDocument::from_row(
            UserRow {
                id: EntityId::from(format!("user-{n:02}")),
                name: Some(format!("user {n}")),
                age: Some(20 + n),
            },
            1,
        );
        users.save(&user).await.unwrap();
    }

    let page = UserSearchService::new(store).search(None, 0, 10).await.unwrap();

    assert_eq!(page.content.len(), 10);
    assert_eq!(page.content[0].id.as_str(), "user-00");
    assert_eq!(page.total_elements, 12);
}
