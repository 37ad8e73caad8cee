//! User search endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use document_store::{DocumentStore, Page};
use domain::{Address, EntitySet, Job, UserDocument};
use query::UserSearchService;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub search: UserSearchService<S>,
    pub default_page_size: u32,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub addresses: EntitySet<Address>,
    pub jobs: EntitySet<Job>,
}

impl From<UserDocument> for UserResponse {
    fn from(user: UserDocument) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            age: user.age,
            addresses: user.addresses,
            jobs: user.jobs,
        }
    }
}

#[derive(Serialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub page: u32,
    pub size: u32,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            total_pages: page.total_pages(),
            total_elements: page.total_elements,
            page: page.page,
            size: page.size,
            content: page.content,
        }
    }
}

// -- Handlers --

/// GET /api/v1/users/search/{parameters}: users matching every clause of
/// a filter expression such as `name=joumen&jobs.name=engineer&age>20`.
#[tracing::instrument(skip(state))]
pub async fn search<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(parameters): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<UserResponse>>, ApiError> {
    run_search(&state, Some(&parameters), params).await
}

/// GET /api/v1/users/search: every user, paged.
#[tracing::instrument(skip(state))]
pub async fn search_all<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<UserResponse>>, ApiError> {
    run_search(&state, None, params).await
}

async fn run_search<S: DocumentStore>(
    state: &AppState<S>,
    expression: Option<&str>,
    params: PageParams,
) -> Result<Json<PageResponse<UserResponse>>, ApiError> {
    let page = params.page.unwrap_or(0);
    let size = params.size.unwrap_or(state.default_page_size);

    let users = state.search.search(expression, page, size).await?;
    Ok(Json(users.map(UserResponse::from).into()))
}
