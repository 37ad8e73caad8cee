use document_store::{DocumentStore, Page, Pageable, Repository};
use domain::UserDocument;

use crate::{QueryParameter, Result, SearchQueryBuilder, parse_filter_expression};

/// Searches user documents by filter criteria.
pub struct UserSearchService<S> {
    users: Repository<UserDocument, S>,
}

impl<S: Clone> Clone for UserSearchService<S> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
        }
    }
}

impl<S: DocumentStore> UserSearchService<S> {
    pub fn new(store: S) -> Self {
        Self {
            users: Repository::new(store),
        }
    }

    /// Finds one page of users satisfying every parameter.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_criteria(
        &self,
        parameters: Vec<QueryParameter>,
        pageable: Pageable,
    ) -> Result<Page<UserDocument>> {
        let search = SearchQueryBuilder::from_parameters(parameters)
            .with_pageable(pageable)
            .build();
        tracing::debug!(query = %search.query.to_dsl(), "searching users");

        let page = self.users.search(&search).await?;
        metrics::counter!("query_searches_total").increment(1);
        Ok(page)
    }

    /// Parses `expression` and runs it for the requested page.
    ///
    /// A missing or empty expression returns every user.
    pub async fn search(
        &self,
        expression: Option<&str>,
        page: u32,
        size: u32,
    ) -> Result<Page<UserDocument>> {
        let parameters = match expression {
            Some(expression) => parse_filter_expression(expression)?,
            None => Vec::new(),
        };
        let pageable = Pageable::new(page, size)?;
        self.find_by_criteria(parameters, pageable).await
    }

    /// Number of user documents in the store.
    pub async fn count(&self) -> Result<u64> {
        Ok(self.users.count().await?)
    }
}
