//! Compiles parsed parameters into a structured search.

use document_store::{BoolQuery, Pageable, Query, ScoreMode, SearchQuery};

use crate::{QueryOperator, QueryParameter};

const PATH_SEPARATOR: char = '.';

/// Builds one [`SearchQuery`] from an ordered list of parameters.
///
/// Every parameter contributes one required clause, so the compiled query
/// is their conjunction. A field containing a dot is scoped to the nested
/// collection named by everything before its last dot:
///
/// ```
/// use document_store::Query;
/// use query::{QueryOperator, QueryParameter, SearchQueryBuilder};
///
/// let search = SearchQueryBuilder::from_parameters(vec![
///     QueryParameter::new("jobs.name", QueryOperator::Equals, "engineer"),
/// ])
/// .build();
///
/// let Query::Bool(clauses) = &search.query else { panic!() };
/// assert!(matches!(&clauses.must[0], Query::Nested { path, .. } if path == "jobs"));
/// ```
#[derive(Debug, Clone)]
pub struct SearchQueryBuilder {
    parameters: Vec<QueryParameter>,
    pageable: Option<Pageable>,
}

impl SearchQueryBuilder {
    pub fn from_parameters(parameters: Vec<QueryParameter>) -> Self {
        Self {
            parameters,
            pageable: None,
        }
    }

    /// Restricts the search to one page.
    pub fn with_pageable(mut self, pageable: Pageable) -> Self {
        self.pageable = Some(pageable);
        self
    }

    pub fn build(self) -> SearchQuery {
        tracing::debug!(
            parameters = ?self.parameters,
            pageable = ?self.pageable,
            "building search query"
        );

        let query = if self.parameters.is_empty() {
            Query::MatchAll
        } else {
            Query::Bool(
                self.parameters
                    .iter()
                    .map(scoped_clause)
                    .fold(BoolQuery::new(), BoolQuery::must),
            )
        };

        let search = SearchQuery::new(query);
        match self.pageable {
            Some(pageable) => search.with_pageable(pageable),
            None => search,
        }
    }
}

fn clause(parameter: &QueryParameter) -> Query {
    let QueryParameter { field, value, .. } = parameter;
    match parameter.operator {
        QueryOperator::Equals => Query::match_query(field, value),
        QueryOperator::NotEquals => {
            Query::Bool(BoolQuery::new().must_not(Query::match_query(field, value)))
        }
        QueryOperator::GreaterThan => Query::greater_than(field, value),
        QueryOperator::LessThan => Query::less_than(field, value),
    }
}

fn scoped_clause(parameter: &QueryParameter) -> Query {
    match parameter.field.rsplit_once(PATH_SEPARATOR) {
        Some((path, _)) => Query::nested(path, clause(parameter), ScoreMode::None),
        None => clause(parameter),
    }
}
