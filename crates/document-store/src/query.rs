//! Structured query model understood by every [`DocumentStore`](crate::DocumentStore).
//!
//! The shape follows the usual search-engine boolean DSL so a compiled
//! query can be rendered with [`Query::to_dsl`] for logging.

use serde_json::{Value, json};

use crate::Pageable;

/// How matches inside a nested collection contribute to the parent's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreMode {
    /// Nested matches only filter; they do not affect ranking.
    #[default]
    None,
    Avg,
    Max,
    Min,
    Sum,
}

impl ScoreMode {
    /// Returns the DSL name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Min => "min",
            Self::Sum => "sum",
        }
    }
}

/// Exclusive bound of a range clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeBound {
    GreaterThan(String),
    LessThan(String),
}

impl RangeBound {
    /// Returns the bound's value.
    pub fn value(&self) -> &str {
        match self {
            Self::GreaterThan(value) | Self::LessThan(value) => value,
        }
    }
}

/// Conjunction of required and excluded clauses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoolQuery {
    /// Every clause must match.
    pub must: Vec<Query>,

    /// No clause may match.
    pub must_not: Vec<Query>,
}

impl BoolQuery {
    /// Creates an empty boolean query, which matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required clause.
    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    /// Adds an excluded clause.
    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    /// Returns true when the query has no clauses.
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }
}

/// A predicate over documents.
///
/// Field names are dotted paths from the document root, including inside
/// [`Query::Nested`] where they keep the nested path as prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Matches every document.
    MatchAll,

    /// Every token of `value` occurs in the field's text.
    Match { field: String, value: String },

    /// The field lies beyond an exclusive bound.
    Range { field: String, bound: RangeBound },

    /// Boolean combination of clauses.
    Bool(BoolQuery),

    /// At least one element of the nested collection at `path` matches.
    Nested {
        path: String,
        query: Box<Query>,
        score_mode: ScoreMode,
    },
}

impl Query {
    /// Builds a match clause.
    pub fn match_query(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a `field > value` range clause.
    pub fn greater_than(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Range {
            field: field.into(),
            bound: RangeBound::GreaterThan(value.into()),
        }
    }

    /// Builds a `field < value` range clause.
    pub fn less_than(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Range {
            field: field.into(),
            bound: RangeBound::LessThan(value.into()),
        }
    }

    /// Scopes a clause to the nested collection at `path`.
    pub fn nested(path: impl Into<String>, query: Query, score_mode: ScoreMode) -> Self {
        Self::Nested {
            path: path.into(),
            query: Box::new(query),
            score_mode,
        }
    }

    /// Renders the query as search-engine JSON DSL.
    pub fn to_dsl(&self) -> Value {
        match self {
            Self::MatchAll => json!({ "match_all": {} }),
            Self::Match { field, value } => json!({ "match": { field: { "query": value } } }),
            Self::Range { field, bound } => {
                let op = match bound {
                    RangeBound::GreaterThan(_) => "gt",
                    RangeBound::LessThan(_) => "lt",
                };
                json!({ "range": { field: { op: bound.value() } } })
            }
            Self::Bool(bool_query) => {
                let mut body = serde_json::Map::new();
                if !bool_query.must.is_empty() {
                    body.insert(
                        "must".into(),
                        bool_query.must.iter().map(Query::to_dsl).collect(),
                    );
                }
                if !bool_query.must_not.is_empty() {
                    body.insert(
                        "must_not".into(),
                        bool_query.must_not.iter().map(Query::to_dsl).collect(),
                    );
                }
                json!({ "bool": body })
            }
            Self::Nested {
                path,
                query,
                score_mode,
            } => json!({
                "nested": {
                    "path": path,
                    "query": query.to_dsl(),
                    "score_mode": score_mode.as_str(),
                }
            }),
        }
    }
}

/// A query together with an optional page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: Query,
    pub pageable: Option<Pageable>,
}

impl SearchQuery {
    /// Creates an unpaged search.
    pub fn new(query: Query) -> Self {
        Self {
            query,
            pageable: None,
        }
    }

    /// Creates an unpaged search over every document.
    pub fn match_all() -> Self {
        Self::new(Query::MatchAll)
    }

    /// Restricts the search to one page.
    pub fn with_pageable(mut self, pageable: Pageable) -> Self {
        self.pageable = Some(pageable);
        self
    }
}
