//! Filter expression model and parser.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{QueryError, Result};

/// Separator between the clauses of a filter expression.
pub const CLAUSE_SEPARATOR: char = '&';

/// Comparison requested by one clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
}

impl QueryOperator {
    /// Operators in the order clauses are scanned for them. `!=` comes
    /// before `=` since it contains it.
    pub const PRECEDENCE: [QueryOperator; 4] = [
        QueryOperator::NotEquals,
        QueryOperator::Equals,
        QueryOperator::GreaterThan,
        QueryOperator::LessThan,
    ];

    /// Returns the literal token of this operator.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
        }
    }

    /// Finds the operator of a clause: the first operator, in precedence
    /// order, whose token occurs anywhere in the text.
    pub fn detect(clause: &str) -> Option<Self> {
        Self::PRECEDENCE
            .into_iter()
            .find(|operator| clause.contains(operator.token()))
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One parsed `field<op>value` clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryParameter {
    /// Dotted field path; a dot denotes a nested collection.
    pub field: String,
    pub value: String,
    pub operator: QueryOperator,
}

impl QueryParameter {
    pub fn new(field: impl Into<String>, operator: QueryOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator,
        }
    }

    /// Parses a single clause such as `age>20`.
    ///
    /// The clause is split at the first occurrence of the detected
    /// operator's token, so `a>b=c` reads as field `a>b`, value `c`.
    pub fn parse(clause: &str) -> Result<Self> {
        if clause.is_empty() {
            return Err(QueryError::MalformedFilterExpression(
                "empty clause".to_string(),
            ));
        }
        let operator = QueryOperator::detect(clause)
            .ok_or_else(|| QueryError::UnsupportedOperator(clause.to_string()))?;

        let (field, value) = clause
            .split_once(operator.token())
            .ok_or_else(|| QueryError::UnsupportedOperator(clause.to_string()))?;
        if field.is_empty() || value.is_empty() {
            return Err(QueryError::MalformedFilterExpression(format!(
                "clause {clause} needs both a field and a value"
            )));
        }

        Ok(Self::new(field, operator, value))
    }
}

impl fmt::Display for QueryParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.operator, self.value)
    }
}

/// Parses a `&`-separated filter expression, keeping clause order.
///
/// An empty expression yields no parameters.
pub fn parse_filter_expression(expression: &str) -> Result<Vec<QueryParameter>> {
    if expression.is_empty() {
        return Ok(Vec::new());
    }

    expression
        .split(CLAUSE_SEPARATOR)
        .map(QueryParameter::parse)
        .collect()
}
