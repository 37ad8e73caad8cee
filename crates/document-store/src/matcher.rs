//! Evaluation of [`Query`] against JSON documents held in memory.
//!
//! - `match`: every lower-cased alphanumeric token of the query value
//!   occurs among the tokens of the field's text
//! - `range`: numeric comparison when the bound is numeric (fields that are
//!   not JSON numbers never match), byte-wise text comparison otherwise
//! - missing fields never satisfy a positive clause

use std::cmp::Ordering;

use serde_json::Value;

use crate::{BoolQuery, Query, RangeBound};

/// Returns true when `document` satisfies `query`.
pub fn matches(query: &Query, document: &Value) -> bool {
    evaluate(query, document, None)
}

fn evaluate(query: &Query, node: &Value, scope: Option<&str>) -> bool {
    match query {
        Query::MatchAll => true,
        Query::Match { field, value } => resolve(node, relative(field, scope))
            .into_iter()
            .any(|leaf| text_matches(leaf, value)),
        Query::Range { field, bound } => resolve(node, relative(field, scope))
            .into_iter()
            .any(|leaf| range_matches(leaf, bound)),
        Query::Bool(BoolQuery { must, must_not }) => {
            must.iter().all(|q| evaluate(q, node, scope))
                && !must_not.iter().any(|q| evaluate(q, node, scope))
        }
        Query::Nested { path, query, .. } => nested_elements(node, relative(path, scope))
            .into_iter()
            .any(|element| evaluate(query, element, Some(path))),
    }
}

/// Strips the enclosing nested path from a field name.
fn relative<'a>(field: &'a str, scope: Option<&str>) -> &'a str {
    scope
        .and_then(|prefix| field.strip_prefix(prefix))
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(field)
}

/// Collects the leaf values at a dotted path, flattening arrays on the way.
fn resolve<'a>(node: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![node];
    for segment in path.split('.') {
        current = current
            .into_iter()
            .flat_map(|value| match value {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .filter_map(|value| value.get(segment))
            .collect();
    }

    current
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .filter(|value| !value.is_null())
        .collect()
}

fn nested_elements<'a>(node: &'a Value, path: &str) -> Vec<&'a Value> {
    resolve(node, path)
        .into_iter()
        .filter(|value| value.is_object())
        .collect()
}

fn leaf_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Splits text into lower-cased alphanumeric tokens.
pub(crate) fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn text_matches(leaf: &Value, value: &str) -> bool {
    let Some(text) = leaf_text(leaf) else {
        return false;
    };
    let wanted = tokens(value);
    if wanted.is_empty() {
        return false;
    }
    let present = tokens(&text);
    wanted.iter().all(|token| present.contains(token))
}

fn leaf_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

fn range_matches(leaf: &Value, bound: &RangeBound) -> bool {
    let target = bound.value();
    let ordering = match target.trim().parse::<f64>() {
        Ok(limit) => match leaf_number(leaf) {
            Some(number) => number.partial_cmp(&limit),
            None => None,
        },
        Err(_) => leaf_text(leaf).map(|text| text.as_str().cmp(target)),
    };

    match (bound, ordering) {
        (RangeBound::GreaterThan(_), Some(Ordering::Greater)) => true,
        (RangeBound::LessThan(_), Some(Ordering::Less)) => true,
        _ => false,
    }
}
