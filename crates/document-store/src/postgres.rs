use async_trait::async_trait;
use common::EntityId;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{BoolQuery, DocumentStore, Page, Query, RangeBound, Result, SearchQuery};

/// PostgreSQL-backed document store.
///
/// Documents are stored as JSONB in the `documents` table, keyed by
/// `(index_name, id)`. Structured queries compile to SQL predicates over
/// `jsonb_path_query`, so dotted field names reach into nested arrays.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, index: &str, id: &EntityId) -> Result<Option<Value>> {
        let body = sqlx::query_scalar("SELECT body FROM documents WHERE index_name = $1 AND id = $2")
            .bind(index)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(body)
    }

    async fn upsert(&self, index: &str, id: &EntityId, document: Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (index_name, id, body, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (index_name, id) DO UPDATE
            SET body = EXCLUDED.body, updated_at = now()
            "#,
        )
        .bind(index)
        .bind(id.as_str())
        .bind(document)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, index: &str, id: &EntityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE index_name = $1 AND id = $2")
            .bind(index)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, query), fields(index = %index))]
    async fn search(&self, index: &str, query: &SearchQuery) -> Result<Page<Value>> {
        let mut select = QueryBuilder::<Postgres>::new("SELECT body FROM documents WHERE ");
        push_filter(&mut select, index, &query.query);
        select.push(r#" ORDER BY id COLLATE "C""#);

        if let Some(pageable) = query.pageable {
            select.push(" LIMIT ");
            select.push_bind(i64::from(pageable.size()));
            select.push(" OFFSET ");
            select.push_bind(i64::try_from(pageable.offset()).unwrap_or(i64::MAX));
        }

        let content: Vec<Value> = select
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;

        let Some(pageable) = query.pageable else {
            return Ok(Page::unpaged(content));
        };

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents WHERE ");
        push_filter(&mut count, index, &query.query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        tracing::debug!(hits = content.len(), total, "search completed");
        Ok(Page::new(
            content,
            u64::try_from(total).unwrap_or_default(),
            pageable,
        ))
    }

    async fn count(&self, index: &str) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE index_name = $1")
            .bind(index)
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(total).unwrap_or_default())
    }
}

fn push_filter(builder: &mut QueryBuilder<'static, Postgres>, index: &str, query: &Query) {
    builder.push("index_name = ");
    builder.push_bind(index.to_string());
    builder.push(" AND ");
    let mut compiler = PredicateCompiler::default();
    compiler.push(builder, query, "body", None);
}

/// Renders a dotted field name as a lax SQL/JSON path that also unwraps
/// a trailing array, e.g. `jobs.name` becomes `lax $."jobs"."name"[*]`.
fn json_path(field: &str) -> String {
    let mut path = String::from("lax $");
    for segment in field.split('.') {
        path.push_str(".\"");
        for c in segment.chars() {
            if c == '"' || c == '\\' {
                path.push('\\');
            }
            path.push(c);
        }
        path.push('"');
    }
    path.push_str("[*]");
    path
}

fn relative<'a>(field: &'a str, scope: Option<&str>) -> &'a str {
    scope
        .and_then(|prefix| field.strip_prefix(prefix))
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(field)
}

/// Compiles [`Query`] trees into SQL, handing out unique aliases for the
/// correlated subqueries it emits.
#[derive(Default)]
struct PredicateCompiler {
    aliases: usize,
}

impl PredicateCompiler {
    fn alias(&mut self, prefix: &str) -> String {
        self.aliases += 1;
        format!("{prefix}{}", self.aliases)
    }

    fn push(
        &mut self,
        builder: &mut QueryBuilder<'static, Postgres>,
        query: &Query,
        node: &str,
        scope: Option<&str>,
    ) {
        match query {
            Query::MatchAll => {
                builder.push("TRUE");
            }
            Query::Match { field, value } => {
                let leaf = self.open_leaf(builder, node, relative(field, scope));
                builder.push(format!(
                    "jsonb_typeof({leaf}) IN ('string', 'number', 'boolean') \
                     AND to_tsvector('simple', {leaf} #>> '{{}}') @@ plainto_tsquery('simple', "
                ));
                builder.push_bind(value.clone());
                builder.push("))");
            }
            Query::Range { field, bound } => {
                let leaf = self.open_leaf(builder, node, relative(field, scope));
                let op = match bound {
                    RangeBound::GreaterThan(_) => ">",
                    RangeBound::LessThan(_) => "<",
                };
                match bound.value().trim().parse::<f64>() {
                    Ok(limit) => {
                        builder.push(format!(
                            "jsonb_typeof({leaf}) = 'number' AND ({leaf} #>> '{{}}')::float8 {op} "
                        ));
                        builder.push_bind(limit);
                    }
                    Err(_) => {
                        builder.push(format!(
                            "jsonb_typeof({leaf}) IN ('string', 'number', 'boolean') \
                             AND ({leaf} #>> '{{}}') COLLATE \"C\" {op} "
                        ));
                        builder.push_bind(bound.value().to_string());
                    }
                }
                builder.push(")");
            }
            Query::Bool(BoolQuery { must, must_not }) => {
                builder.push("(TRUE");
                for clause in must {
                    builder.push(" AND (");
                    self.push(builder, clause, node, scope);
                    builder.push(")");
                }
                for clause in must_not {
                    builder.push(" AND NOT (");
                    self.push(builder, clause, node, scope);
                    builder.push(")");
                }
                builder.push(")");
            }
            Query::Nested { path, query, .. } => {
                let alias = self.alias("n");
                let element = format!("{alias}.elem");
                builder.push(format!("EXISTS (SELECT 1 FROM jsonb_path_query({node}, "));
                builder.push_bind(json_path(relative(path, scope)));
                builder.push(format!(
                    "::jsonpath) AS {alias}(elem) WHERE jsonb_typeof({element}) = 'object' AND "
                ));
                self.push(builder, query, &element, Some(path));
                builder.push(")");
            }
        }
    }

    /// Opens an `EXISTS` over the leaf values at `field` and returns the
    /// expression naming one leaf. The caller closes the parenthesis.
    fn open_leaf(
        &mut self,
        builder: &mut QueryBuilder<'static, Postgres>,
        node: &str,
        field: &str,
    ) -> String {
        let alias = self.alias("v");
        builder.push(format!("EXISTS (SELECT 1 FROM jsonb_path_query({node}, "));
        builder.push_bind(json_path(field));
        builder.push(format!("::jsonpath) AS {alias}(val) WHERE "));
        format!("{alias}.val")
    }
}
