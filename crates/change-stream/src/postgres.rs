use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Result, TopicName,
    stream::{ChangeRecord, ChangeStream, Offset},
};

/// Advisory lock key serializing writers of `change_events`.
const PUBLISH_LOCK_KEY: i64 = 0x6364_635f_7075_62;

/// PostgreSQL-backed change stream.
///
/// Messages live in `change_events`; each consumer group keeps its own
/// checkpoint in `consumer_checkpoints`.
///
/// Consumers read `position > checkpoint`, so positions must become
/// visible in ascending order. Writers take a transaction-scoped advisory
/// lock before drawing a position, which makes commit order match
/// position order. Producers must go through [`publish`](Self::publish)
/// or [`publish_in`](Self::publish_in).
#[derive(Clone)]
pub struct PostgresChangeStream {
    pool: PgPool,
    consumer_group: String,
}

impl PostgresChangeStream {
    /// Creates a stream reader for the given consumer group.
    pub fn new(pool: PgPool, consumer_group: impl Into<String>) -> Self {
        Self {
            pool,
            consumer_group: consumer_group.into(),
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Appends a message to the stream and returns its offset.
    pub async fn publish(&self, topic: &TopicName, message: &str) -> Result<Offset> {
        let mut tx = self.pool.begin().await?;
        let offset = Self::publish_in(&mut tx, topic, message).await?;
        tx.commit().await?;

        Ok(offset)
    }

    /// Appends a message inside the caller's transaction.
    ///
    /// Other writers block until `tx` ends, so the message becomes visible
    /// before any later position does.
    pub async fn publish_in(
        tx: &mut Transaction<'_, Postgres>,
        topic: &TopicName,
        message: &str,
    ) -> Result<Offset> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(PUBLISH_LOCK_KEY)
            .execute(&mut **tx)
            .await?;

        let position: i64 = sqlx::query_scalar(
            "INSERT INTO change_events (topic, message) VALUES ($1, $2) RETURNING position",
        )
        .bind(topic.as_str())
        .bind(message)
        .fetch_one(&mut **tx)
        .await?;

        Ok(Offset::new(position))
    }

    fn row_to_record(row: PgRow) -> Result<ChangeRecord> {
        let topic: String = row.try_get("topic")?;
        let message: String = row.try_get("message")?;

        Ok(ChangeRecord {
            topic: TopicName::new(topic),
            offset: Offset::new(row.try_get("position")?),
            message: message.into_bytes(),
        })
    }
}

#[async_trait]
impl ChangeStream for PostgresChangeStream {
    async fn poll(&self, max_records: usize) -> Result<Vec<ChangeRecord>> {
        let limit = i64::try_from(max_records).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r#"
            SELECT position, topic, message
            FROM change_events
            WHERE position > COALESCE(
                (SELECT position FROM consumer_checkpoints WHERE consumer_group = $1),
                0
            )
            ORDER BY position
            LIMIT $2
            "#,
        )
        .bind(&self.consumer_group)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn commit(&self, offset: Offset) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO consumer_checkpoints (consumer_group, position, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (consumer_group) DO UPDATE
            SET position = GREATEST(consumer_checkpoints.position, EXCLUDED.position),
                updated_at = now()
            "#,
        )
        .bind(&self.consumer_group)
        .bind(offset.as_i64())
        .execute(&self.pool)
        .await?;

        tracing::debug!(consumer_group = %self.consumer_group, %offset, "checkpoint committed");
        Ok(())
    }

    async fn committed(&self) -> Result<Option<Offset>> {
        let position: Option<i64> = sqlx::query_scalar(
            "SELECT position FROM consumer_checkpoints WHERE consumer_group = $1",
        )
        .bind(&self.consumer_group)
        .fetch_optional(&self.pool)
        .await?;

        Ok(position.map(Offset::new))
    }
}
