use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Result, TopicName,
    stream::{ChangeRecord, ChangeStream, Offset},
};

/// In-memory change stream for tests and local runs.
///
/// Records are kept in a single ordered log shared by every topic, like a
/// consumer subscribed to several topics at once.
#[derive(Clone, Default)]
pub struct InMemoryChangeStream {
    records: Arc<RwLock<Vec<ChangeRecord>>>,
    committed: Arc<RwLock<Option<Offset>>>,
}

impl InMemoryChangeStream {
    /// Creates a new empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw message and returns its offset.
    pub async fn publish(&self, topic: impl Into<TopicName>, message: impl Into<Vec<u8>>) -> Offset {
        let mut records = self.records.write().await;
        let offset = records
            .last()
            .map(|r| r.offset.next())
            .unwrap_or(Offset::new(1));
        records.push(ChangeRecord {
            topic: topic.into(),
            offset,
            message: message.into(),
        });
        offset
    }

    /// Appends a JSON message and returns its offset.
    pub async fn publish_json(
        &self,
        topic: impl Into<TopicName>,
        message: &serde_json::Value,
    ) -> Offset {
        self.publish(topic, message.to_string()).await
    }

    /// Returns the total number of records ever published.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true when nothing has been published.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Returns how many records follow the committed offset.
    pub async fn lag(&self) -> usize {
        let committed = *self.committed.read().await;
        self.records
            .read()
            .await
            .iter()
            .filter(|r| committed.is_none_or(|c| r.offset > c))
            .count()
    }
}

#[async_trait]
impl ChangeStream for InMemoryChangeStream {
    async fn poll(&self, max_records: usize) -> Result<Vec<ChangeRecord>> {
        let committed = *self.committed.read().await;
        let records = self.records.read().await;

        Ok(records
            .iter()
            .filter(|r| committed.is_none_or(|c| r.offset > c))
            .take(max_records)
            .cloned()
            .collect())
    }

    async fn commit(&self, offset: Offset) -> Result<()> {
        let mut committed = self.committed.write().await;
        if committed.is_none_or(|c| offset > c) {
            *committed = Some(offset);
        }
        Ok(())
    }

    async fn committed(&self) -> Result<Option<Offset>> {
        Ok(*self.committed.read().await)
    }
}
