use async_trait::async_trait;
use change_stream::{ChangeEnvelope, Operation};
use common::EntityId;
use document_store::{DocumentStore, Repository};
use domain::{UserDocument, UserRow, UserTombstone};

use crate::{AggregateLocks, Outcome, ProjectionError, Projector, Result};

/// Projects the `users` table onto the scalar attributes of user documents.
///
/// Create and Update replace `name` and `age` but keep the nested
/// collections. An own-row change older than the last one applied is
/// ignored. Delete removes the whole document and leaves a tombstone so a
/// late change older than the deletion cannot bring the user back.
pub struct UserProjector<S> {
    users: Repository<UserDocument, S>,
    tombstones: Repository<UserTombstone, S>,
    locks: AggregateLocks,
}

impl<S: DocumentStore + Clone> UserProjector<S> {
    pub fn new(store: S, locks: AggregateLocks) -> Self {
        Self {
            users: Repository::new(store.clone()),
            tombstones: Repository::new(store),
            locks,
        }
    }

    fn row(envelope: &ChangeEnvelope) -> Result<UserRow> {
        let row: UserRow = envelope.current_row()?;
        if row.id.is_empty() {
            return Err(ProjectionError::MalformedEnvelope(
                "users row without an id".to_string(),
            ));
        }
        Ok(row)
    }
}

#[async_trait]
impl<S: DocumentStore + Clone> Projector for UserProjector<S> {
    fn table(&self) -> &'static str {
        UserDocument::TABLE
    }

    fn aggregate_key(&self, envelope: &ChangeEnvelope) -> Result<EntityId> {
        Ok(Self::row(envelope)?.id)
    }

    #[tracing::instrument(skip(self, envelope), fields(operation = %envelope.operation()))]
    async fn apply(&self, envelope: &ChangeEnvelope) -> Result<Outcome> {
        let row = Self::row(envelope)?;
        let id = row.id.clone();
        let _guard = self.locks.lock(&id).await;

        match envelope.operation() {
            Operation::Create | Operation::Update => {
                let source_ts_ms = envelope.event_timestamp().timestamp_millis();
                let document = match self.users.find_by_id(&id).await? {
                    Some(mut existing) => {
                        if existing.is_stale(source_ts_ms) {
                            tracing::warn!(
                                aggregate_id = %id,
                                source_ts_ms,
                                last_applied = ?existing.source_ts_ms,
                                "ignoring stale user change"
                            );
                            return Ok(Outcome::Ignored("stale"));
                        }
                        existing.apply_row(row, source_ts_ms);
                        existing
                    }
                    None => {
                        if let Some(tombstone) = self.tombstones.find_by_id(&id).await? {
                            if tombstone.supersedes(source_ts_ms) {
                                tracing::warn!(
                                    aggregate_id = %id,
                                    source_ts_ms,
                                    deleted_ts_ms = tombstone.deleted_ts_ms,
                                    "ignoring change older than user deletion"
                                );
                                return Ok(Outcome::Ignored("stale"));
                            }
                            self.tombstones.delete_by_id(&id).await?;
                        }
                        UserDocument::from_row(row, source_ts_ms)
                    }
                };
                self.users.save(&document).await?;
                tracing::debug!(aggregate_id = %id, "user saved");
            }
            Operation::Delete => {
                let deleted_ts_ms = envelope.event_timestamp().timestamp_millis();
                let tombstone = UserTombstone::new(id.clone(), deleted_ts_ms)
                    .merge(self.tombstones.find_by_id(&id).await?);
                self.tombstones.save(&tombstone).await?;
                let removed = self.users.delete_by_id(&id).await?;
                tracing::debug!(aggregate_id = %id, removed, deleted_ts_ms, "user deleted");
            }
        }

        Ok(Outcome::Applied)
    }
}
