use std::marker::PhantomData;

use async_trait::async_trait;
use change_stream::{ChangeEnvelope, Operation};
use common::EntityId;
use document_store::{Document, DocumentStore, Repository};
use domain::{Address, Job, NestedEntity, UserDocument};

use crate::{AggregateLocks, Outcome, ProjectionError, Projector, Result};

/// Projects a sub-entity table onto a nested collection of the owning
/// user document.
///
/// Create and Update upsert the entity by id, Delete removes it. Rows
/// without an owner are ignored; rows whose owner has no document fail
/// with [`ProjectionError::AggregateNotFound`].
pub struct NestedProjector<E, S> {
    users: Repository<UserDocument, S>,
    locks: AggregateLocks,
    _entity: PhantomData<fn() -> E>,
}

/// Projector for the `addresses` table.
pub type AddressProjector<S> = NestedProjector<Address, S>;

/// Projector for the `jobs` table.
pub type JobProjector<S> = NestedProjector<Job, S>;

impl<E: NestedEntity, S: DocumentStore> NestedProjector<E, S> {
    pub fn new(store: S, locks: AggregateLocks) -> Self {
        Self {
            users: Repository::new(store),
            locks,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: NestedEntity, S: DocumentStore> Projector for NestedProjector<E, S> {
    fn table(&self) -> &'static str {
        E::TABLE
    }

    fn aggregate_key(&self, envelope: &ChangeEnvelope) -> Result<EntityId> {
        let row: E::Row = envelope.current_row()?;
        Ok(E::owner(&row).clone())
    }

    #[tracing::instrument(skip(self, envelope), fields(table = E::TABLE, operation = %envelope.operation()))]
    async fn apply(&self, envelope: &ChangeEnvelope) -> Result<Outcome> {
        let row: E::Row = envelope.current_row()?;
        let owner = E::owner(&row).clone();
        if owner.is_empty() {
            tracing::debug!(entity_id = %E::row_id(&row), "row has no owner, nothing to update");
            return Ok(Outcome::Ignored("missing_owner"));
        }

        let _guard = self.locks.lock(&owner).await;
        let mut user = self.users.find_by_id(&owner).await?.ok_or_else(|| {
            ProjectionError::AggregateNotFound {
                index: UserDocument::INDEX,
                id: owner.clone(),
            }
        })?;

        let changed = match envelope.operation() {
            Operation::Create | Operation::Update => {
                let entity = E::from_row(row);
                E::collection_mut(&mut user).upsert(entity);
                true
            }
            Operation::Delete => E::collection_mut(&mut user)
                .remove(E::row_id(&row))
                .is_some(),
        };

        if changed {
            self.users.save(&user).await?;
        }
        tracing::debug!(aggregate_id = %owner, changed, "nested collection updated");

        Ok(Outcome::Applied)
    }
}
