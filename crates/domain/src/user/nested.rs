use common::EntityId;
use serde::de::DeserializeOwned;

use super::{Address, AddressRow, Job, JobRow, UserDocument};
use crate::{EntitySet, Identified};

/// A sub-entity table whose rows are folded into a collection of the
/// owning [`UserDocument`].
pub trait NestedEntity: Identified + Clone + Send + Sync + 'static {
    /// Source table name, lower-case.
    const TABLE: &'static str;

    /// Row type carried by change-event images of [`Self::TABLE`].
    type Row: DeserializeOwned + Send;

    /// Identity of the sub-entity a row describes.
    fn row_id(row: &Self::Row) -> &EntityId;

    /// Identity of the owning user. Empty when the row has no owner.
    fn owner(row: &Self::Row) -> &EntityId;

    fn from_row(row: Self::Row) -> Self;

    fn collection_mut(user: &mut UserDocument) -> &mut EntitySet<Self>;
}

impl NestedEntity for Address {
    const TABLE: &'static str = "addresses";
    type Row = AddressRow;

    fn row_id(row: &AddressRow) -> &EntityId {
        &row.id
    }

    fn owner(row: &AddressRow) -> &EntityId {
        &row.user_id
    }

    fn from_row(row: AddressRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }

    fn collection_mut(user: &mut UserDocument) -> &mut EntitySet<Self> {
        &mut user.addresses
    }
}

impl NestedEntity for Job {
    const TABLE: &'static str = "jobs";
    type Row = JobRow;

    fn row_id(row: &JobRow) -> &EntityId {
        &row.id
    }

    fn owner(row: &JobRow) -> &EntityId {
        &row.user_id
    }

    fn from_row(row: JobRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }

    fn collection_mut(user: &mut UserDocument) -> &mut EntitySet<Self> {
        &mut user.jobs
    }
}
