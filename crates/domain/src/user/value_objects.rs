//! Sub-entities nested inside a user document.

use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize};

use crate::Identified;

/// A postal address owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: EntityId,
    pub name: Option<String>,
}

impl Identified for Address {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// A position held by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: EntityId,
    pub name: Option<String>,
    pub description: Option<String>,

    /// Serialized as RFC 3339 so textual range queries compare chronologically.
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Identified for Job {
    fn id(&self) -> &EntityId {
        &self.id
    }
}
