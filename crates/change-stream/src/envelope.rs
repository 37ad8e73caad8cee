//! Typed change envelopes and their wire decoding.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ChangeStreamError, Result, TopicName};

/// Column name to value mapping of one row image.
///
/// Keys are lower-cased on decode so column lookups are case-insensitive.
pub type Fields = serde_json::Map<String, Value>;

/// Kind of row-level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Maps a wire operation code.
    ///
    /// `r` marks rows emitted by an initial table snapshot; they are
    /// projected the same way as inserts.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "c" | "r" => Some(Self::Create),
            "u" => Some(Self::Update),
            "d" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns the wire code for this operation.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Create => "c",
            Self::Update => "u",
            Self::Delete => "d",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// One row-level change decoded from the stream.
///
/// Envelopes are immutable once built. Create and Update always carry an
/// after-image; Delete always carries a before-image.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEnvelope {
    before: Option<Fields>,
    after: Option<Fields>,
    operation: Operation,
    source_table: String,
    source: Fields,
    event_timestamp: DateTime<Utc>,
}

impl ChangeEnvelope {
    /// Creates a new envelope builder.
    pub fn builder() -> ChangeEnvelopeBuilder {
        ChangeEnvelopeBuilder::default()
    }

    /// Decodes one raw stream message.
    ///
    /// Returns `Ok(None)` for tombstones (empty or `null` messages), which
    /// carry no change to apply.
    pub fn decode(topic: &TopicName, message: &[u8]) -> Result<Option<Self>> {
        if message.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let value: Value = serde_json::from_slice(message)
            .map_err(|e| ChangeStreamError::malformed(format!("invalid JSON: {e}")))?;
        Self::from_value(topic, value)
    }

    /// Decodes an already parsed message.
    ///
    /// Accepts both the `{ schema, payload }` wrapper and a bare payload.
    pub fn from_value(topic: &TopicName, value: Value) -> Result<Option<Self>> {
        let payload = match value {
            Value::Null => return Ok(None),
            Value::Object(mut message) if message.contains_key("payload") => {
                match message.remove("payload") {
                    Some(Value::Null) | None => return Ok(None),
                    Some(payload) => payload,
                }
            }
            Value::Object(message) if message.contains_key("op") => Value::Object(message),
            _ => {
                return Err(ChangeStreamError::malformed(
                    "message has neither a payload nor an operation",
                ));
            }
        };

        let payload: WirePayload = serde_json::from_value(payload)
            .map_err(|e| ChangeStreamError::malformed(format!("invalid payload: {e}")))?;
        payload.into_envelope(topic).map(Some)
    }

    /// Image of the row before the change.
    pub fn before(&self) -> Option<&Fields> {
        self.before.as_ref()
    }

    /// Image of the row after the change.
    pub fn after(&self) -> Option<&Fields> {
        self.after.as_ref()
    }

    /// Kind of change.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Lower-cased name of the table the row belongs to.
    pub fn source_table(&self) -> &str {
        &self.source_table
    }

    /// Source metadata block as emitted by the capture connector.
    pub fn source(&self) -> &Fields {
        &self.source
    }

    /// When the change was captured.
    pub fn event_timestamp(&self) -> DateTime<Utc> {
        self.event_timestamp
    }

    /// Row image that identifies the row for this operation: the
    /// after-image for Create/Update, the before-image for Delete.
    ///
    /// Always present for envelopes produced by the builder.
    pub fn current_image(&self) -> Option<&Fields> {
        match self.operation {
            Operation::Create | Operation::Update => self.after.as_ref(),
            Operation::Delete => self.before.as_ref(),
        }
    }

    /// Deserializes [`current_image`](Self::current_image) into a row type.
    pub fn current_row<T: DeserializeOwned>(&self) -> Result<T> {
        let image = self.current_image().cloned().ok_or_else(|| {
            ChangeStreamError::malformed(format!("{} event without a row image", self.operation))
        })?;
        serde_json::from_value(Value::Object(image)).map_err(|e| {
            ChangeStreamError::malformed(format!(
                "{} row does not match the expected shape: {e}",
                self.source_table
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
struct WirePayload {
    #[serde(default)]
    before: Option<Fields>,
    #[serde(default)]
    after: Option<Fields>,
    #[serde(default)]
    source: Option<Fields>,
    #[serde(default)]
    op: Option<String>,
    #[serde(default)]
    ts_ms: Option<i64>,
}

impl WirePayload {
    fn into_envelope(self, topic: &TopicName) -> Result<ChangeEnvelope> {
        let code = self
            .op
            .ok_or_else(|| ChangeStreamError::malformed("missing operation code"))?;
        let operation = Operation::from_code(&code).ok_or_else(|| {
            ChangeStreamError::malformed(format!("unrecognized operation code '{code}'"))
        })?;
        let ts_ms = self
            .ts_ms
            .ok_or_else(|| ChangeStreamError::malformed("missing event timestamp"))?;
        let event_timestamp = DateTime::from_timestamp_millis(ts_ms).ok_or_else(|| {
            ChangeStreamError::malformed(format!("event timestamp {ts_ms} is out of range"))
        })?;

        let source = self.source.unwrap_or_default();
        let source_table = source
            .get("table")
            .and_then(Value::as_str)
            .map(str::to_lowercase)
            .unwrap_or_else(|| topic.table());

        let mut builder = ChangeEnvelope::builder()
            .operation(operation)
            .source_table(source_table)
            .source(source)
            .event_timestamp(event_timestamp);
        if let Some(before) = self.before {
            builder = builder.before(before);
        }
        if let Some(after) = self.after {
            builder = builder.after(after);
        }
        builder.build()
    }
}

/// Builder for constructing change envelopes.
#[derive(Debug, Default)]
pub struct ChangeEnvelopeBuilder {
    before: Option<Fields>,
    after: Option<Fields>,
    operation: Option<Operation>,
    source_table: Option<String>,
    source: Fields,
    event_timestamp: Option<DateTime<Utc>>,
}

impl ChangeEnvelopeBuilder {
    /// Sets the before-image. Column names are lower-cased.
    pub fn before(mut self, fields: Fields) -> Self {
        self.before = Some(lower_case_keys(fields));
        self
    }

    /// Sets the after-image. Column names are lower-cased.
    pub fn after(mut self, fields: Fields) -> Self {
        self.after = Some(lower_case_keys(fields));
        self
    }

    /// Sets the before-image from a JSON object; other values are ignored.
    pub fn before_json(self, value: Value) -> Self {
        match value {
            Value::Object(fields) => self.before(fields),
            _ => self,
        }
    }

    /// Sets the after-image from a JSON object; other values are ignored.
    pub fn after_json(self, value: Value) -> Self {
        match value {
            Value::Object(fields) => self.after(fields),
            _ => self,
        }
    }

    /// Sets the operation.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Sets the source table. Stored lower-cased.
    pub fn source_table(mut self, table: impl Into<String>) -> Self {
        self.source_table = Some(table.into().to_lowercase());
        self
    }

    /// Sets the connector's source metadata block.
    pub fn source(mut self, source: Fields) -> Self {
        self.source = source;
        self
    }

    /// Sets the event timestamp. If not set, the current time is used.
    pub fn event_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.event_timestamp = Some(timestamp);
        self
    }

    /// Sets the event timestamp from epoch milliseconds.
    pub fn event_timestamp_millis(mut self, millis: i64) -> Self {
        self.event_timestamp = DateTime::from_timestamp_millis(millis);
        self
    }

    /// Validates and builds the envelope.
    pub fn build(self) -> Result<ChangeEnvelope> {
        let operation = self
            .operation
            .ok_or_else(|| ChangeStreamError::malformed("missing operation"))?;

        match operation {
            Operation::Create | Operation::Update if self.after.is_none() => {
                return Err(ChangeStreamError::malformed(format!(
                    "{operation} event without an after-image"
                )));
            }
            Operation::Delete if self.before.is_none() => {
                return Err(ChangeStreamError::malformed(
                    "delete event without a before-image",
                ));
            }
            _ => {}
        }

        Ok(ChangeEnvelope {
            before: self.before,
            after: self.after,
            operation,
            source_table: self.source_table.unwrap_or_default(),
            source: self.source,
            event_timestamp: self.event_timestamp.unwrap_or_else(Utc::now),
        })
    }
}

fn lower_case_keys(fields: Fields) -> Fields {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect()
}
