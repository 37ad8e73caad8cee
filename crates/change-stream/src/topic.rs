use serde::{Deserialize, Serialize};

/// Name of a change topic, conventionally `<source>.<schema>.<TABLE_NAME>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicName(String);

impl TopicName {
    /// Creates a topic name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the topic name as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the trailing table segment, lower-cased.
    ///
    /// A name without separators is taken to be the table itself.
    pub fn table(&self) -> String {
        self.0
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }
}

impl std::fmt::Display for TopicName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TopicName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
