//! Forced values: literal substitutions that bypass every other rule

use crate::domain::errors::ConfigError;
use crate::domain::tag::Tag;
use std::collections::{BTreeMap, HashMap};

/// Patient's Name, overwritten with the subject identifier when one is supplied
pub const PATIENT_NAME: Tag = Tag::new(0x0010, 0x0010);

/// Per-invocation tag to literal overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForcedValues {
    values: BTreeMap<Tag, String>,
}

impl ForcedValues {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `tag -> literal` map as found in the configuration file
    pub fn from_config(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut forced = ForcedValues::new();
        for (tag, value) in map {
            forced.insert(tag.parse()?, value.clone());
        }
        Ok(forced)
    }

    /// Adds or replaces a forced value
    pub fn insert(&mut self, tag: Tag, value: impl Into<String>) {
        self.values.insert(tag, value.into());
    }

    /// Forces the patient name to the subject identifier
    pub fn with_subject(mut self, subject: &str) -> Self {
        self.insert(PATIENT_NAME, subject);
        self
    }

    /// Literal for `tag`
    pub fn get(&self, tag: Tag) -> Option<&str> {
        self.values.get(&tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
