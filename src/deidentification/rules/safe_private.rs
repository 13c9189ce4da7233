//! Safe-private registry
//!
//! Maps a private creator name to the `(group, block)` pairs of its private attributes
//! that are known not to carry identifying data. The block is the element's low byte,
//! so `(0019,xx0C)` and `(0019,100C)` both register block `0x0C` in group `0x0019`.

use super::{open_table, table_error, tsv_reader};
use crate::domain::errors::ConfigError;
use crate::domain::tag::Tag;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

const EMBEDDED_REGISTRY: &str = include_str!("../../../data/safe_private.tsv");

#[derive(Debug, Deserialize)]
struct SafePrivateRow {
    #[serde(rename = "Tag")]
    tag: String,
    #[serde(rename = "Private Creator", default)]
    creator: String,
}

/// Whitelist of vendor private attributes
#[derive(Debug, Clone, Default)]
pub struct SafePrivateRegistry {
    owners: HashMap<String, HashSet<(u16, u8)>>,
}

impl SafePrivateRegistry {
    /// Registry shipped with the crate
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_reader(EMBEDDED_REGISTRY.as_bytes(), "embedded safe-private table")
    }

    /// Loads a registry from a TSV file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = open_table(path)?;
        Self::from_reader(file, &path.display().to_string())
    }

    /// Loads a registry from TSV text
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self, ConfigError> {
        let mut registry = SafePrivateRegistry::default();

        for result in tsv_reader(reader).deserialize::<SafePrivateRow>() {
            let row = result.map_err(|e| table_error(source, e))?;
            if row.tag.is_empty() {
                continue;
            }
            if row.creator.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Safe-private row {} in {source} has no private creator",
                    row.tag
                )));
            }
            // The block placeholder is irrelevant, only the low byte is kept
            let tag: Tag = row.tag.replace(['x', 'X'], "0").parse()?;
            registry.allow(&row.creator, tag.group(), tag.private_block());
        }

        tracing::debug!(
            source = source,
            creators = registry.owners.len(),
            "Loaded safe-private registry"
        );
        Ok(registry)
    }

    /// Registers `(group, block)` as safe for `owner`
    pub fn allow(&mut self, owner: &str, group: u16, block: u8) {
        self.owners
            .entry(owner.trim().to_string())
            .or_default()
            .insert((group, block));
    }

    /// Whether the creator name appears in the registry at all
    pub fn is_known(&self, owner: &str) -> bool {
        self.owners.contains_key(owner.trim())
    }

    /// Whether `(group, block)` is whitelisted for `owner`
    pub fn is_allowed(&self, owner: &str, group: u16, block: u8) -> bool {
        self.owners
            .get(owner.trim())
            .is_some_and(|allowed| allowed.contains(&(group, block)))
    }

    /// Number of registered creator names
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether no creator is registered
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
