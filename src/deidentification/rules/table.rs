//! Standard confidentiality table
//!
//! Exact rows are looked up by tag; rows whose tag is written with the `x` wildcard
//! become range rules. An exact row always wins over a range row.

use super::{open_table, table_error, tsv_reader};
use crate::deidentification::action::Action;
use crate::domain::errors::ConfigError;
use crate::domain::tag::{Tag, TagRange};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

const EMBEDDED_TABLE: &str = include_str!("../../../data/confidentiality_profile.tsv");

#[derive(Debug, Deserialize)]
struct StandardRow {
    #[serde(rename = "Tag")]
    tag: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Action", default)]
    action: String,
}

/// Result of a table lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMatch {
    pub action: Action,
    /// The match came from a wildcard range row
    pub from_range: bool,
}

/// Standard tag rule table
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    exact: HashMap<Tag, Action>,
    ranges: Vec<(TagRange, Action)>,
}

impl RuleTable {
    /// Table shipped with the crate (PS3.15 Annex E basic profile subset)
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_reader(EMBEDDED_TABLE.as_bytes(), "embedded confidentiality profile")
    }

    /// Loads a table from a TSV file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = open_table(path)?;
        Self::from_reader(file, &path.display().to_string())
    }

    /// Loads a table from TSV text; `source` names the input in error messages
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self, ConfigError> {
        let mut table = RuleTable::default();

        for result in tsv_reader(reader).deserialize::<StandardRow>() {
            let row = result.map_err(|e| table_error(source, e))?;
            if row.tag.is_empty() {
                continue;
            }
            let action: Action = row.action.parse()?;

            if TagRange::is_wildcard(&row.tag) {
                let range: TagRange = row.tag.parse()?;
                table.ranges.push((range, action));
            } else {
                let tag: Tag = row.tag.parse()?;
                if table.exact.insert(tag, action).is_some() {
                    tracing::debug!(tag = %tag, name = %row.name, "Duplicate standard table row, last one wins");
                }
            }
        }

        tracing::debug!(
            source = source,
            exact = table.exact.len(),
            ranges = table.ranges.len(),
            "Loaded confidentiality table"
        );
        Ok(table)
    }

    /// Exact lookup first, then the first matching range row in file order
    pub fn lookup(&self, tag: Tag) -> Option<TableMatch> {
        if let Some(action) = self.exact.get(&tag) {
            return Some(TableMatch {
                action: *action,
                from_range: false,
            });
        }
        self.ranges
            .iter()
            .find(|(range, _)| range.contains(tag))
            .map(|(_, action)| TableMatch {
                action: *action,
                from_range: true,
            })
    }

    /// Number of rules (exact and range)
    pub fn len(&self) -> usize {
        self.exact.len() + self.ranges.len()
    }

    /// Whether the table holds no rules
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
