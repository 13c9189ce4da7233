//! De-identification actions and their table codes

use crate::domain::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Action applied to one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// `K`: leave the value as is
    Keep,
    /// `X`: remove the element
    Delete,
    /// `Z`: replace with an empty value of the same VR
    Blank,
    /// `D`: replace with a non-identifying placeholder
    Dummy,
    /// `U`: replace with a deterministic pseudonymous identifier
    Pseudonymize,
}

impl Action {
    /// Single-letter code used in rule tables
    pub fn code(&self) -> char {
        match self {
            Action::Keep => 'K',
            Action::Delete => 'X',
            Action::Blank => 'Z',
            Action::Dummy => 'D',
            Action::Pseudonymize => 'U',
        }
    }

    /// Whether applying the action can change the tree
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Action::Keep)
    }

    /// Parses a profile action cell, where an empty cell means keep
    pub fn parse_or_keep(code: &str) -> Result<Self, ConfigError> {
        if code.trim().is_empty() {
            Ok(Action::Keep)
        } else {
            code.parse()
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Keep => "keep",
            Action::Delete => "delete",
            Action::Blank => "blank",
            Action::Dummy => "dummy",
            Action::Pseudonymize => "pseudonymize",
        };
        f.write_str(name)
    }
}

/// Parses an action code
///
/// Compound codes such as `X/Z` or `X/Z/D` take their first alternative, and a
/// trailing `*` marker is ignored.
impl FromStr for Action {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = s.split('/').next().unwrap_or_default().trim();
        let code = first.trim_end_matches('*');
        match code {
            "K" | "k" => Ok(Action::Keep),
            "X" | "x" => Ok(Action::Delete),
            "Z" | "z" => Ok(Action::Blank),
            "D" | "d" => Ok(Action::Dummy),
            "U" | "u" => Ok(Action::Pseudonymize),
            _ => Err(ConfigError::UnknownActionCode {
                code: s.to_string(),
            }),
        }
    }
}
