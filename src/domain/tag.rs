//! DICOM tag identifiers
//!
//! A [`Tag`] is a `(group, element)` pair. Tags are parsed strictly from hexadecimal
//! text; config-supplied strings are never evaluated in any other way.

use super::errors::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Attribute tag identifier
///
/// # Examples
///
/// ```
/// use dicom_deid::domain::Tag;
///
/// let tag: Tag = "(0010, 005A)".parse().unwrap();
/// assert_eq!(tag, Tag::new(0x0010, 0x005A));
/// assert_eq!(tag.to_string(), "(0010,005A)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    group: u16,
    element: u16,
}

impl Tag {
    /// Creates a tag from its group and element numbers
    pub const fn new(group: u16, element: u16) -> Self {
        Self { group, element }
    }

    /// Group number
    pub const fn group(&self) -> u16 {
        self.group
    }

    /// Element number
    pub const fn element(&self) -> u16 {
        self.element
    }

    /// Private tags live in odd groups
    pub const fn is_private(&self) -> bool {
        self.group % 2 == 1
    }

    /// Private creator slots are `(gggg,0001)` to `(gggg,00FF)` in an odd group
    pub const fn is_private_creator(&self) -> bool {
        self.is_private() && self.element >= 0x0001 && self.element <= 0x00FF
    }

    /// Tag of the private creator that reserves this element's block
    ///
    /// `(0019,100C)` is governed by `(0019,0010)`.
    pub const fn private_creator_tag(&self) -> Tag {
        Tag::new(self.group, (self.element & 0xFF00) >> 8)
    }

    /// Element offset inside its private block (`element & 0x00FF`)
    pub const fn private_block(&self) -> u8 {
        (self.element & 0x00FF) as u8
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.group, self.element)
    }
}

/// Splits `(gggg, eeee)`-style text into its two components
fn split_components(input: &str) -> Option<(String, String)> {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | ' ' | '\t'))
        .collect();
    let mut parts = cleaned.split(',');
    let first = parts.next()?.to_string();
    let second = parts.next()?.to_string();
    if parts.next().is_some() {
        return None;
    }
    Some((first, second))
}

fn parse_component(input: &str, component: &str) -> Result<u16, ConfigError> {
    let malformed = |reason: String| ConfigError::MalformedTag {
        input: input.to_string(),
        reason,
    };

    if component.is_empty() {
        return Err(malformed("empty component".to_string()));
    }
    if !component.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed(format!("'{component}' is not hexadecimal")));
    }
    if component.len() > 4 {
        return Err(malformed(format!("'{component}' exceeds 0xFFFF")));
    }
    u16::from_str_radix(component, 16).map_err(|e| malformed(e.to_string()))
}

impl FromStr for Tag {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, element) = split_components(s).ok_or_else(|| ConfigError::MalformedTag {
            input: s.to_string(),
            reason: "expected exactly two comma-separated components".to_string(),
        })?;
        Ok(Tag::new(
            parse_component(s, &group)?,
            parse_component(s, &element)?,
        ))
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive tag range written with the `x` wildcard convention
///
/// `(50xx,xxxx)` covers groups `0x5000..=0x50FF` and every element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagRange {
    lower: Tag,
    upper: Tag,
}

impl TagRange {
    /// Lowest tag covered by the range
    pub fn lower(&self) -> Tag {
        self.lower
    }

    /// Highest tag covered by the range
    pub fn upper(&self) -> Tag {
        self.upper
    }

    /// Whether the specification text uses the wildcard convention
    pub fn is_wildcard(spec: &str) -> bool {
        spec.chars().any(|c| c == 'x' || c == 'X')
    }

    /// Group and element are checked independently against their bounds
    pub fn contains(&self, tag: Tag) -> bool {
        (self.lower.group..=self.upper.group).contains(&tag.group)
            && (self.lower.element..=self.upper.element).contains(&tag.element)
    }
}

impl FromStr for TagRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ConfigError::MalformedRange {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let (group, element) =
            split_components(s).ok_or_else(|| malformed("expected two components"))?;

        let instantiate = |component: &str, digit: &str| component.replace(['x', 'X'], digit);
        let bound = |digit: &str| -> Result<Tag, ConfigError> {
            let g = instantiate(&group, digit);
            let e = instantiate(&element, digit);
            Ok(Tag::new(
                parse_component(s, &g).map_err(|_| malformed("invalid group"))?,
                parse_component(s, &e).map_err(|_| malformed("invalid element"))?,
            ))
        };

        Ok(TagRange {
            lower: bound("0")?,
            upper: bound("F")?,
        })
    }
}

impl fmt::Display for TagRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lower, self.upper)
    }
}
