//! Site configuration profiles
//!
//! A profile overrides the standard table per tag. An entry may require the governing
//! private creator to carry one of several owner names; repeated rows for the same tag
//! accumulate those names so that one profile can serve several vendors.

use super::{open_table, table_error, tsv_reader};
use crate::deidentification::action::Action;
use crate::domain::errors::ConfigError;
use crate::domain::tag::Tag;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(rename = "Tag")]
    tag: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Action", default)]
    action: String,
    #[serde(rename = "Private Creator", default)]
    creator: String,
}

/// One profile entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub action: Action,
    /// Accepted owner names; `None` means the entry applies unconditionally
    pub owners: Option<Vec<String>>,
}

impl ProfileEntry {
    /// Whether `owner` satisfies the owner requirement
    ///
    /// An entry without requirement accepts any owner, including none.
    pub fn accepts(&self, owner: Option<&str>) -> bool {
        match (&self.owners, owner) {
            (None, _) => true,
            (Some(names), Some(owner)) => names.iter().any(|name| name == owner.trim()),
            (Some(_), None) => false,
        }
    }

    /// Whether the entry carries an owner requirement
    pub fn has_owner_requirement(&self) -> bool {
        self.owners.is_some()
    }
}

/// Site override table
#[derive(Debug, Clone, Default)]
pub struct ConfigProfile {
    name: String,
    entries: HashMap<Tag, ProfileEntry>,
}

impl ConfigProfile {
    /// Profile without entries
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Loads `<profiles_dir>/<name>.tsv`
    pub fn load(profiles_dir: &Path, name: &str) -> Result<Self, ConfigError> {
        let path = profiles_dir.join(format!("{name}.tsv"));
        if !path.is_file() {
            return Err(ConfigError::ProfileNotFound {
                name: name.to_string(),
            });
        }
        let file = open_table(&path)?;
        Self::from_reader(name, file, &path.display().to_string())
    }

    /// Parses profile rows from TSV text
    pub fn from_reader<R: Read>(name: &str, reader: R, source: &str) -> Result<Self, ConfigError> {
        let mut profile = ConfigProfile::empty(name);

        for result in tsv_reader(reader).deserialize::<ProfileRow>() {
            let row = result.map_err(|e| table_error(source, e))?;
            if row.tag.is_empty() {
                continue;
            }
            let tag: Tag = row.tag.parse()?;
            let action = Action::parse_or_keep(&row.action)?;
            let owner = (!row.creator.is_empty()).then_some(row.creator.as_str());
            profile.add(tag, action, owner).inspect_err(|_| {
                tracing::debug!(tag = %tag, name = %row.name, "Conflicting profile row");
            })?;
        }

        tracing::debug!(
            profile = name,
            source = source,
            entries = profile.entries.len(),
            "Loaded configuration profile"
        );
        Ok(profile)
    }

    /// Builds a profile from keep/delete shorthand lists
    pub fn from_lists(name: &str, keep: &[Tag], delete: &[Tag]) -> Result<Self, ConfigError> {
        let mut profile = ConfigProfile::empty(name);
        for tag in keep {
            profile.add(*tag, Action::Keep, None)?;
        }
        for tag in delete {
            profile.add(*tag, Action::Delete, None)?;
        }
        Ok(profile)
    }

    /// Adds a rule, merging owner names with an existing entry for the same tag
    ///
    /// A row without owner lifts the requirement for the whole entry. Two rows with
    /// different actions for the same tag are rejected.
    pub fn add(&mut self, tag: Tag, action: Action, owner: Option<&str>) -> Result<(), ConfigError> {
        let owner = owner.map(|o| o.trim().to_string());

        match self.entries.get_mut(&tag) {
            None => {
                self.entries.insert(
                    tag,
                    ProfileEntry {
                        action,
                        owners: owner.map(|o| vec![o]),
                    },
                );
            }
            Some(entry) => {
                if entry.action != action {
                    return Err(ConfigError::Invalid(format!(
                        "Profile {} assigns both '{}' and '{}' to {tag}",
                        self.name,
                        entry.action.code(),
                        action.code()
                    )));
                }
                match (&mut entry.owners, owner) {
                    (Some(names), Some(owner)) => {
                        if !names.contains(&owner) {
                            names.push(owner);
                        }
                    }
                    (owners, None) => *owners = None,
                    (None, Some(_)) => {}
                }
            }
        }
        Ok(())
    }

    /// Entry for `tag`
    pub fn get(&self, tag: Tag) -> Option<&ProfileEntry> {
        self.entries.get(&tag)
    }

    /// Profile name, recorded in the provenance element
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the profile has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PROFILE: &str = "Tag\tName\tAction\tPrivate Creator\n\
        (0008,0032)\tAcquisition Time\t\t\n\
        (0010,0010)\tPatient's Name\tZ\n\
        (2005,101D)\tNumber of Slices\tK\tPhilips MR Imaging DD 001\n\
        (2005,101D)\tNumber of Slices\tK\tPhilips MR Imaging DD 005\n";

    #[test]
    fn test_profile_rows() {
        let profile = ConfigProfile::from_reader("site", PROFILE.as_bytes(), "test").unwrap();
        assert_eq!(profile.name(), "site");
        assert_eq!(profile.len(), 3);

        let entry = profile.get(Tag::new(0x0008, 0x0032)).unwrap();
        assert_eq!(entry.action, Action::Keep);
        assert!(!entry.has_owner_requirement());

        let entry = profile.get(Tag::new(0x0010, 0x0010)).unwrap();
        assert_eq!(entry.action, Action::Blank);
    }

    #[test]
    fn test_repeated_rows_accumulate_owners() {
        let profile = ConfigProfile::from_reader("site", PROFILE.as_bytes(), "test").unwrap();
        let entry = profile.get(Tag::new(0x2005, 0x101D)).unwrap();
        assert_eq!(
            entry.owners.as_deref(),
            Some(
                &[
                    "Philips MR Imaging DD 001".to_string(),
                    "Philips MR Imaging DD 005".to_string()
                ][..]
            )
        );
        assert!(entry.accepts(Some("Philips MR Imaging DD 001")));
        assert!(entry.accepts(Some("Philips MR Imaging DD 005 ")));
        assert!(!entry.accepts(Some("SIEMENS MR HEADER")));
        assert!(!entry.accepts(None));
    }

    #[test]
    fn test_conflicting_actions_rejected() {
        let text = "Tag\tName\tAction\n(0008,0032)\tA\tK\n(0008,0032)\tA\tX\n";
        let err = ConfigProfile::from_reader("site", text.as_bytes(), "test").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_tag_rejected() {
        let text = "Tag\tName\tAction\n(2005, 1050, 0001)\tA\tK\n";
        let err = ConfigProfile::from_reader("site", text.as_bytes(), "test").unwrap_err();
        assert!(err.to_string().contains("must contain 2 hexadecimal components"));
    }

    #[test]
    fn test_missing_profile() {
        let dir = tempdir().unwrap();
        let err = ConfigProfile::load(dir.path(), "wrong_profile").unwrap_err();
        assert_eq!(err.to_string(), "Profile wrong_profile does not exist.");
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("research.tsv"), PROFILE).unwrap();
        let profile = ConfigProfile::load(dir.path(), "research").unwrap();
        assert_eq!(profile.len(), 3);
    }

    #[test]
    fn test_from_lists() {
        let keep = vec![Tag::new(0x0008, 0x0032)];
        let delete = vec![Tag::new(0x0008, 0x0008)];
        let profile = ConfigProfile::from_lists("custom", &keep, &delete).unwrap();
        assert_eq!(profile.get(keep[0]).unwrap().action, Action::Keep);
        assert_eq!(profile.get(delete[0]).unwrap().action, Action::Delete);

        let err = ConfigProfile::from_lists("custom", &keep, &keep).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unconditional_row_lifts_requirement() {
        let mut profile = ConfigProfile::empty("site");
        let tag = Tag::new(0x0019, 0x100C);
        profile.add(tag, Action::Keep, Some("SIEMENS MR HEADER")).unwrap();
        profile.add(tag, Action::Keep, None).unwrap();
        profile.add(tag, Action::Keep, Some("OTHER")).unwrap();
        assert!(!profile.get(tag).unwrap().has_owner_requirement());
    }
}
