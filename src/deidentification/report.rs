//! Tag difference report between two attribute trees
//!
//! Typically used to review what a run did: the raw input is `dcm1`, the de-identified
//! output is `dcm2`.

use crate::domain::result::Result;
use crate::domain::tag::Tag;
use crate::domain::tree::{AttributeTree, DatasetId, ElementPath};
use crate::domain::vr::Vr;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Element present in only one of the trees
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub path: ElementPath,
    pub vr: Vr,
    pub value: String,
}

/// Element present in both trees with a different VR or value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Modification {
    pub path: ElementPath,
    pub before: String,
    pub after: String,
    /// Set when the VR changed as well
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vr_change: Option<(Vr, Vr)>,
}

/// Differences between two trees, walking nested items
#[derive(Debug, Clone, Default, Serialize)]
pub struct TagDiff {
    pub only_in_first: Vec<DiffEntry>,
    pub only_in_second: Vec<DiffEntry>,
    pub modified: Vec<Modification>,
}

fn flatten(tree: &AttributeTree) -> BTreeMap<ElementPath, (Vr, String)> {
    let mut elements = BTreeMap::new();
    let mut pending: Vec<(DatasetId, Vec<(Tag, usize)>)> = vec![(tree.root(), Vec::new())];

    while let Some((dataset, prefix)) = pending.pop() {
        for element in tree.dataset(dataset).iter() {
            let path = ElementPath::new(prefix.clone(), element.tag);
            for (index, item) in element.value.items().iter().enumerate() {
                pending.push((*item, path.item_prefix(index)));
            }
            elements.insert(path, (element.vr, element.value.to_string()));
        }
    }
    elements
}

impl TagDiff {
    /// Compares `first` against `second`
    pub fn between(first: &AttributeTree, second: &AttributeTree) -> Self {
        let first = flatten(first);
        let mut second = flatten(second);
        let mut diff = TagDiff::default();

        for (path, (vr, value)) in first {
            match second.remove(&path) {
                None => diff.only_in_first.push(DiffEntry { path, vr, value }),
                Some((other_vr, other_value)) => {
                    if vr != other_vr || value != other_value {
                        diff.modified.push(Modification {
                            path,
                            before: value,
                            after: other_value,
                            vr_change: (vr != other_vr).then_some((vr, other_vr)),
                        });
                    }
                }
            }
        }
        diff.only_in_second = second
            .into_iter()
            .map(|(path, (vr, value))| DiffEntry { path, vr, value })
            .collect();
        diff
    }

    /// Whether both trees are identical
    pub fn is_empty(&self) -> bool {
        self.only_in_first.is_empty() && self.only_in_second.is_empty() && self.modified.is_empty()
    }

    /// Plain-text report
    pub fn format_text(&self) -> String {
        let mut output = String::new();

        for entry in &self.only_in_first {
            output.push_str(&format!(
                "Dcm1 only: {} {} [{}]\n",
                entry.path, entry.vr, entry.value
            ));
        }
        for entry in &self.only_in_second {
            output.push_str(&format!(
                "Dcm2 only: {} {} [{}]\n",
                entry.path, entry.vr, entry.value
            ));
        }
        for modification in &self.modified {
            output.push_str(&format!(
                "Modification (dcm1 -> dcm2): {}",
                modification.path
            ));
            if let Some((before, after)) = modification.vr_change {
                output.push_str(&format!("\tVR modification\t{before} ---> {after}"));
            }
            output.push_str(&format!(
                "\tdcm1 = {} / dcm2 = {}\n",
                modification.before, modification.after
            ));
        }

        output.push_str(&format!(
            "\n{} only in dcm1, {} only in dcm2, {} modified\n",
            self.only_in_first.len(),
            self.only_in_second.len(),
            self.modified.len()
        ));
        output
    }

    /// JSON report
    pub fn format_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the plain-text report to `path`
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.format_text())?;
        Ok(())
    }
}
