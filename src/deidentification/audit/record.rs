//! Per-file audit record: original and output values of every inspected element

use crate::domain::tree::{ElementPath, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// One recorded change, as shown in the human-readable report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub path: ElementPath,
    pub original: Option<Value>,
    pub output: Option<Value>,
}

/// Original and output values keyed by element path
///
/// Created fresh for every traversal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditRecord {
    original: BTreeMap<ElementPath, Value>,
    output: BTreeMap<ElementPath, Value>,
}

impl AuditRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the value an element had before its action
    pub fn record_original(&mut self, path: ElementPath, value: Value) {
        self.original.insert(path, value);
    }

    /// Records the value an element has after its action
    pub fn record_output(&mut self, path: ElementPath, value: Value) {
        self.output.insert(path, value);
    }

    pub fn original(&self) -> &BTreeMap<ElementPath, Value> {
        &self.original
    }

    pub fn output(&self) -> &BTreeMap<ElementPath, Value> {
        &self.output
    }

    /// True when every tracked element kept its value, i.e. the tree was already
    /// de-identified under the policy
    pub fn is_unchanged(&self) -> bool {
        self.original == self.output
    }

    /// Number of tracked elements
    pub fn len(&self) -> usize {
        self.original
            .keys()
            .chain(self.output.keys().filter(|k| !self.original.contains_key(*k)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty() && self.output.is_empty()
    }

    /// Tracked elements whose original and output differ, in path order
    pub fn changes(&self) -> Vec<Change> {
        let mut paths: Vec<&ElementPath> = self.original.keys().collect();
        paths.extend(self.output.keys().filter(|k| !self.original.contains_key(*k)));
        paths.sort();

        paths
            .into_iter()
            .filter_map(|path| {
                let original = self.original.get(path);
                let output = self.output.get(path);
                (original != output).then(|| Change {
                    path: path.clone(),
                    original: original.cloned(),
                    output: output.cloned(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tag::Tag;

    fn path(element: u16) -> ElementPath {
        ElementPath::root(Tag::new(0x0010, element))
    }

    #[test]
    fn test_empty_record_is_unchanged() {
        let record = AuditRecord::new();
        assert!(record.is_unchanged());
        assert!(record.is_empty());
    }

    #[test]
    fn test_keep_is_unchanged() {
        let mut record = AuditRecord::new();
        record.record_original(path(0x0010), Value::string("sub-001"));
        record.record_output(path(0x0010), Value::string("sub-001"));
        assert!(record.is_unchanged());
        assert!(record.changes().is_empty());
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_delete_is_a_change() {
        let mut record = AuditRecord::new();
        record.record_original(path(0x0030), Value::string("19800101"));
        assert!(!record.is_unchanged());

        let changes = record.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].output, None);
    }

    #[test]
    fn test_replacement_is_a_change() {
        let mut record = AuditRecord::new();
        record.record_original(path(0x0010), Value::string("Doe^John"));
        record.record_output(path(0x0010), Value::string("sub-001"));
        record.record_original(path(0x0020), Value::string("P1"));
        record.record_output(path(0x0020), Value::string("P1"));

        let changes = record.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, path(0x0010));
        assert_eq!(record.len(), 2);
    }
}
