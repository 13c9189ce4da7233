//! Tree walker
//!
//! Visits every element of an [`AttributeTree`] depth first, in tag order, using an
//! explicit stack of frames instead of recursion. The tag list of a dataset is
//! snapshotted when its frame is created, so each element present at that moment is
//! visited exactly once whatever earlier steps removed or inserted.

use crate::deidentification::action::Action;
use crate::deidentification::audit::AuditRecord;
use crate::deidentification::cleaner;
use crate::deidentification::resolver::{CreatorIndex, Policy, Resolution, Resolver};
use crate::domain::errors::DeidError;
use crate::domain::result::Result;
use crate::domain::tag::Tag;
use crate::domain::tree::{AttributeTree, DatasetId, Element, ElementPath, Value};
use crate::domain::vr::Vr;

/// Patient Identity Removed
pub const IDENTITY_REMOVED: Tag = Tag::new(0x0012, 0x0062);
/// De-identification Method
pub const DEIDENTIFICATION_METHOD: Tag = Tag::new(0x0012, 0x0063);

/// Whether the walk rewrites the tree or only replays resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Mutate the tree and stamp provenance elements
    Run,
    /// Replay on a scratch tree; values already in pseudonym form resolve to themselves
    Check,
}

struct Frame {
    dataset: DatasetId,
    prefix: Vec<(Tag, usize)>,
    tags: Vec<Tag>,
    next: usize,
    creators: CreatorIndex,
}

impl Frame {
    fn new(
        tree: &AttributeTree,
        resolver: &Resolver<'_>,
        dataset: DatasetId,
        prefix: Vec<(Tag, usize)>,
    ) -> Self {
        Self {
            dataset,
            prefix,
            tags: tree.tags(dataset),
            next: 0,
            creators: resolver.surviving_creators(tree, dataset),
        }
    }
}

/// Applies a [`Policy`] to whole trees
pub struct Walker<'a> {
    policy: &'a Policy,
    mode: WalkMode,
}

impl<'a> Walker<'a> {
    pub fn new(policy: &'a Policy, mode: WalkMode) -> Self {
        Self { policy, mode }
    }

    /// Walks `tree`, applying one resolution per element
    ///
    /// # Errors
    ///
    /// Returns [`DeidError::Traversal`] when an element cannot be rewritten. The tree
    /// is then partially mutated and must not be persisted.
    pub fn walk(&self, tree: &mut AttributeTree) -> Result<AuditRecord> {
        let resolver = Resolver::new(self.policy);
        let mut record = AuditRecord::new();
        let mut visited = 0usize;
        let mut stack = vec![Frame::new(tree, &resolver, tree.root(), Vec::new())];

        while let Some(frame) = stack.last_mut() {
            let Some(&tag) = frame.tags.get(frame.next) else {
                stack.pop();
                continue;
            };
            frame.next += 1;

            let dataset = frame.dataset;
            let path = ElementPath::new(frame.prefix.clone(), tag);
            let resolution = resolver.resolve(tag, &frame.creators);
            tracing::trace!(path = %path, source = %resolution.source(), "Resolved element");
            visited += 1;

            let items = self.apply(tree, dataset, &path, resolution, &mut record)?;
            for (index, item) in items.into_iter().enumerate().rev() {
                stack.push(Frame::new(tree, &resolver, item, path.item_prefix(index)));
            }
        }

        if self.mode == WalkMode::Run {
            self.stamp_provenance(tree);
        }

        tracing::debug!(
            mode = ?self.mode,
            visited = visited,
            tracked = record.len(),
            "Tree walk completed"
        );
        Ok(record)
    }

    /// Applies one resolution and returns the items still to be walked
    fn apply(
        &self,
        tree: &mut AttributeTree,
        dataset: DatasetId,
        path: &ElementPath,
        resolution: Resolution,
        record: &mut AuditRecord,
    ) -> Result<Vec<DatasetId>> {
        let tag = path.tag();
        let Some(element) = tree.get(dataset, tag) else {
            return Ok(Vec::new());
        };
        let (vr, original) = (element.vr, element.value.clone());

        let action = match resolution {
            Resolution::Untouched => return Ok(original.items().to_vec()),
            Resolution::Forced(literal) => {
                if vr == Vr::SQ {
                    return Err(DeidError::Traversal {
                        path: path.to_string(),
                        message: "a forced value cannot replace a sequence".to_string(),
                    });
                }
                let value = cleaner::forced(vr, &literal);
                self.replace(tree, dataset, path, original, value, record);
                return Ok(Vec::new());
            }
            Resolution::Apply { action, .. } => action,
        };

        match action {
            Action::Keep => {
                record.record_original(path.clone(), original.clone());
                record.record_output(path.clone(), original.clone());
                Ok(original.items().to_vec())
            }
            Action::Delete => {
                record.record_original(path.clone(), original);
                tree.remove(dataset, tag);
                Ok(Vec::new())
            }
            Action::Blank => {
                self.replace(tree, dataset, path, original, cleaner::blank(vr), record);
                Ok(Vec::new())
            }
            Action::Dummy | Action::Pseudonymize if vr == Vr::SQ => {
                self.clean_items(tree, original.items(), path, action, record);
                Ok(Vec::new())
            }
            Action::Dummy | Action::Pseudonymize => {
                let keep_pseudonyms = self.mode == WalkMode::Check;
                let element = Element::new(tag, vr, original);
                let value = if action == Action::Dummy {
                    cleaner::dummy(&element, keep_pseudonyms)
                } else {
                    cleaner::pseudonymize(&element, keep_pseudonyms)
                };
                self.replace(tree, dataset, path, element.value, value, record);
                Ok(Vec::new())
            }
        }
    }

    fn replace(
        &self,
        tree: &mut AttributeTree,
        dataset: DatasetId,
        path: &ElementPath,
        original: Value,
        value: Value,
        record: &mut AuditRecord,
    ) {
        record.record_original(path.clone(), original);
        record.record_output(path.clone(), value.clone());
        if let Some(element) = tree.get_mut(dataset, path.tag()) {
            element.value = value;
        }
    }

    /// Applies dummy or pseudonymize to every leaf below a sequence, bypassing the resolver
    fn clean_items(
        &self,
        tree: &mut AttributeTree,
        items: &[DatasetId],
        path: &ElementPath,
        action: Action,
        record: &mut AuditRecord,
    ) {
        let keep_pseudonyms = self.mode == WalkMode::Check;
        let mut pending: Vec<(DatasetId, Vec<(Tag, usize)>)> = items
            .iter()
            .enumerate()
            .map(|(index, item)| (*item, path.item_prefix(index)))
            .collect();

        while let Some((dataset, prefix)) = pending.pop() {
            for tag in tree.tags(dataset) {
                let Some(element) = tree.get(dataset, tag).cloned() else {
                    continue;
                };
                let child = ElementPath::new(prefix.clone(), tag);
                if element.is_sequence() {
                    pending.extend(
                        element
                            .value
                            .items()
                            .iter()
                            .enumerate()
                            .map(|(index, item)| (*item, child.item_prefix(index))),
                    );
                    continue;
                }
                let value = match action {
                    Action::Pseudonymize => cleaner::pseudonymize(&element, keep_pseudonyms),
                    _ => cleaner::dummy(&element, keep_pseudonyms),
                };
                self.replace(tree, dataset, &child, element.value, value, record);
            }
        }
    }

    /// Sets the identity-removed flag and the method string on the root dataset
    pub fn stamp_provenance(&self, tree: &mut AttributeTree) {
        let root = tree.root();
        let method = format!(
            "{} {} profile={}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            self.policy.profile_name()
        );
        tree.insert(root, Element::text(IDENTITY_REMOVED, Vr::CS, "YES"));
        tree.insert(root, Element::text(DEIDENTIFICATION_METHOD, Vr::LO, method));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deidentification::pseudonym::Pseudonymizer;
    use crate::deidentification::rules::{
        ConfigProfile, ForcedValues, RuleTable, SafePrivateRegistry,
    };

    const TABLE: &str = "Tag\tName\tAction\n\
        (0008,0018)\tSOP Instance UID\tU\n\
        (0008,0020)\tStudy Date\tK\n\
        (0008,0032)\tAcquisition Time\tX\n\
        (0008,1140)\tReferenced Image Sequence\tX/Z/U\n\
        (0008,1155)\tReferenced SOP Instance UID\tU\n\
        (0010,0030)\tPatient's Birth Date\tZ\n\
        (0040,0275)\tRequest Attributes Sequence\tD\n";

    fn policy(forced: ForcedValues) -> Policy {
        let mut profile = ConfigProfile::empty("test");
        profile
            .add(Tag::new(0x0008, 0x1140), Action::Keep, None)
            .unwrap();
        Policy::new(
            RuleTable::from_reader(TABLE.as_bytes(), "test").unwrap(),
            SafePrivateRegistry::default(),
            profile,
            forced,
        )
    }

    fn sample_tree() -> AttributeTree {
        let mut tree = AttributeTree::new();
        let root = tree.root();
        tree.insert(root, Element::text(Tag::new(0x0008, 0x0018), Vr::UI, "1.2.3.4"));
        tree.insert(root, Element::text(Tag::new(0x0008, 0x0020), Vr::DA, "20240131"));
        tree.insert(root, Element::text(Tag::new(0x0008, 0x0032), Vr::TM, "101010"));
        tree.insert(root, Element::text(Tag::new(0x0008, 0x0060), Vr::CS, "MR"));
        tree.insert(root, Element::text(Tag::new(0x0010, 0x0010), Vr::PN, "Doe^John"));
        tree.insert(root, Element::text(Tag::new(0x0010, 0x0030), Vr::DA, "19800101"));

        let first = tree.new_item();
        tree.insert(first, Element::text(Tag::new(0x0008, 0x1155), Vr::UI, "1.2.3.5"));
        tree.insert(first, Element::text(Tag::new(0x0008, 0x0032), Vr::TM, "101011"));
        let second = tree.new_item();
        tree.insert(second, Element::text(Tag::new(0x0008, 0x1155), Vr::UI, "1.2.3.6"));
        tree.insert(root, Element::sequence(Tag::new(0x0008, 0x1140), vec![first, second]));

        let request = tree.new_item();
        tree.insert(request, Element::text(Tag::new(0x0040, 0x1001), Vr::SH, "RP-7"));
        tree.insert(request, Element::text(Tag::new(0x0040, 0x0007), Vr::LO, "Brain MRI"));
        tree.insert(root, Element::sequence(Tag::new(0x0040, 0x0275), vec![request]));
        tree
    }

    #[test]
    fn test_run_applies_actions() {
        let mut tree = sample_tree();
        let policy = policy(ForcedValues::new().with_subject("sub-001"));
        let record = Walker::new(&policy, WalkMode::Run).walk(&mut tree).unwrap();
        let root = tree.root();

        assert_eq!(tree.string(root, Tag::new(0x0010, 0x0010)), Some("sub-001"));
        assert_eq!(tree.string(root, Tag::new(0x0008, 0x0020)), Some("20240131"));
        assert!(!tree.contains(root, Tag::new(0x0008, 0x0032)));
        assert_eq!(
            tree.get(root, Tag::new(0x0010, 0x0030)).unwrap().value,
            Value::Empty
        );
        assert_eq!(
            tree.string(root, Tag::new(0x0008, 0x0018)),
            Some(Pseudonymizer::pseudonym("1.2.3.4").as_str())
        );
        // untouched public tag
        assert_eq!(tree.string(root, Tag::new(0x0008, 0x0060)), Some("MR"));
        assert!(!record.is_unchanged());
    }

    #[test]
    fn test_run_recurses_into_kept_sequence() {
        let mut tree = sample_tree();
        let policy = policy(ForcedValues::new());
        Walker::new(&policy, WalkMode::Run).walk(&mut tree).unwrap();

        let root = tree.root();
        let items = tree
            .get(root, Tag::new(0x0008, 0x1140))
            .unwrap()
            .value
            .items()
            .to_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(
            tree.string(items[1], Tag::new(0x0008, 0x1155)),
            Some(Pseudonymizer::pseudonym("1.2.3.6").as_str())
        );
        assert!(!tree.contains(items[0], Tag::new(0x0008, 0x0032)));
    }

    #[test]
    fn test_dummy_sequence_recurses_into_leaves() {
        let mut tree = sample_tree();
        let policy = policy(ForcedValues::new());
        let record = Walker::new(&policy, WalkMode::Run).walk(&mut tree).unwrap();

        let root = tree.root();
        let item = tree.get(root, Tag::new(0x0040, 0x0275)).unwrap().value.items()[0];
        assert_eq!(tree.string(item, Tag::new(0x0040, 0x1001)), Some("ANONYMIZED"));
        assert_eq!(tree.string(item, Tag::new(0x0040, 0x0007)), Some("ANONYMIZED"));

        let path = ElementPath::new(
            vec![(Tag::new(0x0040, 0x0275), 0)],
            Tag::new(0x0040, 0x1001),
        );
        assert_eq!(record.original().get(&path), Some(&Value::string("RP-7")));
    }

    #[test]
    fn test_audit_paths_do_not_collide() {
        let mut tree = sample_tree();
        let policy = policy(ForcedValues::new());
        let record = Walker::new(&policy, WalkMode::Run).walk(&mut tree).unwrap();

        let first = ElementPath::new(vec![(Tag::new(0x0008, 0x1140), 0)], Tag::new(0x0008, 0x1155));
        let second = ElementPath::new(vec![(Tag::new(0x0008, 0x1140), 1)], Tag::new(0x0008, 0x1155));
        assert_eq!(record.original().get(&first), Some(&Value::string("1.2.3.5")));
        assert_eq!(record.original().get(&second), Some(&Value::string("1.2.3.6")));
    }

    #[test]
    fn test_provenance_only_in_run_mode() {
        let policy = policy(ForcedValues::new());

        let mut tree = sample_tree();
        Walker::new(&policy, WalkMode::Run).walk(&mut tree).unwrap();
        let root = tree.root();
        assert_eq!(tree.string(root, IDENTITY_REMOVED), Some("YES"));
        let method = tree.string(root, DEIDENTIFICATION_METHOD).unwrap();
        assert!(method.ends_with("profile=test"));

        let mut tree = sample_tree();
        Walker::new(&policy, WalkMode::Check).walk(&mut tree).unwrap();
        assert!(!tree.contains(tree.root(), IDENTITY_REMOVED));
    }

    #[test]
    fn test_check_after_run_is_fixed_point() {
        let policy = policy(ForcedValues::new().with_subject("sub-001"));
        let mut tree = sample_tree();
        Walker::new(&policy, WalkMode::Run).walk(&mut tree).unwrap();

        let mut replay = tree.clone();
        let record = Walker::new(&policy, WalkMode::Check).walk(&mut replay).unwrap();
        assert!(record.is_unchanged(), "changes: {:?}", record.changes());
    }

    #[test]
    fn test_forced_sequence_is_traversal_error() {
        let mut forced = ForcedValues::new();
        forced.insert(Tag::new(0x0008, 0x1140), "nope");
        let policy = policy(forced);
        let mut tree = sample_tree();
        let err = Walker::new(&policy, WalkMode::Run).walk(&mut tree).unwrap_err();
        assert!(matches!(err, DeidError::Traversal { .. }));
        assert!(err.to_string().contains("(0008,1140)"));
    }

    #[test]
    fn test_untouched_elements_not_audited() {
        let policy = policy(ForcedValues::new());
        let mut tree = sample_tree();
        let record = Walker::new(&policy, WalkMode::Run).walk(&mut tree).unwrap();
        let modality = ElementPath::root(Tag::new(0x0008, 0x0060));
        assert!(!record.original().contains_key(&modality));
        assert!(!record.output().contains_key(&modality));
    }
}
