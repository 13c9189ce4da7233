//! Policy resolution
//!
//! [`Resolver::resolve`] decides exactly one outcome per element, in this order:
//!
//! 1. forced value
//! 2. site profile entry (owner-checked when the entry names owners)
//! 3. standard table, exact then range
//! 4. private heuristics: creators are kept, data elements go through the creator's
//!    own profile entry, then the safe-private registry, and are deleted when the
//!    creator is unknown or missing
//! 5. anything else is left untouched
//!
//! Owner names are read from a [`CreatorIndex`] taken before the dataset is mutated.
//! Creators the policy deletes or rewrites are left out of it, so their blocks resolve
//! as unreserved in the pass that removes them and in every later pass.

use crate::deidentification::action::Action;
use crate::deidentification::rules::{ConfigProfile, ForcedValues, RuleTable, SafePrivateRegistry};
use crate::domain::tag::Tag;
use crate::domain::tree::{AttributeTree, DatasetId, Value};
use std::collections::HashMap;
use std::fmt;

/// Immutable rule set for one run, shared between workers
#[derive(Debug, Clone)]
pub struct Policy {
    pub table: RuleTable,
    pub safe_private: SafePrivateRegistry,
    pub profile: ConfigProfile,
    pub forced: ForcedValues,
}

impl Policy {
    /// Bundles the loaded tables
    pub fn new(
        table: RuleTable,
        safe_private: SafePrivateRegistry,
        profile: ConfigProfile,
        forced: ForcedValues,
    ) -> Self {
        Self {
            table,
            safe_private,
            profile,
            forced,
        }
    }

    /// Name of the active profile
    pub fn profile_name(&self) -> &str {
        self.profile.name()
    }
}

/// Precedence step that produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSource {
    Forced,
    Profile,
    StandardTable,
    RangeTable,
    /// The element is itself a private creator
    PrivateCreator,
    /// Profile entry of the governing creator's tag
    CreatorProfile,
    SafePrivate,
    UnknownCreator,
    UnresolvableOwner,
    Default,
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleSource::Forced => "forced",
            RuleSource::Profile => "profile",
            RuleSource::StandardTable => "standard-table",
            RuleSource::RangeTable => "range-table",
            RuleSource::PrivateCreator => "private-creator",
            RuleSource::CreatorProfile => "creator-profile",
            RuleSource::SafePrivate => "safe-private",
            RuleSource::UnknownCreator => "unknown-creator",
            RuleSource::UnresolvableOwner => "unresolvable-owner",
            RuleSource::Default => "default",
        };
        f.write_str(name)
    }
}

/// Outcome of resolving one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Substitute the literal, whatever the tables say
    Forced(String),
    /// Apply an action
    Apply { action: Action, source: RuleSource },
    /// No rule matched; the element is left as is and not audited
    Untouched,
}

impl Resolution {
    fn apply(action: Action, source: RuleSource) -> Self {
        Resolution::Apply { action, source }
    }

    /// Step that produced this resolution
    pub fn source(&self) -> RuleSource {
        match self {
            Resolution::Forced(_) => RuleSource::Forced,
            Resolution::Apply { source, .. } => *source,
            Resolution::Untouched => RuleSource::Default,
        }
    }

    /// Whether the element keeps its value
    pub fn preserves_value(&self) -> bool {
        matches!(
            self,
            Resolution::Untouched
                | Resolution::Apply {
                    action: Action::Keep,
                    ..
                }
        )
    }
}

/// Private creator names of one dataset, keyed by creator tag
#[derive(Debug, Clone, Default)]
pub struct CreatorIndex {
    names: HashMap<Tag, String>,
}

impl CreatorIndex {
    /// Indexes the private creators present in `dataset`
    pub fn snapshot(tree: &AttributeTree, dataset: DatasetId) -> Self {
        let names = tree
            .dataset(dataset)
            .iter()
            .filter(|element| element.tag.is_private_creator())
            .filter_map(|element| match &element.value {
                Value::Strings(values) => values
                    .first()
                    .map(|name| (element.tag, name.trim_matches([' ', '\0']).to_string())),
                _ => None,
            })
            .collect();
        Self { names }
    }

    /// Declared name of the creator at `creator_tag`
    pub fn name(&self, creator_tag: Tag) -> Option<&str> {
        self.names.get(&creator_tag).map(String::as_str)
    }

    /// Owner name governing `tag`
    ///
    /// For a creator this is its own name; for a private data element it is the name of
    /// the creator reserving its block. Public tags have no owner.
    pub fn owner_of(&self, tag: Tag) -> Option<&str> {
        if !tag.is_private() {
            None
        } else if tag.is_private_creator() {
            self.name(tag)
        } else {
            self.name(tag.private_creator_tag())
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Applies the precedence rules of a [`Policy`]
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    policy: &'a Policy,
}

impl<'a> Resolver<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        Self { policy }
    }

    /// Creators of `dataset` that the policy leaves unchanged
    pub fn surviving_creators(&self, tree: &AttributeTree, dataset: DatasetId) -> CreatorIndex {
        let mut creators = CreatorIndex::snapshot(tree, dataset);
        let rewritten: Vec<Tag> = creators
            .names
            .keys()
            .copied()
            .filter(|creator_tag| !self.resolve(*creator_tag, &creators).preserves_value())
            .collect();
        for creator_tag in rewritten {
            tracing::trace!(creator = %creator_tag, "Creator is rewritten, its block is unreserved");
            creators.names.remove(&creator_tag);
        }
        creators
    }

    /// Resolves the element at `tag` of `dataset` against its surviving creators
    pub fn resolve_in(&self, tree: &AttributeTree, dataset: DatasetId, tag: Tag) -> Resolution {
        let creators = self.surviving_creators(tree, dataset);
        self.resolve(tag, &creators)
    }

    /// Resolves one element given the creator snapshot of its dataset
    pub fn resolve(&self, tag: Tag, creators: &CreatorIndex) -> Resolution {
        let policy = self.policy;

        if let Some(literal) = policy.forced.get(tag) {
            return Resolution::Forced(literal.to_string());
        }

        if let Some(entry) = policy.profile.get(tag) {
            if entry.accepts(creators.owner_of(tag)) {
                return Resolution::apply(entry.action, RuleSource::Profile);
            }
            tracing::trace!(tag = %tag, "Profile owner requirement not met, falling through");
        }

        if let Some(found) = policy.table.lookup(tag) {
            let source = if found.from_range {
                RuleSource::RangeTable
            } else {
                RuleSource::StandardTable
            };
            return Resolution::apply(found.action, source);
        }

        if tag.is_private() {
            return self.resolve_private(tag, creators);
        }

        Resolution::Untouched
    }

    fn resolve_private(&self, tag: Tag, creators: &CreatorIndex) -> Resolution {
        if tag.is_private_creator() {
            return Resolution::apply(Action::Keep, RuleSource::PrivateCreator);
        }

        let creator_tag = tag.private_creator_tag();
        let Some(owner) = creators.name(creator_tag) else {
            return Resolution::apply(Action::Delete, RuleSource::UnresolvableOwner);
        };

        if let Some(entry) = self.policy.profile.get(creator_tag) {
            if entry.has_owner_requirement() && entry.accepts(Some(owner)) {
                return Resolution::apply(entry.action, RuleSource::CreatorProfile);
            }
        }

        let safe_private = &self.policy.safe_private;
        if !safe_private.is_known(owner) {
            return Resolution::apply(Action::Delete, RuleSource::UnknownCreator);
        }
        if safe_private.is_allowed(owner, tag.group(), tag.private_block()) {
            Resolution::apply(Action::Keep, RuleSource::SafePrivate)
        } else {
            Resolution::apply(Action::Delete, RuleSource::SafePrivate)
        }
    }
}
