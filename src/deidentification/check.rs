//! "Already de-identified?" check
//!
//! The check replays the walk on a scratch copy in [`WalkMode::Check`] and compares the
//! recorded original and output values. The caller's tree is never mutated.

use crate::deidentification::audit::AuditRecord;
use crate::deidentification::resolver::Policy;
use crate::deidentification::walker::{WalkMode, Walker};
use crate::domain::result::Result;
use crate::domain::tree::AttributeTree;

/// Audit record the policy would produce on `tree`, without touching it
pub fn replay(policy: &Policy, tree: &AttributeTree) -> Result<AuditRecord> {
    let mut scratch = tree.clone();
    Walker::new(policy, WalkMode::Check).walk(&mut scratch)
}

/// Whether applying `policy` to `tree` would change nothing
pub fn is_deidentified(policy: &Policy, tree: &AttributeTree) -> Result<bool> {
    let record = replay(policy, tree)?;
    if !record.is_unchanged() {
        tracing::debug!(
            pending_changes = record.changes().len(),
            "Tree is not de-identified"
        );
    }
    Ok(record.is_unchanged())
}
