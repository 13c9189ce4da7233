//! DICOM de-identification
//!
//! The core of the crate: resolve one action per element of an attribute tree and apply
//! it, recording what changed.
//!
//! # Architecture
//!
//! - [`rules`]: the standard confidentiality table, safe-private registry, site profiles
//!   and forced values, bundled into an immutable [`Policy`]
//! - [`resolver`]: precedence logic turning a tag and its private owner into a
//!   [`Resolution`]
//! - [`walker`]: depth-first traversal applying resolutions, filling an [`AuditRecord`]
//! - [`check`]: replay on a scratch copy to decide whether a tree is already clean
//! - [`engine`] and [`batch`]: file and directory processing
//! - [`subjects`]: one run per line of a subject list
//!
//! # Examples
//!
//! ```
//! use dicom_deid::deidentification::{Pseudonymizer, UID_ROOT};
//!
//! let uid = Pseudonymizer::pseudonym("1.2.840.113619.2.1");
//! assert!(uid.starts_with(UID_ROOT));
//! assert!(Pseudonymizer::is_pseudonym(&uid));
//! ```

pub mod action;
pub mod audit;
pub mod batch;
pub mod check;
pub mod cleaner;
pub mod engine;
pub mod gate;
pub mod pseudonym;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod subjects;
pub mod walker;

pub use action::Action;
pub use audit::{AuditRecord, AuditRow, AuditSink, Change, Disposition, MemoryAuditSink, TsvAuditLog};
pub use batch::{BatchSummary, FileFailure};
pub use check::{is_deidentified, replay};
pub use engine::{load_policy, DeidEngine, FileOutcome};
pub use gate::{Classification, ImagingGate};
pub use pseudonym::{Pseudonymizer, UID_ROOT};
pub use report::TagDiff;
pub use resolver::{CreatorIndex, Policy, Resolution, Resolver, RuleSource};
pub use rules::{ConfigProfile, ForcedValues, ProfileEntry, RuleTable, SafePrivateRegistry};
pub use subjects::{parse_subject_list, read_subject_list, SubjectJob, SubjectOutcome};
pub use walker::{WalkMode, Walker, DEIDENTIFICATION_METHOD, IDENTITY_REMOVED};
