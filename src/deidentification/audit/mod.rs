//! Audit module
//!
//! Two kinds of audit data exist:
//! - [`AuditRecord`]: per-element original/output values of one traversal
//! - [`AuditRow`]: one line per processed file in the append-only audit log

pub mod logger;
pub mod record;

pub use logger::{AuditRow, AuditSink, Disposition, MemoryAuditSink, TsvAuditLog};
pub use record::{AuditRecord, Change};
