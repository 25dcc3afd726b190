//! Shared DTOs for the scopelint workspace.
//!
//! # Design constraints
//! - These types cross crate boundaries and are serialized into the JSON report.
//! - Absent data stays absent: optional finding fields are never defaulted.
//! - Collections that reach the user are ordered deterministically.

pub mod change;
pub mod finding;
pub mod lines;
pub mod result;

pub use change::{ChangeSet, ChangeStatus};
pub use finding::Finding;
pub use lines::{LineRange, LineScope, LineSet};
pub use result::{ExitStatus, FileResult, Report};
