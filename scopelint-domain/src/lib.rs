//! Domain logic: decide *which* lines each tool should see.
//!
//! This crate owns the change-scoping rules (range collapsing, output
//! filtering, argument building). It never spawns processes or touches the
//! filesystem; that's the `scopelint-core` crate.

mod error;
mod filter;
mod ranges;
mod template;
mod tool;

pub use error::DomainError;
pub use filter::{LintPattern, merge_findings, sort_findings, title_case};
pub use ranges::{LineExpansion, collapse};
pub use template::Template;
pub use tool::{
    AsToolSpec, FixerSpec, LinterSpec, RANGE_PLACEHOLDER, ToolAction, ToolSpec, Unavailable,
    extension_of,
};
