//! Auto-fix: range editing, per-file fixing, cascading cleanup, undo

mod cascade;
pub mod editor;
mod fixer;
mod undo;

pub use cascade::{
    Cascade, CascadeReport, CascadeState, Orphan, Termination, MAX_CASCADE_ITERATIONS,
};
pub use editor::{FixRange, RangeError};
pub use fixer::{FixError, FixResult, Fixer, SkippedIssue};
pub use undo::UndoScript;
