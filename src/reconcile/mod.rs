//! Reconciliation engine
//!
//! Keeps a presentation [`Scene`] consistent with the component list delivered
//! by the store. Each delivery is diffed against the previous one; the changes
//! are applied as [`Operation`]s in dependency-safe order and reported back in
//! a [`CycleReport`].

mod diagnostics;
mod diff;
mod operation;
mod orphans;
mod scene;
mod session;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use diff::{diff, pointers_last, ComponentDiff};
pub use operation::Operation;
pub use orphans::{orphan_closure, PointerRef};
pub use scene::{ElementHandle, Scene, SceneElement, SceneError};
pub use session::{reconcile, CycleReport, Session, SessionState};
