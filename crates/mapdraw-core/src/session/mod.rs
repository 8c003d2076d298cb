//! Interaction sessions.
//!
//! A session owns everything one interaction mode creates: the sketch being
//! drawn or the selection being edited, its change subscription and its live
//! tooltip. Dropping a session tears all of that down.

mod draw;
mod measure;
mod modify;
mod sketch;

pub use draw::{DrawOutcome, DrawSession};
pub use measure::{MeasureLayer, MeasureOutcome, MeasureSession};
pub use modify::{Handle, ModifyOutcome, ModifySession, NodeEdit, selectable};
