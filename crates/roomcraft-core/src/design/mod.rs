//! Design session domain module.
//!
//! - `session`: the workflow's session value and stage invariants (`Session`, `Stage`)
//! - `model`: selection types (`SelectedItem`, `Selection`)

mod model;
mod session;

pub use model::{SelectedItem, Selection};
pub use session::{Session, Stage};
