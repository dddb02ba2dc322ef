//! The design workflow state machine.

mod controller;

pub use controller::{Completion, DesignWorkflow};
