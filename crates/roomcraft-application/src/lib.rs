//! Application layer for Roomcraft.
//!
//! This crate drives the design workflow on top of the domain types in
//! `roomcraft-core` and wires the production adapters together.

pub mod bootstrap;
pub mod retry;
pub mod workflow;

pub use bootstrap::{AppBootstrap, AppWorkflow, BootstrapOptions};
pub use retry::{RetryPolicy, retry_transform};
pub use workflow::{Completion, DesignWorkflow};
