//! Core domain types for Taskline.

pub mod branch;
pub mod config;
pub mod git;
pub mod lifecycle;
pub mod store;
pub mod task;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
