//! Code shared between the harness crates
pub mod types;
