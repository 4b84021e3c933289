//! Patchwright library crate
//!
//! Exposes the pipeline modules so integration tests and external tooling
//! can exercise them without going through CLI startup.

pub mod chunk;
pub mod config;
pub mod dataset;
pub mod diff;
pub mod edit;
pub mod extract;
pub mod llm;
pub mod orchestrator;
pub mod repo;
pub mod select;
pub mod syntax;
pub mod tools;
