//! Deterministic, pure logic shared by the cardflow engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod builtin;
pub mod card;
pub mod catalog;
pub mod document;
pub mod error;
pub mod field;
pub mod filters;
pub mod invariants;
pub mod output;
pub mod pipeline;
pub mod references;
pub mod types;
