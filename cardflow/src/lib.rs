//! Schema-driven pipeline/card configuration engine.
//!
//! A pipeline is an ordered list of cards. Each card's fields, their
//! visibility and validity, and the column names it produces are derived
//! from its card type config, its own values, and the outputs of every other
//! card. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (field rules, output derivation,
//!   column availability, serialization). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (workspace files, config, request
//!   files).
//!
//! Orchestration modules ([`session`], [`view`], [`edit`], [`submit`],
//! [`validate`]) coordinate core logic with I/O to implement CLI commands and
//! the editor server.

pub mod core;
pub mod edit;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
pub mod submit;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;
pub mod view;
