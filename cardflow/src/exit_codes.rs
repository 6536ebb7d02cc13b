//! Stable exit codes for cardflow CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid layout/config/catalog/pipeline or other errors.
pub const INVALID: i32 = 1;
/// `cardflow submit` or `cardflow validate` found cards with incomplete required fields.
pub const NOT_READY: i32 = 2;
