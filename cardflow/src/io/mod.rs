//! I/O helpers for cardflow commands.

pub mod atomic;
pub mod catalog_store;
pub mod columns_store;
pub mod config;
pub mod init;
pub mod pipeline_store;
pub mod schema;
pub mod submission;
