//! Infrastructure layer for dagctl.
//!
//! Contains implementations of the registry and repository traits defined in
//! `dagctl-core`: SQLite storage for runs, step instances, XCom entries and
//! API users, the file-backed DAG registry, and data-directory and config
//! file handling.

pub mod config;
pub mod dagbag;
pub mod filesystem;
pub mod sqlite;
