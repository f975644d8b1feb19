//! Shared domain types for dagctl.
//!
//! Workflow definitions, runs, step instances, XCom entries, credentials,
//! configuration, and the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod auth;
pub mod config;
pub mod dag;
pub mod error;
pub mod execution_date;
pub mod run;
pub mod xcom;
