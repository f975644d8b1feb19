//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (dagctl-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod credential;
pub mod dag;
pub mod run;
pub mod xcom;
