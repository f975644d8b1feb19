//! Control API services and repository trait definitions for dagctl.
//!
//! This crate defines the "ports" (registry and repository traits) that the
//! infrastructure layer implements, plus the services built on them. It
//! depends only on `dagctl-types` -- never on `dagctl-infra` or any database
//! crate.

pub mod auth;
pub mod dagbag;
pub mod repository;
pub mod service;
pub mod view;
