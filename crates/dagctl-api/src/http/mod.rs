//! REST control API: router, authentication gate, and handlers.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
