//! Control API use cases.
//!
//! Services orchestrate registry and repository calls and the rules around
//! them. They depend on traits (ports), never on concrete infrastructure.

pub mod lookup;
pub mod trigger;
pub mod xcom;

#[cfg(test)]
pub(crate) mod testing;
