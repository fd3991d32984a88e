//! In-memory storage layer for Tutela
//!
//! Reference implementations of the `tutela-core` repository traits. They
//! enforce the same uniqueness and not-found semantics a durable engine
//! would, so the policy layer behaves identically against either.

pub mod repositories;


pub use repositories::*;
