//! Built-in rule tiers.
//!
//! - `primitives`: the terminal tier every language resolves through.
//! - `demo`: a small statement language used by the CLI and the tests.

pub mod demo;
pub mod primitives;
