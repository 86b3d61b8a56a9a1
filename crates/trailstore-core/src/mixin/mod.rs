//! Reference behaviors.
//!
//! Each one only appends hooks and meta attributes to the registry, so any
//! combination composes in declaration order.
pub mod searchable;
pub mod timestamp;
pub mod version;

#[cfg(test)]
mod tests;

pub use searchable::{Searchable, searchable_value};
pub use timestamp::{CREATED_AT, MODIFIED_AT, Timestamps};
pub use version::{VERSION, Versioned};
