//! Hash-club record types built on `trailstore-core`.
//!
//! Kennels, hashers, locations and events, plus the denormalized join
//! records that tie them together. Each module declares its schema once and
//! exposes small constructors and lookups; everything else is the core's
//! `Record` lifecycle.
pub mod event;
pub mod event_location;
pub mod hasher;
pub mod kennel;
pub mod kennel_member;
pub mod location;

use std::sync::{Arc, OnceLock};
use trailstore_core::{error::Error, record::schema::RecordSchema};
use ulid::Ulid;

/// Fresh sortable record id.
#[must_use]
pub fn new_id() -> String {
    Ulid::new().to_string()
}

// Build a schema once per process; a failed build is retried on the next call.
fn cached(
    cell: &'static OnceLock<Arc<RecordSchema>>,
    build: fn() -> Result<Arc<RecordSchema>, Error>,
) -> Result<Arc<RecordSchema>, Error> {
    if let Some(schema) = cell.get() {
        return Ok(Arc::clone(schema));
    }
    let built = build()?;

    Ok(Arc::clone(cell.get_or_init(|| built)))
}
