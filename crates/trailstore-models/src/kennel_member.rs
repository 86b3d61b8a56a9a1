//! Kennel membership, partitioned by kennel so a roster is one query.
use crate::{
    cached,
    hasher::{self, HASHER_REFERENCE},
    kennel::{self, KENNEL_REFERENCE},
};
use chrono::{DateTime, Utc};
use std::sync::{Arc, OnceLock};
use trailstore_core::{
    db::Db,
    error::Error,
    mixin::Timestamps,
    model::{FieldKind, FieldModel},
    record::{Record, reference::Reference, schema::RecordSchema},
    value::Value,
};

pub const TABLE: &str = "kennel_members";

pub const KENNEL_ID: &str = "kennel_id";
pub const HASHER_ID: &str = "hasher_id";
pub const KENNEL_REF: &str = "kennel_ref";
pub const HASHER_REF: &str = "hasher_ref";
pub const JOINED: &str = "joined";

static SCHEMA: OnceLock<Arc<RecordSchema>> = OnceLock::new();

pub fn schema() -> Result<Arc<RecordSchema>, Error> {
    cached(&SCHEMA, build)
}

fn build() -> Result<Arc<RecordSchema>, Error> {
    RecordSchema::builder(TABLE)
        .partition_key(KENNEL_ID, FieldKind::Text)
        .sort_key(HASHER_ID, FieldKind::Text)
        .field(FieldModel::required(KENNEL_REF, FieldKind::Map))
        .field(FieldModel::required(HASHER_REF, FieldKind::Map))
        .field(FieldModel::optional(JOINED, FieldKind::Timestamp))
        .behavior(Timestamps)
        .build()
}

/// Unsaved membership of `hasher` in `kennel`.
pub fn new_member(
    kennel: &Record,
    hasher: &Record,
    joined: Option<DateTime<Utc>>,
) -> Result<Record, Error> {
    let kennel_ref = kennel.to_reference(&KENNEL_REFERENCE)?;
    let hasher_ref = hasher.to_reference(&HASHER_REFERENCE)?;

    Record::new(
        &schema()?,
        kennel.get(kennel::KENNEL_ID).cloned(),
        hasher.get(hasher::HASHER_ID).cloned(),
        [
            (KENNEL_REF, kennel_ref.to_value()),
            (HASHER_REF, hasher_ref.to_value()),
            (JOINED, joined.map_or(Value::Null, Value::from)),
        ],
    )
}

/// Every membership row of one kennel, ordered by hasher id.
pub fn members(db: &Db, kennel_id: &str) -> Result<Vec<Record>, Error> {
    db.query(&schema()?, &Value::from(kennel_id), None)
}

/// The embedded hasher identity of a membership row.
pub fn hasher_ref(member: &Record) -> Result<Reference, Error> {
    let value = member.get(HASHER_REF).unwrap_or(&Value::Null);

    Reference::from_value(&HASHER_REFERENCE, value)
}

pub fn kennel_ref(member: &Record) -> Result<Reference, Error> {
    let value = member.get(KENNEL_REF).unwrap_or(&Value::Null);

    Reference::from_value(&KENNEL_REFERENCE, value)
}
