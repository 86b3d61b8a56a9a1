//! Events indexed by where they start, partitioned by geohash.
use crate::{
    cached,
    event::{self, EVENT_REFERENCE},
    location::{self, LOCATION_REFERENCE},
};
use std::sync::{Arc, OnceLock};
use trailstore_core::{
    db::{Db, condition::KeyCondition},
    error::Error,
    mixin::Timestamps,
    model::{FieldKind, FieldModel},
    record::{Record, schema::RecordSchema},
    value::Value,
};

pub const TABLE: &str = "event_locations";

pub const GEOHASH: &str = "geohash";
pub const START_TIME: &str = "start_time";
pub const LOCATION_REF: &str = "location_ref";
pub const EVENT_REF: &str = "event_ref";

static SCHEMA: OnceLock<Arc<RecordSchema>> = OnceLock::new();

pub fn schema() -> Result<Arc<RecordSchema>, Error> {
    cached(&SCHEMA, build)
}

fn build() -> Result<Arc<RecordSchema>, Error> {
    RecordSchema::builder(TABLE)
        .partition_key(GEOHASH, FieldKind::Text)
        .sort_key(START_TIME, FieldKind::Timestamp)
        .field(FieldModel::required(LOCATION_REF, FieldKind::Map))
        .field(FieldModel::required(EVENT_REF, FieldKind::Map))
        .behavior(Timestamps)
        .build()
}

/// Unsaved row placing `event` at `location`.
pub fn new_event_location(event: &Record, location: &Record) -> Result<Record, Error> {
    let event_ref = event.to_reference(&EVENT_REFERENCE)?;
    let location_ref = location.to_reference(&LOCATION_REFERENCE)?;

    Record::new(
        &schema()?,
        location.get(location::GEOHASH).cloned(),
        event.get(event::START_TIME).cloned(),
        [
            (EVENT_REF, event_ref.to_value()),
            (LOCATION_REF, location_ref.to_value()),
        ],
    )
}

/// Events starting at exactly `geohash`, optionally limited to a time range.
pub fn events_at(
    db: &Db,
    geohash: &str,
    window: Option<&KeyCondition>,
) -> Result<Vec<Record>, Error> {
    db.query(&schema()?, &Value::from(geohash), window)
}
