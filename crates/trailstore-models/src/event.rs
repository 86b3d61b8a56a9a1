//! A single trail. Hares and hosting kennels are embedded as reference
//! lists so an event renders without joins.
use crate::{cached, hasher::HASHER_REFERENCE, kennel::KENNEL_REFERENCE, new_id};
use chrono::{DateTime, Utc};
use std::sync::{Arc, OnceLock};
use trailstore_core::{
    db::Db,
    error::{Error, ErrorOrigin},
    mixin::Timestamps,
    model::{FieldKind, FieldModel},
    record::{
        Record,
        reference::{Reference, ReferenceModel},
        schema::RecordSchema,
    },
    value::Value,
};

pub const TABLE: &str = "events";

pub const EVENT_ID: &str = "event_id";
pub const START_TIME: &str = "start_time";
pub const HARES: &str = "hares";
pub const KENNELS: &str = "kennels";
pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const EVENT_TYPE: &str = "type";
pub const START_LOCATION: &str = "start_location";
pub const END_TIME: &str = "end_time";
pub const TRAILS: &str = "trails";

pub static EVENT_REFERENCE: ReferenceModel = ReferenceModel::new(
    "event_reference",
    TABLE,
    &[
        EVENT_ID,
        HARES,
        NAME,
        DESCRIPTION,
        KENNELS,
        START_TIME,
        START_LOCATION,
    ],
);

static SCHEMA: OnceLock<Arc<RecordSchema>> = OnceLock::new();

pub fn schema() -> Result<Arc<RecordSchema>, Error> {
    cached(&SCHEMA, build)
}

fn build() -> Result<Arc<RecordSchema>, Error> {
    RecordSchema::builder(TABLE)
        .partition_key(EVENT_ID, FieldKind::Text)
        .sort_key(START_TIME, FieldKind::Timestamp)
        .field(FieldModel::required(HARES, FieldKind::List))
        .field(FieldModel::required(KENNELS, FieldKind::List))
        .field(FieldModel::required(NAME, FieldKind::Text))
        .field(FieldModel::required(DESCRIPTION, FieldKind::Text))
        .field(FieldModel::required(EVENT_TYPE, FieldKind::Text))
        .field(FieldModel::required(START_LOCATION, FieldKind::Text))
        .field(FieldModel::optional(END_TIME, FieldKind::Timestamp))
        .field(FieldModel::optional(TRAILS, FieldKind::List))
        .behavior(Timestamps)
        .build()
}

/// Embed references as a list attribute.
#[must_use]
pub fn reference_list(references: &[Reference]) -> Value {
    Value::List(references.iter().map(Reference::to_value).collect())
}

/// New unsaved event with a generated id.
pub fn new_event<I, K>(
    start_time: DateTime<Utc>,
    hares: &[Reference],
    kennels: &[Reference],
    attributes: I,
) -> Result<Record, Error>
where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
{
    if let Some(bad) = hares.iter().find(|r| !r.is_of_model(&HASHER_REFERENCE)) {
        return Err(Error::validation(
            ErrorOrigin::Record,
            format!(
                "hares must be hasher references, found '{}'",
                bad.model().name
            ),
        ));
    }
    if let Some(bad) = kennels.iter().find(|r| !r.is_of_model(&KENNEL_REFERENCE)) {
        return Err(Error::validation(
            ErrorOrigin::Record,
            format!(
                "kennels must be kennel references, found '{}'",
                bad.model().name
            ),
        ));
    }

    let mut record = Record::new(
        &schema()?,
        Some(new_id().into()),
        Some(start_time.into()),
        attributes,
    )?;
    record.set(HARES, reference_list(hares))?;
    record.set(KENNELS, reference_list(kennels))?;

    Ok(record)
}

pub fn lookup(db: &Db, event_id: &str, start_time: DateTime<Utc>) -> Result<Record, Error> {
    Record::load(db, &schema()?, event_id, Some(start_time.into()))
}

pub fn hares(event: &Record) -> Result<Vec<Reference>, Error> {
    decode_list(event, HARES, &HASHER_REFERENCE)
}

pub fn kennels(event: &Record) -> Result<Vec<Reference>, Error> {
    decode_list(event, KENNELS, &KENNEL_REFERENCE)
}

fn decode_list(
    event: &Record,
    field: &str,
    model: &'static ReferenceModel,
) -> Result<Vec<Reference>, Error> {
    event
        .get(field)
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .map(|value| Reference::from_value(model, value))
        .collect()
}
