//! A trail start or on-after venue. Coordinates and geohash are kept in
//! step at construction; two same-named locations in one parent cell are
//! treated as the same place.
use crate::{cached, new_id};
use std::sync::{Arc, OnceLock};
use trailstore_core::{
    constraint::ProximityConstraint,
    db::Db,
    error::Error,
    geohash::{self, DEFAULT_PRECISION},
    mixin::{Searchable, Timestamps},
    model::{FieldKind, FieldModel, IndexModel},
    record::{Record, reference::ReferenceModel, schema::RecordSchema},
    value::Value,
};

pub const TABLE: &str = "locations";

pub const LOCATION_ID: &str = "location_id";
pub const NAME: &str = "name";
pub const ADDRESS1: &str = "address1";
pub const ADDRESS2: &str = "address2";
pub const CITY: &str = "city";
pub const STATE_PROVINCE_REGION: &str = "state_province_region";
pub const COUNTRY: &str = "country";
pub const POSTAL_CODE: &str = "postal_code";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const GEOHASH: &str = "geohash";

pub const SEARCHABLE_NAME: &str = "searchable_name";
pub const PROXIMITY_INDEX: &str = "location_proximity_index";

pub static LOCATION_REFERENCE: ReferenceModel = ReferenceModel::new(
    "location_reference",
    TABLE,
    &[
        LOCATION_ID,
        GEOHASH,
        NAME,
        ADDRESS1,
        ADDRESS2,
        CITY,
        STATE_PROVINCE_REGION,
        POSTAL_CODE,
        LATITUDE,
        LONGITUDE,
    ],
);

static SCHEMA: OnceLock<Arc<RecordSchema>> = OnceLock::new();

pub fn schema() -> Result<Arc<RecordSchema>, Error> {
    cached(&SCHEMA, build)
}

fn build() -> Result<Arc<RecordSchema>, Error> {
    RecordSchema::builder(TABLE)
        .partition_key(LOCATION_ID, FieldKind::Text)
        .field(FieldModel::required(NAME, FieldKind::Text))
        .field(FieldModel::optional(ADDRESS1, FieldKind::Text))
        .field(FieldModel::optional(ADDRESS2, FieldKind::Text))
        .field(FieldModel::optional(CITY, FieldKind::Text))
        .field(FieldModel::optional(STATE_PROVINCE_REGION, FieldKind::Text))
        .field(FieldModel::optional(COUNTRY, FieldKind::Text))
        .field(FieldModel::optional(POSTAL_CODE, FieldKind::Text))
        .field(FieldModel::required(LATITUDE, FieldKind::Number))
        .field(FieldModel::required(LONGITUDE, FieldKind::Number))
        .field(FieldModel::required(GEOHASH, FieldKind::Text))
        .index(IndexModel::new(PROXIMITY_INDEX, SEARCHABLE_NAME).with_range(GEOHASH))
        .hooks(|hooks| {
            hooks.on_init("derive_coordinates", derive_coordinates);
        })
        .behavior(Timestamps)
        .behavior(Searchable::new(NAME, SEARCHABLE_NAME))
        .constraint(ProximityConstraint::new(PROXIMITY_INDEX))
        .build()
}

// Geohash from coordinates, or coordinates from the geohash's cell centre.
fn derive_coordinates(record: &mut Record) -> Result<(), Error> {
    let lat = record.get(LATITUDE).and_then(Value::as_f64);
    let lon = record.get(LONGITUDE).and_then(Value::as_f64);

    match (record.get_text(GEOHASH).map(str::to_string), lat, lon) {
        (Some(hash), Some(_), Some(_)) => geohash::validate(&hash),
        (Some(hash), _, _) => {
            let (lat, lon) = geohash::decode(&hash)?;
            record.set(LATITUDE, lat)?;
            record.set(LONGITUDE, lon)
        }
        (None, Some(lat), Some(lon)) => {
            let hash = geohash::encode(lat, lon, DEFAULT_PRECISION)?;
            record.set(GEOHASH, hash)
        }
        (None, _, _) => Err(Error::hook_validation(format!(
            "location needs a {GEOHASH} or both {LATITUDE} and {LONGITUDE}"
        ))),
    }
}

/// New unsaved location. Supply either a geohash or both coordinates.
pub fn new_location<I, K>(name: &str, extra: I) -> Result<Record, Error>
where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
{
    let schema = schema()?;
    let attributes = std::iter::once((NAME.to_string(), Value::from(name)))
        .chain(extra.into_iter().map(|(k, v)| (k.as_ref().to_string(), v)));

    Record::new(&schema, Some(new_id().into()), None, attributes)
}

pub fn lookup(db: &Db, location_id: &str) -> Result<Record, Error> {
    Record::load(db, &schema()?, location_id, None)
}

/// Same-named locations in the parent cell of `location`, excluding itself.
pub fn nearby(db: &Db, location: &Record) -> Result<Vec<Record>, Error> {
    ProximityConstraint::new(PROXIMITY_INDEX).nearby(db, location)
}
