//! A hash club. Names are unique ignoring case and whitespace; acronyms are
//! searchable but may repeat across regions.
use crate::{cached, new_id};
use std::sync::{Arc, OnceLock};
use trailstore_core::{
    constraint::UniqueConstraint,
    db::Db,
    error::Error,
    mixin::{Searchable, Timestamps, Versioned, searchable_value},
    model::{FieldKind, FieldModel, IndexModel},
    record::{Record, reference::ReferenceModel, schema::RecordSchema},
    value::Value,
};

pub const TABLE: &str = "kennels";

pub const KENNEL_ID: &str = "kennel_id";
pub const NAME: &str = "name";
pub const ACRONYM: &str = "acronym";
pub const REGION: &str = "region";
pub const CONTACT: &str = "contact";
pub const WEBPAGE: &str = "webpage";
pub const FACEBOOK: &str = "facebook";
pub const FOUNDING: &str = "founding";
pub const DESCRIPTION: &str = "description";
pub const OFFICERS: &str = "officers";

pub const SEARCHABLE_NAME: &str = "searchable_name";
pub const SEARCHABLE_ACRONYM: &str = "searchable_acronym";

pub const NAME_INDEX: &str = "kennel_name_index";
pub const ACRONYM_INDEX: &str = "kennel_acronym_index";

pub static KENNEL_REFERENCE: ReferenceModel =
    ReferenceModel::new("kennel_reference", TABLE, &[KENNEL_ID, NAME, ACRONYM]);

static SCHEMA: OnceLock<Arc<RecordSchema>> = OnceLock::new();

pub fn schema() -> Result<Arc<RecordSchema>, Error> {
    cached(&SCHEMA, build)
}

fn build() -> Result<Arc<RecordSchema>, Error> {
    RecordSchema::builder(TABLE)
        .partition_key(KENNEL_ID, FieldKind::Text)
        .field(FieldModel::required(NAME, FieldKind::Text))
        .field(FieldModel::required(ACRONYM, FieldKind::Text))
        .field(FieldModel::optional(REGION, FieldKind::List))
        .field(FieldModel::optional(CONTACT, FieldKind::Map))
        .field(FieldModel::optional(WEBPAGE, FieldKind::Text))
        .field(FieldModel::optional(FACEBOOK, FieldKind::Text))
        .field(FieldModel::optional(FOUNDING, FieldKind::Map))
        .field(FieldModel::optional(DESCRIPTION, FieldKind::Text))
        .field(FieldModel::optional(OFFICERS, FieldKind::Map))
        .index(IndexModel::new(NAME_INDEX, SEARCHABLE_NAME))
        .index(IndexModel::new(ACRONYM_INDEX, SEARCHABLE_ACRONYM))
        .behavior(Timestamps)
        .behavior(Versioned)
        .behavior(Searchable::new(NAME, SEARCHABLE_NAME))
        .behavior(Searchable::new(ACRONYM, SEARCHABLE_ACRONYM))
        .constraint(UniqueConstraint::new(NAME_INDEX))
        .build()
}

/// New unsaved kennel with a generated id.
pub fn new_kennel(name: &str, acronym: &str) -> Result<Record, Error> {
    Record::new(
        &schema()?,
        Some(new_id().into()),
        None,
        [(NAME, Value::from(name)), (ACRONYM, Value::from(acronym))],
    )
}

pub fn lookup(db: &Db, kennel_id: &str) -> Result<Record, Error> {
    Record::load(db, &schema()?, kennel_id, None)
}

/// Kennels whose name normalizes to the same search key as `name`.
pub fn find_by_name(db: &Db, name: &str) -> Result<Vec<Record>, Error> {
    db.query_index(
        &schema()?,
        NAME_INDEX,
        &Value::from(searchable_value(name)),
        None,
    )
}

pub fn find_by_acronym(db: &Db, acronym: &str) -> Result<Vec<Record>, Error> {
    db.query_index(
        &schema()?,
        ACRONYM_INDEX,
        &Value::from(searchable_value(acronym)),
        None,
    )
}
