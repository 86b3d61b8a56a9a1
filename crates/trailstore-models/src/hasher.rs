//! A runner. The same hash name may be held by different people in
//! different kennels, so uniqueness is scoped to the mother kennel and
//! further split by the owning user account.
use crate::{cached, new_id};
use std::sync::{Arc, OnceLock};
use trailstore_core::{
    constraint::UniqueConstraint,
    db::Db,
    error::Error,
    mixin::{Searchable, Timestamps, searchable_value},
    model::{FieldKind, FieldModel, IndexModel},
    record::{Record, reference::ReferenceModel, schema::RecordSchema},
    value::Value,
};

pub const TABLE: &str = "hashers";

pub const HASHER_ID: &str = "hasher_id";
pub const HASH_NAME: &str = "hash_name";
pub const MOTHER_KENNEL: &str = "mother_kennel";
pub const CONTACT_INFO: &str = "contact_info";
pub const REAL_NAME: &str = "real_name";
pub const USER: &str = "user";

pub const SEARCHABLE_HASH_NAME: &str = "searchable_hash_name";
pub const SEARCHABLE_MOTHER_KENNEL: &str = "searchable_mother_kennel";

pub const NAME_INDEX: &str = "hasher_name_index";

pub static HASHER_REFERENCE: ReferenceModel =
    ReferenceModel::new("hasher_reference", TABLE, &[HASHER_ID, HASH_NAME]);

static SCHEMA: OnceLock<Arc<RecordSchema>> = OnceLock::new();

pub fn schema() -> Result<Arc<RecordSchema>, Error> {
    cached(&SCHEMA, build)
}

fn build() -> Result<Arc<RecordSchema>, Error> {
    RecordSchema::builder(TABLE)
        .partition_key(HASHER_ID, FieldKind::Text)
        .field(FieldModel::required(HASH_NAME, FieldKind::Text))
        .field(FieldModel::required(MOTHER_KENNEL, FieldKind::Text))
        .field(FieldModel::optional(CONTACT_INFO, FieldKind::Map))
        .field(FieldModel::optional(REAL_NAME, FieldKind::Text))
        .field(FieldModel::optional(USER, FieldKind::Text))
        .index(IndexModel::new(NAME_INDEX, SEARCHABLE_HASH_NAME).with_range(SEARCHABLE_MOTHER_KENNEL))
        .behavior(Timestamps)
        .behavior(Searchable::new(HASH_NAME, SEARCHABLE_HASH_NAME))
        .behavior(Searchable::new(MOTHER_KENNEL, SEARCHABLE_MOTHER_KENNEL))
        .constraint(UniqueConstraint::new(NAME_INDEX).discriminated_by(USER))
        .build()
}

pub fn new_hasher(
    hash_name: &str,
    mother_kennel: &str,
    user: Option<&str>,
) -> Result<Record, Error> {
    let schema = schema()?;
    let mut attributes = vec![
        (HASH_NAME, Value::from(hash_name)),
        (MOTHER_KENNEL, Value::from(mother_kennel)),
    ];
    if let Some(user) = user {
        attributes.push((USER, Value::from(user)));
    }

    Record::new(&schema, Some(new_id().into()), None, attributes)
}

pub fn lookup(db: &Db, hasher_id: &str) -> Result<Record, Error> {
    Record::load(db, &schema()?, hasher_id, None)
}

/// Whether any hasher, in any kennel, goes by `hash_name`.
pub fn exists_by_hash_name(db: &Db, hash_name: &str) -> Result<bool, Error> {
    let rows = db.count_index(
        &schema()?,
        NAME_INDEX,
        &Value::from(searchable_value(hash_name)),
        None,
    )?;

    Ok(rows > 0)
}
