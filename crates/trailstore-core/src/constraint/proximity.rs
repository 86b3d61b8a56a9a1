use crate::{
    constraint::{SaveConstraint, is_same_record, required_key, resolve_index},
    db::{Db, condition::KeyCondition},
    error::Error,
    geohash,
    model::FieldKind,
    record::{Record, schema::RecordSchema},
    value::Value,
};
use tracing::debug;

///
/// ProximityConstraint
///
/// "Is there already a place with this name near here": the index hash key
/// holds the normalized name, the range key the geohash. Matches are counted
/// over the parent cell's key range (see `geohash::adjacency_range` for the
/// boundary approximation).
///

#[derive(Clone, Copy, Debug)]
pub struct ProximityConstraint {
    index: &'static str,
}

impl ProximityConstraint {
    #[must_use]
    pub const fn new(index: &'static str) -> Self {
        Self { index }
    }

    /// Stored records with the same normalized name inside the adjacency
    /// range, excluding `record` itself.
    pub fn nearby(&self, db: &Db, record: &Record) -> Result<Vec<Record>, Error> {
        let schema = record.schema();
        let index = resolve_index(schema, self.name(), self.index)?;
        let Some(geohash_field) = index.range_key else {
            return Err(Error::schema_invalid(format!(
                "proximity index '{}' has no geohash range key",
                self.index
            )));
        };

        let name = required_key(record, index.hash_key)?;
        let hash = required_key(record, geohash_field)?
            .as_text()
            .ok_or_else(|| {
                Error::record_validation(format!("geohash field '{geohash_field}' must be text"))
            })?;
        geohash::validate(hash)?;

        let (lower, upper) = geohash::adjacency_range(hash);
        let range = KeyCondition::half_open(lower.map(Value::from), upper.map(Value::from));

        Ok(db
            .query_index(schema, self.index, name, Some(&range))?
            .into_iter()
            .filter(|other| !is_same_record(record, other))
            .collect())
    }

    pub fn count_nearby(&self, db: &Db, record: &Record) -> Result<usize, Error> {
        self.nearby(db, record).map(|found| found.len())
    }
}

impl SaveConstraint for ProximityConstraint {
    fn name(&self) -> &'static str {
        "proximity"
    }

    fn validate(&self, schema: &RecordSchema) -> Result<(), Error> {
        let index = resolve_index(schema, self.name(), self.index)?;
        let geohash_field = index.range_key.and_then(|field| schema.field(field));

        match geohash_field {
            Some(field) if field.kind == FieldKind::Text => Ok(()),
            _ => Err(Error::schema_invalid(format!(
                "proximity index '{}' on '{}' needs a text geohash range key",
                self.index,
                schema.name()
            ))),
        }
    }

    fn check(&self, db: &Db, record: &Record) -> Result<(), Error> {
        let nearby = self.nearby(db, record)?;

        match nearby.first() {
            None => Ok(()),
            Some(existing) => {
                let existing_key = existing.key()?;
                debug!(
                    table = record.table_name(),
                    index = self.index,
                    matches = nearby.len(),
                    "proximity constraint matched"
                );

                Err(Error::already_exists(
                    record.table_name(),
                    self.index,
                    existing_key,
                ))
            }
        }
    }
}
