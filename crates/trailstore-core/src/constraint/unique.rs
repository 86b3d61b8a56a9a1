use crate::{
    constraint::{SaveConstraint, is_same_record, required_key, resolve_index},
    db::{Db, condition::KeyCondition},
    error::Error,
    record::{Record, schema::RecordSchema},
    value::{Value, structural_eq},
};
use tracing::debug;

///
/// UniqueConstraint
///
/// Case and whitespace insensitive uniqueness over a secondary index whose
/// hash key (and optional range key) hold normalized search values.
///
/// Records sharing the index keys still coexist when a discriminator field
/// differs. Discriminators compare by value; absent on both sides is equal,
/// present on one side only is not.
///

#[derive(Clone, Debug)]
pub struct UniqueConstraint {
    index: &'static str,
    discriminators: Vec<&'static str>,
}

impl UniqueConstraint {
    #[must_use]
    pub const fn new(index: &'static str) -> Self {
        Self {
            index,
            discriminators: Vec::new(),
        }
    }

    #[must_use]
    pub fn discriminated_by(mut self, field: &'static str) -> Self {
        self.discriminators.push(field);
        self
    }

    #[must_use]
    pub const fn index(&self) -> &'static str {
        self.index
    }

    /// Stored records colliding with `record`.
    ///
    /// Index reads may lag: a record written moments ago by someone else can
    /// be missing from the result.
    pub fn matching_records(
        &self,
        db: &Db,
        record: &Record,
        exclude_self: bool,
    ) -> Result<Vec<Record>, Error> {
        let schema = record.schema();
        let index = resolve_index(schema, self.name(), self.index)?;

        // Phase 1: exact match on the normalized index keys.
        let hash = required_key(record, index.hash_key)?;
        let range = match index.range_key {
            Some(field) => Some(KeyCondition::Eq(required_key(record, field)?.clone())),
            None => None,
        };
        let candidates = db.query_index(schema, self.index, hash, range.as_ref())?;

        // Phase 2: discriminators, then self-exclusion.
        Ok(candidates
            .into_iter()
            .filter(|other| {
                self.discriminators
                    .iter()
                    .all(|field| discriminator_eq(record.get(field), other.get(field)))
            })
            .filter(|other| !(exclude_self && is_same_record(record, other)))
            .collect())
    }

    pub fn record_exists(&self, db: &Db, record: &Record) -> Result<bool, Error> {
        Ok(!self.matching_records(db, record, true)?.is_empty())
    }
}

impl SaveConstraint for UniqueConstraint {
    fn name(&self) -> &'static str {
        "unique"
    }

    fn validate(&self, schema: &RecordSchema) -> Result<(), Error> {
        resolve_index(schema, self.name(), self.index)?;

        for field in &self.discriminators {
            if schema.field(field).is_none() {
                return Err(Error::schema_invalid(format!(
                    "unique constraint on '{}' discriminates by undeclared field '{field}'",
                    schema.name()
                )));
            }
        }

        Ok(())
    }

    fn check(&self, db: &Db, record: &Record) -> Result<(), Error> {
        let matches = self.matching_records(db, record, true)?;

        match matches.first() {
            None => Ok(()),
            Some(existing) => {
                let existing_key = existing.key()?;
                debug!(
                    table = record.table_name(),
                    index = self.index,
                    existing = %existing_key,
                    "unique constraint matched"
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

fn discriminator_eq(candidate: Option<&Value>, other: Option<&Value>) -> bool {
    match (candidate, other) {
        (Some(a), Some(b)) => structural_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

///
/// TESTS
///
