//! Save preconditions the store cannot express natively.
//!
//! Both constraints are check-then-write against an eventually consistent
//! secondary index. Two concurrent saves can both pass the check; nothing
//! here makes that atomic.
pub mod proximity;
pub mod unique;

pub use proximity::ProximityConstraint;
pub use unique::UniqueConstraint;

use crate::{
    db::Db,
    error::Error,
    model::IndexModel,
    record::{Record, schema::RecordSchema},
    value::Value,
};

///
/// SaveConstraint
///

pub trait SaveConstraint: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check the constraint's wiring against the finished schema.
    fn validate(&self, schema: &RecordSchema) -> Result<(), Error>;

    /// Run after `beforeSave` hooks; `AlreadyExists` rejects the write.
    fn check(&self, db: &Db, record: &Record) -> Result<(), Error>;
}

fn resolve_index<'a>(
    schema: &'a RecordSchema,
    constraint: &str,
    index: &str,
) -> Result<&'a IndexModel, Error> {
    schema.table().index(index).ok_or_else(|| {
        Error::schema_invalid(format!(
            "{constraint} constraint on '{}' names undeclared index '{index}'",
            schema.name()
        ))
    })
}

fn required_key<'a>(record: &'a Record, field: &str) -> Result<&'a Value, Error> {
    record.get(field).ok_or_else(|| {
        Error::record_validation(format!(
            "index key '{field}' of '{}' is not set",
            record.table_name()
        ))
    })
}

// Same identity as the candidate; an unsaved candidate without a key has none.
fn is_same_record(candidate: &Record, other: &Record) -> bool {
    match (candidate.key(), other.key()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
