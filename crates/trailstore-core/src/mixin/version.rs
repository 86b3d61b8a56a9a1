use crate::{
    action::UpdateAction,
    db::condition::Condition,
    error::Error,
    model::{FieldKind, FieldModel},
    record::{
        Record,
        hook::{Behavior, HookRegistry},
    },
    value::Value,
};

pub const VERSION: &str = "version";

///
/// Versioned
///
/// Monotonic `version` counter: 0 on first save, +1 on every update.
/// The update hook reads the record's current in-memory version, which the
/// lifecycle keeps current by adopting each update's post-image.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Versioned;

impl Versioned {
    /// Caller-side optimistic guard: the stored version still equals the
    /// one this record last saw.
    #[must_use]
    pub fn expected(record: &Record) -> Condition {
        match version(record) {
            Some(current) => Condition::eq(VERSION, current),
            None => Condition::not_exists(VERSION),
        }
    }
}

impl Behavior for Versioned {
    fn name(&self) -> &'static str {
        "versioned"
    }

    fn register(&self, hooks: &mut HookRegistry) {
        hooks
            .meta_field(FieldModel::meta(VERSION, FieldKind::Int))
            .before_save("set_version", |record, _| {
                // a re-save of a stored record keeps its counter
                if record.is_persisted() && record.get(VERSION).is_some() {
                    return Ok(());
                }
                record.set(VERSION, 0)
            })
            .on_update("generate_version_update_action", |record, _| {
                let next = match version(record) {
                    None => 0,
                    Some(current) => current.checked_add(1).ok_or_else(|| {
                        Error::hook_validation(format!(
                            "version of '{}' overflowed",
                            record.table_name()
                        ))
                    })?,
                };

                Ok(vec![UpdateAction::set(VERSION, next)])
            });
    }
}

#[must_use]
pub fn version(record: &Record) -> Option<i64> {
    record.get(VERSION).and_then(Value::as_int)
}
