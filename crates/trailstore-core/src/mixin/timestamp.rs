use crate::{
    action::UpdateAction,
    model::{FieldKind, FieldModel},
    record::{
        Record,
        hook::{Behavior, HookRegistry},
    },
};
use chrono::{DateTime, Utc};

pub const CREATED_AT: &str = "created_at";
pub const MODIFIED_AT: &str = "modified_at";

///
/// Timestamps
///
/// `created_at` is set once on the first save; `modified_at` is refreshed on
/// every save and regenerated as a `set` action on every update. Both come
/// from the operation's single `now`.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Timestamps;

impl Behavior for Timestamps {
    fn name(&self) -> &'static str {
        "timestamps"
    }

    fn register(&self, hooks: &mut HookRegistry) {
        hooks
            .meta_field(FieldModel::meta(CREATED_AT, FieldKind::Timestamp))
            .meta_field(FieldModel::meta(MODIFIED_AT, FieldKind::Timestamp))
            .before_save("set_timestamps", |record, ctx| {
                if record.get(CREATED_AT).is_none() {
                    record.set(CREATED_AT, ctx.now)?;
                }
                record.set(MODIFIED_AT, ctx.now)
            })
            .on_update("generate_timestamp_update_action", |_, ctx| {
                Ok(vec![UpdateAction::set(MODIFIED_AT, ctx.now)])
            });
    }
}

#[must_use]
pub fn created_at(record: &Record) -> Option<DateTime<Utc>> {
    record.get(CREATED_AT).and_then(crate::value::Value::as_timestamp)
}

#[must_use]
pub fn modified_at(record: &Record) -> Option<DateTime<Utc>> {
    record.get(MODIFIED_AT).and_then(crate::value::Value::as_timestamp)
}
