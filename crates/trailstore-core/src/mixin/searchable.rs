use crate::{
    action::{ActionKind, UpdateAction},
    error::Error,
    model::{FieldKind, FieldModel},
    record::{
        Record,
        hook::{Behavior, HookRegistry},
    },
    value::Value,
};

/// Canonical search key: all whitespace removed, lower-cased.
///
/// `"Cheesy  Grits"`, `"cheesy grits"` and `"CheesyGrits"` all map to
/// `"cheesygrits"`.
#[must_use]
pub fn searchable_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

///
/// Searchable
///
/// Keeps `target` equal to `searchable_value(source)`. Full writes recompute
/// it in `onInit` and `beforeSave`; partial updates get a paired action from
/// the `(set, source)` and `(remove, source)` action hooks.
///

#[derive(Clone, Copy, Debug)]
pub struct Searchable {
    source: &'static str,
    target: &'static str,
}

impl Searchable {
    #[must_use]
    pub const fn new(source: &'static str, target: &'static str) -> Self {
        Self { source, target }
    }

    #[must_use]
    pub const fn source(&self) -> &'static str {
        self.source
    }

    #[must_use]
    pub const fn target(&self) -> &'static str {
        self.target
    }
}

impl Behavior for Searchable {
    fn name(&self) -> &'static str {
        "searchable"
    }

    fn register(&self, hooks: &mut HookRegistry) {
        let Self { source, target } = *self;

        hooks
            .meta_field(FieldModel::optional(target, FieldKind::Text))
            .on_init("set_searchable_value", move |record| {
                normalize(record, source, target)
            })
            .before_save("set_searchable_value", move |record, _| {
                normalize(record, source, target)
            })
            .on_action(
                ActionKind::Set,
                source,
                "generate_searchable_action",
                move |record, value| {
                    let text = source_text(record, source, value)?;
                    Ok(vec![UpdateAction::set(target, searchable_value(text))])
                },
            )
            .on_action(
                ActionKind::Remove,
                source,
                "clear_searchable_value",
                move |_, _| Ok(vec![UpdateAction::remove(target)]),
            );
    }
}

fn normalize(record: &mut Record, source: &'static str, target: &'static str) -> Result<(), Error> {
    let normalized = searchable_value(source_text(record, source, record.get(source))?);

    record.set(target, normalized)
}

fn source_text<'a>(
    record: &Record,
    source: &str,
    value: Option<&'a Value>,
) -> Result<&'a str, Error> {
    match value {
        Some(Value::Text(text)) => Ok(text),
        Some(other) => Err(Error::hook_validation(format!(
            "searchable source '{source}' of '{}' must be text, found {}",
            record.table_name(),
            other.kind_label()
        ))),
        None => Err(Error::hook_validation(format!(
            "searchable source '{source}' of '{}' is missing",
            record.table_name()
        ))),
    }
}

///
/// TESTS
///
