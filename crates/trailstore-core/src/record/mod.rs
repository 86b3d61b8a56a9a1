//! Record lifecycle.
//!
//! A `Record` is one in-memory instance of a declared record type. It owns
//! its attribute cache and pending update actions; every adapter call goes
//! through the `Db` handle passed in by the caller.
pub mod hook;
pub mod reference;
pub mod schema;


use crate::{
    action::{ActionKind, UpdateAction},
    db::{Db, condition::Condition},
    error::Error,
    model::PrimaryKey,
    obs::sink::MetricsEvent,
    value::{Item, Value, structural_eq},
};
use hook::HookContext;
use reference::{Reference, ReferenceModel};
use schema::RecordSchema;
use std::{fmt, sync::Arc};
use tracing::{debug, trace, warn};

///
/// Record
///

#[derive(Clone)]
pub struct Record {
    schema: Arc<RecordSchema>,
    values: Item,
    actions: Vec<UpdateAction>,
    persisted: bool,
}

impl Record {
    /// Build an in-memory record and run every `onInit` hook in order.
    ///
    /// Null attributes are treated as absent. Unknown attribute names are
    /// rejected; the store may be schemaless but record types are not.
    pub fn new<I, K>(
        schema: &Arc<RecordSchema>,
        partition_key: Option<Value>,
        sort_key: Option<Value>,
        attributes: I,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut record = Self {
            schema: Arc::clone(schema),
            values: Item::new(),
            actions: Vec::new(),
            persisted: false,
        };

        let table = schema.table();
        if let Some(pk) = partition_key {
            record.set(table.partition_key, pk)?;
        }
        if let Some(sk) = sort_key {
            let Some(field) = table.sort_key else {
                return Err(Error::record_validation(format!(
                    "table '{}' declares no sort key",
                    table.name
                )));
            };
            record.set(field, sk)?;
        }
        for (name, value) in attributes {
            record.set(name.as_ref(), value)?;
        }

        for hook in &schema.hooks().on_init {
            trace!(table = table.name, hook = hook.name, "on_init");
            (hook.run)(&mut record)?;
        }

        Ok(record)
    }

    /// Rehydrate a stored item. `onInit` hooks do not run on loaded records.
    #[must_use]
    pub fn from_item(schema: &Arc<RecordSchema>, item: Item) -> Self {
        Self {
            schema: Arc::clone(schema),
            values: item,
            actions: Vec::new(),
            persisted: true,
        }
    }

    /// Fetch a record by primary key.
    pub fn load(
        db: &Db,
        schema: &Arc<RecordSchema>,
        partition_key: impl Into<Value>,
        sort_key: Option<Value>,
    ) -> Result<Self, Error> {
        let key = PrimaryKey::new(partition_key.into(), sort_key);
        let table = db.table_ref(schema);
        let item = db.adapter().get(&table, &key)?;

        db.record(MetricsEvent::Load {
            table: schema.name(),
            found: item.is_some(),
        });

        match item {
            Some(item) => Ok(Self::from_item(schema, item)),
            None => Err(Error::not_found(&table.name, &key)),
        }
    }

    pub fn exists_by_key(
        db: &Db,
        schema: &Arc<RecordSchema>,
        partition_key: impl Into<Value>,
        sort_key: Option<Value>,
    ) -> Result<bool, Error> {
        let key = PrimaryKey::new(partition_key.into(), sort_key);

        Ok(db.adapter().get(&db.table_ref(schema), &key)?.is_some())
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub const fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    #[must_use]
    pub fn table_name(&self) -> &'static str {
        self.schema.name()
    }

    /// Whether the record has been written or loaded.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.persisted
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    #[must_use]
    pub fn get_text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    /// Assign a declared field. Assigning `Null` clears it.
    ///
    /// Key fields are immutable once the record is persisted.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), Error> {
        self.declared(field)?;
        if self.persisted && self.schema.table().is_key_field(field) {
            return Err(Error::record_validation(format!(
                "key field '{field}' of '{}' cannot change after save",
                self.table_name()
            )));
        }

        match value.into() {
            Value::Null => {
                self.values.remove(field);
            }
            value => {
                self.values.insert(field.to_string(), value);
            }
        }

        Ok(())
    }

    pub fn remove(&mut self, field: &str) -> Result<Option<Value>, Error> {
        self.declared(field)?;
        if self.persisted && self.schema.table().is_key_field(field) {
            return Err(Error::record_validation(format!(
                "key field '{field}' of '{}' cannot change after save",
                self.table_name()
            )));
        }

        Ok(self.values.remove(field))
    }

    #[must_use]
    pub fn partition_key(&self) -> Option<&Value> {
        self.get(self.schema.table().partition_key)
    }

    #[must_use]
    pub fn sort_key(&self) -> Option<&Value> {
        self.schema.table().sort_key.and_then(|field| self.get(field))
    }

    pub fn key(&self) -> Result<PrimaryKey, Error> {
        let table = self.schema.table();
        let partition = self.partition_key().cloned().ok_or_else(|| {
            Error::record_validation(format!(
                "partition key '{}' of '{}' is not set",
                table.partition_key, table.name
            ))
        })?;

        let sort = match table.sort_key {
            Some(field) => Some(self.get(field).cloned().ok_or_else(|| {
                Error::record_validation(format!(
                    "sort key '{field}' of '{}' is not set",
                    table.name
                ))
            })?),
            None => None,
        };

        Ok(PrimaryKey::new(partition, sort))
    }

    /// The public business view: every present field except meta attributes.
    #[must_use]
    pub fn attributes(&self) -> Item {
        self.values
            .iter()
            .filter(|(name, _)| !self.schema.is_meta(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Every present field, meta attributes included.
    #[must_use]
    pub const fn values(&self) -> &Item {
        &self.values
    }

    ///
    /// UPDATE ACTIONS
    ///

    /// Queue one field-level action by kind name (`set`, `remove`, `add`,
    /// `delete`, case-insensitive).
    pub fn add_update_action(
        &mut self,
        field: &str,
        kind: &str,
        value: Option<Value>,
    ) -> Result<(), Error> {
        let kind = kind.parse::<ActionKind>()?;

        self.add_action(UpdateAction::new(field, kind, value))
    }

    /// Queue a literal action plus every action its registered action hooks
    /// generate. Nothing is queued if validation or a hook fails.
    pub fn add_action(&mut self, action: UpdateAction) -> Result<(), Error> {
        self.validate_action(&action)?;

        let schema = Arc::clone(&self.schema);
        let mut generated = Vec::new();
        for hook in schema
            .hooks()
            .action_hooks_for(action.kind, &action.path.to_string())
        {
            trace!(
                table = schema.name(),
                hook = hook.name,
                action = %action,
                "action hook"
            );
            for extra in (hook.run)(&*self, action.value.as_ref())? {
                self.validate_action(&extra)?;
                generated.push(extra);
            }
        }

        self.actions.push(action);
        self.actions.extend(generated);

        Ok(())
    }

    #[must_use]
    pub fn update_actions(&self) -> &[UpdateAction] {
        &self.actions
    }

    pub fn clear_update_actions(&mut self) {
        self.actions.clear();
    }

    ///
    /// PERSISTENCE
    ///

    pub fn save(&mut self, db: &Db) -> Result<(), Error> {
        self.save_with(db, None)
    }

    /// Run `beforeSave` hooks, validate, check constraints, then write the
    /// whole record under the optional caller condition.
    pub fn save_with(&mut self, db: &Db, condition: Option<Condition>) -> Result<(), Error> {
        let schema = Arc::clone(&self.schema);
        let ctx = HookContext { now: db.now() };

        for hook in &schema.hooks().before_save {
            trace!(table = schema.name(), hook = hook.name, "before_save");
            (hook.run)(&mut *self, &ctx)?;
        }

        self.validate_for_save()?;
        let key = self.key()?;

        for constraint in schema.constraints() {
            if let Err(err) = constraint.check(db, self) {
                if err.is_already_exists() {
                    warn!(
                        table = schema.name(),
                        constraint = constraint.name(),
                        %key,
                        "save rejected"
                    );
                    db.record(MetricsEvent::ConstraintRejected {
                        table: schema.name(),
                        constraint: constraint.name(),
                    });
                }
                return Err(err);
            }
        }

        let table = db.table_ref(&schema);
        if let Err(err) = db
            .adapter()
            .put(&table, self.values.clone(), condition.as_ref())
        {
            db.record(MetricsEvent::WriteFailed {
                table: schema.name(),
                class: err.class,
            });
            return Err(err);
        }

        self.persisted = true;
        debug!(table = %table.name, %key, "saved");
        db.record(MetricsEvent::Save {
            table: schema.name(),
        });

        Ok(())
    }

    pub fn update(&mut self, db: &Db) -> Result<(), Error> {
        self.update_with(db, None)
    }

    /// Apply the pending actions plus every `onUpdate` hook's actions as one
    /// atomic adapter update.
    ///
    /// On success the record adopts the stored post-image and the pending
    /// list is cleared; on any failure the pending list is left untouched.
    pub fn update_with(&mut self, db: &Db, condition: Option<Condition>) -> Result<(), Error> {
        if self.actions.is_empty() {
            return Err(Error::noop(format!(
                "no update actions pending on '{}'; queue some with add_update_action",
                self.table_name()
            )));
        }

        let schema = Arc::clone(&self.schema);
        let key = self.key()?;
        let ctx = HookContext { now: db.now() };

        let mut batch = self.actions.clone();
        for hook in &schema.hooks().on_update {
            trace!(table = schema.name(), hook = hook.name, "on_update");
            batch.extend((hook.run)(&*self, &ctx)?);
        }

        let table = db.table_ref(&schema);
        let item = match db
            .adapter()
            .update(&table, &key, &batch, condition.as_ref())
        {
            Ok(item) => item,
            Err(err) => {
                db.record(MetricsEvent::WriteFailed {
                    table: schema.name(),
                    class: err.class,
                });
                return Err(err);
            }
        };

        self.values = item;
        self.actions.clear();
        self.persisted = true;

        debug!(table = %table.name, %key, actions = batch.len(), "updated");
        db.record(MetricsEvent::Update {
            table: schema.name(),
            actions: batch.len(),
        });

        Ok(())
    }

    /// Reload attributes from the store. Pending actions are kept.
    pub fn refresh(&mut self, db: &Db) -> Result<(), Error> {
        let key = self.key()?;
        let table = db.table_ref(&self.schema);
        let item = db.adapter().get(&table, &key)?;

        db.record(MetricsEvent::Load {
            table: self.table_name(),
            found: item.is_some(),
        });

        let item = item.ok_or_else(|| Error::not_found(&table.name, &key))?;
        debug!(table = %table.name, %key, "refreshed");
        self.values = item;
        self.persisted = true;

        Ok(())
    }

    pub fn delete(&mut self, db: &Db) -> Result<(), Error> {
        self.delete_with(db, None)
    }

    pub fn delete_with(&mut self, db: &Db, condition: Option<Condition>) -> Result<(), Error> {
        let key = self.key()?;
        let table = db.table_ref(&self.schema);
        db.adapter().delete(&table, &key, condition.as_ref())?;

        debug!(table = %table.name, %key, "deleted");
        db.record(MetricsEvent::Delete {
            table: self.table_name(),
        });
        self.persisted = false;

        Ok(())
    }

    pub fn exists(&self, db: &Db) -> Result<bool, Error> {
        let key = self.key()?;

        Ok(db.adapter().get(&db.table_ref(&self.schema), &key)?.is_some())
    }

    /// Project this record's public identity fields.
    pub fn to_reference(&self, model: &'static ReferenceModel) -> Result<Reference, Error> {
        if model.source_table != self.table_name() {
            return Err(Error::record_validation(format!(
                "reference '{}' projects '{}', not '{}'",
                model.name,
                model.source_table,
                self.table_name()
            )));
        }

        Ok(Reference::project(model, &self.attributes()))
    }

    ///
    /// VALIDATION
    ///

    fn declared(&self, field: &str) -> Result<&crate::model::FieldModel, Error> {
        self.schema.field(field).ok_or_else(|| {
            Error::record_validation(format!(
                "field '{field}' is not declared on '{}'",
                self.table_name()
            ))
        })
    }

    fn validate_for_save(&self) -> Result<(), Error> {
        for field in self.schema.fields() {
            match self.values.get(field.name) {
                Some(value) if !field.kind.accepts(value) => {
                    return Err(Error::record_validation(format!(
                        "field '{}' of '{}' expects {:?}, found {}",
                        field.name,
                        self.table_name(),
                        field.kind,
                        value.kind_label()
                    )));
                }
                None if !field.nullable => {
                    return Err(Error::record_validation(format!(
                        "required field '{}' of '{}' is missing",
                        field.name,
                        self.table_name()
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn validate_action(&self, action: &UpdateAction) -> Result<(), Error> {
        action.path.validate()?;

        let root = action.path.root();
        let field = self.schema.field(root).ok_or_else(|| {
            Error::action_validation(format!(
                "field '{root}' is not declared on '{}'",
                self.table_name()
            ))
        })?;
        if self.schema.table().is_key_field(root) {
            return Err(Error::action_validation(format!(
                "field '{root}' cannot be updated because it is part of the key"
            )));
        }
        if action.path.is_nested() && !field.kind.is_document() {
            return Err(Error::action_validation(format!(
                "path '{}' addresses inside a {:?} field",
                action.path, field.kind
            )));
        }

        let value = action.value.as_ref().filter(|value| !value.is_null());
        // nested members are schemaless; only the root shape is checked
        let checked = !action.path.is_nested();

        match (action.kind, value) {
            (ActionKind::Set, None) => Err(Error::action_validation(format!(
                "set on '{}' requires a value; use remove to clear it",
                action.path
            ))),
            (ActionKind::Set, Some(value)) if checked && !field.kind.accepts(value) => {
                Err(Error::action_validation(format!(
                    "set on '{}' expects {:?}, found {}",
                    action.path,
                    field.kind,
                    value.kind_label()
                )))
            }
            (ActionKind::Remove, Some(_)) => Err(Error::action_validation(format!(
                "remove on '{}' takes no value",
                action.path
            ))),
            (ActionKind::Add | ActionKind::Delete, None) => Err(Error::action_validation(format!(
                "{} on '{}' requires a value",
                action.kind, action.path
            ))),
            (ActionKind::Add, Some(value))
                if checked
                    && !((field.kind.is_numeric() || field.kind.is_set())
                        && field.kind.accepts(value)) =>
            {
                Err(Error::action_validation(format!(
                    "add on '{}' needs a number or set field and matching value, found {:?} and {}",
                    action.path,
                    field.kind,
                    value.kind_label()
                )))
            }
            (ActionKind::Delete, Some(value))
                if checked && !(field.kind.is_set() && field.kind.accepts(value)) =>
            {
                Err(Error::action_validation(format!(
                    "delete on '{}' needs a set field and matching value, found {:?} and {}",
                    action.path,
                    field.kind,
                    value.kind_label()
                )))
            }
            _ => Ok(()),
        }
    }
}

impl PartialEq for Record {
    /// Equal when the public attribute views are structurally equal; meta
    /// attribute churn (version, timestamps, search keys) is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.table_name() == other.table_name()
            && structural_eq(
                &Value::Map(self.attributes()),
                &Value::Map(other.attributes()),
            )
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.table_name())
            .field("values", &self.values)
            .field("pending_actions", &self.actions.len())
            .field("persisted", &self.persisted)
            .finish()
    }
}
