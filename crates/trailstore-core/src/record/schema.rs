use crate::{
    constraint::SaveConstraint,
    error::Error,
    model::{FieldKind, FieldModel, IndexModel, TableModel},
    record::hook::{Behavior, HookRegistry},
};
use std::{collections::BTreeSet, fmt, sync::Arc};

///
/// RecordSchema
///
/// Immutable type descriptor for one record type: table key schema, field
/// declarations, the concatenated hook registry of every behavior, and the
/// save constraints. Shared by every record instance through an `Arc`.
///

pub struct RecordSchema {
    table: TableModel,
    fields: Vec<FieldModel>,
    hooks: HookRegistry,
    behaviors: Vec<&'static str>,
    constraints: Vec<Box<dyn SaveConstraint>>,
}

impl RecordSchema {
    pub fn builder(table: &'static str) -> RecordSchemaBuilder {
        RecordSchemaBuilder::new(table)
    }

    #[must_use]
    pub const fn table(&self) -> &TableModel {
        &self.table
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.table.name
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// All declared fields: keys first, then attributes, then meta fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldModel] {
        &self.fields
    }

    #[must_use]
    pub fn is_meta(&self, name: &str) -> bool {
        self.field(name).is_some_and(|field| field.meta)
    }

    pub fn meta_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|field| field.meta)
            .map(|field| field.name)
    }

    #[must_use]
    pub const fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Behavior names in composition order.
    #[must_use]
    pub fn behaviors(&self) -> &[&'static str] {
        &self.behaviors
    }

    pub fn constraint_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constraints.iter().map(|constraint| constraint.name())
    }

    pub(crate) fn constraints(&self) -> &[Box<dyn SaveConstraint>] {
        &self.constraints
    }
}

impl fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field("behaviors", &self.behaviors)
            .field("constraints", &self.constraint_names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

///
/// RecordSchemaBuilder
///
/// Declares a record type as a base record plus an ordered list of
/// behaviors. Hook lists and meta-attribute declarations are concatenated
/// in the order behaviors are added.
///

#[must_use]
pub struct RecordSchemaBuilder {
    table: &'static str,
    partition_key: Option<FieldModel>,
    sort_key: Option<FieldModel>,
    fields: Vec<FieldModel>,
    indexes: Vec<IndexModel>,
    hooks: HookRegistry,
    behaviors: Vec<&'static str>,
    constraints: Vec<Box<dyn SaveConstraint>>,
}

impl RecordSchemaBuilder {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            partition_key: None,
            sort_key: None,
            fields: Vec::new(),
            indexes: Vec::new(),
            hooks: HookRegistry::default(),
            behaviors: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub const fn partition_key(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.partition_key = Some(FieldModel::required(name, kind));
        self
    }

    pub const fn sort_key(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.sort_key = Some(FieldModel::required(name, kind));
        self
    }

    pub fn field(mut self, field: FieldModel) -> Self {
        self.fields.push(field);
        self
    }

    pub fn index(mut self, index: IndexModel) -> Self {
        self.indexes.push(index);
        self
    }

    /// Compose a behavior; its hooks run after those already registered.
    pub fn behavior(mut self, behavior: impl Behavior) -> Self {
        behavior.register(&mut self.hooks);
        self.behaviors.push(behavior.name());
        self
    }

    /// Register record-type-specific hooks inline.
    pub fn hooks(mut self, register: impl FnOnce(&mut HookRegistry)) -> Self {
        register(&mut self.hooks);
        self
    }

    /// Add a save precondition, checked after `beforeSave` hooks.
    pub fn constraint(mut self, constraint: impl SaveConstraint + 'static) -> Self {
        self.constraints.push(Box::new(constraint));
        self
    }

    pub fn build(mut self) -> Result<Arc<RecordSchema>, Error> {
        let table = self.table;

        // Phase 1: assemble field declarations, keys first.
        let partition_key = self.partition_key.ok_or_else(|| {
            Error::schema_invalid(format!("table '{table}' declares no partition key"))
        })?;
        let meta_fields = std::mem::take(&mut self.hooks.meta_fields);

        let mut fields = Vec::with_capacity(self.fields.len() + meta_fields.len() + 2);
        fields.push(partition_key);
        fields.extend(self.sort_key);
        fields.extend(self.fields);
        fields.extend(meta_fields);

        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(field.name) {
                return Err(Error::schema_invalid(format!(
                    "field '{}' is declared more than once on table '{table}'",
                    field.name
                )));
            }
        }

        // Phase 2: every index and action hook must reference declared fields.
        let mut index_names = BTreeSet::new();
        for index in &self.indexes {
            if !index_names.insert(index.name) {
                return Err(Error::schema_invalid(format!(
                    "index '{}' is declared more than once on table '{table}'",
                    index.name
                )));
            }
            for key in std::iter::once(index.hash_key).chain(index.range_key) {
                if !seen.contains(key) {
                    return Err(Error::schema_invalid(format!(
                        "index {index} on table '{table}' references undeclared field '{key}'"
                    )));
                }
            }
        }

        for (_, field) in self.hooks.action_hooks.keys() {
            let root = field.split('.').next().unwrap_or_default();
            if !seen.contains(root) {
                return Err(Error::schema_invalid(format!(
                    "action hook on table '{table}' targets undeclared field '{field}'"
                )));
            }
        }

        let schema = RecordSchema {
            table: TableModel {
                name: table,
                partition_key: partition_key.name,
                sort_key: self.sort_key.map(|field| field.name),
                indexes: self.indexes,
            },
            fields,
            hooks: self.hooks,
            behaviors: self.behaviors,
            constraints: self.constraints,
        };

        // Phase 3: constraints check their index wiring against the result.
        for constraint in &schema.constraints {
            constraint.validate(&schema)?;
        }

        Ok(Arc::new(schema))
    }
}
