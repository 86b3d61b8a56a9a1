use crate::{
    error::Error,
    record::Record,
    value::{Item, Value, structural_eq},
};
use std::collections::BTreeMap;

///
/// ReferenceModel
/// Which public identity fields of a source record type get denormalized
/// into other records. Field order is the projection order.
///

#[derive(Debug, Eq, PartialEq)]
pub struct ReferenceModel {
    pub name: &'static str,
    pub source_table: &'static str,
    pub fields: &'static [&'static str],
}

impl ReferenceModel {
    #[must_use]
    pub const fn new(
        name: &'static str,
        source_table: &'static str,
        fields: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            source_table,
            fields,
        }
    }
}

///
/// Reference
///
/// Immutable projection of a record's identity fields, embedded in other
/// records instead of a read-time join. Compared field by field.
///

#[derive(Clone, Debug)]
pub struct Reference {
    model: &'static ReferenceModel,
    values: Vec<(&'static str, Value)>,
}

impl Reference {
    pub(crate) fn project(model: &'static ReferenceModel, attributes: &Item) -> Self {
        let values = model
            .fields
            .iter()
            .filter_map(|field| attributes.get(*field).map(|value| (*field, value.clone())))
            .collect();

        Self { model, values }
    }

    /// Decode a reference previously embedded with [`Reference::to_value`].
    pub fn from_value(model: &'static ReferenceModel, value: &Value) -> Result<Self, Error> {
        let map = value.as_map().ok_or_else(|| {
            Error::record_validation(format!(
                "reference '{}' must be a map, found {}",
                model.name,
                value.kind_label()
            ))
        })?;

        Ok(Self::project(model, map))
    }

    #[must_use]
    pub const fn model(&self) -> &'static ReferenceModel {
        self.model
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    /// Present fields in projection order.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(name, _)| *name)
    }

    #[must_use]
    pub fn is_of_model(&self, model: &ReferenceModel) -> bool {
        std::ptr::eq(self.model, model) || self.model == model
    }

    /// True when this reference still describes `record`: same source table
    /// and every projected field equal to the record's current value. A
    /// field absent from the reference must be absent from the record.
    #[must_use]
    pub fn is_ref_of(&self, record: &Record) -> bool {
        if self.model.source_table != record.table_name() {
            return false;
        }

        let attributes = record.attributes();
        self.model
            .fields
            .iter()
            .all(|field| match (self.get(field), attributes.get(*field)) {
                (Some(ours), Some(theirs)) => structural_eq(ours, theirs),
                (None, None) => true,
                _ => false,
            })
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Map(
            self.values
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.is_of_model(other.model)
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .all(|(name, value)| other.get(name).is_some_and(|o| structural_eq(value, o)))
    }
}

impl From<&Reference> for Value {
    fn from(reference: &Reference) -> Self {
        reference.to_value()
    }
}

impl From<Reference> for Value {
    fn from(reference: Reference) -> Self {
        reference.to_value()
    }
}
