use crate::value::Value;

///
/// FieldKind
///
/// Declared attribute shape. `Number` accepts both integer and float values;
/// `Any` opts a field out of shape checks entirely.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Any,
    Bool,
    Float,
    Int,
    IntSet,
    List,
    Map,
    Number,
    Text,
    TextSet,
    Timestamp,
}

impl FieldKind {
    /// Whether a (non-null) value has this field's shape.
    #[must_use]
    pub const fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Any, _)
                | (Self::Bool, Value::Bool(_))
                | (Self::Float | Self::Number, Value::Float(_))
                | (Self::Int | Self::Number, Value::Int(_))
                | (Self::IntSet, Value::IntSet(_))
                | (Self::List, Value::List(_))
                | (Self::Map, Value::Map(_))
                | (Self::Text, Value::Text(_))
                | (Self::TextSet, Value::TextSet(_))
                | (Self::Timestamp, Value::Timestamp(_))
        )
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Float | Self::Int | Self::Number)
    }

    #[must_use]
    pub const fn is_set(self) -> bool {
        matches!(self, Self::IntSet | Self::TextSet)
    }

    /// Whether nested document paths may address members of this field.
    #[must_use]
    pub const fn is_document(self) -> bool {
        matches!(self, Self::Any | Self::Map | Self::List)
    }
}

///
/// FieldModel
/// Runtime field metadata used by validation and the public attribute view.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldModel {
    /// Attribute name as stored.
    pub name: &'static str,
    pub kind: FieldKind,
    /// Absent values are accepted at save time.
    pub nullable: bool,
    /// Excluded from `Record::attributes` and record equality.
    pub meta: bool,
}

impl FieldModel {
    #[must_use]
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            meta: false,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
            meta: false,
        }
    }

    /// A required meta attribute; behaviors populate these before validation.
    #[must_use]
    pub const fn meta(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            meta: true,
        }
    }
}
