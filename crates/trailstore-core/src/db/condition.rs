use crate::{
    action::FieldPath,
    value::{Item, Value, strict_order_cmp, structural_eq},
};
use std::{cmp::Ordering, fmt, ops::Bound};

///
/// Condition
///
/// Write precondition evaluated by the adapter against the stored item.
/// A missing item is evaluated as an empty one, so `NotExists` on the
/// partition key expresses "create only".
///

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Exists(FieldPath),
    NotExists(FieldPath),
    Eq(FieldPath, Value),
    Ne(FieldPath, Value),
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
}

impl Condition {
    pub fn exists(path: impl Into<FieldPath>) -> Self {
        Self::Exists(path.into())
    }

    pub fn not_exists(path: impl Into<FieldPath>) -> Self {
        Self::NotExists(path.into())
    }

    pub fn eq(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::Eq(path.into(), value.into())
    }

    pub fn ne(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::Ne(path.into(), value.into())
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut all) => {
                all.push(other);
                Self::And(all)
            }
            this => Self::And(vec![this, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut any) => {
                any.push(other);
                Self::Or(any)
            }
            this => Self::Or(vec![this, other]),
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    #[must_use]
    pub fn evaluate(&self, item: Option<&Item>) -> bool {
        let resolve = |path: &FieldPath| item.and_then(|item| path.resolve(item));

        match self {
            Self::Exists(path) => resolve(path).is_some(),
            Self::NotExists(path) => resolve(path).is_none(),
            Self::Eq(path, value) => resolve(path).is_some_and(|v| structural_eq(v, value)),
            Self::Ne(path, value) => !resolve(path).is_some_and(|v| structural_eq(v, value)),
            Self::And(all) => all.iter().all(|c| c.evaluate(item)),
            Self::Or(any) => any.iter().any(|c| c.evaluate(item)),
            Self::Not(inner) => !inner.evaluate(item),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists(path) => write!(f, "attribute_exists({path})"),
            Self::NotExists(path) => write!(f, "attribute_not_exists({path})"),
            Self::Eq(path, value) => write!(f, "{path} = {value}"),
            Self::Ne(path, value) => write!(f, "{path} <> {value}"),
            Self::And(all) => write_joined(f, all, "AND"),
            Self::Or(any) => write_joined(f, any, "OR"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Condition], op: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, " {op} ")?;
        }
        write!(f, "{part}")?;
    }
    write!(f, ")")
}

///
/// KeyCondition
/// Sort-key or index range-key predicate for queries.
///

#[derive(Clone, Debug, PartialEq)]
pub enum KeyCondition {
    Eq(Value),
    Range {
        lower: Bound<Value>,
        upper: Bound<Value>,
    },
    BeginsWith(String),
}

impl KeyCondition {
    /// `[lower, upper)`; a missing bound is unbounded.
    #[must_use]
    pub fn half_open(lower: Option<Value>, upper: Option<Value>) -> Self {
        Self::Range {
            lower: lower.map_or(Bound::Unbounded, Bound::Included),
            upper: upper.map_or(Bound::Unbounded, Bound::Excluded),
        }
    }

    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Eq(expected) => structural_eq(value, expected),
            Self::BeginsWith(prefix) => value.as_text().is_some_and(|v| v.starts_with(prefix)),
            Self::Range { lower, upper } => {
                let above = match lower {
                    Bound::Included(b) => matches!(
                        strict_order_cmp(value, b),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    Bound::Excluded(b) => {
                        matches!(strict_order_cmp(value, b), Some(Ordering::Greater))
                    }
                    Bound::Unbounded => true,
                };
                let below = match upper {
                    Bound::Included(b) => matches!(
                        strict_order_cmp(value, b),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    Bound::Excluded(b) => matches!(strict_order_cmp(value, b), Some(Ordering::Less)),
                    Bound::Unbounded => true,
                };

                above && below
            }
        }
    }
}

///
/// TESTS
///
