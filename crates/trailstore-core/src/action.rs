//! Field-level update actions.
//!
//! An update is a list of actions applied atomically by the adapter. The
//! record accumulates literal actions from the caller; `onUpdate` hooks
//! append their own at apply time.

use crate::{
    error::Error,
    value::{Item, Value},
};
use std::{collections::BTreeMap, fmt, str::FromStr};

///
/// ActionKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ActionKind {
    Set,
    Remove,
    /// Add to a number, or union into a set.
    Add,
    /// Remove members from a set.
    Delete,
}

impl ActionKind {
    pub const ALL: [Self; 4] = [Self::Set, Self::Remove, Self::Add, Self::Delete];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Remove => "remove",
            Self::Add => "add",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();

        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| {
                Error::action_validation(format!(
                    "action '{s}' is not one of {}",
                    Self::ALL.map(Self::as_str).join(", ")
                ))
            })
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// FieldPath
/// Dotted document path; the first segment names a declared field.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    #[must_use]
    pub fn root(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.0.len() > 1
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.0.iter().any(String::is_empty) {
            return Err(Error::action_validation(format!(
                "field path '{self}' contains an empty segment"
            )));
        }

        Ok(())
    }

    /// Resolve the path against an item.
    #[must_use]
    pub fn resolve<'a>(&self, item: &'a Item) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        let mut current = item.get(first)?;
        for segment in rest {
            current = current.as_map()?.get(segment)?;
        }

        Some(current)
    }

    // Mutable slot for the leaf, creating intermediate maps as needed.
    fn slot_mut<'a>(&self, item: &'a mut Item) -> Result<&'a mut BTreeMap<String, Value>, Error> {
        let mut current = item;
        for segment in &self.0[..self.0.len().saturating_sub(1)] {
            let next = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Map(BTreeMap::new()));
            current = match next {
                Value::Map(map) => map,
                other => {
                    return Err(Error::action_validation(format!(
                        "path '{self}' traverses a {} value at '{segment}'",
                        other.kind_label()
                    )));
                }
            };
        }

        Ok(current)
    }

    fn leaf(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

///
/// UpdateAction
///

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateAction {
    pub path: FieldPath,
    pub kind: ActionKind,
    pub value: Option<Value>,
}

impl UpdateAction {
    pub fn new(path: impl Into<FieldPath>, kind: ActionKind, value: Option<Value>) -> Self {
        Self {
            path: path.into(),
            kind,
            value,
        }
    }

    pub fn set(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::new(path, ActionKind::Set, Some(value.into()))
    }

    pub fn remove(path: impl Into<FieldPath>) -> Self {
        Self::new(path, ActionKind::Remove, None)
    }

    pub fn add(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::new(path, ActionKind::Add, Some(value.into()))
    }

    pub fn delete(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::new(path, ActionKind::Delete, Some(value.into()))
    }

    /// Apply this action to an item in place.
    ///
    /// Used by in-process adapters; remote adapters translate actions into
    /// their native update expressions instead.
    pub fn apply(&self, item: &mut Item) -> Result<(), Error> {
        let slot = self.path.slot_mut(item)?;
        let leaf = self.path.leaf().to_string();

        match (self.kind, &self.value) {
            (ActionKind::Set, Some(Value::Null)) | (ActionKind::Remove, _) => {
                slot.remove(&leaf);
            }
            (ActionKind::Set, Some(value)) => {
                slot.insert(leaf, value.clone());
            }
            (ActionKind::Add, Some(value)) => {
                let merged = add_values(slot.get(&leaf), value).map_err(|message| {
                    Error::action_validation(format!("cannot add to '{}': {message}", self.path))
                })?;
                slot.insert(leaf, merged);
            }
            (ActionKind::Delete, Some(value)) => {
                let remaining = delete_values(slot.get(&leaf), value).map_err(|message| {
                    Error::action_validation(format!(
                        "cannot delete from '{}': {message}",
                        self.path
                    ))
                })?;
                match remaining {
                    Some(remaining) => slot.insert(leaf, remaining),
                    None => slot.remove(&leaf),
                };
            }
            (kind, None) => {
                return Err(Error::action_validation(format!(
                    "{kind} on '{}' requires a value",
                    self.path
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for UpdateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind.as_str().to_ascii_uppercase();
        match &self.value {
            Some(value) if self.kind == ActionKind::Set => {
                write!(f, "{kind} {} = {value}", self.path)
            }
            Some(value) => write!(f, "{kind} {} {value}", self.path),
            None => write!(f, "{kind} {}", self.path),
        }
    }
}

fn add_values(current: Option<&Value>, operand: &Value) -> Result<Value, String> {
    match (current, operand) {
        (None, value) if value.is_numeric() || value.is_set() => Ok(value.clone()),
        (Some(Value::Int(a)), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| "integer overflow".to_string()),
        (Some(a), b) if a.is_numeric() && b.is_numeric() => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(a + b)),
            _ => Err("non-numeric operand".to_string()),
        },
        (Some(Value::TextSet(a)), Value::TextSet(b)) => {
            Ok(Value::TextSet(a.union(b).cloned().collect()))
        }
        (Some(Value::IntSet(a)), Value::IntSet(b)) => {
            Ok(Value::IntSet(a.union(b).copied().collect()))
        }
        (current, operand) => Err(format!(
            "{} operand does not apply to {}",
            operand.kind_label(),
            current.map_or("null", Value::kind_label)
        )),
    }
}

fn delete_values(current: Option<&Value>, operand: &Value) -> Result<Option<Value>, String> {
    let remaining = match (current, operand) {
        (None, value) if value.is_set() => return Ok(None),
        (Some(Value::TextSet(a)), Value::TextSet(b)) => {
            Value::TextSet(a.difference(b).cloned().collect())
        }
        (Some(Value::IntSet(a)), Value::IntSet(b)) => {
            Value::IntSet(a.difference(b).copied().collect())
        }
        (current, operand) => {
            return Err(format!(
                "{} operand does not apply to {}",
                operand.kind_label(),
                current.map_or("null", Value::kind_label)
            ));
        }
    };

    // The store drops empty sets.
    let empty = match &remaining {
        Value::TextSet(set) => set.is_empty(),
        Value::IntSet(set) => set.is_empty(),
        _ => false,
    };

    Ok((!empty).then_some(remaining))
}

///
/// TESTS
///
