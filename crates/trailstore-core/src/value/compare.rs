use crate::value::Value;
use std::cmp::Ordering;

/// Strict comparator for mutually orderable scalar values.
///
/// Numbers compare across the int/float split. Returns `None` for
/// mismatched, composite, or non-orderable (NaN) values.
#[must_use]
pub fn strict_order_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            left.as_f64()?.partial_cmp(&right.as_f64()?)
        }
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Deep equality used for record comparison.
///
/// - Maps compare key-wise.
/// - Lists compare after sorting when every element is a mutually orderable
///   scalar, and positionally otherwise.
/// - Numbers compare numerically across the int/float split.
#[must_use]
pub fn structural_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| structural_eq(value, other)))
        }
        (Value::List(a), Value::List(b)) => list_eq(a, b),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            strict_order_cmp(left, right) == Some(Ordering::Equal)
        }
        _ => left == right,
    }
}

fn list_eq(left: &[Value], right: &[Value]) -> bool {
    if left.len() != right.len() {
        return false;
    }

    match (sorted_scalars(left), sorted_scalars(right)) {
        (Some(left), Some(right)) => left
            .iter()
            .zip(right.iter())
            .all(|(a, b)| structural_eq(a, b)),
        _ => left.iter().zip(right.iter()).all(|(a, b)| structural_eq(a, b)),
    }
}

// Sorted view of a list, or None when any pair of elements is not orderable.
fn sorted_scalars(items: &[Value]) -> Option<Vec<&Value>> {
    let Some(first) = items.first() else {
        return Some(Vec::new());
    };

    if items.iter().any(|item| strict_order_cmp(first, item).is_none()) {
        return None;
    }

    let mut sorted: Vec<&Value> = items.iter().collect();
    sorted.sort_by(|a, b| strict_order_cmp(a, b).unwrap_or(Ordering::Equal));

    Some(sorted)
}
