use crate::value::{Value, strict_order_cmp, structural_eq};
use serde_json::json;
use std::cmp::Ordering;

// ---- helpers -----------------------------------------------------------

fn txt(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn list(items: &[&str]) -> Value {
    Value::List(items.iter().map(|s| txt(s)).collect())
}

// ---- structural equality ----------------------------------------------

#[test]
fn scalar_lists_compare_unordered() {
    assert!(structural_eq(
        &list(&["1.1", "1.2", "2.2"]),
        &list(&["2.2", "1.1", "1.2"])
    ));
    assert!(!structural_eq(&list(&["a", "b"]), &list(&["a", "c"])));
    assert!(!structural_eq(&list(&["a"]), &list(&["a", "a"])));
}

#[test]
fn map_lists_compare_in_declaration_order() {
    let a = Value::map([("name", txt("x"))]);
    let b = Value::map([("name", txt("y"))]);

    assert!(structural_eq(
        &Value::List(vec![a.clone(), b.clone()]),
        &Value::List(vec![a.clone(), b.clone()])
    ));
    assert!(!structural_eq(
        &Value::List(vec![a.clone(), b.clone()]),
        &Value::List(vec![b, a])
    ));
}

#[test]
fn nested_maps_compare_key_wise() {
    let left = Value::map([
        ("founder", txt("G")),
        ("trails", Value::List(vec![Value::Int(2), Value::Int(1)])),
    ]);
    let right = Value::map([
        ("trails", Value::List(vec![Value::Int(1), Value::Int(2)])),
        ("founder", txt("G")),
    ]);
    let missing = Value::map([("founder", txt("G"))]);

    assert!(structural_eq(&left, &right));
    assert!(!structural_eq(&left, &missing));
}

#[test]
fn numbers_compare_across_int_and_float() {
    assert!(structural_eq(&Value::Int(3), &Value::Float(3.0)));
    assert!(!structural_eq(&Value::Int(3), &Value::Float(3.5)));
    assert!(!structural_eq(&Value::Float(f64::NAN), &Value::Float(f64::NAN)));
}

#[test]
fn strict_order_rejects_mixed_kinds() {
    assert_eq!(strict_order_cmp(&txt("a"), &Value::Int(1)), None);
    assert_eq!(
        strict_order_cmp(&txt("dqcjqc"), &txt("dqcjqd")),
        Some(Ordering::Less)
    );
    assert_eq!(
        strict_order_cmp(&Value::Int(2), &Value::Float(1.5)),
        Some(Ordering::Greater)
    );
}

// ---- json bridge -------------------------------------------------------

#[test]
fn json_objects_become_maps() {
    let contact = json!([{"name": "test person", "phone": "4445556666"}]);
    let value = Value::from_json(&contact);

    let Value::List(items) = &value else {
        panic!("expected list, found {value:?}");
    };
    let map = items[0].as_map().expect("contact entry should be a map");
    assert_eq!(map.get("phone"), Some(&txt("4445556666")));
    assert_eq!(value.to_json(), contact);
}

#[test]
fn json_numbers_keep_integer_shape() {
    assert_eq!(Value::from_json(&json!(7)), Value::Int(7));
    assert_eq!(Value::from_json(&json!(1.5)), Value::Float(1.5));
    assert_eq!(Value::Float(f64::INFINITY).to_json(), json!(null));
}

#[test]
fn options_convert_to_null() {
    assert_eq!(Value::from(None::<String>), Value::Null);
    assert_eq!(Value::from(Some("x")), txt("x"));
}
