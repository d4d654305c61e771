//! Attribute cleaning — turns a nested trait/property mapping into the flat,
//! null-free mapping the Frontleaf API accepts for `userData`, `accountData`
//! and `eventData`.

use serde_json::Value;

use frontleaf_core::types::{Attributes, CleanData, Scalar};

/// Top-level keys already carried outside the data container.
pub const EXCLUDED_KEYS: [&str; 4] = ["id", "name", "firstName", "lastName"];

/// Separator between path segments of a flattened key.
const PATH_SEPARATOR: char = ' ';

/// Clean an attribute mapping:
///
/// 1. drop the top-level [`EXCLUDED_KEYS`] (nested occurrences are kept),
/// 2. flatten nested objects into space-delimited keys (`address state`),
/// 3. drop nulls and render arrays as comma-separated strings.
///
/// Arrays are leaves: objects inside an array are never flattened.
pub fn clean(attributes: &Attributes) -> CleanData {
    let mut out = CleanData::new();
    for (key, value) in attributes {
        if EXCLUDED_KEYS.contains(&key.as_str()) {
            continue;
        }
        flatten_into(&mut out, key.clone(), value);
    }
    out
}

fn flatten_into(out: &mut CleanData, key: String, value: &Value) {
    match value {
        Value::Object(children) => {
            for (child, value) in children {
                let path = format!("{}{}{}", key, PATH_SEPARATOR, child);
                flatten_into(out, path, value);
            }
        }
        Value::Null => {}
        Value::Array(items) => {
            out.insert(key, Scalar::String(join_array(items)));
        }
        Value::Bool(b) => {
            out.insert(key, Scalar::Bool(*b));
        }
        Value::Number(n) => {
            out.insert(key, Scalar::Number(n.clone()));
        }
        Value::String(s) => {
            out.insert(key, Scalar::String(s.clone()));
        }
    }
}

/// Comma-join array elements using their default string form.
fn join_array(items: &[Value]) -> String {
    items
        .iter()
        .map(element_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Default string form of an array element. Nulls become empty, nested arrays
/// are joined recursively and objects collapse to `[object Object]`.
fn element_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => join_array(items),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Number in its default string form: integers as-is, floats in shortest
/// round-trip digits laid out like `Number.prototype.toString` (`2.0` → `2`,
/// `-0.0` → `0`, `1e300` → `1e+300`, `1e-6` → `0.000001`).
fn number_string(n: &serde_json::Number) -> String {
    if !n.is_f64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) => float_string(f),
        None => n.to_string(),
    }
}

fn float_string(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    if f.is_sign_negative() {
        return format!("-{}", float_string(-f));
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e2`.
    let sci = format!("{:e}", f);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exp + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let e = n - 1;
        let sign = if e < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, e.abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_clean_and_flatten_source_data() {
        let result = clean(&attrs(json!({
            "id": 123456,
            "name": "Delete Me",
            "layers": ["chocolate", "strawberry", "fudge"],
            "revenue": 19.95,
            "numLayers": 10,
            "whoCares": null,
            "fat": 0.02,
            "bacon": "1",
            "date": "2014-01-01T00:00:00.000Z",
            "address": {
                "state": "CA",
                "zip": 94107,
                "city": "San Francisco"
            }
        })));

        assert!(!result.contains_key("id"));
        assert!(!result.contains_key("name"));
        assert!(!result.contains_key("whoCares"));
        assert!(!result.contains_key("address"));
        assert_eq!(result["address state"], Scalar::from("CA"));
        assert_eq!(result["address zip"], Scalar::from(94107_i64));
        assert_eq!(result["address city"], Scalar::from("San Francisco"));
        assert_eq!(result["layers"], Scalar::from("chocolate,strawberry,fudge"));
        assert_eq!(result["revenue"], Scalar::Number(json_number(19.95)));
        assert_eq!(result["numLayers"], Scalar::from(10_i64));
        assert_eq!(result["fat"], Scalar::Number(json_number(0.02)));
        assert_eq!(result["bacon"], Scalar::from("1"));
        assert_eq!(result["date"], Scalar::from("2014-01-01T00:00:00.000Z"));
        assert_eq!(result.len(), 9);
    }

    fn json_number(f: f64) -> serde_json::Number {
        serde_json::Number::from_f64(f).unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert!(clean(&Attributes::new()).is_empty());
    }

    #[test]
    fn test_all_excluded_keys_removed_at_top_level() {
        let result = clean(&attrs(json!({
            "id": "u1",
            "name": "Ann Lee",
            "firstName": "Ann",
            "lastName": "Lee",
            "plan": "pro"
        })));
        assert_eq!(result.len(), 1);
        assert_eq!(result["plan"], Scalar::from("pro"));
    }

    #[test]
    fn test_excluded_names_kept_when_nested() {
        let result = clean(&attrs(json!({
            "company": { "id": 7, "name": "Initech" }
        })));
        assert_eq!(result["company id"], Scalar::from(7_i64));
        assert_eq!(result["company name"], Scalar::from("Initech"));
    }

    #[test]
    fn test_deep_paths_join_every_ancestor() {
        let result = clean(&attrs(json!({
            "a": { "b": { "c": { "d": true } } },
            "a2": { "b": null, "c": {} }
        })));
        assert_eq!(result.len(), 1);
        assert_eq!(result["a b c d"], Scalar::Bool(true));
    }

    #[test]
    fn test_arrays_are_leaves() {
        let result = clean(&attrs(json!({
            "items": [{ "sku": "A" }, { "sku": "B" }],
            "mixed": [1, 2.5, 3.0, true, null, "x", [4, [5, 6]]],
            "empty": []
        })));
        assert_eq!(result["items"], Scalar::from("[object Object],[object Object]"));
        assert_eq!(result["mixed"], Scalar::from("1,2.5,3,true,,x,4,5,6"));
        assert_eq!(result["empty"], Scalar::from(""));
        assert!(!result.keys().any(|k| k.starts_with("items ")));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let input = attrs(json!({ "id": 1, "nested": { "x": null } }));
        let before = input.clone();
        let _ = clean(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn test_later_input_entry_wins_on_collision() {
        let nested_last: Attributes =
            serde_json::from_str(r#"{"a b": 1, "a": {"b": 2}}"#).unwrap();
        assert_eq!(clean(&nested_last)["a b"], Scalar::from(2_i64));

        let flat_last: Attributes =
            serde_json::from_str(r#"{"a": {"b": 2}, "a b": 1}"#).unwrap();
        assert_eq!(clean(&flat_last)["a b"], Scalar::from(1_i64));
    }

    #[test]
    fn test_float_string_forms() {
        assert_eq!(float_string(-0.0), "0");
        assert_eq!(float_string(3.0), "3");
        assert_eq!(float_string(-2.5), "-2.5");
        assert_eq!(float_string(123.456), "123.456");
        assert_eq!(float_string(1e20), "100000000000000000000");
        assert_eq!(float_string(1e21), "1e+21");
        assert_eq!(float_string(1e300), "1e+300");
        assert_eq!(float_string(1.5e300), "1.5e+300");
        assert_eq!(float_string(0.000001), "0.000001");
        assert_eq!(float_string(1.5e-7), "1.5e-7");
        assert_eq!(float_string(1e-7), "1e-7");
    }

    #[test]
    fn test_array_numbers_use_default_string_form() {
        let result = clean(&attrs(json!({ "n": [-0.0, 1e300, 0.5, 42] })));
        assert_eq!(result["n"], Scalar::from("0,1e+300,0.5,42"));
    }
}
