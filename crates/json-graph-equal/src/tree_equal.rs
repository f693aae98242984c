use serde_json::{Number, Value};

/// Compare two numbers by the value they denote.
///
/// Integers are compared exactly; as soon as one side is a real, both are
/// compared as `f64`.
pub fn numbers_equal(a: &Number, b: &Number) -> bool {
    let as_int = |n: &Number| {
        n.as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
    };
    match (as_int(a), as_int(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Deep equality with numeric canonicalization.
///
/// Objects are compared as maps (member order is ignored), arrays element by
/// element. Values of different JSON types are never equal.
///
/// ```
/// use json_graph_equal::tree_equal;
/// use serde_json::json;
///
/// assert!(tree_equal(&json!({"a": 1}), &json!({"a": 1.0})));
/// assert!(!tree_equal(&json!({"a": 1}), &json!({"a": "1"})));
/// ```
pub fn tree_equal(a: &Value, b: &Value) -> bool {
    first_difference(a, b).is_none()
}

/// Path of the first node where `a` and `b` differ, `None` if they are equal.
///
/// The path uses the same `/`-separated, unescaped segments as the loader's
/// error paths; the root is `""`.
pub fn first_difference(a: &Value, b: &Value) -> Option<String> {
    let mut path = String::new();
    if diff(a, b, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn diff(a: &Value, b: &Value, path: &mut String) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => false,
        (Value::Bool(x), Value::Bool(y)) => x != y,
        (Value::Number(x), Value::Number(y)) => !numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x != y,

        (Value::Array(xs), Value::Array(ys)) => {
            if xs.len() != ys.len() {
                return true;
            }
            for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
                let len = path.len();
                path.push('/');
                path.push_str(&i.to_string());
                if diff(x, y, path) {
                    return true;
                }
                path.truncate(len);
            }
            false
        }

        (Value::Object(xs), Value::Object(ys)) => {
            for (key, x) in xs {
                let len = path.len();
                path.push('/');
                path.push_str(key);
                match ys.get(key) {
                    Some(y) if !diff(x, y, path) => path.truncate(len),
                    _ => return true,
                }
            }
            if let Some(key) = ys.keys().find(|k| !xs.contains_key(k.as_str())) {
                path.push('/');
                path.push_str(key);
                return true;
            }
            false
        }

        _ => true,
    }
}
