use serde_yaml::{Mapping, Value};

/// Merge `updates` into `base`.
///
/// Mappings merge recursively; any other value overwrites. A `null` in
/// `updates` removes the key from `base`.
pub fn deep_merge(base: &mut Value, updates: &Value) {
    match (base, updates) {
        (Value::Mapping(base_map), Value::Mapping(update_map)) => {
            for (key, update) in update_map {
                if update.is_null() {
                    base_map.remove(key);
                    continue;
                }
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, update),
                    None => {
                        base_map.insert(key.clone(), strip_nulls(update));
                    }
                }
            }
        }
        (base, updates) => *base = strip_nulls(updates),
    }
}

/// Nested path helper: `["projects", "p1"]` + value → `{projects: {p1: value}}`.
pub fn nest(path: &[&str], value: Value) -> Value {
    path.iter().rev().fold(value, |inner, key| {
        let mut map = Mapping::new();
        map.insert(Value::from(*key), inner);
        Value::Mapping(map)
    })
}

// Null means "delete" inside an update, so newly inserted subtrees drop them too.
fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
