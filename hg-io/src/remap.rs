//! Deep key translation between short and readable names

use crate::mapping::MappingTable;
use serde_json::{Map, Value};
use tracing::warn;

/// Translate every object key from short to readable form.
pub fn to_readable(value: &Value, table: &MappingTable) -> Value {
    remap(value, &|key| table.lookup_readable(key).to_string())
}

/// Translate every object key from readable back to short form.
pub fn to_short(value: &Value, table: &MappingTable) -> Value {
    remap(value, &|key| table.lookup_short(key).to_string())
}

fn remap(value: &Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, child) in fields {
                let renamed = rename(key);
                if out.contains_key(&renamed) {
                    warn!(key = %key, renamed = %renamed, "translated key collides; keeping the later value");
                }
                out.insert(renamed, remap(child, rename));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| remap(item, rename)).collect()),
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => value.clone(),
    }
}
