//! Argument coercion for resolver invocations

use graphql_parser::query::{Field, Value as GqlValue};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// Collect a field's arguments into a JSON map, substituting operation
/// variables.
pub fn collect_arguments(
    field: &Field<'_, String>,
    variables: &HashMap<String, Value>,
) -> Map<String, Value> {
    field
        .arguments
        .iter()
        .map(|(name, value)| (name.clone(), gql_value_to_json(value, variables)))
        .collect()
}

/// Convert a GraphQL literal to JSON, resolving variable references from the
/// operation's variable map. An unbound variable coerces to null.
pub fn gql_value_to_json(value: &GqlValue<'_, String>, variables: &HashMap<String, Value>) -> Value {
    match value {
        GqlValue::Null => Value::Null,
        GqlValue::Int(i) => json!(i.as_i64().unwrap_or(0)),
        GqlValue::Float(f) => json!(f),
        GqlValue::String(s) => json!(s),
        GqlValue::Boolean(b) => json!(b),
        GqlValue::Enum(e) => json!(e),
        GqlValue::List(list) => {
            Value::Array(list.iter().map(|v| gql_value_to_json(v, variables)).collect())
        }
        GqlValue::Object(obj) => {
            let mut map = Map::new();
            for (k, v) in obj {
                map.insert(k.clone(), gql_value_to_json(v, variables));
            }
            Value::Object(map)
        }
        GqlValue::Variable(name) => variables.get(name.as_str()).cloned().unwrap_or(Value::Null),
    }
}

/// Read a string argument from a coerced argument map.
pub fn string_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

/// Read an object argument from a coerced argument map.
pub fn object_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a Map<String, Value>> {
    args.get(name).and_then(Value::as_object)
}
