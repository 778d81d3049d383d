use crate::registry::FunctionRegistry;
use crate::value::Value;

pub fn register(reg: &FunctionRegistry) {
    reg.must_register("len", 1, Some(1), |args| match &args[0] {
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::List(l) => Ok(Value::Int(l.len() as i64)),
        Value::Map(m) => Ok(Value::Int(m.len() as i64)),
        other => Err(format!("len() does not support {}", other.type_name())),
    });
    reg.must_register("first", 1, Some(1), |args| match &args[0] {
        Value::List(l) => Ok(l.first().cloned().unwrap_or(Value::Nil)),
        other => Err(format!("first() expects a list, got {}", other.type_name())),
    });
    reg.must_register("last", 1, Some(1), |args| match &args[0] {
        Value::List(l) => Ok(l.last().cloned().unwrap_or(Value::Nil)),
        other => Err(format!("last() expects a list, got {}", other.type_name())),
    });
    reg.must_register("keys", 1, Some(1), |args| match &args[0] {
        Value::Map(_) => Ok(Value::List(
            args[0]
                .sorted_map_entries()
                .into_iter()
                .map(|(k, _)| Value::str(k))
                .collect(),
        )),
        other => Err(format!("keys() expects a map, got {}", other.type_name())),
    });
    reg.must_register("values", 1, Some(1), |args| match &args[0] {
        Value::Map(_) => Ok(Value::List(
            args[0]
                .sorted_map_entries()
                .into_iter()
                .map(|(_, v)| v.clone())
                .collect(),
        )),
        other => Err(format!("values() expects a map, got {}", other.type_name())),
    });
    reg.must_register("has", 2, Some(2), |args| match &args[0] {
        Value::Map(m) => {
            let key = args[1]
                .as_str()
                .ok_or_else(|| "has() expects a string key".to_string())?;
            Ok(Value::Bool(m.contains_key(key)))
        }
        Value::List(l) => Ok(Value::Bool(l.iter().any(|v| v.loose_eq(&args[1])))),
        other => Err(format!("has() does not support {}", other.type_name())),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use indexmap::IndexMap;

    #[test]
    fn keys_and_values_are_sorted() {
        let reg = FunctionRegistry::new();
        register(&reg);
        let mut m = IndexMap::new();
        m.insert("b".to_string(), Value::Int(2));
        m.insert("a".to_string(), Value::Int(1));
        let pos = Position::new(0, 1, 1);
        let keys = reg.call("keys", vec![Value::Map(m.clone())], pos).unwrap();
        assert_eq!(keys, Value::List(vec![Value::str("a"), Value::str("b")]));
        let values = reg.call("values", vec![Value::Map(m)], pos).unwrap();
        assert_eq!(values, Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn len_over_kinds() {
        let reg = FunctionRegistry::new();
        register(&reg);
        let pos = Position::new(0, 1, 1);
        assert_eq!(reg.call("len", vec![Value::str("abc")], pos).unwrap(), Value::Int(3));
        assert_eq!(
            reg.call("len", vec![Value::List(vec![Value::Nil, Value::Nil])], pos).unwrap(),
            Value::Int(2)
        );
    }
}
