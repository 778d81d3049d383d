use crate::registry::FunctionRegistry;
use crate::value::Value;

pub fn register(reg: &FunctionRegistry) {
    reg.must_register("toString", 1, Some(1), |args| Ok(Value::str(args[0].render())));
    reg.must_register("toInt", 1, Some(1), |args| match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) => Ok(Value::Int(*f as i64)),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("cannot convert {:?} to int", s)),
        Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
        other => Err(format!("cannot convert {} to int", other.type_name())),
    });
    reg.must_register("toFloat", 1, Some(1), |args| {
        args[0]
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| format!("cannot convert {} to float", args[0].type_name()))
    });
    reg.must_register("toBool", 1, Some(1), |args| Ok(Value::Bool(args[0].is_truthy())));
    reg.must_register("typeOf", 1, Some(1), |args| Ok(Value::str(args[0].type_name())));
    reg.must_register("isNil", 1, Some(1), |args| Ok(Value::Bool(args[0].is_nil())));
    reg.must_register("isEmpty", 1, Some(1), |args| match &args[0] {
        Value::Nil => Ok(Value::Bool(true)),
        Value::Str(s) => Ok(Value::Bool(s.is_empty())),
        Value::List(l) => Ok(Value::Bool(l.is_empty())),
        Value::Map(m) => Ok(Value::Bool(m.is_empty())),
        other => Err(format!("isEmpty() does not support {}", other.type_name())),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn conversions_round_trip() {
        let reg = FunctionRegistry::new();
        register(&reg);
        let pos = Position::new(0, 1, 1);
        assert_eq!(reg.call("toInt", vec![Value::str("42")], pos).unwrap(), Value::Int(42));
        assert_eq!(reg.call("toString", vec![Value::Int(7)], pos).unwrap(), Value::str("7"));
        assert_eq!(reg.call("typeOf", vec![Value::Bool(true)], pos).unwrap(), Value::str("bool"));
    }

    #[test]
    fn bad_int_conversion_errors() {
        let reg = FunctionRegistry::new();
        register(&reg);
        let pos = Position::new(0, 1, 1);
        assert!(reg.call("toInt", vec![Value::str("nope")], pos).is_err());
    }
}
