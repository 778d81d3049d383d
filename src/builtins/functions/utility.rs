use crate::registry::FunctionRegistry;
use crate::value::Value;

pub fn register(reg: &FunctionRegistry) {
    reg.must_register("default", 2, Some(2), |args| {
        if args[0].is_absent() {
            Ok(args[1].clone())
        } else {
            Ok(args[0].clone())
        }
    });
    reg.must_register("coalesce", 1, None, |args| {
        Ok(args
            .iter()
            .find(|v| !v.is_absent())
            .cloned()
            .unwrap_or(Value::Nil))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn default_treats_empty_string_as_absent() {
        let reg = FunctionRegistry::new();
        register(&reg);
        let pos = Position::new(0, 1, 1);
        assert_eq!(
            reg.call("default", vec![Value::str(""), Value::str("fallback")], pos).unwrap(),
            Value::str("fallback")
        );
        assert_eq!(
            reg.call("default", vec![Value::str("set"), Value::str("fallback")], pos).unwrap(),
            Value::str("set")
        );
    }

    #[test]
    fn coalesce_picks_first_present() {
        let reg = FunctionRegistry::new();
        register(&reg);
        let pos = Position::new(0, 1, 1);
        let v = reg
            .call("coalesce", vec![Value::Nil, Value::str(""), Value::str("c")], pos)
            .unwrap();
        assert_eq!(v, Value::str("c"));
    }
}
