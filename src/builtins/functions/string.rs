use crate::registry::FunctionRegistry;
use crate::value::Value;

fn want_str(v: &Value) -> std::result::Result<&str, String> {
    v.as_str().ok_or_else(|| format!("expected a string, got {}", v.type_name()))
}

pub fn register(reg: &FunctionRegistry) {
    reg.must_register("upper", 1, Some(1), |args| {
        Ok(Value::str(want_str(&args[0])?.to_uppercase()))
    });
    reg.must_register("lower", 1, Some(1), |args| {
        Ok(Value::str(want_str(&args[0])?.to_lowercase()))
    });
    reg.must_register("trim", 1, Some(1), |args| {
        Ok(Value::str(want_str(&args[0])?.trim()))
    });
    reg.must_register("trimPrefix", 2, Some(2), |args| {
        let s = want_str(&args[0])?;
        let prefix = want_str(&args[1])?;
        Ok(Value::str(s.strip_prefix(prefix).unwrap_or(s)))
    });
    reg.must_register("trimSuffix", 2, Some(2), |args| {
        let s = want_str(&args[0])?;
        let suffix = want_str(&args[1])?;
        Ok(Value::str(s.strip_suffix(suffix).unwrap_or(s)))
    });
    reg.must_register("hasPrefix", 2, Some(2), |args| {
        Ok(Value::Bool(want_str(&args[0])?.starts_with(want_str(&args[1])?)))
    });
    reg.must_register("hasSuffix", 2, Some(2), |args| {
        Ok(Value::Bool(want_str(&args[0])?.ends_with(want_str(&args[1])?)))
    });
    reg.must_register("contains", 2, Some(2), |args| {
        if let Value::List(items) = &args[0] {
            return Ok(Value::Bool(items.iter().any(|v| v.loose_eq(&args[1]))));
        }
        Ok(Value::Bool(want_str(&args[0])?.contains(want_str(&args[1])?)))
    });
    reg.must_register("replace", 3, Some(3), |args| {
        let s = want_str(&args[0])?;
        let from = want_str(&args[1])?;
        let to = want_str(&args[2])?;
        Ok(Value::str(s.replace(from, to)))
    });
    reg.must_register("split", 2, Some(2), |args| {
        let s = want_str(&args[0])?;
        let sep = want_str(&args[1])?;
        let parts = if sep.is_empty() {
            s.chars().map(|c| Value::str(c.to_string())).collect()
        } else {
            s.split(sep).map(Value::str).collect()
        };
        Ok(Value::List(parts))
    });
    reg.must_register("join", 2, Some(2), |args| {
        let sep = want_str(&args[1])?;
        match &args[0] {
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.render()).collect();
                Ok(Value::str(parts.join(sep)))
            }
            other => Err(format!("expected a list, got {}", other.type_name())),
        }
    });
}
