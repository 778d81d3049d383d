use crate::registry::FunctionRegistry;
use crate::value::Value;
use chrono::{DateTime, Datelike, Duration, Utc};

fn parse_ts(v: &Value) -> std::result::Result<DateTime<Utc>, String> {
    let s = v.as_str().ok_or_else(|| format!("expected a timestamp string, got {}", v.type_name()))?;
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp {:?}: {}", s, e))
}

const COMMON_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
];

fn parse_with_layout(s: &str, layout: &str) -> std::result::Result<Value, String> {
    let naive = chrono::NaiveDateTime::parse_from_str(s, layout)
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(s, layout).map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| format!("cannot parse {:?} with layout {:?}: {}", s, layout, e))?;
    Ok(Value::str(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).to_rfc3339()))
}

fn shift(v: &Value, amount: &Value, unit: Duration) -> std::result::Result<Value, String> {
    let dt = parse_ts(v)?;
    let n = amount.as_f64().ok_or_else(|| format!("expected a number, got {}", amount.type_name()))? as i64;
    let shifted = dt + unit * n as i32;
    Ok(Value::str(shifted.to_rfc3339()))
}

pub fn register(reg: &FunctionRegistry) {
    reg.must_register("now", 0, Some(0), |_| Ok(Value::str(Utc::now().to_rfc3339())));

    reg.must_register("formatDate", 2, Some(2), |args| {
        let dt = parse_ts(&args[0])?;
        let layout = args[1].as_str().ok_or("expected a format string")?;
        Ok(Value::str(dt.format(layout).to_string()))
    });
    reg.must_register("parseDate", 1, Some(2), |args| {
        let s = args[0].as_str().ok_or("expected a date string")?;
        if let Some(layout) = args.get(1) {
            let layout = layout.as_str().ok_or("expected a format string")?;
            return parse_with_layout(s, layout);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Value::str(dt.with_timezone(&Utc).to_rfc3339()));
        }
        for layout in COMMON_DATE_FORMATS {
            if let Ok(v) = parse_with_layout(s, layout) {
                return Ok(v);
            }
        }
        Err(format!("cannot parse {:?} as a date with any common layout", s))
    });

    reg.must_register("addDays", 2, Some(2), |args| shift(&args[0], &args[1], Duration::days(1)));
    reg.must_register("addHours", 2, Some(2), |args| shift(&args[0], &args[1], Duration::hours(1)));
    reg.must_register("addMinutes", 2, Some(2), |args| shift(&args[0], &args[1], Duration::minutes(1)));

    reg.must_register("diffDays", 2, Some(2), |args| {
        let a = parse_ts(&args[0])?;
        let b = parse_ts(&args[1])?;
        // floor, not truncation: -36h is -2 days, not -1
        Ok(Value::Int((a - b).num_hours().div_euclid(24)))
    });

    reg.must_register("year", 1, Some(1), |args| Ok(Value::Int(parse_ts(&args[0])?.year() as i64)));
    reg.must_register("month", 1, Some(1), |args| Ok(Value::Int(parse_ts(&args[0])?.month() as i64)));
    reg.must_register("day", 1, Some(1), |args| Ok(Value::Int(parse_ts(&args[0])?.day() as i64)));
    reg.must_register("weekday", 1, Some(1), |args| {
        Ok(Value::str(parse_ts(&args[0])?.weekday().to_string()))
    });

    reg.must_register("isAfter", 2, Some(2), |args| {
        Ok(Value::Bool(parse_ts(&args[0])? > parse_ts(&args[1])?))
    });
    reg.must_register("isBefore", 2, Some(2), |args| {
        Ok(Value::Bool(parse_ts(&args[0])? < parse_ts(&args[1])?))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn add_days_and_diff() {
        let reg = FunctionRegistry::new();
        register(&reg);
        let pos = Position::new(0, 1, 1);
        let start = Value::str("2024-01-01T00:00:00Z");
        let shifted = reg.call("addDays", vec![start.clone(), Value::Int(3)], pos).unwrap();
        let diff = reg.call("diffDays", vec![shifted, start], pos).unwrap();
        assert_eq!(diff, Value::Int(3));
    }

    #[test]
    fn parse_date_falls_back_to_common_formats_without_a_layout() {
        let reg = FunctionRegistry::new();
        register(&reg);
        let pos = Position::new(0, 1, 1);
        let parsed = reg.call("parseDate", vec![Value::str("2024-03-15")], pos).unwrap();
        assert_eq!(reg.call("year", vec![parsed.clone()], pos).unwrap(), Value::Int(2024));
        assert_eq!(reg.call("month", vec![parsed.clone()], pos).unwrap(), Value::Int(3));
        assert_eq!(reg.call("day", vec![parsed], pos).unwrap(), Value::Int(15));
    }

    #[test]
    fn year_month_day_components() {
        let reg = FunctionRegistry::new();
        register(&reg);
        let pos = Position::new(0, 1, 1);
        let ts = Value::str("2024-03-15T00:00:00Z");
        assert_eq!(reg.call("year", vec![ts.clone()], pos).unwrap(), Value::Int(2024));
        assert_eq!(reg.call("month", vec![ts.clone()], pos).unwrap(), Value::Int(3));
        assert_eq!(reg.call("day", vec![ts], pos).unwrap(), Value::Int(15));
    }

    #[test]
    fn ordering_functions() {
        let reg = FunctionRegistry::new();
        register(&reg);
        let pos = Position::new(0, 1, 1);
        let earlier = Value::str("2024-01-01T00:00:00Z");
        let later = Value::str("2024-06-01T00:00:00Z");
        assert_eq!(reg.call("isBefore", vec![earlier.clone(), later.clone()], pos).unwrap(), Value::Bool(true));
        assert_eq!(reg.call("isAfter", vec![later, earlier], pos).unwrap(), Value::Bool(true));
    }
}
