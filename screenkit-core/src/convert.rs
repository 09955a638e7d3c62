//! Coercion of context values to declared simple types.

use crate::error::ConversionError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use screenkit_types::{Value, ValueMap};
use std::str::FromStr;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Convert `value` to the type named by `type_name`.
///
/// Type names may be qualified (`java.lang.Long`); only the last segment
/// matters. Null converts to null, and an empty string converts to null for
/// every type except the string types.
pub fn convert(value: Value, type_name: &str) -> Result<Value, ConversionError> {
    let short = type_name.rsplit('.').next().unwrap_or(type_name).trim();

    if value.is_null() {
        return Ok(Value::Null);
    }
    if matches!(short, "String" | "PlainString") {
        return Ok(match value {
            Value::String(_) => value,
            other => Value::String(other.to_string()),
        });
    }
    if let Value::String(s) = &value {
        if s.trim().is_empty() && short != "Object" {
            return Ok(Value::Null);
        }
    }

    match short {
        "Object" => Ok(value),
        "Boolean" => to_bool(value),
        "Integer" | "Long" => to_int(value, short),
        "Float" | "Double" => to_float(value, short),
        "BigDecimal" => to_decimal(value),
        "Date" => to_date(value),
        "Time" => to_time(value),
        "Timestamp" => to_timestamp(value),
        "List" => to_list(value),
        "Map" => to_map(value),
        _ => Err(ConversionError::Unsupported(type_name.to_string())),
    }
}

fn invalid(value: &Value, to: &str) -> ConversionError {
    ConversionError::Invalid {
        from: value.type_name(),
        to: to.to_string(),
        value: value.to_string(),
    }
}

fn to_bool(value: Value) -> Result<Value, ConversionError> {
    match &value {
        Value::Bool(_) => Ok(value),
        Value::Int(i) => Ok(Value::Bool(*i != 0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "y" => Ok(Value::Bool(true)),
            "false" | "n" => Ok(Value::Bool(false)),
            _ => Err(invalid(&value, "Boolean")),
        },
        _ => Err(invalid(&value, "Boolean")),
    }
}

fn to_int(value: Value, to: &str) -> Result<Value, ConversionError> {
    let parsed = match &value {
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        Value::Decimal(d) => d.trunc().to_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(i) if to != "Integer" || i32::try_from(i).is_ok() => Ok(Value::Int(i)),
        _ => Err(invalid(&value, to)),
    }
}

fn to_float(value: Value, to: &str) -> Result<Value, ConversionError> {
    let parsed = match &value {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        Value::Decimal(d) => d.to_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        // Float is single precision
        Some(f) if to == "Float" && f.is_finite() && f.abs() > f64::from(f32::MAX) => {
            Err(invalid(&value, to))
        }
        Some(f) => Ok(Value::Float(f)),
        None => Err(invalid(&value, to)),
    }
}

fn to_decimal(value: Value) -> Result<Value, ConversionError> {
    match &value {
        Value::Decimal(_) => Ok(value),
        Value::Int(i) => Ok(Value::Decimal(Decimal::from(*i))),
        Value::Float(f) => Decimal::from_f64(*f)
            .map(Value::Decimal)
            .ok_or_else(|| invalid(&value, "BigDecimal")),
        Value::String(s) => Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .map(Value::Decimal)
            .map_err(|_| invalid(&value, "BigDecimal")),
        _ => Err(invalid(&value, "BigDecimal")),
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn to_date(value: Value) -> Result<Value, ConversionError> {
    match &value {
        Value::Date(_) => Ok(value),
        Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
            .map(Value::Date)
            .ok_or_else(|| invalid(&value, "Date")),
        _ => Err(invalid(&value, "Date")),
    }
}

fn to_time(value: Value) -> Result<Value, ConversionError> {
    match &value {
        Value::Time(_) => Ok(value),
        Value::Timestamp(ts) => Ok(Value::Time(ts.time())),
        Value::String(s) => {
            let s = s.trim();
            NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                .map(Value::Time)
                .map_err(|_| invalid(&value, "Time"))
        }
        _ => Err(invalid(&value, "Time")),
    }
}

fn to_timestamp(value: Value) -> Result<Value, ConversionError> {
    match &value {
        Value::Timestamp(_) => Ok(value),
        Value::Date(d) => d
            .and_hms_opt(0, 0, 0)
            .map(Value::Timestamp)
            .ok_or_else(|| invalid(&value, "Timestamp")),
        Value::Int(millis) => DateTime::from_timestamp_millis(*millis)
            .map(|dt| Value::Timestamp(dt.naive_utc()))
            .ok_or_else(|| invalid(&value, "Timestamp")),
        Value::String(s) => parse_timestamp(s)
            .map(Value::Timestamp)
            .ok_or_else(|| invalid(&value, "Timestamp")),
        _ => Err(invalid(&value, "Timestamp")),
    }
}

/// Strip one pair of surrounding brackets, if present
fn unwrap_brackets(s: &str, open: char, close: char) -> &str {
    let s = s.trim();
    s.strip_prefix(open)
        .and_then(|rest| rest.strip_suffix(close))
        .unwrap_or(s)
}

fn to_list(value: Value) -> Result<Value, ConversionError> {
    match value {
        Value::List(_) => Ok(value),
        Value::String(s) => {
            let inner = unwrap_brackets(&s, '[', ']');
            if inner.trim().is_empty() {
                return Ok(Value::List(Vec::new()));
            }
            Ok(Value::List(
                inner
                    .split(',')
                    .map(|item| Value::String(item.trim().to_string()))
                    .collect(),
            ))
        }
        other => Err(invalid(&other, "List")),
    }
}

fn to_map(value: Value) -> Result<Value, ConversionError> {
    match value {
        Value::Map(_) => Ok(value),
        Value::Entity(entity) => Ok(Value::Map(entity.into_fields())),
        Value::String(s) => {
            let inner = unwrap_brackets(&s, '{', '}');
            let mut map = ValueMap::new();
            for pair in inner.split(',').filter(|p| !p.trim().is_empty()) {
                let Some((k, v)) = pair.split_once('=') else {
                    return Err(invalid(&Value::String(s.clone()), "Map"));
                };
                map.insert(k.trim().to_string(), Value::String(v.trim().to_string()));
            }
            Ok(Value::Map(map))
        }
        other => Err(invalid(&other, "Map")),
    }
}
