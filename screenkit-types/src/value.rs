use crate::bundle::BundleMap;
use crate::entity::EntityValue;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;

/// Map type used for context layers, nested maps and service payloads
pub type ValueMap = HashMap<String, Value>;

/// JSON object key marking an entity value
const ENTITY_NAME_KEY: &str = "_entityName";

/// A value stored in a screen context
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    List(Vec<Value>),
    Map(ValueMap),
    Entity(EntityValue),
    Bundle(BundleMap),
}

impl Value {
    /// Short type label used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Long",
            Value::Float(_) => "Double",
            Value::Decimal(_) => "BigDecimal",
            Value::String(_) => "String",
            Value::Date(_) => "Date",
            Value::Time(_) => "Time",
            Value::Timestamp(_) => "Timestamp",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Entity(_) => "EntityValue",
            Value::Bundle(_) => "BundleMap",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, the empty string, and empty collections count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityValue> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&BundleMap> {
        match self {
            Value::Bundle(b) => Some(b),
            _ => None,
        }
    }

    /// Convert a JSON document into a context value.
    ///
    /// Objects carrying an `_entityName` string become entity values.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(mut obj) => {
                let entity_name = match obj.get(ENTITY_NAME_KEY) {
                    Some(serde_json::Value::String(name)) => Some(name.clone()),
                    _ => None,
                };
                if let Some(name) = entity_name {
                    obj.remove(ENTITY_NAME_KEY);
                    let fields = obj
                        .into_iter()
                        .map(|(k, v)| (k, Value::from_json(v)))
                        .collect();
                    return Value::Entity(EntityValue::from_fields(name, fields));
                }
                Value::Map(
                    obj.into_iter()
                        .map(|(k, v)| (k, Value::from_json(v)))
                        .collect(),
                )
            }
        }
    }

    /// Convert into JSON. Temporal and decimal values become strings,
    /// bundle maps become their flattened message map.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Decimal(_)
            | Value::Date(_)
            | Value::Time(_)
            | Value::Timestamp(_)
            | Value::String(_) => Json::String(self.to_string()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => map_to_json(map),
            Value::Entity(entity) => {
                let mut obj = match map_to_json(entity.fields()) {
                    Json::Object(obj) => obj,
                    _ => serde_json::Map::new(),
                };
                obj.insert(
                    ENTITY_NAME_KEY.to_string(),
                    Json::String(entity.entity_name().to_string()),
                );
                Json::Object(obj)
            }
            Value::Bundle(bundle) => Json::Object(
                bundle
                    .flatten()
                    .into_iter()
                    .map(|(k, v)| (k, Json::String(v)))
                    .collect(),
            ),
        }
    }
}

fn map_to_json(map: &ValueMap) -> serde_json::Value {
    serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

fn write_sorted_pairs(f: &mut fmt::Formatter<'_>, map: &ValueMap) -> fmt::Result {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}={}", key, map[key])?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::Timestamp(ts) => {
                write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S"))?;
                let nanos = ts.nanosecond();
                if nanos == 0 {
                    f.write_str(".0")
                } else {
                    let frac = format!("{nanos:09}");
                    write!(f, ".{}", frac.trim_end_matches('0'))
                }
            }
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                write_sorted_pairs(f, map)?;
                f.write_str("}")
            }
            Value::Entity(entity) => {
                write!(f, "{}[", entity.entity_name())?;
                write_sorted_pairs(f, entity.fields())?;
                f.write_str("]")
            }
            Value::Bundle(bundle) => write!(f, "BundleMap{:?}", bundle.resources()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl From<EntityValue> for Value {
    fn from(entity: EntityValue) -> Self {
        Value::Entity(entity)
    }
}

impl From<BundleMap> for Value {
    fn from(bundle: BundleMap) -> Self {
        Value::Bundle(bundle)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}
