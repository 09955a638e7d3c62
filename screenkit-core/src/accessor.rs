//! Name-path field accessors (`order.items[0].productId`, `messages[]`).

use crate::context::FieldStore;
use crate::error::ContextError;
use screenkit_types::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    /// `[]`: append on write, never matches on read
    Append,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Append => f.write_str("[]"),
        }
    }
}

/// A parsed field path, resolved against a [`FieldStore`] at run time.
///
/// Dots separate map keys, `[n]` indexes lists, and `[]` appends to a list
/// when writing. The accessor holds no value itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldAccessor {
    original: String,
    segments: Vec<Segment>,
}

impl FieldAccessor {
    pub fn new(name: &str) -> Self {
        let original = name.trim().to_string();
        let segments = parse_path(&original);
        Self { original, segments }
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    pub fn original_name(&self) -> &str {
        &self.original
    }

    /// Borrow the value at this path, if every segment resolves.
    pub fn get<'a, S: FieldStore + ?Sized>(&self, store: &'a S) -> Option<&'a Value> {
        let (root, rest) = self.root()?;
        let mut current = store.lookup(root)?;
        for seg in rest {
            current = step(current, seg)?;
        }
        Some(current)
    }

    /// Resolve to an owned value. Unlike [`FieldAccessor::get`] this also
    /// looks keys up in bundle maps (`uiLabelMap.CommonSave`).
    pub fn get_value<S: FieldStore + ?Sized>(&self, store: &S) -> Option<Value> {
        let (root, rest) = self.root()?;
        let mut current = store.lookup(root)?;
        for (i, seg) in rest.iter().enumerate() {
            if let (Value::Bundle(bundle), Segment::Key(key)) = (current, seg) {
                // bundle messages are leaves
                return if i + 1 == rest.len() {
                    bundle.get(key).map(Value::String)
                } else {
                    None
                };
            }
            current = step(current, seg)?;
        }
        Some(current.clone())
    }

    /// Write `value` at this path, creating missing intermediate maps and lists.
    pub fn put<S: FieldStore + ?Sized>(&self, store: &mut S, value: Value) -> Result<(), ContextError> {
        let (root, rest) = self.root().ok_or(ContextError::EmptyPath)?;
        if rest.is_empty() {
            store.store(root.to_string(), value);
            return Ok(());
        }

        let needs_container = store.lookup(root).map_or(true, Value::is_null);
        if needs_container {
            store.store(root.to_string(), empty_container(&rest[0]));
        }
        let target = store.lookup_mut(root).ok_or(ContextError::EmptyPath)?;
        put_into(target, rest, value, &self.original)
    }

    fn root(&self) -> Option<(&str, &[Segment])> {
        match self.segments.split_first() {
            Some((Segment::Key(root), rest)) => Some((root.as_str(), rest)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

fn parse_path(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !key.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                }
            }
            '[' => {
                let mut inner = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    // not a bracket expression after all
                    key.push('[');
                    key.push_str(&inner);
                    continue;
                }
                if !key.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                }
                let inner = inner.trim();
                segments.push(if inner.is_empty() {
                    Segment::Append
                } else if let Ok(idx) = inner.parse::<usize>() {
                    Segment::Index(idx)
                } else {
                    Segment::Key(inner.trim_matches(|c| c == '"' || c == '\'').to_string())
                });
            }
            _ => key.push(c),
        }
    }
    if !key.is_empty() {
        segments.push(Segment::Key(key));
    }
    segments
}

fn step<'a>(current: &'a Value, seg: &Segment) -> Option<&'a Value> {
    match (current, seg) {
        (Value::Map(map), Segment::Key(k)) => map.get(k),
        (Value::Entity(entity), Segment::Key(k)) => entity.get(k),
        (Value::List(items), Segment::Index(i)) => items.get(*i),
        _ => None,
    }
}

fn empty_container(next: &Segment) -> Value {
    match next {
        Segment::Key(_) => Value::Map(Default::default()),
        Segment::Index(_) | Segment::Append => Value::List(Vec::new()),
    }
}

fn not_a_container(path: &str, seg: &Segment, found: &Value) -> ContextError {
    ContextError::NotAContainer {
        path: path.to_string(),
        segment: seg.to_string(),
        found: found.type_name(),
    }
}

fn put_into(
    target: &mut Value,
    segments: &[Segment],
    value: Value,
    path: &str,
) -> Result<(), ContextError> {
    let Some((seg, rest)) = segments.split_first() else {
        *target = value;
        return Ok(());
    };
    if target.is_null() {
        *target = empty_container(seg);
    }

    let child: &mut Value = match (seg, target) {
        (Segment::Key(k), Value::Map(map)) => {
            if rest.is_empty() {
                map.insert(k.clone(), value);
                return Ok(());
            }
            map.entry(k.clone()).or_insert(Value::Null)
        }
        (Segment::Key(k), Value::Entity(entity)) => {
            if rest.is_empty() {
                entity.set(k.clone(), value);
                return Ok(());
            }
            if entity.get(k).is_none() {
                entity.set(k.clone(), Value::Null);
            }
            match entity.get_mut(k) {
                Some(child) => child,
                None => return Err(ContextError::EmptyPath),
            }
        }
        (Segment::Index(i), Value::List(items)) => {
            let len = items.len();
            if *i == len {
                items.push(Value::Null);
            } else if *i > len {
                return Err(ContextError::IndexOutOfBounds {
                    path: path.to_string(),
                    index: *i,
                    len,
                });
            }
            &mut items[*i]
        }
        (Segment::Append, Value::List(items)) => {
            items.push(Value::Null);
            let last = items.len() - 1;
            &mut items[last]
        }
        (seg, other) => return Err(not_a_container(path, seg, other)),
    };
    put_into(child, rest, value, path)
}
