//! Immutable tree values held by a [`Manager`](crate::Manager).
//!
//! Containers (`Record`, `Sequence`) are `Rc`-backed: cloning a handle shares
//! the allocation, and every "write" produces a new container that reuses the
//! untouched children by reference. This is what makes identity comparison
//! (`Value::same`, `Record::ptr_eq`) a reliable change test.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::path::Seg;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Seq(Sequence),
    Map(Record),
}

impl Value {
    /// Strict equality: scalars by value, strings by content, containers by
    /// allocation. `NaN` is never the same as anything, including itself.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Seq(_) | Value::Map(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&Sequence> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Record> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Child addressed by one path segment. Index segments read the decimal
    /// key of a mapping; key segments never resolve inside a sequence.
    pub fn child(&self, seg: &Seg) -> Option<&Value> {
        match (self, seg) {
            (Value::Map(m), Seg::Key(k)) => m.get(k),
            (Value::Map(m), Seg::Index(i)) => m.get(&i.to_string()),
            (Value::Seq(s), Seg::Index(i)) => s.get(*i),
            _ => None,
        }
    }

    /// Empty container to create under a missing node when `next` is the
    /// segment that will be written into it.
    pub(crate) fn empty_for(next: &Seg) -> Value {
        match next {
            Seg::Index(_) => Value::Seq(Sequence::new()),
            Seg::Key(_) => Value::Map(Record::new()),
        }
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Number(n as f64)
            }
        })*
    };
}

number_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::String(s)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Map(r)
    }
}

impl From<Sequence> for Value {
    fn from(s: Sequence) -> Self {
        Value::Seq(s)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Value::Seq(items.into_iter().collect())
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Seq(s) => {
                f.write_str("[")?;
                for (i, v) in s.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Map(m) => write!(f, "{m}"),
        }
    }
}

/// Immutable string-keyed mapping. The top-level state is always a `Record`.
///
/// Keys iterate in sorted order, not insertion order; `Display`, JSON output
/// and typed snapshots all see them sorted.
#[derive(Clone, Default, PartialEq)]
pub struct Record(Rc<BTreeMap<String, Value>>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Same allocation, i.e. the "same reference" test.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// New allocation with the same entries; the values are shared.
    pub fn shallow_clone(&self) -> Record {
        Record(Rc::new((*self.0).clone()))
    }

    /// Shallow copy with `key` overwritten.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Record {
        let mut entries = (*self.0).clone();
        entries.insert(key.into(), value.into());
        Record(Rc::new(entries))
    }

    /// Shallow copy with every entry of `updates` laid over it.
    pub fn merged(&self, updates: &Record) -> Record {
        let mut entries = (*self.0).clone();
        entries.extend(updates.iter().map(|(k, v)| (k.to_owned(), v.clone())));
        Record(Rc::new(entries))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record(Rc::new(
            iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}

/// Largest run of `Null` padding a sequence write will create.
pub const MAX_HOLES: usize = 1 << 16;

/// Immutable ordered sequence.
#[derive(Clone, Default, PartialEq)]
pub struct Sequence(Rc<Vec<Value>>);

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    pub fn ptr_eq(&self, other: &Sequence) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn shallow_clone(&self) -> Sequence {
        Sequence(Rc::new((*self.0).clone()))
    }

    /// Shallow copy with `index` overwritten. Writing past the end pads the
    /// gap with `Null`; `None` when that gap would exceed [`MAX_HOLES`].
    pub fn with_index(&self, index: usize, value: impl Into<Value>) -> Option<Sequence> {
        let mut items = (*self.0).clone();
        if index >= items.len() {
            if index - items.len() > MAX_HOLES {
                return None;
            }
            items.resize(index.checked_add(1)?, Value::Null);
        }
        items[index] = value.into();
        Some(Sequence(Rc::new(items)))
    }

    /// Re-key the items by their decimal index.
    pub fn to_record(&self) -> Record {
        self.0
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect()
    }
}

impl<V: Into<Value>> FromIterator<V> for Sequence {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Sequence(Rc::new(iter.into_iter().map(Into::into).collect()))
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Build a [`Record`] literal.
///
/// ```rust
/// use state_manager::{record, seq};
///
/// let r = record! { "name" => "Ada", "tags" => seq![1, 2], "nested" => record! { "x" => true } };
/// assert_eq!(r.len(), 3);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        <$crate::Record as ::std::iter::FromIterator<(::std::string::String, $crate::Value)>>::from_iter([
            $((::std::string::String::from($key), $crate::Value::from($value))),+
        ])
    };
}

/// Build a [`Sequence`] literal.
#[macro_export]
macro_rules! seq {
    () => {
        $crate::Sequence::new()
    };
    ($($value:expr),+ $(,)?) => {
        <$crate::Sequence as ::std::iter::FromIterator<$crate::Value>>::from_iter([
            $($crate::Value::from($value)),+
        ])
    };
}
