//! Reading and copy-on-path writing of nested values.

use crate::path::{Path, Seg};
use crate::value::{Record, Value};

/// Value at `path`, or `None` as soon as a segment is missing or the walk hits
/// a `Null`/scalar. The root path returns `value` itself.
pub fn get_nested<'a>(value: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(value, |current, seg| current.child(seg))
}

/// Like [`get_nested`] but rooted at a record; the root path yields the record.
pub fn lookup(record: &Record, path: &Path) -> Option<Value> {
    let Some((first, rest)) = path.segments().split_first() else {
        return Some(Value::Map(record.clone()));
    };
    let mut current = match first {
        Seg::Key(k) => record.get(k)?,
        Seg::Index(i) => record.get(&i.to_string())?,
    };
    for seg in rest {
        current = current.child(seg)?;
    }
    Some(current.clone())
}

/// New value with `leaf` written at `path`.
///
/// Only the nodes along `path` are copied, each exactly once; every sibling
/// keeps its original allocation. A missing intermediate becomes an empty
/// sequence when the following segment is an index and an empty mapping
/// otherwise; an existing `Null` or scalar intermediate becomes an empty
/// mapping. A sequence written far past its end is re-keyed into a mapping.
pub fn set_nested(value: &Value, path: &Path, leaf: Value) -> Value {
    assign(value, path.segments(), leaf)
}

fn assign(node: &Value, segs: &[Seg], leaf: Value) -> Value {
    let Some((seg, rest)) = segs.split_first() else {
        return leaf;
    };
    let child = match rest.first() {
        None => leaf,
        Some(next) => match node.child(seg) {
            Some(existing) if existing.is_container() => assign(existing, rest, leaf),
            Some(_) => assign(&Value::Map(Record::new()), rest, leaf),
            None => assign(&Value::empty_for(next), rest, leaf),
        },
    };
    write_child(node, seg, child)
}

fn write_child(node: &Value, seg: &Seg, child: Value) -> Value {
    match (node, seg) {
        (Value::Map(m), seg) => Value::Map(m.with(seg.to_key(), child)),
        (Value::Seq(s), Seg::Index(i)) => match s.with_index(*i, child.clone()) {
            Some(seq) => Value::Seq(seq),
            None => Value::Map(s.to_record().with(i.to_string(), child)),
        },
        (Value::Seq(s), Seg::Key(k)) => Value::Map(s.to_record().with(k.as_str(), child)),
        (_, seg) => Value::Map(Record::new().with(seg.to_key(), child)),
    }
}
