use std::fmt;

use crate::path::Path;
use crate::value::{Record, Value};

/// How an update produces its new value: either a literal, or a function of
/// the value currently stored at the target (`None` when absent).
pub enum Assign {
    Literal(Value),
    Updater(Box<dyn FnOnce(Option<&Value>) -> Value>),
}

impl Assign {
    pub fn literal(value: impl Into<Value>) -> Self {
        Assign::Literal(value.into())
    }

    pub fn updater(f: impl FnOnce(Option<&Value>) -> Value + 'static) -> Self {
        Assign::Updater(Box::new(f))
    }

    pub fn resolve(self, current: Option<&Value>) -> Value {
        match self {
            Assign::Literal(v) => v,
            Assign::Updater(f) => f(current),
        }
    }
}

impl From<Value> for Assign {
    fn from(v: Value) -> Self {
        Assign::Literal(v)
    }
}

impl fmt::Debug for Assign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assign::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Assign::Updater(_) => f.write_str("Updater(..)"),
        }
    }
}

/// Tagged update description consumed by the reducer.
#[derive(Debug)]
pub enum Action {
    Update { key: String, assign: Assign },
    DeepUpdate { path: Path, assign: Assign },
    BulkUpdate { updates: Record },
    Reset { new_state: Option<Record> },
    /// A wire-form action whose tag is not one of the four above.
    Unrecognized(String),
}

impl Action {
    pub fn update(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Action::Update {
            key: key.into(),
            assign: Assign::literal(value),
        }
    }

    pub fn update_with(
        key: impl Into<String>,
        f: impl FnOnce(Option<&Value>) -> Value + 'static,
    ) -> Self {
        Action::Update {
            key: key.into(),
            assign: Assign::updater(f),
        }
    }

    pub fn deep_update(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        Action::DeepUpdate {
            path: path.into(),
            assign: Assign::literal(value),
        }
    }

    pub fn deep_update_with(
        path: impl Into<Path>,
        f: impl FnOnce(Option<&Value>) -> Value + 'static,
    ) -> Self {
        Action::DeepUpdate {
            path: path.into(),
            assign: Assign::updater(f),
        }
    }

    pub fn bulk(updates: Record) -> Self {
        Action::BulkUpdate { updates }
    }

    pub fn reset(new_state: impl Into<Option<Record>>) -> Self {
        Action::Reset {
            new_state: new_state.into(),
        }
    }

    /// Wire tag, as used in logs and by the JSON decoder.
    pub fn tag(&self) -> &str {
        match self {
            Action::Update { .. } => "UPDATE",
            Action::DeepUpdate { .. } => "DEEP_UPDATE",
            Action::BulkUpdate { .. } => "BULK_UPDATE",
            Action::Reset { .. } => "RESET",
            Action::Unrecognized(tag) => tag.as_str(),
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Action::Reset { .. })
    }
}
