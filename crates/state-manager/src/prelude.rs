pub use crate::action::{Action, Assign};
pub use crate::composition::{Composition, use_manager, use_manager_with_config, use_manager_with_key};
pub use crate::config::{ManagerConfig, ResetPolicy};
pub use crate::error::{StateError, StateResult};
pub use crate::manager::Manager;
pub use crate::path::{Path, Seg};
pub use crate::scope::{Scope, current_scope};
pub use crate::signal::Subscription;
pub use crate::value::{Record, Sequence, Value};
pub use crate::{record, seq};
