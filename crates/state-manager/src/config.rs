use std::borrow::Cow;

/// What `reset_state` merges onto.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Merge onto (or clone) the current state. Keys dropped or changed since
    /// creation are not restored.
    #[default]
    MergeCurrent,
    /// Merge onto (or clone) the state captured when the manager was created.
    RestoreInitial,
}

#[derive(Clone, Debug)]
pub struct ManagerConfig {
    pub reset_policy: ResetPolicy,
    /// Prefix for this manager's log lines.
    pub label: Cow<'static, str>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            reset_policy: ResetPolicy::default(),
            label: Cow::Borrowed("manager"),
        }
    }
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.reset_policy = policy;
        self
    }

    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }
}
