//! Interrupt configuration registry.
//!
//! Policies are attached by operation name when tools are registered, and
//! looked up by name when a call arrives. A wrapper operation may be declared
//! over an inner one; lookup follows exactly one such hop.

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::policy::InterruptPolicy;

/// What [`InterruptRegistry::apply_or_default`] should attach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InterruptSetting {
    /// The default policy (approve or reject).
    #[default]
    Default,
    /// The permissive policy (approve, edit or reject).
    Enabled,
    /// Attach nothing.
    Disabled,
    /// A specific policy.
    Custom(InterruptPolicy),
}

impl InterruptSetting {
    fn into_policy(self) -> Option<InterruptPolicy> {
        match self {
            Self::Default => Some(InterruptPolicy::default()),
            Self::Enabled => Some(InterruptPolicy::permissive()),
            Self::Disabled => None,
            Self::Custom(policy) => Some(policy),
        }
    }
}

impl From<bool> for InterruptSetting {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Disabled }
    }
}

impl From<InterruptPolicy> for InterruptSetting {
    fn from(policy: InterruptPolicy) -> Self {
        Self::Custom(policy)
    }
}

/// One entry of the configuration map: a policy, or `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterruptEntry {
    /// Calls are reviewed under this policy.
    Policy(InterruptPolicy),
    /// Calls run without review. Serializes as `false`.
    Disabled,
}

impl InterruptEntry {
    /// Get the policy, if any.
    #[must_use]
    pub fn policy(&self) -> Option<&InterruptPolicy> {
        match self {
            Self::Policy(policy) => Some(policy),
            Self::Disabled => None,
        }
    }
}

impl Serialize for InterruptEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Policy(policy) => policy.serialize(serializer),
            Self::Disabled => serializer.serialize_bool(false),
        }
    }
}

/// Typed registry from operation name to interrupt policy.
#[derive(Debug, Clone, Default)]
pub struct InterruptRegistry {
    policies: HashMap<String, InterruptPolicy>,
    /// wrapper name -> wrapped name
    wrapped: HashMap<String, String>,
}

impl InterruptRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `policy` to `name`, replacing any existing one.
    pub fn register(&mut self, name: impl Into<String>, policy: InterruptPolicy) {
        let name = name.into();
        debug!(operation = %name, decisions = ?policy.allowed_decisions, "Registered interrupt policy");
        self.policies.insert(name, policy);
    }

    /// Declare that `wrapper` wraps `inner`.
    ///
    /// [`InterruptRegistry::resolve`] on the wrapper falls back to the inner
    /// operation's policy. Chains deeper than one hop are not followed.
    pub fn register_wrapper(&mut self, wrapper: impl Into<String>, inner: impl Into<String>) {
        self.wrapped.insert(wrapper.into(), inner.into());
    }

    /// Attach `setting` to every name that has no policy yet.
    ///
    /// With `overwrite`, names that already resolve are replaced too.
    /// [`InterruptSetting::Disabled`] never removes an existing policy.
    pub fn apply_or_default<I, S>(&mut self, names: I, setting: InterruptSetting, overwrite: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(policy) = setting.into_policy() else {
            return;
        };
        for name in names {
            let name = name.into();
            if overwrite || self.resolve(&name).is_none() {
                self.register(name, policy.clone());
            }
        }
    }

    /// Remove the policy attached directly to `name`.
    pub fn remove(&mut self, name: &str) -> Option<InterruptPolicy> {
        self.policies.remove(name)
    }

    /// Find the policy for `name`, looking through one wrapper level.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&InterruptPolicy> {
        self.policies.get(name).or_else(|| {
            self.wrapped
                .get(name)
                .and_then(|inner| self.policies.get(inner))
        })
    }

    /// Resolve `name` into a configuration map entry.
    #[must_use]
    pub fn entry(&self, name: &str) -> InterruptEntry {
        self.resolve(name)
            .map_or(InterruptEntry::Disabled, |policy| InterruptEntry::Policy(policy.clone()))
    }

    /// Build the configuration map for `names`.
    ///
    /// Every name maps to a policy or to `false`; none is left out.
    #[must_use]
    pub fn build_config_map<I, S>(&self, names: I) -> BTreeMap<String, InterruptEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                (name.to_string(), self.entry(name))
            })
            .collect()
    }
}
