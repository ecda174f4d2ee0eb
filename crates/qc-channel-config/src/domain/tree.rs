//! ConfigTree entity
//!
//! One versioned configuration snapshot: a root `Channel` group holding
//! nested groups, values and policies.
//!
//! Child groups are stored behind `Arc`, so cloning a tree only copies the
//! root. [`ConfigTree::group_mut`] and friends copy-on-write exactly the
//! groups along the addressed path; every other subtree stays shared with
//! the snapshot it was cloned from, which is never mutated.

use super::policy::Policy;
use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use serde::{Deserialize, Serialize};
use shared_types::{codec, NamespaceId, Version};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Name of the root group.
pub const ROOT_GROUP: &str = "Channel";

/// Well-known element names.
pub mod names {
    pub const ORDERER_GROUP: &str = "Orderer";
    pub const APPLICATION_GROUP: &str = "Application";
    pub const CONSENSUS_TYPE_KEY: &str = "ConsensusType";
    pub const BATCH_SIZE_KEY: &str = "BatchSize";
    pub const ADMINS_POLICY: &str = "Admins";
    pub const READERS_POLICY: &str = "Readers";
    pub const WRITERS_POLICY: &str = "Writers";
}

// =============================================================================
// ELEMENTS
// =============================================================================

/// A name-scoped binary payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue {
    pub version: Version,
    pub mod_policy: String,
    pub value: Vec<u8>,
}

impl ConfigValue {
    /// New value at version 0.
    pub fn new(value: Vec<u8>, mod_policy: impl Into<String>) -> Self {
        Self {
            version: 0,
            mod_policy: mod_policy.into(),
            value,
        }
    }

    /// Content equality, ignoring `version`.
    pub fn same_content(&self, other: &ConfigValue) -> bool {
        self.value == other.value && self.mod_policy == other.mod_policy
    }
}

/// A name-scoped policy expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPolicy {
    pub version: Version,
    pub mod_policy: String,
    pub policy: Policy,
}

impl ConfigPolicy {
    /// New policy at version 0.
    pub fn new(policy: Policy, mod_policy: impl Into<String>) -> Self {
        Self {
            version: 0,
            mod_policy: mod_policy.into(),
            policy,
        }
    }

    /// Content equality, ignoring `version`.
    pub fn same_content(&self, other: &ConfigPolicy) -> bool {
        self.policy == other.policy && self.mod_policy == other.mod_policy
    }
}

/// Leaf elements (values and policies) version and compare the same way.
pub trait ConfigElement: Clone {
    fn version(&self) -> Version;
    fn mod_policy(&self) -> &str;
    fn set_version(&mut self, version: Version);
    fn same_content(&self, other: &Self) -> bool;
}

impl ConfigElement for ConfigValue {
    fn version(&self) -> Version {
        self.version
    }

    fn mod_policy(&self) -> &str {
        &self.mod_policy
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn same_content(&self, other: &Self) -> bool {
        ConfigValue::same_content(self, other)
    }
}

impl ConfigElement for ConfigPolicy {
    fn version(&self) -> Version {
        self.version
    }

    fn mod_policy(&self) -> &str {
        &self.mod_policy
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn same_content(&self, other: &Self) -> bool {
        ConfigPolicy::same_content(self, other)
    }
}

/// A group of child groups, values and policies.
///
/// `version` covers the group's own attributes: its `mod_policy` and the
/// set of names it contains. Changes inside a child do not bump it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigGroup {
    pub version: Version,
    pub mod_policy: String,
    #[serde(default)]
    pub groups: BTreeMap<String, Arc<ConfigGroup>>,
    #[serde(default)]
    pub values: BTreeMap<String, ConfigValue>,
    #[serde(default)]
    pub policies: BTreeMap<String, ConfigPolicy>,
}

impl ConfigGroup {
    /// Empty group at version 0.
    pub fn new(mod_policy: impl Into<String>) -> Self {
        Self {
            mod_policy: mod_policy.into(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, name: impl Into<String>, group: ConfigGroup) -> Self {
        self.groups.insert(name.into(), Arc::new(group));
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: ConfigValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn with_policy(mut self, name: impl Into<String>, policy: ConfigPolicy) -> Self {
        self.policies.insert(name.into(), policy);
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Borrow a direct child group.
    pub fn group(&self, name: &str) -> Option<&ConfigGroup> {
        self.groups.get(name).map(Arc::as_ref)
    }

    /// Mutably borrow a direct child group, unsharing it first if needed.
    pub fn group_mut(&mut self, name: &str) -> Option<&mut ConfigGroup> {
        self.groups.get_mut(name).map(Arc::make_mut)
    }

    /// Whether the group holds any element at all.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.values.is_empty() && self.policies.is_empty()
    }

    /// Same names in every map (ignores content and versions).
    pub(crate) fn same_membership(&self, other: &ConfigGroup) -> bool {
        self.groups.keys().eq(other.groups.keys())
            && self.values.keys().eq(other.values.keys())
            && self.policies.keys().eq(other.policies.keys())
    }
}

// =============================================================================
// ADDRESSING
// =============================================================================

/// Path of a group below the root, rendered as `/Channel/Orderer/...`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    /// The root group.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse an absolute path such as `/Channel/Orderer`.
    pub fn parse(path: &str) -> ConfigUpdateResult<Self> {
        let mut parts = path.split('/');
        let leading_empty = parts.next() == Some("");
        let root = parts.next();
        if !leading_empty || root != Some(ROOT_GROUP) {
            return Err(ConfigUpdateError::StructuralMismatch {
                reason: format!("path '{}' must start with /{}", path, ROOT_GROUP),
            });
        }
        let segments: Vec<String> = parts.map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(ConfigUpdateError::StructuralMismatch {
                reason: format!("path '{}' has an empty segment", path),
            });
        }
        Ok(Self { segments })
    }

    /// Path of a direct child.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render `/Channel/<segments>/<leaf>` for an element inside this group.
    pub fn element(&self, leaf: &str) -> String {
        format!("{}/{}", self, leaf)
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", ROOT_GROUP)?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Address of one value: its group path plus the value name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueAddress {
    pub group: ConfigPath,
    pub key: String,
}

impl ValueAddress {
    pub fn new(group: ConfigPath, key: impl Into<String>) -> Self {
        Self {
            group,
            key: key.into(),
        }
    }

    /// `/Channel/Orderer/ConsensusType`
    pub fn consensus_type() -> Self {
        Self::new(
            ConfigPath::new([names::ORDERER_GROUP]),
            names::CONSENSUS_TYPE_KEY,
        )
    }
}

impl fmt::Display for ValueAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.group.element(&self.key))
    }
}

// =============================================================================
// TREE
// =============================================================================

/// One committed (or desired) configuration snapshot of a namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTree {
    pub namespace: NamespaceId,
    /// Number of configuration updates committed before this snapshot.
    pub sequence: u64,
    pub root: Arc<ConfigGroup>,
}

impl ConfigTree {
    pub fn new(namespace: NamespaceId, root: ConfigGroup) -> Self {
        Self {
            namespace,
            sequence: 0,
            root: Arc::new(root),
        }
    }

    /// Borrow the group at `path`.
    pub fn group(&self, path: &ConfigPath) -> Option<&ConfigGroup> {
        path.segments()
            .iter()
            .try_fold(self.root.as_ref(), |group, name| group.group(name))
    }

    /// Mutably borrow the group at `path`, copying only the groups along the path.
    pub fn group_mut(&mut self, path: &ConfigPath) -> Option<&mut ConfigGroup> {
        let mut group = Arc::make_mut(&mut self.root);
        for name in path.segments() {
            group = group.group_mut(name)?;
        }
        Some(group)
    }

    pub fn value(&self, address: &ValueAddress) -> Option<&ConfigValue> {
        self.group(&address.group)?.values.get(&address.key)
    }

    pub fn value_mut(&mut self, address: &ValueAddress) -> Option<&mut ConfigValue> {
        self.group_mut(&address.group)?.values.get_mut(&address.key)
    }

    pub fn policy(&self, group: &ConfigPath, name: &str) -> Option<&ConfigPolicy> {
        self.group(group)?.policies.get(name)
    }

    /// Insert or replace a value; the group must already exist.
    pub fn set_value(
        &mut self,
        address: &ValueAddress,
        value: ConfigValue,
    ) -> ConfigUpdateResult<Option<ConfigValue>> {
        let group = self
            .group_mut(&address.group)
            .ok_or_else(|| ConfigUpdateError::ValueNotFound {
                path: address.group.to_string(),
            })?;
        Ok(group.values.insert(address.key.clone(), value))
    }

    /// Canonical bytes of the snapshot.
    pub fn to_bytes(&self) -> ConfigUpdateResult<Vec<u8>> {
        codec::encode(self).map_err(|e| ConfigUpdateError::serialization("ConfigTree", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> ConfigUpdateResult<Self> {
        codec::decode(bytes).map_err(|e| ConfigUpdateError::decode("ConfigTree", e))
    }
}
