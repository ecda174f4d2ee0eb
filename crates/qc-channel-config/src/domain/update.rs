//! ConfigUpdate: the read-set / write-set pair
//!
//! The read-set mirrors the touched part of the committed tree and carries
//! only versions. The write-set carries new content for changed elements
//! and explicit tombstones for deleted ones; a group listed in the
//! write-set with its committed version is a path container only.

use super::tree::{ConfigPath, ConfigPolicy, ConfigValue};
use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use serde::{Deserialize, Serialize};
use shared_types::{codec, NamespaceId, Version};
use std::collections::BTreeMap;
use std::fmt;

/// Versions the update expects to find committed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadGroup {
    pub version: Version,
    pub groups: BTreeMap<String, ReadGroup>,
    pub values: BTreeMap<String, Version>,
    pub policies: BTreeMap<String, Version>,
}

impl ReadGroup {
    /// A bare version precondition on a group.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }
}

/// One write-set entry: new content, or a tombstone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteEntry<T> {
    Put(T),
    /// Explicit removal; `version` is the committed version plus one.
    Delete { version: Version },
}

impl<T> WriteEntry<T> {
    pub fn is_delete(&self) -> bool {
        matches!(self, WriteEntry::Delete { .. })
    }
}

/// New content for a touched group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteGroup {
    pub version: Version,
    pub mod_policy: String,
    pub groups: BTreeMap<String, WriteEntry<WriteGroup>>,
    pub values: BTreeMap<String, WriteEntry<ConfigValue>>,
    pub policies: BTreeMap<String, WriteEntry<ConfigPolicy>>,
}

impl WriteGroup {
    pub fn new(version: Version, mod_policy: impl Into<String>) -> Self {
        Self {
            version,
            mod_policy: mod_policy.into(),
            ..Self::default()
        }
    }

    /// Whether the group lists no entries at all.
    pub fn has_entries(&self) -> bool {
        !(self.groups.is_empty() && self.values.is_empty() && self.policies.is_empty())
    }
}

/// What happened to one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// Written at version 0.
    Added,
    Modified,
    Deleted,
    /// The group's own attributes changed.
    GroupAttributes,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::GroupAttributes => "group",
        };
        f.write_str(label)
    }
}

/// A flattened write-set entry, for logs and tooling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
    pub version: Version,
}

/// Minimal delta between two snapshots of one namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub namespace: NamespaceId,
    pub read_set: ReadGroup,
    pub write_set: WriteGroup,
}

impl ConfigUpdate {
    /// True when the update changes nothing.
    pub fn is_noop(&self) -> bool {
        self.write_set.version == self.read_set.version && !self.write_set.has_entries()
    }

    pub fn to_bytes(&self) -> ConfigUpdateResult<Vec<u8>> {
        codec::encode(self).map_err(|e| ConfigUpdateError::serialization("ConfigUpdate", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> ConfigUpdateResult<Self> {
        codec::decode(bytes).map_err(|e| ConfigUpdateError::decode("ConfigUpdate", e))
    }

    /// Every change in the write-set, depth first.
    pub fn changes(&self) -> Vec<Change> {
        let mut out = Vec::new();
        collect_changes(
            &ConfigPath::root(),
            &self.write_set,
            Some(&self.read_set),
            &mut out,
        );
        out
    }
}

/// `read` is `None` for groups that do not exist yet.
fn collect_changes(
    path: &ConfigPath,
    group: &WriteGroup,
    read: Option<&ReadGroup>,
    out: &mut Vec<Change>,
) {
    let kind = match read {
        None => Some(ChangeKind::Added),
        Some(r) if r.version != group.version => Some(ChangeKind::GroupAttributes),
        Some(_) => None,
    };
    if let Some(kind) = kind {
        out.push(Change {
            path: path.to_string(),
            kind,
            version: group.version,
        });
    }

    let leaf = |name: &str, version: Version, deleted: bool| Change {
        path: path.element(name),
        kind: if deleted {
            ChangeKind::Deleted
        } else if read.is_none() || version == 0 {
            ChangeKind::Added
        } else {
            ChangeKind::Modified
        },
        version,
    };

    for (name, entry) in &group.values {
        out.push(match entry {
            WriteEntry::Put(v) => leaf(name, v.version, false),
            WriteEntry::Delete { version } => leaf(name, *version, true),
        });
    }
    for (name, entry) in &group.policies {
        out.push(match entry {
            WriteEntry::Put(p) => leaf(name, p.version, false),
            WriteEntry::Delete { version } => leaf(name, *version, true),
        });
    }
    for (name, entry) in &group.groups {
        match entry {
            WriteEntry::Put(child) => collect_changes(
                &path.child(name),
                child,
                read.and_then(|r| r.groups.get(name)),
                out,
            ),
            WriteEntry::Delete { version } => out.push(leaf(name, *version, true)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(write_set: WriteGroup, read_set: ReadGroup) -> ConfigUpdate {
        ConfigUpdate {
            namespace: NamespaceId::new("testchannel").unwrap(),
            read_set,
            write_set,
        }
    }

    #[test]
    fn test_empty_container_is_noop() {
        assert!(update(WriteGroup::new(2, "Admins"), ReadGroup::new(2)).is_noop());
        assert!(!update(WriteGroup::new(3, "Admins"), ReadGroup::new(2)).is_noop());
    }

    #[test]
    fn test_tombstone_is_not_noop() {
        let mut write = WriteGroup::new(2, "Admins");
        write
            .values
            .insert("BatchSize".into(), WriteEntry::Delete { version: 4 });
        let u = update(write, ReadGroup::new(2));
        assert!(!u.is_noop());
        assert_eq!(
            u.changes(),
            vec![Change {
                path: "/Channel/BatchSize".into(),
                kind: ChangeKind::Deleted,
                version: 4,
            }]
        );
    }

    #[test]
    fn test_changes_classify_entries() {
        let mut orderer = WriteGroup::new(1, "Admins");
        orderer.values.insert(
            "ConsensusType".into(),
            WriteEntry::Put(ConfigValue {
                version: 3,
                mod_policy: "Admins".into(),
                value: vec![1],
            }),
        );
        let mut new_org = WriteGroup::new(0, "Admins");
        new_org.values.insert(
            "MSP".into(),
            WriteEntry::Put(ConfigValue::new(vec![2], "Admins")),
        );
        let mut root = WriteGroup::new(0, "Admins");
        root.groups.insert("Orderer".into(), WriteEntry::Put(orderer));
        root.groups.insert("Org3".into(), WriteEntry::Put(new_org));

        let mut read = ReadGroup::new(0);
        read.groups.insert("Orderer".into(), ReadGroup::new(1));

        let kinds: Vec<_> = update(root, read)
            .changes()
            .into_iter()
            .map(|c| (c.path, c.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("/Channel/Orderer/ConsensusType".to_string(), ChangeKind::Modified),
                ("/Channel/Org3".to_string(), ChangeKind::Added),
                ("/Channel/Org3/MSP".to_string(), ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn test_update_bytes_are_stable() {
        let u = update(WriteGroup::new(1, "Admins"), ReadGroup::new(0));
        let bytes = u.to_bytes().unwrap();
        assert_eq!(ConfigUpdate::from_bytes(&bytes).unwrap(), u);
        assert_eq!(u.clone().to_bytes().unwrap(), bytes);
        assert!(ConfigUpdate::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }
}
