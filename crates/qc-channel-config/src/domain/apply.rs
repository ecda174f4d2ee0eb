//! UpdateValidator: commit-side checking and application of a ConfigUpdate
//!
//! [`validate_and_apply`] is what the ordering side runs before it commits:
//!
//! 1. Every read-set version must match the committed tree exactly.
//! 2. Every write-set version must follow the version rules.
//! 3. The write-set is applied to a copy of the committed tree, and the
//!    list of policies that must authorize the change is produced.
//!
//! Application is pure: the committed tree is never touched and the
//! resulting tree keeps the committed `sequence`.

use super::tree::{ConfigElement, ConfigGroup, ConfigPath, ConfigTree};
use super::update::{ConfigUpdate, ReadGroup, WriteEntry, WriteGroup};
use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use shared_types::Version;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One policy check required by an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authorization {
    /// Group relative policy references resolve against.
    pub governing_group: ConfigPath,
    /// Rendered path of the changed element.
    pub element: String,
    pub policy: String,
}

/// Result of applying an update to the committed tree.
#[derive(Clone, Debug)]
pub struct AppliedUpdate {
    pub tree: ConfigTree,
    pub authorizations: Vec<Authorization>,
}

/// Check `update` against `committed` and apply its write-set.
pub fn validate_and_apply(committed: &ConfigTree, update: &ConfigUpdate) -> ConfigUpdateResult<AppliedUpdate> {
    if update.namespace != committed.namespace {
        return Err(ConfigUpdateError::StructuralMismatch {
            reason: format!(
                "update targets '{}', committed tree is '{}'",
                update.namespace, committed.namespace
            ),
        });
    }

    let root_path = ConfigPath::root();
    check_reads(&committed.root, &update.read_set, &root_path)?;

    let mut authorizations = Vec::new();
    let root = apply_group(
        &committed.root,
        &update.write_set,
        &root_path,
        &mut authorizations,
    )?;

    let tree = ConfigTree {
        namespace: committed.namespace.clone(),
        sequence: committed.sequence,
        root: Arc::new(root),
    };
    Ok(AppliedUpdate {
        tree,
        authorizations,
    })
}

fn check_reads(group: &ConfigGroup, read: &ReadGroup, path: &ConfigPath) -> ConfigUpdateResult<()> {
    if group.version != read.version {
        return Err(ConfigUpdateError::stale(
            path,
            Some(read.version),
            Some(group.version),
        ));
    }
    check_leaf_reads(&group.values, &read.values, path)?;
    check_leaf_reads(&group.policies, &read.policies, path)?;

    for (name, child_read) in &read.groups {
        let child_path = path.child(name);
        let child = group.group(name).ok_or_else(|| {
            ConfigUpdateError::stale(&child_path, Some(child_read.version), None)
        })?;
        check_reads(child, child_read, &child_path)?;
    }
    Ok(())
}

fn check_leaf_reads<T: ConfigElement>(
    committed: &BTreeMap<String, T>,
    read: &BTreeMap<String, u64>,
    path: &ConfigPath,
) -> ConfigUpdateResult<()> {
    for (name, &expected) in read {
        let actual = committed.get(name).map(|e| e.version());
        if actual != Some(expected) {
            return Err(ConfigUpdateError::stale(
                path.element(name),
                Some(expected),
                actual,
            ));
        }
    }
    Ok(())
}

/// Apply `write` onto an existing group.
fn apply_group(
    current: &ConfigGroup,
    write: &WriteGroup,
    path: &ConfigPath,
    auths: &mut Vec<Authorization>,
) -> ConfigUpdateResult<ConfigGroup> {
    let own_change = if write.version == current.version {
        if write.mod_policy != current.mod_policy {
            return Err(ConfigUpdateError::malformed(
                path,
                "mod_policy changed without a version bump",
            ));
        }
        false
    } else if write.version == next_version(current.version, path)? {
        auths.push(Authorization {
            governing_group: path.clone(),
            element: path.to_string(),
            policy: write.mod_policy.clone(),
        });
        true
    } else if write.version < current.version {
        return Err(ConfigUpdateError::stale(
            path,
            Some(write.version),
            Some(current.version),
        ));
    } else {
        return Err(ConfigUpdateError::malformed(
            path,
            format!(
                "group version {} skips ahead of committed {}",
                write.version, current.version
            ),
        ));
    };

    let mut next = current.clone();
    next.version = write.version;
    next.mod_policy = write.mod_policy.clone();

    apply_leaves(&mut next.values, &write.values, path, own_change, auths)?;
    apply_leaves(&mut next.policies, &write.policies, path, own_change, auths)?;

    for (name, entry) in &write.groups {
        let child_path = path.child(name);
        let existing = current.group(name);
        match (entry, existing) {
            (WriteEntry::Put(child_write), Some(child)) => {
                let applied = apply_group(child, child_write, &child_path, auths)?;
                next.groups.insert(name.clone(), Arc::new(applied));
            }
            (WriteEntry::Put(child_write), None) => {
                require_membership_change(own_change, &child_path)?;
                if child_write.version != 0 {
                    return Err(ConfigUpdateError::stale(
                        &child_path,
                        Some(child_write.version.saturating_sub(1)),
                        None,
                    ));
                }
                let created = create_group(child_write, &child_path, auths)?;
                next.groups.insert(name.clone(), Arc::new(created));
            }
            (WriteEntry::Delete { version }, Some(child)) => {
                require_membership_change(own_change, &child_path)?;
                check_tombstone(*version, child.version, &child_path)?;
                auths.push(Authorization {
                    governing_group: child_path.clone(),
                    element: child_path.to_string(),
                    policy: child.mod_policy.clone(),
                });
                next.groups.remove(name);
            }
            (WriteEntry::Delete { version }, None) => {
                return Err(ConfigUpdateError::stale(
                    &child_path,
                    Some(version.saturating_sub(1)),
                    None,
                ));
            }
        }
    }

    Ok(next)
}

fn apply_leaves<T: ConfigElement>(
    target: &mut BTreeMap<String, T>,
    writes: &BTreeMap<String, WriteEntry<T>>,
    path: &ConfigPath,
    own_change: bool,
    auths: &mut Vec<Authorization>,
) -> ConfigUpdateResult<()> {
    for (name, entry) in writes {
        let element_path = path.element(name);
        let committed_version = target.get(name).map(|e| e.version());
        match (entry, committed_version) {
            (WriteEntry::Put(leaf), Some(committed)) => {
                let written = leaf.version();
                if written != next_version(committed, &element_path)? {
                    return Err(if written <= committed {
                        ConfigUpdateError::stale(
                            &element_path,
                            Some(written.saturating_sub(1)),
                            Some(committed),
                        )
                    } else {
                        ConfigUpdateError::malformed(
                            &element_path,
                            format!("version {} skips ahead of committed {}", written, committed),
                        )
                    });
                }
                auths.push(leaf_authorization(path, element_path, leaf.mod_policy()));
                target.insert(name.clone(), leaf.clone());
            }
            (WriteEntry::Put(leaf), None) => {
                require_membership_change(own_change, &element_path)?;
                if leaf.version() != 0 {
                    return Err(ConfigUpdateError::stale(
                        &element_path,
                        Some(leaf.version().saturating_sub(1)),
                        None,
                    ));
                }
                auths.push(leaf_authorization(path, element_path, leaf.mod_policy()));
                target.insert(name.clone(), leaf.clone());
            }
            (WriteEntry::Delete { version }, Some(committed)) => {
                require_membership_change(own_change, &element_path)?;
                check_tombstone(*version, committed, &element_path)?;
                if let Some(removed) = target.remove(name) {
                    auths.push(leaf_authorization(path, element_path, removed.mod_policy()));
                }
            }
            (WriteEntry::Delete { version }, None) => {
                return Err(ConfigUpdateError::stale(
                    &element_path,
                    Some(version.saturating_sub(1)),
                    None,
                ));
            }
        }
    }
    Ok(())
}

/// Build a group that does not exist in the committed tree.
fn create_group(
    write: &WriteGroup,
    path: &ConfigPath,
    auths: &mut Vec<Authorization>,
) -> ConfigUpdateResult<ConfigGroup> {
    auths.push(Authorization {
        governing_group: path.clone(),
        element: path.to_string(),
        policy: write.mod_policy.clone(),
    });

    let mut group = ConfigGroup::new(write.mod_policy.clone());
    group.values = create_leaves(&write.values, path, auths)?;
    group.policies = create_leaves(&write.policies, path, auths)?;

    for (name, entry) in &write.groups {
        let child_path = path.child(name);
        match entry {
            WriteEntry::Put(child) if child.version == 0 => {
                let created = create_group(child, &child_path, auths)?;
                group.groups.insert(name.clone(), Arc::new(created));
            }
            WriteEntry::Put(_) => {
                return Err(ConfigUpdateError::malformed(
                    &child_path,
                    "group inside a new group must start at version 0",
                ))
            }
            WriteEntry::Delete { .. } => {
                return Err(ConfigUpdateError::malformed(
                    &child_path,
                    "tombstone inside a new group",
                ))
            }
        }
    }
    Ok(group)
}

fn create_leaves<T: ConfigElement>(
    writes: &BTreeMap<String, WriteEntry<T>>,
    path: &ConfigPath,
    auths: &mut Vec<Authorization>,
) -> ConfigUpdateResult<BTreeMap<String, T>> {
    let mut out = BTreeMap::new();
    for (name, entry) in writes {
        let element_path = path.element(name);
        match entry {
            WriteEntry::Put(leaf) if leaf.version() == 0 => {
                auths.push(leaf_authorization(path, element_path, leaf.mod_policy()));
                out.insert(name.clone(), leaf.clone());
            }
            WriteEntry::Put(_) => {
                return Err(ConfigUpdateError::malformed(
                    element_path,
                    "element inside a new group must start at version 0",
                ))
            }
            WriteEntry::Delete { .. } => {
                return Err(ConfigUpdateError::malformed(element_path, "tombstone inside a new group"))
            }
        }
    }
    Ok(out)
}

fn leaf_authorization(group: &ConfigPath, element: String, policy: &str) -> Authorization {
    Authorization {
        governing_group: group.clone(),
        element,
        policy: policy.to_string(),
    }
}

fn require_membership_change(own_change: bool, path: &impl ToString) -> ConfigUpdateResult<()> {
    if own_change {
        Ok(())
    } else {
        Err(ConfigUpdateError::malformed(
            path.to_string(),
            "membership change without a group version bump",
        ))
    }
}

fn next_version(committed: Version, path: &impl ToString) -> ConfigUpdateResult<Version> {
    committed
        .checked_add(1)
        .ok_or_else(|| ConfigUpdateError::version_exhausted(path.to_string(), committed))
}

fn check_tombstone(version: u64, committed: u64, path: &impl ToString) -> ConfigUpdateResult<()> {
    if version == next_version(committed, path)? {
        Ok(())
    } else if version <= committed {
        Err(ConfigUpdateError::stale(
            path.to_string(),
            Some(version.saturating_sub(1)),
            Some(committed),
        ))
    } else {
        Err(ConfigUpdateError::malformed(
            path.to_string(),
            format!("tombstone version {} skips ahead of committed {}", version, committed),
        ))
    }
}
