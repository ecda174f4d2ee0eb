//! DiffEngine
//!
//! Computes the minimal [`ConfigUpdate`] that turns `current` into `desired`.
//!
//! ## Rules
//!
//! - A leaf whose content (payload/policy plus `mod_policy`) differs is written
//!   at `current.version + 1` with the desired content.
//! - A leaf or group only present in `desired` is written at version 0, with
//!   everything below it, and has no read-set entry.
//! - A leaf or group only present in `current` gets a tombstone at
//!   `current.version + 1`.
//! - A group whose own attributes changed (`mod_policy`, or the set of names it
//!   contains) is written at `current.version + 1`. A group that is only on the
//!   path to a change keeps its version and acts as a container.
//! - Every touched group appears in the read-set with its version, together
//!   with its unchanged leaves and its untouched child groups.
//!
//! Comparison is content based. Subtrees still shared between the two trees
//! (`Arc::ptr_eq`) are skipped without being walked.

use super::tree::{ConfigElement, ConfigGroup, ConfigPath, ConfigTree};
use super::update::{ConfigUpdate, ReadGroup, WriteEntry, WriteGroup};
use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use shared_types::Version;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Compute the update from `current` to `desired`.
///
/// Fails with `StructuralMismatch` when the trees belong to different
/// namespaces or `desired` was not derived from the same committed sequence.
pub fn compute_update(current: &ConfigTree, desired: &ConfigTree) -> ConfigUpdateResult<ConfigUpdate> {
    if current.namespace != desired.namespace {
        return Err(ConfigUpdateError::StructuralMismatch {
            reason: format!(
                "namespace differs: current '{}', desired '{}'",
                current.namespace, desired.namespace
            ),
        });
    }
    if current.sequence != desired.sequence {
        return Err(ConfigUpdateError::StructuralMismatch {
            reason: format!(
                "desired tree derives from sequence {}, current is {}",
                desired.sequence, current.sequence
            ),
        });
    }

    let diff = if Arc::ptr_eq(&current.root, &desired.root) {
        None
    } else {
        diff_group(&current.root, &desired.root, &ConfigPath::root())?
    };

    let (read_set, write_set) = diff.unwrap_or_else(|| {
        (
            ReadGroup::new(current.root.version),
            WriteGroup::new(current.root.version, current.root.mod_policy.clone()),
        )
    });

    let update = ConfigUpdate {
        namespace: current.namespace.clone(),
        read_set,
        write_set,
    };
    debug!(
        namespace = %update.namespace,
        noop = update.is_noop(),
        "[qc-channel-config] Computed config update"
    );
    Ok(update)
}

/// `None` when nothing at or below the group differs.
fn diff_group(
    current: &ConfigGroup,
    desired: &ConfigGroup,
    path: &ConfigPath,
) -> ConfigUpdateResult<Option<(ReadGroup, WriteGroup)>> {
    let own_change = current.mod_policy != desired.mod_policy || !current.same_membership(desired);

    let mut read = ReadGroup::new(current.version);
    let mut write = WriteGroup::new(
        if own_change {
            next_version(current.version, path)?
        } else {
            current.version
        },
        desired.mod_policy.clone(),
    );

    let mut touched = own_change;
    touched |= diff_elements(
        &current.values,
        &desired.values,
        &mut read.values,
        &mut write.values,
        path,
    )?;
    touched |= diff_elements(
        &current.policies,
        &desired.policies,
        &mut read.policies,
        &mut write.policies,
        path,
    )?;

    for (name, cur) in &current.groups {
        let child_path = path.child(name);
        match desired.groups.get(name) {
            Some(des) => {
                let child = if Arc::ptr_eq(cur, des) {
                    None
                } else {
                    diff_group(cur, des, &child_path)?
                };
                match child {
                    Some((child_read, child_write)) => {
                        read.groups.insert(name.clone(), child_read);
                        write.groups.insert(name.clone(), WriteEntry::Put(child_write));
                        touched = true;
                    }
                    None => {
                        read.groups.insert(name.clone(), ReadGroup::new(cur.version));
                    }
                }
            }
            None => {
                write.groups.insert(
                    name.clone(),
                    WriteEntry::Delete {
                        version: next_version(cur.version, &child_path)?,
                    },
                );
                touched = true;
            }
        }
    }
    for (name, des) in &desired.groups {
        if !current.groups.contains_key(name) {
            write.groups.insert(name.clone(), WriteEntry::Put(new_group(des)));
            touched = true;
        }
    }

    Ok(touched.then_some((read, write)))
}

fn next_version(version: Version, element: &impl ToString) -> ConfigUpdateResult<Version> {
    version
        .checked_add(1)
        .ok_or_else(|| ConfigUpdateError::version_exhausted(element.to_string(), version))
}

/// Returns whether any leaf differs.
fn diff_elements<T: ConfigElement>(
    current: &BTreeMap<String, T>,
    desired: &BTreeMap<String, T>,
    read: &mut BTreeMap<String, Version>,
    write: &mut BTreeMap<String, WriteEntry<T>>,
    path: &ConfigPath,
) -> ConfigUpdateResult<bool> {
    let mut changed = false;

    for (name, cur) in current {
        match desired.get(name) {
            Some(des) if cur.same_content(des) => {
                read.insert(name.clone(), cur.version());
            }
            Some(des) => {
                let mut next = des.clone();
                next.set_version(next_version(cur.version(), &path.element(name))?);
                write.insert(name.clone(), WriteEntry::Put(next));
                changed = true;
            }
            None => {
                write.insert(
                    name.clone(),
                    WriteEntry::Delete {
                        version: next_version(cur.version(), &path.element(name))?,
                    },
                );
                changed = true;
            }
        }
    }
    for (name, des) in desired {
        if !current.contains_key(name) {
            write.insert(name.clone(), WriteEntry::Put(fresh(des)));
            changed = true;
        }
    }

    Ok(changed)
}

fn fresh<T: ConfigElement>(element: &T) -> T {
    let mut element = element.clone();
    element.set_version(0);
    element
}

/// Write-set form of a group that does not exist yet: everything at version 0.
fn new_group(desired: &ConfigGroup) -> WriteGroup {
    let mut write = WriteGroup::new(0, desired.mod_policy.clone());
    for (name, value) in &desired.values {
        write.values.insert(name.clone(), WriteEntry::Put(fresh(value)));
    }
    for (name, policy) in &desired.policies {
        write.policies.insert(name.clone(), WriteEntry::Put(fresh(policy)));
    }
    for (name, group) in &desired.groups {
        write.groups.insert(name.clone(), WriteEntry::Put(new_group(group)));
    }
    write
}
