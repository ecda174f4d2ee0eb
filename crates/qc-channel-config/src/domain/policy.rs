//! Policy expressions and their evaluation
//!
//! Two kinds of policy exist:
//!
//! - **Signature**: `required` out of a list of `(org, role)` principals. Each
//!   verified signer can satisfy at most one principal; signers are assigned
//!   so that as many principals as possible are satisfied.
//! - **ImplicitMeta**: aggregates the policy named `sub_policy` across all
//!   direct child groups (`ANY` = 1, `ALL` = n, `MAJORITY` = n/2 + 1). A group
//!   without children never satisfies an implicit-meta policy.
//!
//! A policy reference is either relative (`Admins`, looked up in the governing
//! group) or absolute (`/Channel/Orderer/Admins`).

use super::tree::{ConfigPath, ConfigTree};
use serde::{Deserialize, Serialize};
use shared_types::{IdentityRole, SerializedIdentity};
use tracing::trace;

/// A principal a signer may satisfy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub org: String,
    pub role: IdentityRole,
}

impl Principal {
    pub fn new(org: impl Into<String>, role: IdentityRole) -> Self {
        Self {
            org: org.into(),
            role,
        }
    }

    /// `Member` accepts any role of the org; other roles must match exactly.
    pub fn is_satisfied_by(&self, identity: &SerializedIdentity) -> bool {
        identity.org == self.org && (self.role == IdentityRole::Member || identity.role == self.role)
    }
}

/// `required` out of `principals`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePolicy {
    pub required: u32,
    pub principals: Vec<Principal>,
}

/// Aggregation rule for implicit-meta policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImplicitMetaRule {
    Any,
    All,
    Majority,
}

impl ImplicitMetaRule {
    fn threshold(self, children: usize) -> usize {
        match self {
            ImplicitMetaRule::Any => 1,
            ImplicitMetaRule::All => children,
            ImplicitMetaRule::Majority => children / 2 + 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplicitMetaPolicy {
    pub sub_policy: String,
    pub rule: ImplicitMetaRule,
}

/// A policy expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Policy {
    Signature(SignaturePolicy),
    ImplicitMeta(ImplicitMetaPolicy),
}

impl Policy {
    pub fn signature(required: u32, principals: Vec<Principal>) -> Self {
        Policy::Signature(SignaturePolicy {
            required,
            principals,
        })
    }

    /// One signature from any identity with `role` in `org`.
    pub fn one_of(org: impl Into<String>, role: IdentityRole) -> Self {
        Self::signature(1, vec![Principal::new(org, role)])
    }

    pub fn implicit_meta(sub_policy: impl Into<String>, rule: ImplicitMetaRule) -> Self {
        Policy::ImplicitMeta(ImplicitMetaPolicy {
            sub_policy: sub_policy.into(),
            rule,
        })
    }
}

/// Evaluates policy references against a set of verified signers.
///
/// References resolve against the committed tree. Groups that only exist in
/// the proposed tree (being added by the update under evaluation) resolve
/// against the proposed tree instead.
pub struct PolicyEvaluator<'a> {
    committed: &'a ConfigTree,
    proposed: Option<&'a ConfigTree>,
}

impl<'a> PolicyEvaluator<'a> {
    pub fn new(committed: &'a ConfigTree) -> Self {
        Self {
            committed,
            proposed: None,
        }
    }

    pub fn with_proposed(mut self, proposed: &'a ConfigTree) -> Self {
        self.proposed = Some(proposed);
        self
    }

    /// Whether `signers` satisfy `policy_ref` as seen from the group at `governing`.
    pub fn evaluate(
        &self,
        governing: &ConfigPath,
        policy_ref: &str,
        signers: &[SerializedIdentity],
    ) -> bool {
        let Some((path, name)) = Self::resolve(governing, policy_ref) else {
            trace!(policy = policy_ref, "unresolvable policy reference");
            return false;
        };

        let tree = if self.committed.group(&path).is_some() {
            self.committed
        } else {
            match self.proposed {
                Some(proposed) if proposed.group(&path).is_some() => proposed,
                _ => return false,
            }
        };

        Self::evaluate_in(tree, &path, &name, signers)
    }

    fn resolve(governing: &ConfigPath, policy_ref: &str) -> Option<(ConfigPath, String)> {
        if policy_ref.is_empty() {
            return None;
        }
        if let Some((group, name)) = policy_ref.rsplit_once('/') {
            if !policy_ref.starts_with('/') || name.is_empty() {
                return None;
            }
            let path = ConfigPath::parse(group).ok()?;
            return Some((path, name.to_string()));
        }
        Some((governing.clone(), policy_ref.to_string()))
    }

    fn evaluate_in(
        tree: &ConfigTree,
        path: &ConfigPath,
        name: &str,
        signers: &[SerializedIdentity],
    ) -> bool {
        let Some(group) = tree.group(path) else {
            return false;
        };
        let Some(config_policy) = group.policies.get(name) else {
            return false;
        };

        match &config_policy.policy {
            Policy::Signature(policy) => Self::evaluate_signature(policy, signers),
            Policy::ImplicitMeta(policy) => {
                let children = group.groups.len();
                if children == 0 {
                    return false;
                }
                let satisfied = group
                    .groups
                    .keys()
                    .filter(|child| {
                        Self::evaluate_in(tree, &path.child(child), &policy.sub_policy, signers)
                    })
                    .count();
                satisfied >= policy.rule.threshold(children)
            }
        }
    }

    /// Maximum matching of signers to principals, one signer per principal.
    /// A broad principal (`Member`) gives up a signer a narrower one needs.
    fn evaluate_signature(policy: &SignaturePolicy, signers: &[SerializedIdentity]) -> bool {
        let mut owner: Vec<Option<usize>> = vec![None; signers.len()];
        let mut matched = 0u32;
        for principal in 0..policy.principals.len() {
            if matched >= policy.required {
                break;
            }
            let mut visited = vec![false; signers.len()];
            if Self::augment(policy, signers, principal, &mut visited, &mut owner) {
                matched += 1;
            }
        }
        matched >= policy.required
    }

    fn augment(
        policy: &SignaturePolicy,
        signers: &[SerializedIdentity],
        principal: usize,
        visited: &mut [bool],
        owner: &mut [Option<usize>],
    ) -> bool {
        for (i, signer) in signers.iter().enumerate() {
            if visited[i] || !policy.principals[principal].is_satisfied_by(signer) {
                continue;
            }
            visited[i] = true;
            let free = match owner[i] {
                None => true,
                Some(holder) => Self::augment(policy, signers, holder, visited, owner),
            };
            if free {
                owner[i] = Some(principal);
                return true;
            }
        }
        false
    }
}
