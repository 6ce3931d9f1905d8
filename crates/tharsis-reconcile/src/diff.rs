//! Drift between desired state and an actual-state record.

use tharsis_core::{AccessRule, AccessRuleInput, ManagedIdentity, ManagedIdentityInput};

/// What it takes to bring a managed identity in line with desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityPlan {
    NoOp,
    /// Mutable fields changed.
    Update { description: bool, credentials: bool },
    /// Fields that cannot change after create differ; the identity must be
    /// deleted and created again.
    Replace { fields: Vec<&'static str> },
}

impl IdentityPlan {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

/// Compares the identity itself. Access rules are planned separately by
/// [`plan_access_rules`].
pub fn plan_identity(desired: &ManagedIdentityInput, actual: &ManagedIdentity) -> IdentityPlan {
    let mut immutable = Vec::new();
    if desired.kind != actual.kind {
        immutable.push("type");
    }
    if desired.name != actual.name {
        immutable.push("name");
    }
    if desired.group_path != actual.group_path {
        immutable.push("group_path");
    }
    if !immutable.is_empty() {
        return IdentityPlan::Replace { fields: immutable };
    }

    let description = desired.description != actual.description;
    // `subject` is output only and never part of the comparison.
    let credentials = desired.credentials != actual.credential_fields();
    if description || credentials {
        IdentityPlan::Update {
            description,
            credentials,
        }
    } else {
        IdentityPlan::NoOp
    }
}

/// Access rule changes, identified by membership rather than position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRulePlan {
    pub create: Vec<AccessRuleInput>,
    /// Existing rule ids to overwrite with new content.
    pub update: Vec<(String, AccessRuleInput)>,
    pub delete: Vec<String>,
}

impl AccessRulePlan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Matches desired rules to actual rules one-to-one.
///
/// Exact matches (same stage, same members in any order) are left alone.
/// A leftover desired rule takes over a leftover actual rule of the same run
/// stage through an update; whatever remains is created or deleted.
pub fn plan_access_rules(desired: &[AccessRuleInput], actual: &[AccessRule]) -> AccessRulePlan {
    let mut unmatched_actual: Vec<&AccessRule> = actual.iter().collect();
    let mut unmatched_desired = Vec::new();

    for rule in desired {
        match unmatched_actual.iter().position(|a| a.matches(rule)) {
            Some(pos) => {
                unmatched_actual.remove(pos);
            }
            None => unmatched_desired.push(rule),
        }
    }

    let mut plan = AccessRulePlan::default();
    for rule in unmatched_desired {
        match unmatched_actual
            .iter()
            .position(|a| a.run_stage == rule.run_stage)
        {
            Some(pos) => {
                let existing = unmatched_actual.remove(pos);
                plan.update.push((existing.id.clone(), rule.clone()));
            }
            None => plan.create.push(rule.clone()),
        }
    }
    plan.delete = unmatched_actual.into_iter().map(|a| a.id.clone()).collect();
    plan
}
