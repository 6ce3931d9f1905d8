//! Projection of remote entities into actual-state records.

use tharsis_client::{AccessRuleEntity, ManagedIdentityEntity};
use tharsis_core::{AccessRule, ManagedIdentity, decode};

use crate::error::{ReconcileError, Result};

pub(crate) fn project_access_rule(entity: AccessRuleEntity) -> AccessRule {
    AccessRule {
        id: entity.id,
        run_stage: entity.run_stage,
        managed_identity_id: entity.managed_identity_id,
        allowed_users: entity.allowed_users.into_iter().collect(),
        allowed_service_accounts: entity.allowed_service_accounts.into_iter().collect(),
        allowed_teams: entity.allowed_teams.into_iter().collect(),
    }
}

/// Builds the actual-state record from `entity`, taking nested rules from
/// `rules` rather than from the entity itself.
pub(crate) fn project_identity(
    entity: ManagedIdentityEntity,
    rules: Vec<AccessRuleEntity>,
) -> Result<ManagedIdentity> {
    let payload = decode(&entity.data).map_err(|e| ReconcileError::decode(&entity.id, e))?;

    let mut access_rules = Vec::with_capacity(rules.len());
    for rule in rules {
        if rule.managed_identity_id != entity.id {
            return Err(ReconcileError::ForeignAccessRule {
                rule_id: rule.id,
                expected: entity.id,
                actual: rule.managed_identity_id,
            });
        }
        access_rules.push(project_access_rule(rule));
    }
    // Position carries no meaning; sort so state files diff cleanly.
    access_rules.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(ManagedIdentity {
        id: entity.id,
        kind: entity.kind,
        resource_path: entity.resource_path,
        name: entity.name,
        group_path: entity.group_path,
        description: entity.description,
        role: payload.role,
        client_id: payload.client_id,
        tenant_id: payload.tenant_id,
        service_account_path: payload.service_account_path,
        subject: payload.subject,
        access_rules,
        last_updated: entity.metadata.updated_at,
    })
}
