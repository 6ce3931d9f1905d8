//! Reconciler for a single managed identity access rule.

use tharsis_client::{CreateAccessRuleInput, ManagedIdentityApi, UpdateAccessRuleInput};
use tharsis_core::{AccessRule, AccessRuleInput};
use tracing::{debug, info, instrument, warn};

use crate::error::{ReconcileError, Result};
use crate::projection::project_access_rule;

const CREATE: &str = "creating managed identity access rule";
const READ: &str = "reading managed identity access rule";
const UPDATE: &str = "updating managed identity access rule";
const DELETE: &str = "deleting managed identity access rule";

/// CRUD and read-back for access rules, keyed by remote id.
#[derive(Clone, Copy)]
pub struct AccessRuleReconciler<'a> {
    api: &'a dyn ManagedIdentityApi,
}

impl<'a> AccessRuleReconciler<'a> {
    pub fn new(api: &'a dyn ManagedIdentityApi) -> Self {
        Self { api }
    }

    #[instrument(skip(self, desired), fields(run_stage = %desired.run_stage))]
    pub async fn create(
        &self,
        managed_identity_id: &str,
        desired: &AccessRuleInput,
    ) -> Result<AccessRule> {
        let input = CreateAccessRuleInput {
            managed_identity_id: managed_identity_id.to_string(),
            run_stage: desired.run_stage,
            fields: desired.into(),
        };
        let entity = self
            .api
            .create_managed_identity_access_rule(&input)
            .await
            .map_err(|e| ReconcileError::remote(CREATE, e))?;

        let rule = owned_by(project_access_rule(entity), managed_identity_id)?;
        if !rule.matches(desired) {
            warn!(rule_id = %rule.id, "access rule members differ from request");
        }
        info!(rule_id = %rule.id, "created managed identity access rule");
        Ok(rule)
    }

    /// Returns `None` when the rule no longer exists remotely; the caller
    /// should drop its local record.
    #[instrument(skip(self))]
    pub async fn read(&self, id: &str) -> Result<Option<AccessRule>> {
        match self.api.get_managed_identity_access_rule(id).await {
            Ok(entity) => Ok(Some(project_access_rule(entity))),
            Err(e) if e.is_not_found() => {
                warn!(rule_id = id, "managed identity access rule not found, removing from state");
                Ok(None)
            }
            Err(e) => Err(ReconcileError::remote(READ, e)),
        }
    }

    /// Replaces stage and all member sets. The whole record is taken from the
    /// response, which must still belong to `managed_identity_id`.
    #[instrument(skip(self, desired), fields(run_stage = %desired.run_stage))]
    pub async fn update(
        &self,
        managed_identity_id: &str,
        id: &str,
        desired: &AccessRuleInput,
    ) -> Result<AccessRule> {
        let input = UpdateAccessRuleInput {
            id: id.to_string(),
            run_stage: desired.run_stage,
            fields: desired.into(),
        };
        let entity = self
            .api
            .update_managed_identity_access_rule(&input)
            .await
            .map_err(|e| ReconcileError::remote(UPDATE, e))?;

        let rule = owned_by(project_access_rule(entity), managed_identity_id)?;
        info!(rule_id = id, "updated managed identity access rule");
        Ok(rule)
    }

    /// Deleting a rule that is already gone succeeds.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        match self.api.delete_managed_identity_access_rule(id).await {
            Ok(()) => {
                info!(rule_id = id, "deleted managed identity access rule");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(rule_id = id, "managed identity access rule already deleted");
                Ok(())
            }
            Err(e) => Err(ReconcileError::remote(DELETE, e)),
        }
    }
}

fn owned_by(rule: AccessRule, managed_identity_id: &str) -> Result<AccessRule> {
    if rule.managed_identity_id != managed_identity_id {
        return Err(ReconcileError::ForeignAccessRule {
            rule_id: rule.id,
            expected: managed_identity_id.to_string(),
            actual: rule.managed_identity_id,
        });
    }
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tharsis_client::{
        CreateManagedIdentityInput, ManagedIdentityApi, MemoryApi, Operation,
    };
    use tharsis_core::{CredentialFields, ManagedIdentityType, RunStage, encode};

    async fn parent(api: &MemoryApi) -> String {
        api.create_managed_identity(&CreateManagedIdentityInput {
            kind: ManagedIdentityType::AwsFederated,
            name: "deployer".to_string(),
            description: String::new(),
            group_path: "top".to_string(),
            data: encode("aws_federated", &CredentialFields::aws("r")).unwrap(),
            access_rules: Vec::new(),
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_create_read_update_delete() {
        let api = MemoryApi::new();
        let parent_id = parent(&api).await;
        let rules = AccessRuleReconciler::new(&api);

        let desired = AccessRuleInput::new(RunStage::Plan)
            .with_users(["b@example.com", "a@example.com"])
            .with_teams(["ops"]);
        let created = rules.create(&parent_id, &desired).await.unwrap();
        assert_eq!(created.managed_identity_id, parent_id);
        assert!(created.matches(&desired));

        let read = rules.read(&created.id).await.unwrap().unwrap();
        assert_eq!(read, created);

        let replacement = AccessRuleInput::new(RunStage::Apply).with_service_accounts(["top/sa"]);
        let updated = rules
            .update(&parent_id, &created.id, &replacement)
            .await
            .unwrap();
        assert_eq!(updated.run_stage, RunStage::Apply);
        assert!(updated.allowed_users.is_empty());
        assert!(updated.allowed_teams.is_empty());
        assert!(updated.matches(&replacement));

        rules.delete(&created.id).await.unwrap();
        assert_eq!(rules.read(&created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let api = MemoryApi::new();
        let parent_id = parent(&api).await;
        let rules = AccessRuleReconciler::new(&api);
        let created = rules
            .create(&parent_id, &AccessRuleInput::new(RunStage::Apply))
            .await
            .unwrap();

        rules.delete(&created.id).await.unwrap();
        rules.delete(&created.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_surfaces_other_errors() {
        let api = MemoryApi::new();
        api.fail_next(Operation::GetManagedIdentityAccessRule, 500, "database unavailable")
            .await;

        let err = AccessRuleReconciler::new(&api).read("r-1").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "reading managed identity access rule: HTTP 500: database unavailable"
        );
    }

    #[tokio::test]
    async fn test_update_of_missing_rule_is_an_error() {
        let api = MemoryApi::new();
        let err = AccessRuleReconciler::new(&api)
            .update("mi-1", "gone", &AccessRuleInput::new(RunStage::Plan))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Remote { operation, ref source } if operation == UPDATE && source.is_not_found()
        ));
    }

    #[tokio::test]
    async fn test_create_for_missing_parent_fails() {
        let api = MemoryApi::new();
        let err = AccessRuleReconciler::new(&api)
            .create("missing", &AccessRuleInput::new(RunStage::Plan))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with(CREATE));
    }

    #[tokio::test]
    async fn test_update_rejects_rule_of_other_identity() {
        let api = MemoryApi::new();
        let owner = parent(&api).await;
        let rules = AccessRuleReconciler::new(&api);
        let created = rules
            .create(&owner, &AccessRuleInput::new(RunStage::Plan))
            .await
            .unwrap();

        let err = rules
            .update("mi-other", &created.id, &AccessRuleInput::new(RunStage::Apply))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::ForeignAccessRule { ref expected, ref actual, .. }
                if expected == "mi-other" && *actual == owner
        ));
    }
}
