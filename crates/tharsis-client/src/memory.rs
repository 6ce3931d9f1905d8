//! In-memory implementation of the managed identity API.
//!
//! Behaves like the real service where the reconcilers care: it assigns ids,
//! computes resource paths, stamps the credential payload with a `subject`,
//! cascades access rule deletion, and (like the real create endpoint) returns
//! an empty `accessRules` list from `create_managed_identity` even though the
//! inline rules are persisted.
//!
//! Every call is recorded, and failures can be injected per operation, which
//! makes it the default backend for reconciler tests.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use async_trait::async_trait;
use tharsis_core::{decode, resource_path};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::ApiError;
use crate::not_found::not_found_message;
use crate::traits::ManagedIdentityApi;
use crate::types::{
    AccessRuleEntity, AccessRuleFields, CreateAccessRuleInput, CreateManagedIdentityInput,
    ManagedIdentityEntity, ResourceMetadata, UpdateAccessRuleInput, UpdateManagedIdentityInput,
};

const IDENTITY_KIND: &str = "Managed identity";
const RULE_KIND: &str = "Managed identity access rule";

/// The remote operations, used for the call log and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateManagedIdentity,
    GetManagedIdentity,
    UpdateManagedIdentity,
    DeleteManagedIdentity,
    GetManagedIdentityAccessRules,
    CreateManagedIdentityAccessRule,
    GetManagedIdentityAccessRule,
    UpdateManagedIdentityAccessRule,
    DeleteManagedIdentityAccessRule,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateManagedIdentity => "CreateManagedIdentity",
            Self::GetManagedIdentity => "GetManagedIdentity",
            Self::UpdateManagedIdentity => "UpdateManagedIdentity",
            Self::DeleteManagedIdentity => "DeleteManagedIdentity",
            Self::GetManagedIdentityAccessRules => "GetManagedIdentityAccessRules",
            Self::CreateManagedIdentityAccessRule => "CreateManagedIdentityAccessRule",
            Self::GetManagedIdentityAccessRule => "GetManagedIdentityAccessRule",
            Self::UpdateManagedIdentityAccessRule => "UpdateManagedIdentityAccessRule",
            Self::DeleteManagedIdentityAccessRule => "DeleteManagedIdentityAccessRule",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
struct State {
    // Stored without nested rules; those live in `rules`.
    identities: BTreeMap<String, ManagedIdentityEntity>,
    rules: BTreeMap<String, AccessRuleEntity>,
    calls: Vec<Operation>,
    failures: HashMap<Operation, (u16, String)>,
}

impl State {
    fn begin(&mut self, op: Operation) -> Result<(), ApiError> {
        self.calls.push(op);
        match self.failures.remove(&op) {
            Some((status, message)) => Err(ApiError::remote(status, message)),
            None => Ok(()),
        }
    }

    fn rules_of(&self, managed_identity_id: &str) -> Vec<AccessRuleEntity> {
        self.rules
            .values()
            .filter(|rule| rule.managed_identity_id == managed_identity_id)
            .cloned()
            .collect()
    }

    fn identity(&self, id: &str) -> Result<&ManagedIdentityEntity, ApiError> {
        self.identities
            .get(id)
            .ok_or_else(|| ApiError::not_found(not_found_message(IDENTITY_KIND, id)))
    }

    fn insert_rule(
        &mut self,
        managed_identity_id: &str,
        run_stage: tharsis_core::RunStage,
        fields: &AccessRuleFields,
        now: OffsetDateTime,
    ) -> AccessRuleEntity {
        let rule = AccessRuleEntity {
            id: Uuid::new_v4().to_string(),
            run_stage,
            managed_identity_id: managed_identity_id.to_string(),
            allowed_users: fields.allowed_users.clone(),
            allowed_service_accounts: fields.allowed_service_accounts.clone(),
            allowed_teams: fields.allowed_teams.clone(),
            metadata: ResourceMetadata::created(now),
        };
        self.rules.insert(rule.id.clone(), rule.clone());
        rule
    }
}

/// In-process stand-in for the Tharsis API.
#[derive(Default)]
pub struct MemoryApi {
    state: Mutex<State>,
}

impl MemoryApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `op` fail with the given status and message.
    pub async fn fail_next(&self, op: Operation, status: u16, message: impl Into<String>) {
        self.state
            .lock()
            .await
            .failures
            .insert(op, (status, message.into()));
    }

    /// Operations invoked so far, in order.
    pub async fn calls(&self) -> Vec<Operation> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Number of stored managed identities.
    pub async fn identity_count(&self) -> usize {
        self.state.lock().await.identities.len()
    }

    /// Number of stored access rules across all identities.
    pub async fn access_rule_count(&self) -> usize {
        self.state.lock().await.rules.len()
    }
}

// Payloads are re-encoded with the subject the service assigns.
fn stamp_subject(data: &str, subject: &str) -> Result<String, ApiError> {
    let mut payload =
        decode(data).map_err(|e| ApiError::remote(400, format!("invalid managed identity data: {e}")))?;
    payload.subject = Some(subject.to_string());
    payload
        .to_opaque()
        .map_err(|e| ApiError::remote(500, format!("failed to store managed identity data: {e}")))
}

#[async_trait]
impl ManagedIdentityApi for MemoryApi {
    async fn create_managed_identity(
        &self,
        input: &CreateManagedIdentityInput,
    ) -> Result<ManagedIdentityEntity, ApiError> {
        let mut state = self.state.lock().await;
        state.begin(Operation::CreateManagedIdentity)?;

        if input.name.is_empty() || input.group_path.is_empty() {
            return Err(ApiError::remote(400, "name and group path are required"));
        }
        let path = resource_path(&input.group_path, &input.name);
        if state.identities.values().any(|mi| mi.resource_path == path) {
            return Err(ApiError::remote(
                409,
                format!("managed identity {path} already exists"),
            ));
        }
        let data = stamp_subject(&input.data, &path)?;

        let now = OffsetDateTime::now_utc();
        let entity = ManagedIdentityEntity {
            id: Uuid::new_v4().to_string(),
            kind: input.kind,
            resource_path: path,
            name: input.name.clone(),
            group_path: input.group_path.clone(),
            description: input.description.clone(),
            data,
            access_rules: Vec::new(),
            metadata: ResourceMetadata::created(now),
        };
        for rule in &input.access_rules {
            state.insert_rule(&entity.id, rule.run_stage, &rule.fields, now);
        }
        state.identities.insert(entity.id.clone(), entity.clone());

        Ok(entity)
    }

    async fn get_managed_identity(&self, id: &str) -> Result<ManagedIdentityEntity, ApiError> {
        let mut state = self.state.lock().await;
        state.begin(Operation::GetManagedIdentity)?;

        let mut entity = state.identity(id)?.clone();
        entity.access_rules = state.rules_of(id);
        Ok(entity)
    }

    async fn update_managed_identity(
        &self,
        input: &UpdateManagedIdentityInput,
    ) -> Result<ManagedIdentityEntity, ApiError> {
        let mut state = self.state.lock().await;
        state.begin(Operation::UpdateManagedIdentity)?;

        let current = state.identity(&input.id)?.clone();
        let data = stamp_subject(&input.data, &current.resource_path)?;
        let updated = ManagedIdentityEntity {
            description: input.description.clone(),
            data,
            metadata: current.metadata.touched(OffsetDateTime::now_utc()),
            ..current
        };
        state.identities.insert(updated.id.clone(), updated.clone());

        let mut entity = updated;
        entity.access_rules = state.rules_of(&input.id);
        Ok(entity)
    }

    async fn delete_managed_identity(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.begin(Operation::DeleteManagedIdentity)?;

        if state.identities.remove(id).is_none() {
            return Err(ApiError::not_found(not_found_message(IDENTITY_KIND, id)));
        }
        state.rules.retain(|_, rule| rule.managed_identity_id != id);
        Ok(())
    }

    async fn get_managed_identity_access_rules(
        &self,
        managed_identity_id: &str,
    ) -> Result<Vec<AccessRuleEntity>, ApiError> {
        let mut state = self.state.lock().await;
        state.begin(Operation::GetManagedIdentityAccessRules)?;

        state.identity(managed_identity_id)?;
        Ok(state.rules_of(managed_identity_id))
    }

    async fn create_managed_identity_access_rule(
        &self,
        input: &CreateAccessRuleInput,
    ) -> Result<AccessRuleEntity, ApiError> {
        let mut state = self.state.lock().await;
        state.begin(Operation::CreateManagedIdentityAccessRule)?;

        state.identity(&input.managed_identity_id)?;
        let now = OffsetDateTime::now_utc();
        Ok(state.insert_rule(
            &input.managed_identity_id,
            input.run_stage,
            &input.fields,
            now,
        ))
    }

    async fn get_managed_identity_access_rule(
        &self,
        id: &str,
    ) -> Result<AccessRuleEntity, ApiError> {
        let mut state = self.state.lock().await;
        state.begin(Operation::GetManagedIdentityAccessRule)?;

        state
            .rules
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(not_found_message(RULE_KIND, id)))
    }

    async fn update_managed_identity_access_rule(
        &self,
        input: &UpdateAccessRuleInput,
    ) -> Result<AccessRuleEntity, ApiError> {
        let mut state = self.state.lock().await;
        state.begin(Operation::UpdateManagedIdentityAccessRule)?;

        let now = OffsetDateTime::now_utc();
        let rule = state
            .rules
            .get_mut(&input.id)
            .ok_or_else(|| ApiError::not_found(not_found_message(RULE_KIND, &input.id)))?;
        rule.run_stage = input.run_stage;
        rule.allowed_users = input.fields.allowed_users.clone();
        rule.allowed_service_accounts = input.fields.allowed_service_accounts.clone();
        rule.allowed_teams = input.fields.allowed_teams.clone();
        rule.metadata = rule.metadata.touched(now);
        Ok(rule.clone())
    }

    async fn delete_managed_identity_access_rule(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.begin(Operation::DeleteManagedIdentityAccessRule)?;

        state
            .rules
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(not_found_message(RULE_KIND, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InlineAccessRuleInput;
    use tharsis_core::{CredentialFields, ManagedIdentityType, RunStage, encode};

    fn create_input(name: &str) -> CreateManagedIdentityInput {
        CreateManagedIdentityInput {
            kind: ManagedIdentityType::AwsFederated,
            name: name.to_string(),
            description: "test".to_string(),
            group_path: "top/sub".to_string(),
            data: encode("aws_federated", &CredentialFields::aws("role")).unwrap(),
            access_rules: vec![InlineAccessRuleInput {
                run_stage: RunStage::Plan,
                fields: AccessRuleFields {
                    allowed_teams: vec!["ops".to_string()],
                    ..AccessRuleFields::default()
                },
            }],
        }
    }

    #[tokio::test]
    async fn test_create_omits_nested_rules_but_persists_them() {
        let api = MemoryApi::new();
        let created = api.create_managed_identity(&create_input("deployer")).await.unwrap();

        assert!(created.access_rules.is_empty());
        assert_eq!(created.resource_path, "top/sub/deployer");
        assert_eq!(
            decode(&created.data).unwrap().subject.as_deref(),
            Some("top/sub/deployer")
        );

        let rules = api.get_managed_identity_access_rules(&created.id).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].managed_identity_id, created.id);

        let fetched = api.get_managed_identity(&created.id).await.unwrap();
        assert_eq!(fetched.access_rules, rules);
    }

    #[tokio::test]
    async fn test_duplicate_path_conflicts() {
        let api = MemoryApi::new();
        api.create_managed_identity(&create_input("deployer")).await.unwrap();
        let err = api
            .create_managed_identity(&create_input("deployer"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Remote { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_reports_not_found() {
        let api = MemoryApi::new();
        let created = api.create_managed_identity(&create_input("deployer")).await.unwrap();
        assert_eq!(api.access_rule_count().await, 1);

        api.delete_managed_identity(&created.id).await.unwrap();
        assert_eq!(api.identity_count().await, 0);
        assert_eq!(api.access_rule_count().await, 0);

        let err = api.delete_managed_identity(&created.id).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            format!("Managed identity with ID {} not found", created.id)
        );
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let api = MemoryApi::new();
        api.fail_next(Operation::GetManagedIdentity, 503, "maintenance").await;

        let err = api.get_managed_identity("missing").await.unwrap_err();
        assert!(matches!(err, ApiError::Remote { status: 503, .. }));

        let err = api.get_managed_identity("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            api.calls().await,
            vec![Operation::GetManagedIdentity, Operation::GetManagedIdentity]
        );
    }

    #[tokio::test]
    async fn test_update_bumps_metadata() {
        let api = MemoryApi::new();
        let created = api.create_managed_identity(&create_input("deployer")).await.unwrap();
        let updated = api
            .update_managed_identity(&UpdateManagedIdentityInput {
                id: created.id.clone(),
                description: "changed".to_string(),
                data: encode("aws_federated", &CredentialFields::aws("other")).unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(updated.description, "changed");
        assert_eq!(updated.metadata.version, "2");
        assert!(updated.metadata.updated_at >= created.metadata.updated_at);
        assert_eq!(updated.access_rules.len(), 1);
    }
}
