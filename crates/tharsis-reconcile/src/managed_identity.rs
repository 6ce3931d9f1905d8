//! Reconciler for managed identities.
//!
//! The create endpoint persists inline access rules but does not echo them
//! back, so every create is followed by a rules fetch for the new id. The
//! two steps are strictly sequential; if the second one fails the identity
//! exists remotely and [`ReconcileError::CreatedWithoutAccessRules`] is
//! returned. No compensating delete is issued.

use tharsis_client::{
    CreateManagedIdentityInput, InlineAccessRuleInput, ManagedIdentityApi, UpdateManagedIdentityInput,
};
use tharsis_core::{CredentialPayload, ManagedIdentity, ManagedIdentityInput};
use tracing::{debug, info, instrument, warn};

use crate::access_rule::AccessRuleReconciler;
use crate::error::{ReconcileError, Result};
use crate::projection::project_identity;

const CREATE: &str = "creating managed identity";
const READ: &str = "reading managed identity";
const UPDATE: &str = "updating managed identity";
const DELETE: &str = "deleting managed identity";

/// CRUD and read-back for managed identities.
#[derive(Clone, Copy)]
pub struct ManagedIdentityReconciler<'a> {
    api: &'a dyn ManagedIdentityApi,
}

impl<'a> ManagedIdentityReconciler<'a> {
    pub fn new(api: &'a dyn ManagedIdentityApi) -> Self {
        Self { api }
    }

    /// Reconciler for the child access rules, sharing the same port.
    pub fn access_rules(&self) -> AccessRuleReconciler<'a> {
        AccessRuleReconciler::new(self.api)
    }

    #[instrument(skip(self, desired), fields(kind = %desired.kind, name = %desired.name, group_path = %desired.group_path))]
    pub async fn create(&self, desired: &ManagedIdentityInput) -> Result<ManagedIdentity> {
        let data = encode_credentials(desired)?;
        let input = CreateManagedIdentityInput {
            kind: desired.kind,
            name: desired.name.clone(),
            description: desired.description.clone(),
            group_path: desired.group_path.clone(),
            data,
            access_rules: desired.access_rules.iter().map(InlineAccessRuleInput::from).collect(),
        };

        let entity = self
            .api
            .create_managed_identity(&input)
            .await
            .map_err(|e| ReconcileError::remote(CREATE, e))?;
        info!(id = %entity.id, resource_path = %entity.resource_path, "created managed identity");

        // The nested rules in the create response are never trusted.
        let rules = match self.api.get_managed_identity_access_rules(&entity.id).await {
            Ok(rules) => rules,
            Err(source) => {
                warn!(
                    id = %entity.id,
                    error = %source,
                    category = %source.category(),
                    "managed identity created but access rules could not be fetched"
                );
                return Err(ReconcileError::CreatedWithoutAccessRules {
                    id: entity.id,
                    source,
                });
            }
        };
        debug!(id = %entity.id, count = rules.len(), "fetched access rules after create");

        project_identity(entity, rules)
    }

    /// Returns `None` when the identity no longer exists remotely.
    #[instrument(skip(self))]
    pub async fn read(&self, id: &str) -> Result<Option<ManagedIdentity>> {
        match self.api.get_managed_identity(id).await {
            Ok(mut entity) => {
                let rules = std::mem::take(&mut entity.access_rules);
                project_identity(entity, rules).map(Some)
            }
            Err(e) if e.is_not_found() => {
                warn!(id, "managed identity not found, removing from state");
                Ok(None)
            }
            Err(e) => Err(ReconcileError::remote(READ, e)),
        }
    }

    /// Pushes description and credentials. `type`, `name` and `group_path`
    /// cannot change after create and are not sent; access rules are
    /// reconciled separately through [`access_rules`](Self::access_rules).
    #[instrument(skip(self, desired), fields(kind = %desired.kind))]
    pub async fn update(&self, id: &str, desired: &ManagedIdentityInput) -> Result<ManagedIdentity> {
        let data = encode_credentials(desired)?;
        let input = UpdateManagedIdentityInput {
            id: id.to_string(),
            description: desired.description.clone(),
            data,
        };

        let mut entity = self
            .api
            .update_managed_identity(&input)
            .await
            .map_err(|e| ReconcileError::remote(UPDATE, e))?;
        info!(id, "updated managed identity");

        let rules = std::mem::take(&mut entity.access_rules);
        project_identity(entity, rules)
    }

    /// Access rules are removed by the server. Deleting an identity that is
    /// already gone succeeds.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        match self.api.delete_managed_identity(id).await {
            Ok(()) => {
                info!(id, "deleted managed identity");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(id, "managed identity already deleted");
                Ok(())
            }
            Err(e) => Err(ReconcileError::remote(DELETE, e)),
        }
    }
}

pub(crate) fn encode_credentials(desired: &ManagedIdentityInput) -> Result<String> {
    CredentialPayload::from_fields(desired.kind, &desired.credentials)
        .and_then(|payload| payload.encode())
        .map_err(ReconcileError::credentials)
}
