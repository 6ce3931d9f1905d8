//! The remote call port consumed by the reconcilers.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{
    AccessRuleEntity, CreateAccessRuleInput, CreateManagedIdentityInput, ManagedIdentityEntity,
    UpdateAccessRuleInput, UpdateManagedIdentityInput,
};

/// Authenticated request/response calls against the managed identity API.
///
/// Every method is one round trip. Implementations own timeouts and any
/// retry policy; callers treat each call as returning within bounded time.
/// Missing resources must be reported so that [`ApiError::is_not_found`]
/// returns `true`.
#[async_trait]
pub trait ManagedIdentityApi: Send + Sync {
    // ==================== Managed identities ====================

    /// Creates a managed identity. The returned entity's `access_rules` are
    /// not reliable, even though inline rules are persisted.
    async fn create_managed_identity(
        &self,
        input: &CreateManagedIdentityInput,
    ) -> Result<ManagedIdentityEntity, ApiError>;

    /// Fetches a managed identity, including its access rules.
    async fn get_managed_identity(&self, id: &str) -> Result<ManagedIdentityEntity, ApiError>;

    /// Replaces the description and credential payload.
    async fn update_managed_identity(
        &self,
        input: &UpdateManagedIdentityInput,
    ) -> Result<ManagedIdentityEntity, ApiError>;

    /// Deletes a managed identity and, server side, all of its access rules.
    async fn delete_managed_identity(&self, id: &str) -> Result<(), ApiError>;

    // ==================== Access rules ====================

    /// Lists the access rules of a managed identity.
    async fn get_managed_identity_access_rules(
        &self,
        managed_identity_id: &str,
    ) -> Result<Vec<AccessRuleEntity>, ApiError>;

    async fn create_managed_identity_access_rule(
        &self,
        input: &CreateAccessRuleInput,
    ) -> Result<AccessRuleEntity, ApiError>;

    async fn get_managed_identity_access_rule(&self, id: &str)
    -> Result<AccessRuleEntity, ApiError>;

    /// Replaces the run stage and all three member sets.
    async fn update_managed_identity_access_rule(
        &self,
        input: &UpdateAccessRuleInput,
    ) -> Result<AccessRuleEntity, ApiError>;

    async fn delete_managed_identity_access_rule(&self, id: &str) -> Result<(), ApiError>;
}
