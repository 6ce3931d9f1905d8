//! Wire types exchanged with the Tharsis API.
//!
//! These mirror the JSON bodies of the managed identity endpoints and stay
//! separate from the `tharsis-core` records. The reconciler decides how a
//! response is projected into actual state.

use serde::{Deserialize, Serialize};
use tharsis_core::{AccessRuleInput, ManagedIdentityType, RunStage};
use time::OffsetDateTime;

/// Server-maintained metadata attached to every resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    /// When the resource was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the resource was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Opaque version token. Read but never checked by this client.
    #[serde(default)]
    pub version: String,
}

impl ResourceMetadata {
    /// Creates metadata for a resource created at `now`.
    #[must_use]
    pub fn created(now: OffsetDateTime) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            version: "1".to_string(),
        }
    }

    /// Bumps the version and modification time.
    #[must_use]
    pub fn touched(&self, now: OffsetDateTime) -> Self {
        let version = self.version.parse::<u64>().map_or(1, |v| v + 1);
        Self {
            created_at: self.created_at,
            updated_at: now,
            version: version.to_string(),
        }
    }
}

/// A managed identity as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedIdentityEntity {
    /// Remote identifier.
    pub id: String,
    /// Identity type.
    #[serde(rename = "type")]
    pub kind: ManagedIdentityType,
    /// `groupPath/name`, computed by the server.
    pub resource_path: String,
    /// Identity name.
    pub name: String,
    /// Path of the owning group.
    pub group_path: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Opaque credential payload.
    pub data: String,
    /// Nested access rules. Not populated by the create endpoint.
    #[serde(default)]
    pub access_rules: Vec<AccessRuleEntity>,
    /// Server metadata.
    pub metadata: ResourceMetadata,
}

/// A managed identity access rule as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRuleEntity {
    /// Remote identifier.
    pub id: String,
    /// Stage the rule applies to.
    pub run_stage: RunStage,
    /// Owning managed identity.
    pub managed_identity_id: String,
    /// User emails.
    #[serde(default)]
    pub allowed_users: Vec<String>,
    /// Service account resource paths.
    #[serde(default)]
    pub allowed_service_accounts: Vec<String>,
    /// Team names.
    #[serde(default)]
    pub allowed_teams: Vec<String>,
    /// Server metadata.
    pub metadata: ResourceMetadata,
}

/// Access rule content submitted inline or on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRuleFields {
    pub allowed_users: Vec<String>,
    pub allowed_service_accounts: Vec<String>,
    pub allowed_teams: Vec<String>,
}

impl From<&AccessRuleInput> for AccessRuleFields {
    fn from(input: &AccessRuleInput) -> Self {
        Self {
            allowed_users: input.allowed_users.iter().cloned().collect(),
            allowed_service_accounts: input.allowed_service_accounts.iter().cloned().collect(),
            allowed_teams: input.allowed_teams.iter().cloned().collect(),
        }
    }
}

/// Inline access rule on managed identity create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineAccessRuleInput {
    pub run_stage: RunStage,
    #[serde(flatten)]
    pub fields: AccessRuleFields,
}

impl From<&AccessRuleInput> for InlineAccessRuleInput {
    fn from(input: &AccessRuleInput) -> Self {
        Self {
            run_stage: input.run_stage,
            fields: input.into(),
        }
    }
}

/// Body of `POST /v1/managed-identities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateManagedIdentityInput {
    #[serde(rename = "type")]
    pub kind: ManagedIdentityType,
    pub name: String,
    pub description: String,
    pub group_path: String,
    pub data: String,
    #[serde(default)]
    pub access_rules: Vec<InlineAccessRuleInput>,
}

/// Body of `PATCH /v1/managed-identities/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManagedIdentityInput {
    #[serde(skip)]
    pub id: String,
    pub description: String,
    pub data: String,
}

/// Body of `POST /v1/managed-identity-access-rules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessRuleInput {
    pub managed_identity_id: String,
    pub run_stage: RunStage,
    #[serde(flatten)]
    pub fields: AccessRuleFields,
}

/// Body of `PATCH /v1/managed-identity-access-rules/{id}`.
///
/// Every field is replaced; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccessRuleInput {
    #[serde(skip)]
    pub id: String,
    pub run_stage: RunStage,
    #[serde(flatten)]
    pub fields: AccessRuleFields,
}
