//! Desired-state inputs and actual-state records for managed identities.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::payload::CredentialFields;
use crate::types::{ManagedIdentityType, RunStage};

/// Resource path of a managed identity inside its group.
pub fn resource_path(group_path: &str, name: &str) -> String {
    format!("{group_path}/{name}")
}

/// Desired access rule. Set members are unordered; two rules with the same
/// stage and the same members are the same rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRuleInput {
    pub run_stage: RunStage,
    #[serde(default)]
    pub allowed_users: BTreeSet<String>,
    #[serde(default)]
    pub allowed_service_accounts: BTreeSet<String>,
    #[serde(default)]
    pub allowed_teams: BTreeSet<String>,
}

impl AccessRuleInput {
    pub fn new(run_stage: RunStage) -> Self {
        Self {
            run_stage,
            allowed_users: BTreeSet::new(),
            allowed_service_accounts: BTreeSet::new(),
            allowed_teams: BTreeSet::new(),
        }
    }

    pub fn with_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_users = users.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_service_accounts<I, S>(mut self, service_accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_service_accounts = service_accounts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_teams = teams.into_iter().map(Into::into).collect();
        self
    }
}

/// Access rule as confirmed by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    pub id: String,
    pub run_stage: RunStage,
    pub managed_identity_id: String,
    #[serde(default)]
    pub allowed_users: BTreeSet<String>,
    #[serde(default)]
    pub allowed_service_accounts: BTreeSet<String>,
    #[serde(default)]
    pub allowed_teams: BTreeSet<String>,
}

impl AccessRule {
    /// The rule's content without its identifiers.
    pub fn to_input(&self) -> AccessRuleInput {
        AccessRuleInput {
            run_stage: self.run_stage,
            allowed_users: self.allowed_users.clone(),
            allowed_service_accounts: self.allowed_service_accounts.clone(),
            allowed_teams: self.allowed_teams.clone(),
        }
    }

    pub fn matches(&self, desired: &AccessRuleInput) -> bool {
        self.run_stage == desired.run_stage
            && self.allowed_users == desired.allowed_users
            && self.allowed_service_accounts == desired.allowed_service_accounts
            && self.allowed_teams == desired.allowed_teams
    }
}

/// Desired managed identity, as supplied by the caller.
///
/// No `resource_path` here: the path is only ever
/// taken from the remote response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedIdentityInput {
    #[serde(rename = "type")]
    pub kind: ManagedIdentityType,
    pub name: String,
    pub group_path: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub credentials: CredentialFields,
    #[serde(default)]
    pub access_rules: Vec<AccessRuleInput>,
}

/// Actual-state record of a managed identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedIdentity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ManagedIdentityType,
    pub resource_path: String,
    pub name: String,
    pub group_path: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub access_rules: Vec<AccessRule>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

impl ManagedIdentity {
    /// Credential fields in their desired-state shape, absent mapped to empty.
    pub fn credential_fields(&self) -> CredentialFields {
        CredentialFields {
            role: self.role.clone().unwrap_or_default(),
            client_id: self.client_id.clone().unwrap_or_default(),
            tenant_id: self.tenant_id.clone().unwrap_or_default(),
            service_account_path: self.service_account_path.clone().unwrap_or_default(),
        }
    }

    pub fn access_rule(&self, id: &str) -> Option<&AccessRule> {
        self.access_rules.iter().find(|rule| rule.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_path() {
        assert_eq!(resource_path("top/sub", "deployer"), "top/sub/deployer");
    }

    #[test]
    fn test_access_rule_input_is_order_independent() {
        let a = AccessRuleInput::new(RunStage::Plan).with_users(["b@example.com", "a@example.com"]);
        let b = AccessRuleInput::new(RunStage::Plan).with_users(["a@example.com", "b@example.com"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_input_from_json() {
        let input: ManagedIdentityInput = serde_json::from_value(json!({
            "type": "azure-federated",
            "name": "deployer",
            "groupPath": "top/sub",
            "clientId": "c",
            "tenantId": "t",
            "accessRules": [
                {"runStage": "plan", "allowedTeams": ["ops"]}
            ]
        }))
        .unwrap();

        assert_eq!(input.kind, ManagedIdentityType::AzureFederated);
        assert_eq!(input.description, "");
        assert_eq!(input.credentials, CredentialFields::azure("c", "t"));
        assert_eq!(input.access_rules.len(), 1);
        assert!(input.access_rules[0].allowed_users.is_empty());
        assert!(input.access_rules[0].allowed_teams.contains("ops"));
    }

    #[test]
    fn test_identity_record_round_trips_through_state_json() {
        let identity = ManagedIdentity {
            id: "mi-1".to_string(),
            kind: ManagedIdentityType::AwsFederated,
            resource_path: "g/n".to_string(),
            name: "n".to_string(),
            group_path: "g".to_string(),
            description: String::new(),
            role: Some("r".to_string()),
            client_id: None,
            tenant_id: None,
            service_account_path: None,
            subject: Some("g/n".to_string()),
            access_rules: vec![AccessRule {
                id: "rule-1".to_string(),
                run_stage: RunStage::Apply,
                managed_identity_id: "mi-1".to_string(),
                allowed_users: BTreeSet::new(),
                allowed_service_accounts: ["g/sa".to_string()].into(),
                allowed_teams: BTreeSet::new(),
            }],
            last_updated: time::macros::datetime!(2024-05-01 10:00 UTC),
        };

        let value = serde_json::to_value(&identity).unwrap();
        assert_eq!(value["type"], "aws_federated");
        assert_eq!(value["lastUpdated"], "2024-05-01T10:00:00Z");
        assert!(value.get("clientId").is_none());

        let back: ManagedIdentity = serde_json::from_value(value).unwrap();
        assert_eq!(back, identity);
        assert_eq!(back.credential_fields(), CredentialFields::aws("r"));
        assert!(back.access_rule("rule-1").is_some());
    }
}
