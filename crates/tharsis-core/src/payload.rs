//! Managed identity credential payload codec.
//!
//! The remote service persists every type-specific credential field in one
//! opaque `data` string: `base64(JSON({role?, clientId?, tenantId?,
//! serviceAccountPath?, subject?}))`. Empty fields are omitted from the JSON
//! object entirely, so the encoded shape differs per identity type. Already
//! persisted payloads depend on this exact omission behavior.
//!
//! Inside this crate the validated credentials are a tagged enum,
//! [`CredentialPayload`]; only this module knows the flattened transport form.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::ManagedIdentityType;

/// Candidate credential values from desired state. Empty string means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialFields {
    pub role: String,
    pub client_id: String,
    pub tenant_id: String,
    pub service_account_path: String,
}

impl CredentialFields {
    pub fn aws(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Self::default()
        }
    }

    pub fn azure(client_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            tenant_id: tenant_id.into(),
            ..Self::default()
        }
    }

    pub fn tharsis(service_account_path: impl Into<String>) -> Self {
        Self {
            service_account_path: service_account_path.into(),
            ..Self::default()
        }
    }
}

/// Validated credentials, one variant per managed identity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialPayload {
    Aws { role: String },
    Azure { client_id: String, tenant_id: String },
    Tharsis { service_account_path: String },
}

impl CredentialPayload {
    /// Checks the type-conditional field contract and builds the variant.
    pub fn from_fields(kind: ManagedIdentityType, fields: &CredentialFields) -> Result<Self> {
        match kind {
            ManagedIdentityType::AwsFederated => {
                require(kind, "role", &fields.role)?;
                forbid(kind, "client_id", &fields.client_id)?;
                forbid(kind, "tenant_id", &fields.tenant_id)?;
                forbid(kind, "service_account_path", &fields.service_account_path)?;
                Ok(Self::Aws {
                    role: fields.role.clone(),
                })
            }
            ManagedIdentityType::AzureFederated => {
                require(kind, "client_id", &fields.client_id)?;
                require(kind, "tenant_id", &fields.tenant_id)?;
                forbid(kind, "role", &fields.role)?;
                forbid(kind, "service_account_path", &fields.service_account_path)?;
                Ok(Self::Azure {
                    client_id: fields.client_id.clone(),
                    tenant_id: fields.tenant_id.clone(),
                })
            }
            ManagedIdentityType::TharsisFederated => {
                require(kind, "service_account_path", &fields.service_account_path)?;
                forbid(kind, "role", &fields.role)?;
                forbid(kind, "client_id", &fields.client_id)?;
                forbid(kind, "tenant_id", &fields.tenant_id)?;
                Ok(Self::Tharsis {
                    service_account_path: fields.service_account_path.clone(),
                })
            }
        }
    }

    pub fn kind(&self) -> ManagedIdentityType {
        match self {
            Self::Aws { .. } => ManagedIdentityType::AwsFederated,
            Self::Azure { .. } => ManagedIdentityType::AzureFederated,
            Self::Tharsis { .. } => ManagedIdentityType::TharsisFederated,
        }
    }

    /// Flattens into the opaque transport string.
    pub fn encode(&self) -> Result<String> {
        let decoded = match self {
            Self::Aws { role } => DecodedPayload {
                role: Some(role.clone()),
                ..DecodedPayload::default()
            },
            Self::Azure {
                client_id,
                tenant_id,
            } => DecodedPayload {
                client_id: Some(client_id.clone()),
                tenant_id: Some(tenant_id.clone()),
                ..DecodedPayload::default()
            },
            Self::Tharsis {
                service_account_path,
            } => DecodedPayload {
                service_account_path: Some(service_account_path.clone()),
                ..DecodedPayload::default()
            },
        };
        decoded.to_opaque()
    }
}

fn require(kind: ManagedIdentityType, field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CoreError::validation(
            field,
            format!("{field} is required for {kind} managed identities"),
        ));
    }
    Ok(())
}

fn forbid(kind: ManagedIdentityType, field: &'static str, value: &str) -> Result<()> {
    if !value.is_empty() {
        return Err(CoreError::validation(
            field,
            format!("{field} must be empty for {kind} managed identities"),
        ));
    }
    Ok(())
}

/// Field set recovered from an opaque payload.
///
/// `None` means the key was not present in the payload; `Some("")` means it
/// was present but empty. `subject` is assigned by the server and is never
/// part of the desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedPayload {
    #[serde(default, skip_serializing_if = "is_absent")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "is_absent")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "is_absent")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "is_absent")]
    pub service_account_path: Option<String>,
    #[serde(default, skip_serializing_if = "is_absent")]
    pub subject: Option<String>,
}

// Empty values are never emitted, matching payloads already stored remotely.
fn is_absent(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

impl DecodedPayload {
    /// Serializes the populated fields back into the opaque transport string.
    pub fn to_opaque(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }
}

/// Validates `fields` against `kind` and produces the opaque payload string.
pub fn encode(kind: &str, fields: &CredentialFields) -> Result<String> {
    let kind: ManagedIdentityType = kind.parse()?;
    CredentialPayload::from_fields(kind, fields)?.encode()
}

/// Reverses [`encode`]. Fails if either the base64 or the JSON layer is malformed.
pub fn decode(opaque: &str) -> Result<DecodedPayload> {
    let bytes = STANDARD
        .decode(opaque.trim())
        .map_err(|e| CoreError::decode(format!("invalid base64: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| CoreError::decode(format!("invalid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_json(opaque: &str) -> String {
        String::from_utf8(STANDARD.decode(opaque).unwrap()).unwrap()
    }

    #[test]
    fn test_aws_round_trip() {
        let opaque = encode("aws-federated", &CredentialFields::aws("some-iam-role")).unwrap();
        let decoded = decode(&opaque).unwrap();
        assert_eq!(
            decoded,
            DecodedPayload {
                role: Some("some-iam-role".to_string()),
                client_id: None,
                tenant_id: None,
                service_account_path: None,
                subject: None,
            }
        );
    }

    #[test]
    fn test_azure_round_trip() {
        let opaque = encode("azure_federated", &CredentialFields::azure("client", "tenant")).unwrap();
        let decoded = decode(&opaque).unwrap();
        assert_eq!(decoded.client_id.as_deref(), Some("client"));
        assert_eq!(decoded.tenant_id.as_deref(), Some("tenant"));
        assert_eq!(decoded.role, None);
        assert_eq!(decoded.service_account_path, None);
        assert_eq!(decoded.subject, None);
    }

    #[test]
    fn test_tharsis_round_trip() {
        let opaque = encode(
            "tharsis_federated",
            &CredentialFields::tharsis("top/group/sa-1"),
        )
        .unwrap();
        let decoded = decode(&opaque).unwrap();
        assert_eq!(decoded.service_account_path.as_deref(), Some("top/group/sa-1"));
        assert_eq!(decoded.role, None);
    }

    #[test]
    fn test_wire_format_omits_empty_fields() {
        let opaque = encode("aws_federated", &CredentialFields::aws("arn:aws:iam::1:role/x")).unwrap();
        assert_eq!(raw_json(&opaque), r#"{"role":"arn:aws:iam::1:role/x"}"#);

        let opaque = encode("azure_federated", &CredentialFields::azure("c", "t")).unwrap();
        assert_eq!(raw_json(&opaque), r#"{"clientId":"c","tenantId":"t"}"#);
        assert_eq!(opaque, "eyJjbGllbnRJZCI6ImMiLCJ0ZW5hbnRJZCI6InQifQ==");
    }

    #[test]
    fn test_aws_rejects_missing_role() {
        let fields = CredentialFields {
            client_id: "x".to_string(),
            ..CredentialFields::default()
        };
        let err = encode("aws-federated", &fields).unwrap_err();
        assert_eq!(err.field(), Some("role"));
        assert!(err.to_string().contains("role is required"));
    }

    #[test]
    fn test_aws_rejects_azure_fields() {
        let mut fields = CredentialFields::aws("r");
        fields.tenant_id = "t".to_string();
        let err = encode("aws_federated", &fields).unwrap_err();
        assert_eq!(err.field(), Some("tenant_id"));

        let mut fields = CredentialFields::aws("r");
        fields.client_id = "c".to_string();
        let err = encode("aws_federated", &fields).unwrap_err();
        assert_eq!(err.field(), Some("client_id"));
    }

    #[test]
    fn test_azure_rejects_role_and_requires_both_ids() {
        let mut fields = CredentialFields::azure("c", "t");
        fields.role = "r".to_string();
        let err = encode("azure_federated", &fields).unwrap_err();
        assert_eq!(err.field(), Some("role"));

        let err = encode("azure_federated", &CredentialFields::azure("c", "")).unwrap_err();
        assert_eq!(err.field(), Some("tenant_id"));

        let err = encode("azure_federated", &CredentialFields::azure("", "t")).unwrap_err();
        assert_eq!(err.field(), Some("client_id"));
    }

    #[test]
    fn test_tharsis_rejects_foreign_fields() {
        let mut fields = CredentialFields::tharsis("g/sa");
        fields.role = "r".to_string();
        assert_eq!(
            encode("tharsis_federated", &fields).unwrap_err().field(),
            Some("role")
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = encode("gcp_federated", &CredentialFields::aws("r")).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedType(ref t) if t == "gcp_federated"));
    }

    #[test]
    fn test_decode_distinguishes_absent_from_empty() {
        let opaque = STANDARD.encode(r#"{"role":"","subject":"g/n"}"#);
        let decoded = decode(&opaque).unwrap();
        assert_eq!(decoded.role.as_deref(), Some(""));
        assert_eq!(decoded.client_id, None);
        assert_eq!(decoded.subject.as_deref(), Some("g/n"));
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        let err = decode("not base64!!").unwrap_err();
        assert!(matches!(err, CoreError::Decode(ref m) if m.starts_with("invalid base64")));

        let err = decode(&STANDARD.encode("{not json")).unwrap_err();
        assert!(matches!(err, CoreError::Decode(ref m) if m.starts_with("invalid JSON")));
    }

    #[test]
    fn test_reencode_keeps_subject() {
        let opaque = encode("aws_federated", &CredentialFields::aws("r")).unwrap();
        let mut decoded = decode(&opaque).unwrap();
        decoded.subject = Some("group/identity".to_string());
        let stored = decoded.to_opaque().unwrap();
        assert_eq!(raw_json(&stored), r#"{"role":"r","subject":"group/identity"}"#);
    }

    #[test]
    fn test_payload_kind() {
        let payload =
            CredentialPayload::from_fields(ManagedIdentityType::AzureFederated, &CredentialFields::azure("c", "t"))
                .unwrap();
        assert_eq!(payload.kind(), ManagedIdentityType::AzureFederated);
    }
}
