use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Managed identity type. Immutable once the identity exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ManagedIdentityType {
    AwsFederated,
    AzureFederated,
    TharsisFederated,
}

impl ManagedIdentityType {
    pub const ALL: [ManagedIdentityType; 3] = [
        ManagedIdentityType::AwsFederated,
        ManagedIdentityType::AzureFederated,
        ManagedIdentityType::TharsisFederated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ManagedIdentityType::AwsFederated => "aws_federated",
            ManagedIdentityType::AzureFederated => "azure_federated",
            ManagedIdentityType::TharsisFederated => "tharsis_federated",
        }
    }
}

impl fmt::Display for ManagedIdentityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManagedIdentityType {
    type Err = CoreError;

    /// Accepts both `aws_federated` and `aws-federated`, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "aws_federated" => Ok(ManagedIdentityType::AwsFederated),
            "azure_federated" => Ok(ManagedIdentityType::AzureFederated),
            "tharsis_federated" => Ok(ManagedIdentityType::TharsisFederated),
            _ => Err(CoreError::unsupported_type(s)),
        }
    }
}

impl TryFrom<String> for ManagedIdentityType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Job stage an access rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStage {
    Plan,
    Apply,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Plan => "plan",
            RunStage::Apply => "apply",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plan" => Ok(RunStage::Plan),
            "apply" => Ok(RunStage::Apply),
            _ => Err(CoreError::invalid_run_stage(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_type_parses_both_spellings() {
        assert_eq!(
            "aws-federated".parse::<ManagedIdentityType>().unwrap(),
            ManagedIdentityType::AwsFederated
        );
        assert_eq!(
            "AZURE_FEDERATED".parse::<ManagedIdentityType>().unwrap(),
            ManagedIdentityType::AzureFederated
        );
        assert_eq!(
            "tharsis_federated".parse::<ManagedIdentityType>().unwrap(),
            ManagedIdentityType::TharsisFederated
        );
    }

    #[test]
    fn test_identity_type_rejects_unknown() {
        let err = "gcp-federated".parse::<ManagedIdentityType>().unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedType(ref t) if t == "gcp-federated"));
    }

    #[test]
    fn test_identity_type_serde() {
        for kind in ManagedIdentityType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: ManagedIdentityType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
        let hyphenated: ManagedIdentityType = serde_json::from_str("\"aws-federated\"").unwrap();
        assert_eq!(hyphenated, ManagedIdentityType::AwsFederated);
        assert!(serde_json::from_str::<ManagedIdentityType>("\"kerberos\"").is_err());
    }

    #[test]
    fn test_run_stage() {
        assert_eq!("plan".parse::<RunStage>().unwrap(), RunStage::Plan);
        assert_eq!("Apply".parse::<RunStage>().unwrap(), RunStage::Apply);
        assert!("destroy".parse::<RunStage>().is_err());
        assert_eq!(serde_json::to_string(&RunStage::Apply).unwrap(), "\"apply\"");
    }
}
