pub mod error;
pub mod model;
pub mod payload;
pub mod types;

pub use error::{CoreError, ErrorCategory, Result};
pub use model::{AccessRule, AccessRuleInput, ManagedIdentity, ManagedIdentityInput, resource_path};
pub use payload::{CredentialFields, CredentialPayload, DecodedPayload, decode, encode};
pub use types::{ManagedIdentityType, RunStage};
