//! # tharsis-client
//!
//! Remote call port for Tharsis managed identities and its implementations.
//!
//! The [`ManagedIdentityApi`] trait is the boundary the reconcilers talk to.
//! Two implementations ship with this crate:
//! - [`HttpClient`], a JSON/REST client built on `reqwest`
//! - [`MemoryApi`], an in-process stand-in used by tests
//!
//! ## Example
//!
//! ```ignore
//! use tharsis_client::{HttpClient, ManagedIdentityApi};
//!
//! let client = HttpClient::new("https://tharsis.example.com", Some(token))?;
//! let identity = client.get_managed_identity("mi-123").await?;
//! ```

mod error;
pub mod http;
pub mod memory;
pub mod not_found;
mod traits;
mod types;

pub use error::{ApiError, ErrorCategory};
pub use http::{DEFAULT_TIMEOUT, HttpClient};
pub use memory::{MemoryApi, Operation};
pub use traits::ManagedIdentityApi;
pub use types::{
    AccessRuleEntity, AccessRuleFields, CreateAccessRuleInput, CreateManagedIdentityInput,
    InlineAccessRuleInput, ManagedIdentityEntity, ResourceMetadata, UpdateAccessRuleInput,
    UpdateManagedIdentityInput,
};
