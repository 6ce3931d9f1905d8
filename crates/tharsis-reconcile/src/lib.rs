//! Reconciliation of Tharsis managed identities and their access rules.
//!
//! [`ManagedIdentityReconciler`] and [`AccessRuleReconciler`] implement the
//! CRUD and read-back state machine against a
//! [`ManagedIdentityApi`](tharsis_client::ManagedIdentityApi), producing
//! actual-state records. [`diff`] computes drift between desired and actual
//! state, and [`apply()`] combines both to bring one identity in line.
//!
//! A read that finds nothing returns `Ok(None)`: the caller should drop its
//! local record. Deleting something that is already gone succeeds.

pub mod access_rule;
pub mod apply;
pub mod diff;
pub mod error;
pub mod managed_identity;
mod projection;

pub use access_rule::AccessRuleReconciler;
pub use apply::{ApplyAction, ApplyOutcome, apply, destroy};
pub use diff::{AccessRulePlan, IdentityPlan, plan_access_rules, plan_identity};
pub use error::{ErrorCategory, ReconcileError, Result};
pub use managed_identity::ManagedIdentityReconciler;
