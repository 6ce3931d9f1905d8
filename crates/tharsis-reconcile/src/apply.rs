//! Drives one managed identity, rules included, to its desired state.

use std::fmt;

use tharsis_client::ManagedIdentityApi;
use tharsis_core::{ManagedIdentity, ManagedIdentityInput};
use tracing::{info, instrument};

use crate::diff::{IdentityPlan, plan_access_rules, plan_identity};
use crate::error::Result;
use crate::managed_identity::{ManagedIdentityReconciler, encode_credentials};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    /// No prior state existed.
    Created,
    /// Prior state existed but the identity was gone remotely.
    Recreated,
    /// An immutable field changed.
    Replaced,
    Updated,
    Unchanged,
}

impl fmt::Display for ApplyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Recreated => write!(f, "recreated"),
            Self::Replaced => write!(f, "replaced"),
            Self::Updated => write!(f, "updated"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub identity: ManagedIdentity,
    pub action: ApplyAction,
    pub rules_created: usize,
    pub rules_updated: usize,
    pub rules_deleted: usize,
}

impl ApplyOutcome {
    fn created(identity: ManagedIdentity, action: ApplyAction) -> Self {
        let rules_created = identity.access_rules.len();
        Self {
            identity,
            action,
            rules_created,
            rules_updated: 0,
            rules_deleted: 0,
        }
    }

    pub fn changed(&self) -> bool {
        self.action != ApplyAction::Unchanged
            || self.rules_created + self.rules_updated + self.rules_deleted > 0
    }
}

/// Reconciles `desired` against the remote, starting from `prior` state.
///
/// Calls are issued one at a time: identity first, then access rule
/// deletes, updates and creates.
#[instrument(skip_all, fields(name = %desired.name, group_path = %desired.group_path))]
pub async fn apply(
    api: &dyn ManagedIdentityApi,
    desired: &ManagedIdentityInput,
    prior: Option<&ManagedIdentity>,
) -> Result<ApplyOutcome> {
    // Nothing is touched remotely until the desired credentials encode.
    encode_credentials(desired)?;
    let identities = ManagedIdentityReconciler::new(api);

    let current = match prior {
        Some(prior) => match identities.read(&prior.id).await? {
            Some(current) => current,
            None => {
                let created = identities.create(desired).await?;
                return Ok(ApplyOutcome::created(created, ApplyAction::Recreated));
            }
        },
        None => {
            let created = identities.create(desired).await?;
            return Ok(ApplyOutcome::created(created, ApplyAction::Created));
        }
    };

    let (mut identity, action) = match plan_identity(desired, &current) {
        IdentityPlan::Replace { fields } => {
            info!(id = %current.id, ?fields, "replacing managed identity");
            identities.delete(&current.id).await?;
            let created = identities.create(desired).await?;
            return Ok(ApplyOutcome::created(created, ApplyAction::Replaced));
        }
        IdentityPlan::Update { .. } => (
            identities.update(&current.id, desired).await?,
            ApplyAction::Updated,
        ),
        IdentityPlan::NoOp => (current, ApplyAction::Unchanged),
    };

    let plan = plan_access_rules(&desired.access_rules, &identity.access_rules);
    let rules = identities.access_rules();
    let (mut created, mut updated, mut deleted) = (0, 0, 0);

    for id in &plan.delete {
        rules.delete(id).await?;
        identity.access_rules.retain(|r| &r.id != id);
        deleted += 1;
    }
    for (id, wanted) in &plan.update {
        let rule = rules.update(&identity.id, id, wanted).await?;
        if let Some(slot) = identity.access_rules.iter_mut().find(|r| &r.id == id) {
            *slot = rule;
        }
        updated += 1;
    }
    for wanted in &plan.create {
        let rule = rules.create(&identity.id, wanted).await?;
        identity.access_rules.push(rule);
        created += 1;
    }
    identity.access_rules.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(ApplyOutcome {
        identity,
        action,
        rules_created: created,
        rules_updated: updated,
        rules_deleted: deleted,
    })
}

/// Deletes the identity recorded in `prior`. Succeeds if it is already gone.
pub async fn destroy(api: &dyn ManagedIdentityApi, prior: &ManagedIdentity) -> Result<()> {
    ManagedIdentityReconciler::new(api).delete(&prior.id).await
}
