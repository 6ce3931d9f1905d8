use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tharsis_client::ManagedIdentityApi;
use tharsis_core::ManagedIdentityInput;
use tracing::warn;

use super::read_json;
use crate::cli::{ApplyArgs, DestroyArgs, OutputFormat};
use crate::output::{print_identity, print_success};
use crate::state;

pub async fn apply(
    api: &dyn ManagedIdentityApi,
    args: &ApplyArgs,
    format: OutputFormat,
) -> Result<()> {
    let desired: ManagedIdentityInput = read_json(&Some(args.file.clone()))?;
    let state_path = Path::new(&args.state);
    let prior = state::load_state(state_path)?;

    let outcome = match tharsis_reconcile::apply(api, &desired, prior.as_ref()).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(category = %err.category(), error = %err, "apply failed");
            if let Some(id) = err.created_id().map(str::to_string) {
                warn!(%id, state = %args.state, "managed identity exists remotely but was not recorded");
                return Err(err).with_context(|| {
                    format!("Managed identity {id} was created but not recorded; delete it before retrying")
                });
            }
            return Err(err.into());
        }
    };

    state::save_state(state_path, &outcome.identity)?;
    let summary = format!(
        "{} {} (rules: +{} ~{} -{})",
        outcome.action,
        outcome.identity.resource_path.cyan(),
        outcome.rules_created,
        outcome.rules_updated,
        outcome.rules_deleted
    );
    if outcome.changed() {
        print_success(&summary);
    } else {
        println!("No changes: {}", outcome.identity.resource_path.cyan());
    }
    print_identity(&outcome.identity, format)
}

pub async fn destroy(api: &dyn ManagedIdentityApi, args: &DestroyArgs) -> Result<()> {
    let state_path = Path::new(&args.state);
    let Some(prior) = state::load_state(state_path)? else {
        println!("Nothing to destroy: {} does not exist", args.state);
        return Ok(());
    };
    if let Err(err) = tharsis_reconcile::destroy(api, &prior).await {
        warn!(category = %err.category(), id = %prior.id, "destroy failed");
        return Err(err.into());
    }
    state::remove_state(state_path)?;
    print_success(&format!("Destroyed {}", prior.resource_path.cyan()));
    Ok(())
}
