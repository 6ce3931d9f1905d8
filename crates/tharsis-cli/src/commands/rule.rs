use anyhow::Result;
use colored::Colorize;
use tharsis_client::ManagedIdentityApi;
use tharsis_core::AccessRuleInput;
use tharsis_reconcile::AccessRuleReconciler;

use super::read_json;
use crate::cli::OutputFormat;
use crate::output::{print_rule, print_success};

pub async fn get(api: &dyn ManagedIdentityApi, id: &str, format: OutputFormat) -> Result<()> {
    match AccessRuleReconciler::new(api).read(id).await? {
        Some(rule) => print_rule(&rule, format),
        None => anyhow::bail!("Managed identity access rule {id} not found"),
    }
}

pub async fn create(
    api: &dyn ManagedIdentityApi,
    managed_identity_id: &str,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let desired: AccessRuleInput = read_json(file)?;
    let rule = AccessRuleReconciler::new(api)
        .create(managed_identity_id, &desired)
        .await?;
    print_success(&format!(
        "Created {} access rule {}",
        rule.run_stage,
        rule.id.cyan()
    ));
    print_rule(&rule, format)
}

pub async fn update(
    api: &dyn ManagedIdentityApi,
    managed_identity_id: &str,
    id: &str,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let desired: AccessRuleInput = read_json(file)?;
    let rule = AccessRuleReconciler::new(api)
        .update(managed_identity_id, id, &desired)
        .await?;
    print_success(&format!("Updated access rule {}", rule.id.cyan()));
    print_rule(&rule, format)
}

pub async fn delete(api: &dyn ManagedIdentityApi, id: &str) -> Result<()> {
    AccessRuleReconciler::new(api).delete(id).await?;
    print_success(&format!("Deleted access rule {}", id.cyan()));
    Ok(())
}
