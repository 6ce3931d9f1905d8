use anyhow::Result;
use colored::Colorize;
use tharsis_client::ManagedIdentityApi;
use tharsis_core::ManagedIdentityInput;
use tharsis_reconcile::ManagedIdentityReconciler;

use super::read_json;
use crate::cli::OutputFormat;
use crate::output::{print_identity, print_success};

pub async fn get(api: &dyn ManagedIdentityApi, id: &str, format: OutputFormat) -> Result<()> {
    match ManagedIdentityReconciler::new(api).read(id).await? {
        Some(identity) => print_identity(&identity, format),
        None => anyhow::bail!("Managed identity {id} not found"),
    }
}

pub async fn create(
    api: &dyn ManagedIdentityApi,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let desired: ManagedIdentityInput = read_json(file)?;
    let identity = ManagedIdentityReconciler::new(api).create(&desired).await?;
    print_success(&format!(
        "Created managed identity {} ({})",
        identity.resource_path.cyan(),
        identity.id.cyan()
    ));
    print_identity(&identity, format)
}

pub async fn update(
    api: &dyn ManagedIdentityApi,
    id: &str,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let desired: ManagedIdentityInput = read_json(file)?;
    let identity = ManagedIdentityReconciler::new(api).update(id, &desired).await?;
    print_success(&format!("Updated managed identity {}", identity.resource_path.cyan()));
    print_identity(&identity, format)
}

pub async fn delete(api: &dyn ManagedIdentityApi, id: &str) -> Result<()> {
    ManagedIdentityReconciler::new(api).delete(id).await?;
    print_success(&format!("Deleted managed identity {}", id.cyan()));
    Ok(())
}
