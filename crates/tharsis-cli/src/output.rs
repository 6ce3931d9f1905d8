use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tharsis_core::{AccessRule, ManagedIdentity};

use crate::cli::OutputFormat;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_identity(identity: &ManagedIdentity, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(identity),
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            builder.push_record(["id", identity.id.as_str()]);
            builder.push_record(["type", identity.kind.as_str()]);
            builder.push_record(["resourcePath", identity.resource_path.as_str()]);
            builder.push_record(["description", identity.description.as_str()]);
            for (field, value) in [
                ("role", &identity.role),
                ("clientId", &identity.client_id),
                ("tenantId", &identity.tenant_id),
                ("serviceAccountPath", &identity.service_account_path),
                ("subject", &identity.subject),
            ] {
                if let Some(value) = value {
                    builder.push_record([field, value.as_str()]);
                }
            }
            let updated = identity.last_updated.to_string();
            builder.push_record(["lastUpdated", updated.as_str()]);
            println!("{}", builder.build().with(Style::rounded()));

            if identity.access_rules.is_empty() {
                println!("No access rules.");
            } else {
                print_rules_table(&identity.access_rules);
            }
            Ok(())
        }
    }
}

pub fn print_rule(rule: &AccessRule, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(rule),
        OutputFormat::Table => {
            print_rules_table(std::slice::from_ref(rule));
            Ok(())
        }
    }
}

fn print_rules_table(rules: &[AccessRule]) {
    let mut builder = Builder::default();
    builder.push_record(["ID", "RunStage", "Users", "ServiceAccounts", "Teams"]);
    for rule in rules {
        builder.push_record([
            rule.id.clone(),
            rule.run_stage.to_string(),
            join(&rule.allowed_users),
            join(&rule.allowed_service_accounts),
            join(&rule.allowed_teams),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

fn join<'a>(members: impl IntoIterator<Item = &'a String>) -> String {
    let joined: Vec<&str> = members.into_iter().map(String::as_str).collect();
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined.join(", ")
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}
