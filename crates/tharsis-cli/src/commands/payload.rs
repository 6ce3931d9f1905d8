use anyhow::Result;
use tharsis_core::CredentialFields;

use crate::cli::EncodeArgs;
use crate::output::print_json;

pub fn encode(args: &EncodeArgs) -> Result<()> {
    let fields = CredentialFields {
        role: args.role.clone(),
        client_id: args.client_id.clone(),
        tenant_id: args.tenant_id.clone(),
        service_account_path: args.service_account_path.clone(),
    };
    println!("{}", tharsis_core::encode(&args.kind, &fields)?);
    Ok(())
}

pub fn decode(payload: &str) -> Result<()> {
    let decoded = tharsis_core::decode(payload.trim())?;
    print_json(&decoded)
}
