use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tharsis")]
#[command(about = "Tharsis CLI: reconcile managed identities and their access rules")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL (overrides config and THARSIS_URL env var)
    #[arg(short, long, global = true, env = "THARSIS_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "THARSIS_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store an API token for a server
    Login(LoginArgs),
    /// Logout (remove stored credentials)
    Logout,
    /// Show current auth info
    Whoami,
    /// Managed identity operations
    Identity(IdentityArgs),
    /// Managed identity access rule operations
    Rule(RuleArgs),
    /// Encode or decode a credential payload locally
    Payload(PayloadArgs),
    /// Bring a managed identity in line with a desired-state file
    Apply(ApplyArgs),
    /// Delete the managed identity recorded in a state file
    Destroy(DestroyArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// API token (reads THARSIS_TOKEN if omitted)
    #[arg(long, env = "THARSIS_TOKEN")]
    pub token: String,
}

#[derive(clap::Args)]
pub struct IdentityArgs {
    #[command(subcommand)]
    pub command: IdentityCommands,
}

#[derive(Subcommand)]
pub enum IdentityCommands {
    /// Read a managed identity by id
    Get(IdArgs),
    /// Create a managed identity from a desired-state JSON file
    Create(FileArgs),
    /// Update description and credentials from a desired-state JSON file
    Update(IdFileArgs),
    /// Delete a managed identity (succeeds if already gone)
    Delete(IdArgs),
}

#[derive(clap::Args)]
pub struct RuleArgs {
    #[command(subcommand)]
    pub command: RuleCommands,
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// Read an access rule by id
    Get(IdArgs),
    /// Create an access rule for a managed identity
    Create(RuleCreateArgs),
    /// Replace an access rule's stage and members
    Update(RuleUpdateArgs),
    /// Delete an access rule (succeeds if already gone)
    Delete(IdArgs),
}

#[derive(clap::Args)]
pub struct IdArgs {
    /// Remote id
    pub id: String,
}

#[derive(clap::Args)]
pub struct FileArgs {
    /// Path to JSON file (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct IdFileArgs {
    /// Remote id
    pub id: String,
    /// Path to JSON file (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct RuleCreateArgs {
    /// Id of the owning managed identity
    #[arg(long)]
    pub identity: String,
    /// Path to JSON file (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct RuleUpdateArgs {
    /// Remote id of the access rule
    pub id: String,
    /// Id of the owning managed identity
    #[arg(long)]
    pub identity: String,
    /// Path to JSON file (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct PayloadArgs {
    #[command(subcommand)]
    pub command: PayloadCommands,
}

#[derive(Subcommand)]
pub enum PayloadCommands {
    /// Validate credential fields and print the opaque payload
    Encode(EncodeArgs),
    /// Print the fields inside an opaque payload
    Decode(DecodeArgs),
}

#[derive(clap::Args)]
pub struct EncodeArgs {
    /// Managed identity type (aws_federated, azure_federated, tharsis_federated)
    #[arg(long = "type")]
    pub kind: String,
    #[arg(long, default_value = "")]
    pub role: String,
    #[arg(long, default_value = "")]
    pub client_id: String,
    #[arg(long, default_value = "")]
    pub tenant_id: String,
    #[arg(long, default_value = "")]
    pub service_account_path: String,
}

#[derive(clap::Args)]
pub struct DecodeArgs {
    /// Opaque payload string
    pub payload: String,
}

#[derive(clap::Args)]
pub struct ApplyArgs {
    /// Desired-state JSON file
    #[arg(long)]
    pub file: String,
    /// State file holding the last actual-state record
    #[arg(long, default_value = "tharsis.state.json")]
    pub state: String,
}

#[derive(clap::Args)]
pub struct DestroyArgs {
    /// State file holding the last actual-state record
    #[arg(long, default_value = "tharsis.state.json")]
    pub state: String,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format, timeout_secs)
    pub key: String,
    /// Value
    pub value: String,
}
