// edgeops - lifecycle orchestration CLI for Apigee Edge organizations
//
// Thin glue over the library: parse arguments, assemble one immutable
// ConnectConfig, connect, run the requested operation, print JSON.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};

mod client;
mod config;
mod error;
mod kvm;
mod report;
mod workflow;

use crate::client::{connect, ArtifactKind};
use crate::config::{ConnectConfig, FileConfig, DEFAULT_MGMT_SERVER};
use crate::kvm::KvmSpec;
use crate::workflow::ImportDeploy;

/// edgeops - revision reports, import-and-deploy workflows, and KVM
/// management for Apigee Edge organizations
#[derive(Parser)]
#[command(name = "edgeops")]
#[command(about = "Lifecycle orchestration for Apigee Edge organizations")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Enable verbose logging (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Connection flags shared by every subcommand
#[derive(ClapArgs)]
struct ConnectionArgs {
    /// Organization to operate on
    #[arg(short, long, env = "EDGEOPS_ORG", default_value = "")]
    org: String,

    /// Management API base URL (default: the public management endpoint)
    #[arg(short, long)]
    mgmtserver: Option<String>,

    /// Username for authentication
    #[arg(short, long)]
    username: Option<String>,

    /// Password for authentication
    #[arg(short, long)]
    password: Option<String>,

    /// Pre-acquired bearer token
    #[arg(short, long)]
    token: Option<String>,

    /// Skip the token exchange and use basic auth
    #[arg(long)]
    notoken: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Report the latest revision of every proxy or shared flow
    Revisions {
        /// Only include names starting with this prefix
        #[arg(short = 'P', long)]
        prefix: Option<String>,

        /// Query shared flows instead of proxies
        #[arg(short = 'S', long)]
        sharedflow: bool,
    },

    /// Import a bundle and optionally deploy the new revision
    Import {
        /// Source directory, the parent of "apiproxy" or "sharedflowbundle"
        #[arg(short = 'd', long)]
        src_dir: PathBuf,

        /// Name for the proxy or shared flow
        #[arg(short = 'N', long)]
        name: String,

        /// Environment to deploy the new revision to
        #[arg(short = 'e', long)]
        env: Option<String>,

        /// Basepath for deploying a proxy (default "/"; ignored for shared flows)
        #[arg(short = 'b', long)]
        basepath: Option<String>,

        /// Import (and deploy) as a shared flow instead of a proxy
        #[arg(short = 'S', long)]
        sharedflow: bool,
    },

    /// Key/value map operations
    Kvm {
        #[command(subcommand)]
        action: KvmCommand,
    },
}

#[derive(Subcommand)]
enum KvmCommand {
    /// Create a KVM, org-scoped unless an environment is given
    Create {
        #[arg(short = 'N', long)]
        name: String,
        #[arg(short = 'e', long)]
        env: Option<String>,
    },
    /// Delete a KVM, org-scoped unless an environment is given
    Delete {
        #[arg(short = 'N', long)]
        name: String,
        #[arg(short = 'e', long)]
        env: Option<String>,
    },
    /// List the KVMs visible in an environment
    List {
        #[arg(short = 'e', long)]
        env: String,
    },
}

fn artifact_kind(sharedflow: bool) -> ArtifactKind {
    if sharedflow {
        ArtifactKind::SharedFlow
    } else {
        ArtifactKind::Proxy
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let file_config = FileConfig::load()?.apply_environment();
    let mut connect_config = ConnectConfig::new(cli.connection.org.clone());
    // Leave the endpoint empty unless given explicitly, so file and
    // environment defaults can fill it before the built-in default applies
    connect_config.mgmt_server = cli.connection.mgmtserver.clone().unwrap_or_default();
    connect_config.username = cli.connection.username.clone();
    connect_config.password = cli.connection.password.clone();
    connect_config.token = cli.connection.token.clone();
    connect_config.no_token = cli.connection.notoken;
    connect_config.verbosity = cli.verbose;
    let mut connect_config = file_config.merge_into(connect_config);
    if connect_config.mgmt_server.is_empty() {
        connect_config.mgmt_server = DEFAULT_MGMT_SERVER.to_string();
    }

    let org = connect(connect_config).await?;

    match cli.command {
        Command::Revisions { prefix, sharedflow } => {
            let report =
                report::revision_report(&org, artifact_kind(sharedflow), prefix.as_deref())
                    .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Import {
            src_dir,
            name,
            env,
            basepath,
            sharedflow,
        } => {
            let mut workflow = ImportDeploy::new(artifact_kind(sharedflow), name, src_dir);
            if let Some(env) = env {
                workflow = workflow.deploy_to(env);
            }
            if let Some(basepath) = basepath {
                workflow = workflow.with_basepath(basepath);
            }
            let outcome = workflow.run(&org).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Command::Kvm { action } => match action {
            KvmCommand::Create { name, env } => {
                let mut spec = KvmSpec::named(name);
                if let Some(env) = env {
                    spec = spec.in_environment(env);
                }
                kvm::create(&org, &spec).await?;
            }
            KvmCommand::Delete { name, env } => {
                let mut spec = KvmSpec::named(name);
                if let Some(env) = env {
                    spec = spec.in_environment(env);
                }
                kvm::delete(&org, &spec).await?;
            }
            KvmCommand::List { env } => {
                let names = kvm::list(&org, Some(&env)).await?;
                println!("{}", serde_json::to_string_pretty(&names)?);
            }
        },
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("edgeops={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
