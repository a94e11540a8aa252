use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use subgrapher_deploy::{CONFIG_FILENAME, DeploymentPlan, NetworkSelection};
use subgrapher_manifest::{ManifestVariant, NetworkId};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "subgrapher")]
#[command(
    author,
    version,
    about = "Assemble the Kwenta subgraph manifests and deploy them"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(long, global = true, env = "SUBGRAPHER_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a Subgrapher.toml configuration file.
    ///
    /// Defaults to ./Subgrapher.toml when it exists.
    #[arg(long, global = true, alias = "conf", env = "SUBGRAPHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root the configured paths are relative to.
    #[arg(long, global = true, env = "SUBGRAPHER_ROOT", default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the deployment pipeline.
    Deploy(DeployArgs),

    /// Render a single manifest.
    Manifest(ManifestArgs),

    /// Merge the family schemas into the main schema.
    Schema(SchemaArgs),

    /// Write the effective configuration to a TOML file.
    InitConfig {
        /// Where to write the configuration.
        #[arg(long, default_value = CONFIG_FILENAME)]
        output: PathBuf,
    },
}

/// Pipeline decisions. Anything left out is asked interactively.
#[derive(Debug, Clone, Args)]
pub struct DeployArgs {
    /// Update the deployment package and contract ABIs.
    #[arg(short = 'a', long, num_args = 0..=1, default_missing_value = "true")]
    pub update_abis: Option<bool>,

    /// Generate the main schema.
    #[arg(short = 'm', long, num_args = 0..=1, default_missing_value = "true")]
    pub generate_main: Option<bool>,

    /// The subgraph to deploy to the hosted service.
    #[arg(short, long)]
    pub subgraph: Option<ManifestVariant>,

    /// The Graph team name.
    #[arg(short, long, env = "GRAPH_TEAM")]
    pub team: Option<String>,

    /// The Graph access token.
    #[arg(long, env = "GRAPH_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Hosted service networks: All, None or a single network.
    #[arg(short, long)]
    pub network: Option<NetworkSelection>,

    /// Deploy the main subgraph to the decentralized network.
    #[arg(short = 'd', long, num_args = 0..=1, default_missing_value = "true")]
    pub deploy_decentralized: Option<bool>,

    /// Version label of the decentralized network release.
    #[arg(short = 'v', long)]
    pub version_label: Option<String>,

    /// Answer every remaining prompt with its default.
    #[arg(short = 'y', long, env = "SUBGRAPHER_NON_INTERACTIVE")]
    pub yes: bool,
}

impl DeployArgs {
    /// The plan pre-answered by the flags.
    pub fn plan(&self) -> DeploymentPlan {
        DeploymentPlan {
            update_abis: self.update_abis,
            generate_main: self.generate_main,
            subgraph: self.subgraph,
            team: self.team.clone(),
            access_token: self.access_token.clone(),
            network: self.network,
            deploy_decentralized: self.deploy_decentralized,
            version_label: self.version_label.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ManifestArgs {
    /// The manifest variant.
    #[arg(long, default_value_t = ManifestVariant::Main)]
    pub variant: ManifestVariant,

    /// Target network. Read from the configured network variable when omitted.
    #[arg(long)]
    pub network: Option<NetworkId>,

    /// Directory to write the manifest to, the subgraphs directory by default.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print a table of the data sources instead of only the path.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    /// Also print the merged schema.
    #[arg(long)]
    pub print: bool,
}
