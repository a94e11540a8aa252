//! subgrapher assembles the Kwenta subgraph manifests and deploys them to the
//! hosted service and the decentralized network.

mod cli;
mod ui;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command, DeployArgs, ManifestArgs, SchemaArgs};
use subgrapher_deploy::{
    DefaultsPrompter, DeployConfig, DeployError, Pipeline, ProcessRunner, ProjectLayout,
    TerminalPrompter,
};
use subgrapher_manifest::{NetworkContext, NetworkResolver};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let config = DeployConfig::load(&cli.root, cli.config.as_deref())
        .context("Failed to load the configuration")?;

    let result = match cli.command {
        Command::Deploy(args) => deploy(config, &cli.root, args).await,
        Command::Manifest(args) => manifest(&config, &cli.root, args),
        Command::Schema(args) => schema(&config, &cli.root, args),
        Command::InitConfig { output } => config
            .save_to_file(&output)
            .context("Failed to write the configuration"),
    };

    if let Err(err) = result {
        crate::error!(err);
        std::process::exit(1);
    }

    Ok(())
}

async fn deploy(config: DeployConfig, root: &Path, args: DeployArgs) -> Result<()> {
    let records = ProjectLayout::new(root, config.paths.clone()).deployment_records();
    let plan = args.plan();

    tracing::info!(
        root = %root.display(),
        records = %records.dir().display(),
        interactive = !args.yes,
        "Starting deployment pipeline..."
    );

    let finished = if args.yes {
        Pipeline::new(config, root, ProcessRunner, DefaultsPrompter, records)
            .run(plan)
            .await
    } else {
        Pipeline::new(config, root, ProcessRunner, TerminalPrompter::stdio(), records)
            .run(plan)
            .await
    };
    let finished = finished.map_err(with_stage)?;

    crate::success!("Deployment finished");
    eprintln!("{}", ui::plan_table(&finished));
    Ok(())
}

fn with_stage(err: DeployError) -> anyhow::Error {
    match err.stage() {
        Some(stage) => anyhow::Error::new(err).context(format!("Deployment failed at stage {stage}")),
        None => anyhow::Error::new(err).context("Deployment failed"),
    }
}

fn manifest(config: &DeployConfig, root: &Path, args: ManifestArgs) -> Result<()> {
    let context = match args.network {
        Some(network) => NetworkContext::new(network),
        None => NetworkContext::from_var(&config.networks.env_var)?,
    };
    let layout = ProjectLayout::new(root, config.paths.clone());
    let resolver = NetworkResolver::new(context, layout.deployment_records());
    let output = args.output.unwrap_or_else(|| layout.subgraphs_dir());

    let path = args
        .variant
        .write(&resolver, &output)
        .with_context(|| format!("Failed to render the {} manifest", args.variant))?;
    crate::success!("Manifest written to {}", path.display());

    if args.summary {
        let document = args.variant.build(&resolver)?;
        println!("{}", ui::data_source_table(&document));
    }

    Ok(())
}

fn schema(config: &DeployConfig, root: &Path, args: SchemaArgs) -> Result<()> {
    let layout = ProjectLayout::new(root, config.paths.clone());
    let schema = layout
        .merge_schemas()
        .context("Failed to merge the family schemas")?;
    crate::success!("Main schema written to {}", layout.main_schema().display());

    if args.print {
        print!("{}", schema.print());
    }

    Ok(())
}
