//! The deployment pipeline.
//!
//! Stages run strictly in order and every external command is awaited before
//! the next one starts. A failure stops the pipeline where it is: nothing is
//! retried, rolled back or resumed.

use std::path::PathBuf;

use strum::IntoEnumIterator;
use subgrapher_manifest::{
    DeploymentRecords, ManifestVariant, NetworkContext, NetworkId, NetworkResolver,
};

use crate::{
    CommandOutput, CommandRunner, CommandSpec, DeployConfig, DeployError, DeploymentPlan,
    ExternalCommandError, GraphCmdBuilder, HostedSubgraphName, NetworkSelection, ProjectLayout,
    Prompter, Stage, fs::FsHandler,
};

/// Sequences the deployment stages.
///
/// `R` runs the external tools, `P` answers the gates the plan leaves open
/// and `D` supplies the contract deployments the manifests are built from.
pub struct Pipeline<R, P, D> {
    config: DeployConfig,
    layout: ProjectLayout,
    runner: R,
    prompter: P,
    records: D,
}

impl<R, P, D> Pipeline<R, P, D>
where
    R: CommandRunner,
    P: Prompter,
    D: DeploymentRecords,
{
    pub fn new(
        config: DeployConfig,
        root: impl Into<PathBuf>,
        runner: R,
        prompter: P,
        records: D,
    ) -> Self {
        let layout = ProjectLayout::new(root, config.paths.clone());
        Self {
            config,
            layout,
            runner,
            prompter,
            records,
        }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Run every stage, returning the completed plan.
    pub async fn run(&mut self, plan: DeploymentPlan) -> Result<DeploymentPlan, DeployError> {
        let plan = self.refresh_dependencies(plan).await?;
        let plan = self.regenerate_manifest(plan)?;
        let plan = self.select_target(plan)?;
        let plan = self.select_credentials(plan)?;

        self.codegen().await?;
        self.create_contracts().await?;
        self.post_process_artifacts(&plan)?;

        let plan = self.select_networks(plan)?;
        self.build_and_deploy_hosted(&plan).await?;

        let plan = self.confirm_decentralized(plan)?;
        let plan = if plan.deploy_decentralized == Some(true) {
            let plan = self.select_version_label(plan)?;
            self.deploy_decentralized(&plan).await?;
            plan
        } else {
            plan
        };

        tracing::info!(stage = %Stage::Done, "Deployment pipeline finished");
        Ok(plan)
    }

    /// Update the deployment package and prepare the ABIs, when confirmed.
    pub async fn refresh_dependencies(
        &mut self,
        plan: DeploymentPlan,
    ) -> Result<DeploymentPlan, DeployError> {
        let stage = Stage::RefreshDependencies;
        let update = self.confirm(
            stage,
            plan.update_abis,
            "Update the deployment package and contract ABIs?",
            true,
        )?;

        if update {
            let package = &self.config.dependency.package;
            tracing::info!(stage = %stage, package = %package, "Updating the deployment package");
            let install = self
                .configured(stage, "install", &self.config.dependency.install)?
                .arg(format!("{package}@latest"));
            self.exec(install).await?;

            let prepare =
                self.configured(stage, "prepare_abis", &self.config.dependency.prepare_abis)?;
            self.exec(prepare).await?;
            tracing::info!(stage = %stage, "ABI files prepared");
        } else {
            tracing::info!(stage = %stage, "Skipping dependency refresh");
        }

        Ok(plan.with_update_abis(update))
    }

    /// Merge the family schemas into the main schema, when confirmed.
    ///
    /// The main manifest is built for the codegen network and checked against
    /// the merged schema, so a handler entity missing from every family
    /// schema fails here rather than in codegen.
    pub fn regenerate_manifest(&mut self, plan: DeploymentPlan) -> Result<DeploymentPlan, DeployError> {
        let stage = Stage::RegenerateManifest;
        let generate = self.confirm(stage, plan.generate_main, "Generate the main schema?", true)?;

        if generate {
            let schema = self.layout.merge_schemas()?;
            let main = ManifestVariant::Main.build(&self.resolver(self.config.networks.codegen))?;
            main.check_entities(&schema)?;
        } else {
            tracing::info!(stage = %stage, "Skipping main schema generation");
        }

        Ok(plan.with_generate_main(generate))
    }

    pub fn select_target(&mut self, plan: DeploymentPlan) -> Result<DeploymentPlan, DeployError> {
        let stage = Stage::SelectTarget;
        if let Some(subgraph) = plan.subgraph {
            return Ok(plan.with_subgraph(subgraph));
        }

        let choices: Vec<String> = ManifestVariant::iter().map(|v| v.to_string()).collect();
        let answer = self
            .prompter
            .select(
                "Which subgraph would you like to deploy? Deploy variants other than main only for development and testing.",
                &choices,
                &ManifestVariant::Main.to_string(),
            )
            .map_err(|source| DeployError::Prompt { stage, source })?;
        let subgraph = answer
            .parse()
            .map_err(|_| DeployError::InvalidAnswer { stage, answer })?;

        Ok(plan.with_subgraph(subgraph))
    }

    /// Team and access token. Both are checked only when a deploy needs them.
    pub fn select_credentials(&mut self, plan: DeploymentPlan) -> Result<DeploymentPlan, DeployError> {
        let stage = Stage::SelectCredentials;
        let team = match &plan.team {
            Some(team) => team.clone(),
            None => self
                .prompter
                .input(
                    "What is your team name on The Graph?",
                    Some(self.config.default_team.as_str()),
                )
                .map_err(|source| DeployError::Prompt { stage, source })?,
        };
        let access_token = match &plan.access_token {
            Some(token) => token.clone(),
            None => self
                .prompter
                .input("What is your access token for The Graph?", None)
                .map_err(|source| DeployError::Prompt { stage, source })?,
        };

        Ok(plan.with_team(team).with_access_token(access_token))
    }

    /// Run the graph codegen once per market family.
    pub async fn codegen(&mut self) -> Result<(), DeployError> {
        let stage = Stage::Codegen;
        let network = self.config.networks.codegen;

        for variant in ManifestVariant::families() {
            tracing::info!(stage = %stage, variant = %variant, network = %network, "Running codegen");
            let manifest = self.render_manifest(variant, network)?;
            let cmd = GraphCmdBuilder::codegen(&self.config.graph.bin, &manifest)
                .output_dir(self.layout.relative_generated_dir(variant))
                .network(&self.config.networks.env_var, network)
                .variant(variant)
                .build_for(stage);
            self.exec(cmd).await?;
        }

        Ok(())
    }

    pub async fn create_contracts(&mut self) -> Result<(), DeployError> {
        let stage = Stage::CreateContracts;
        tracing::info!(stage = %stage, "Creating contracts");
        let cmd = self.configured(stage, "create_contracts", &self.config.dependency.create_contracts)?;
        self.exec(cmd).await?;
        Ok(())
    }

    /// Hand the shared generated subtree over to the family that owns it.
    ///
    /// Nothing moves when the target is the owner or the target's codegen
    /// produced no such subtree.
    pub fn post_process_artifacts(&mut self, plan: &DeploymentPlan) -> Result<(), DeployError> {
        let stage = Stage::PostProcessArtifacts;
        let target = target_of(plan);
        let rule = &self.config.relocation;

        if target == rule.owner {
            tracing::debug!(stage = %stage, target = %target, "Target owns the shared subtree");
            return Ok(());
        }

        let from = self.layout.generated_dir(target).join(&rule.subtree);
        let to = self.layout.generated_dir(rule.owner).join(&rule.subtree);
        let moved = FsHandler::relocate_dir(&from, &to).map_err(|source| DeployError::Io {
            stage,
            path: from.clone(),
            source,
        })?;
        if moved {
            tracing::info!(
                stage = %stage,
                subtree = %rule.subtree,
                from = %target,
                to = %rule.owner,
                "Moved generated subtree"
            );
        }

        Ok(())
    }

    pub fn select_networks(&mut self, plan: DeploymentPlan) -> Result<DeploymentPlan, DeployError> {
        let stage = Stage::SelectNetworks;
        if let Some(network) = plan.network {
            return Ok(plan.with_network(network));
        }

        let choices: Vec<String> = [NetworkSelection::All, NetworkSelection::None]
            .into_iter()
            .chain(self.config.networks.hosted.iter().copied().map(NetworkSelection::Single))
            .map(|selection| selection.to_string())
            .collect();
        let answer = self
            .prompter
            .select(
                "Where would you like to deploy the subgraphs on the hosted service?",
                &choices,
                &NetworkSelection::All.to_string(),
            )
            .map_err(|source| DeployError::Prompt { stage, source })?;
        let network = answer
            .parse()
            .map_err(|_| DeployError::InvalidAnswer { stage, answer })?;

        Ok(plan.with_network(network))
    }

    /// Build and deploy the target to each selected network in turn.
    ///
    /// The first failing network stops the loop. Networks already deployed
    /// stay deployed.
    pub async fn build_and_deploy_hosted(&mut self, plan: &DeploymentPlan) -> Result<(), DeployError> {
        let stage = Stage::BuildAndDeployHosted;
        let networks = plan
            .network
            .unwrap_or(NetworkSelection::None)
            .networks(&self.config.networks.hosted);

        if networks.is_empty() {
            tracing::info!(stage = %stage, "Skipping the hosted service");
            return Ok(());
        }

        let target = target_of(plan);
        let team = required(stage, plan.team.as_deref(), "team")?;
        let access_token = required(stage, plan.access_token.as_deref(), "access token")?;

        for network in networks {
            let manifest = self.render_manifest(target, network)?;
            self.deploy_hosted_network(target, network, &manifest, team, access_token)
                .await
                .map_err(|source| DeployError::HostedNetwork { network, source })?;
            tracing::info!(stage = %stage, network = %network, "Deployed to the hosted service");
        }

        Ok(())
    }

    async fn deploy_hosted_network(
        &self,
        target: ManifestVariant,
        network: NetworkId,
        manifest: &std::path::Path,
        team: &str,
        access_token: &str,
    ) -> Result<CommandOutput, ExternalCommandError> {
        let stage = Stage::BuildAndDeployHosted;
        let graph = &self.config.graph;
        let env_var = &self.config.networks.env_var;

        let build = GraphCmdBuilder::build(&graph.bin, manifest)
            .output_dir(self.layout.relative_build_dir(network, target))
            .network(env_var, network)
            .variant(target)
            .build_for(stage);
        self.exec(build).await?;

        let name = HostedSubgraphName {
            team: team.to_string(),
            prefix: self.config.networks.prefix(network),
            variant: target,
        };
        let deploy = GraphCmdBuilder::deploy_hosted(
            &graph.bin,
            manifest,
            &graph.node_url,
            &graph.ipfs_url,
            &name,
        )
        .access_token(access_token)
        .network(env_var, network)
        .build_for(stage);
        self.exec(deploy).await
    }

    pub fn confirm_decentralized(&mut self, plan: DeploymentPlan) -> Result<DeploymentPlan, DeployError> {
        let deploy = self.confirm(
            Stage::ConfirmDecentralized,
            plan.deploy_decentralized,
            "Would you like to deploy the main subgraph to the decentralized network?",
            false,
        )?;
        Ok(plan.with_deploy_decentralized(deploy))
    }

    /// Version label of the release, proposing the dependency package version.
    pub fn select_version_label(&mut self, plan: DeploymentPlan) -> Result<DeploymentPlan, DeployError> {
        let stage = Stage::SelectVersionLabel;
        if let Some(label) = &plan.version_label {
            return Ok(plan.with_version_label(label.clone()));
        }

        let package_json = self.layout.root().join(&self.config.dependency.package_json);
        let default = FsHandler::package_version(&package_json);
        let label = self
            .prompter
            .input(
                "What version label should be used for this release?",
                default.as_deref(),
            )
            .map_err(|source| DeployError::Prompt { stage, source })?;

        Ok(plan.with_version_label(label))
    }

    /// Publish the main manifest to the decentralized network.
    pub async fn deploy_decentralized(&mut self, plan: &DeploymentPlan) -> Result<(), DeployError> {
        let stage = Stage::DeployDecentralized;
        let team = required(stage, plan.team.as_deref(), "team")?;
        let access_token = required(stage, plan.access_token.as_deref(), "access token")?;
        let label = required(stage, plan.version_label.as_deref(), "version label")?;
        let network = self.config.networks.decentralized;

        tracing::info!(stage = %stage, network = %network, version = %label, "Deploying to the decentralized network");
        let manifest = self.render_manifest(ManifestVariant::Main, network)?;
        let cmd = GraphCmdBuilder::deploy_studio(&self.config.graph.bin, &manifest, team, label)
            .access_token(access_token)
            .network(&self.config.networks.env_var, network)
            .build_for(stage);
        self.exec(cmd).await?;

        tracing::info!(stage = %stage, "Deployed to the decentralized network");
        Ok(())
    }

    fn resolver(&self, network: NetworkId) -> NetworkResolver<&D> {
        NetworkResolver::new(NetworkContext::new(network), &self.records)
    }

    /// Write the manifest of `variant` for `network`, returning the path the
    /// graph tooling should be given.
    fn render_manifest(
        &self,
        variant: ManifestVariant,
        network: NetworkId,
    ) -> Result<PathBuf, DeployError> {
        variant.write(&self.resolver(network), &self.layout.subgraphs_dir())?;
        Ok(self.layout.relative_manifest(variant, network))
    }

    fn confirm(
        &mut self,
        stage: Stage,
        decided: Option<bool>,
        message: &str,
        default: bool,
    ) -> Result<bool, DeployError> {
        match decided {
            Some(answer) => Ok(answer),
            None => self
                .prompter
                .confirm(message, default)
                .map_err(|source| DeployError::Prompt { stage, source }),
        }
    }

    fn configured(
        &self,
        stage: Stage,
        name: &'static str,
        argv: &[String],
    ) -> Result<CommandSpec, DeployError> {
        CommandSpec::from_argv(stage, argv).ok_or(DeployError::EmptyCommand { stage, name })
    }

    async fn exec(&self, cmd: CommandSpec) -> Result<CommandOutput, ExternalCommandError> {
        let cmd = cmd.current_dir(self.layout.root());
        self.runner.run(&cmd).await
    }
}

fn target_of(plan: &DeploymentPlan) -> ManifestVariant {
    plan.subgraph.unwrap_or(ManifestVariant::Main)
}

fn required<'a>(
    stage: Stage,
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, DeployError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(DeployError::MissingInput { stage, field })
}
