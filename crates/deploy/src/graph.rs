//! Command builder for the graph CLI.

use std::path::{Path, PathBuf};

use subgrapher_manifest::{ManifestVariant, NetworkId};

use crate::{CommandSpec, Stage};

/// Environment variable naming the manifest variant being compiled.
pub const SUBGRAPH_ENV_VAR: &str = "SUBGRAPH";

/// Name of a subgraph on the hosted service, `<team>/<prefix><variant>`.
///
/// The prefix is empty on the primary network and `<network>-` elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{team}/{prefix}{variant}")]
pub struct HostedSubgraphName {
    pub team: String,
    pub prefix: String,
    pub variant: ManifestVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphSubcommand {
    Codegen,
    Build,
    Deploy,
}

/// Where `graph deploy` publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeployTarget {
    Hosted {
        node: String,
        ipfs: String,
        name: String,
    },
    Studio {
        team: String,
        version_label: String,
    },
}

/// Builder for graph CLI commands.
#[derive(Debug, Clone)]
pub struct GraphCmdBuilder {
    bin: String,
    subcommand: GraphSubcommand,
    manifest: PathBuf,
    output_dir: Option<PathBuf>,
    target: Option<DeployTarget>,
    access_token: Option<String>,
    network_env: Option<(String, NetworkId)>,
    variant: Option<ManifestVariant>,
}

impl GraphCmdBuilder {
    fn new(bin: impl Into<String>, subcommand: GraphSubcommand, manifest: &Path) -> Self {
        Self {
            bin: bin.into(),
            subcommand,
            manifest: manifest.to_path_buf(),
            output_dir: None,
            target: None,
            access_token: None,
            network_env: None,
            variant: None,
        }
    }

    /// `graph codegen <manifest>`.
    pub fn codegen(bin: impl Into<String>, manifest: &Path) -> Self {
        Self::new(bin, GraphSubcommand::Codegen, manifest)
    }

    /// `graph build <manifest>`.
    pub fn build(bin: impl Into<String>, manifest: &Path) -> Self {
        Self::new(bin, GraphSubcommand::Build, manifest)
    }

    /// `graph deploy <name> <manifest>` against a hosted node.
    pub fn deploy_hosted(
        bin: impl Into<String>,
        manifest: &Path,
        node: impl Into<String>,
        ipfs: impl Into<String>,
        name: &HostedSubgraphName,
    ) -> Self {
        let mut builder = Self::new(bin, GraphSubcommand::Deploy, manifest);
        builder.target = Some(DeployTarget::Hosted {
            node: node.into(),
            ipfs: ipfs.into(),
            name: name.to_string(),
        });
        builder
    }

    /// `graph deploy --studio <team> <manifest>`.
    pub fn deploy_studio(
        bin: impl Into<String>,
        manifest: &Path,
        team: impl Into<String>,
        version_label: impl Into<String>,
    ) -> Self {
        let mut builder = Self::new(bin, GraphSubcommand::Deploy, manifest);
        builder.target = Some(DeployTarget::Studio {
            team: team.into(),
            version_label: version_label.into(),
        });
        builder
    }

    /// Set the output directory of codegen and build.
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the access token used by deploy.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Expose the active network to the graph tooling through `var`.
    pub fn network(mut self, var: impl Into<String>, network: NetworkId) -> Self {
        self.network_env = Some((var.into(), network));
        self
    }

    /// Expose the variant being compiled through `SUBGRAPH`.
    pub fn variant(mut self, variant: ManifestVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Build the command for `stage`.
    pub fn build_for(self, stage: Stage) -> CommandSpec {
        let mut cmd = CommandSpec::new(stage, self.bin);

        if let Some((var, network)) = self.network_env {
            cmd = cmd.env(var, network.to_string());
        }
        if let Some(variant) = self.variant {
            cmd = cmd.env(SUBGRAPH_ENV_VAR, variant.to_string());
        }

        cmd = cmd.arg(match self.subcommand {
            GraphSubcommand::Codegen => "codegen",
            GraphSubcommand::Build => "build",
            GraphSubcommand::Deploy => "deploy",
        });

        let mut name = None;
        match self.target {
            Some(DeployTarget::Hosted {
                node,
                ipfs,
                name: subgraph,
            }) => {
                cmd = cmd.args(["--node".to_string(), node, "--ipfs".to_string(), ipfs]);
                name = Some(subgraph);
            }
            Some(DeployTarget::Studio {
                team,
                version_label,
            }) => {
                cmd = cmd.args([
                    "--studio".to_string(),
                    team,
                    "--version-label".to_string(),
                    version_label,
                ]);
            }
            None => {}
        }

        if let Some(token) = self.access_token {
            cmd = cmd.arg("--access-token").secret_arg(token);
        }

        if let Some(name) = name {
            cmd = cmd.arg(name);
        }
        cmd = cmd.arg(self.manifest.display().to_string());

        if let Some(output_dir) = self.output_dir {
            cmd = cmd.arg("-o").arg(output_dir.display().to_string());
        }

        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = "./node_modules/.bin/graph";

    #[test]
    fn test_codegen_cmd() {
        let cmd = GraphCmdBuilder::codegen(GRAPH, Path::new("subgraphs/futures.optimism.yaml"))
            .output_dir("generated/subgraphs/futures")
            .network("SNX_NETWORK", NetworkId::Optimism)
            .variant(ManifestVariant::Futures)
            .build_for(Stage::Codegen);

        assert_eq!(cmd.program, GRAPH);
        assert_eq!(
            cmd.args,
            [
                "codegen",
                "subgraphs/futures.optimism.yaml",
                "-o",
                "generated/subgraphs/futures"
            ]
        );
        assert_eq!(cmd.env_value("SNX_NETWORK"), Some("optimism"));
        assert_eq!(cmd.env_value(SUBGRAPH_ENV_VAR), Some("futures"));
    }

    #[test]
    fn test_hosted_deploy_cmd() {
        let cmd = GraphCmdBuilder::deploy_hosted(
            GRAPH,
            Path::new("subgraphs/perps.optimism-goerli.yaml"),
            "https://api.thegraph.com/deploy/",
            "https://api.thegraph.com/ipfs/",
            &HostedSubgraphName {
                team: "kwenta".to_string(),
                prefix: "optimism-goerli-".to_string(),
                variant: ManifestVariant::Perps,
            },
        )
        .access_token("secret")
        .build_for(Stage::BuildAndDeployHosted);

        assert_eq!(
            cmd.args,
            [
                "deploy",
                "--node",
                "https://api.thegraph.com/deploy/",
                "--ipfs",
                "https://api.thegraph.com/ipfs/",
                "--access-token",
                "secret",
                "kwenta/optimism-goerli-perps",
                "subgraphs/perps.optimism-goerli.yaml",
            ]
        );
        assert!(!cmd.to_string().contains("secret"));
    }

    #[test]
    fn test_studio_deploy_cmd() {
        let cmd = GraphCmdBuilder::deploy_studio(
            GRAPH,
            Path::new("subgraphs/main.optimism.yaml"),
            "kwenta",
            "2.91.0",
        )
        .access_token("secret")
        .build_for(Stage::DeployDecentralized);

        assert_eq!(
            cmd.args,
            [
                "deploy",
                "--studio",
                "kwenta",
                "--version-label",
                "2.91.0",
                "--access-token",
                "secret",
                "subgraphs/main.optimism.yaml",
            ]
        );
    }
}
