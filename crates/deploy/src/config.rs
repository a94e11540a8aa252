//! Deployment configuration.
//!
//! Values are layered with figment: built-in defaults, then the user-level
//! `Subgrapher.toml` under the platform config directory, then the one in
//! the project root (or `--config`), then `SUBGRAPHER_*` environment
//! variables. Nested keys use a double underscore, e.g.
//! `SUBGRAPHER_GRAPH__NODE_URL`.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use subgrapher_manifest::{ManifestVariant, NETWORK_ENV_VAR, NetworkId};

use crate::DeployError;

/// Default configuration file name.
pub const CONFIG_FILENAME: &str = "Subgrapher.toml";

/// Prefix of the environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "SUBGRAPHER_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub paths: PathsConfig,
    pub graph: GraphConfig,
    pub networks: NetworksConfig,
    pub dependency: DependencyConfig,
    pub relocation: RelocationRule,
    /// Team proposed when no `--team` is given.
    pub default_team: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            graph: GraphConfig::default(),
            networks: NetworksConfig::default(),
            dependency: DependencyConfig::default(),
            relocation: RelocationRule::default(),
            default_team: "kwenta".to_string(),
        }
    }
}

/// Project layout, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Per-family schemas, the merged schema and the rendered manifests.
    pub subgraphs: PathBuf,
    /// Codegen output, one directory per family.
    pub generated: PathBuf,
    /// Build output, `<build>/<network>/subgraphs/<variant>`.
    pub build: PathBuf,
    /// Per-network deployment records.
    pub deployments: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            subgraphs: PathBuf::from("subgraphs"),
            generated: PathBuf::from("generated/subgraphs"),
            build: PathBuf::from("build"),
            deployments: PathBuf::from("deployments"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub bin: String,
    pub node_url: String,
    pub ipfs_url: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            bin: "./node_modules/.bin/graph".to_string(),
            node_url: "https://api.thegraph.com/deploy/".to_string(),
            ipfs_url: "https://api.thegraph.com/ipfs/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworksConfig {
    /// Environment variable the manifests and the graph tooling read the
    /// active network from.
    pub env_var: String,
    /// Networks targeted by `All` on the hosted service, in deployment order.
    pub hosted: Vec<NetworkId>,
    /// Hosted subgraphs on this network carry no network prefix.
    pub primary: NetworkId,
    /// Network the codegen manifests are rendered for.
    pub codegen: NetworkId,
    /// Network of the decentralized release.
    pub decentralized: NetworkId,
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self {
            env_var: NETWORK_ENV_VAR.to_string(),
            hosted: vec![NetworkId::Optimism, NetworkId::OptimismGoerli],
            primary: NetworkId::Optimism,
            codegen: NetworkId::Optimism,
            decentralized: NetworkId::Optimism,
        }
    }
}

impl NetworksConfig {
    /// Name prefix of hosted subgraphs deployed to `network`.
    pub fn prefix(&self, network: NetworkId) -> String {
        if network == self.primary {
            String::new()
        } else {
            format!("{network}-")
        }
    }
}

/// The package the contract deployments and ABIs come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    pub package: String,
    /// Path of the installed package's `package.json`.
    pub package_json: PathBuf,
    pub install: Vec<String>,
    pub prepare_abis: Vec<String>,
    pub create_contracts: Vec<String>,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            package: "synthetix".to_string(),
            package_json: PathBuf::from("node_modules/synthetix/package.json"),
            install: vec!["npm".to_string(), "install".to_string()],
            prepare_abis: vec![
                "node".to_string(),
                "scripts/helpers/prepare-abis.js".to_string(),
            ],
            create_contracts: vec![
                "node".to_string(),
                "./scripts/helpers/create-contracts".to_string(),
            ],
        }
    }
}

/// A generated subtree shared by several families.
///
/// Codegen for any family may emit it, but only `owner` keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelocationRule {
    pub subtree: String,
    pub owner: ManifestVariant,
}

impl Default for RelocationRule {
    fn default() -> Self {
        Self {
            subtree: "FuturesMarketManager".to_string(),
            owner: ManifestVariant::Futures,
        }
    }
}

impl DeployConfig {
    /// Load the layered configuration.
    ///
    /// The project layer is `root/Subgrapher.toml`, or `path` when given. A
    /// missing file is not an error, the layer is simply empty.
    pub fn load(root: &Path, path: Option<&Path>) -> Result<Self, DeployError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(user) = dirs::config_dir().map(|dir| dir.join("subgrapher").join(CONFIG_FILENAME)) {
            figment = figment.merge(Toml::file(user));
        }

        let project = path.map_or_else(|| root.join(CONFIG_FILENAME), Path::to_path_buf);
        let config: Self = figment
            .merge(Toml::file(&project))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        tracing::debug!(path = %project.display(), "Configuration loaded");
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), DeployError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| DeployError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a single TOML file, without layering.
    ///
    /// A directory is resolved to its `Subgrapher.toml`.
    pub fn load_from_file(path: &Path) -> Result<Self, DeployError> {
        let config_path = if path.is_dir() {
            path.join(CONFIG_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&config_path).map_err(|source| {
            DeployError::ConfigRead {
                path: config_path.clone(),
                source,
            }
        })?;
        let config = toml::from_str(&content).map_err(|source| DeployError::ConfigParse {
            path: config_path.clone(),
            source,
        })?;
        tracing::info!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }
}
