//! Accumulated deployment decisions.

use std::{fmt, str::FromStr};

use subgrapher_manifest::{ManifestVariant, NetworkId};

/// Hosted service networks to deploy to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSelection {
    /// Every configured hosted network.
    All,
    /// Skip the hosted service.
    None,
    Single(NetworkId),
}

impl NetworkSelection {
    /// The networks to deploy to, in order.
    pub fn networks(&self, hosted: &[NetworkId]) -> Vec<NetworkId> {
        match self {
            Self::All => hosted.to_vec(),
            Self::None => Vec::new(),
            Self::Single(network) => vec![*network],
        }
    }
}

impl fmt::Display for NetworkSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::None => f.write_str("None"),
            Self::Single(network) => write!(f, "{network}"),
        }
    }
}

impl FromStr for NetworkSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if s.eq_ignore_ascii_case("none") {
            return Ok(Self::None);
        }
        s.parse::<NetworkId>().map(Self::Single).map_err(|_| {
            format!(
                "unknown network `{s}`, expected All, None or one of {}",
                NetworkId::expected()
            )
        })
    }
}

/// Decisions made so far.
///
/// `None` means "not decided yet": the stage that owns the field prompts for
/// it. A value set up front, typically from a CLI flag, skips the prompt.
/// Stages never mutate a plan, they return an updated copy.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DeploymentPlan {
    pub update_abis: Option<bool>,
    pub generate_main: Option<bool>,
    pub subgraph: Option<ManifestVariant>,
    pub team: Option<String>,
    pub access_token: Option<String>,
    pub network: Option<NetworkSelection>,
    pub deploy_decentralized: Option<bool>,
    pub version_label: Option<String>,
}

impl DeploymentPlan {
    pub fn with_update_abis(&self, value: bool) -> Self {
        Self {
            update_abis: Some(value),
            ..self.clone()
        }
    }

    pub fn with_generate_main(&self, value: bool) -> Self {
        Self {
            generate_main: Some(value),
            ..self.clone()
        }
    }

    pub fn with_subgraph(&self, value: ManifestVariant) -> Self {
        Self {
            subgraph: Some(value),
            ..self.clone()
        }
    }

    pub fn with_team(&self, value: impl Into<String>) -> Self {
        Self {
            team: Some(value.into()),
            ..self.clone()
        }
    }

    pub fn with_access_token(&self, value: impl Into<String>) -> Self {
        Self {
            access_token: Some(value.into()),
            ..self.clone()
        }
    }

    pub fn with_network(&self, value: NetworkSelection) -> Self {
        Self {
            network: Some(value),
            ..self.clone()
        }
    }

    pub fn with_deploy_decentralized(&self, value: bool) -> Self {
        Self {
            deploy_decentralized: Some(value),
            ..self.clone()
        }
    }

    pub fn with_version_label(&self, value: impl Into<String>) -> Self {
        Self {
            version_label: Some(value.into()),
            ..self.clone()
        }
    }

    /// Rows of decided fields for display, the access token masked.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let mut rows = Vec::new();
        let mut push = |name, value: Option<String>| {
            if let Some(value) = value {
                rows.push((name, value));
            }
        };

        push("update ABIs", self.update_abis.map(|v| v.to_string()));
        push("generate main", self.generate_main.map(|v| v.to_string()));
        push("subgraph", self.subgraph.map(|v| v.to_string()));
        push("team", self.team.clone());
        push("access token", self.access_token.as_ref().map(|_| "***".to_string()));
        push("hosted networks", self.network.map(|v| v.to_string()));
        push(
            "decentralized",
            self.deploy_decentralized.map(|v| v.to_string()),
        );
        push("version label", self.version_label.clone());

        rows
    }
}

impl fmt::Debug for DeploymentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentPlan")
            .field("update_abis", &self.update_abis)
            .field("generate_main", &self.generate_main)
            .field("subgraph", &self.subgraph)
            .field("team", &self.team)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("network", &self.network)
            .field("deploy_decentralized", &self.deploy_decentralized)
            .field("version_label", &self.version_label)
            .finish()
    }
}
