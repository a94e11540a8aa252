//! Network identifiers and the per-run network context.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::ConfigurationError;

/// The environment variable holding the active network.
pub const NETWORK_ENV_VAR: &str = "SNX_NETWORK";

/// A network the subgraphs can be indexed on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum NetworkId {
    Mainnet,
    Kovan,
    Optimism,
    OptimismKovan,
    OptimismGoerli,
}

impl NetworkId {
    /// Comma separated list of every recognized network, for diagnostics.
    pub fn expected() -> String {
        Self::iter()
            .map(|network| network.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The network a run operates on. Resolved once and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkContext {
    network: NetworkId,
}

impl NetworkContext {
    pub fn new(network: NetworkId) -> Self {
        Self { network }
    }

    /// Resolve the context from [`NETWORK_ENV_VAR`].
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_var(NETWORK_ENV_VAR)
    }

    /// Resolve the context from the given environment variable.
    pub fn from_var(var: &str) -> Result<Self, ConfigurationError> {
        Self::from_lookup(var, |name| std::env::var(name).ok())
    }

    /// Resolve the context through an arbitrary variable lookup.
    pub fn from_lookup(
        var: &str,
        lookup: impl FnOnce(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let value = lookup(var).ok_or_else(|| ConfigurationError::MissingNetwork {
            var: var.to_string(),
            expected: NetworkId::expected(),
        })?;

        let network = value
            .trim()
            .parse::<NetworkId>()
            .map_err(|_| ConfigurationError::UnknownNetwork {
                var: var.to_string(),
                value: value.clone(),
                expected: NetworkId::expected(),
            })?;

        tracing::debug!(%network, var, "Resolved network context");

        Ok(Self { network })
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }
}
