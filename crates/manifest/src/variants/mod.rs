//! Manifest variants built from the same deployment data.
//!
//! `main` carries every market family and every template. The other variants
//! carry a single family and exist for development and testing deployments.
//! All variants share the spec version, the schema reference and the data
//! source naming scheme.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
    DeploymentRecords, ManifestBuilder, ManifestDocument, ManifestError, NetworkId,
    NetworkResolver, artifact::write_artifact,
};

mod futures;
mod markets;
mod perps;

pub use futures::STATIC_MARKET_ASSETS;
pub use markets::{MARKET_ADDED_EVENT, MARKET_REMOVED_EVENT};

/// Handler names bound per variant.
///
/// The same `MarketAdded` event is routed to different handlers depending on
/// the manifest generation, so handlers can be migrated one variant at a time
/// without touching the ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerBindings {
    pub market_added: &'static str,
    pub market_removed: &'static str,
}

const V1_BINDINGS: HandlerBindings = HandlerBindings {
    market_added: "handleV1MarketAdded",
    market_removed: "handleMarketRemoved",
};

const V2_BINDINGS: HandlerBindings = HandlerBindings {
    market_added: "handleV2MarketAdded",
    market_removed: "handleMarketRemoved",
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ManifestVariant {
    /// Every market family combined.
    Main,
    /// Futures v1 markets, the cross-margin factory and all templates.
    Futures,
    /// Perps v2 markets.
    Perps,
}

impl ManifestVariant {
    /// Variants that cover a single market family, i.e. everything but `main`.
    pub fn families() -> impl Iterator<Item = Self> {
        Self::iter().filter(|variant| !variant.is_main())
    }

    pub fn is_main(&self) -> bool {
        matches!(self, Self::Main)
    }

    pub fn bindings(&self) -> HandlerBindings {
        match self {
            Self::Futures => V1_BINDINGS,
            Self::Perps | Self::Main => V2_BINDINGS,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Main => "Kwenta Subgraph API",
            Self::Futures | Self::Perps => "Kwenta Futures API",
        }
    }

    /// Build the manifest for the resolver's network.
    pub fn build<R: DeploymentRecords>(
        &self,
        resolver: &NetworkResolver<R>,
    ) -> Result<ManifestDocument, ManifestError> {
        let bindings = self.bindings();
        let mut builder = ManifestBuilder::new(resolver, self.description());

        match self {
            Self::Main => {
                futures::populate(&mut builder, &bindings)?;
                perps::populate(&mut builder, &bindings)?;
            }
            Self::Futures => futures::populate(&mut builder, &bindings)?,
            Self::Perps => perps::populate(&mut builder, &bindings)?,
        }

        builder.build()
    }

    /// Per-family schema document, `<dir>/<variant>.graphql`.
    pub fn schema_path(&self, subgraphs_dir: &Path) -> PathBuf {
        subgraphs_dir.join(format!("{self}.graphql"))
    }

    /// Manifest artifact for `network`, `<dir>/<variant>.<network>.yaml`.
    pub fn manifest_path(&self, subgraphs_dir: &Path, network: NetworkId) -> PathBuf {
        subgraphs_dir.join(format!("{self}.{network}.yaml"))
    }

    /// Build the manifest and write it next to the schemas.
    ///
    /// Nothing is written when the manifest cannot be built.
    pub fn write<R: DeploymentRecords>(
        &self,
        resolver: &NetworkResolver<R>,
        subgraphs_dir: &Path,
    ) -> Result<PathBuf, ManifestError> {
        let document = self.build(resolver)?;
        let yaml = document.to_yaml()?;
        let path = self.manifest_path(subgraphs_dir, resolver.current_network());

        write_artifact(&path, &yaml).map_err(|source| ManifestError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}
