//! Pipeline stages.
//!
//! The order is fixed: every stage starts only after the previous one, and
//! the external commands it invoked, have completed.

use serde::{Deserialize, Serialize};

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
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Update the deployment package and regenerate the ABIs.
    RefreshDependencies,
    /// Merge the per-family schemas into the main schema.
    RegenerateManifest,
    /// Pick the manifest variant to deploy.
    SelectTarget,
    /// Team name and access token for the graph services.
    SelectCredentials,
    /// Run the graph codegen once per market family.
    Codegen,
    /// Generate the contract artifacts.
    CreateContracts,
    /// Move shared generated artifacts to the family that owns them.
    PostProcessArtifacts,
    /// Pick the hosted service networks.
    SelectNetworks,
    /// Build and deploy to each selected network, one at a time.
    BuildAndDeployHosted,
    /// Decide whether to publish to the decentralized network.
    ConfirmDecentralized,
    /// Version label of the decentralized release.
    SelectVersionLabel,
    /// Publish the main manifest to the decentralized network.
    DeployDecentralized,
    Done,
}
