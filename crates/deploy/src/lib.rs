//! subgrapher-deploy - Deployment pipeline for the subgraph manifests.
//!
//! This crate drives the graph tooling through dependency refresh, schema
//! generation, codegen, hosted service deployment and decentralized network
//! publication, asking for every decision the caller did not make up front.

pub mod config;
mod error;
mod fs;
mod graph;
mod layout;
mod pipeline;
mod plan;
mod prompt;
mod runner;
mod stages;

pub use config::{CONFIG_FILENAME, DeployConfig};
pub use error::{DeployError, ExternalCommandError};
pub use graph::{GraphCmdBuilder, HostedSubgraphName, SUBGRAPH_ENV_VAR};
pub use layout::ProjectLayout;
pub use pipeline::Pipeline;
pub use plan::{DeploymentPlan, NetworkSelection};
pub use prompt::{DefaultsPrompter, Prompter, TerminalPrompter};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
pub use stages::Stage;
