//! Deployment errors.

use std::path::PathBuf;

use subgrapher_manifest::{ManifestError, NetworkId, SchemaError};
use thiserror::Error;

use crate::Stage;

/// An external tool could not be started or exited unsuccessfully.
#[derive(Debug, Error)]
pub enum ExternalCommandError {
    #[error("{stage}: failed to start `{command}`")]
    Spawn {
        stage: Stage,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage}: `{command}` {}{}", describe_exit(.code), diagnostics(.stderr))]
    Failed {
        stage: Stage,
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl ExternalCommandError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Spawn { stage, .. } | Self::Failed { stage, .. } => *stage,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

fn diagnostics(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{stderr}")
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Command(#[from] ExternalCommandError),

    /// Fan-out halted on the first network whose build or deploy failed.
    #[error("hosted deployment to {network} failed")]
    HostedNetwork {
        network: NetworkId,
        #[source]
        source: ExternalCommandError,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{stage}: failed to read an answer")]
    Prompt {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage}: `{answer}` is not one of the choices")]
    InvalidAnswer { stage: Stage, answer: String },

    #[error("{stage}: {field} is required")]
    MissingInput { stage: Stage, field: &'static str },

    #[error("{stage}: command `{name}` is not configured")]
    EmptyCommand { stage: Stage, name: &'static str },

    #[error("{stage}: I/O error on {}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load configuration")]
    Config(#[from] Box<figment::Error>),

    #[error("failed to serialize configuration to TOML")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("failed to read configuration from {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {} as TOML", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write configuration to {}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    /// Stage the pipeline was in when the error occurred, when known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Command(err) => Some(err.stage()),
            Self::HostedNetwork { .. } => Some(Stage::BuildAndDeployHosted),
            Self::Prompt { stage, .. }
            | Self::InvalidAnswer { stage, .. }
            | Self::MissingInput { stage, .. }
            | Self::EmptyCommand { stage, .. }
            | Self::Io { stage, .. } => Some(*stage),
            Self::Manifest(_)
            | Self::Schema(_)
            | Self::Config(_)
            | Self::ConfigSerialize(_)
            | Self::ConfigRead { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigWrite { .. } => None,
        }
    }
}
