//! Error types for network resolution, manifest assembly and schema merging.

use std::path::PathBuf;

use thiserror::Error;

use crate::NetworkId;

/// The network context could not be resolved from the environment.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("environment variable {var} is not set, expected one of: {expected}")]
    MissingNetwork { var: String, expected: String },

    #[error("unrecognized network {value:?} in {var}, expected one of: {expected}")]
    UnknownNetwork {
        var: String,
        value: String,
        expected: String,
    },
}

/// A deployment record supplied by the deployment package is malformed.
#[derive(Debug, Error)]
pub enum InvalidDeploymentRecordError {
    #[error("deployment #{index} of {contract} on {network} has no address")]
    MissingAddress {
        contract: String,
        network: NetworkId,
        index: usize,
    },

    #[error("deployment #{index} of {contract} on {network} has a malformed address {address:?}: {reason}")]
    MalformedAddress {
        contract: String,
        network: NetworkId,
        index: usize,
        address: String,
        reason: String,
    },

    #[error("deployment #{index} of {contract} on {network} has no start block")]
    MissingStartBlock {
        contract: String,
        network: NetworkId,
        index: usize,
    },

    #[error("deployment #{index} of {contract} on {network} has a negative start block ({start_block})")]
    NegativeStartBlock {
        contract: String,
        network: NetworkId,
        index: usize,
        start_block: i64,
    },

    #[error("failed to read deployment records from {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse deployment records from {}", path.display())]
    Unparsable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Two schema documents define the same name with different shapes.
#[derive(Debug, Error)]
#[error("conflicting definitions for {name}:\n{first}\n--- conflicts with ---\n{second}")]
pub struct SchemaConflictError {
    /// Name of the conflicting type, `Type.member` for a conflicting field or
    /// enum value, or `Type@directive` for a conflicting directive.
    pub name: String,
    /// The definition seen first.
    pub first: String,
    /// The incompatible redefinition.
    pub second: String,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema document {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("failed to read schema document {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write schema artifact {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Conflict(#[from] SchemaConflictError),
}

/// Errors raised while assembling or writing a manifest document.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    InvalidDeploymentRecord(#[from] InvalidDeploymentRecordError),

    #[error("data source {0} is defined twice with different contents")]
    DuplicateDataSource(String),

    #[error("template {0} is defined twice with different contents")]
    DuplicateTemplate(String),

    #[error("handler {handler} is bound more than once in {data_source}")]
    DuplicateHandler { data_source: String, handler: String },

    #[error("{data_source} references entity {entity} which is not defined in the schema")]
    UnknownEntity { data_source: String, entity: String },

    #[error("failed to serialize manifest document")]
    Serialize(#[from] serde_yaml::Error),

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
