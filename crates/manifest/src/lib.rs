//! subgrapher-manifest - Subgraph manifest assembly.
//!
//! This crate resolves per-network contract deployments into subgraph
//! manifests and merges the per-market GraphQL schemas into the schema
//! artifact every manifest references.

pub mod addresses;
pub mod artifact;
pub mod builder;
mod document;
mod error;
mod network;
mod records;
mod schema;
pub mod variants;

pub use builder::{ManifestBuilder, MappingBuilder};
pub use document::{
    API_VERSION, AbiRef, DataSourceManifest, DataSourceSource, EventHandlerBinding,
    ManifestDocument, Mapping, REPOSITORY, SCHEMA_FILE, SPEC_VERSION, SchemaRef,
    TemplateManifest, TemplateSource,
};
pub use error::{
    ConfigurationError, InvalidDeploymentRecordError, ManifestError, SchemaConflictError,
    SchemaError,
};
pub use network::{NETWORK_ENV_VAR, NetworkContext, NetworkId};
pub use records::{
    ContractDeployment, DeploymentRecord, DeploymentRecords, FileDeploymentRecords,
    NetworkRecords, NetworkResolver, StaticDeploymentRecords,
};
pub use schema::{AUTOGEN_NOTICE, SchemaDocument, SchemaSource};
pub use variants::{HandlerBindings, ManifestVariant};
