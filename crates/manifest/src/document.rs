//! Manifest document model, as consumed by the graph CLI.

use std::collections::HashSet;

use alloy_core::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{ManifestError, NetworkId, SchemaDocument};

/// Manifest specification version shared by every variant.
pub const SPEC_VERSION: &str = "0.0.4";
/// Mapping API version shared by every data source and template.
pub const API_VERSION: &str = "0.0.6";
/// Schema artifact referenced by every variant, relative to the manifest.
pub const SCHEMA_FILE: &str = "./main.graphql";
/// Repository advertised in every manifest.
pub const REPOSITORY: &str = "https://github.com/kwenta/kwenta-subgraph";

pub const CONTRACT_KIND: &str = "ethereum/contract";
pub const EVENTS_KIND: &str = "ethereum/events";
pub const MAPPING_LANGUAGE: &str = "wasm/assemblyscript";

/// Maps an ABI event signature to the handler invoked for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventHandlerBinding {
    /// Exact ABI event descriptor, `indexed` qualifiers included.
    pub event: String,
    pub handler: String,
}

impl EventHandlerBinding {
    pub fn new(event: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            handler: handler.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbiRef {
    pub name: String,
    pub file: String,
}

impl AbiRef {
    /// Reference the ABI stored at `../abis/<name>.json`.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let file = format!("../abis/{name}.json");
        Self { name, file }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub kind: String,
    pub api_version: String,
    pub language: String,
    pub file: String,
    pub entities: Vec<String>,
    pub abis: Vec<AbiRef>,
    pub event_handlers: Vec<EventHandlerBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceSource {
    pub address: Address,
    pub start_block: u64,
    pub abi: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateSource {
    pub abi: String,
}

/// A data source bound to one deployed contract instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSourceManifest {
    pub kind: String,
    pub name: String,
    pub network: NetworkId,
    pub source: DataSourceSource,
    pub mapping: Mapping,
}

/// A contract type instantiated by the indexer when a factory event fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub kind: String,
    pub name: String,
    pub network: NetworkId,
    pub source: TemplateSource,
    pub mapping: Mapping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    pub file: String,
}

/// Root manifest artifact handed to the graph CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDocument {
    pub spec_version: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub schema: SchemaRef,
    pub data_sources: Vec<DataSourceManifest>,
    pub templates: Vec<TemplateManifest>,
}

impl ManifestDocument {
    /// Check name uniqueness of data sources, templates and handlers.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut names = HashSet::new();
        for data_source in &self.data_sources {
            if !names.insert(data_source.name.as_str()) {
                return Err(ManifestError::DuplicateDataSource(data_source.name.clone()));
            }
            unique_handlers(&data_source.name, &data_source.mapping)?;
        }

        let mut names = HashSet::new();
        for template in &self.templates {
            if !names.insert(template.name.as_str()) {
                return Err(ManifestError::DuplicateTemplate(template.name.clone()));
            }
            unique_handlers(&template.name, &template.mapping)?;
        }

        Ok(())
    }

    /// Check that every entity a mapping writes to is defined by `schema`.
    pub fn check_entities(&self, schema: &SchemaDocument) -> Result<(), ManifestError> {
        let known = schema.entity_names();

        let mappings = self
            .data_sources
            .iter()
            .map(|ds| (&ds.name, &ds.mapping))
            .chain(self.templates.iter().map(|t| (&t.name, &t.mapping)));

        for (name, mapping) in mappings {
            if let Some(entity) = mapping.entities.iter().find(|e| !known.contains(e.as_str())) {
                return Err(ManifestError::UnknownEntity {
                    data_source: name.clone(),
                    entity: entity.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn unique_handlers(name: &str, mapping: &Mapping) -> Result<(), ManifestError> {
    let mut handlers = HashSet::new();
    match mapping
        .event_handlers
        .iter()
        .find(|binding| !handlers.insert(binding.handler.as_str()))
    {
        Some(binding) => Err(ManifestError::DuplicateHandler {
            data_source: name.to_string(),
            handler: binding.handler.clone(),
        }),
        None => Ok(()),
    }
}
