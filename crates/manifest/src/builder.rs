//! Builders turning deployment lookups and static mapping definitions into a
//! [`ManifestDocument`].

use crate::{
    AbiRef, ContractDeployment, DataSourceManifest, DataSourceSource, DeploymentRecords,
    EventHandlerBinding, ManifestDocument, ManifestError, Mapping, NetworkId, NetworkResolver,
    SchemaRef, TemplateManifest, TemplateSource,
    document::{
        API_VERSION, CONTRACT_KIND, EVENTS_KIND, MAPPING_LANGUAGE, REPOSITORY, SCHEMA_FILE,
        SPEC_VERSION,
    },
};

/// Builder for a [`Mapping`].
///
/// # Example
///
/// ```
/// use subgrapher_manifest::MappingBuilder;
///
/// let mapping = MappingBuilder::new("../src/crossmargin.ts")
///     .entity("MarginAccountFactory")
///     .abi("MarginAccountFactory")
///     .handler("NewAccount(indexed address,address)", "handleNewAccount")
///     .build();
///
/// assert_eq!(mapping.abis[0].file, "../abis/MarginAccountFactory.json");
/// ```
#[derive(Debug, Clone)]
pub struct MappingBuilder {
    file: String,
    entities: Vec<String>,
    abis: Vec<AbiRef>,
    event_handlers: Vec<EventHandlerBinding>,
}

impl MappingBuilder {
    /// Create a mapping backed by the handler source file `file`.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            entities: Vec::new(),
            abis: Vec::new(),
            event_handlers: Vec::new(),
        }
    }

    /// Add an entity written by this mapping.
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entities.push(entity.into());
        self
    }

    /// Add multiple entities.
    pub fn entities(mut self, entities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.entities.extend(entities.into_iter().map(Into::into));
        self
    }

    /// Add an ABI stored under `../abis/<name>.json`.
    pub fn abi(mut self, name: impl Into<String>) -> Self {
        self.abis.push(AbiRef::named(name));
        self
    }

    /// Bind `event` to `handler`.
    pub fn handler(mut self, event: impl Into<String>, handler: impl Into<String>) -> Self {
        self.event_handlers
            .push(EventHandlerBinding::new(event, handler));
        self
    }

    pub fn build(self) -> Mapping {
        Mapping {
            kind: EVENTS_KIND.to_string(),
            api_version: API_VERSION.to_string(),
            language: MAPPING_LANGUAGE.to_string(),
            file: self.file,
            entities: self.entities,
            abis: self.abis,
            event_handlers: self.event_handlers,
        }
    }
}

/// Name of the data source indexing the `index`-th deployment of `contract`.
pub fn data_source_name(market: &str, contract: &str, index: usize) -> String {
    format!("{market}_{contract}_{index}")
}

/// One data source per deployment, indexed in the order of `deployments`.
pub fn indexed_data_sources(
    market: &str,
    contract: &str,
    abi: &str,
    network: NetworkId,
    deployments: &[ContractDeployment],
    mapping: &Mapping,
) -> Vec<DataSourceManifest> {
    deployments
        .iter()
        .enumerate()
        .map(|(index, deployment)| DataSourceManifest {
            kind: CONTRACT_KIND.to_string(),
            name: data_source_name(market, contract, index),
            network,
            source: DataSourceSource {
                address: deployment.address,
                start_block: deployment.start_block,
                abi: abi.to_string(),
            },
            mapping: mapping.clone(),
        })
        .collect()
}

/// A data source for a contract whose address is known without a lookup.
pub fn single_data_source(
    name: impl Into<String>,
    abi: impl Into<String>,
    network: NetworkId,
    deployment: ContractDeployment,
    mapping: Mapping,
) -> DataSourceManifest {
    DataSourceManifest {
        kind: CONTRACT_KIND.to_string(),
        name: name.into(),
        network,
        source: DataSourceSource {
            address: deployment.address,
            start_block: deployment.start_block,
            abi: abi.into(),
        },
        mapping,
    }
}

pub fn template(
    name: impl Into<String>,
    abi: impl Into<String>,
    network: NetworkId,
    mapping: Mapping,
) -> TemplateManifest {
    TemplateManifest {
        kind: CONTRACT_KIND.to_string(),
        name: name.into(),
        network,
        source: TemplateSource { abi: abi.into() },
        mapping,
    }
}

/// Accumulates data sources and templates for one manifest document.
///
/// Entries are kept in insertion order. Adding an entry whose name is already
/// present is a no-op when both are identical and an error otherwise, which
/// lets market families that share contracts be composed into one document.
pub struct ManifestBuilder<'a, R> {
    resolver: &'a NetworkResolver<R>,
    description: String,
    data_sources: Vec<DataSourceManifest>,
    templates: Vec<TemplateManifest>,
}

impl<'a, R: DeploymentRecords> ManifestBuilder<'a, R> {
    pub fn new(resolver: &'a NetworkResolver<R>, description: impl Into<String>) -> Self {
        Self {
            resolver,
            description: description.into(),
            data_sources: Vec::new(),
            templates: Vec::new(),
        }
    }

    pub fn network(&self) -> NetworkId {
        self.resolver.current_network()
    }

    /// Add one data source per deployment of `contract` on the active network.
    ///
    /// Returns how many deployments were found.
    pub fn add_deployments(
        &mut self,
        market: &str,
        contract: &str,
        abi: &str,
        mapping: &Mapping,
    ) -> Result<usize, ManifestError> {
        let deployments = self.resolver.deployments_for(contract)?;
        let count = deployments.len();

        for data_source in
            indexed_data_sources(market, contract, abi, self.network(), &deployments, mapping)
        {
            self.add_data_source(data_source)?;
        }

        Ok(count)
    }

    pub fn add_data_source(&mut self, data_source: DataSourceManifest) -> Result<(), ManifestError> {
        match self.data_sources.iter().find(|ds| ds.name == data_source.name) {
            Some(existing) if *existing == data_source => Ok(()),
            Some(_) => Err(ManifestError::DuplicateDataSource(data_source.name)),
            None => {
                self.data_sources.push(data_source);
                Ok(())
            }
        }
    }

    pub fn add_template(&mut self, template: TemplateManifest) -> Result<(), ManifestError> {
        match self.templates.iter().find(|t| t.name == template.name) {
            Some(existing) if *existing == template => Ok(()),
            Some(_) => Err(ManifestError::DuplicateTemplate(template.name)),
            None => {
                self.templates.push(template);
                Ok(())
            }
        }
    }

    /// Finish the document, validating name uniqueness.
    pub fn build(self) -> Result<ManifestDocument, ManifestError> {
        let document = ManifestDocument {
            spec_version: SPEC_VERSION.to_string(),
            description: self.description,
            repository: Some(REPOSITORY.to_string()),
            schema: SchemaRef {
                file: SCHEMA_FILE.to_string(),
            },
            data_sources: self.data_sources,
            templates: self.templates,
        };

        document.validate()?;

        tracing::debug!(
            network = %self.resolver.current_network(),
            data_sources = document.data_sources.len(),
            templates = document.templates.len(),
            "Built manifest document"
        );

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NetworkContext, StaticDeploymentRecords};

    const A: &str = "0x0000000000000000000000000000000000000001";
    const B: &str = "0x0000000000000000000000000000000000000002";
    const C: &str = "0x0000000000000000000000000000000000000003";

    fn mapping() -> Mapping {
        MappingBuilder::new("../src/futures.ts")
            .entity("FuturesMarket")
            .abi("FuturesMarketManager")
            .handler("MarketRemoved(address,indexed bytes32,indexed bytes32)", "handleMarketRemoved")
            .build()
    }

    #[test]
    fn test_one_data_source_per_deployment_in_record_order() {
        let records = StaticDeploymentRecords::new()
            .with_deployment(NetworkId::Optimism, "FuturesMarketManager", A, 30)
            .with_deployment(NetworkId::Optimism, "FuturesMarketManager", B, 10)
            .with_deployment(NetworkId::Optimism, "FuturesMarketManager", C, 20);
        let resolver = NetworkResolver::new(NetworkContext::new(NetworkId::Optimism), records);

        let mut builder = ManifestBuilder::new(&resolver, "test");
        let count = builder
            .add_deployments("futures", "FuturesMarketManager", "FuturesMarketManager", &mapping())
            .unwrap();
        let document = builder.build().unwrap();

        assert_eq!(count, 3);
        let names: Vec<_> = document.data_sources.iter().map(|ds| ds.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "futures_FuturesMarketManager_0",
                "futures_FuturesMarketManager_1",
                "futures_FuturesMarketManager_2"
            ]
        );
        let blocks: Vec<_> = document
            .data_sources
            .iter()
            .map(|ds| ds.source.start_block)
            .collect();
        assert_eq!(blocks, [30, 10, 20]);
        assert!(document.data_sources.iter().all(|ds| ds.network == NetworkId::Optimism));
    }

    #[test]
    fn test_identical_entries_are_merged_and_conflicts_rejected() {
        let resolver = NetworkResolver::new(
            NetworkContext::new(NetworkId::Optimism),
            StaticDeploymentRecords::new(),
        );
        let mut builder = ManifestBuilder::new(&resolver, "test");

        let first = template("FuturesMarket", "FuturesMarket", NetworkId::Optimism, mapping());
        builder.add_template(first.clone()).unwrap();
        builder.add_template(first).unwrap();

        let other = template("FuturesMarket", "PerpsV2MarketProxyable", NetworkId::Optimism, mapping());
        assert!(matches!(
            builder.add_template(other),
            Err(ManifestError::DuplicateTemplate(name)) if name == "FuturesMarket"
        ));

        assert_eq!(builder.build().unwrap().templates.len(), 1);
    }

    #[test]
    fn test_duplicate_handler_names_are_rejected() {
        let resolver = NetworkResolver::new(
            NetworkContext::new(NetworkId::Optimism),
            StaticDeploymentRecords::new(),
        );
        let mut builder = ManifestBuilder::new(&resolver, "test");
        let mapping = MappingBuilder::new("../src/futures.ts")
            .handler("MarketAdded(address,indexed bytes32,indexed bytes32)", "handleMarket")
            .handler("MarketRemoved(address,indexed bytes32,indexed bytes32)", "handleMarket")
            .build();
        builder
            .add_template(template("FuturesMarket", "FuturesMarket", NetworkId::Optimism, mapping))
            .unwrap();

        assert!(matches!(
            builder.build(),
            Err(ManifestError::DuplicateHandler { handler, .. }) if handler == "handleMarket"
        ));
    }
}
