//! Contract deployment records and the resolver that serves them for the active network.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy_core::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{InvalidDeploymentRecordError, NetworkContext, NetworkId};

/// One on-chain deployment of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDeployment {
    pub address: Address,
    pub start_block: u64,
}

/// A deployment entry as published by the deployment package, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_block: Option<i64>,
}

impl DeploymentRecord {
    pub fn new(address: impl Into<String>, start_block: i64) -> Self {
        Self {
            address: Some(address.into()),
            start_block: Some(start_block),
        }
    }

    /// Validate the record into a [`ContractDeployment`].
    pub fn validate(
        &self,
        contract: &str,
        network: NetworkId,
        index: usize,
    ) -> Result<ContractDeployment, InvalidDeploymentRecordError> {
        let raw = self
            .address
            .as_deref()
            .filter(|address| !address.trim().is_empty())
            .ok_or_else(|| InvalidDeploymentRecordError::MissingAddress {
                contract: contract.to_string(),
                network,
                index,
            })?;

        let address = raw.trim().parse::<Address>().map_err(|err| {
            InvalidDeploymentRecordError::MalformedAddress {
                contract: contract.to_string(),
                network,
                index,
                address: raw.to_string(),
                reason: err.to_string(),
            }
        })?;

        let raw_block = self.start_block.ok_or_else(|| {
            InvalidDeploymentRecordError::MissingStartBlock {
                contract: contract.to_string(),
                network,
                index,
            }
        })?;
        let start_block = u64::try_from(raw_block).map_err(|_| {
            InvalidDeploymentRecordError::NegativeStartBlock {
                contract: contract.to_string(),
                network,
                index,
                start_block: raw_block,
            }
        })?;

        Ok(ContractDeployment {
            address,
            start_block,
        })
    }
}

/// All deployment records for a single network, keyed by contract name.
///
/// The order of the records of one contract is the order they were published in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecords {
    #[serde(default)]
    pub contracts: BTreeMap<String, Vec<DeploymentRecord>>,
}

impl NetworkRecords {
    /// Validated deployments of `contract`, empty when the contract is unknown.
    pub fn deployments_for(
        &self,
        contract: &str,
        network: NetworkId,
    ) -> Result<Vec<ContractDeployment>, InvalidDeploymentRecordError> {
        self.contracts
            .get(contract)
            .map(|records| {
                records
                    .iter()
                    .enumerate()
                    .map(|(index, record)| record.validate(contract, network, index))
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Source of per-network contract deployment records.
pub trait DeploymentRecords {
    /// Deployments of `contract` on `network`, in publication order.
    ///
    /// A contract that was never deployed on `network` yields an empty list.
    fn deployments_for(
        &self,
        contract: &str,
        network: NetworkId,
    ) -> Result<Vec<ContractDeployment>, InvalidDeploymentRecordError>;
}

impl<T: DeploymentRecords + ?Sized> DeploymentRecords for &T {
    fn deployments_for(
        &self,
        contract: &str,
        network: NetworkId,
    ) -> Result<Vec<ContractDeployment>, InvalidDeploymentRecordError> {
        (**self).deployments_for(contract, network)
    }
}

/// Deployment records read from `<dir>/<network>.json`.
#[derive(Debug, Clone)]
pub struct FileDeploymentRecords {
    dir: PathBuf,
}

impl FileDeploymentRecords {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the records file for `network`.
    pub fn path_for(&self, network: NetworkId) -> PathBuf {
        self.dir.join(format!("{network}.json"))
    }

    /// Load the records of `network`. A missing file means no deployments.
    pub fn load(&self, network: NetworkId) -> Result<NetworkRecords, InvalidDeploymentRecordError> {
        let path = self.path_for(network);

        if !path.exists() {
            tracing::debug!(path = %path.display(), %network, "No deployment records for network");
            return Ok(NetworkRecords::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| {
            InvalidDeploymentRecordError::Unreadable {
                path: path.clone(),
                source,
            }
        })?;

        serde_json::from_str(&content)
            .map_err(|source| InvalidDeploymentRecordError::Unparsable { path, source })
    }
}

impl DeploymentRecords for FileDeploymentRecords {
    fn deployments_for(
        &self,
        contract: &str,
        network: NetworkId,
    ) -> Result<Vec<ContractDeployment>, InvalidDeploymentRecordError> {
        self.load(network)?.deployments_for(contract, network)
    }
}

/// In-memory deployment records.
#[derive(Debug, Clone, Default)]
pub struct StaticDeploymentRecords {
    networks: BTreeMap<NetworkId, NetworkRecords>,
}

impl StaticDeploymentRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record for `contract` on `network`.
    pub fn with_record(
        mut self,
        network: NetworkId,
        contract: impl Into<String>,
        record: DeploymentRecord,
    ) -> Self {
        self.networks
            .entry(network)
            .or_default()
            .contracts
            .entry(contract.into())
            .or_default()
            .push(record);
        self
    }

    /// Append a well-formed deployment for `contract` on `network`.
    pub fn with_deployment(
        self,
        network: NetworkId,
        contract: impl Into<String>,
        address: impl Into<String>,
        start_block: i64,
    ) -> Self {
        self.with_record(network, contract, DeploymentRecord::new(address, start_block))
    }
}

impl DeploymentRecords for StaticDeploymentRecords {
    fn deployments_for(
        &self,
        contract: &str,
        network: NetworkId,
    ) -> Result<Vec<ContractDeployment>, InvalidDeploymentRecordError> {
        match self.networks.get(&network) {
            Some(records) => records.deployments_for(contract, network),
            None => Ok(Vec::new()),
        }
    }
}

/// Serves deployments of the active network.
#[derive(Debug, Clone)]
pub struct NetworkResolver<R> {
    context: NetworkContext,
    records: R,
}

impl<R: DeploymentRecords> NetworkResolver<R> {
    pub fn new(context: NetworkContext, records: R) -> Self {
        Self { context, records }
    }

    pub fn current_network(&self) -> NetworkId {
        self.context.network()
    }

    pub fn deployments_for(
        &self,
        contract: &str,
    ) -> Result<Vec<ContractDeployment>, InvalidDeploymentRecordError> {
        let deployments = self
            .records
            .deployments_for(contract, self.current_network())?;

        tracing::debug!(
            contract,
            network = %self.current_network(),
            count = deployments.len(),
            "Resolved contract deployments"
        );

        Ok(deployments)
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    const MANAGER: &str = "0xc704c9AA89d1ca60F67B3075d05fBb92b3B00B3B";

    #[test]
    fn test_unknown_contract_has_no_deployments() {
        let records = StaticDeploymentRecords::new().with_deployment(
            NetworkId::Optimism,
            "FuturesMarketManager",
            MANAGER,
            10,
        );
        let resolver =
            NetworkResolver::new(NetworkContext::new(NetworkId::OptimismGoerli), &records);

        assert!(resolver.deployments_for("FuturesMarketManager").unwrap().is_empty());
        assert!(resolver.deployments_for("Nothing").unwrap().is_empty());
    }

    #[test]
    fn test_missing_address_is_rejected() {
        let records = StaticDeploymentRecords::new().with_record(
            NetworkId::Optimism,
            "FuturesMarketManager",
            DeploymentRecord {
                address: None,
                start_block: Some(1),
            },
        );

        let err = records
            .deployments_for("FuturesMarketManager", NetworkId::Optimism)
            .unwrap_err();
        assert!(matches!(
            err,
            InvalidDeploymentRecordError::MissingAddress { index: 0, .. }
        ));
    }

    #[test]
    fn test_missing_start_block_is_rejected() {
        let dir = TempDir::new("subgrapher-records").unwrap();
        std::fs::write(
            dir.path().join("optimism.json"),
            r#"{ "contracts": { "FuturesMarketManager": [ { "address": "0xc704c9AA89d1ca60F67B3075d05fBb92b3B00B3B" } ] } }"#,
        )
        .unwrap();

        let err = FileDeploymentRecords::new(dir.path())
            .deployments_for("FuturesMarketManager", NetworkId::Optimism)
            .unwrap_err();
        assert!(matches!(
            err,
            InvalidDeploymentRecordError::MissingStartBlock { index: 0, .. }
        ));
    }

    #[test]
    fn test_negative_start_block_is_rejected() {
        let records = StaticDeploymentRecords::new()
            .with_deployment(NetworkId::Optimism, "FuturesMarketManager", MANAGER, 5)
            .with_deployment(NetworkId::Optimism, "FuturesMarketManager", MANAGER, -1);

        let err = records
            .deployments_for("FuturesMarketManager", NetworkId::Optimism)
            .unwrap_err();
        assert!(matches!(
            err,
            InvalidDeploymentRecordError::NegativeStartBlock {
                index: 1,
                start_block: -1,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_address_is_rejected() {
        let records = StaticDeploymentRecords::new().with_deployment(
            NetworkId::Optimism,
            "FuturesMarketManager",
            "0x1234",
            0,
        );

        let err = records
            .deployments_for("FuturesMarketManager", NetworkId::Optimism)
            .unwrap_err();
        assert!(matches!(err, InvalidDeploymentRecordError::MalformedAddress { .. }));
    }

    #[test]
    fn test_file_records_keep_publication_order() {
        let dir = TempDir::new("subgrapher-records").unwrap();
        std::fs::write(
            dir.path().join("optimism.json"),
            r#"{
                "contracts": {
                    "FuturesMarketManager": [
                        { "address": "0xc704c9AA89d1ca60F67B3075d05fBb92b3B00B3B", "startBlock": 300 },
                        { "address": "0xdb89f3fc45A707Dd49781495f77f8ae69bF5cA6e", "startBlock": 100 }
                    ]
                }
            }"#,
        )
        .unwrap();

        let records = FileDeploymentRecords::new(dir.path());
        let deployments = records
            .deployments_for("FuturesMarketManager", NetworkId::Optimism)
            .unwrap();

        assert_eq!(deployments.len(), 2);
        assert_eq!(deployments[0].start_block, 300);
        assert_eq!(deployments[1].start_block, 100);

        // No file for the network at all.
        assert!(records
            .deployments_for("FuturesMarketManager", NetworkId::Kovan)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unparsable_file_is_rejected() {
        let dir = TempDir::new("subgrapher-records").unwrap();
        std::fs::write(dir.path().join("optimism.json"), "{ not json").unwrap();

        let err = FileDeploymentRecords::new(dir.path())
            .deployments_for("FuturesMarketManager", NetworkId::Optimism)
            .unwrap_err();
        assert!(matches!(err, InvalidDeploymentRecordError::Unparsable { .. }));
    }
}
