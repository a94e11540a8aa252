//! Static per-network addresses of singleton contracts that have no registry.

use alloy_core::primitives::{Address, address};

use crate::{ContractDeployment, NetworkId};

/// Cross-margin account factory on Optimism mainnet.
pub const OP_MAINNET_CROSSMARGIN_ADDRESS: Address =
    address!("8e43BF1910ad1461EEe0Daca10547c7e6d9D2f36");
/// Cross-margin account factory on Optimism Goerli.
pub const OP_GOERLI_CROSSMARGIN_ADDRESS: Address =
    address!("9320170B37eDEb4f41cb6E5A8F82B984aD9c44eE");

/// Network whose factory is indexed on networks without their own factory.
pub const CROSSMARGIN_FALLBACK_NETWORK: NetworkId = NetworkId::OptimismGoerli;

/// How an address was picked from a per-network table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressResolution {
    /// The table has an entry for the requested network.
    Exact,
    /// The requested network has no entry, the address of this network is used instead.
    Fallback(NetworkId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub deployment: ContractDeployment,
    pub resolution: AddressResolution,
}

impl ResolvedAddress {
    const fn exact(address: Address) -> Self {
        Self {
            deployment: ContractDeployment {
                address,
                start_block: 0,
            },
            resolution: AddressResolution::Exact,
        }
    }

    const fn fallback(address: Address, from: NetworkId) -> Self {
        Self {
            deployment: ContractDeployment {
                address,
                start_block: 0,
            },
            resolution: AddressResolution::Fallback(from),
        }
    }
}

/// Address of the margin account factory for `network`.
///
/// Optimism and Optimism Goerli have their own factory. Every other network
/// falls back to the [`CROSSMARGIN_FALLBACK_NETWORK`] factory. Indexing starts
/// at block 0 on every network.
pub fn margin_account_factory(network: NetworkId) -> ResolvedAddress {
    let resolved = match network {
        NetworkId::Optimism => ResolvedAddress::exact(OP_MAINNET_CROSSMARGIN_ADDRESS),
        NetworkId::OptimismGoerli => ResolvedAddress::exact(OP_GOERLI_CROSSMARGIN_ADDRESS),
        NetworkId::Mainnet | NetworkId::Kovan | NetworkId::OptimismKovan => {
            ResolvedAddress::fallback(OP_GOERLI_CROSSMARGIN_ADDRESS, CROSSMARGIN_FALLBACK_NETWORK)
        }
    };

    if let AddressResolution::Fallback(from) = resolved.resolution {
        tracing::warn!(
            %network,
            fallback = %from,
            address = %resolved.deployment.address,
            "No margin account factory on network, using fallback address"
        );
    }

    resolved
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_exact_addresses() {
        assert_eq!(
            margin_account_factory(NetworkId::Optimism),
            ResolvedAddress::exact(OP_MAINNET_CROSSMARGIN_ADDRESS)
        );
        assert_eq!(
            margin_account_factory(NetworkId::OptimismGoerli).resolution,
            AddressResolution::Exact
        );
    }

    #[test]
    fn test_every_network_resolves_to_a_non_zero_address() {
        for network in NetworkId::iter() {
            let resolved = margin_account_factory(network);
            assert_ne!(resolved.deployment.address, Address::ZERO, "{network}");
        }
    }

    #[test]
    fn test_fallback_is_explicit() {
        let resolved = margin_account_factory(NetworkId::Mainnet);
        assert_eq!(
            resolved.resolution,
            AddressResolution::Fallback(NetworkId::OptimismGoerli)
        );
        assert_eq!(resolved.deployment.address, OP_GOERLI_CROSSMARGIN_ADDRESS);
    }
}
