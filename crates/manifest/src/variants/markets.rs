//! Mapping and template definitions shared by the market families.

use crate::{MappingBuilder, Mapping, NetworkId, TemplateManifest, builder::template};

use super::HandlerBindings;

pub(super) const MARKET: &str = "futures";
pub(super) const MANAGER_CONTRACT: &str = "FuturesMarketManager";
pub(super) const FUTURES_FILE: &str = "../src/futures.ts";
pub(super) const CROSSMARGIN_FILE: &str = "../src/crossmargin.ts";

pub const MARKET_ADDED_EVENT: &str = "MarketAdded(address,indexed bytes32,indexed bytes32)";
pub const MARKET_REMOVED_EVENT: &str = "MarketRemoved(address,indexed bytes32,indexed bytes32)";

const MARKET_ENTITIES: [&str; 3] = ["FuturesMarket", "FuturesPosition", "FuturesTrade"];

const MARGIN_TRANSFERRED: &str = "MarginTransferred(indexed address,int256)";
const POSITION_MODIFIED: &str =
    "PositionModified(indexed uint256,indexed address,uint256,int256,int256,uint256,uint256,uint256)";

/// Mapping of the market manager, whose `MarketAdded` events spawn markets.
pub(super) fn manager_mapping(bindings: &HandlerBindings) -> Mapping {
    MappingBuilder::new(FUTURES_FILE)
        .entity("FuturesMarket")
        .abi("FuturesMarket")
        .abi(MANAGER_CONTRACT)
        .handler(MARKET_ADDED_EVENT, bindings.market_added)
        .handler(MARKET_REMOVED_EVENT, bindings.market_removed)
        .build()
}

/// Mapping of a v1 futures market.
pub(super) fn futures_market_mapping() -> Mapping {
    MappingBuilder::new(FUTURES_FILE)
        .entities(MARKET_ENTITIES)
        .abi("FuturesMarket")
        .handler(MARGIN_TRANSFERRED, "handleMarginTransferred")
        .handler(POSITION_MODIFIED, "handlePositionModified")
        .handler(
            "PositionLiquidated(indexed uint256,indexed address,indexed address,int256,uint256,uint256)",
            "handlePositionLiquidated",
        )
        .handler("FundingRecomputed(int256,uint256,uint256)", "handleFundingRecomputed")
        .handler(
            "NextPriceOrderSubmitted(indexed address,int256,uint256,uint256,uint256,bytes32)",
            "handleNextPriceOrderSubmitted",
        )
        .handler(
            "NextPriceOrderRemoved(indexed address,uint256,int256,uint256,uint256,uint256,bytes32)",
            "handleNextPriceOrderRemoved",
        )
        .build()
}

pub(super) fn futures_market_template(network: NetworkId) -> TemplateManifest {
    template("FuturesMarket", "FuturesMarket", network, futures_market_mapping())
}

/// Template of a v2 perps market proxy.
///
/// `PositionLiquidated` carries no `indexed` qualifiers on the v2 ABI.
pub(super) fn perps_market_template(network: NetworkId) -> TemplateManifest {
    let mapping = MappingBuilder::new(FUTURES_FILE)
        .entities(MARKET_ENTITIES)
        .abi("PerpsV2MarketProxyable")
        .handler(MARGIN_TRANSFERRED, "handleMarginTransferred")
        .handler(POSITION_MODIFIED, "handlePositionModified")
        .handler(
            "PositionLiquidated(uint256,address,address,int256,uint256,uint256)",
            "handlePositionLiquidated",
        )
        .handler(
            "DelayedOrderSubmitted(indexed address,bool,int256,uint256,uint256,uint256,uint256,uint256,bytes32)",
            "handleDelayedOrderSubmitted",
        )
        .handler(
            "DelayedOrderRemoved(indexed address,bool,uint256,int256,uint256,uint256,uint256,bytes32)",
            "handleDelayedOrderRemoved",
        )
        .build();

    template("PerpsMarket", "PerpsV2MarketProxyable", network, mapping)
}

/// Template of a cross-margin account created by the factory.
pub(super) fn margin_base_template(network: NetworkId) -> TemplateManifest {
    let mapping = MappingBuilder::new(CROSSMARGIN_FILE)
        .entity("MarginBase")
        .abi("MarginBase")
        .build();

    template("MarginBase", "MarginBase", network, mapping)
}

pub(super) fn crossmargin_factory_mapping() -> Mapping {
    MappingBuilder::new(CROSSMARGIN_FILE)
        .entity("MarginAccountFactory")
        .abi("MarginAccountFactory")
        .handler("NewAccount(indexed address,address)", "handleNewAccount")
        .build()
}
