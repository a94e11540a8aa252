//! Futures v1 market family.

use crate::{
    DeploymentRecords, ManifestBuilder, ManifestError, addresses::margin_account_factory,
    builder::single_data_source,
};

use super::{
    HandlerBindings,
    markets::{
        MANAGER_CONTRACT, MARKET, crossmargin_factory_mapping, futures_market_mapping,
        futures_market_template, manager_mapping, margin_base_template, perps_market_template,
    },
};

/// Assets whose v1 markets are published as named deployments (`FuturesMarket<asset>`).
pub const STATIC_MARKET_ASSETS: &[&str] = &["BTC", "ETH", "LINK"];

pub(super) fn populate<R: DeploymentRecords>(
    builder: &mut ManifestBuilder<'_, R>,
    bindings: &HandlerBindings,
) -> Result<(), ManifestError> {
    let network = builder.network();

    let managers =
        builder.add_deployments(MARKET, MANAGER_CONTRACT, MANAGER_CONTRACT, &manager_mapping(bindings))?;

    let market_mapping = futures_market_mapping();
    let mut static_markets = 0;
    for asset in STATIC_MARKET_ASSETS {
        let contract = format!("FuturesMarket{asset}");
        static_markets += builder.add_deployments(MARKET, &contract, "FuturesMarket", &market_mapping)?;
    }

    let factory = margin_account_factory(network);
    builder.add_data_source(single_data_source(
        "crossmargin_factory",
        "MarginAccountFactory",
        network,
        factory.deployment,
        crossmargin_factory_mapping(),
    ))?;

    builder.add_template(margin_base_template(network))?;
    builder.add_template(futures_market_template(network))?;
    builder.add_template(perps_market_template(network))?;

    tracing::debug!(%network, managers, static_markets, "Populated futures market family");

    Ok(())
}
