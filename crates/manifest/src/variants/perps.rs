//! Perps v2 market family.

use crate::{DeploymentRecords, ManifestBuilder, ManifestError};

use super::{
    HandlerBindings,
    markets::{MANAGER_CONTRACT, MARKET, manager_mapping, perps_market_template},
};

pub(super) fn populate<R: DeploymentRecords>(
    builder: &mut ManifestBuilder<'_, R>,
    bindings: &HandlerBindings,
) -> Result<(), ManifestError> {
    let network = builder.network();

    builder.add_deployments(MARKET, MANAGER_CONTRACT, MANAGER_CONTRACT, &manager_mapping(bindings))?;
    builder.add_template(perps_market_template(network))?;

    Ok(())
}
