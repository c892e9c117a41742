//! Asset deletion with dedup feedback.

use tracing::info;

use super::registry::RegistryStore;
use super::types::AcquisitionError;
use crate::library::{Asset, AssetSource, LibraryIndex};

/// Delete an asset. A stock asset's catalog ID is forgotten first so bulk
/// acquisition never downloads it again.
pub fn remove_asset(
    library: &dyn LibraryIndex,
    registry: &RegistryStore,
    id: &str,
) -> Result<Asset, AcquisitionError> {
    let asset = library.get(id)?;

    if asset.source == AssetSource::Stock {
        if let Some(external_id) = &asset.external_id {
            registry.forget(external_id)?;
            info!(asset_id = %id, external_id = %external_id, "Stock ID forgotten");
        }
    }

    let removed = library.remove(id)?;
    info!(asset_id = %id, path = %removed.path, "Asset removed");
    Ok(removed)
}
