use mediakeep_types::{AssetId, DirectoryId};

/// A lifecycle event published by the mediakeep services.
///
/// Pre-mutation events (`AssetCreate`, `DirectoryAddAsset`, ...) fire
/// before the change is applied; past-tense events fire after successful
/// persistence. Events carry identifiers, not entities -- subscribers
/// that need the full record load it themselves.
///
/// Pre-create events carry no id: the record store has not assigned one
/// yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaEvent {
    AssetCreate,
    AssetCreated { asset: AssetId },
    AssetUpdate { asset: AssetId },
    AssetUpdated { asset: AssetId },
    AssetDelete { asset: AssetId },
    AssetDeleted { asset: AssetId },
    AssetExpired { asset: AssetId },
    AssetUnexpired { asset: AssetId },
    DirectoryAddAsset { directory: DirectoryId, asset: AssetId },
    DirectoryAddedAsset { directory: DirectoryId, asset: AssetId, index: usize },
    DirectoryRemoveAsset { directory: DirectoryId, asset: AssetId },
    DirectoryRemovedAsset { directory: DirectoryId, asset: AssetId },
    DirectoryPreSetAsset { directory: DirectoryId, asset: AssetId },
    DirectoryPostSetAsset { directory: DirectoryId, asset: AssetId, index: usize },
}

impl MediaEvent {
    /// Short name for log output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AssetCreate => "asset.create",
            Self::AssetCreated { .. } => "asset.created",
            Self::AssetUpdate { .. } => "asset.update",
            Self::AssetUpdated { .. } => "asset.updated",
            Self::AssetDelete { .. } => "asset.delete",
            Self::AssetDeleted { .. } => "asset.deleted",
            Self::AssetExpired { .. } => "asset.expired",
            Self::AssetUnexpired { .. } => "asset.unexpired",
            Self::DirectoryAddAsset { .. } => "directory.add_asset",
            Self::DirectoryAddedAsset { .. } => "directory.added_asset",
            Self::DirectoryRemoveAsset { .. } => "directory.remove_asset",
            Self::DirectoryRemovedAsset { .. } => "directory.removed_asset",
            Self::DirectoryPreSetAsset { .. } => "directory.pre_set_asset",
            Self::DirectoryPostSetAsset { .. } => "directory.post_set_asset",
        }
    }
}

impl std::fmt::Display for MediaEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
