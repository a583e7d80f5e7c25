//! [`Record`] implementations for the mediakeep entities.

use mediakeep_types::{Asset, AssetId, Directory, DirectoryId};

use crate::traits::Record;

impl Record for Asset {
    type Id = AssetId;

    fn id(&self) -> AssetId {
        Asset::id(self)
    }

    fn has_id(&self) -> bool {
        !Asset::id(self).is_nil()
    }

    fn assign_fresh_id(&mut self) {
        self.assign_id(AssetId::generate());
    }
}

impl Record for Directory {
    type Id = DirectoryId;

    fn id(&self) -> DirectoryId {
        Directory::id(self)
    }

    fn has_id(&self) -> bool {
        !Directory::id(self).is_nil()
    }

    fn assign_fresh_id(&mut self) {
        self.assign_id(DirectoryId::generate());
    }
}
