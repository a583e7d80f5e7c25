use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{AssetId, DirectoryId};
use crate::normalize::normalize;

/// An ordered collection of asset references.
///
/// Membership is significant and strictly ordered; the same asset never
/// appears twice. Directories reference assets, they do not own them:
/// deleting a directory leaves its members untouched.
///
/// All mutation goes through the ordering service, which maintains the
/// no-duplicate and contiguous-index invariants;
/// [`assets_mut`](Directory::assets_mut) hands it the live sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Directory {
    id: DirectoryId,
    name: Option<String>,
    assets: Vec<AssetId>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl Directory {
    /// Create an empty directory. The id stays nil until the record
    /// store assigns one.
    pub fn new<S: AsRef<str>>(name: Option<S>, now: DateTime<Utc>) -> Self {
        Self {
            id: DirectoryId::nil(),
            name: normalize(name),
            assets: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn id(&self) -> DirectoryId {
        self.id
    }

    pub fn assign_id(&mut self, id: DirectoryId) {
        self.id = id;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name<S: AsRef<str>>(&mut self, name: Option<S>) {
        self.name = normalize(name);
    }

    /// The ordered member sequence.
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Live access to the member sequence for the ordering service.
    pub fn assets_mut(&mut self) -> &mut Vec<AssetId> {
        &mut self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.assets.contains(asset)
    }

    /// Index of the given member, if present.
    pub fn index_of(&self, asset: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.modified_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_directory_is_empty() {
        let dir = Directory::new(Some("gallery"), Utc::now());
        assert!(dir.is_empty());
        assert_eq!(dir.len(), 0);
        assert!(dir.id().is_nil());
        assert_eq!(dir.name(), Some("gallery"));
    }

    #[test]
    fn name_is_normalized() {
        let dir = Directory::new(Some("  "), Utc::now());
        assert_eq!(dir.name(), None);
    }

    #[test]
    fn index_of_finds_members() {
        let mut dir = Directory::new(None::<&str>, Utc::now());
        let a = AssetId::generate();
        let b = AssetId::generate();
        dir.assets_mut().push(a);
        dir.assets_mut().push(b);

        assert_eq!(dir.index_of(&a), Some(0));
        assert_eq!(dir.index_of(&b), Some(1));
        assert_eq!(dir.index_of(&AssetId::generate()), None);
        assert!(dir.contains(&a));
    }

    #[test]
    fn serde_roundtrip_preserves_order() {
        let mut dir = Directory::new(Some("ordered"), Utc::now());
        let ids: Vec<AssetId> = (0..4).map(|_| AssetId::generate()).collect();
        dir.assets_mut().extend(ids.iter().copied());
        dir.assign_id(DirectoryId::generate());

        let json = serde_json::to_string(&dir).unwrap();
        let restored: Directory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.assets(), dir.assets());
        assert_eq!(restored.id(), dir.id());
    }
}
