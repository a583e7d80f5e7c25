use std::sync::Arc;

use chrono::Utc;
use tracing::trace;

use mediakeep_events::{EventBus, MediaEvent};
use mediakeep_record::{RecordError, RecordStore};
use mediakeep_types::{Asset, AssetId, Directory, DirectoryId};

use crate::error::DirectoryError;

impl From<RecordError> for DirectoryError {
    fn from(e: RecordError) -> Self {
        DirectoryError::Persistence(e)
    }
}

/// Target position for [`DirectoryService::add_asset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    /// Append after the current last member.
    End,
    /// Insert at the given index, shifting later members right.
    At(usize),
}

/// The directory ordering service.
///
/// Holds the directory and asset record stores plus the event bus;
/// every mutation runs in one transaction against the directory store,
/// which serializes operations racing on the same sequence.
pub struct DirectoryService<D, A> {
    directories: Arc<D>,
    assets: Arc<A>,
    events: Arc<EventBus>,
}

impl<D, A> DirectoryService<D, A>
where
    D: RecordStore<Directory>,
    A: RecordStore<Asset>,
{
    pub fn new(directories: Arc<D>, assets: Arc<A>, events: Arc<EventBus>) -> Self {
        Self {
            directories,
            assets,
            events,
        }
    }

    /// Create an empty directory.
    pub fn create(&self, name: Option<&str>) -> Result<Directory, DirectoryError> {
        let directory = Directory::new(name, Utc::now());
        self.directories
            .in_transaction(|tx| tx.create(directory))
            .map_err(DirectoryError::Persistence)
    }

    /// Read a directory by id.
    pub fn get(&self, id: DirectoryId) -> Result<Directory, DirectoryError> {
        self.directories
            .read(id)
            .map_err(|e| DirectoryError::from_directory_record(id, e))
    }

    /// Delete a directory.
    ///
    /// Membership is reference, not ownership: the member assets are left
    /// untouched.
    pub fn delete(&self, id: DirectoryId) -> Result<(), DirectoryError> {
        self.directories
            .in_transaction(|tx| tx.delete(id))
            .map_err(|e| DirectoryError::from_directory_record(id, e))
    }

    /// Insert an asset into the ordered member sequence.
    ///
    /// [`Position::End`] appends; [`Position::At`] inserts before the
    /// member currently at that index. Adding an asset that is already a
    /// member is rejected. Returns the index the asset ended up at.
    pub fn add_asset(
        &self,
        directory_id: DirectoryId,
        asset_id: AssetId,
        position: Position,
    ) -> Result<usize, DirectoryError> {
        self.assets
            .reference(asset_id)
            .map_err(|e| DirectoryError::from_asset_record(asset_id, e))?;

        self.events.publish(&MediaEvent::DirectoryAddAsset {
            directory: directory_id,
            asset: asset_id,
        });

        let index = self.directories.in_transaction(|tx| {
            let mut directory = tx
                .read(directory_id)
                .map_err(|e| DirectoryError::from_directory_record(directory_id, e))?;

            if directory.contains(&asset_id) {
                return Err(DirectoryError::Duplicate {
                    directory: directory_id,
                    asset: asset_id,
                });
            }

            let assets = directory.assets_mut();
            let index = match position {
                Position::End => {
                    assets.push(asset_id);
                    assets.len() - 1
                }
                Position::At(index) => {
                    if index > assets.len() {
                        return Err(DirectoryError::IndexOutOfBounds {
                            index,
                            len: assets.len(),
                        });
                    }
                    assets.insert(index, asset_id);
                    index
                }
            };

            directory.touch(Utc::now());
            tx.update(directory)?;
            Ok(index)
        })?;

        self.events.publish(&MediaEvent::DirectoryAddedAsset {
            directory: directory_id,
            asset: asset_id,
            index,
        });
        Ok(index)
    }

    /// Remove an asset from the member sequence.
    ///
    /// Removing an asset that is not a member reports
    /// [`DirectoryError::NotMember`] rather than silently succeeding.
    pub fn remove_asset(
        &self,
        directory_id: DirectoryId,
        asset_id: AssetId,
    ) -> Result<(), DirectoryError> {
        self.events.publish(&MediaEvent::DirectoryRemoveAsset {
            directory: directory_id,
            asset: asset_id,
        });

        self.directories.in_transaction(|tx| {
            let mut directory = tx
                .read(directory_id)
                .map_err(|e| DirectoryError::from_directory_record(directory_id, e))?;

            let index = directory
                .index_of(&asset_id)
                .ok_or(DirectoryError::NotMember {
                    directory: directory_id,
                    asset: asset_id,
                })?;

            directory.assets_mut().remove(index);
            directory.touch(Utc::now());
            tx.update(directory)?;
            Ok::<(), DirectoryError>(())
        })?;

        self.events.publish(&MediaEvent::DirectoryRemovedAsset {
            directory: directory_id,
            asset: asset_id,
        });
        Ok(())
    }

    /// Move a member to `new_index` by minimal rotation.
    ///
    /// Only the contiguous span between the current and the new position
    /// shifts, by exactly one slot toward the vacated end; every other
    /// member keeps its index. Moving a member onto its current index is
    /// a no-op.
    pub fn set_asset_index(
        &self,
        directory_id: DirectoryId,
        asset_id: AssetId,
        new_index: usize,
    ) -> Result<(), DirectoryError> {
        self.events.publish(&MediaEvent::DirectoryPreSetAsset {
            directory: directory_id,
            asset: asset_id,
        });

        self.directories.in_transaction(|tx| {
            let mut directory = tx
                .read(directory_id)
                .map_err(|e| DirectoryError::from_directory_record(directory_id, e))?;

            let current = directory
                .index_of(&asset_id)
                .ok_or(DirectoryError::NotMember {
                    directory: directory_id,
                    asset: asset_id,
                })?;

            let len = directory.len();
            if new_index >= len {
                return Err(DirectoryError::IndexOutOfBounds {
                    index: new_index,
                    len,
                });
            }

            trace!(%directory_id, %asset_id, current, new_index, "setting member index");

            if current == new_index {
                trace!(%asset_id, "already at the requested index");
                return Ok(());
            }

            let assets = directory.assets_mut();
            if current < new_index {
                assets[current..=new_index].rotate_left(1);
            } else {
                assets[new_index..=current].rotate_right(1);
            }

            directory.touch(Utc::now());
            tx.update(directory)?;
            Ok(())
        })?;

        self.events.publish(&MediaEvent::DirectoryPostSetAsset {
            directory: directory_id,
            asset: asset_id,
            index: new_index,
        });
        Ok(())
    }
}

impl<D, A> std::fmt::Debug for DirectoryService<D, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediakeep_events::CountingSubscriber;
    use mediakeep_record::{InMemoryRecordStore, RecordTx};
    use mediakeep_types::AssetDraft;

    struct Fixture {
        assets: Arc<InMemoryRecordStore<Asset>>,
        subscriber: Arc<CountingSubscriber>,
        service: DirectoryService<InMemoryRecordStore<Directory>, InMemoryRecordStore<Asset>>,
    }

    fn fixture() -> Fixture {
        let directories = Arc::new(InMemoryRecordStore::new());
        let assets = Arc::new(InMemoryRecordStore::new());
        let events = Arc::new(EventBus::new());
        let subscriber = Arc::new(CountingSubscriber::new());
        events.subscribe(subscriber.clone());
        let service = DirectoryService::new(directories, assets.clone(), events);
        Fixture {
            assets,
            subscriber,
            service,
        }
    }

    fn persisted_asset(f: &Fixture) -> AssetId {
        f.assets
            .in_transaction(|tx: &mut dyn RecordTx<Asset>| {
                tx.create(AssetDraft::new().build(Utc::now()))
            })
            .unwrap()
            .id()
    }

    fn directory_with_members(f: &Fixture, count: usize) -> (DirectoryId, Vec<AssetId>) {
        let directory = f.service.create(Some("test")).unwrap();
        let members: Vec<AssetId> = (0..count).map(|_| persisted_asset(f)).collect();
        for member in &members {
            f.service
                .add_asset(directory.id(), *member, Position::End)
                .unwrap();
        }
        (directory.id(), members)
    }

    // -----------------------------------------------------------------------
    // Create / delete
    // -----------------------------------------------------------------------

    #[test]
    fn created_directory_is_empty() {
        let f = fixture();
        let directory = f.service.create(Some("gallery")).unwrap();
        assert!(directory.is_empty());
        assert!(!directory.id().is_nil());
    }

    #[test]
    fn delete_leaves_member_assets_alone() {
        let f = fixture();
        let (directory_id, members) = directory_with_members(&f, 2);
        f.service.delete(directory_id).unwrap();

        assert!(matches!(
            f.service.get(directory_id),
            Err(DirectoryError::NotFound(_))
        ));
        for member in members {
            assert!(f.assets.read(member).is_ok());
        }
    }

    // -----------------------------------------------------------------------
    // Add
    // -----------------------------------------------------------------------

    #[test]
    fn add_at_end_appends() {
        let f = fixture();
        let (directory_id, members) = directory_with_members(&f, 2);
        let extra = persisted_asset(&f);

        let index = f
            .service
            .add_asset(directory_id, extra, Position::End)
            .unwrap();
        assert_eq!(index, 2);

        let directory = f.service.get(directory_id).unwrap();
        assert_eq!(directory.assets(), &[members[0], members[1], extra]);
    }

    #[test]
    fn add_at_index_shifts_later_members() {
        let f = fixture();
        let (directory_id, members) = directory_with_members(&f, 2);
        let extra = persisted_asset(&f);

        let index = f
            .service
            .add_asset(directory_id, extra, Position::At(0))
            .unwrap();
        assert_eq!(index, 0);

        let directory = f.service.get(directory_id).unwrap();
        assert_eq!(directory.assets(), &[extra, members[0], members[1]]);
    }

    #[test]
    fn add_duplicate_is_rejected() {
        let f = fixture();
        let (directory_id, members) = directory_with_members(&f, 2);

        let err = f
            .service
            .add_asset(directory_id, members[0], Position::End)
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Duplicate { .. }));

        // Still exactly one entry for the member.
        let directory = f.service.get(directory_id).unwrap();
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn add_past_the_end_is_out_of_bounds() {
        let f = fixture();
        let (directory_id, _) = directory_with_members(&f, 2);
        let extra = persisted_asset(&f);

        let err = f
            .service
            .add_asset(directory_id, extra, Position::At(3))
            .unwrap_err();
        assert!(matches!(err, DirectoryError::IndexOutOfBounds { len: 2, .. }));
    }

    #[test]
    fn add_unknown_asset_is_rejected() {
        let f = fixture();
        let directory = f.service.create(None).unwrap();
        let err = f
            .service
            .add_asset(directory.id(), AssetId::generate(), Position::End)
            .unwrap_err();
        assert!(matches!(err, DirectoryError::AssetNotFound(_)));
    }

    #[test]
    fn add_emits_pre_and_post_events() {
        let f = fixture();
        let (directory_id, members) = directory_with_members(&f, 1);
        let added = f
            .subscriber
            .count_matching(|e| matches!(e, MediaEvent::DirectoryAddedAsset { .. }));
        assert_eq!(added, 1);
        assert_eq!(
            f.subscriber.received().last(),
            Some(&MediaEvent::DirectoryAddedAsset {
                directory: directory_id,
                asset: members[0],
                index: 0
            })
        );
    }

    // -----------------------------------------------------------------------
    // Remove
    // -----------------------------------------------------------------------

    #[test]
    fn remove_deletes_the_single_occurrence() {
        let f = fixture();
        let (directory_id, members) = directory_with_members(&f, 3);

        f.service.remove_asset(directory_id, members[1]).unwrap();
        let directory = f.service.get(directory_id).unwrap();
        assert_eq!(directory.assets(), &[members[0], members[2]]);
    }

    #[test]
    fn remove_absent_member_is_reported() {
        let f = fixture();
        let (directory_id, _) = directory_with_members(&f, 2);
        let stranger = persisted_asset(&f);

        let err = f
            .service
            .remove_asset(directory_id, stranger)
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotMember { .. }));
    }

    // -----------------------------------------------------------------------
    // Reposition
    // -----------------------------------------------------------------------

    #[test]
    fn move_right_rotates_the_span_left() {
        let f = fixture();
        let (directory_id, m) = directory_with_members(&f, 5);

        // [a,b,c,d,e]: moving b (index 1) to index 3 yields [a,c,d,b,e].
        f.service.set_asset_index(directory_id, m[1], 3).unwrap();
        let directory = f.service.get(directory_id).unwrap();
        assert_eq!(directory.assets(), &[m[0], m[2], m[3], m[1], m[4]]);
    }

    #[test]
    fn move_left_is_the_exact_inverse() {
        let f = fixture();
        let (directory_id, m) = directory_with_members(&f, 5);

        f.service.set_asset_index(directory_id, m[1], 3).unwrap();
        f.service.set_asset_index(directory_id, m[1], 1).unwrap();
        let directory = f.service.get(directory_id).unwrap();
        assert_eq!(directory.assets(), m.as_slice());
    }

    #[test]
    fn move_to_current_index_is_a_noop() {
        let f = fixture();
        let (directory_id, m) = directory_with_members(&f, 3);

        f.service.set_asset_index(directory_id, m[1], 1).unwrap();
        let directory = f.service.get(directory_id).unwrap();
        assert_eq!(directory.assets(), m.as_slice());
    }

    #[test]
    fn move_nonmember_is_a_state_error() {
        let f = fixture();
        let (directory_id, _) = directory_with_members(&f, 3);
        let stranger = persisted_asset(&f);

        let err = f
            .service
            .set_asset_index(directory_id, stranger, 0)
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotMember { .. }));
    }

    #[test]
    fn move_out_of_bounds_is_rejected() {
        let f = fixture();
        let (directory_id, m) = directory_with_members(&f, 3);

        let err = f
            .service
            .set_asset_index(directory_id, m[0], 3)
            .unwrap_err();
        assert!(matches!(err, DirectoryError::IndexOutOfBounds { len: 3, .. }));

        // The failed call must not have disturbed the order.
        let directory = f.service.get(directory_id).unwrap();
        assert_eq!(directory.assets(), m.as_slice());
    }

    #[test]
    fn move_emits_pre_and_post_set_events() {
        let f = fixture();
        let (directory_id, m) = directory_with_members(&f, 3);

        f.service.set_asset_index(directory_id, m[0], 2).unwrap();
        assert_eq!(
            f.subscriber
                .count_matching(|e| matches!(e, MediaEvent::DirectoryPreSetAsset { .. })),
            1
        );
        assert_eq!(
            f.subscriber.received().last(),
            Some(&MediaEvent::DirectoryPostSetAsset {
                directory: directory_id,
                asset: m[0],
                index: 2
            })
        );
    }

    // -----------------------------------------------------------------------
    // Rotation permutation property
    // -----------------------------------------------------------------------

    proptest::proptest! {
        #[test]
        fn rotation_shifts_exactly_the_span(
            len in 2usize..8,
            current_seed in 0usize..64,
            new_seed in 0usize..64,
        ) {
            let current = current_seed % len;
            let new = new_seed % len;

            let f = fixture();
            let (directory_id, m) = directory_with_members(&f, len);

            f.service.set_asset_index(directory_id, m[current], new).unwrap();
            let after = f.service.get(directory_id).unwrap().assets().to_vec();

            // The moved member lands exactly at the new index.
            proptest::prop_assert_eq!(after[new], m[current]);

            // Members outside the span are untouched.
            let (lo, hi) = (current.min(new), current.max(new));
            for i in (0..lo).chain(hi + 1..len) {
                proptest::prop_assert_eq!(after[i], m[i]);
            }

            // Relative order of everything else is preserved.
            let without = |seq: &[AssetId]| {
                seq.iter()
                    .copied()
                    .filter(|a| *a != m[current])
                    .collect::<Vec<_>>()
            };
            proptest::prop_assert_eq!(without(&after), without(&m));

            // The inverse move restores the original order.
            f.service.set_asset_index(directory_id, m[current], current).unwrap();
            let restored = f.service.get(directory_id).unwrap().assets().to_vec();
            proptest::prop_assert_eq!(restored, m);
        }
    }
}
