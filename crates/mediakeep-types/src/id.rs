use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a fresh, time-ordered identifier.
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }

            /// The nil identifier, used for records not yet persisted.
            ///
            /// The record store assigns the real identifier on create.
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Returns `true` if this identifier has not been assigned yet.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Short identifier for log output (prefix plus 8 hex chars).
            pub fn short(&self) -> String {
                let simple = self.0.simple().to_string();
                format!(concat!($prefix, ":{}"), &simple[..8])
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.short())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.short())
            }
        }
    };
}

entity_id!(
    /// Identifier of a persisted [`Asset`](crate::Asset).
    ///
    /// Assigned by the record store on creation and immutable thereafter.
    AssetId,
    "asset"
);

entity_id!(
    /// Identifier of a persisted [`Directory`](crate::Directory).
    DirectoryId,
    "dir"
);

entity_id!(
    /// Opaque handle into the blob store.
    ///
    /// Keys are freshly generated per stored payload and never reused
    /// across assets: a key orphaned by a failed create must never alias
    /// another asset's binary data.
    BlobKey,
    "blob"
);
