use thiserror::Error;

/// Errors produced by entity-level operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    /// A metadata key was empty or all whitespace.
    #[error("metadata key must not be blank (value was {value:?})")]
    BlankMetaKey { value: String },

    /// A store key was assigned to an asset that already has one.
    #[error("store key is already set and must not be reassigned")]
    StoreKeyReassigned,
}
