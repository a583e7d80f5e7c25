use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};

use crate::error::{RecordError, RecordResult};
use crate::query::QueryName;

/// An entity that can live in a record store.
///
/// Identifiers are assigned by the store on create: a fresh entity
/// carries a nil id, and the store calls
/// [`assign_fresh_id`](Record::assign_fresh_id) exactly once before
/// inserting it.
pub trait Record: Clone + Send + Sync + 'static {
    /// The typed identifier for this entity.
    type Id: Copy + Eq + Ord + Hash + fmt::Display + Send + Sync + 'static;

    fn id(&self) -> Self::Id;

    /// Returns `true` once the store has assigned an identifier.
    fn has_id(&self) -> bool;

    /// Assign a fresh identifier. Called by the store on create.
    fn assign_fresh_id(&mut self);
}

/// An existence-checked lazy handle to a record.
///
/// Obtained from [`RecordStore::reference`]; carries the id without
/// loading the record, but the store has verified the id resolves.
pub struct RecordRef<T: Record> {
    id: T::Id,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Record> RecordRef<T> {
    pub(crate) fn new(id: T::Id) -> Self {
        Self {
            id,
            _entity: PhantomData,
        }
    }

    pub fn id(&self) -> T::Id {
        self.id
    }
}

impl<T: Record> Clone for RecordRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Record> Copy for RecordRef<T> {}

impl<T: Record> fmt::Debug for RecordRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordRef({})", self.id)
    }
}

/// Mutation surface inside an open transaction.
///
/// Handed to the closure passed to [`RecordStore::in_transaction`]. Every
/// mutation made through it is rolled back if the closure returns `Err`.
pub trait RecordTx<T: Record> {
    /// Persist a new record, assigning its identifier.
    fn create(&mut self, entity: T) -> RecordResult<T>;

    /// Read a record by id.
    fn read(&self, id: T::Id) -> RecordResult<T>;

    /// Overwrite an existing record.
    fn update(&mut self, entity: T) -> RecordResult<T>;

    /// Delete a record by id.
    fn delete(&mut self, id: T::Id) -> RecordResult<()>;

    /// Run a named query against the current transaction state.
    fn list(&self, query: QueryName, now: DateTime<Utc>) -> RecordResult<Vec<T>>;
}

/// Transactional structured storage for one entity type.
///
/// Transactions are supplied by the caller: each service operation wraps
/// its reads and writes in exactly one
/// [`in_transaction`](RecordStore::in_transaction) call. The store
/// serializes transactions
/// per entity type, which in turn serializes operations racing on the
/// same directory sequence.
pub trait RecordStore<T: Record>: Send + Sync {
    /// Run `f` inside a transaction. `Err` rolls back every mutation the
    /// closure made; `Ok` commits them atomically.
    ///
    /// The closure may fail with any error type that store errors convert
    /// into, so callers can abort a transaction with their own domain
    /// errors and still roll back.
    fn in_transaction<R, E, F>(&self, f: F) -> Result<R, E>
    where
        E: From<RecordError>,
        F: FnOnce(&mut dyn RecordTx<T>) -> Result<R, E>;

    /// Read a record outside any transaction.
    fn read(&self, id: T::Id) -> RecordResult<T>;

    /// Obtain an existence-checked handle without loading the record.
    fn reference(&self, id: T::Id) -> RecordResult<RecordRef<T>>;

    /// Run a named query outside any transaction.
    fn list(&self, query: QueryName, now: DateTime<Utc>) -> RecordResult<Vec<T>>;

    /// Verify that a named query is registered, without running it.
    fn verify_query(&self, query: QueryName) -> RecordResult<()>;
}
