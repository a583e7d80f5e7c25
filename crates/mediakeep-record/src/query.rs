use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use mediakeep_types::Asset;

use crate::error::{RecordError, RecordResult};

/// Name of a registered query.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryName(&'static str);

impl QueryName {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for QueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryName({})", self.0)
    }
}

impl fmt::Display for QueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Assets whose expiration date has been reached but whose expired flag
/// is still unset.
pub const ASSETS_EXPIRING: QueryName = QueryName::new("assets.expiring");

/// Assets flagged expired whose expiration date is absent or in the
/// future.
pub const ASSETS_UNEXPIRING: QueryName = QueryName::new("assets.unexpiring");

/// A registered query predicate. Evaluated against each record with an
/// explicit `now` so batch passes are deterministic under test.
pub type QueryPredicate<T> = fn(&T, DateTime<Utc>) -> bool;

/// Catalog of named queries for one entity type.
///
/// Consumers that depend on a query (the expiration sweeper) verify its
/// presence through the store at startup instead of discovering a typo on
/// the first batch run.
pub struct QueryCatalog<T> {
    queries: HashMap<QueryName, QueryPredicate<T>>,
}

impl<T> QueryCatalog<T> {
    /// An empty catalog.
    pub fn new() -> Self {
        Self {
            queries: HashMap::new(),
        }
    }

    /// Register a query. Re-registering a name replaces the predicate.
    pub fn register(&mut self, name: QueryName, predicate: QueryPredicate<T>) {
        self.queries.insert(name, predicate);
    }

    /// Look up a registered predicate.
    pub fn get(&self, name: QueryName) -> RecordResult<QueryPredicate<T>> {
        self.queries
            .get(&name)
            .copied()
            .ok_or_else(|| RecordError::UnknownQuery(name.to_string()))
    }

    /// Verify that a query is registered, without evaluating it.
    pub fn verify(&self, name: QueryName) -> RecordResult<()> {
        self.get(name).map(|_| ())
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl<T> Default for QueryCatalog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for QueryCatalog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCatalog")
            .field("query_count", &self.queries.len())
            .finish()
    }
}

/// The standard asset query catalog with both expiration queries
/// registered.
pub fn asset_queries() -> QueryCatalog<Asset> {
    let mut catalog = QueryCatalog::new();
    catalog.register(ASSETS_EXPIRING, |asset: &Asset, now| asset.is_expiring_at(now));
    catalog.register(ASSETS_UNEXPIRING, |asset: &Asset, now| {
        asset.is_unexpiring_at(now)
    });
    catalog
}
