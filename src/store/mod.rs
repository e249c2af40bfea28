pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::engine::reconcile::{ImportPlan, Snapshot};
use crate::error::StoreError;
use crate::product::Product;

/// Counts of records written by one commit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub created: usize,
    pub updated: usize,
}

/// Persistence for products.
///
/// `commit` is the only write path and must apply a plan atomically:
/// either every create and update is visible afterwards or none is.
pub trait ProductStore: Send + Sync {
    /// Every stored product keyed by `product_id`.
    fn snapshot(&self) -> Result<Snapshot, StoreError>;

    /// Every stored product ordered by `product_id`.
    fn all(&self) -> Result<Vec<Product>, StoreError>;

    fn commit(&self, plan: &ImportPlan) -> Result<CommitSummary, StoreError>;
}

impl<S: ProductStore + ?Sized> ProductStore for std::sync::Arc<S> {
    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        (**self).snapshot()
    }

    fn all(&self) -> Result<Vec<Product>, StoreError> {
        (**self).all()
    }

    fn commit(&self, plan: &ImportPlan) -> Result<CommitSummary, StoreError> {
        (**self).commit(plan)
    }
}
