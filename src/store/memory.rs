use crate::engine::reconcile::{ImportPlan, Snapshot};
use crate::error::StoreError;
use crate::product::Product;
use crate::store::{CommitSummary, ProductStore};

use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Products held in process memory. Used by tests and one-off runs.
#[derive(Default)]
pub struct MemoryStore {
    products: Mutex<BTreeMap<String, Product>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let map = products
            .into_iter()
            .map(|p| (p.product_id.clone(), p))
            .collect();
        Self {
            products: Mutex::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.products.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.lock().is_empty()
    }

    pub fn get(&self, product_id: &str) -> Option<Product> {
        self.products.lock().get(product_id).cloned()
    }
}

impl ProductStore for MemoryStore {
    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self
            .products
            .lock()
            .iter()
            .map(|(id, p)| (id.clone(), p.clone()))
            .collect())
    }

    fn all(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.lock().values().cloned().collect())
    }

    fn commit(&self, plan: &ImportPlan) -> Result<CommitSummary, StoreError> {
        let mut guard = self.products.lock();

        // Work on a copy so a failure leaves the store untouched.
        let mut staged = guard.clone();

        for product in &plan.to_create {
            if staged.contains_key(&product.product_id) {
                return Err(StoreError::Conflict {
                    product_id: product.product_id.clone(),
                    message: "product already exists".to_string(),
                });
            }
            staged.insert(product.product_id.clone(), product.clone());
        }

        for product in &plan.to_update {
            match staged.get_mut(&product.product_id) {
                Some(existing) => *existing = product.clone(),
                None => {
                    return Err(StoreError::Conflict {
                        product_id: product.product_id.clone(),
                        message: "product to update does not exist".to_string(),
                    })
                }
            }
        }

        *guard = staged;

        Ok(CommitSummary {
            created: plan.to_create.len(),
            updated: plan.to_update.len(),
        })
    }
}
