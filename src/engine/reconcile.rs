use crate::error::ImportError;
use crate::product::{Product, ProductRow, PRODUCT_ID};

use std::collections::HashMap;

/// Existing products keyed by `product_id`, read once before reconciling.
pub type Snapshot = HashMap<String, Product>;

/// Validated records ready to be committed together.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportPlan {
    pub to_create: Vec<Product>,
    pub to_update: Vec<Product>,
}

impl ImportPlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len()
    }
}

/// Splits normalized rows into creates and updates against `snapshot`.
///
/// Every record is validated before it lands in a bucket and the first
/// failure aborts the whole batch. A `product_id` repeated within the same
/// upload is rejected on its second occurrence.
pub fn reconcile(rows: Vec<ProductRow>, snapshot: &Snapshot) -> Result<ImportPlan, ImportError> {
    let mut plan = ImportPlan::default();
    let mut seen: HashMap<String, u64> = HashMap::with_capacity(rows.len());

    for row in rows {
        if let Some(first) = seen.get(&row.product_id) {
            return Err(ImportError::validation(
                row.line,
                PRODUCT_ID,
                format!(
                    "duplicate product_id {} (first seen on line {})",
                    row.product_id, first
                ),
            ));
        }
        seen.insert(row.product_id.clone(), row.line);

        match snapshot.get(&row.product_id) {
            Some(existing) => {
                let mut product = existing.clone();
                product.apply(&row)?;
                plan.to_update.push(product);
            }
            None => {
                plan.to_create.push(Product::try_from(&row)?);
            }
        }
    }

    Ok(plan)
}
