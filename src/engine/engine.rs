use crate::engine::normalize::normalize;
use crate::engine::reconcile::reconcile;
use crate::engine::report::{summarize, write_summary, CategorySummary};
use crate::error::{ImportError, ReportError, StoreError};
use crate::read_table;
use crate::store::ProductStore;

use std::io::Read;

/// Outcome of a successful bulk import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows: usize,
    pub created: usize,
    pub updated: usize,
}

pub struct Engine<S> {
    store: S,
}

impl<S: ProductStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one bulk upload: read, normalize, reconcile against the current
    /// store contents, then commit creates and updates in one transaction.
    /// Any error leaves the store as it was.
    pub fn import_csv<R: Read>(&self, reader: R) -> Result<ImportSummary, ImportError> {
        let table = read_table(reader)?;
        let rows = normalize(&table)?;
        let row_count = rows.len();
        tracing::debug!(
            read = table.rows.len(),
            kept = row_count,
            "normalized upload"
        );

        let snapshot = self.store.snapshot()?;
        let plan = reconcile(rows, &snapshot)?;

        let committed = self.store.commit(&plan)?;
        tracing::info!(
            created = committed.created,
            updated = committed.updated,
            "import committed"
        );

        Ok(ImportSummary {
            rows: row_count,
            created: committed.created,
            updated: committed.updated,
        })
    }

    /// Per-category summary computed from the store as it is right now.
    pub fn summary(&self) -> Result<Vec<CategorySummary>, StoreError> {
        let products = self.store.all()?;
        Ok(summarize(&products))
    }

    pub fn dump_summary<W: std::io::Write>(&self, writer: W) -> Result<(), ReportError> {
        let summaries = self.summary()?;
        write_summary(&summaries, writer)?;
        Ok(())
    }

    pub fn summary_csv(&self) -> Result<Vec<u8>, ReportError> {
        let mut buf = Vec::new();
        self.dump_summary(&mut buf)?;
        Ok(buf)
    }
}
