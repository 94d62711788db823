//! Cursor Paginator
//!
//! Drives keyset-based retrieval of the joined primary dataset in
//! fixed-size windows. The cursor is the composite key of the last row
//! emitted; each window asks the store for rows strictly greater than
//! it. Offset pagination is deliberately absent: its per-window cost
//! grows with offset depth, while the keyset form stays flat across a
//! multi-hour run.
//!
//! The paginator owns the cursor exclusively. Transient store failures
//! are retried a bounded number of times with the same cursor, which is
//! safe because the window query is idempotent for a fixed cursor.

use crate::adapters::traits::WindowSource;
use crate::config::RetryConfig;
use crate::core::filter::CompiledFilter;
use crate::domain::{CnpjError, CompositeKey, EstablishmentRow, Result};
use std::time::Duration;

/// One retrieved window of primary rows
#[derive(Debug)]
pub struct Window {
    pub rows: Vec<EstablishmentRow>,
    /// True when the store returned fewer rows than requested
    pub exhausted: bool,
}

/// Keyset paginator over the filtered primary dataset
pub struct CursorPaginator<'a, S> {
    store: &'a S,
    filter: CompiledFilter,
    retry: RetryConfig,
    cursor: Option<CompositeKey>,
}

impl<'a, S: WindowSource> CursorPaginator<'a, S> {
    pub fn new(store: &'a S, filter: CompiledFilter, retry: RetryConfig) -> Self {
        Self {
            store,
            filter,
            retry,
            cursor: None,
        }
    }

    /// The composite key of the last row returned, as a resume hint
    pub fn cursor(&self) -> Option<&CompositeKey> {
        self.cursor.as_ref()
    }

    /// Retrieve the next window of up to `window_size` rows
    ///
    /// Advances the cursor to the last row of the window. An empty match
    /// yields an empty, exhausted window and leaves the cursor unchanged.
    ///
    /// # Errors
    ///
    /// Escalates after `retry.max_retries` transient failures, or
    /// immediately on a non-transient store error.
    pub async fn next_window(&mut self, window_size: usize) -> Result<Window> {
        let rows = self.fetch_with_retries(window_size).await?;
        let exhausted = rows.len() < window_size;

        verify_strictly_ascending(self.cursor.as_ref(), &rows)?;

        if let Some(last) = rows.last() {
            self.cursor = Some(last.key.clone());
        }

        Ok(Window { rows, exhausted })
    }

    async fn fetch_with_retries(&self, window_size: usize) -> Result<Vec<EstablishmentRow>> {
        let mut attempt = 0;
        loop {
            match self
                .store
                .fetch_window(&self.filter, self.cursor.as_ref(), window_size)
                .await
            {
                Ok(rows) => return Ok(rows),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_attempts = self.retry.max_retries,
                        error = %e,
                        "Transient window failure, retrying with the same cursor"
                    );
                    tokio::time::sleep(Duration::from_millis(self.retry.delay_ms)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Every key must be strictly greater than the cursor and strictly
/// ascending within the window; anything else would duplicate rows
fn verify_strictly_ascending(
    cursor: Option<&CompositeKey>,
    rows: &[EstablishmentRow],
) -> Result<()> {
    let mut previous = cursor;
    for row in rows {
        if let Some(prev) = previous {
            if row.key <= *prev {
                return Err(CnpjError::Export(format!(
                    "Window ordering violation: {} follows {}",
                    row.key, prev
                )));
            }
        }
        previous = Some(&row.key);
    }
    Ok(())
}
