//! Export coordinator
//!
//! Orchestrates one run: connect, preload lookups, compile the filter,
//! then alternate between retrieving a window and enriching/writing it
//! until the dataset is exhausted, the row cap is hit, a shutdown is
//! requested or a fatal error escalates. Shutdown and fatal errors both
//! take effect at a window boundary, after the sink has been flushed, so
//! everything already emitted survives and the summary can report the
//! cursor reached.

use crate::adapters::postgres::{RegistryClient, RegistryStore};
use crate::adapters::traits::RegistryReader;
use crate::config::ExporterConfig;
use crate::core::batch::AdaptiveWindow;
use crate::core::enrich::Enricher;
use crate::core::export::summary::{RunStatus, RunSummary};
use crate::core::filter::FilterSpec;
use crate::core::lookup::{LookupCache, LookupKind};
use crate::core::paginate::CursorPaginator;
use crate::core::partners::PartnerResolver;
use crate::domain::{EntityKey, Result};
use crate::output::CsvSink;
use std::time::Instant;
use tokio::sync::watch;

pub struct ExportCoordinator<S = RegistryStore> {
    config: ExporterConfig,
    store: S,
}

impl ExportCoordinator<RegistryStore> {
    /// Connect to the registry and verify the connection works
    pub async fn new(config: ExporterConfig) -> Result<Self> {
        let client = RegistryClient::new(config.database.clone())?;
        let store = RegistryStore::new(client);
        store.test_connection().await?;
        tracing::info!(
            database = store.connection_string_safe(),
            "Connected to registry"
        );
        Ok(Self { config, store })
    }
}

impl<S: RegistryReader> ExportCoordinator<S> {
    /// Build a coordinator over an already-connected reader
    pub fn with_store(config: ExporterConfig, store: S) -> Self {
        Self { config, store }
    }

    /// Run one export to completion
    ///
    /// `shutdown` flips to true when the user requests cancellation; the
    /// loop honors it at the next window boundary.
    pub async fn run(
        &self,
        filter: &FilterSpec,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary> {
        let started = Instant::now();
        let export = &self.config.export;
        let cap = export.effective_cap();

        let lookups = LookupCache::load(&self.store, &LookupKind::all()).await?;
        let compiled = filter.compile()?;
        tracing::info!(
            clauses = compiled.clause_count(),
            cap = cap,
            output = %export.output_path,
            "Starting export"
        );

        let mut sink = CsvSink::create(&export.output_path)?;
        let mut paginator =
            CursorPaginator::new(&self.store, compiled, export.retry.clone());
        let resolver = PartnerResolver::new(&self.store, export.partners.clone());
        let enricher = Enricher::new();
        let controller = AdaptiveWindow::new(&export.window);

        let mut window_size = export.window.initial_size;
        let mut windows: u64 = 0;
        let mut next_id: u64 = 1;

        let status = loop {
            if *shutdown.borrow_and_update() {
                tracing::warn!("Shutdown requested, stopping at window boundary");
                break RunStatus::Aborted;
            }

            let request = clamp_to_cap(window_size, cap, sink.rows_written());
            if request == 0 {
                break RunStatus::CompletedCapReached;
            }

            let window_started = Instant::now();
            let window = match paginator.next_window(request).await {
                Ok(window) => window,
                Err(e) => {
                    sink.flush()?;
                    tracing::error!(
                        error = %e,
                        rows_exported = sink.rows_written(),
                        cursor = paginator.cursor().map(|c| c.to_string()),
                        "Fatal error, emitted rows flushed"
                    );
                    return Err(e);
                }
            };
            windows += 1;

            let mut emitted = 0;
            if !window.rows.is_empty() {
                let keys: Vec<EntityKey> = window
                    .rows
                    .iter()
                    .map(|row| row.key.entity().clone())
                    .collect();
                let partners = match resolver.resolve(&keys, &lookups).await {
                    Ok(partners) => partners,
                    Err(e) => {
                        sink.flush()?;
                        tracing::error!(
                            error = %e,
                            rows_exported = sink.rows_written(),
                            cursor = paginator.cursor().map(|c| c.to_string()),
                            "Fatal error, emitted rows flushed"
                        );
                        return Err(e);
                    }
                };

                let output = enricher.enrich_window(&window.rows, &lookups, &partners, next_id);
                next_id += output.len() as u64;
                sink.write_window(&output)?;
                sink.flush()?;
                emitted = output.len();
            }

            // The controller sizes against the full window latency,
            // from retrieval through the flushed CSV write.
            let latency = window_started.elapsed();
            if emitted > 0 {
                log_progress(windows, emitted, latency, &sink, cap, started);
            }

            if window.exhausted {
                break RunStatus::CompletedExhausted;
            }
            window_size = controller.next_size(request, latency);
        };

        sink.flush()?;
        let summary = RunSummary {
            status,
            rows_exported: sink.rows_written(),
            windows,
            duration: started.elapsed(),
            last_cursor: paginator.cursor().cloned(),
        };
        summary.log();
        Ok(summary)
    }
}

/// Shrink a window request so the run never exceeds the cap
fn clamp_to_cap(window_size: usize, cap: Option<u64>, rows_written: u64) -> usize {
    match cap {
        Some(cap) => {
            let remaining = cap.saturating_sub(rows_written);
            window_size.min(remaining as usize)
        }
        None => window_size,
    }
}

fn log_progress(
    window: u64,
    window_rows: usize,
    latency: std::time::Duration,
    sink: &CsvSink,
    cap: Option<u64>,
    started: Instant,
) {
    let window_rate = window_rows as f64 / latency.as_secs_f64().max(0.001);
    let elapsed = started.elapsed().as_secs_f64().max(0.001);
    let average_rate = sink.rows_written() as f64 / elapsed;

    let eta_seconds = cap.and_then(|cap| {
        let remaining = cap.saturating_sub(sink.rows_written());
        (average_rate > 0.0).then(|| remaining as f64 / average_rate)
    });

    tracing::info!(
        window,
        rows = window_rows,
        total_rows = sink.rows_written(),
        window_rate = format!("{window_rate:.0}"),
        average_rate = format!("{average_rate:.0}"),
        eta_seconds = eta_seconds.map(|s| s as u64),
        "Window exported"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unbounded_passes_through() {
        assert_eq!(clamp_to_cap(10_000, None, 999_999), 10_000);
    }

    #[test]
    fn test_clamp_shrinks_final_window() {
        assert_eq!(clamp_to_cap(10_000, Some(100_000), 95_000), 5_000);
    }

    #[test]
    fn test_clamp_zero_when_cap_reached() {
        assert_eq!(clamp_to_cap(10_000, Some(100_000), 100_000), 0);
        assert_eq!(clamp_to_cap(10_000, Some(100_000), 100_001), 0);
    }
}
