//! Export pipeline: instrument catalog plus periodic background push.
//!
//! One pipeline per registry. Recording call sites only touch atomic series
//! state; the pipeline snapshots that state on a fixed cadence and hands the
//! batch to its exporter. Export failures are logged and dropped — the
//! business path never sees them.

use std::sync::{Arc, RwLock};

use mqtel_proto::ExportBatch;

use crate::config::ExportConfig;
use crate::exporter::MetricExporter;
use crate::instrument::{Counter, Histogram, Instrument};

/// Creates instruments bound to one pipeline's catalog.
///
/// Handed to driver initializers so their instruments land in the same
/// catalog, and flush on the same cadence, as the common set.
#[derive(Clone)]
pub struct Meter {
    inner: Arc<PipelineInner>,
}

impl Meter {
    /// Create (or fetch) a counter with the given exported name.
    ///
    /// Instrument identity is the name: asking twice for the same name
    /// returns the same underlying instrument.
    pub fn counter(&self, name: impl Into<String>, description: impl Into<String>) -> Counter {
        let name = name.into();
        let description = description.into();

        let Ok(mut catalog) = self.inner.catalog.write() else {
            return Counter::new(name, description);
        };

        for instrument in catalog.iter() {
            if instrument.name() == name {
                match instrument {
                    Instrument::Counter(existing) => return existing.clone(),
                    Instrument::Histogram(_) => {
                        tracing::warn!(
                            name = %name,
                            "instrument name already registered as a histogram; \
                             returning a detached counter"
                        );
                        return Counter::new(name, description);
                    }
                }
            }
        }

        let counter = Counter::new(name, description);
        catalog.push(Instrument::Counter(counter.clone()));
        counter
    }

    /// Create (or fetch) a histogram with the given exported name.
    pub fn histogram(&self, name: impl Into<String>, description: impl Into<String>) -> Histogram {
        let name = name.into();
        let description = description.into();

        let Ok(mut catalog) = self.inner.catalog.write() else {
            return Histogram::new(name, description);
        };

        for instrument in catalog.iter() {
            if instrument.name() == name {
                match instrument {
                    Instrument::Histogram(existing) => return existing.clone(),
                    Instrument::Counter(_) => {
                        tracing::warn!(
                            name = %name,
                            "instrument name already registered as a counter; \
                             returning a detached histogram"
                        );
                        return Histogram::new(name, description);
                    }
                }
            }
        }

        let histogram = Histogram::new(name, description);
        catalog.push(Instrument::Histogram(histogram.clone()));
        histogram
    }
}

/// The export pipeline owned by a registry.
pub struct ExportPipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    driver: String,
    config: ExportConfig,
    exporter: MetricExporter,
    catalog: RwLock<Vec<Instrument>>,
}

impl ExportPipeline {
    /// Create a pipeline for the given driver identity and exporter.
    ///
    /// Does not touch the network: the exporter dials on the first flush.
    pub fn new(driver: impl Into<String>, config: ExportConfig, exporter: MetricExporter) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                driver: driver.into(),
                config,
                exporter,
                catalog: RwLock::new(Vec::new()),
            }),
        }
    }

    /// The instrument factory for this pipeline.
    pub fn meter(&self) -> Meter {
        Meter {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Driver identity exported as a resource attribute.
    pub fn driver(&self) -> &str {
        &self.inner.driver
    }

    /// Names of all registered instruments, in registration order.
    pub fn instrument_names(&self) -> Vec<String> {
        match self.inner.catalog.read() {
            Ok(catalog) => catalog.iter().map(|i| i.name().to_string()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Snapshot the full catalog into one export batch.
    ///
    /// One data point per instrument per live attribute set, cumulative
    /// temporality. Instruments with no recorded series contribute a payload
    /// with zero points.
    pub fn snapshot(&self) -> ExportBatch {
        self.inner.snapshot()
    }

    /// Push one snapshot now, best-effort.
    pub async fn flush(&self) {
        self.inner.export_once().await;
    }

    /// Spawn the periodic export task onto the ambient tokio runtime.
    ///
    /// Without a runtime the pipeline stays passive: recording still works
    /// and [`flush`](Self::flush) remains available.
    pub(crate) fn start(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                handle.spawn(async move {
                    let mut ticker = tokio::time::interval(inner.config.interval);
                    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                    // The first tick fires immediately; skip it so the first
                    // flush happens a full interval after construction.
                    ticker.tick().await;
                    loop {
                        ticker.tick().await;
                        inner.export_once().await;
                    }
                });
                tracing::debug!(
                    driver = %self.inner.driver,
                    interval_ms = self.inner.config.interval.as_millis() as u64,
                    "periodic metrics export started"
                );
            }
            Err(_) => {
                tracing::debug!(
                    driver = %self.inner.driver,
                    "no async runtime at construction; periodic export disabled"
                );
            }
        }
    }
}

impl PipelineInner {
    fn snapshot(&self) -> ExportBatch {
        let mut batch = ExportBatch::new(self.driver.clone());
        if let Ok(catalog) = self.catalog.read() {
            batch.metrics = catalog.iter().map(Instrument::payload).collect();
        }
        batch
    }

    async fn export_once(&self) {
        let batch = self.snapshot();
        if batch.is_empty() {
            tracing::trace!(driver = %self.driver, "skipping empty metrics flush");
            return;
        }
        if let Err(e) = self.exporter.export(&batch).await {
            tracing::warn!(
                driver = %self.driver,
                points = batch.point_count(),
                error = %e,
                "metrics export failed; dropping batch"
            );
        }
    }
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("driver", &self.inner.driver)
            .field("endpoint", &self.inner.config.endpoint)
            .field("interval", &self.inner.config.interval)
            .finish()
    }
}
