//! The metric registry: common instrument catalog plus driver extension point.

use mqtel_proto::ExportBatch;

use crate::attrs::AttributeSet;
use crate::config::ExportConfig;
use crate::exporter::MetricExporter;
use crate::instrument::{Counter, Histogram};
use crate::pipeline::{ExportPipeline, Meter};

/// Prefix applied to every exported instrument name.
pub const METRICS_PREFIX: &str = "pubsub_client";

/// Build a fully qualified instrument name.
pub(crate) fn prefixed(name: &str) -> String {
    format!("{METRICS_PREFIX}_{name}")
}

/// Routes a recorded error to its counter.
///
/// Closed set: these are the only error channels in the common catalog. This
/// is not a general error type — `record_error` reports business-path faults
/// observed by calling code, not failures of the telemetry layer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Payload failed schema validation, producing or consuming.
    SchemaValidation,
    /// Producer-side fault.
    Producer,
    /// Consumer-side fault.
    Consumer,
}

impl ErrorKind {
    /// Label form of the kind, as used in the `type` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SchemaValidation => "schema_validation",
            ErrorKind::Producer => "producer",
            ErrorKind::Consumer => "consumer",
        }
    }
}

/// Driver-specific instrument set.
///
/// Every concrete driver variant must supply an initializer; the registry is
/// not constructible without one, which is what makes the extension point
/// mandatory. A driver with nothing beyond the common catalog implements
/// this with an empty struct and an initializer that creates nothing:
///
/// ```
/// use mqtel::{DriverInstruments, Meter};
///
/// struct PlainAmqp;
///
/// impl DriverInstruments for PlainAmqp {
///     const DRIVER: &'static str = "amqp";
///     fn init(_meter: &Meter) -> Self {
///         PlainAmqp
///     }
/// }
/// ```
pub trait DriverInstruments: Sized {
    /// Driver identity, exported as the `driver` resource attribute.
    const DRIVER: &'static str;

    /// Create the driver's extra instruments on the registry's meter.
    ///
    /// Runs during registry construction, after the common catalog exists,
    /// so driver instruments are live immediately after `new` returns.
    fn init(meter: &Meter) -> Self;
}

/// The common instrument catalog shared by every queue driver.
pub(crate) struct CommonInstruments {
    pub(crate) bytes_in: Counter,
    pub(crate) bytes_out: Counter,
    pub(crate) record_published: Counter,
    pub(crate) record_consumed: Counter,
    pub(crate) producer_retries: Counter,
    pub(crate) consumer_retries: Counter,
    pub(crate) producer_latency: Histogram,
    pub(crate) consumer_latency: Histogram,
    pub(crate) schema_validation_error: Counter,
    pub(crate) producer_error: Counter,
    pub(crate) consumer_error: Counter,
}

impl CommonInstruments {
    fn init(meter: &Meter) -> Self {
        Self {
            bytes_in: meter.counter(prefixed("bytes_in"), "Bytes in by consumer"),
            bytes_out: meter.counter(prefixed("bytes_out"), "Bytes out by producer"),
            record_published: meter.counter(
                prefixed("record_published"),
                "Number of records published",
            ),
            record_consumed: meter.counter(
                prefixed("record_consumed"),
                "Number of records consumed",
            ),
            producer_retries: meter.counter(
                prefixed("producer_retries"),
                "Number of retries by producer",
            ),
            consumer_retries: meter.counter(
                prefixed("consumer_retries"),
                "Number of retries by consumer on consuming single message",
            ),
            producer_latency: meter.histogram(
                prefixed("producer_latency"),
                "Time taken to produce a record (in ms)",
            ),
            consumer_latency: meter.histogram(
                prefixed("consumer_latency"),
                "Time taken to consume a record (in ms)",
            ),
            schema_validation_error: meter.counter(
                prefixed("schema_validation_error"),
                "Schema validation error either during producing or consuming",
            ),
            producer_error: meter.counter(prefixed("producer_error"), "Errors on producer"),
            consumer_error: meter.counter(prefixed("consumer_error"), "Errors on consumer"),
        }
    }
}

/// A metric registry for one queue driver.
///
/// Owns one export pipeline and the full instrument catalog (common set plus
/// whatever the driver's initializer adds). All `record_*` methods are
/// synchronous, thread-safe, O(1), and infallible — telemetry never disrupts
/// the produce/consume path.
///
/// Construction is eager: every instrument exists before `new` returns.
/// Construction never blocks on the collector being reachable; the first
/// dial happens inside the background export task.
pub struct MetricRegistry<D: DriverInstruments> {
    pipeline: ExportPipeline,
    common: CommonInstruments,
    driver: D,
}

impl<D: DriverInstruments> MetricRegistry<D> {
    /// Create a registry pushing to the configured collector endpoint.
    pub fn new(config: ExportConfig) -> Self {
        let exporter = MetricExporter::push(&config);
        Self::with_exporter(config, exporter)
    }

    /// Create a registry with an explicit exporter.
    ///
    /// The logging exporter makes this the natural constructor for tests and
    /// for running without a collector.
    pub fn with_exporter(config: ExportConfig, exporter: MetricExporter) -> Self {
        let pipeline = ExportPipeline::new(D::DRIVER, config, exporter);
        let meter = pipeline.meter();
        let common = CommonInstruments::init(&meter);
        let driver = D::init(&meter);
        pipeline.start();
        Self {
            pipeline,
            common,
            driver,
        }
    }

    // Producer metrics

    /// Count bytes handed to the transport by one produce call.
    pub fn record_bytes_out(&self, value: u64, attrs: &AttributeSet) {
        self.common.bytes_out.add(value, attrs);
    }

    /// Record the time one produce call took, in milliseconds.
    pub fn record_producer_latency(&self, value_ms: f64, attrs: &AttributeSet) {
        self.common.producer_latency.record(value_ms, attrs);
    }

    /// Count records successfully handed to the transport.
    pub fn record_published_records(&self, value: u64, attrs: &AttributeSet) {
        self.common.record_published.add(value, attrs);
    }

    /// Count retry attempts observed while producing one record.
    pub fn record_producer_retries(&self, value: u64, attrs: &AttributeSet) {
        self.common.producer_retries.add(value, attrs);
    }

    // Consumer metrics

    /// Count bytes received by one consume call.
    pub fn record_bytes_in(&self, value: u64, attrs: &AttributeSet) {
        self.common.bytes_in.add(value, attrs);
    }

    /// Record the time one consume-and-process cycle took, in milliseconds.
    pub fn record_consumer_latency(&self, value_ms: f64, attrs: &AttributeSet) {
        self.common.consumer_latency.record(value_ms, attrs);
    }

    /// Count records successfully received.
    pub fn record_consumed_records(&self, value: u64, attrs: &AttributeSet) {
        self.common.record_consumed.add(value, attrs);
    }

    /// Count retry attempts observed while consuming one record.
    pub fn record_consumer_retries(&self, value: u64, attrs: &AttributeSet) {
        self.common.consumer_retries.add(value, attrs);
    }

    // Error metrics

    /// Count a business-path error on the counter matching `kind`.
    pub fn record_error(&self, kind: ErrorKind, value: u64, attrs: &AttributeSet) {
        match kind {
            ErrorKind::SchemaValidation => self.common.schema_validation_error.add(value, attrs),
            ErrorKind::Producer => self.common.producer_error.add(value, attrs),
            ErrorKind::Consumer => self.common.consumer_error.add(value, attrs),
        }
    }

    /// The driver's extra instruments.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The registry's export pipeline.
    pub fn pipeline(&self) -> &ExportPipeline {
        &self.pipeline
    }

    /// Snapshot the full catalog as it would be exported right now.
    pub fn snapshot(&self) -> ExportBatch {
        self.pipeline.snapshot()
    }

    /// Push one snapshot now, best-effort.
    pub async fn flush(&self) {
        self.pipeline.flush().await;
    }
}

impl<D: DriverInstruments> std::fmt::Debug for MetricRegistry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("driver", &D::DRIVER)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::keys;

    /// A driver that adds nothing beyond the common catalog.
    struct BareDriver;

    impl DriverInstruments for BareDriver {
        const DRIVER: &'static str = "bare";
        fn init(_meter: &Meter) -> Self {
            BareDriver
        }
    }

    fn registry() -> MetricRegistry<BareDriver> {
        MetricRegistry::with_exporter(ExportConfig::localhost(), MetricExporter::log())
    }

    fn orders() -> AttributeSet {
        AttributeSet::new().with(keys::QUEUE, "orders")
    }

    #[test]
    fn test_empty_driver_yields_exactly_the_common_catalog() {
        let registry = registry();
        let names = registry.pipeline().instrument_names();

        assert_eq!(names.len(), 11);
        for name in [
            "bytes_in",
            "bytes_out",
            "record_published",
            "record_consumed",
            "producer_retries",
            "consumer_retries",
            "producer_latency",
            "consumer_latency",
            "schema_validation_error",
            "producer_error",
            "consumer_error",
        ] {
            assert!(
                names.contains(&prefixed(name)),
                "missing instrument {name}"
            );
        }
    }

    #[test]
    fn test_counter_additivity_per_attribute_set() {
        let registry = registry();
        let attrs = orders();

        registry.record_bytes_in(128, &attrs);
        registry.record_bytes_in(128, &attrs);

        assert_eq!(registry.common.bytes_in.value(&attrs), 256);
    }

    #[test]
    fn test_histogram_observation_count_matches_calls() {
        let registry = registry();
        let attrs = orders();

        registry.record_consumer_latency(12.5, &attrs);
        registry.record_consumer_latency(3.0, &attrs);
        registry.record_producer_latency(1.0, &attrs);

        assert_eq!(registry.common.consumer_latency.count(&attrs), 2);
        assert_eq!(registry.common.producer_latency.count(&attrs), 1);
    }

    #[test]
    fn test_record_error_is_one_hot() {
        let registry = registry();
        let attrs = orders().with(keys::TYPE, ErrorKind::SchemaValidation.as_str());

        registry.record_error(ErrorKind::SchemaValidation, 1, &attrs);

        assert_eq!(registry.common.schema_validation_error.value(&attrs), 1);
        assert_eq!(registry.common.producer_error.value(&attrs), 0);
        assert_eq!(registry.common.consumer_error.value(&attrs), 0);

        registry.record_error(ErrorKind::Producer, 2, &attrs);
        registry.record_error(ErrorKind::Consumer, 3, &attrs);

        assert_eq!(registry.common.schema_validation_error.value(&attrs), 1);
        assert_eq!(registry.common.producer_error.value(&attrs), 2);
        assert_eq!(registry.common.consumer_error.value(&attrs), 3);
    }

    #[test]
    fn test_attribute_set_not_mutated_by_recording() {
        let registry = registry();
        let attrs = orders();
        let before = attrs.clone();

        registry.record_bytes_in(1, &attrs);
        registry.record_consumer_latency(1.0, &attrs);

        assert_eq!(attrs, before);
    }

    #[test]
    fn test_snapshot_exposes_driver_identity() {
        let registry = registry();
        assert_eq!(registry.snapshot().driver, "bare");
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(ErrorKind::SchemaValidation.as_str(), "schema_validation");
        assert_eq!(ErrorKind::Producer.as_str(), "producer");
        assert_eq!(ErrorKind::Consumer.as_str(), "consumer");
    }
}
