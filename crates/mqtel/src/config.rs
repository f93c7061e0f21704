//! Export pipeline configuration.

use std::time::Duration;

/// Default collector address.
pub const DEFAULT_ENDPOINT: &str = "tcp://127.0.0.1:4317";

/// Default export interval.
pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Default send timeout for one push.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Export pipeline configuration.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Collector address (e.g., "tcp://collector:4317"). A bare "host:port"
    /// is accepted and treated as TCP.
    pub endpoint: String,

    /// Interval between background flushes.
    pub interval: Duration,

    /// Timeout for pushing one batch.
    pub send_timeout: Duration,
}

impl ExportConfig {
    /// Create a configuration for the given collector endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: normalize_endpoint(endpoint.into()),
            interval: DEFAULT_EXPORT_INTERVAL,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Create a configuration for a collector on localhost.
    pub fn localhost() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }

    /// Set the export interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the send timeout.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::localhost()
    }
}

/// Prefix bare "host:port" endpoints with the TCP scheme.
fn normalize_endpoint(endpoint: String) -> String {
    if endpoint.contains("://") {
        endpoint
    } else {
        format!("tcp://{endpoint}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExportConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.interval, DEFAULT_EXPORT_INTERVAL);
        assert_eq!(config.send_timeout, DEFAULT_SEND_TIMEOUT);
    }

    #[test]
    fn test_bare_host_port_gets_tcp_scheme() {
        let config = ExportConfig::new("localhost:4317");
        assert_eq!(config.endpoint, "tcp://localhost:4317");
    }

    #[test]
    fn test_explicit_scheme_preserved() {
        let config = ExportConfig::new("ipc:///tmp/collector.sock");
        assert_eq!(config.endpoint, "ipc:///tmp/collector.sock");
    }

    #[test]
    fn test_config_builder() {
        let config = ExportConfig::new("collector.internal:4317")
            .with_interval(Duration::from_secs(1))
            .with_send_timeout(Duration::from_millis(500));

        assert_eq!(config.endpoint, "tcp://collector.internal:4317");
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.send_timeout, Duration::from_millis(500));
    }
}
