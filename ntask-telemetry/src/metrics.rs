//! ## ntask-telemetry::metrics
//! **Prometheus view of registry activity**
//!
//! Each `ObjectRegistry` owns one recorder with its own prometheus registry,
//! so several registries in one process never collide on metric names.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub objects_created: IntCounter,
    pub lookup_misses: IntCounter,
    pub libraries_loaded: IntGauge,
    pub status_snapshots: IntCounter,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let objects_created = IntCounter::new(
            "ntask_objects_created_total",
            "Native objects instantiated through the registry",
        )?;
        let lookup_misses = IntCounter::new(
            "ntask_lookup_misses_total",
            "Class, function or default lookups that found nothing",
        )?;
        let libraries_loaded =
            IntGauge::new("ntask_libraries_loaded", "Plugin libraries currently loaded")?;
        let status_snapshots = IntCounter::new(
            "ntask_status_snapshots_total",
            "Task status updates serialized for the host",
        )?;

        registry.register(Box::new(objects_created.clone()))?;
        registry.register(Box::new(lookup_misses.clone()))?;
        registry.register(Box::new(libraries_loaded.clone()))?;
        registry.register(Box::new(status_snapshots.clone()))?;

        Ok(Self {
            registry,
            objects_created,
            lookup_misses,
            libraries_loaded,
            status_snapshots,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
