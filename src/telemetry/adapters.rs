//! # Consumer Adapters
//!
//! Thin interface implementations over the telemetry cache's read API: a PID
//! feedback source and a dashboard "Gyro" widget. Neither touches acquisition
//! state; both only read from [`TelemetryCache`].

use std::sync::Arc;
use tracing::debug;

use super::cache::TelemetryCache;

/// Feedback source for a PID controller
pub trait PidSource {
    /// Current process variable
    fn pid_get(&self) -> f64;
}

/// Feeds zero-corrected yaw to a heading controller
#[derive(Debug, Clone)]
pub struct YawPidSource {
    cache: Arc<TelemetryCache>,
}

impl YawPidSource {
    pub fn new(cache: Arc<TelemetryCache>) -> Self {
        Self { cache }
    }
}

impl PidSource for YawPidSource {
    fn pid_get(&self) -> f64 {
        f64::from(self.cache.get_yaw())
    }
}

/// Key/value sink of a live dashboard
#[cfg_attr(test, mockall::automock)]
pub trait DashboardTable: Send {
    /// Publish a numeric entry
    fn put_number(&mut self, key: &str, value: f64);
}

/// Dashboard table that emits entries as `tracing` events
#[derive(Debug, Default)]
pub struct TracingTable;

impl DashboardTable for TracingTable {
    fn put_number(&mut self, key: &str, value: f64) {
        debug!(key, value, "dashboard update");
    }
}

/// Dashboard widget showing zero-corrected yaw as a gyro
pub struct GyroWidget {
    cache: Arc<TelemetryCache>,
    table: Option<Box<dyn DashboardTable>>,
}

impl std::fmt::Debug for GyroWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GyroWidget")
            .field("bound", &self.table.is_some())
            .finish_non_exhaustive()
    }
}

impl GyroWidget {
    /// Widget type name understood by the dashboard
    pub const DASHBOARD_TYPE: &'static str = "Gyro";

    /// Table key under which yaw is published
    pub const VALUE_KEY: &'static str = "Value";

    pub fn new(cache: Arc<TelemetryCache>) -> Self {
        Self { cache, table: None }
    }

    /// Binds the widget to a table and publishes the current value
    pub fn init_table(&mut self, table: Box<dyn DashboardTable>) {
        self.table = Some(table);
        self.update_table();
    }

    /// Publishes the current yaw; no-op while unbound
    pub fn update_table(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.put_number(Self::VALUE_KEY, f64::from(self.cache.get_yaw()));
        }
    }

    pub fn dashboard_type(&self) -> &'static str {
        Self::DASHBOARD_TYPE
    }
}
