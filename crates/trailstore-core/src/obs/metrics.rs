use crate::{
    error::ErrorClass,
    obs::sink::{MetricsEvent, MetricsSink},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Mutex};

///
/// MetricsReport
/// Ephemeral, in-memory counters per table.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub tables: BTreeMap<String, TableCounters>,
}

impl MetricsReport {
    #[must_use]
    pub fn table(&self, name: &str) -> TableCounters {
        self.tables.get(name).cloned().unwrap_or_default()
    }
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableCounters {
    pub saves: u64,
    pub updates: u64,
    pub update_actions: u64,
    pub deletes: u64,
    pub loads: u64,
    pub load_misses: u64,
    pub queries: u64,
    pub index_queries: u64,
    pub rows_read: u64,
    pub constraint_rejections: u64,
    pub condition_failures: u64,
    pub write_failures: u64,
}

///
/// MetricsRecorder
/// Counting sink; hand an `Arc` of it to `Db::with_metrics_sink`.
///

#[derive(Debug, Default)]
pub struct MetricsRecorder {
    report: Mutex<MetricsReport>,
}

impl MetricsRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn report(&self) -> MetricsReport {
        self.report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Reset all counters (useful in tests).
    pub fn reset(&self) {
        *self
            .report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = MetricsReport::default();
    }
}

impl MetricsSink for MetricsRecorder {
    fn record(&self, event: MetricsEvent) {
        let mut report = self
            .report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = report.tables.entry(event.table().to_string()).or_default();

        match event {
            MetricsEvent::Save { .. } => entry.saves = entry.saves.saturating_add(1),
            MetricsEvent::Update { actions, .. } => {
                entry.updates = entry.updates.saturating_add(1);
                entry.update_actions = entry.update_actions.saturating_add(actions as u64);
            }
            MetricsEvent::Delete { .. } => entry.deletes = entry.deletes.saturating_add(1),
            MetricsEvent::Load { found, .. } => {
                entry.loads = entry.loads.saturating_add(1);
                if !found {
                    entry.load_misses = entry.load_misses.saturating_add(1);
                }
            }
            MetricsEvent::Query { rows, .. } => {
                entry.queries = entry.queries.saturating_add(1);
                entry.rows_read = entry.rows_read.saturating_add(rows as u64);
            }
            MetricsEvent::IndexQuery { rows, .. } => {
                entry.index_queries = entry.index_queries.saturating_add(1);
                entry.rows_read = entry.rows_read.saturating_add(rows as u64);
            }
            MetricsEvent::ConstraintRejected { .. } => {
                entry.constraint_rejections = entry.constraint_rejections.saturating_add(1);
            }
            MetricsEvent::WriteFailed { class, .. } => {
                entry.write_failures = entry.write_failures.saturating_add(1);
                if class == ErrorClass::ConditionFailed {
                    entry.condition_failures = entry.condition_failures.saturating_add(1);
                }
            }
        }
    }
}

///
/// TESTS
///
