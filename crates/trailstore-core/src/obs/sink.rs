//! Metrics sink boundary.
//!
//! Lifecycle code never touches counters directly; every instrumentation
//! point emits a `MetricsEvent` into the sink carried by `Db`, if any.
use crate::error::ErrorClass;

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    Save {
        table: &'static str,
    },
    Update {
        table: &'static str,
        actions: usize,
    },
    Delete {
        table: &'static str,
    },
    Load {
        table: &'static str,
        found: bool,
    },
    Query {
        table: &'static str,
        rows: usize,
    },
    IndexQuery {
        table: &'static str,
        rows: usize,
    },
    ConstraintRejected {
        table: &'static str,
        constraint: &'static str,
    },
    WriteFailed {
        table: &'static str,
        class: ErrorClass,
    },
}

impl MetricsEvent {
    #[must_use]
    pub const fn table(&self) -> &'static str {
        match self {
            Self::Save { table }
            | Self::Update { table, .. }
            | Self::Delete { table }
            | Self::Load { table, .. }
            | Self::Query { table, .. }
            | Self::IndexQuery { table, .. }
            | Self::ConstraintRejected { table, .. }
            | Self::WriteFailed { table, .. } => table,
        }
    }
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent);
}
