pub mod adapter;
pub mod clock;
pub mod condition;
pub mod memory;

use crate::{
    config::StoreConfig,
    error::Error,
    obs::sink::{MetricsEvent, MetricsSink},
    record::{Record, schema::RecordSchema},
    value::Value,
};
use adapter::{Adapter, TableRef};
use chrono::{DateTime, Utc};
use clock::{Clock, SystemClock};
use condition::KeyCondition;
use memory::MemoryAdapter;
use std::{fmt, sync::Arc};
use tracing::debug;

///
/// Db
///
/// Explicit store handle: adapter, clock, physical table prefix and an
/// optional metrics sink. Owned by whichever scope constructs records and
/// passed into every persistence call; there is no process-wide state.
///

#[derive(Clone)]
pub struct Db {
    adapter: Arc<dyn Adapter>,
    clock: Arc<dyn Clock>,
    table_prefix: String,
    sink: Option<Arc<dyn MetricsSink>>,
}

impl Db {
    #[must_use]
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self {
            adapter,
            clock: Arc::new(SystemClock),
            table_prefix: String::new(),
            sink: None,
        }
    }

    /// Build a handle over an in-memory adapter configured from `config`.
    ///
    /// Returns the concrete adapter too so callers can publish deferred
    /// index snapshots.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> (Self, Arc<MemoryAdapter>) {
        let adapter = Arc::new(MemoryAdapter::with_visibility(
            config.memory.index_visibility,
        ));
        let db = Self::new(Arc::clone(&adapter) as Arc<dyn Adapter>)
            .with_table_prefix(&config.tables.prefix);
        debug!(
            prefix = %config.tables.prefix,
            visibility = %config.memory.index_visibility,
            "memory store configured"
        );

        (db, adapter)
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Resolve the physical table for a record type.
    #[must_use]
    pub fn table_ref<'s>(&self, schema: &'s RecordSchema) -> TableRef<'s> {
        TableRef {
            name: format!("{}{}", self.table_prefix, schema.name()),
            model: schema.table(),
        }
    }

    /// Query a secondary index; results may lag recent writes.
    pub fn query_index(
        &self,
        schema: &Arc<RecordSchema>,
        index: &str,
        hash: &Value,
        range: Option<&KeyCondition>,
    ) -> Result<Vec<Record>, Error> {
        let table = self.table_ref(schema);
        let items = self.adapter.query_index(&table, index, hash, range)?;

        self.record(MetricsEvent::IndexQuery {
            table: schema.name(),
            rows: items.len(),
        });

        Ok(items
            .into_iter()
            .map(|item| Record::from_item(schema, item))
            .collect())
    }

    pub fn count_index(
        &self,
        schema: &Arc<RecordSchema>,
        index: &str,
        hash: &Value,
        range: Option<&KeyCondition>,
    ) -> Result<usize, Error> {
        let table = self.table_ref(schema);
        let rows = self.adapter.count_index(&table, index, hash, range)?;

        self.record(MetricsEvent::IndexQuery {
            table: schema.name(),
            rows,
        });

        Ok(rows)
    }

    /// Records of one partition, ordered by sort key.
    pub fn query(
        &self,
        schema: &Arc<RecordSchema>,
        partition: &Value,
        sort: Option<&KeyCondition>,
    ) -> Result<Vec<Record>, Error> {
        let table = self.table_ref(schema);
        let items = self.adapter.query(&table, partition, sort)?;

        self.record(MetricsEvent::Query {
            table: schema.name(),
            rows: items.len(),
        });

        Ok(items
            .into_iter()
            .map(|item| Record::from_item(schema, item))
            .collect())
    }

    pub fn count(&self, schema: &RecordSchema) -> Result<usize, Error> {
        self.adapter.count(&self.table_ref(schema))
    }

    pub(crate) fn record(&self, event: MetricsEvent) {
        if let Some(sink) = &self.sink {
            sink.record(event);
        }
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("table_prefix", &self.table_prefix)
            .field("metrics", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}
