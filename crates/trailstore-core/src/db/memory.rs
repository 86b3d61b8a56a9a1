//! In-process reference adapter.
//!
//! Tables are ordered maps keyed by the rendered primary key. Secondary
//! indexes are computed by scan on read; in `Deferred` mode they read from a
//! snapshot that only moves forward on `publish_indexes`, which is how the
//! store's eventually-consistent index reads are reproduced in tests.

use crate::{
    action::UpdateAction,
    db::{
        adapter::{Adapter, TableRef},
        condition::{Condition, KeyCondition},
    },
    error::{Error, ErrorOrigin},
    model::{IndexModel, PrimaryKey, TableModel},
    value::{Item, Value, strict_order_cmp, structural_eq},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::trace;

type StorageKey = (String, Option<String>);

///
/// IndexVisibility
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexVisibility {
    /// Index reads observe every committed write.
    #[default]
    #[display("immediate")]
    Immediate,
    /// Index reads observe the last published snapshot.
    #[display("deferred")]
    Deferred,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<String, BTreeMap<StorageKey, Item>>,
    published: BTreeMap<String, Vec<Item>>,
}

///
/// MemoryAdapter
///

#[derive(Debug, Default)]
pub struct MemoryAdapter {
    state: RwLock<MemoryState>,
    visibility: IndexVisibility,
}

impl MemoryAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_visibility(visibility: IndexVisibility) -> Self {
        Self {
            state: RwLock::default(),
            visibility,
        }
    }

    #[must_use]
    pub const fn visibility(&self) -> IndexVisibility {
        self.visibility
    }

    /// Make every committed write visible to index reads.
    pub fn publish_indexes(&self) -> Result<(), Error> {
        let mut state = self.write()?;
        state.published = state
            .tables
            .iter()
            .map(|(name, rows)| (name.clone(), rows.values().cloned().collect()))
            .collect();
        trace!(tables = state.published.len(), "published index snapshot");

        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, Error> {
        self.state
            .read()
            .map_err(|_| Error::adapter_internal("memory adapter lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, Error> {
        self.state
            .write()
            .map_err(|_| Error::adapter_internal("memory adapter lock poisoned"))
    }
}

impl Adapter for MemoryAdapter {
    fn get(&self, table: &TableRef<'_>, key: &PrimaryKey) -> Result<Option<Item>, Error> {
        let state = self.read()?;

        Ok(state
            .tables
            .get(&table.name)
            .and_then(|rows| rows.get(&storage_key(key)))
            .cloned())
    }

    fn put(
        &self,
        table: &TableRef<'_>,
        mut item: Item,
        condition: Option<&Condition>,
    ) -> Result<(), Error> {
        let key = key_of(table, &item)?;
        item.retain(|_, value| !value.is_null());

        let mut state = self.write()?;
        let slot = storage_key(&key);
        let current = state.tables.get(&table.name).and_then(|rows| rows.get(&slot));
        check_condition(table, current, condition)?;
        state
            .tables
            .entry(table.name.clone())
            .or_default()
            .insert(slot, item);

        Ok(())
    }

    fn update(
        &self,
        table: &TableRef<'_>,
        key: &PrimaryKey,
        actions: &[UpdateAction],
        condition: Option<&Condition>,
    ) -> Result<Item, Error> {
        if let Some(action) = actions
            .iter()
            .find(|action| table.model.is_key_field(action.path.root()))
        {
            return Err(Error::validation(
                ErrorOrigin::Adapter,
                format!("update on '{}' targets key field '{}'", table.name, action.path),
            ));
        }

        let mut state = self.write()?;
        let slot = storage_key(key);
        let current = state.tables.get(&table.name).and_then(|rows| rows.get(&slot));
        check_condition(table, current, condition)?;

        // all-or-nothing: work on a copy, and only touch the table on success
        let mut next = current
            .cloned()
            .unwrap_or_else(|| key_item(table.model, key));
        for action in actions {
            action.apply(&mut next)?;
        }
        state
            .tables
            .entry(table.name.clone())
            .or_default()
            .insert(slot, next.clone());

        Ok(next)
    }

    fn delete(
        &self,
        table: &TableRef<'_>,
        key: &PrimaryKey,
        condition: Option<&Condition>,
    ) -> Result<(), Error> {
        let mut state = self.write()?;
        let slot = storage_key(key);
        let Some(rows) = state.tables.get_mut(&table.name) else {
            return check_condition(table, None, condition);
        };
        check_condition(table, rows.get(&slot), condition)?;
        rows.remove(&slot);

        Ok(())
    }

    fn query(
        &self,
        table: &TableRef<'_>,
        partition: &Value,
        sort: Option<&KeyCondition>,
    ) -> Result<Vec<Item>, Error> {
        let model = table.model;
        if sort.is_some() && model.sort_key.is_none() {
            return Err(Error::validation(
                ErrorOrigin::Adapter,
                format!("table '{}' has no sort key to query on", table.name),
            ));
        }

        let state = self.read()?;
        let mut hits: Vec<Item> = state
            .tables
            .get(&table.name)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter(|item| {
                item.get(model.partition_key)
                    .is_some_and(|pk| structural_eq(pk, partition))
            })
            .filter(|item| match (sort, model.sort_key) {
                (Some(cond), Some(field)) => item.get(field).is_some_and(|v| cond.matches(v)),
                _ => true,
            })
            .cloned()
            .collect();

        if let Some(field) = model.sort_key {
            sort_by_field(&mut hits, field);
        }

        Ok(hits)
    }

    fn query_index(
        &self,
        table: &TableRef<'_>,
        index: &str,
        hash: &Value,
        range: Option<&KeyCondition>,
    ) -> Result<Vec<Item>, Error> {
        let index = resolve_index(table, index)?;
        if range.is_some() && index.range_key.is_none() {
            return Err(Error::validation(
                ErrorOrigin::Adapter,
                format!("index {index} on '{}' has no range key", table.name),
            ));
        }

        let state = self.read()?;
        let source: Vec<&Item> = match self.visibility {
            IndexVisibility::Immediate => state
                .tables
                .get(&table.name)
                .map(|rows| rows.values().collect())
                .unwrap_or_default(),
            IndexVisibility::Deferred => state
                .published
                .get(&table.name)
                .map(|rows| rows.iter().collect())
                .unwrap_or_default(),
        };

        let mut hits: Vec<Item> = source
            .into_iter()
            .filter(|item| index_matches(item, index, hash, range))
            .cloned()
            .collect();

        if let Some(field) = index.range_key {
            sort_by_field(&mut hits, field);
        }

        Ok(hits)
    }

    fn count(&self, table: &TableRef<'_>) -> Result<usize, Error> {
        let state = self.read()?;

        Ok(state.tables.get(&table.name).map_or(0, BTreeMap::len))
    }
}

fn storage_key(key: &PrimaryKey) -> StorageKey {
    (
        key.partition.to_string(),
        key.sort.as_ref().map(ToString::to_string),
    )
}

fn key_of(table: &TableRef<'_>, item: &Item) -> Result<PrimaryKey, Error> {
    let model = table.model;
    let missing = |field: &str| {
        Error::validation(
            ErrorOrigin::Adapter,
            format!("item for '{}' lacks key field '{field}'", table.name),
        )
    };

    let partition = item
        .get(model.partition_key)
        .filter(|value| !value.is_null())
        .cloned()
        .ok_or_else(|| missing(model.partition_key))?;
    let sort = match model.sort_key {
        Some(field) => Some(
            item.get(field)
                .filter(|value| !value.is_null())
                .cloned()
                .ok_or_else(|| missing(field))?,
        ),
        None => None,
    };

    Ok(PrimaryKey::new(partition, sort))
}

fn key_item(model: &TableModel, key: &PrimaryKey) -> Item {
    let mut item = Item::new();
    item.insert(model.partition_key.to_string(), key.partition.clone());
    if let (Some(field), Some(sort)) = (model.sort_key, &key.sort) {
        item.insert(field.to_string(), sort.clone());
    }

    item
}

fn check_condition(
    table: &TableRef<'_>,
    current: Option<&Item>,
    condition: Option<&Condition>,
) -> Result<(), Error> {
    match condition {
        Some(condition) if !condition.evaluate(current) => {
            Err(Error::condition_failed(&table.name, condition.to_string()))
        }
        _ => Ok(()),
    }
}

fn resolve_index<'a>(table: &TableRef<'a>, name: &str) -> Result<&'a IndexModel, Error> {
    table.model.index(name).ok_or_else(|| {
        Error::adapter_unsupported(format!("table '{}' has no index '{name}'", table.name))
    })
}

// Sparse: items lacking a declared index key are not in the index.
fn index_matches(
    item: &Item,
    index: &IndexModel,
    hash: &Value,
    range: Option<&KeyCondition>,
) -> bool {
    let hash_ok = item
        .get(index.hash_key)
        .is_some_and(|value| structural_eq(value, hash));
    let range_ok = match index.range_key {
        Some(field) => item
            .get(field)
            .is_some_and(|value| range.is_none_or(|cond| cond.matches(value))),
        None => true,
    };

    hash_ok && range_ok
}

fn sort_by_field(items: &mut [Item], field: &str) {
    items.sort_by(|a, b| match (a.get(field), b.get(field)) {
        (Some(a), Some(b)) => strict_order_cmp(a, b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

///
/// TESTS
///
