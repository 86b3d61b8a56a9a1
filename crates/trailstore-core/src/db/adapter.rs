use crate::{
    action::UpdateAction,
    db::condition::{Condition, KeyCondition},
    error::Error,
    model::{PrimaryKey, TableModel},
    value::{Item, Value},
};

///
/// TableRef
/// Resolved physical table name plus the record type's key schema.
///

#[derive(Clone, Debug)]
pub struct TableRef<'a> {
    pub name: String,
    pub model: &'a TableModel,
}

///
/// Adapter
///
/// Document store boundary. Primary-key reads are strongly consistent;
/// secondary-index reads (`query_index`, `count_index`) may lag writes.
/// Implementations own timeouts and retries; the lifecycle propagates their
/// errors unchanged.
///

pub trait Adapter: Send + Sync {
    /// `Ok(None)` when no item has this key.
    fn get(&self, table: &TableRef<'_>, key: &PrimaryKey) -> Result<Option<Item>, Error>;

    /// Replace the whole item. A failed condition is `ConditionFailed`.
    fn put(
        &self,
        table: &TableRef<'_>,
        item: Item,
        condition: Option<&Condition>,
    ) -> Result<(), Error>;

    /// Apply every action atomically and return the stored post-image.
    /// A missing item is created from the key.
    fn update(
        &self,
        table: &TableRef<'_>,
        key: &PrimaryKey,
        actions: &[UpdateAction],
        condition: Option<&Condition>,
    ) -> Result<Item, Error>;

    fn delete(
        &self,
        table: &TableRef<'_>,
        key: &PrimaryKey,
        condition: Option<&Condition>,
    ) -> Result<(), Error>;

    /// Items of one partition, ordered by sort key.
    fn query(
        &self,
        table: &TableRef<'_>,
        partition: &Value,
        sort: Option<&KeyCondition>,
    ) -> Result<Vec<Item>, Error>;

    /// Items of one secondary-index hash value, ordered by the index range
    /// key. Items lacking the index keys are not in the index.
    fn query_index(
        &self,
        table: &TableRef<'_>,
        index: &str,
        hash: &Value,
        range: Option<&KeyCondition>,
    ) -> Result<Vec<Item>, Error>;

    fn count_index(
        &self,
        table: &TableRef<'_>,
        index: &str,
        hash: &Value,
        range: Option<&KeyCondition>,
    ) -> Result<usize, Error> {
        self.query_index(table, index, hash, range)
            .map(|items| items.len())
    }

    /// Number of items in the table.
    fn count(&self, table: &TableRef<'_>) -> Result<usize, Error>;
}
