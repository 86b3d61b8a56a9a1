use crate::value::Value;
use std::fmt;

///
/// PrimaryKey
/// Partition key plus optional sort key identifying one record.
///

#[derive(Clone, Debug, PartialEq)]
pub struct PrimaryKey {
    pub partition: Value,
    pub sort: Option<Value>,
}

impl PrimaryKey {
    #[must_use]
    pub const fn new(partition: Value, sort: Option<Value>) -> Self {
        Self { partition, sort }
    }

    /// Partition-only key.
    pub fn partition(partition: impl Into<Value>) -> Self {
        Self::new(partition.into(), None)
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sort {
            Some(sort) => write!(f, "{}/{sort}", self.partition),
            None => write!(f, "{}", self.partition),
        }
    }
}
