use std::fmt::{self, Display};

///
/// IndexModel
/// Secondary index key schema. Reads through an index are eventually
/// consistent; records lacking the index keys are not present in it.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndexModel {
    pub name: &'static str,
    pub hash_key: &'static str,
    pub range_key: Option<&'static str>,
}

impl IndexModel {
    #[must_use]
    pub const fn new(name: &'static str, hash_key: &'static str) -> Self {
        Self {
            name,
            hash_key,
            range_key: None,
        }
    }

    #[must_use]
    pub const fn with_range(mut self, range_key: &'static str) -> Self {
        self.range_key = Some(range_key);
        self
    }
}

impl Display for IndexModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range_key {
            Some(range) => write!(f, "{}({}, {range})", self.name, self.hash_key),
            None => write!(f, "{}({})", self.name, self.hash_key),
        }
    }
}

///
/// TableModel
/// Key schema and secondary indexes of one record type's table.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableModel {
    pub name: &'static str,
    pub partition_key: &'static str,
    pub sort_key: Option<&'static str>,
    pub indexes: Vec<IndexModel>,
}

impl TableModel {
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexModel> {
        self.indexes.iter().find(|index| index.name == name)
    }

    /// Whether the field is part of the primary key.
    #[must_use]
    pub fn is_key_field(&self, field: &str) -> bool {
        self.partition_key == field || self.sort_key == Some(field)
    }
}
