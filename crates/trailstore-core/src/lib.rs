//! Record persistence core for partition/sort-key document stores.
//!
//! Record types are declared once as a base schema plus an ordered list of
//! behaviors (timestamps, versioning, search normalization). Each behavior
//! appends hooks to a shared registry, so any combination composes without
//! one clobbering another. Saves run `beforeSave` hooks and save
//! constraints before a conditional put; partial updates accumulate
//! field-level actions and apply them atomically.
pub mod action;
pub mod config;
pub mod constraint;
pub mod db;
pub mod error;
pub mod geohash;
pub mod mixin;
pub mod model;
pub mod obs;
pub mod record;
pub mod value;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        action::{ActionKind, FieldPath, UpdateAction},
        config::StoreConfig,
        constraint::{ProximityConstraint, SaveConstraint, UniqueConstraint},
        db::{
            Db,
            adapter::{Adapter, TableRef},
            clock::{Clock, ManualClock, SystemClock},
            condition::{Condition, KeyCondition},
            memory::{IndexVisibility, MemoryAdapter},
        },
        error::{Error, ErrorClass, ErrorOrigin},
        mixin::{Searchable, Timestamps, Versioned, searchable_value},
        model::{FieldKind, FieldModel, IndexModel, PrimaryKey, TableModel},
        record::{
            Record,
            hook::{Behavior, HookContext, HookRegistry},
            reference::{Reference, ReferenceModel},
            schema::{RecordSchema, RecordSchemaBuilder},
        },
        value::{Item, Value},
    };
}
