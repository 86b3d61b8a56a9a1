//! Runtime record-type declarations.
//!
//! Entity authors describe a table once (keys, attributes, secondary
//! indexes); the lifecycle, constraints, and adapters all read these
//! descriptors instead of reflecting over records.
pub mod field;
pub mod index;
pub mod key;

pub use field::{FieldKind, FieldModel};
pub use index::{IndexModel, TableModel};
pub use key::PrimaryKey;
