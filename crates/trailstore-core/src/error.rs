use derive_more::Display;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured runtime error with a stable classification.
/// Hook, constraint, and adapter failures all surface through this type and
/// are propagated unchanged by the lifecycle.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a validation failure for a specific origin.
    pub fn validation(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Validation, origin, message)
    }

    /// Construct a record-origin validation failure.
    pub(crate) fn record_validation(message: impl Into<String>) -> Self {
        Self::validation(ErrorOrigin::Record, message)
    }

    /// Construct an action-origin validation failure.
    pub(crate) fn action_validation(message: impl Into<String>) -> Self {
        Self::validation(ErrorOrigin::Action, message)
    }

    /// Construct a hook-origin validation failure.
    pub fn hook_validation(message: impl Into<String>) -> Self {
        Self::validation(ErrorOrigin::Hook, message)
    }

    /// Construct a schema declaration failure.
    pub(crate) fn schema_invalid(message: impl Into<String>) -> Self {
        Self::validation(ErrorOrigin::Schema, message)
    }

    /// A uniqueness or proximity precondition rejected the write.
    pub fn already_exists(table: &str, constraint: &str, key: impl fmt::Display) -> Self {
        Self::new(
            ErrorClass::AlreadyExists,
            ErrorOrigin::Constraint,
            format!("record already exists: {table} ({constraint}) key={key}"),
        )
    }

    /// A caller-supplied write condition did not hold.
    pub fn condition_failed(table: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::ConditionFailed,
            ErrorOrigin::Adapter,
            format!("conditional check failed: {table}: {}", message.into()),
        )
    }

    pub fn not_found(table: &str, key: impl fmt::Display) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Adapter,
            format!("record not found: {table} key={key}"),
        )
    }

    /// Programmer-error guard for updates with nothing to apply.
    pub(crate) fn noop(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Noop, ErrorOrigin::Record, message)
    }

    pub fn adapter_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Adapter, message)
    }

    pub fn adapter_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Adapter, message)
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.class, ErrorClass::Validation)
    }

    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self.class, ErrorClass::AlreadyExists)
    }

    #[must_use]
    pub const fn is_condition_failed(&self) -> bool {
        matches!(self.class, ErrorClass::ConditionFailed)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self.class, ErrorClass::Noop)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Runtime error taxonomy. Only `ConditionFailed` is ever worth a caller
/// retry, and even then only after re-reading the record.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    #[display("validation")]
    Validation,
    #[display("already_exists")]
    AlreadyExists,
    #[display("condition_failed")]
    ConditionFailed,
    #[display("not_found")]
    NotFound,
    #[display("noop")]
    Noop,
    #[display("unsupported")]
    Unsupported,
    #[display("internal")]
    Internal,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ErrorOrigin {
    #[display("action")]
    Action,
    #[display("adapter")]
    Adapter,
    #[display("config")]
    Config,
    #[display("constraint")]
    Constraint,
    #[display("geohash")]
    Geohash,
    #[display("hook")]
    Hook,
    #[display("record")]
    Record,
    #[display("schema")]
    Schema,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_class_prefixes_origin_and_class() {
        let err = Error::not_found("kennels", "k1");

        assert_eq!(
            err.display_with_class(),
            "adapter:not_found: record not found: kennels key=k1"
        );
    }

    #[test]
    fn predicates_follow_class() {
        let err = Error::already_exists("hashers", "hasher_name_index", "h2");
        assert!(err.is_already_exists());
        assert!(!err.is_validation());
        assert_eq!(err.origin, ErrorOrigin::Constraint);

        let err = Error::noop("nothing to do");
        assert!(err.is_noop());
    }
}
