use crate::{
    Error,
    error::{StorageError, ValidationError},
};

/// Log a storage driver error and hide its detail behind `context`.
///
/// The driver message goes to the log only; callers and clients see
/// `context`.
pub fn database_error(context: &str, error: impl std::fmt::Display) -> Error {
    tracing::error!(error = %error, "{context}");
    Error::Storage(StorageError::Database(context.to_string()))
}

/// Extension trait mapping storage driver errors into [`Error::Storage`].
///
/// Storage crates call `.map_db_err_with_context(..)` on query results
/// instead of spelling out the conversion each time.
pub trait DatabaseResultExt<T> {
    /// Convert a database error to a storage error carrying the driver message
    fn map_db_err(self) -> Result<T, Error>;

    /// Log the database error and convert it to a storage error carrying only
    /// `context`
    fn map_db_err_with_context(self, context: &str) -> Result<T, Error>;
}

impl<T, E: std::fmt::Display> DatabaseResultExt<T> for Result<T, E> {
    fn map_db_err(self) -> Result<T, Error> {
        self.map_err(|e| Error::Storage(StorageError::Database(e.to_string())))
    }

    fn map_db_err_with_context(self, context: &str) -> Result<T, Error> {
        self.map_err(|e| database_error(context, e))
    }
}

/// Extension trait turning a missing builder field into a validation error.
pub trait RequiredFieldExt<T> {
    /// Convert `None` to `ValidationError::MissingField("<field> is required")`
    fn require_field(self, field_name: &str) -> Result<T, ValidationError>;
}

impl<T> RequiredFieldExt<T> for Option<T> {
    fn require_field(self, field_name: &str) -> Result<T, ValidationError> {
        self.ok_or_else(|| ValidationError::MissingField(format!("{field_name} is required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_result_ext() {
        let error_result: Result<i32, &str> = Err("database is locked");
        match error_result.map_db_err().unwrap_err() {
            Error::Storage(StorageError::Database(msg)) => {
                assert_eq!(msg, "database is locked");
            }
            other => panic!("Expected storage database error, got {other:?}"),
        }
    }

    #[test]
    fn test_database_result_ext_with_context() {
        let error_result: Result<i32, &str> = Err("timeout");
        match error_result
            .map_db_err_with_context("Failed to redeem invitation code")
            .unwrap_err()
        {
            Error::Storage(StorageError::Database(msg)) => {
                assert_eq!(msg, "Failed to redeem invitation code");
            }
            other => panic!("Expected storage database error, got {other:?}"),
        }
    }

    #[test]
    fn test_database_error_hides_driver_detail() {
        let error = database_error("Failed to find account", "no such table: users");
        assert!(matches!(
            &error,
            Error::Storage(StorageError::Database(msg)) if msg == "Failed to find account"
        ));
        assert!(!error.to_string().contains("no such table"));
    }

    #[test]
    fn test_required_field_ext() {
        assert_eq!(Some("crew").require_field("Role").unwrap(), "crew");

        let missing: Option<String> = None;
        match missing.require_field("Email").unwrap_err() {
            ValidationError::MissingField(msg) => assert_eq!(msg, "Email is required"),
            other => panic!("Expected missing field error, got {other:?}"),
        }
    }
}
