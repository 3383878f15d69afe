//! Error types for singular associations
//!
//! Collaborator failures are carried through unmodified; the only error the
//! association proxy recovers from on its own is a strict "not found" lookup.

use std::collections::HashMap;

/// Result type alias for model and association operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Snapshot of a record that failed to persist
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRecord {
    /// Table of the record's model
    pub table: String,
    /// Field values at the time the save failed
    pub fields: HashMap<String, serde_json::Value>,
    /// Validation messages reported by the record
    pub errors: Vec<String>,
}

impl InvalidRecord {
    pub fn describe(&self) -> String {
        if self.errors.is_empty() {
            self.table.clone()
        } else {
            format!("{} ({})", self.table, self.errors.join(", "))
        }
    }
}

/// Error types for ORM operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(String),

    /// Strict lookup found no record
    #[error("Record not found in table '{0}'")]
    NotFound(String),

    /// Record failed validation or constraints while saving
    #[error("Record invalid: {}", .0.describe())]
    RecordInvalid(Box<InvalidRecord>),

    /// Model validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Association loading or bookkeeping failed
    #[error("Relationship error: {0}")]
    Relationship(String),

    /// The active replace strategy does not supply `replace`
    #[error("Replace strategy '{strategy}' does not implement replace(record)")]
    ReplaceNotImplemented { strategy: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ModelError {
    /// Returns the invalid record carried by a `RecordInvalid` error
    pub fn invalid_record(&self) -> Option<&InvalidRecord> {
        match self {
            ModelError::RecordInvalid(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound(_))
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

// Convert from anyhow errors raised inside collaborators
impl From<anyhow::Error> for ModelError {
    fn from(err: anyhow::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_invalid_message_lists_errors() {
        let mut fields = HashMap::new();
        fields.insert("bio".to_string(), json!(""));

        let err = ModelError::RecordInvalid(Box::new(InvalidRecord {
            table: "profiles".to_string(),
            fields,
            errors: vec!["bio can't be blank".to_string()],
        }));

        assert_eq!(err.to_string(), "Record invalid: profiles (bio can't be blank)");
        assert_eq!(err.invalid_record().unwrap().fields["bio"], json!(""));
    }

    #[test]
    fn test_not_found_detection() {
        assert!(ModelError::NotFound("users".to_string()).is_not_found());
        assert!(!ModelError::Database("boom".to_string()).is_not_found());
        assert!(ModelError::Database("boom".to_string()).invalid_record().is_none());
    }

    #[test]
    fn test_from_anyhow() {
        let err: ModelError = anyhow::anyhow!("connection reset").into();
        assert!(matches!(err, ModelError::Database(ref msg) if msg == "connection reset"));
    }
}
