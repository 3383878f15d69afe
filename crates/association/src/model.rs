//! Core Model Trait - What owner and target records expose to associations
//!
//! Associations never know a record's concrete layout. They read and write
//! key columns through field names, the same way the query layer binds
//! values from `to_fields`.

use std::collections::HashMap;
use std::fmt::{Debug, Display};

use serde_json::Value;

use crate::error::{ModelError, ModelResult};

/// Core trait for records that take part in associations
pub trait Model: Send + Sync + Debug {
    /// The type used for this model's primary key
    type PrimaryKey: Clone + Send + Sync + Debug + Display + Into<Value>;

    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Get the primary key value for this model instance
    fn primary_key(&self) -> Option<Self::PrimaryKey>;

    /// Set the primary key value for this model instance
    fn set_primary_key(&mut self, key: Self::PrimaryKey);

    /// Convert model to field-value pairs
    fn to_fields(&self) -> HashMap<String, Value>;

    /// Assign a single field by column name
    fn set_field(&mut self, name: &str, _value: Value) -> ModelResult<()> {
        Err(ModelError::Validation(format!(
            "{} has no writable field '{}'",
            Self::table_name(),
            name
        )))
    }

    /// Read a single field by column name, `None` when the column is unknown
    fn field(&self, name: &str) -> Option<Value> {
        self.to_fields().remove(name)
    }

    /// Primary key as a JSON value, `Null` for unsaved records
    fn primary_key_value(&self) -> Value {
        self.primary_key().map(Into::into).unwrap_or(Value::Null)
    }

    /// A record is new until it has been given a primary key
    fn is_new_record(&self) -> bool {
        self.primary_key().is_none()
    }

    /// Validation messages from the last save attempt
    fn validation_errors(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone)]
    struct Account {
        id: Option<i64>,
        owner_id: Option<i64>,
    }

    impl Model for Account {
        type PrimaryKey = i64;

        fn table_name() -> &'static str {
            "accounts"
        }

        fn primary_key(&self) -> Option<Self::PrimaryKey> {
            self.id
        }

        fn set_primary_key(&mut self, key: Self::PrimaryKey) {
            self.id = Some(key);
        }

        fn to_fields(&self) -> HashMap<String, Value> {
            let mut fields = HashMap::new();
            fields.insert("id".to_string(), json!(self.id));
            fields.insert("owner_id".to_string(), json!(self.owner_id));
            fields
        }
    }

    #[test]
    fn test_default_field_access() {
        let account = Account { id: Some(3), owner_id: None };

        assert_eq!(account.field("id"), Some(json!(3)));
        assert_eq!(account.field("owner_id"), Some(Value::Null));
        assert_eq!(account.field("missing"), None);
        assert_eq!(account.primary_key_value(), json!(3));
        assert!(!account.is_new_record());
    }

    #[test]
    fn test_new_record_and_default_setter() {
        let mut account = Account { id: None, owner_id: None };
        assert!(account.is_new_record());
        assert_eq!(account.primary_key_value(), Value::Null);

        let err = account.set_field("owner_id", json!(1)).unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));

        account.set_primary_key(9);
        assert!(!account.is_new_record());
        assert_eq!(account.owner_id, None);
    }
}
