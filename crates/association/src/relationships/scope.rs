//! Association Scope - Criteria used to fetch a singular association's target

use std::collections::HashMap;

use serde_json::Value;

use super::metadata::{ConstraintOperator, RelationshipConstraint};

/// A composable description of the query that finds an association's target.
///
/// Executors decide how to run it; SQL-backed executors can use [`to_sql`].
///
/// [`to_sql`]: AssociationScope::to_sql
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationScope {
    table: String,
    primary_key: String,
    conditions: Vec<RelationshipConstraint>,
    uncached: bool,
}

impl AssociationScope {
    /// Create a scope over `table`, whose rows are identified by `primary_key`
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            conditions: Vec::new(),
            uncached: false,
        }
    }

    /// Add an equality condition.
    ///
    /// Comparing against `Null` follows SQL and matches nothing, so an
    /// unsaved owner never picks up orphaned rows.
    pub fn where_eq(mut self, column: impl Into<String>, value: Value) -> Self {
        self.conditions
            .push(RelationshipConstraint::new(column, ConstraintOperator::Equal, value));
        self
    }

    /// Add arbitrary constraints
    pub fn with_constraints<'a>(
        mut self,
        constraints: impl IntoIterator<Item = &'a RelationshipConstraint>,
    ) -> Self {
        self.conditions.extend(constraints.into_iter().cloned());
        self
    }

    /// Ask the executor to bypass any result cache it maintains
    pub fn uncached(mut self) -> Self {
        self.uncached = true;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn conditions(&self) -> &[RelationshipConstraint] {
        &self.conditions
    }

    pub fn is_uncached(&self) -> bool {
        self.uncached
    }

    /// Attributes implied for records created through this scope.
    ///
    /// Equality conditions become attribute defaults, except the target's
    /// own primary key which is left for the store to assign.
    pub fn attributes_for_create(&self) -> HashMap<String, Value> {
        self.conditions
            .iter()
            .filter(|c| c.operator == ConstraintOperator::Equal && c.column != self.primary_key)
            .map(|c| (c.column.clone(), c.value.clone()))
            .collect()
    }

    /// Returns true if `record` satisfies every condition of this scope
    pub fn matches(&self, record: &HashMap<String, Value>) -> bool {
        self.conditions.iter().all(|c| {
            let actual = record.get(&c.column).unwrap_or(&Value::Null);
            match c.operator {
                ConstraintOperator::Equal => !c.value.is_null() && actual == &c.value,
                ConstraintOperator::NotEqual => !c.value.is_null() && actual != &c.value,
                ConstraintOperator::IsNull => actual.is_null(),
                ConstraintOperator::IsNotNull => !actual.is_null(),
                ConstraintOperator::In => list_contains(&c.value, actual),
                ConstraintOperator::NotIn => !list_contains(&c.value, actual),
                ConstraintOperator::GreaterThan => compare(actual, &c.value).is_some_and(|o| o.is_gt()),
                ConstraintOperator::LessThan => compare(actual, &c.value).is_some_and(|o| o.is_lt()),
                ConstraintOperator::GreaterThanOrEqual => {
                    compare(actual, &c.value).is_some_and(|o| o.is_ge())
                }
                ConstraintOperator::LessThanOrEqual => {
                    compare(actual, &c.value).is_some_and(|o| o.is_le())
                }
                ConstraintOperator::Like => like(actual, &c.value),
            }
        })
    }

    /// Render as `SELECT ... LIMIT 1` with `$n` placeholders and their bindings
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT * FROM {}", self.table);
        let mut bindings = Vec::new();
        let mut clauses = Vec::with_capacity(self.conditions.len());

        for condition in &self.conditions {
            let op = condition.operator.to_sql();
            if condition.operator.is_unary() {
                clauses.push(format!("{} {}", condition.column, op));
            } else if condition.operator.takes_list() {
                let items = condition.value.as_array().cloned().unwrap_or_default();
                let mut placeholders = Vec::with_capacity(items.len());
                for item in items {
                    bindings.push(item);
                    placeholders.push(format!("${}", bindings.len()));
                }
                clauses.push(format!("{} {} ({})", condition.column, op, placeholders.join(", ")));
            } else {
                bindings.push(condition.value.clone());
                clauses.push(format!("{} {} ${}", condition.column, op, bindings.len()));
            }
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" LIMIT 1");

        (sql, bindings)
    }
}

fn list_contains(list: &Value, value: &Value) -> bool {
    list.as_array().is_some_and(|items| items.contains(value))
}

fn compare(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

// Only `%` wildcards at either end are understood.
fn like(value: &Value, pattern: &Value) -> bool {
    let (Some(value), Some(pattern)) = (value.as_str(), pattern.as_str()) else {
        return false;
    };
    if let Some(inner) = pattern.strip_prefix('%').and_then(|p| p.strip_suffix('%')) {
        value.contains(inner)
    } else if let Some(suffix) = pattern.strip_prefix('%') {
        value.ends_with(suffix)
    } else if let Some(prefix) = pattern.strip_suffix('%') {
        value.starts_with(prefix)
    } else {
        value == pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_to_sql_binds_in_order() {
        let scope = AssociationScope::new("profiles", "id")
            .where_eq("user_id", json!(7))
            .with_constraints(&[
                RelationshipConstraint::equals("visible", true),
                RelationshipConstraint::new("kind", ConstraintOperator::In, json!(["a", "b"])),
            ]);

        let (sql, bindings) = scope.to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM profiles WHERE user_id = $1 AND visible = $2 AND kind IN ($3, $4) LIMIT 1"
        );
        assert_eq!(bindings, vec![json!(7), json!(true), json!("a"), json!("b")]);
    }

    #[test]
    fn test_null_key_matches_nothing() {
        let scope = AssociationScope::new("profiles", "id").where_eq("user_id", Value::Null);
        let (sql, bindings) = scope.to_sql();

        assert_eq!(sql, "SELECT * FROM profiles WHERE user_id = $1 LIMIT 1");
        assert_eq!(bindings, vec![Value::Null]);
        assert!(!scope.matches(&fields(&[("user_id", Value::Null)])));
        assert!(!scope.matches(&fields(&[("id", json!(1))])));
    }

    #[test]
    fn test_attributes_for_create_skip_primary_key() {
        let scope = AssociationScope::new("profiles", "id")
            .where_eq("user_id", json!(7))
            .where_eq("id", json!(3))
            .with_constraints(&[RelationshipConstraint::new(
                "score",
                ConstraintOperator::GreaterThan,
                json!(1),
            )]);

        let attributes = scope.attributes_for_create();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes["user_id"], json!(7));
    }

    #[test]
    fn test_matches_operators() {
        let scope = AssociationScope::new("profiles", "id")
            .where_eq("user_id", json!(7))
            .with_constraints(&[
                RelationshipConstraint::new("score", ConstraintOperator::GreaterThanOrEqual, json!(10)),
                RelationshipConstraint::new("bio", ConstraintOperator::Like, json!("%rust%")),
            ]);

        assert!(scope.matches(&fields(&[
            ("user_id", json!(7)),
            ("score", json!(10)),
            ("bio", json!("writes rust daily")),
        ])));
        assert!(!scope.matches(&fields(&[
            ("user_id", json!(7)),
            ("score", json!(9)),
            ("bio", json!("writes rust daily")),
        ])));
        assert!(!scope.matches(&fields(&[("user_id", json!(8))])));
    }

    #[test]
    fn test_uncached_flag() {
        let scope = AssociationScope::new("users", "id");
        assert!(!scope.is_uncached());
        assert!(scope.uncached().is_uncached());
    }
}
