use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::Paise;

use super::paths;

/// One write in a multi-path commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Replace the node at `path`. A null value removes it.
    Set { path: String, value: Value },
    /// Merge `fields` into the node at `path`, creating it if absent. A null
    /// field removes that field.
    Merge {
        path: String,
        fields: Map<String, Value>,
    },
    /// Add `delta` to a numeric field of an existing node.
    Increment {
        path: String,
        field: String,
        delta: i64,
    },
}

impl Mutation {
    pub fn set(path: impl Into<String>, value: Value) -> Self {
        Mutation::Set {
            path: path.into(),
            value,
        }
    }

    pub fn merge(path: impl Into<String>, fields: Map<String, Value>) -> Self {
        Mutation::Merge {
            path: path.into(),
            fields,
        }
    }

    pub fn increment(path: impl Into<String>, field: impl Into<String>, delta: i64) -> Self {
        Mutation::Increment {
            path: path.into(),
            field: field.into(),
            delta,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Mutation::Set { path, .. }
            | Mutation::Merge { path, .. }
            | Mutation::Increment { path, .. } => path,
        }
    }
}

/// Outcome of a conditional balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceAdjustment {
    /// The delta and every accompanying mutation were committed.
    Applied { new_balance: Paise },
    /// The delta would take the balance below zero. Nothing was written.
    Insufficient { balance: Paise },
    /// The delta would overflow the balance. Nothing was written.
    Overflow { balance: Paise },
    /// No profile exists for the user. Nothing was written.
    ProfileMissing,
}

/// Key-path tree store.
///
/// Nodes are JSON values addressed by `/`-separated paths. Reading a path
/// with no node of its own returns an object of its direct children keyed
/// by child key, or `None` when it has none.
#[async_trait]
pub trait Store: Send + Sync {
    async fn read(&self, path: &str) -> Result<Option<Value>>;

    /// Overwrite the node at `path`. Writing null removes it.
    async fn write(&self, path: &str, value: Value) -> Result<()>;

    /// Merge `fields` into the node at `path`; see [`Mutation::Merge`].
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()>;

    /// Apply all mutations atomically, in order.
    async fn commit(&self, mutations: Vec<Mutation>) -> Result<()>;

    /// Append the string `item` to the array `field` of the node at `path`
    /// unless it is already there, atomically. Returns false when the item
    /// was present or the node is missing.
    async fn insert_unique(&self, path: &str, field: &str, item: &str) -> Result<bool>;

    /// Add `delta` to the user's wallet balance and apply `mutations`, all as
    /// one atomic unit, provided the profile exists and the resulting balance
    /// is not negative.
    async fn adjust_balance(
        &self,
        uid: &str,
        delta: Paise,
        mutations: Vec<Mutation>,
    ) -> Result<BalanceAdjustment>;

    /// Reserve a fresh child path under `parent`. Keys are unique and sort in
    /// creation order. Nothing is written until the caller writes to it.
    fn append_child(&self, parent: &str) -> String {
        paths::child(parent, &Uuid::now_v7().to_string())
    }
}

/// Decode the children of a collection node in key order.
pub fn children_of<T: serde::de::DeserializeOwned>(value: Option<Value>) -> Result<Vec<T>> {
    match value {
        Some(Value::Object(children)) => children
            .into_iter()
            .map(|(_, child)| Ok(serde_json::from_value(child)?))
            .collect(),
        Some(other) => anyhow::bail!("expected a collection, found {other}"),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Item {
        n: i64,
    }

    #[test]
    fn test_children_of() {
        let items: Vec<Item> =
            children_of(Some(json!({ "a": { "n": 1 }, "b": { "n": 2 } }))).unwrap();
        assert_eq!(items, vec![Item { n: 1 }, Item { n: 2 }]);

        let empty: Vec<Item> = children_of(None).unwrap();
        assert!(empty.is_empty());

        assert!(children_of::<Item>(Some(json!(5))).is_err());
    }

    #[test]
    fn test_mutation_path() {
        let m = Mutation::increment("users/u1/goals/g1", "currentAmount", 5);
        assert_eq!(m.path(), "users/u1/goals/g1");
    }
}
