//! In-memory store backend.
//!
//! Implements the same observable semantics as the Postgres backend over a
//! `HashMap` of collections. Integration tests and local development run
//! against this backend so they need no database.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use super::{Document, FindOptions, ResourceStore, StoreError};
use crate::uuid::uuidv7;

/// Process-local document store, keyed by collection name. Documents keep
/// insertion order within a collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Top-level field equality, the same containment the JSONB backend uses.
fn matches(doc: &Document, filter: &Document) -> bool {
    match filter.as_object() {
        Some(fields) => fields.iter().all(|(k, v)| doc.get(k) == Some(v)),
        None => false,
    }
}

fn apply_options(docs: Vec<Document>, options: FindOptions) -> Vec<Document> {
    let skip = options.skip.unwrap_or(0) as usize;
    let iter = docs.into_iter().skip(skip);
    match options.limit {
        Some(limit) => iter.take(limit as usize).collect(),
        None => iter.collect(),
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).cloned().collect())
            .unwrap_or_default();
        Ok(apply_options(docs, options))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| matches(d, filter)).cloned()))
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<String, StoreError> {
        let Some(obj) = document.as_object_mut() else {
            return Err(StoreError::InvalidDocument("not a JSON object".into()));
        };
        let existing = obj.get("id").and_then(Value::as_str).map(str::to_owned);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = uuidv7().to_string();
                obj.insert("id".into(), json!(id));
                id
            }
        };
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        patch: &Document,
    ) -> Result<u64, StoreError> {
        let Some(fields) = patch.as_object() else {
            return Err(StoreError::InvalidDocument("patch is not a JSON object".into()));
        };
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(doc) = docs.iter_mut().find(|d| matches(d, filter)) else {
            return Ok(0);
        };
        if let Some(target) = doc.as_object_mut() {
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
        }
        Ok(1)
    }

    async fn delete_one(&self, collection: &str, filter: &Document) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match docs.iter().position(|d| matches(d, filter)) {
            Some(idx) => {
                docs.remove(idx);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count_documents(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).count() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn insert_assigns_id_and_find_one_matches() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("users", json!({"email": "a@x.com", "role": "donor"}))
            .await
            .unwrap();

        let found = store
            .find_one("users", &json!({"email": "a@x.com"}))
            .await
            .unwrap()
            .expect("document");
        assert_eq!(found["id"], json!(id));
        assert_eq!(found["role"], json!("donor"));
    }

    #[tokio::test]
    async fn filter_is_top_level_equality() {
        let store = MemoryStore::new();
        store
            .insert_one("requests", json!({"status": "pending", "who": "a"}))
            .await
            .unwrap();
        store
            .insert_one("requests", json!({"status": "done", "who": "b"}))
            .await
            .unwrap();

        let pending = store
            .find("requests", &json!({"status": "pending"}), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0]["who"], json!("a"));

        let all = store
            .find("requests", &json!({}), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn skip_and_limit_paginate_in_insertion_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert_one("items", json!({"n": i}))
                .await
                .unwrap();
        }

        let page = store
            .find("items", &json!({}), FindOptions::page(2, 2))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0]["n"], json!(2));
        assert_eq!(page[1]["n"], json!(3));
    }

    #[tokio::test]
    async fn update_one_merges_only_first_match() {
        let store = MemoryStore::new();
        store
            .insert_one("items", json!({"kind": "x", "v": 1}))
            .await
            .unwrap();
        store
            .insert_one("items", json!({"kind": "x", "v": 2}))
            .await
            .unwrap();

        let n = store
            .update_one("items", &json!({"kind": "x"}), &json!({"v": 9, "seen": true}))
            .await
            .unwrap();
        assert_eq!(n, 1);

        let docs = store
            .find("items", &json!({}), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(docs[0]["v"], json!(9));
        assert_eq!(docs[0]["seen"], json!(true));
        assert_eq!(docs[1]["v"], json!(2));
        assert!(docs[1].get("seen").is_none());
    }

    #[tokio::test]
    async fn delete_one_removes_a_single_document() {
        let store = MemoryStore::new();
        store.insert_one("items", json!({"kind": "x"})).await.unwrap();
        store.insert_one("items", json!({"kind": "x"})).await.unwrap();

        assert_eq!(store.delete_one("items", &json!({"kind": "x"})).await.unwrap(), 1);
        assert_eq!(store.count_documents("items", &json!({})).await.unwrap(), 1);
        assert_eq!(store.delete_one("items", &json!({"kind": "y"})).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn count_respects_filter() {
        let store = MemoryStore::new();
        store.insert_one("f", json!({"email": "a"})).await.unwrap();
        store.insert_one("f", json!({"email": "a"})).await.unwrap();
        store.insert_one("f", json!({"email": "b"})).await.unwrap();

        assert_eq!(store.count_documents("f", &json!({"email": "a"})).await.unwrap(), 2);
        assert_eq!(store.count_documents("f", &json!({})).await.unwrap(), 3);
        assert_eq!(store.count_documents("missing", &json!({})).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn non_object_document_is_rejected() {
        let store = MemoryStore::new();
        let err = store.insert_one("items", json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
    }
}
