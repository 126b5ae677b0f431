//! Shared fixtures: a seeded store wrapped with call counters

// Not every test binary exercises every helper.
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use batchql::prelude::*;
use serde_json::Value;
use std::sync::Mutex;

/// Store wrapper recording every call that reaches the backing store, so
/// tests can assert batching behavior (one bulk fetch per window) and
/// rejection behavior (zero calls).
pub struct CountingStore {
    inner: InMemoryStore,
    pub find_many_calls: Mutex<Vec<String>>,
    pub find_many_by_keys_calls: Mutex<Vec<(String, Vec<String>, String)>>,
    pub write_calls: Mutex<Vec<String>>,
    pub fail_kinds: Mutex<Vec<String>>,
}

impl CountingStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            find_many_calls: Mutex::new(Vec::new()),
            find_many_by_keys_calls: Mutex::new(Vec::new()),
            write_calls: Mutex::new(Vec::new()),
            fail_kinds: Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent read of `entity_kind` fail.
    pub fn fail_reads_of(&self, entity_kind: &str) {
        self.fail_kinds.lock().unwrap().push(entity_kind.to_string());
    }

    pub fn total_calls(&self) -> usize {
        self.find_many_calls.lock().unwrap().len()
            + self.find_many_by_keys_calls.lock().unwrap().len()
            + self.write_calls.lock().unwrap().len()
    }

    /// Key sets of every `find_many_by_keys` call for one entity kind.
    pub fn bulk_fetches_of(&self, entity_kind: &str) -> Vec<Vec<String>> {
        self.find_many_by_keys_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _, _)| kind == entity_kind)
            .map(|(_, keys, _)| keys.clone())
            .collect()
    }

    fn check_failure(&self, entity_kind: &str) -> Result<()> {
        if self
            .fail_kinds
            .lock()
            .unwrap()
            .iter()
            .any(|kind| kind == entity_kind)
        {
            anyhow::bail!("simulated store outage for '{}'", entity_kind);
        }
        Ok(())
    }
}

#[async_trait]
impl DataStore for CountingStore {
    async fn find_many(&self, entity_kind: &str, filter: Option<&Filter>) -> Result<Vec<Value>> {
        self.find_many_calls
            .lock()
            .unwrap()
            .push(entity_kind.to_string());
        self.check_failure(entity_kind)?;
        self.inner.find_many(entity_kind, filter).await
    }

    async fn find_many_by_keys(
        &self,
        entity_kind: &str,
        keys: &[String],
        foreign_key_field: &str,
    ) -> Result<Vec<Value>> {
        self.find_many_by_keys_calls.lock().unwrap().push((
            entity_kind.to_string(),
            keys.to_vec(),
            foreign_key_field.to_string(),
        ));
        self.check_failure(entity_kind)?;
        self.inner
            .find_many_by_keys(entity_kind, keys, foreign_key_field)
            .await
    }

    async fn create(&self, entity_kind: &str, data: Value) -> Result<Value> {
        self.write_calls
            .lock()
            .unwrap()
            .push(entity_kind.to_string());
        self.inner.create(entity_kind, data).await
    }

    async fn update(&self, entity_kind: &str, id: &str, data: Value) -> Result<Value> {
        self.write_calls
            .lock()
            .unwrap()
            .push(entity_kind.to_string());
        self.inner.update(entity_kind, id, data).await
    }

    async fn delete(&self, entity_kind: &str, id: &str) -> Result<Value> {
        self.write_calls
            .lock()
            .unwrap()
            .push(entity_kind.to_string());
        self.inner.delete(entity_kind, id).await
    }
}

/// Seeded user ids, fixed so tests can assert key sets.
pub struct SeedIds {
    pub alice: String,
    pub bob: String,
    pub carol: String,
}

/// Three users: Alice and Bob have profiles and posts, Carol has neither.
/// Bob subscribes to Alice, Carol subscribes to Alice and Bob.
pub fn seeded_store() -> (Arc<CountingStore>, SeedIds) {
    let ids = SeedIds {
        alice: "11111111-1111-4111-8111-111111111111".to_string(),
        bob: "22222222-2222-4222-8222-222222222222".to_string(),
        carol: "33333333-3333-4333-8333-333333333333".to_string(),
    };

    let store = InMemoryStore::new();
    store
        .seed(
            "member_type",
            vec![
                json!({"id": "BASIC", "discount": 2.5, "postsLimitPerMonth": 10}),
                json!({"id": "BUSINESS", "discount": 7.5, "postsLimitPerMonth": 100}),
            ],
        )
        .unwrap();
    store
        .seed(
            "user",
            vec![
                json!({"id": ids.alice, "name": "Alice", "balance": 120.0}),
                json!({"id": ids.bob, "name": "Bob", "balance": 80.0}),
                json!({"id": ids.carol, "name": "Carol", "balance": 0.0}),
            ],
        )
        .unwrap();
    store
        .seed(
            "profile",
            vec![
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "isMale": false,
                    "yearOfBirth": 1992,
                    "userId": ids.alice,
                    "memberTypeId": "BUSINESS",
                }),
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "isMale": true,
                    "yearOfBirth": 1988,
                    "userId": ids.bob,
                    "memberTypeId": "BASIC",
                }),
            ],
        )
        .unwrap();
    store
        .seed(
            "post",
            vec![
                json!({"id": Uuid::new_v4().to_string(), "title": "Hello", "content": "First!", "authorId": ids.alice}),
                json!({"id": Uuid::new_v4().to_string(), "title": "Again", "content": "Second!", "authorId": ids.alice}),
                json!({"id": Uuid::new_v4().to_string(), "title": "Re: Hello", "content": "Hi back", "authorId": ids.bob}),
            ],
        )
        .unwrap();
    store
        .seed(
            "subscription",
            vec![
                json!({"id": Uuid::new_v4().to_string(), "subscriberId": ids.bob, "authorId": ids.alice}),
                json!({"id": Uuid::new_v4().to_string(), "subscriberId": ids.carol, "authorId": ids.alice}),
                json!({"id": Uuid::new_v4().to_string(), "subscriberId": ids.carol, "authorId": ids.bob}),
            ],
        )
        .unwrap();

    (Arc::new(CountingStore::new(store)), ids)
}

/// Executor over the seeded counting store with the default depth bound.
pub fn gateway_executor(store: Arc<CountingStore>) -> Executor<GatewayContext> {
    Executor::new(
        gateway_schema(),
        EngineConfig::default(),
        GatewayContext::factory(store),
    )
}
