//! Batch functions for the gateway's association key-spaces
//!
//! Each function turns one window's key set into a single bulk store call
//! (two for the subscription spaces, which join through the subscription
//! rows) and attributes rows back to keys by explicit field match, never by
//! row position.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::loader::BatchFn;
use crate::storage::DataStore;

use super::uuid_field;

fn key_strings(keys: &[Uuid]) -> Vec<String> {
    keys.iter().map(Uuid::to_string).collect()
}

/// `profile-by-user`: one profile row per user id.
pub(super) struct ProfileByUser {
    pub store: Arc<dyn DataStore>,
}

#[async_trait]
impl BatchFn<Uuid, Value> for ProfileByUser {
    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Value>> {
        let rows = self
            .store
            .find_many_by_keys("profile", &key_strings(keys), "userId")
            .await?;

        let mut by_user = HashMap::new();
        for row in rows {
            let user_id = uuid_field(&row, "userId")?;
            by_user.insert(user_id, row);
        }
        Ok(by_user)
    }
}

/// `posts-by-author`: all post rows grouped per author id.
pub(super) struct PostsByAuthor {
    pub store: Arc<dyn DataStore>,
}

#[async_trait]
impl BatchFn<Uuid, Value> for PostsByAuthor {
    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Value>> {
        let rows = self
            .store
            .find_many_by_keys("post", &key_strings(keys), "authorId")
            .await?;

        let mut by_author: HashMap<Uuid, Vec<Value>> = HashMap::new();
        for row in rows {
            let author_id = uuid_field(&row, "authorId")?;
            by_author.entry(author_id).or_default().push(row);
        }
        Ok(by_author
            .into_iter()
            .map(|(author_id, posts)| (author_id, Value::Array(posts)))
            .collect())
    }
}

/// `member-type`: member type rows by their string id.
pub(super) struct MemberTypeById {
    pub store: Arc<dyn DataStore>,
}

#[async_trait]
impl BatchFn<String, Value> for MemberTypeById {
    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Value>> {
        let rows = self
            .store
            .find_many_by_keys("member_type", keys, "id")
            .await?;

        let mut by_id = HashMap::new();
        for row in rows {
            if let Some(id) = row.get("id").and_then(Value::as_str) {
                by_id.insert(id.to_string(), row);
            }
        }
        Ok(by_id)
    }
}

/// Which side of a subscription row carries the loader's key, and which
/// carries the user to return.
#[derive(Clone, Copy)]
pub(super) enum SubscriptionSide {
    /// Key is the subscriber; resolve the authors they follow.
    AuthorsOfSubscriber,
    /// Key is the author; resolve the subscribers following them.
    SubscribersOfAuthor,
}

impl SubscriptionSide {
    fn key_field(self) -> &'static str {
        match self {
            SubscriptionSide::AuthorsOfSubscriber => "subscriberId",
            SubscriptionSide::SubscribersOfAuthor => "authorId",
        }
    }

    fn target_field(self) -> &'static str {
        match self {
            SubscriptionSide::AuthorsOfSubscriber => "authorId",
            SubscriptionSide::SubscribersOfAuthor => "subscriberId",
        }
    }
}

/// `subscriptions-of` / `subscribers-of`: user rows joined through the
/// subscription rows, one direction per instance.
pub(super) struct SubscriptionUsers {
    pub store: Arc<dyn DataStore>,
    pub side: SubscriptionSide,
}

#[async_trait]
impl BatchFn<Uuid, Value> for SubscriptionUsers {
    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Value>> {
        let links = self
            .store
            .find_many_by_keys("subscription", &key_strings(keys), self.side.key_field())
            .await?;

        // Second hop: fetch every linked user once, then group per key.
        let mut target_ids: Vec<String> = Vec::new();
        for link in &links {
            let target = uuid_field(link, self.side.target_field())?.to_string();
            if !target_ids.contains(&target) {
                target_ids.push(target);
            }
        }
        let users = self
            .store
            .find_many_by_keys("user", &target_ids, "id")
            .await?;
        let users_by_id: HashMap<Uuid, &Value> = users
            .iter()
            .map(|user| Ok((uuid_field(user, "id")?, user)))
            .collect::<Result<_>>()?;

        let mut grouped: HashMap<Uuid, Vec<Value>> = HashMap::new();
        for link in &links {
            let key = uuid_field(link, self.side.key_field())?;
            let target = uuid_field(link, self.side.target_field())?;
            if let Some(user) = users_by_id.get(&target) {
                grouped.entry(key).or_default().push((*user).clone());
            }
        }
        Ok(grouped
            .into_iter()
            .map(|(key, users)| (key, Value::Array(users)))
            .collect())
    }
}
