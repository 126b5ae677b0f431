//! Built-in gateway schema: users, profiles, posts and member types
//!
//! The concrete domain wired onto the engine: entity kinds stored as JSON
//! records, five association key-spaces with one batch loader each, root
//! queries, and the full mutation set. [`GatewayContext`] is the resolution
//! context — constructed fresh per query by the factory, holding the store
//! handle plus the loaders, and dropped (workers aborted) when the query
//! finishes.

mod loaders;
mod mutations;
mod queries;
mod types;

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::loader::Loader;
use crate::schema::{Schema, SchemaBuilder};
use crate::storage::DataStore;
use loaders::{MemberTypeById, PostsByAuthor, ProfileByUser, SubscriptionSide, SubscriptionUsers};

/// One batch loader per association key-space.
pub struct GatewayLoaders {
    pub profile_by_user: Loader<Uuid, Value>,
    pub posts_by_author: Loader<Uuid, Value>,
    pub member_type_by_id: Loader<String, Value>,
    pub subscriptions_of: Loader<Uuid, Value>,
    pub subscribers_of: Loader<Uuid, Value>,
}

/// Per-query resolution context: the store handle and the loaders.
///
/// Never shared across queries; loader caches die with the context, so no
/// read can leak from one request into the next.
pub struct GatewayContext {
    pub store: Arc<dyn DataStore>,
    pub loaders: GatewayLoaders,
}

impl GatewayContext {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        let loaders = GatewayLoaders {
            profile_by_user: Loader::new(
                "profile-by-user",
                ProfileByUser {
                    store: store.clone(),
                },
            ),
            posts_by_author: Loader::new(
                "posts-by-author",
                PostsByAuthor {
                    store: store.clone(),
                },
            ),
            member_type_by_id: Loader::new(
                "member-type",
                MemberTypeById {
                    store: store.clone(),
                },
            ),
            subscriptions_of: Loader::new(
                "subscriptions-of",
                SubscriptionUsers {
                    store: store.clone(),
                    side: SubscriptionSide::AuthorsOfSubscriber,
                },
            ),
            subscribers_of: Loader::new(
                "subscribers-of",
                SubscriptionUsers {
                    store: store.clone(),
                    side: SubscriptionSide::SubscribersOfAuthor,
                },
            ),
        };
        Self { store, loaders }
    }

    /// Context factory for [`Executor::new`](crate::executor::Executor::new):
    /// every query gets a fresh context over the same store.
    pub fn factory(store: Arc<dyn DataStore>) -> impl Fn() -> GatewayContext + Send + Sync {
        move || GatewayContext::new(store.clone())
    }
}

/// Read a UUID out of a record field.
fn uuid_field(record: &Value, field: &str) -> Result<Uuid> {
    let raw = record
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("Record missing '{}' field", field))?;
    Ok(Uuid::parse_str(raw)?)
}

/// Build the gateway's field registry.
pub fn gateway_schema() -> Schema<GatewayContext> {
    let mut builder = SchemaBuilder::new();

    builder
        .query()
        .list_field("users", "User", queries::users)
        .object_field("user", "User", queries::user)
        .list_field("posts", "Post", queries::posts)
        .object_field("post", "Post", queries::post)
        .list_field("profiles", "Profile", queries::profiles)
        .object_field("profile", "Profile", queries::profile)
        .list_field("memberTypes", "MemberType", queries::member_types)
        .object_field("memberType", "MemberType", queries::member_type);

    builder
        .object("User")
        .scalars(&["id", "name", "balance"])
        .object_field("profile", "Profile", types::user_profile)
        .list_field("posts", "Post", types::user_posts)
        .list_field("userSubscribedTo", "User", types::user_subscribed_to)
        .list_field("subscribedToUser", "User", types::subscribed_to_user);

    builder
        .object("Profile")
        .scalars(&["id", "isMale", "yearOfBirth", "userId", "memberTypeId"])
        .object_field("memberType", "MemberType", types::profile_member_type);

    builder
        .object("Post")
        .scalars(&["id", "title", "content", "authorId"]);

    builder
        .object("MemberType")
        .scalars(&["id", "discount", "postsLimitPerMonth"]);

    mutations::register(&mut builder);

    builder.build()
}
