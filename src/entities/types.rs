//! Association field resolvers for the gateway's object types
//!
//! Every resolver routes through the context's loaders, so sibling
//! selections coalesce into one bulk fetch per key-space and window.

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Value, json};

use crate::schema::FieldArgs;

use super::{GatewayContext, uuid_field};

pub(super) fn user_profile<'a>(
    args: FieldArgs<'a, GatewayContext>,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        let user_id = uuid_field(args.parent, "id")?;
        let profile = args.ctx.loaders.profile_by_user.load(user_id).await?;
        Ok(profile.unwrap_or(Value::Null))
    }
    .boxed()
}

pub(super) fn user_posts<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    async move {
        let user_id = uuid_field(args.parent, "id")?;
        let posts = args.ctx.loaders.posts_by_author.load(user_id).await?;
        // No rows for the author means an empty list, not an absent one.
        Ok(posts.unwrap_or_else(|| json!([])))
    }
    .boxed()
}

pub(super) fn user_subscribed_to<'a>(
    args: FieldArgs<'a, GatewayContext>,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        let user_id = uuid_field(args.parent, "id")?;
        let authors = args.ctx.loaders.subscriptions_of.load(user_id).await?;
        Ok(authors.unwrap_or_else(|| json!([])))
    }
    .boxed()
}

pub(super) fn subscribed_to_user<'a>(
    args: FieldArgs<'a, GatewayContext>,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        let user_id = uuid_field(args.parent, "id")?;
        let subscribers = args.ctx.loaders.subscribers_of.load(user_id).await?;
        Ok(subscribers.unwrap_or_else(|| json!([])))
    }
    .boxed()
}

pub(super) fn profile_member_type<'a>(
    args: FieldArgs<'a, GatewayContext>,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        let member_type_id = args
            .parent
            .get("memberTypeId")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("Profile missing 'memberTypeId' field"))?
            .to_string();
        let member_type = args
            .ctx
            .loaders
            .member_type_by_id
            .load(member_type_id)
            .await?;
        Ok(member_type.unwrap_or(Value::Null))
    }
    .boxed()
}
