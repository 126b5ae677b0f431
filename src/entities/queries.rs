//! Root query resolvers for the gateway schema

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::executor::utils;
use crate::schema::{FieldArgs, Projection};

use super::{GatewayContext, uuid_field};

/// Fetch one record by its id field; `Null` when no record matches.
async fn fetch_by_id(ctx: &GatewayContext, entity_kind: &str, id: &str) -> Result<Value> {
    let rows = ctx
        .store
        .find_many_by_keys(entity_kind, &[id.to_string()], "id")
        .await?;
    Ok(rows.into_iter().next().unwrap_or(Value::Null))
}

fn require_id(args: &serde_json::Map<String, Value>) -> Result<String> {
    let id = utils::string_arg(args, "id")
        .ok_or_else(|| anyhow::anyhow!("Missing required argument 'id'"))?;
    Ok(id.to_string())
}

fn require_uuid(args: &serde_json::Map<String, Value>) -> Result<String> {
    let id = require_id(args)?;
    Uuid::parse_str(&id)?;
    Ok(id)
}

pub(super) fn users<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    async move {
        let users = args.ctx.store.find_many("user", None).await?;
        prime_subscription_loaders(args.ctx, args.projection, &users).await?;
        Ok(Value::Array(users))
    }
    .boxed()
}

/// Eagerly populate the two subscription loaders when the selection asks
/// for those fields.
///
/// One pass over the subscription rows replaces a per-direction bulk fetch
/// later; correctness does not depend on it, since the loaders resolve the
/// same data from their own key sets when nothing is primed.
async fn prime_subscription_loaders(
    ctx: &GatewayContext,
    projection: &Projection,
    users: &[Value],
) -> Result<()> {
    let wants_authors = projection.contains("userSubscribedTo");
    let wants_subscribers = projection.contains("subscribedToUser");
    if !wants_authors && !wants_subscribers {
        return Ok(());
    }

    let links = ctx.store.find_many("subscription", None).await?;
    let users_by_id: HashMap<Uuid, &Value> = users
        .iter()
        .map(|user| Ok((uuid_field(user, "id")?, user)))
        .collect::<Result<_>>()?;

    let mut authors_of: HashMap<Uuid, Vec<Value>> = HashMap::new();
    let mut subscribers_of: HashMap<Uuid, Vec<Value>> = HashMap::new();
    for link in &links {
        let subscriber = uuid_field(link, "subscriberId")?;
        let author = uuid_field(link, "authorId")?;
        if wants_authors && let Some(author_row) = users_by_id.get(&author) {
            authors_of
                .entry(subscriber)
                .or_default()
                .push((*author_row).clone());
        }
        if wants_subscribers && let Some(subscriber_row) = users_by_id.get(&subscriber) {
            subscribers_of
                .entry(author)
                .or_default()
                .push((*subscriber_row).clone());
        }
    }

    // Prime every listed user, including the ones with no subscriptions:
    // an empty list is a settled result, not a missing one.
    for user_id in users_by_id.keys() {
        if wants_authors {
            let authors = authors_of.remove(user_id).unwrap_or_default();
            ctx.loaders
                .subscriptions_of
                .prime(*user_id, Value::Array(authors));
        }
        if wants_subscribers {
            let subscribers = subscribers_of.remove(user_id).unwrap_or_default();
            ctx.loaders
                .subscribers_of
                .prime(*user_id, Value::Array(subscribers));
        }
    }
    Ok(())
}

pub(super) fn user<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    async move {
        let id = require_uuid(args.args)?;
        fetch_by_id(args.ctx, "user", &id).await
    }
    .boxed()
}

pub(super) fn posts<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    async move { Ok(Value::Array(args.ctx.store.find_many("post", None).await?)) }.boxed()
}

pub(super) fn post<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    async move {
        let id = require_uuid(args.args)?;
        fetch_by_id(args.ctx, "post", &id).await
    }
    .boxed()
}

pub(super) fn profiles<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    async move { Ok(Value::Array(args.ctx.store.find_many("profile", None).await?)) }.boxed()
}

pub(super) fn profile<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    async move {
        let id = require_uuid(args.args)?;
        fetch_by_id(args.ctx, "profile", &id).await
    }
    .boxed()
}

pub(super) fn member_types<'a>(
    args: FieldArgs<'a, GatewayContext>,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        Ok(Value::Array(
            args.ctx.store.find_many("member_type", None).await?,
        ))
    }
    .boxed()
}

pub(super) fn member_type<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    async move {
        let id = require_id(args.args)?;
        fetch_by_id(args.ctx, "member_type", &id).await
    }
    .boxed()
}
