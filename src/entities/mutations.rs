//! Mutation resolvers for the gateway schema
//!
//! Thin pass-throughs to the store's create/update/delete operations;
//! deletes and subscription changes return the affected id rather than a
//! record, so they register as leaf fields.

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::executor::utils;
use crate::schema::{FieldArgs, SchemaBuilder};
use crate::storage::Filter;

use super::GatewayContext;

pub(super) fn register(builder: &mut SchemaBuilder<GatewayContext>) {
    builder
        .mutation()
        .object_field("createUser", "User", create_user)
        .object_field("createPost", "Post", create_post)
        .object_field("createProfile", "Profile", create_profile)
        .object_field("changeUser", "User", change_user)
        .object_field("changePost", "Post", change_post)
        .object_field("changeProfile", "Profile", change_profile)
        .leaf_field("deleteUser", delete_user)
        .leaf_field("deletePost", delete_post)
        .leaf_field("deleteProfile", delete_profile)
        .leaf_field("subscribeTo", subscribe_to)
        .leaf_field("unsubscribeFrom", unsubscribe_from);
}

fn require_dto(args: &Map<String, Value>) -> Result<Value> {
    let dto = utils::object_arg(args, "dto")
        .ok_or_else(|| anyhow::anyhow!("Missing required argument 'dto'"))?;
    Ok(Value::Object(dto.clone()))
}

fn require_uuid_arg(args: &Map<String, Value>, name: &str) -> Result<String> {
    let raw = utils::string_arg(args, name)
        .ok_or_else(|| anyhow::anyhow!("Missing required argument '{}'", name))?;
    Uuid::parse_str(raw)?;
    Ok(raw.to_string())
}

async fn create_entity(
    args: FieldArgs<'_, GatewayContext>,
    entity_kind: &'static str,
) -> Result<Value> {
    let dto = require_dto(args.args)?;
    args.ctx.store.create(entity_kind, dto).await
}

async fn change_entity(
    args: FieldArgs<'_, GatewayContext>,
    entity_kind: &'static str,
) -> Result<Value> {
    let id = require_uuid_arg(args.args, "id")?;
    let dto = require_dto(args.args)?;
    args.ctx.store.update(entity_kind, &id, dto).await
}

async fn delete_entity(
    args: FieldArgs<'_, GatewayContext>,
    entity_kind: &'static str,
) -> Result<Value> {
    let id = require_uuid_arg(args.args, "id")?;
    args.ctx.store.delete(entity_kind, &id).await?;
    Ok(Value::String(id))
}

fn create_user<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    create_entity(args, "user").boxed()
}

fn create_post<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    create_entity(args, "post").boxed()
}

fn create_profile<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    create_entity(args, "profile").boxed()
}

fn change_user<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    change_entity(args, "user").boxed()
}

fn change_post<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    change_entity(args, "post").boxed()
}

fn change_profile<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    change_entity(args, "profile").boxed()
}

fn delete_user<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    delete_entity(args, "user").boxed()
}

fn delete_post<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    delete_entity(args, "post").boxed()
}

fn delete_profile<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    delete_entity(args, "profile").boxed()
}

fn subscribe_to<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    async move {
        let user_id = require_uuid_arg(args.args, "userId")?;
        let author_id = require_uuid_arg(args.args, "authorId")?;
        args.ctx
            .store
            .create(
                "subscription",
                json!({"subscriberId": user_id, "authorId": author_id}),
            )
            .await?;
        Ok(Value::String(user_id))
    }
    .boxed()
}

fn unsubscribe_from<'a>(args: FieldArgs<'a, GatewayContext>) -> BoxFuture<'a, Result<Value>> {
    async move {
        let user_id = require_uuid_arg(args.args, "userId")?;
        let author_id = require_uuid_arg(args.args, "authorId")?;

        let mut filter = Filter::new();
        filter.insert("subscriberId".to_string(), json!(user_id));
        filter.insert("authorId".to_string(), json!(author_id));
        let links = args
            .ctx
            .store
            .find_many("subscription", Some(&filter))
            .await?;
        let link = links.into_iter().next().ok_or_else(|| {
            anyhow::anyhow!(
                "Subscription from '{}' to '{}' not found",
                user_id,
                author_id
            )
        })?;

        let link_id = link
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("Subscription record is missing an id"))?;
        args.ctx.store.delete("subscription", link_id).await?;
        Ok(Value::String(author_id))
    }
    .boxed()
}
