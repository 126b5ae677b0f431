//! Selection-set resolution with sibling fan-out
//!
//! The engine walks the requested field tree against a parent value. The one
//! rule that matters for batching lives here: at every level, the futures
//! for all sibling fields (and all sibling list items) are created before
//! any of them is awaited. Every `load` they issue therefore lands in the
//! same synchronous burst, and the loaders see one window per level instead
//! of one fetch per sibling.
//!
//! Failures never propagate past the field they occurred in: the field's
//! position carries `null`, an error entry records the path, and siblings
//! keep resolving. Values are reassembled in request order regardless of
//! completion order.

use futures::future::{BoxFuture, FutureExt, join_all};
use graphql_parser::query::{Field, Selection, SelectionSet, TypeCondition};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use super::depth::FragmentMap;
use super::utils;
use crate::core::{ErrorEntry, FieldError, PathSegment};
use crate::schema::{FieldArgs, FieldDef, FieldShape, MUTATION_TYPE, Projection, Schema};

/// Everything one execution pass needs to look at: registry, fragments,
/// variables, and the per-request resolution context.
pub(super) struct ExecCtx<'q, Ctx> {
    pub schema: &'q Schema<Ctx>,
    pub fragments: &'q FragmentMap<'q>,
    pub variables: &'q HashMap<String, Value>,
    pub ctx: &'q Ctx,
}

/// Flatten a selection set into its fields, expanding fragment spreads and
/// inline fragments whose type condition matches `type_name`.
fn expand<'q, Ctx>(
    exec: &ExecCtx<'q, Ctx>,
    type_name: &str,
    selections: &'q [Selection<'q, String>],
    out: &mut Vec<&'q Field<'q, String>>,
) {
    for selection in selections {
        match selection {
            Selection::Field(field) => out.push(field),
            Selection::FragmentSpread(spread) => {
                // Unknown fragments were already rejected by validation.
                if let Some(fragment) = exec.fragments.get(spread.fragment_name.as_str()) {
                    let TypeCondition::On(on) = &fragment.type_condition;
                    if on == type_name {
                        expand(exec, type_name, &fragment.selection_set.items, out);
                    }
                }
            }
            Selection::InlineFragment(inline) => {
                let applies = match &inline.type_condition {
                    None => true,
                    Some(TypeCondition::On(on)) => on == type_name,
                };
                if applies {
                    expand(exec, type_name, &inline.selection_set.items, out);
                }
            }
        }
    }
}

/// Association names of `type_name` requested in the selection set, handed
/// to the resolver for priming and store-projection decisions.
fn projection_for<'q, Ctx>(
    exec: &ExecCtx<'q, Ctx>,
    type_name: &str,
    selection_set: &'q SelectionSet<'q, String>,
) -> Projection {
    let mut fields = Vec::new();
    expand(exec, type_name, &selection_set.items, &mut fields);

    let names: HashSet<String> = fields
        .iter()
        .filter(|field| {
            exec.schema
                .field(type_name, field.name.as_str())
                .is_some_and(FieldDef::is_association)
        })
        .map(|field| field.name.clone())
        .collect();
    Projection::from_names(names)
}

/// Resolve a selection set against one parent value.
///
/// Sibling fields fan out: all futures are created, then awaited together.
pub(super) fn resolve_selection_set<'a, 'q: 'a, Ctx: Send + Sync>(
    exec: &'a ExecCtx<'q, Ctx>,
    type_name: &'a str,
    parent: &'a Value,
    selections: &'q [Selection<'q, String>],
    path: Vec<PathSegment>,
) -> BoxFuture<'a, (Value, Vec<ErrorEntry>)> {
    async move {
        let mut fields = Vec::new();
        expand(exec, type_name, selections, &mut fields);

        let field_futures: Vec<_> = fields
            .into_iter()
            .map(|field| resolve_field(exec, type_name, parent, field, &path))
            .collect();
        let resolved = join_all(field_futures).await;

        // Reassemble in request order, whatever order the futures settled in.
        let mut result = Map::new();
        let mut errors = Vec::new();
        for (key, value, field_errors) in resolved {
            result.insert(key, value);
            errors.extend(field_errors);
        }
        (Value::Object(result), errors)
    }
    .boxed()
}

/// Resolve root mutation fields one at a time, in document order.
///
/// Serial on purpose: each mutation observes the store effects of the
/// previous one. Result subtrees still fan out normally.
pub(super) async fn resolve_mutation_root<'q, Ctx: Send + Sync>(
    exec: &ExecCtx<'q, Ctx>,
    selections: &'q [Selection<'q, String>],
) -> (Value, Vec<ErrorEntry>) {
    let mut fields = Vec::new();
    expand(exec, MUTATION_TYPE, selections, &mut fields);

    let root = Value::Null;
    let mut result = Map::new();
    let mut errors = Vec::new();
    for field in fields {
        let (key, value, field_errors) =
            resolve_field(exec, MUTATION_TYPE, &root, field, &[]).await;
        result.insert(key, value);
        errors.extend(field_errors);
    }
    (Value::Object(result), errors)
}

/// Resolve one field: scalar read, or resolver call plus recursion into the
/// resolved value. Returns (response key, value, errors); a failure is
/// converted here into `null` plus a path-scoped error entry.
async fn resolve_field<'a, 'q: 'a, Ctx: Send + Sync>(
    exec: &'a ExecCtx<'q, Ctx>,
    type_name: &'a str,
    parent: &'a Value,
    field: &'q Field<'q, String>,
    path: &'a [PathSegment],
) -> (String, Value, Vec<ErrorEntry>) {
    let key = field
        .alias
        .clone()
        .unwrap_or_else(|| field.name.clone());
    let mut field_path = path.to_vec();
    field_path.push(PathSegment::Field(key.clone()));

    let Some(def) = exec.schema.field(type_name, field.name.as_str()) else {
        return (
            key,
            Value::Null,
            vec![FieldError::unknown_field(type_name, &field.name).at(field_path)],
        );
    };

    match def {
        FieldDef::Scalar => {
            let value = parent
                .get(field.name.as_str())
                .cloned()
                .unwrap_or(Value::Null);
            (key, value, Vec::new())
        }
        FieldDef::Association { shape, resolver } => {
            let args = utils::collect_arguments(field, exec.variables);
            let projection = match shape.object_type() {
                Some(object_type) => projection_for(exec, object_type, &field.selection_set),
                None => Projection::none(),
            };

            let resolved = resolver(FieldArgs {
                parent,
                args: &args,
                ctx: exec.ctx,
                projection: &projection,
            })
            .await;

            match resolved {
                Ok(value) => {
                    complete_value(exec, &key, shape, value, &field.selection_set, field_path)
                        .await
                }
                Err(err) => {
                    tracing::debug!(type_name, field = %key, error = %err, "resolver failed");
                    (key, Value::Null, vec![FieldError::from(err).at(field_path)])
                }
            }
        }
    }
}

/// Recurse into a resolved association value according to its shape.
///
/// List items fan out the same way sibling fields do.
async fn complete_value<'a, 'q: 'a, Ctx: Send + Sync>(
    exec: &'a ExecCtx<'q, Ctx>,
    key: &str,
    shape: &'a FieldShape,
    value: Value,
    selection_set: &'q SelectionSet<'q, String>,
    path: Vec<PathSegment>,
) -> (String, Value, Vec<ErrorEntry>) {
    let key = key.to_string();
    match shape {
        FieldShape::Leaf => (key, value, Vec::new()),
        FieldShape::Object(object_type) => {
            if value.is_null() || selection_set.items.is_empty() {
                return (key, value, Vec::new());
            }
            let (value, errors) =
                resolve_selection_set(exec, object_type, &value, &selection_set.items, path).await;
            (key, value, errors)
        }
        FieldShape::List(object_type) => {
            if value.is_null() || selection_set.items.is_empty() {
                return (key, value, Vec::new());
            }
            let Value::Array(items) = value else {
                let error =
                    FieldError::new(format!("Expected a list of {}", object_type)).at(path);
                return (key, Value::Null, vec![error]);
            };

            let item_futures: Vec<_> = items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    let mut item_path = path.clone();
                    item_path.push(PathSegment::Index(idx));
                    async move {
                        if item.is_null() {
                            (Value::Null, Vec::new())
                        } else {
                            resolve_selection_set(
                                exec,
                                object_type,
                                item,
                                &selection_set.items,
                                item_path,
                            )
                            .await
                        }
                    }
                })
                .collect();
            let resolved = join_all(item_futures).await;

            let mut out = Vec::with_capacity(resolved.len());
            let mut errors = Vec::new();
            for (item_value, item_errors) in resolved {
                out.push(item_value);
                errors.extend(item_errors);
            }
            (key, Value::Array(out), errors)
        }
    }
}
