//! Query execution
//!
//! [`Executor`] is the engine's entry point: it parses a query document,
//! gates it on the configured depth bound, builds a fresh resolution context
//! from the factory, and resolves the selection tree against the field
//! registry. Per-field failures surface as path-scoped entries in
//! [`QueryResponse::errors`] next to the partial data; pre-execution
//! rejections return no data and a single error.

mod depth;
mod fields;
pub mod utils;

use graphql_parser::query::{Definition, OperationDefinition, parse_query};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::{ErrorEntry, ValidationError};
use crate::schema::{QUERY_TYPE, Schema};
use depth::FragmentMap;
use fields::ExecCtx;

/// Result envelope of one query: assembled data tree plus every error the
/// pass produced. `data` is absent only when the query was rejected before
/// execution.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry>,
}

impl QueryResponse {
    fn rejected(error: ValidationError) -> Self {
        Self {
            data: None,
            errors: vec![error.into_entry()],
        }
    }
}

/// The resolution engine.
///
/// Holds the field registry, the engine configuration, and a factory
/// producing one fresh resolution context per query. Contexts are never
/// shared between queries: the factory runs at query start and the context
/// (with all its loaders) is dropped when the query returns.
pub struct Executor<Ctx> {
    schema: Arc<Schema<Ctx>>,
    config: EngineConfig,
    context_factory: Arc<dyn Fn() -> Ctx + Send + Sync>,
}

impl<Ctx: Send + Sync + 'static> Executor<Ctx> {
    pub fn new<F>(schema: Schema<Ctx>, config: EngineConfig, context_factory: F) -> Self
    where
        F: Fn() -> Ctx + Send + Sync + 'static,
    {
        Self {
            schema: Arc::new(schema),
            config,
            context_factory: Arc::new(context_factory),
        }
    }

    /// Execute a query document and return the assembled response.
    pub async fn run_query(
        &self,
        query: &str,
        variables: Option<HashMap<String, Value>>,
    ) -> QueryResponse {
        let doc = match parse_query::<String>(query) {
            Ok(doc) => doc,
            Err(err) => {
                return QueryResponse::rejected(ValidationError::Parse {
                    message: err.to_string(),
                });
            }
        };

        let mut fragments = FragmentMap::new();
        for def in &doc.definitions {
            if let Definition::Fragment(frag) = def {
                fragments.insert(frag.name.as_str(), frag);
            }
        }

        // Single-operation endpoint: execute the first operation found.
        let operation = doc.definitions.iter().find_map(|def| match def {
            Definition::Operation(op) => Some(op),
            _ => None,
        });
        let Some(operation) = operation else {
            return QueryResponse::rejected(ValidationError::NoOperation);
        };

        let (selection_set, variable_definitions, is_mutation) = match operation {
            OperationDefinition::Query(q) => (&q.selection_set, Some(&q.variable_definitions), false),
            OperationDefinition::SelectionSet(set) => (set, None, false),
            OperationDefinition::Mutation(m) => {
                (&m.selection_set, Some(&m.variable_definitions), true)
            }
            OperationDefinition::Subscription(_) => {
                return QueryResponse::rejected(ValidationError::UnsupportedOperation {
                    kind: "Subscription".to_string(),
                });
            }
        };

        // Depth gate: all-or-nothing, before any resolver or store access.
        if let Err(err) = depth::validate(selection_set, &fragments, self.config.max_depth) {
            tracing::info!(error = %err, "query rejected");
            return QueryResponse::rejected(err);
        }

        let mut variables = variables.unwrap_or_default();
        if let Some(defs) = variable_definitions {
            for def in defs {
                if let Some(default) = &def.default_value {
                    variables
                        .entry(def.name.clone())
                        .or_insert_with(|| utils::gql_value_to_json(default, &HashMap::new()));
                }
            }
        }

        let ctx = (self.context_factory)();
        let exec = ExecCtx {
            schema: self.schema.as_ref(),
            fragments: &fragments,
            variables: &variables,
            ctx: &ctx,
        };

        tracing::debug!(mutation = is_mutation, "executing operation");
        let (data, errors) = if is_mutation {
            fields::resolve_mutation_root(&exec, &selection_set.items).await
        } else {
            fields::resolve_selection_set(
                &exec,
                QUERY_TYPE,
                &Value::Null,
                &selection_set.items,
                Vec::new(),
            )
            .await
        };

        QueryResponse {
            data: Some(data),
            errors,
        }
    }
}
