//! # batchql
//!
//! A batched, field-by-field GraphQL resolution engine over a pluggable
//! backing store.
//!
//! ## Features
//!
//! - **Batched loading**: per-request coalescing loaders turn N+1 lookups
//!   into one bulk fetch per key-space and batching window
//! - **Sibling fan-out**: every sibling field and list item starts resolving
//!   before any is awaited, so loaders see whole windows at once
//! - **Depth gate**: fragment-transparent depth validation rejects
//!   over-nested queries before any store access
//! - **Explicit registry**: resolvers live in a (type, field) registry built
//!   at startup; the engine stays schema-agnostic
//! - **Partial failures**: a failing resolver nulls its own subtree and is
//!   reported with its field path; siblings keep resolving
//! - **Per-query contexts**: loader caches live exactly as long as one
//!   request, so nothing stale crosses request boundaries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use batchql::prelude::*;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let executor = Executor::new(
//!     gateway_schema(),
//!     EngineConfig::default(),
//!     GatewayContext::factory(store.clone()),
//! );
//!
//! let response = executor
//!     .run_query("{ users { name posts { title } } }", None)
//!     .await;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod executor;
pub mod loader;
pub mod schema;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Engine ===
    pub use crate::config::EngineConfig;
    pub use crate::core::{DispatchError, ErrorEntry, FieldError, PathSegment, ValidationError};
    pub use crate::executor::{Executor, QueryResponse};
    pub use crate::loader::{BatchFn, LoadResult, Loader};
    pub use crate::schema::{
        FieldArgs, FieldDef, FieldShape, Projection, Schema, SchemaBuilder,
    };

    // === Storage ===
    pub use crate::storage::{DataStore, Filter, InMemoryStore};

    // === Gateway domain ===
    pub use crate::entities::{GatewayContext, GatewayLoaders, gateway_schema};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
