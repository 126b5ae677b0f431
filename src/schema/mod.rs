//! Explicit field registry driving the execution engine
//!
//! A [`Schema`] maps (type name, field name) to a [`FieldDef`]: either a
//! scalar read straight off the parent value, or an association backed by a
//! resolver function. The registry is built once at startup through
//! [`SchemaBuilder`] and looked up by the engine per selection, which keeps
//! the engine itself agnostic to any concrete domain.
//!
//! The engine is generic over a context type `Ctx` (the per-request
//! resolution context holding the batch loaders and the store handle); the
//! schema carries the same parameter so resolvers receive their context as
//! an explicit argument, never as ambient state.

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Reserved type name for root query fields.
pub const QUERY_TYPE: &str = "Query";
/// Reserved type name for root mutation fields.
pub const MUTATION_TYPE: &str = "Mutation";

/// Everything a resolver gets to see for one field invocation.
pub struct FieldArgs<'a, Ctx> {
    /// The value the field is selected on (`Value::Null` at the root).
    pub parent: &'a Value,
    /// Coerced field arguments with operation variables substituted.
    pub args: &'a Map<String, Value>,
    /// The per-request resolution context.
    pub ctx: &'a Ctx,
    /// Association names requested under this field, for priming decisions
    /// and store projections.
    pub projection: &'a Projection,
}

/// Boxed resolver function: borrows its arguments for the duration of the
/// returned future, so resolvers can await loaders without cloning the
/// parent value or the context.
pub type ResolverFn<Ctx> =
    Arc<dyn for<'a> Fn(FieldArgs<'a, Ctx>) -> BoxFuture<'a, anyhow::Result<Value>> + Send + Sync>;

/// Shape of an association field's output, deciding how the engine recurses
/// into the resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// Scalar-like output; returned as-is, no nested selection applied.
    Leaf,
    /// A single object of the named type.
    Object(String),
    /// A list of objects of the named type.
    List(String),
}

impl FieldShape {
    pub fn object_type(&self) -> Option<&str> {
        match self {
            FieldShape::Leaf => None,
            FieldShape::Object(name) | FieldShape::List(name) => Some(name),
        }
    }
}

/// One registered field of a type.
pub enum FieldDef<Ctx> {
    /// Read from the parent object under the field's own name; never
    /// suspends.
    Scalar,
    /// Resolver-backed field.
    Association {
        shape: FieldShape,
        resolver: ResolverFn<Ctx>,
    },
}

impl<Ctx> FieldDef<Ctx> {
    pub fn is_association(&self) -> bool {
        matches!(self, FieldDef::Association { .. })
    }
}

/// One registered object type: its field registry.
pub struct TypeDef<Ctx> {
    fields: HashMap<String, FieldDef<Ctx>>,
}

impl<Ctx> TypeDef<Ctx> {
    pub fn field(&self, name: &str) -> Option<&FieldDef<Ctx>> {
        self.fields.get(name)
    }
}

/// The full registry: every object type reachable from the roots, plus the
/// `Query` and `Mutation` roots themselves.
pub struct Schema<Ctx> {
    types: HashMap<String, TypeDef<Ctx>>,
}

impl<Ctx> Schema<Ctx> {
    pub fn type_def(&self, type_name: &str) -> Option<&TypeDef<Ctx>> {
        self.types.get(type_name)
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef<Ctx>> {
        self.types.get(type_name)?.field(field_name)
    }

    pub fn has_mutations(&self) -> bool {
        self.types.contains_key(MUTATION_TYPE)
    }
}

/// Association names a selection requests below one field.
///
/// Computed by the engine from the (fragment-expanded) selection set before
/// a resolver runs, so resolvers and priming logic can branch on what the
/// query actually asked for instead of inspecting parser trees themselves.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    names: HashSet<String>,
}

impl Projection {
    pub(crate) fn from_names(names: HashSet<String>) -> Self {
        Self { names }
    }

    /// Empty projection, used for leaf fields.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, association: &str) -> bool {
        self.names.contains(association)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Builder assembling a [`Schema`] at startup.
///
/// ```rust,ignore
/// let mut builder = SchemaBuilder::new();
/// builder
///     .object("User")
///     .scalar("id")
///     .scalar("name")
///     .object_field("profile", "Profile", resolve_user_profile)
///     .list_field("posts", "Post", resolve_user_posts);
/// let schema = builder.build();
/// ```
pub struct SchemaBuilder<Ctx> {
    types: HashMap<String, TypeDef<Ctx>>,
}

impl<Ctx> Default for SchemaBuilder<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> SchemaBuilder<Ctx> {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Start (or reopen) an object type.
    pub fn object(&mut self, name: &str) -> TypeBuilder<'_, Ctx> {
        let def = self
            .types
            .entry(name.to_string())
            .or_insert_with(|| TypeDef {
                fields: HashMap::new(),
            });
        TypeBuilder { def }
    }

    /// Start (or reopen) the root query type.
    pub fn query(&mut self) -> TypeBuilder<'_, Ctx> {
        self.object(QUERY_TYPE)
    }

    /// Start (or reopen) the root mutation type.
    pub fn mutation(&mut self) -> TypeBuilder<'_, Ctx> {
        self.object(MUTATION_TYPE)
    }

    pub fn build(self) -> Schema<Ctx> {
        Schema { types: self.types }
    }
}

/// Fluent registration of one type's fields.
pub struct TypeBuilder<'s, Ctx> {
    def: &'s mut TypeDef<Ctx>,
}

impl<'s, Ctx> TypeBuilder<'s, Ctx> {
    /// Register a scalar field read from the parent value by name.
    pub fn scalar(&mut self, name: &str) -> &mut Self {
        self.def.fields.insert(name.to_string(), FieldDef::Scalar);
        self
    }

    /// Register several scalar fields at once.
    pub fn scalars(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.scalar(name);
        }
        self
    }

    /// Register a resolver-backed field producing a single object.
    pub fn object_field<F>(&mut self, name: &str, type_name: &str, resolver: F) -> &mut Self
    where
        F: for<'a> Fn(FieldArgs<'a, Ctx>) -> BoxFuture<'a, anyhow::Result<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.association(name, FieldShape::Object(type_name.to_string()), resolver)
    }

    /// Register a resolver-backed field producing a list of objects.
    pub fn list_field<F>(&mut self, name: &str, type_name: &str, resolver: F) -> &mut Self
    where
        F: for<'a> Fn(FieldArgs<'a, Ctx>) -> BoxFuture<'a, anyhow::Result<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.association(name, FieldShape::List(type_name.to_string()), resolver)
    }

    /// Register a resolver-backed field producing a scalar-like value
    /// (mutations returning ids, for example).
    pub fn leaf_field<F>(&mut self, name: &str, resolver: F) -> &mut Self
    where
        F: for<'a> Fn(FieldArgs<'a, Ctx>) -> BoxFuture<'a, anyhow::Result<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.association(name, FieldShape::Leaf, resolver)
    }

    fn association<F>(&mut self, name: &str, shape: FieldShape, resolver: F) -> &mut Self
    where
        F: for<'a> Fn(FieldArgs<'a, Ctx>) -> BoxFuture<'a, anyhow::Result<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.def.fields.insert(
            name.to_string(),
            FieldDef::Association {
                shape,
                resolver: Arc::new(resolver),
            },
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;

    fn echo_resolver<'a>(args: FieldArgs<'a, ()>) -> BoxFuture<'a, anyhow::Result<Value>> {
        async move { Ok(args.parent.clone()) }.boxed()
    }

    #[test]
    fn builder_registers_scalars_and_associations() {
        let mut builder: SchemaBuilder<()> = SchemaBuilder::new();
        builder
            .object("User")
            .scalars(&["id", "name"])
            .list_field("posts", "Post", echo_resolver);
        let schema = builder.build();

        assert!(matches!(
            schema.field("User", "id"),
            Some(FieldDef::Scalar)
        ));
        let posts = schema.field("User", "posts").unwrap();
        assert!(posts.is_association());
        match posts {
            FieldDef::Association { shape, .. } => {
                assert_eq!(*shape, FieldShape::List("Post".to_string()));
                assert_eq!(shape.object_type(), Some("Post"));
            }
            FieldDef::Scalar => unreachable!(),
        }
        assert!(schema.field("User", "unknown").is_none());
        assert!(schema.field("Ghost", "id").is_none());
    }

    #[test]
    fn reopening_a_type_extends_it() {
        let mut builder: SchemaBuilder<()> = SchemaBuilder::new();
        builder.object("User").scalar("id");
        builder.object("User").scalar("name");
        let schema = builder.build();

        assert!(schema.field("User", "id").is_some());
        assert!(schema.field("User", "name").is_some());
    }

    #[tokio::test]
    async fn resolver_sees_its_arguments() {
        let mut builder: SchemaBuilder<()> = SchemaBuilder::new();
        builder.query().object_field("me", "User", echo_resolver);
        let schema = builder.build();

        let Some(FieldDef::Association { resolver, .. }) = schema.field(QUERY_TYPE, "me") else {
            panic!("'me' should be registered");
        };

        let parent = json!({"id": "u1"});
        let args = Map::new();
        let projection = Projection::none();
        let resolved = resolver(FieldArgs {
            parent: &parent,
            args: &args,
            ctx: &(),
            projection: &projection,
        })
        .await
        .unwrap();

        assert_eq!(resolved, parent);
    }
}
