//! Hand-off of a generated [`TypeGraph`] to the `async-graphql` dynamic runtime.
//!
//! The runtime schema mirrors the graph type for type. Resolvers do not fetch
//! data: every field reads the value of the same name from its parent object,
//! and root fields read from an optional root value. Values returned for
//! interfaces and unions must carry `__typename`.

use crate::error::{Error, Result};
use crate::federation::{ENTITIES_FIELD, ENTITY_UNION, SERVICE_FIELD};
use crate::types::{
    DirectiveApplication, FieldDefinition, InputValueDefinition, NamedType, ObjectType, TypeGraph,
    TypeRef,
};
use async_graphql::dynamic::{
    Directive, Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, ResolverContext, Scalar, Schema as AsyncSchema, Subscription,
    SubscriptionField, SubscriptionFieldFuture, TypeRef as DynamicTypeRef, Union,
};
use async_graphql::{Name, Value as GqlValue};
use std::collections::HashSet;
use std::sync::Arc;

/// Dynamic schema wrapper
#[derive(Clone)]
pub struct DynamicSchema {
    inner: AsyncSchema,
}

/// Value root fields resolve against.
#[derive(Debug, Clone)]
pub struct RootValue(pub GqlValue);

/// What resolvers need to know about the graph.
#[derive(Debug, Default)]
struct RuntimeShape {
    abstract_types: HashSet<String>,
    entities: HashSet<String>,
    service_sdl: Option<String>,
}

impl DynamicSchema {
    /// Build a runtime schema whose root fields resolve to null.
    pub fn build(graph: &TypeGraph) -> Result<Self> {
        Self::build_inner(graph, None)
    }

    /// Build a runtime schema whose root fields read from `root`.
    pub fn build_with_root(graph: &TypeGraph, root: GqlValue) -> Result<Self> {
        Self::build_inner(graph, Some(RootValue(root)))
    }

    fn build_inner(graph: &TypeGraph, root: Option<RootValue>) -> Result<Self> {
        let mut shape = RuntimeShape {
            service_sdl: graph.service_sdl().map(str::to_string),
            ..RuntimeShape::default()
        };
        for ty in graph.types() {
            match ty.as_ref() {
                NamedType::Interface(_) => {
                    shape.abstract_types.insert(ty.name().to_string());
                }
                NamedType::Union(union) => {
                    shape.abstract_types.insert(union.name.clone());
                    if union.name == ENTITY_UNION {
                        shape.entities.extend(union.members.iter().cloned());
                    }
                }
                _ => {}
            }
        }
        let shape = Arc::new(shape);

        let mut schema_builder = AsyncSchema::build(
            &graph.query().name,
            graph.mutation().map(|root| root.name.as_str()),
            graph.subscription().map(|root| root.name.as_str()),
        );

        schema_builder = schema_builder.register(object(graph.query(), &shape, true));
        if let Some(mutation) = graph.mutation() {
            schema_builder = schema_builder.register(object(mutation, &shape, true));
        }
        if let Some(subscription) = graph.subscription() {
            schema_builder = schema_builder.register(subscription_root(subscription, &shape));
        }

        for ty in graph.types() {
            schema_builder = match ty.as_ref() {
                NamedType::Object(ty) => schema_builder.register(object(ty, &shape, false)),
                NamedType::Interface(ty) => {
                    let mut interface = Interface::new(&ty.name);
                    if let Some(description) = &ty.description {
                        interface = interface.description(description);
                    }
                    for implemented in &ty.interfaces {
                        interface = interface.implement(implemented);
                    }
                    for field in &ty.fields {
                        let mut interface_field =
                            InterfaceField::new(&field.name, dynamic_type_ref(&field.ty));
                        if let Some(description) = &field.description {
                            interface_field = interface_field.description(description);
                        }
                        for argument in &field.arguments {
                            interface_field = interface_field.argument(input_value(argument));
                        }
                        interface_field =
                            interface_field.deprecation(field.deprecation.reason());
                        interface = interface.field(interface_field);
                    }
                    schema_builder.register(interface)
                }
                NamedType::Union(ty) => {
                    let mut union = Union::new(&ty.name);
                    if let Some(description) = &ty.description {
                        union = union.description(description);
                    }
                    for member in &ty.members {
                        union = union.possible_type(member);
                    }
                    schema_builder.register(union)
                }
                NamedType::Enum(ty) => {
                    let mut en = Enum::new(&ty.name);
                    if let Some(description) = &ty.description {
                        en = en.description(description);
                    }
                    for value in &ty.values {
                        let mut item = EnumItem::new(&value.name);
                        if let Some(description) = &value.description {
                            item = item.description(description);
                        }
                        en = en.item(item.deprecation(value.deprecation.reason()));
                    }
                    schema_builder.register(en)
                }
                NamedType::Scalar(ty) => {
                    let mut scalar = Scalar::new(&ty.name);
                    if let Some(description) = &ty.description {
                        scalar = scalar.description(description);
                    }
                    schema_builder.register(scalar)
                }
                NamedType::InputObject(ty) => {
                    let mut input = InputObject::new(&ty.name);
                    if let Some(description) = &ty.description {
                        input = input.description(description);
                    }
                    for field in &ty.fields {
                        input = input.field(input_value(field));
                    }
                    schema_builder.register(input)
                }
            };
        }

        if let Some(root) = root {
            schema_builder = schema_builder.data(root);
        }

        let schema = schema_builder
            .finish()
            .map_err(|e| Error::Schema(format!("failed to build schema: {e}")))?;

        tracing::debug!(types = graph.types().len(), "built dynamic schema");
        Ok(DynamicSchema { inner: schema })
    }

    /// Execute a GraphQL request
    pub async fn execute(&self, request: impl Into<async_graphql::Request>) -> async_graphql::Response {
        self.inner.execute(request).await
    }

    /// Access the executor (used for HTTP/WS integration)
    pub fn executor(&self) -> AsyncSchema {
        self.inner.clone()
    }

    /// SDL as printed by the runtime.
    pub fn sdl(&self) -> String {
        self.inner.sdl()
    }
}

fn dynamic_type_ref(ty: &TypeRef) -> DynamicTypeRef {
    match ty {
        TypeRef::Named(name) => DynamicTypeRef::named(name.clone()),
        TypeRef::NonNull(inner) => DynamicTypeRef::NonNull(Box::new(dynamic_type_ref(inner))),
        TypeRef::List(inner) => DynamicTypeRef::List(Box::new(dynamic_type_ref(inner))),
    }
}

fn dynamic_directive(application: &DirectiveApplication) -> Directive {
    application
        .arguments
        .iter()
        .fold(Directive::new(&application.name), |directive, (name, value)| {
            directive.argument(name.as_str(), value.clone())
        })
}

fn input_value(value: &InputValueDefinition) -> InputValue {
    let input = InputValue::new(&value.name, dynamic_type_ref(&value.ty));
    match &value.description {
        Some(description) => input.description(description),
        None => input,
    }
}

fn object(ty: &ObjectType, shape: &Arc<RuntimeShape>, root: bool) -> Object {
    let mut obj = Object::new(&ty.name);
    if let Some(description) = &ty.description {
        obj = obj.description(description);
    }
    for implemented in &ty.interfaces {
        obj = obj.implement(implemented);
    }
    for directive in &ty.directives {
        obj = obj.directive(dynamic_directive(directive));
    }
    for field in &ty.fields {
        obj = obj.field(output_field(field, shape, root));
    }
    obj
}

fn output_field(field: &FieldDefinition, shape: &Arc<RuntimeShape>, root: bool) -> Field {
    let field_name = field.name.clone();
    let ty = field.ty.clone();
    let shape_for_resolver = shape.clone();

    let mut gql_field = Field::new(&field.name, dynamic_type_ref(&field.ty), move |ctx| {
        let resolved = match field_name.as_str() {
            SERVICE_FIELD if root => Ok(Some(service_value(&shape_for_resolver))),
            ENTITIES_FIELD if root => resolve_entities(&ctx, &shape_for_resolver),
            _ => {
                let value = if root {
                    root_field(&ctx, &field_name)
                } else {
                    parent_field(&ctx, &field_name)
                };
                resolve_value(value, &ty, &shape_for_resolver)
            }
        };
        FieldFuture::new(async move { resolved })
    });

    if let Some(description) = &field.description {
        gql_field = gql_field.description(description);
    }
    for argument in &field.arguments {
        gql_field = gql_field.argument(input_value(argument));
    }
    gql_field = gql_field.deprecation(field.deprecation.reason());
    for directive in &field.directives {
        gql_field = gql_field.directive(dynamic_directive(directive));
    }
    gql_field
}

fn subscription_root(ty: &ObjectType, shape: &Arc<RuntimeShape>) -> Subscription {
    let mut subscription = Subscription::new(&ty.name);
    for field in &ty.fields {
        let field_name = field.name.clone();
        let field_ty = field.ty.clone();
        let shape = shape.clone();

        // Emits the root value's field once, if there is one.
        let mut subscription_field =
            SubscriptionField::new(&field.name, dynamic_type_ref(&field.ty), move |ctx| {
                let items: Vec<async_graphql::Result<FieldValue<'static>>> =
                    match resolve_value(root_field(&ctx, &field_name), &field_ty, &shape) {
                        Ok(Some(value)) => vec![Ok(value)],
                        Ok(None) => Vec::new(),
                        Err(err) => vec![Err(err)],
                    };
                SubscriptionFieldFuture::new(async move { Ok(futures::stream::iter(items)) })
            });
        for argument in &field.arguments {
            subscription_field = subscription_field.argument(input_value(argument));
        }
        subscription = subscription.field(subscription_field);
    }
    subscription
}

fn parent_field(ctx: &ResolverContext<'_>, name: &str) -> GqlValue {
    match ctx.parent_value.as_value() {
        Some(GqlValue::Object(map)) => map
            .get(&Name::new(name))
            .cloned()
            .unwrap_or(GqlValue::Null),
        _ => GqlValue::Null,
    }
}

fn root_field(ctx: &ResolverContext<'_>, name: &str) -> GqlValue {
    match ctx.data_opt::<RootValue>() {
        Some(RootValue(GqlValue::Object(map))) => map
            .get(&Name::new(name))
            .cloned()
            .unwrap_or(GqlValue::Null),
        _ => GqlValue::Null,
    }
}

fn typename(value: &GqlValue) -> Option<String> {
    match value {
        GqlValue::Object(map) => match map.get(&Name::new("__typename")) {
            Some(GqlValue::String(name)) => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Shape `value` for the declared type: lists item by item, abstract types
/// tagged with their concrete `__typename`.
fn resolve_value<'a>(
    value: GqlValue,
    ty: &TypeRef,
    shape: &RuntimeShape,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    match (ty, value) {
        (_, GqlValue::Null) => Ok(None),
        (TypeRef::NonNull(inner), value) => resolve_value(value, inner, shape),
        (TypeRef::List(inner), GqlValue::List(items)) => {
            let items = items
                .into_iter()
                .map(|item| Ok(resolve_value(item, inner, shape)?.unwrap_or(FieldValue::NULL)))
                .collect::<async_graphql::Result<Vec<_>>>()?;
            Ok(Some(FieldValue::list(items)))
        }
        (TypeRef::List(_), other) => Err(async_graphql::Error::new(format!(
            "expected a list for {ty}, found {other}"
        ))),
        (TypeRef::Named(name), value) if shape.abstract_types.contains(name) => {
            let concrete = typename(&value).ok_or_else(|| {
                async_graphql::Error::new(format!("missing __typename for abstract type {name}"))
            })?;
            Ok(Some(FieldValue::value(value).with_type(concrete)))
        }
        (TypeRef::Named(_), value) => Ok(Some(FieldValue::value(value))),
    }
}

fn service_value<'a>(shape: &RuntimeShape) -> FieldValue<'a> {
    let mut service = async_graphql::indexmap::IndexMap::new();
    service.insert(
        Name::new("sdl"),
        GqlValue::String(shape.service_sdl.clone().unwrap_or_default()),
    );
    FieldValue::value(GqlValue::Object(service))
}

/// Echo every representation back, typed by its `__typename`.
fn resolve_entities<'a>(
    ctx: &ResolverContext<'_>,
    shape: &RuntimeShape,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    let representations = ctx
        .args
        .get("representations")
        .ok_or_else(|| async_graphql::Error::new("missing representations argument"))?
        .list()?;

    let mut results = Vec::new();
    for repr in representations.iter() {
        let representation = repr.as_value().clone();
        let typename = typename(&representation).ok_or_else(|| {
            async_graphql::Error::new("missing __typename in representation")
        })?;
        if !shape.entities.contains(&typename) {
            return Err(async_graphql::Error::new(format!(
                "unknown entity type: {typename}"
            )));
        }
        tracing::debug!(entity = %typename, "resolving entity from representation");
        results.push(FieldValue::value(representation).with_type(typename));
    }

    Ok(Some(FieldValue::list(results)))
}
