//! # graphql-schema-generator
//!
//! Generates a GraphQL schema from introspected type definitions instead of a
//! hand-written schema file, with static validation of Apollo Federation
//! directives.
//!
//! ## Features
//!
//! - **Schema generation**: root objects contribute their functions as Query,
//!   Mutation and Subscription fields; every reachable type is built once per
//!   run, cycles become named references
//! - **Federation**: `@key`, `@extends`, `@external`, `@provides` and
//!   `@requires` are validated over the generated graph, with every violation
//!   reported at once
//! - **SDL**: the generated [`TypeGraph`] prints as standard SDL
//! - **Runtime hand-off**: [`DynamicSchema`] turns a graph into an
//!   `async-graphql` dynamic schema
//!
//! ## Main Components
//!
//! - [`SchemaGenerator`] / [`generate_schema`]: builds a [`TypeGraph`].
//! - [`TypeIntrospector`]: the introspection capability the generator
//!   consumes; [`StaticIntrospector`] is an in-memory implementation.
//! - [`TypesCache`]: per-run store of built types.
//! - [`FederatedSchemaValidator`] / [`generate_federated_schema`]: federation
//!   checks and augmentation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use graphql_schema_generator::{
//!     generate_schema, FunctionDef, ParameterDef, PropertyDef, SchemaGeneratorConfig,
//!     StaticIntrospector, TopLevelObject, TypeDefinition, TypeUsage,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let introspector = StaticIntrospector::new()
//!         .with_type(
//!             TypeDefinition::object("com.example.Widget")
//!                 .property(PropertyDef::new("id", TypeUsage::of("Int")))
//!                 .property(PropertyDef::new("value", TypeUsage::of("String"))),
//!         )
//!         .with_type(
//!             TypeDefinition::object("com.example.WidgetQuery").function(
//!                 FunctionDef::new("widgetById", TypeUsage::of("com.example.Widget").nullable())
//!                     .parameter(ParameterDef::new("id", TypeUsage::of("Int"))),
//!             ),
//!         );
//!
//!     let config = SchemaGeneratorConfig::new(["com.example"]);
//!     let graph = generate_schema(
//!         &config,
//!         &introspector,
//!         &[TopLevelObject::new("com.example.WidgetQuery")],
//!         &[],
//!         &[],
//!     )?;
//!     println!("{}", graph.sdl());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod federation;
pub mod hooks;
pub mod introspect;
pub mod runtime;
pub mod schema;
pub mod sdl;
pub mod types;

pub use cache::{CachedType, CachedTypeEntry, TypeKey, TypesCache, Variance};
pub use config::{GeneratorSettings, SchemaGeneratorConfig, TopLevelNames, TopLevelObject};
pub use error::{Error, Result};
pub use federation::{
    generate_federated_schema, EntityConfig, FederatedSchemaValidator, FederationConfig,
    FederationDirective, FederationDirectiveKind, FieldSet, FieldSetError,
};
pub use hooks::{NoopSchemaGeneratorHooks, SchemaGeneratorHooks};
pub use introspect::{
    DirectiveTag, EnumConstant, FunctionDef, IntrospectionDocument, MetadataTag, ParameterDef,
    PropertyDef, StaticIntrospector, TypeDefinition, TypeId, TypeIntrospector, TypeKind,
    TypeUsage,
};
pub use runtime::{DynamicSchema, RootValue};
pub use schema::{generate_schema, SchemaGenerator};
pub use sdl::print_schema;
pub use types::{
    Deprecation, DirectiveApplication, DirectiveDefinition, DirectiveLocation, EnumType,
    EnumValueDefinition, FieldDefinition, InputObjectType, InputValueDefinition, InterfaceType,
    NamedType, ObjectType, ScalarType, SchemaType, TypeGraph, TypeRef, UnionType,
};
