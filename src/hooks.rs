//! Customization points invoked while the schema is generated.

use crate::error::Result;
use crate::introspect::{FunctionDef, PropertyDef, TypeId, TypeUsage};
use crate::types::{FieldDefinition, NamedType, SchemaType};

/// Hooks called by the generator. Every method has a pass-through default.
///
/// Implementations must not rename the types they receive in
/// [`did_generate_graphql_type`](SchemaGeneratorHooks::did_generate_graphql_type);
/// the cache slot name is fixed before the builder runs.
pub trait SchemaGeneratorHooks: Send + Sync {
    /// Supply a named type (typically a custom scalar) instead of building one.
    ///
    /// The replacement must fit the position it is referenced from: input
    /// positions accept enums, scalars and input objects only.
    fn will_generate_graphql_type(&self, _type_id: &TypeId) -> Option<NamedType> {
        None
    }

    /// Unwrap container types (futures, streams) before a usage is resolved.
    fn will_resolve_monad(&self, usage: &TypeUsage) -> TypeUsage {
        usage.clone()
    }

    fn is_valid_property(&self, _parent: &TypeId, _property: &PropertyDef) -> bool {
        true
    }

    fn is_valid_function(&self, _parent: &TypeId, _function: &FunctionDef) -> bool {
        true
    }

    fn is_valid_supertype(&self, _supertype: &TypeId) -> bool {
        true
    }

    fn did_generate_graphql_type(
        &self,
        _type_id: &TypeId,
        generated: NamedType,
    ) -> Result<NamedType> {
        Ok(generated)
    }

    fn did_generate_root_field(
        &self,
        _schema_type: SchemaType,
        _function: &FunctionDef,
        field: FieldDefinition,
    ) -> Result<FieldDefinition> {
        Ok(field)
    }
}

/// Hooks that change nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSchemaGeneratorHooks;

impl SchemaGeneratorHooks for NoopSchemaGeneratorHooks {}
