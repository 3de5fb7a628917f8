//! Type definitions for the generated schema
//!
//! These types describe the static type graph handed to an execution runtime.
//! Field types reference named types by name only, which is what lets a type
//! that is still under construction be referenced before it exists.

use crate::introspect::{DirectiveTag, BUILTIN_SCALARS};
use async_graphql::Value as GqlValue;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// GraphQL schema type (Query, Mutation, or Subscription)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SchemaType {
    Query,
    Mutation,
    Subscription,
}

/// Reference to a type from a field, argument or input field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeRef {
    Named(String),
    NonNull(Box<TypeRef>),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn non_null(inner: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(inner))
    }

    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    /// `[name!]!`
    pub fn named_nn_list_nn(name: impl Into<String>) -> Self {
        Self::non_null(Self::list(Self::non_null(Self::named(name))))
    }

    /// Name of the innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::NonNull(inner) | TypeRef::List(inner) => inner.base_name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// Whether the type is a list once non-null wrappers are removed.
    pub fn is_list(&self) -> bool {
        match self {
            TypeRef::List(_) => true,
            TypeRef::NonNull(inner) => inner.is_list(),
            TypeRef::Named(_) => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

/// Deprecation state of a field or enum value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Deprecation {
    #[default]
    Current,
    Deprecated(String),
}

impl Deprecation {
    pub fn from_reason(reason: Option<&str>) -> Self {
        match reason {
            Some(reason) => Deprecation::Deprecated(reason.to_string()),
            None => Deprecation::Current,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        matches!(self, Deprecation::Deprecated(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Deprecation::Current => None,
            Deprecation::Deprecated(reason) => Some(reason),
        }
    }
}

/// A directive applied to a type, field, argument or enum value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectiveApplication {
    pub name: String,
    pub arguments: Vec<(String, GqlValue)>,
}

impl DirectiveApplication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn argument(mut self, name: impl Into<String>, value: impl Into<GqlValue>) -> Self {
        self.arguments.push((name.into(), value.into()));
        self
    }

    pub fn get_argument(&self, name: &str) -> Option<&GqlValue> {
        self.arguments
            .iter()
            .find(|(argument, _)| argument == name)
            .map(|(_, value)| value)
    }
}

impl From<&DirectiveTag> for DirectiveApplication {
    fn from(tag: &DirectiveTag) -> Self {
        Self {
            name: tag.name.clone(),
            arguments: tag
                .arguments
                .iter()
                .map(|argument| (argument.name.clone(), argument.value.clone()))
                .collect(),
        }
    }
}

/// Where a directive may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DirectiveLocation {
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    pub fn as_sdl(&self) -> &'static str {
        match self {
            DirectiveLocation::Scalar => "SCALAR",
            DirectiveLocation::Object => "OBJECT",
            DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
            DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
            DirectiveLocation::Interface => "INTERFACE",
            DirectiveLocation::Union => "UNION",
            DirectiveLocation::Enum => "ENUM",
            DirectiveLocation::EnumValue => "ENUM_VALUE",
            DirectiveLocation::InputObject => "INPUT_OBJECT",
            DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDefinition>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
}

/// Field argument or input object field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub directives: Vec<DirectiveApplication>,
}

impl InputValueDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            directives: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDefinition>,
    pub ty: TypeRef,
    pub deprecation: Deprecation,
    pub directives: Vec<DirectiveApplication>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
            ty,
            deprecation: Deprecation::Current,
            directives: Vec::new(),
        }
    }

    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directives.iter().any(|directive| directive.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDefinition>,
    pub directives: Vec<DirectiveApplication>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            directives: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDefinition>,
    pub directives: Vec<DirectiveApplication>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    pub directives: Vec<DirectiveApplication>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Deprecation,
    pub directives: Vec<DirectiveApplication>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDefinition>,
    pub directives: Vec<DirectiveApplication>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<DirectiveApplication>,
}

impl ScalarType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            directives: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<InputValueDefinition>,
    pub directives: Vec<DirectiveApplication>,
}

/// A named type in the schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum NamedType {
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    Scalar(ScalarType),
    InputObject(InputObjectType),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            NamedType::Object(ty) => &ty.name,
            NamedType::Interface(ty) => &ty.name,
            NamedType::Union(ty) => &ty.name,
            NamedType::Enum(ty) => &ty.name,
            NamedType::Scalar(ty) => &ty.name,
            NamedType::InputObject(ty) => &ty.name,
        }
    }

    pub fn directives(&self) -> &[DirectiveApplication] {
        match self {
            NamedType::Object(ty) => &ty.directives,
            NamedType::Interface(ty) => &ty.directives,
            NamedType::Union(ty) => &ty.directives,
            NamedType::Enum(ty) => &ty.directives,
            NamedType::Scalar(ty) => &ty.directives,
            NamedType::InputObject(ty) => &ty.directives,
        }
    }

    /// Output fields of objects and interfaces.
    pub fn fields(&self) -> &[FieldDefinition] {
        match self {
            NamedType::Object(ty) => &ty.fields,
            NamedType::Interface(ty) => &ty.fields,
            _ => &[],
        }
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directives().iter().any(|directive| directive.name == name)
    }

    /// Interfaces and unions.
    pub fn is_abstract(&self) -> bool {
        matches!(self, NamedType::Interface(_) | NamedType::Union(_))
    }

    /// Types allowed in argument and input-field position.
    pub fn is_input_type(&self) -> bool {
        matches!(
            self,
            NamedType::Enum(_) | NamedType::Scalar(_) | NamedType::InputObject(_)
        )
    }

    /// Types allowed in field result position.
    pub fn is_output_type(&self) -> bool {
        !matches!(self, NamedType::InputObject(_))
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            NamedType::Object(ty) => Some(ty),
            _ => None,
        }
    }
}

/// The finished schema produced by one generation run.
///
/// Named types are kept in registration order, which is deterministic for a
/// given set of roots and introspection results.
#[derive(Debug, Clone, Serialize)]
pub struct TypeGraph {
    query: ObjectType,
    mutation: Option<ObjectType>,
    subscription: Option<ObjectType>,
    types: Vec<Arc<NamedType>>,
    directives: Vec<DirectiveDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_sdl: Option<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TypeGraph {
    pub(crate) fn new(
        query: ObjectType,
        mutation: Option<ObjectType>,
        subscription: Option<ObjectType>,
        types: Vec<Arc<NamedType>>,
        directives: Vec<DirectiveDefinition>,
    ) -> Self {
        let index = types
            .iter()
            .enumerate()
            .map(|(position, ty)| (ty.name().to_string(), position))
            .collect();
        Self {
            query,
            mutation,
            subscription,
            types,
            directives,
            service_sdl: None,
            index,
        }
    }

    pub(crate) fn with_service_sdl(mut self, sdl: String) -> Self {
        self.service_sdl = Some(sdl);
        self
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        ObjectType,
        Option<ObjectType>,
        Option<ObjectType>,
        Vec<Arc<NamedType>>,
        Vec<DirectiveDefinition>,
    ) {
        (
            self.query,
            self.mutation,
            self.subscription,
            self.types,
            self.directives,
        )
    }

    pub fn query(&self) -> &ObjectType {
        &self.query
    }

    pub fn mutation(&self) -> Option<&ObjectType> {
        self.mutation.as_ref()
    }

    pub fn subscription(&self) -> Option<&ObjectType> {
        self.subscription.as_ref()
    }

    /// Root objects present in this graph, with their operation kind.
    pub fn roots(&self) -> impl Iterator<Item = (SchemaType, &ObjectType)> {
        std::iter::once((SchemaType::Query, &self.query))
            .chain(self.mutation.iter().map(|ty| (SchemaType::Mutation, ty)))
            .chain(self.subscription.iter().map(|ty| (SchemaType::Subscription, ty)))
    }

    /// Named types other than the roots, in registration order.
    pub fn types(&self) -> &[Arc<NamedType>] {
        &self.types
    }

    pub fn get_type(&self, name: &str) -> Option<&Arc<NamedType>> {
        self.index.get(name).map(|&position| &self.types[position])
    }

    pub fn directives(&self) -> &[DirectiveDefinition] {
        &self.directives
    }

    /// SDL served by the federation `_service` field, if federated.
    pub fn service_sdl(&self) -> Option<&str> {
        self.service_sdl.as_deref()
    }

    /// Whether `name` is a root, a registered type or a built-in scalar.
    pub fn is_defined(&self, name: &str) -> bool {
        BUILTIN_SCALARS.contains(&name)
            || self.index.contains_key(name)
            || self.roots().any(|(_, root)| root.name == name)
    }

    /// Type names referenced by fields, arguments, interfaces or union members
    /// that have no definition in this graph.
    pub fn unresolved_references(&self) -> Vec<String> {
        fn collect_fields<'a>(fields: &'a [FieldDefinition], out: &mut Vec<&'a str>) {
            for field in fields {
                out.push(field.ty.base_name());
                out.extend(field.arguments.iter().map(|arg| arg.ty.base_name()));
            }
        }

        let mut referenced: Vec<&str> = Vec::new();
        for (_, root) in self.roots() {
            collect_fields(&root.fields, &mut referenced);
        }
        for ty in &self.types {
            match ty.as_ref() {
                NamedType::Object(object) => {
                    collect_fields(&object.fields, &mut referenced);
                    referenced.extend(object.interfaces.iter().map(String::as_str));
                }
                NamedType::Interface(interface) => {
                    collect_fields(&interface.fields, &mut referenced);
                    referenced.extend(interface.interfaces.iter().map(String::as_str));
                }
                NamedType::Union(union) => {
                    referenced.extend(union.members.iter().map(String::as_str));
                }
                NamedType::InputObject(input) => {
                    referenced.extend(input.fields.iter().map(|field| field.ty.base_name()));
                }
                NamedType::Enum(_) | NamedType::Scalar(_) => {}
            }
        }

        let mut unresolved: Vec<String> = Vec::new();
        for name in referenced {
            if !self.is_defined(name) && !unresolved.iter().any(|seen| seen == name) {
                unresolved.push(name.to_string());
            }
        }
        unresolved
    }
}

/// Structural equality: same roots, same types in the same order.
impl PartialEq for TypeGraph {
    fn eq(&self, other: &Self) -> bool {
        self.query == other.query
            && self.mutation == other.mutation
            && self.subscription == other.subscription
            && self.types == other.types
            && self.directives == other.directives
            && self.service_sdl == other.service_sdl
    }
}
