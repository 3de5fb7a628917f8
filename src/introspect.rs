//! Type introspection capability consumed by the generator.
//!
//! The generator never reflects over types itself. Everything it knows about a
//! type (its members, their declared types and nullability, attached metadata)
//! comes through [`TypeIntrospector`]. [`StaticIntrospector`] is an in-memory
//! implementation fed from builder calls or a JSON document.

use crate::error::{Error, Result};
use async_graphql::Value as GqlValue;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// Type id reported as list-like by [`StaticIntrospector`].
pub const LIST_TYPE_ID: &str = "List";

/// Scalars every GraphQL schema provides without a definition.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Qualified nominal identity of an introspected type, e.g. `com.example.Widget`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(String);

impl TypeId {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self(qualified_name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.0
            .rsplit(['.', '$'])
            .next()
            .unwrap_or(self.0.as_str())
    }

    /// Whether the type lives in (or below) one of the given packages.
    pub fn is_in_packages(&self, packages: &[String]) -> bool {
        packages.iter().any(|package| {
            self.0 == *package
                || self
                    .0
                    .strip_prefix(package.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Declared shape of a property, parameter or return type.
///
/// `arguments` carries generic type arguments; for list-like types the first
/// argument is the element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeUsage {
    pub type_id: TypeId,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<TypeUsage>,
}

impl TypeUsage {
    /// Non-nullable usage of `type_id`.
    pub fn of(type_id: impl Into<TypeId>) -> Self {
        Self {
            type_id: type_id.into(),
            nullable: false,
            arguments: Vec::new(),
        }
    }

    /// Non-nullable [`LIST_TYPE_ID`] of `element`.
    pub fn list(element: TypeUsage) -> Self {
        Self {
            type_id: TypeId::new(LIST_TYPE_ID),
            nullable: false,
            arguments: vec![element],
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn argument(mut self, argument: TypeUsage) -> Self {
        self.arguments.push(argument);
        self
    }
}

/// Structural category of an introspected type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Concrete type with properties and functions
    Object,
    /// Abstract type whose declared members become interface fields
    Interface,
    /// Polymorphic root exposed as the union of its concrete subtypes
    Union,
    /// Closed set of constants
    Enum,
}

/// A directive-shaped metadata tag and its arguments, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveTag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<DirectiveArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveArgument {
    pub name: String,
    pub value: GqlValue,
}

impl DirectiveTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn argument(mut self, name: impl Into<String>, value: impl Into<GqlValue>) -> Self {
        self.arguments.push(DirectiveArgument {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// Metadata attached to a type, member, parameter or enum constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataTag {
    /// Overrides the GraphQL name
    Name(String),
    Description(String),
    /// Deprecation reason
    Deprecated(String),
    Directive(DirectiveTag),
    /// Excludes the member from the schema
    Ignore,
}

impl MetadataTag {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self::Description(description.into())
    }

    pub fn deprecated(reason: impl Into<String>) -> Self {
        Self::Deprecated(reason.into())
    }

    pub fn directive(directive: DirectiveTag) -> Self {
        Self::Directive(directive)
    }

    /// `@key(fields: ...)`
    pub fn key(fields: impl Into<String>) -> Self {
        Self::Directive(DirectiveTag::new("key").argument("fields", fields.into()))
    }

    /// `@extends`
    pub fn extends() -> Self {
        Self::Directive(DirectiveTag::new("extends"))
    }

    /// `@external`
    pub fn external() -> Self {
        Self::Directive(DirectiveTag::new("external"))
    }

    /// `@provides(fields: ...)`
    pub fn provides(fields: impl Into<String>) -> Self {
        Self::Directive(DirectiveTag::new("provides").argument("fields", fields.into()))
    }

    /// `@requires(fields: ...)`
    pub fn requires(fields: impl Into<String>) -> Self {
        Self::Directive(DirectiveTag::new("requires").argument("fields", fields.into()))
    }
}

pub fn custom_name(tags: &[MetadataTag]) -> Option<&str> {
    tags.iter().find_map(|tag| match tag {
        MetadataTag::Name(name) => Some(name.as_str()),
        _ => None,
    })
}

pub fn description(tags: &[MetadataTag]) -> Option<&str> {
    tags.iter().find_map(|tag| match tag {
        MetadataTag::Description(description) => Some(description.as_str()),
        _ => None,
    })
}

pub fn deprecation(tags: &[MetadataTag]) -> Option<&str> {
    tags.iter().find_map(|tag| match tag {
        MetadataTag::Deprecated(reason) => Some(reason.as_str()),
        _ => None,
    })
}

pub fn directives(tags: &[MetadataTag]) -> impl Iterator<Item = &DirectiveTag> {
    tags.iter().filter_map(|tag| match tag {
        MetadataTag::Directive(directive) => Some(directive),
        _ => None,
    })
}

pub fn is_ignored(tags: &[MetadataTag]) -> bool {
    tags.iter().any(|tag| matches!(tag, MetadataTag::Ignore))
}

/// Declared property (or zero-argument accessor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeUsage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataTag>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, ty: TypeUsage) -> Self {
        Self {
            name: name.into(),
            ty,
            metadata: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: MetadataTag) -> Self {
        self.metadata.push(tag);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeUsage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataTag>,
}

impl ParameterDef {
    pub fn new(name: impl Into<String>, ty: TypeUsage) -> Self {
        Self {
            name: name.into(),
            ty,
            metadata: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: MetadataTag) -> Self {
        self.metadata.push(tag);
        self
    }
}

/// Declared function; parameters become field arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    pub return_type: TypeUsage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataTag>,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, return_type: TypeUsage) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type,
            metadata: Vec::new(),
        }
    }

    pub fn parameter(mut self, parameter: ParameterDef) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn tag(mut self, tag: MetadataTag) -> Self {
        self.metadata.push(tag);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumConstant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataTag>,
}

impl EnumConstant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: MetadataTag) -> Self {
        self.metadata.push(tag);
        self
    }
}

/// Read-only view of type definitions.
///
/// Member lists are returned in declaration order; the generator preserves
/// that order in the schema it emits.
pub trait TypeIntrospector {
    fn kind(&self, ty: &TypeId) -> Result<TypeKind>;

    fn metadata(&self, ty: &TypeId) -> Result<Vec<MetadataTag>>;

    fn declared_properties(&self, ty: &TypeId) -> Result<Vec<PropertyDef>>;

    fn declared_functions(&self, ty: &TypeId) -> Result<Vec<FunctionDef>>;

    fn supertypes(&self, ty: &TypeId) -> Result<Vec<TypeId>>;

    fn enum_constants(&self, ty: &TypeId) -> Result<Vec<EnumConstant>>;

    /// Concrete (object) subtypes of `root`, direct and nested, restricted to
    /// `within` packages.
    fn concrete_subtypes(&self, root: &TypeId, within: &[String]) -> Result<Vec<TypeId>>;

    fn is_list_like(&self, ty: &TypeId) -> bool;

    /// Schema scalar a type maps to, if it is a scalar.
    fn scalar_name(&self, ty: &TypeId) -> Option<String>;

    fn simple_name(&self, ty: &TypeId) -> String {
        ty.simple_name().to_string()
    }

    fn custom_name(&self, ty: &TypeId) -> Result<Option<String>> {
        Ok(custom_name(&self.metadata(ty)?).map(str::to_string))
    }

    fn description(&self, ty: &TypeId) -> Result<Option<String>> {
        Ok(description(&self.metadata(ty)?).map(str::to_string))
    }

    fn deprecation(&self, ty: &TypeId) -> Result<Option<String>> {
        Ok(deprecation(&self.metadata(ty)?).map(str::to_string))
    }

    fn declared_directives(&self, ty: &TypeId) -> Result<Vec<DirectiveTag>> {
        Ok(directives(&self.metadata(ty)?).cloned().collect())
    }

    fn is_enum(&self, ty: &TypeId) -> bool {
        matches!(self.kind(ty), Ok(TypeKind::Enum))
    }
}

/// One introspectable type held by [`StaticIntrospector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub id: TypeId,
    pub kind: TypeKind,
    #[serde(default)]
    pub metadata: Vec<MetadataTag>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
    #[serde(default)]
    pub supertypes: Vec<TypeId>,
    #[serde(default)]
    pub constants: Vec<EnumConstant>,
}

impl TypeDefinition {
    pub fn new(id: impl Into<TypeId>, kind: TypeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            metadata: Vec::new(),
            properties: Vec::new(),
            functions: Vec::new(),
            supertypes: Vec::new(),
            constants: Vec::new(),
        }
    }

    pub fn object(id: impl Into<TypeId>) -> Self {
        Self::new(id, TypeKind::Object)
    }

    pub fn interface(id: impl Into<TypeId>) -> Self {
        Self::new(id, TypeKind::Interface)
    }

    pub fn union(id: impl Into<TypeId>) -> Self {
        Self::new(id, TypeKind::Union)
    }

    pub fn enumeration(id: impl Into<TypeId>) -> Self {
        Self::new(id, TypeKind::Enum)
    }

    pub fn tag(mut self, tag: MetadataTag) -> Self {
        self.metadata.push(tag);
        self
    }

    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    pub fn function(mut self, function: FunctionDef) -> Self {
        self.functions.push(function);
        self
    }

    pub fn supertype(mut self, supertype: impl Into<TypeId>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn constant(mut self, constant: EnumConstant) -> Self {
        self.constants.push(constant);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarMapping {
    pub type_id: TypeId,
    pub name: String,
}

/// JSON document accepted by [`StaticIntrospector::from_json_str`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntrospectionDocument {
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
    #[serde(default)]
    pub scalars: Vec<ScalarMapping>,
    #[serde(default)]
    pub list_types: Vec<TypeId>,
}

/// In-memory [`TypeIntrospector`].
///
/// Starts with the built-in scalars registered under their own names
/// (`Int`, `String`, ...) and [`LIST_TYPE_ID`] as the list-like type.
#[derive(Debug, Clone)]
pub struct StaticIntrospector {
    types: Vec<TypeDefinition>,
    index: HashMap<TypeId, usize>,
    scalars: HashMap<TypeId, String>,
    list_types: HashSet<TypeId>,
}

impl StaticIntrospector {
    pub fn new() -> Self {
        let scalars = BUILTIN_SCALARS
            .iter()
            .map(|name| (TypeId::new(*name), name.to_string()))
            .collect();
        Self {
            types: Vec::new(),
            index: HashMap::new(),
            scalars,
            list_types: HashSet::from([TypeId::new(LIST_TYPE_ID)]),
        }
    }

    /// Register a type; a later definition with the same id replaces the earlier one.
    pub fn with_type(mut self, definition: TypeDefinition) -> Self {
        self.add_type(definition);
        self
    }

    pub fn with_types<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = TypeDefinition>,
    {
        for definition in definitions {
            self.add_type(definition);
        }
        self
    }

    /// Map a type id to a schema scalar name.
    pub fn with_scalar(mut self, type_id: impl Into<TypeId>, name: impl Into<String>) -> Self {
        self.scalars.insert(type_id.into(), name.into());
        self
    }

    pub fn with_list_type(mut self, type_id: impl Into<TypeId>) -> Self {
        self.list_types.insert(type_id.into());
        self
    }

    pub fn from_document(document: IntrospectionDocument) -> Self {
        let mut introspector = Self::new().with_types(document.types);
        for mapping in document.scalars {
            introspector.scalars.insert(mapping.type_id, mapping.name);
        }
        introspector.list_types.extend(document.list_types);
        introspector
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: IntrospectionDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(document))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::from_json_str(&data)
    }

    pub fn definitions(&self) -> &[TypeDefinition] {
        &self.types
    }

    fn add_type(&mut self, definition: TypeDefinition) {
        match self.index.get(&definition.id) {
            Some(&position) => self.types[position] = definition,
            None => {
                self.index.insert(definition.id.clone(), self.types.len());
                self.types.push(definition);
            }
        }
    }

    fn definition(&self, ty: &TypeId) -> Result<&TypeDefinition> {
        self.index
            .get(ty)
            .map(|&position| &self.types[position])
            .ok_or_else(|| Error::Introspection(format!("unknown type {ty}")))
    }

    fn is_subtype_of(&self, candidate: &TypeDefinition, root: &TypeId) -> bool {
        let mut pending: Vec<&TypeId> = candidate.supertypes.iter().collect();
        let mut seen = HashSet::new();
        while let Some(supertype) = pending.pop() {
            if supertype == root {
                return true;
            }
            if !seen.insert(supertype) {
                continue;
            }
            if let Ok(definition) = self.definition(supertype) {
                pending.extend(definition.supertypes.iter());
            }
        }
        false
    }
}

impl Default for StaticIntrospector {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeIntrospector for StaticIntrospector {
    fn kind(&self, ty: &TypeId) -> Result<TypeKind> {
        Ok(self.definition(ty)?.kind)
    }

    fn metadata(&self, ty: &TypeId) -> Result<Vec<MetadataTag>> {
        Ok(self.definition(ty)?.metadata.clone())
    }

    fn declared_properties(&self, ty: &TypeId) -> Result<Vec<PropertyDef>> {
        Ok(self.definition(ty)?.properties.clone())
    }

    fn declared_functions(&self, ty: &TypeId) -> Result<Vec<FunctionDef>> {
        Ok(self.definition(ty)?.functions.clone())
    }

    fn supertypes(&self, ty: &TypeId) -> Result<Vec<TypeId>> {
        Ok(self.definition(ty)?.supertypes.clone())
    }

    fn enum_constants(&self, ty: &TypeId) -> Result<Vec<EnumConstant>> {
        Ok(self.definition(ty)?.constants.clone())
    }

    fn concrete_subtypes(&self, root: &TypeId, within: &[String]) -> Result<Vec<TypeId>> {
        self.definition(root)?;
        Ok(self
            .types
            .iter()
            .filter(|candidate| candidate.kind == TypeKind::Object)
            .filter(|candidate| candidate.id.is_in_packages(within))
            .filter(|candidate| self.is_subtype_of(candidate, root))
            .map(|candidate| candidate.id.clone())
            .collect())
    }

    fn is_list_like(&self, ty: &TypeId) -> bool {
        self.list_types.contains(ty)
    }

    fn scalar_name(&self, ty: &TypeId) -> Option<String> {
        self.scalars.get(ty).cloned()
    }
}
