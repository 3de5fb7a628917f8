//! GraphQL Federation support
//!
//! Static validation of the federation directives (`@key`, `@extends`,
//! `@external`, `@provides`, `@requires`) over a generated [`TypeGraph`], and
//! augmentation of a valid graph with the subgraph entry points (`_service`,
//! `_entities`) and their supporting types.

use crate::config::{SchemaGeneratorConfig, TopLevelObject};
use crate::error::{Error, Result};
use crate::introspect::TypeIntrospector;
use crate::schema::generate_schema;
use crate::sdl::print_schema_excluding;
use crate::types::{
    DirectiveApplication, DirectiveDefinition, DirectiveLocation, FieldDefinition,
    InputValueDefinition, NamedType, ObjectType, ScalarType, TypeGraph, TypeRef, UnionType,
};
use async_graphql::indexmap::IndexMap;
use async_graphql::Value as GqlValue;
use std::fmt;
use std::sync::Arc;

pub const KEY: &str = "key";
pub const EXTENDS: &str = "extends";
pub const EXTERNAL: &str = "external";
pub const PROVIDES: &str = "provides";
pub const REQUIRES: &str = "requires";

const FEDERATION_DIRECTIVES: [&str; 5] = [KEY, EXTENDS, EXTERNAL, PROVIDES, REQUIRES];

pub const ANY_SCALAR: &str = "_Any";
pub const FIELD_SET_SCALAR: &str = "_FieldSet";
pub const SERVICE_TYPE: &str = "_Service";
pub const ENTITY_UNION: &str = "_Entity";
pub const SERVICE_FIELD: &str = "_service";
pub const ENTITIES_FIELD: &str = "_entities";

/// Generate a schema, validate its federation directives and augment it with
/// the federation entry points.
pub fn generate_federated_schema(
    config: &SchemaGeneratorConfig,
    introspector: &dyn TypeIntrospector,
    queries: &[TopLevelObject],
    mutations: &[TopLevelObject],
    subscriptions: &[TopLevelObject],
) -> Result<TypeGraph> {
    let graph = generate_schema(config, introspector, queries, mutations, subscriptions)?;
    FederatedSchemaValidator::new().validate(&graph)?;
    FederationConfig::from_graph(&graph).apply(graph)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FederationDirectiveKind {
    Key,
    Extends,
    External,
    Provides,
    Requires,
}

impl FederationDirectiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            KEY => Some(Self::Key),
            EXTENDS => Some(Self::Extends),
            EXTERNAL => Some(Self::External),
            PROVIDES => Some(Self::Provides),
            REQUIRES => Some(Self::Requires),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Key => KEY,
            Self::Extends => EXTENDS,
            Self::External => EXTERNAL,
            Self::Provides => PROVIDES,
            Self::Requires => REQUIRES,
        }
    }
}

/// A federation directive read back from a directive application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederationDirective {
    pub kind: FederationDirectiveKind,
    /// Raw `fields` argument, for `@key`, `@provides` and `@requires`
    pub field_set: Option<String>,
}

impl FederationDirective {
    pub fn from_application(application: &DirectiveApplication) -> Option<Self> {
        let kind = FederationDirectiveKind::from_name(&application.name)?;
        let field_set = match application.get_argument("fields") {
            Some(GqlValue::String(fields)) => Some(fields.clone()),
            _ => None,
        };
        Some(Self { kind, field_set })
    }

    /// Federation directives among `applications`, in declaration order.
    pub fn collect(applications: &[DirectiveApplication]) -> Vec<Self> {
        applications.iter().filter_map(Self::from_application).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldSetError {
    #[error("field set is empty")]
    Empty,
    #[error("nested field sets are not supported")]
    Nested,
}

/// A flat, whitespace separated selection of field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<String>,
}

impl FieldSet {
    pub fn parse(raw: &str) -> std::result::Result<Self, FieldSetError> {
        if raw.contains(['{', '}']) {
            return Err(FieldSetError::Nested);
        }
        let fields: Vec<String> = raw.split_whitespace().map(String::from).collect();
        if fields.is_empty() {
            return Err(FieldSetError::Empty);
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Checks federation directives over a finished graph.
///
/// Violations are collected over the whole graph and reported together in a
/// single [`Error::InvalidFederatedSchema`], ordered by type name then field
/// name, with type-level violations ahead of field-level ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct FederatedSchemaValidator;

/// Output type as seen by the validator: roots, objects and interfaces.
struct CompositeType<'g> {
    name: &'g str,
    directives: &'g [DirectiveApplication],
    fields: &'g [FieldDefinition],
}

impl CompositeType<'_> {
    fn is_extended(&self) -> bool {
        self.directives.iter().any(|directive| directive.name == EXTENDS)
    }

    fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl FederatedSchemaValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, graph: &TypeGraph) -> Result<()> {
        let mut composites: Vec<CompositeType<'_>> = graph
            .roots()
            .map(|(_, root)| CompositeType::from(root))
            .chain(graph.types().iter().filter_map(|ty| composite(ty)))
            .collect();
        composites.sort_by(|a, b| a.name.cmp(b.name));

        let mut violations = Vec::new();
        for ty in &composites {
            self.validate_type(graph, ty, &mut violations);
        }

        if violations.is_empty() {
            tracing::info!(types = composites.len(), "federated schema is valid");
            Ok(())
        } else {
            tracing::debug!(violations = violations.len(), "federated schema is invalid");
            Err(Error::InvalidFederatedSchema(violations))
        }
    }

    fn validate_type(&self, graph: &TypeGraph, ty: &CompositeType<'_>, violations: &mut Vec<String>) {
        for directive in FederationDirective::collect(ty.directives) {
            if directive.kind != FederationDirectiveKind::Key {
                continue;
            }
            let field_set = directive.field_set.as_deref().unwrap_or_default();
            let prefix = format!("{}(fields = \"{field_set}\") directive on {}", directive.kind, ty.name);
            check_field_set(graph, ty, field_set, ty.is_extended(), &prefix, violations);
        }

        let mut fields: Vec<&FieldDefinition> = ty.fields.iter().collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        for field in fields {
            self.validate_field(graph, ty, field, violations);
        }
    }

    fn validate_field(
        &self,
        graph: &TypeGraph,
        parent: &CompositeType<'_>,
        field: &FieldDefinition,
        violations: &mut Vec<String>,
    ) {
        for directive in FederationDirective::collect(&field.directives) {
            let field_set = directive.field_set.as_deref().unwrap_or_default();
            let prefix = || {
                format!(
                    "{}(fields = \"{field_set}\") directive on {}.{}",
                    directive.kind, parent.name, field.name
                )
            };
            match directive.kind {
                FederationDirectiveKind::External if !parent.is_extended() => {
                    violations.push(format!(
                        "@external directive on {}.{} is not allowed - type {} is not marked @extends",
                        parent.name, field.name, parent.name
                    ));
                }
                FederationDirectiveKind::Provides => {
                    let target = field.ty.base_name();
                    match graph.get_type(target).map(Arc::as_ref) {
                        Some(NamedType::Object(object)) => {
                            let target = CompositeType::from(object);
                            if target.is_extended() {
                                check_field_set(graph, &target, field_set, true, &prefix(), violations);
                            } else {
                                violations.push(format!(
                                    "{} specifies invalid field set - field set references local object, type={target}",
                                    prefix(),
                                    target = target.name
                                ));
                            }
                        }
                        Some(ty) if ty.is_abstract() => violations.push(format!(
                            "{} specifies invalid field set - field set references GraphQL interface or union, type={target}",
                            prefix()
                        )),
                        _ => violations.push(format!(
                            "{} specifies invalid field set - field set references non-object type, type={target}",
                            prefix()
                        )),
                    }
                }
                FederationDirectiveKind::Requires => {
                    if parent.is_extended() {
                        check_field_set(graph, parent, field_set, true, &prefix(), violations);
                    } else {
                        violations.push(format!(
                            "{} specifies invalid field set - field set references local object, type={}",
                            prefix(),
                            parent.name
                        ));
                    }
                }
                _ => {}
            }
        }
    }
}

impl<'g> From<&'g ObjectType> for CompositeType<'g> {
    fn from(object: &'g ObjectType) -> Self {
        Self {
            name: &object.name,
            directives: &object.directives,
            fields: &object.fields,
        }
    }
}

fn composite(ty: &NamedType) -> Option<CompositeType<'_>> {
    match ty {
        NamedType::Object(object) => Some(CompositeType::from(object)),
        NamedType::Interface(interface) => Some(CompositeType {
            name: &interface.name,
            directives: &interface.directives,
            fields: &interface.fields,
        }),
        _ => None,
    }
}

/// Check every field of `field_set` against `target`.
///
/// With `require_external`, referenced fields must be marked `@external`.
fn check_field_set(
    graph: &TypeGraph,
    target: &CompositeType<'_>,
    field_set: &str,
    require_external: bool,
    prefix: &str,
    violations: &mut Vec<String>,
) {
    let field_set = match FieldSet::parse(field_set) {
        Ok(field_set) => field_set,
        Err(err) => {
            violations.push(format!("{prefix} specifies invalid field set - {err}"));
            return;
        }
    };

    for name in field_set.fields() {
        let Some(field) = target.field(name) else {
            violations.push(format!(
                "{prefix} specifies invalid field set - field set specifies field that does not exist, field={name}"
            ));
            continue;
        };
        if field.ty.is_list() {
            violations.push(format!(
                "{prefix} specifies invalid field set - field set references list, field={name}"
            ));
        } else if graph
            .get_type(field.ty.base_name())
            .is_some_and(|ty| ty.is_abstract())
        {
            violations.push(format!(
                "{prefix} specifies invalid field set - field set references GraphQL interface or union, field={name}"
            ));
        } else if require_external && !field.has_directive(EXTERNAL) {
            violations.push(format!(
                "{prefix} specifies invalid field set - extended type incorrectly references local field={name}"
            ));
        }
    }
}

/// Federation configuration extracted from a generated graph
#[derive(Clone, Debug, Default)]
pub struct FederationConfig {
    /// Entity object types by name, in graph order
    pub entities: IndexMap<String, EntityConfig>,
}

/// Configuration for a federated entity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityConfig {
    pub type_name: String,
    /// Key field sets for this entity (e.g., ["id"] or ["orgId", "userId"])
    pub keys: Vec<Vec<String>>,
    /// Whether this entity extends an entity from another service
    pub extend: bool,
}

impl FederationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every object type carrying `@key`.
    pub fn from_graph(graph: &TypeGraph) -> Self {
        let mut config = Self::new();
        for ty in graph.types() {
            let NamedType::Object(object) = ty.as_ref() else {
                continue;
            };
            let keys: Vec<Vec<String>> = FederationDirective::collect(&object.directives)
                .into_iter()
                .filter(|directive| directive.kind == FederationDirectiveKind::Key)
                .filter_map(|directive| directive.field_set)
                // Split on whitespace to support composite keys like "orgId userId"
                .map(|key| key.split_whitespace().map(String::from).collect())
                .collect();
            if keys.is_empty() {
                continue;
            }

            config.entities.insert(
                object.name.clone(),
                EntityConfig {
                    type_name: object.name.clone(),
                    keys,
                    extend: ty.has_directive(EXTENDS),
                },
            );
        }
        config
    }

    /// Check if federation is enabled (i.e., if there are any entities)
    pub fn is_enabled(&self) -> bool {
        !self.entities.is_empty()
    }

    /// Augment `graph` with the federation types, root fields and directive
    /// definitions. The SDL of `graph` as given becomes the service SDL.
    pub fn apply(&self, graph: TypeGraph) -> Result<TypeGraph> {
        let service_sdl = print_schema_excluding(&graph, &FEDERATION_DIRECTIVES);
        let (mut query, mutation, subscription, mut types, directives) = graph.into_parts();

        let mut added = vec![
            NamedType::Scalar(ScalarType::new(ANY_SCALAR)),
            NamedType::Scalar(ScalarType::new(FIELD_SET_SCALAR)),
            NamedType::Object(ObjectType::new(SERVICE_TYPE).field(FieldDefinition::new(
                "sdl",
                TypeRef::non_null(TypeRef::named("String")),
            ))),
        ];
        query.fields.push(FieldDefinition::new(
            SERVICE_FIELD,
            TypeRef::non_null(TypeRef::named(SERVICE_TYPE)),
        ));

        if self.is_enabled() {
            added.push(NamedType::Union(UnionType {
                name: ENTITY_UNION.to_string(),
                description: None,
                members: self.entities.keys().cloned().collect(),
                directives: Vec::new(),
            }));
            query.fields.push(
                FieldDefinition::new(
                    ENTITIES_FIELD,
                    TypeRef::non_null(TypeRef::list(TypeRef::named(ENTITY_UNION))),
                )
                .argument(InputValueDefinition::new(
                    "representations",
                    TypeRef::named_nn_list_nn(ANY_SCALAR),
                )),
            );
        }

        for ty in &added {
            if types.iter().any(|existing| existing.name() == ty.name()) {
                return Err(Error::Schema(format!(
                    "type {} is reserved for federation",
                    ty.name()
                )));
            }
        }
        types.extend(added.into_iter().map(Arc::new));

        let mut definitions = federation_directive_definitions();
        definitions.extend(
            directives
                .into_iter()
                .filter(|definition| FederationDirectiveKind::from_name(&definition.name).is_none()),
        );

        tracing::info!(entities = self.entities.len(), "applied federation to schema");
        Ok(TypeGraph::new(query, mutation, subscription, types, definitions)
            .with_service_sdl(service_sdl))
    }
}

impl fmt::Display for FederationDirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// Definitions of the federation directives, in the order they are printed.
pub fn federation_directive_definitions() -> Vec<DirectiveDefinition> {
    let fields = || {
        vec![InputValueDefinition::new(
            "fields",
            TypeRef::non_null(TypeRef::named(FIELD_SET_SCALAR)),
        )]
    };
    vec![
        DirectiveDefinition {
            name: KEY.to_string(),
            description: None,
            arguments: fields(),
            repeatable: true,
            locations: vec![DirectiveLocation::Object, DirectiveLocation::Interface],
        },
        DirectiveDefinition {
            name: EXTENDS.to_string(),
            description: None,
            arguments: Vec::new(),
            repeatable: false,
            locations: vec![DirectiveLocation::Object, DirectiveLocation::Interface],
        },
        DirectiveDefinition {
            name: EXTERNAL.to_string(),
            description: None,
            arguments: Vec::new(),
            repeatable: false,
            locations: vec![DirectiveLocation::FieldDefinition],
        },
        DirectiveDefinition {
            name: PROVIDES.to_string(),
            description: None,
            arguments: fields(),
            repeatable: false,
            locations: vec![DirectiveLocation::FieldDefinition],
        },
        DirectiveDefinition {
            name: REQUIRES.to_string(),
            description: None,
            arguments: fields(),
            repeatable: false,
            locations: vec![DirectiveLocation::FieldDefinition],
        },
    ]
}
