//! GraphQL schema generation from introspected type definitions.
//!
//! [`SchemaGenerator`] walks the functions of the root objects, resolves every
//! type they reach through a per-run [`TypesCache`], and assembles the result
//! into a [`TypeGraph`]. Builders for objects, interfaces, unions, enums,
//! scalars and input objects live here; each one turns a single introspected
//! type into a single [`NamedType`].

use crate::cache::{CachedType, TypeKey, TypesCache, Variance};
use crate::config::{SchemaGeneratorConfig, TopLevelObject};
use crate::error::{Error, Result};
use crate::hooks::SchemaGeneratorHooks;
use crate::introspect::{
    custom_name, deprecation, description, directives, is_ignored, FunctionDef, MetadataTag,
    PropertyDef, TypeId, TypeIntrospector, TypeKind, TypeUsage, BUILTIN_SCALARS,
};
use crate::types::{
    Deprecation, DirectiveApplication, DirectiveDefinition, DirectiveLocation, EnumType,
    EnumValueDefinition, FieldDefinition, InputObjectType, InputValueDefinition, InterfaceType,
    NamedType, ObjectType, ScalarType, SchemaType, TypeGraph, TypeRef, UnionType,
};
use async_graphql::indexmap::IndexMap;
use async_graphql::Value as GqlValue;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Generate a schema in one call. See [`SchemaGenerator::generate`].
pub fn generate_schema(
    config: &SchemaGeneratorConfig,
    introspector: &dyn TypeIntrospector,
    queries: &[TopLevelObject],
    mutations: &[TopLevelObject],
    subscriptions: &[TopLevelObject],
) -> Result<TypeGraph> {
    SchemaGenerator::new(config, introspector).generate(queries, mutations, subscriptions)
}

/// Builds [`TypeGraph`]s from root objects.
///
/// The generator itself is stateless; every call to [`generate`](Self::generate)
/// uses a fresh [`TypesCache`], so runs never observe each other's types.
pub struct SchemaGenerator<'a> {
    config: &'a SchemaGeneratorConfig,
    introspector: &'a dyn TypeIntrospector,
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(config: &'a SchemaGeneratorConfig, introspector: &'a dyn TypeIntrospector) -> Self {
        Self {
            config,
            introspector,
        }
    }

    /// Generate the type graph reachable from the given roots.
    ///
    /// The functions of every query object become fields of the query type,
    /// and likewise for mutations and subscriptions. Mutation and subscription
    /// types are omitted when they end up without fields.
    pub fn generate(
        &self,
        queries: &[TopLevelObject],
        mutations: &[TopLevelObject],
        subscriptions: &[TopLevelObject],
    ) -> Result<TypeGraph> {
        let mut cache = TypesCache::new(self.config.supported_packages().to_vec());
        let names = self.config.top_level_names();

        cache.reserve(&names.query, root_key(&names.query))?;
        if !mutations.is_empty() {
            cache.reserve(&names.mutation, root_key(&names.mutation))?;
        }
        if !subscriptions.is_empty() {
            cache.reserve(&names.subscription, root_key(&names.subscription))?;
        }

        let query = self
            .root_object(&mut cache, SchemaType::Query, &names.query, queries)?
            .ok_or_else(|| Error::EmptyQueryType(names.query.clone()))?;
        let mutation =
            self.root_object(&mut cache, SchemaType::Mutation, &names.mutation, mutations)?;
        let subscription = self.root_object(
            &mut cache,
            SchemaType::Subscription,
            &names.subscription,
            subscriptions,
        )?;

        let types = cache.into_types();
        let roots: Vec<&ObjectType> = std::iter::once(&query)
            .chain(mutation.as_ref())
            .chain(subscription.as_ref())
            .collect();
        let directives = collect_directive_definitions(&roots, &types);

        let graph = TypeGraph::new(query, mutation, subscription, types, directives);
        tracing::info!(
            types = graph.types().len(),
            directives = graph.directives().len(),
            "generated GraphQL schema"
        );
        Ok(graph)
    }

    fn hooks(&self) -> &dyn SchemaGeneratorHooks {
        self.config.hooks()
    }

    fn root_object(
        &self,
        cache: &mut TypesCache,
        schema_type: SchemaType,
        name: &str,
        roots: &[TopLevelObject],
    ) -> Result<Option<ObjectType>> {
        let mut object = ObjectType::new(name);
        for root in roots {
            cache.ensure_supported(&root.type_id)?;
            for function in self.introspector.declared_functions(&root.type_id)? {
                if !self.is_valid_function(&root.type_id, &function) {
                    continue;
                }
                let field = self.function_field(cache, &function)?;
                let field = self
                    .hooks()
                    .did_generate_root_field(schema_type, &function, field)?;
                object.fields.push(field);
            }
        }

        if object.fields.is_empty() {
            tracing::debug!(root = name, "root type has no fields, omitting it");
            return Ok(None);
        }
        Ok(Some(object))
    }

    /// GraphQL name for a type. Input variants carry the configured suffix.
    fn type_name(&self, type_id: &TypeId, variance: Variance) -> Result<String> {
        let name = match self.introspector.custom_name(type_id)? {
            Some(name) => name,
            None => self.introspector.simple_name(type_id),
        };
        let suffix = self.config.input_suffix();
        if variance == Variance::Input && !name.ends_with(suffix) {
            Ok(format!("{name}{suffix}"))
        } else {
            Ok(name)
        }
    }

    /// Resolve a declared usage to a type reference, wrapping lists and
    /// non-null as declared.
    fn graphql_type(
        &self,
        cache: &mut TypesCache,
        usage: &TypeUsage,
        variance: Variance,
    ) -> Result<TypeRef> {
        let usage = self.hooks().will_resolve_monad(usage);
        let base = if self.introspector.is_list_like(&usage.type_id) {
            let element = usage.arguments.first().ok_or_else(|| {
                Error::Introspection(format!("list type {} has no element type", usage.type_id))
            })?;
            TypeRef::list(self.graphql_type(cache, element, variance)?)
        } else {
            let named = self.build_named_type(cache, &usage.type_id, variance)?;
            TypeRef::named(named.name())
        };

        Ok(if usage.nullable {
            base
        } else {
            TypeRef::non_null(base)
        })
    }

    /// Resolve a nominal type to a named type, building it on first use.
    pub(crate) fn build_named_type(
        &self,
        cache: &mut TypesCache,
        type_id: &TypeId,
        variance: Variance,
    ) -> Result<CachedType> {
        if let Some(scalar) = self.introspector.scalar_name(type_id) {
            if BUILTIN_SCALARS.contains(&scalar.as_str()) {
                return Ok(CachedType::Reference(scalar));
            }
            let key = TypeKey::output(type_id.clone());
            return cache.build_or_reuse(&key, &scalar, |_| {
                self.hooks()
                    .did_generate_graphql_type(type_id, NamedType::Scalar(ScalarType::new(&scalar)))
            });
        }

        if let Some(custom) = self.hooks().will_generate_graphql_type(type_id) {
            return self.replacement_type(cache, type_id, variance, custom);
        }

        cache.ensure_supported(type_id)?;
        let kind = self.introspector.kind(type_id)?;

        // enums have no separate input form
        let variance = match kind {
            TypeKind::Enum => Variance::Output,
            _ => variance,
        };
        if variance == Variance::Input && matches!(kind, TypeKind::Interface | TypeKind::Union) {
            return Err(Error::InvalidInputType {
                type_id: type_id.clone(),
                reason: "interfaces and unions cannot be used as input types".to_string(),
            });
        }

        let key = TypeKey::new(type_id.clone(), variance);
        let name = self.type_name(type_id, variance)?;
        cache.build_or_reuse(&key, &name, |cache| {
            let built = match (kind, variance) {
                (TypeKind::Enum, _) => self.build_enum(type_id, &name)?,
                (TypeKind::Object, Variance::Input) => {
                    self.build_input_object(cache, type_id, &name)?
                }
                (TypeKind::Object, Variance::Output) => self.build_object(cache, type_id, &name)?,
                (TypeKind::Interface, _) => self.build_interface(cache, type_id, &name)?,
                (TypeKind::Union, _) => self.build_union(cache, type_id, &name)?,
            };
            self.hooks().did_generate_graphql_type(type_id, built)
        })
    }

    /// Cache a hook-provided type. Enums and scalars share one slot across
    /// positions; input objects live in the input slot, everything else in
    /// the output slot.
    fn replacement_type(
        &self,
        cache: &mut TypesCache,
        type_id: &TypeId,
        variance: Variance,
        custom: NamedType,
    ) -> Result<CachedType> {
        match variance {
            Variance::Input if !custom.is_input_type() => {
                return Err(Error::InvalidInputType {
                    type_id: type_id.clone(),
                    reason: format!("replacement type {} is not an input type", custom.name()),
                });
            }
            Variance::Output if !custom.is_output_type() => {
                return Err(Error::Schema(format!(
                    "{type_id} is replaced by input type {} in output position",
                    custom.name()
                )));
            }
            _ => {}
        }

        let key = match custom {
            NamedType::InputObject(_) => TypeKey::input(type_id.clone()),
            _ => TypeKey::output(type_id.clone()),
        };
        let name = custom.name().to_string();
        cache.build_or_reuse(&key, &name, |_| Ok(custom))
    }

    fn type_description(&self, type_id: &TypeId) -> Result<Option<String>> {
        self.introspector.description(type_id)
    }

    fn type_directives(&self, type_id: &TypeId) -> Result<Vec<DirectiveApplication>> {
        Ok(self
            .introspector
            .declared_directives(type_id)?
            .iter()
            .map(DirectiveApplication::from)
            .collect())
    }

    fn build_object(&self, cache: &mut TypesCache, type_id: &TypeId, name: &str) -> Result<NamedType> {
        let interfaces = self.interfaces(cache, type_id)?;
        let fields = self.output_fields(cache, type_id)?;

        Ok(NamedType::Object(ObjectType {
            name: name.to_string(),
            description: self.type_description(type_id)?,
            interfaces,
            fields,
            directives: self.type_directives(type_id)?,
        }))
    }

    /// Interfaces implement their own interface supertypes, and every concrete
    /// subtype is built so the implementations are part of the graph.
    fn build_interface(
        &self,
        cache: &mut TypesCache,
        type_id: &TypeId,
        name: &str,
    ) -> Result<NamedType> {
        let interfaces = self.interfaces(cache, type_id)?;
        let fields = self.output_fields(cache, type_id)?;

        let implementations = self
            .introspector
            .concrete_subtypes(type_id, cache.supported_packages())?;
        for implementation in &implementations {
            self.build_named_type(cache, implementation, Variance::Output)?;
        }

        Ok(NamedType::Interface(InterfaceType {
            name: name.to_string(),
            description: self.type_description(type_id)?,
            interfaces,
            fields,
            directives: self.type_directives(type_id)?,
        }))
    }

    fn build_union(&self, cache: &mut TypesCache, type_id: &TypeId, name: &str) -> Result<NamedType> {
        let subtypes = self
            .introspector
            .concrete_subtypes(type_id, cache.supported_packages())?;
        if subtypes.is_empty() {
            return Err(Error::NoSubtypesFound {
                type_id: type_id.clone(),
            });
        }

        let mut members: Vec<String> = Vec::new();
        for subtype in &subtypes {
            let member = self.build_named_type(cache, subtype, Variance::Output)?;
            if !members.iter().any(|existing| existing == member.name()) {
                members.push(member.name().to_string());
            }
        }

        Ok(NamedType::Union(UnionType {
            name: name.to_string(),
            description: self.type_description(type_id)?,
            members,
            directives: self.type_directives(type_id)?,
        }))
    }

    fn build_enum(&self, type_id: &TypeId, name: &str) -> Result<NamedType> {
        let values = self
            .introspector
            .enum_constants(type_id)?
            .into_iter()
            .filter(|constant| !is_ignored(&constant.metadata))
            .map(|constant| EnumValueDefinition {
                name: member_name(&constant.name, &constant.metadata),
                description: description(&constant.metadata).map(str::to_string),
                deprecation: Deprecation::from_reason(deprecation(&constant.metadata)),
                directives: directive_applications(&constant.metadata),
            })
            .collect();

        Ok(NamedType::Enum(EnumType {
            name: name.to_string(),
            description: self.type_description(type_id)?,
            values,
            directives: self.type_directives(type_id)?,
        }))
    }

    fn build_input_object(
        &self,
        cache: &mut TypesCache,
        type_id: &TypeId,
        name: &str,
    ) -> Result<NamedType> {
        let mut fields = Vec::new();
        for property in self.introspector.declared_properties(type_id)? {
            if !self.is_valid_property(type_id, &property) {
                continue;
            }
            fields.push(self.input_value(
                cache,
                &property.name,
                &property.ty,
                &property.metadata,
            )?);
        }

        Ok(NamedType::InputObject(InputObjectType {
            name: name.to_string(),
            description: self.type_description(type_id)?,
            fields,
            directives: self.type_directives(type_id)?,
        }))
    }

    /// Names of the interface supertypes of `type_id`, transitively, in
    /// declaration order.
    fn interfaces(&self, cache: &mut TypesCache, type_id: &TypeId) -> Result<Vec<String>> {
        let mut interfaces: Vec<String> = Vec::new();
        let mut pending: Vec<TypeId> = self.introspector.supertypes(type_id)?;
        pending.reverse();
        let mut seen: HashSet<TypeId> = HashSet::new();

        while let Some(supertype) = pending.pop() {
            if !seen.insert(supertype.clone())
                || !cache.is_supported(&supertype)
                || !self.hooks().is_valid_supertype(&supertype)
            {
                continue;
            }

            let mut parents = self.introspector.supertypes(&supertype)?;
            parents.reverse();
            pending.extend(parents);

            if self.introspector.kind(&supertype)? != TypeKind::Interface {
                continue;
            }
            let interface = self.build_named_type(cache, &supertype, Variance::Output)?;
            if !interfaces.iter().any(|existing| existing == interface.name()) {
                interfaces.push(interface.name().to_string());
            }
        }
        Ok(interfaces)
    }

    fn output_fields(&self, cache: &mut TypesCache, type_id: &TypeId) -> Result<Vec<FieldDefinition>> {
        let mut fields = Vec::new();
        for property in self.introspector.declared_properties(type_id)? {
            if self.is_valid_property(type_id, &property) {
                fields.push(self.property_field(cache, &property)?);
            }
        }
        for function in self.introspector.declared_functions(type_id)? {
            if self.is_valid_function(type_id, &function) {
                fields.push(self.function_field(cache, &function)?);
            }
        }
        Ok(fields)
    }

    fn property_field(&self, cache: &mut TypesCache, property: &PropertyDef) -> Result<FieldDefinition> {
        Ok(FieldDefinition {
            name: member_name(&property.name, &property.metadata),
            description: description(&property.metadata).map(str::to_string),
            arguments: Vec::new(),
            ty: self.graphql_type(cache, &property.ty, Variance::Output)?,
            deprecation: Deprecation::from_reason(deprecation(&property.metadata)),
            directives: directive_applications(&property.metadata),
        })
    }

    fn function_field(&self, cache: &mut TypesCache, function: &FunctionDef) -> Result<FieldDefinition> {
        let mut arguments = Vec::new();
        for parameter in &function.parameters {
            if is_ignored(&parameter.metadata) {
                continue;
            }
            arguments.push(self.input_value(
                cache,
                &parameter.name,
                &parameter.ty,
                &parameter.metadata,
            )?);
        }

        Ok(FieldDefinition {
            name: member_name(&function.name, &function.metadata),
            description: description(&function.metadata).map(str::to_string),
            arguments,
            ty: self.graphql_type(cache, &function.return_type, Variance::Output)?,
            deprecation: Deprecation::from_reason(deprecation(&function.metadata)),
            directives: directive_applications(&function.metadata),
        })
    }

    fn input_value(
        &self,
        cache: &mut TypesCache,
        name: &str,
        ty: &TypeUsage,
        metadata: &[MetadataTag],
    ) -> Result<InputValueDefinition> {
        Ok(InputValueDefinition {
            name: member_name(name, metadata),
            description: description(metadata).map(str::to_string),
            ty: self.graphql_type(cache, ty, Variance::Input)?,
            directives: directive_applications(metadata),
        })
    }

    fn is_valid_property(&self, parent: &TypeId, property: &PropertyDef) -> bool {
        !is_ignored(&property.metadata) && self.hooks().is_valid_property(parent, property)
    }

    fn is_valid_function(&self, parent: &TypeId, function: &FunctionDef) -> bool {
        !is_ignored(&function.metadata) && self.hooks().is_valid_function(parent, function)
    }
}

/// Sentinel owner of a root type name.
fn root_key(name: &str) -> TypeKey {
    TypeKey::output(TypeId::new(format!("<{name} root>")))
}

fn member_name(name: &str, metadata: &[MetadataTag]) -> String {
    custom_name(metadata).unwrap_or(name).to_string()
}

fn directive_applications(metadata: &[MetadataTag]) -> Vec<DirectiveApplication> {
    directives(metadata).map(DirectiveApplication::from).collect()
}

/// Infers a definition for every directive applied in the graph.
///
/// Argument types come from the first application seen; a directive applied
/// more than once to the same element is marked repeatable.
pub(crate) fn collect_directive_definitions(
    roots: &[&ObjectType],
    types: &[Arc<NamedType>],
) -> Vec<DirectiveDefinition> {
    let mut collector = DirectiveCollector::default();
    for root in roots {
        collector.visit_fields(&root.fields);
    }
    for ty in types {
        match ty.as_ref() {
            NamedType::Object(object) => {
                collector.visit(&object.directives, DirectiveLocation::Object);
                collector.visit_fields(&object.fields);
            }
            NamedType::Interface(interface) => {
                collector.visit(&interface.directives, DirectiveLocation::Interface);
                collector.visit_fields(&interface.fields);
            }
            NamedType::Union(union) => {
                collector.visit(&union.directives, DirectiveLocation::Union);
            }
            NamedType::Enum(en) => {
                collector.visit(&en.directives, DirectiveLocation::Enum);
                for value in &en.values {
                    collector.visit(&value.directives, DirectiveLocation::EnumValue);
                }
            }
            NamedType::Scalar(scalar) => {
                collector.visit(&scalar.directives, DirectiveLocation::Scalar);
            }
            NamedType::InputObject(input) => {
                collector.visit(&input.directives, DirectiveLocation::InputObject);
                for field in &input.fields {
                    collector.visit(&field.directives, DirectiveLocation::InputFieldDefinition);
                }
            }
        }
    }
    collector.finish()
}

#[derive(Default)]
struct DirectiveCollector {
    definitions: IndexMap<String, (DirectiveDefinition, BTreeSet<DirectiveLocation>)>,
}

impl DirectiveCollector {
    fn visit_fields(&mut self, fields: &[FieldDefinition]) {
        for field in fields {
            self.visit(&field.directives, DirectiveLocation::FieldDefinition);
            for argument in &field.arguments {
                self.visit(&argument.directives, DirectiveLocation::ArgumentDefinition);
            }
        }
    }

    fn visit(&mut self, applications: &[DirectiveApplication], location: DirectiveLocation) {
        for (position, application) in applications.iter().enumerate() {
            let repeated = applications[..position]
                .iter()
                .any(|earlier| earlier.name == application.name);
            let (definition, locations) = self
                .definitions
                .entry(application.name.clone())
                .or_insert_with(|| {
                    let definition = DirectiveDefinition {
                        name: application.name.clone(),
                        description: None,
                        arguments: application
                            .arguments
                            .iter()
                            .map(|(name, value)| {
                                InputValueDefinition::new(name.clone(), argument_type(value))
                            })
                            .collect(),
                        repeatable: false,
                        locations: Vec::new(),
                    };
                    (definition, BTreeSet::new())
                });
            definition.repeatable |= repeated;
            locations.insert(location);
        }
    }

    fn finish(self) -> Vec<DirectiveDefinition> {
        self.definitions
            .into_values()
            .map(|(mut definition, locations)| {
                definition.locations = locations.into_iter().collect();
                definition
            })
            .collect()
    }
}

fn argument_type(value: &GqlValue) -> TypeRef {
    let name = match value {
        GqlValue::Number(number) if number.is_i64() || number.is_u64() => "Int",
        GqlValue::Number(_) => "Float",
        GqlValue::Boolean(_) => "Boolean",
        _ => "String",
    };
    TypeRef::non_null(TypeRef::named(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::SchemaGeneratorHooks;
    use crate::introspect::{
        DirectiveTag, EnumConstant, ParameterDef, StaticIntrospector, TypeDefinition,
    };
    use std::cell::Cell;

    const PACKAGE: &str = "com.example";

    fn config() -> SchemaGeneratorConfig {
        SchemaGeneratorConfig::new([PACKAGE])
    }

    fn query(type_id: &str) -> Vec<TopLevelObject> {
        vec![TopLevelObject::new(type_id)]
    }

    fn widget_introspector() -> StaticIntrospector {
        StaticIntrospector::new()
            .with_type(
                TypeDefinition::object("com.example.Widget")
                    .property(PropertyDef::new("id", TypeUsage::of("Int")))
                    .property(PropertyDef::new("value", TypeUsage::of("String"))),
            )
            .with_type(
                TypeDefinition::object("com.example.WidgetQuery").function(
                    FunctionDef::new("widgetById", TypeUsage::of("com.example.Widget").nullable())
                        .parameter(ParameterDef::new("id", TypeUsage::of("Int"))),
                ),
            )
    }

    fn type_named<'g>(graph: &'g TypeGraph, name: &str) -> &'g NamedType {
        graph
            .get_type(name)
            .unwrap_or_else(|| panic!("type {name} missing"))
            .as_ref()
    }

    #[test]
    fn query_function_becomes_field_with_arguments() {
        let introspector = widget_introspector();
        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.WidgetQuery"),
            &[],
            &[],
        )
        .unwrap();

        let field = graph.query().get_field("widgetById").unwrap();
        assert_eq!(field.ty.to_string(), "Widget");
        assert_eq!(field.arguments.len(), 1);
        assert_eq!(field.arguments[0].name, "id");
        assert_eq!(field.arguments[0].ty.to_string(), "Int!");

        let widget = type_named(&graph, "Widget").as_object().unwrap();
        let fields: Vec<String> = widget
            .fields
            .iter()
            .map(|field| format!("{}: {}", field.name, field.ty))
            .collect();
        assert_eq!(fields, vec!["id: Int!", "value: String!"]);
        assert!(graph.mutation().is_none());
        assert!(graph.subscription().is_none());
    }

    #[test]
    fn mutually_recursive_types_terminate_with_named_references() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::object("com.example.Author").property(PropertyDef::new(
                    "books",
                    TypeUsage::list(TypeUsage::of("com.example.Book")),
                )),
            )
            .with_type(
                TypeDefinition::object("com.example.Book")
                    .property(PropertyDef::new("author", TypeUsage::of("com.example.Author")))
                    .property(PropertyDef::new(
                        "sequel",
                        TypeUsage::of("com.example.Book").nullable(),
                    )),
            )
            .with_type(
                TypeDefinition::object("com.example.Library")
                    .function(FunctionDef::new("author", TypeUsage::of("com.example.Author"))),
            );

        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Library"),
            &[],
            &[],
        )
        .unwrap();

        let names: Vec<&str> = graph.types().iter().map(|ty| ty.name()).collect();
        assert_eq!(names, vec!["Book", "Author"]);

        let book = type_named(&graph, "Book").as_object().unwrap();
        assert_eq!(book.get_field("author").unwrap().ty.to_string(), "Author!");
        assert_eq!(book.get_field("sequel").unwrap().ty.to_string(), "Book");
        let author = type_named(&graph, "Author").as_object().unwrap();
        assert_eq!(author.get_field("books").unwrap().ty.to_string(), "[Book!]!");
        assert!(graph.unresolved_references().is_empty());
    }

    #[test]
    fn repeated_references_reuse_the_cached_instance() {
        let introspector = widget_introspector();
        let config = config();
        let generator = SchemaGenerator::new(&config, &introspector);
        let mut cache = TypesCache::new(config.supported_packages().to_vec());
        let widget = TypeId::new("com.example.Widget");

        let first = generator
            .build_named_type(&mut cache, &widget, Variance::Output)
            .unwrap();
        let second = generator
            .build_named_type(&mut cache, &widget, Variance::Output)
            .unwrap();

        assert!(Arc::ptr_eq(first.built().unwrap(), second.built().unwrap()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_types_with_the_same_name_conflict() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::object("com.example.a.Widget")
                    .property(PropertyDef::new("id", TypeUsage::of("Int"))),
            )
            .with_type(
                TypeDefinition::object("com.example.b.Widget")
                    .property(PropertyDef::new("name", TypeUsage::of("String"))),
            )
            .with_type(
                TypeDefinition::object("com.example.Query")
                    .function(FunctionDef::new("first", TypeUsage::of("com.example.a.Widget")))
                    .function(FunctionDef::new("second", TypeUsage::of("com.example.b.Widget"))),
            );

        let err = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Query"),
            &[],
            &[],
        )
        .unwrap_err();

        match err {
            Error::ConflictingTypes {
                name,
                existing,
                new,
            } => {
                assert_eq!(name, "Widget");
                assert_eq!(existing, TypeKey::output(TypeId::new("com.example.a.Widget")));
                assert_eq!(new, TypeKey::output(TypeId::new("com.example.b.Widget")));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn types_outside_supported_packages_are_rejected() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::object("org.other.Secret")
                    .property(PropertyDef::new("value", TypeUsage::of("String"))),
            )
            .with_type(
                TypeDefinition::object("com.example.Query")
                    .function(FunctionDef::new("secret", TypeUsage::of("org.other.Secret"))),
            );

        let err = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Query"),
            &[],
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeNotSupported { ref type_id, .. } if type_id.as_str() == "org.other.Secret"));
    }

    fn bakery() -> StaticIntrospector {
        StaticIntrospector::new()
            .with_type(TypeDefinition::union("com.example.Cake"))
            .with_type(
                TypeDefinition::object("com.example.StrawBerryCake")
                    .supertype("com.example.Cake")
                    .property(PropertyDef::new("berries", TypeUsage::of("Int"))),
            )
            .with_type(
                TypeDefinition::object("com.example.Bakery")
                    .function(FunctionDef::new("cake", TypeUsage::of("com.example.Cake")))
                    .function(FunctionDef::new(
                        "cakes",
                        TypeUsage::list(TypeUsage::of("com.example.Cake")),
                    )),
            )
    }

    #[test]
    fn abstract_root_becomes_union_of_concrete_subtypes() {
        let introspector = bakery();
        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Bakery"),
            &[],
            &[],
        )
        .unwrap();

        match type_named(&graph, "Cake") {
            NamedType::Union(union) => assert_eq!(union.members, vec!["StrawBerryCake"]),
            other => panic!("expected union, got {other:?}"),
        }
        assert!(type_named(&graph, "StrawBerryCake").as_object().is_some());
    }

    struct CountingIntrospector {
        inner: StaticIntrospector,
        subtype_lookups: Cell<usize>,
    }

    impl TypeIntrospector for CountingIntrospector {
        fn kind(&self, ty: &TypeId) -> Result<TypeKind> {
            self.inner.kind(ty)
        }
        fn metadata(&self, ty: &TypeId) -> Result<Vec<MetadataTag>> {
            self.inner.metadata(ty)
        }
        fn declared_properties(&self, ty: &TypeId) -> Result<Vec<PropertyDef>> {
            self.inner.declared_properties(ty)
        }
        fn declared_functions(&self, ty: &TypeId) -> Result<Vec<FunctionDef>> {
            self.inner.declared_functions(ty)
        }
        fn supertypes(&self, ty: &TypeId) -> Result<Vec<TypeId>> {
            self.inner.supertypes(ty)
        }
        fn enum_constants(&self, ty: &TypeId) -> Result<Vec<EnumConstant>> {
            self.inner.enum_constants(ty)
        }
        fn concrete_subtypes(&self, root: &TypeId, within: &[String]) -> Result<Vec<TypeId>> {
            self.subtype_lookups.set(self.subtype_lookups.get() + 1);
            self.inner.concrete_subtypes(root, within)
        }
        fn is_list_like(&self, ty: &TypeId) -> bool {
            self.inner.is_list_like(ty)
        }
        fn scalar_name(&self, ty: &TypeId) -> Option<String> {
            self.inner.scalar_name(ty)
        }
    }

    #[test]
    fn union_subtypes_are_discovered_once_per_run() {
        let introspector = CountingIntrospector {
            inner: bakery(),
            subtype_lookups: Cell::new(0),
        };
        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Bakery"),
            &[],
            &[],
        )
        .unwrap();

        assert_eq!(introspector.subtype_lookups.get(), 1);
        assert_eq!(graph.query().get_field("cakes").unwrap().ty.to_string(), "[Cake!]!");
    }

    #[test]
    fn union_without_subtypes_fails() {
        let introspector = StaticIntrospector::new()
            .with_type(TypeDefinition::union("com.example.Pastry"))
            .with_type(
                TypeDefinition::object("com.example.Query")
                    .function(FunctionDef::new("pastry", TypeUsage::of("com.example.Pastry"))),
            );

        let err = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Query"),
            &[],
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoSubtypesFound { ref type_id } if type_id.as_str() == "com.example.Pastry"));
    }

    #[test]
    fn enums_share_one_slot_and_objects_get_input_variants() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::enumeration("com.example.Color")
                    .constant(EnumConstant::new("RED"))
                    .constant(EnumConstant::new("GREEN").tag(MetadataTag::deprecated("use RED")))
                    .constant(EnumConstant::new("SECRET").tag(MetadataTag::Ignore)),
            )
            .with_type(
                TypeDefinition::object("com.example.Widget")
                    .property(PropertyDef::new("color", TypeUsage::of("com.example.Color"))),
            )
            .with_type(
                TypeDefinition::object("com.example.Query").function(
                    FunctionDef::new("paint", TypeUsage::of("com.example.Widget"))
                        .parameter(ParameterDef::new("widget", TypeUsage::of("com.example.Widget")))
                        .parameter(ParameterDef::new("color", TypeUsage::of("com.example.Color"))),
                ),
            );

        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Query"),
            &[],
            &[],
        )
        .unwrap();

        let names: Vec<&str> = graph.types().iter().map(|ty| ty.name()).collect();
        assert_eq!(names, vec!["Color", "WidgetInput", "Widget"]);

        let paint = graph.query().get_field("paint").unwrap();
        assert_eq!(paint.arguments[0].ty.to_string(), "WidgetInput!");
        assert_eq!(paint.arguments[1].ty.to_string(), "Color!");

        match type_named(&graph, "Color") {
            NamedType::Enum(en) => {
                let values: Vec<&str> = en.values.iter().map(|value| value.name.as_str()).collect();
                assert_eq!(values, vec!["RED", "GREEN"]);
                assert_eq!(en.values[1].deprecation.reason(), Some("use RED"));
            }
            other => panic!("expected enum, got {other:?}"),
        }
        match type_named(&graph, "WidgetInput") {
            NamedType::InputObject(input) => {
                assert_eq!(input.fields[0].ty.to_string(), "Color!");
            }
            other => panic!("expected input object, got {other:?}"),
        }
    }

    #[test]
    fn interfaces_pull_in_their_implementations() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::interface("com.example.Animal")
                    .property(PropertyDef::new("name", TypeUsage::of("String"))),
            )
            .with_type(
                TypeDefinition::object("com.example.Dog")
                    .supertype("com.example.Animal")
                    .property(PropertyDef::new("name", TypeUsage::of("String")))
                    .property(PropertyDef::new("friend", TypeUsage::of("com.example.Animal").nullable())),
            )
            .with_type(
                TypeDefinition::object("com.example.Cat")
                    .supertype("com.example.Animal")
                    .property(PropertyDef::new("name", TypeUsage::of("String"))),
            )
            .with_type(
                TypeDefinition::object("com.example.Zoo")
                    .function(FunctionDef::new("animal", TypeUsage::of("com.example.Animal"))),
            );

        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Zoo"),
            &[],
            &[],
        )
        .unwrap();

        for implementation in ["Dog", "Cat"] {
            let object = type_named(&graph, implementation).as_object().unwrap();
            assert_eq!(object.interfaces, vec!["Animal"]);
        }
        assert!(matches!(type_named(&graph, "Animal"), NamedType::Interface(_)));
        assert!(graph.unresolved_references().is_empty());
    }

    #[test]
    fn abstract_types_cannot_be_inputs() {
        let introspector = StaticIntrospector::new()
            .with_type(TypeDefinition::interface("com.example.Shape"))
            .with_type(
                TypeDefinition::object("com.example.Query").function(
                    FunctionDef::new("area", TypeUsage::of("Float"))
                        .parameter(ParameterDef::new("shape", TypeUsage::of("com.example.Shape"))),
                ),
            );

        let err = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Query"),
            &[],
            &[],
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT_TYPE");
    }

    #[test]
    fn query_without_fields_is_rejected() {
        let introspector =
            StaticIntrospector::new().with_type(TypeDefinition::object("com.example.Query"));
        let err = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Query"),
            &[],
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, Error::EmptyQueryType(ref name) if name == "Query"));
    }

    #[test]
    fn metadata_drives_names_descriptions_and_directives() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::object("com.example.Product")
                    .tag(MetadataTag::name("Item"))
                    .tag(MetadataTag::description("Something for sale"))
                    .tag(MetadataTag::key("sku"))
                    .tag(MetadataTag::directive(
                        DirectiveTag::new("cacheControl").argument("maxAge", 60),
                    ))
                    .property(PropertyDef::new("sku", TypeUsage::of("ID")))
                    .property(
                        PropertyDef::new("price_cents", TypeUsage::of("Int"))
                            .tag(MetadataTag::name("price"))
                            .tag(MetadataTag::deprecated("use amount")),
                    )
                    .property(PropertyDef::new("internal", TypeUsage::of("String")).tag(MetadataTag::Ignore)),
            )
            .with_type(
                TypeDefinition::object("com.example.Shop")
                    .function(FunctionDef::new("product", TypeUsage::of("com.example.Product")))
                    .function(
                        FunctionDef::new("debug", TypeUsage::of("String")).tag(MetadataTag::Ignore),
                    ),
            );

        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Shop"),
            &[],
            &[],
        )
        .unwrap();

        assert_eq!(graph.query().fields.len(), 1);
        let item = type_named(&graph, "Item").as_object().unwrap();
        assert_eq!(item.description.as_deref(), Some("Something for sale"));
        let names: Vec<&str> = item.fields.iter().map(|field| field.name.as_str()).collect();
        assert_eq!(names, vec!["sku", "price"]);
        assert!(item.fields[1].deprecation.is_deprecated());
        let directive_names: Vec<&str> =
            item.directives.iter().map(|directive| directive.name.as_str()).collect();
        assert_eq!(directive_names, vec!["key", "cacheControl"]);
        assert_eq!(item.directives[1].get_argument("maxAge"), Some(&GqlValue::from(60)));

        let definitions: Vec<String> = graph
            .directives()
            .iter()
            .map(|definition| {
                let arguments: Vec<String> = definition
                    .arguments
                    .iter()
                    .map(|argument| format!("{}: {}", argument.name, argument.ty))
                    .collect();
                format!("{}({})", definition.name, arguments.join(", "))
            })
            .collect();
        assert_eq!(definitions, vec!["key(fields: String!)", "cacheControl(maxAge: Int!)"]);
        assert_eq!(graph.directives()[0].locations, vec![DirectiveLocation::Object]);
    }

    #[test]
    fn mutation_and_subscription_roots_use_configured_names() {
        let introspector = widget_introspector().with_type(
            TypeDefinition::object("com.example.WidgetMutation").function(
                FunctionDef::new("saveWidget", TypeUsage::of("com.example.Widget"))
                    .parameter(ParameterDef::new("widget", TypeUsage::of("com.example.Widget"))),
            ),
        );
        let config = config().with_top_level_names(crate::config::TopLevelNames {
            query: "RootQuery".to_string(),
            ..Default::default()
        });

        let graph = generate_schema(
            &config,
            &introspector,
            &query("com.example.WidgetQuery"),
            &[TopLevelObject::new("com.example.WidgetMutation")],
            &[],
        )
        .unwrap();

        assert_eq!(graph.query().name, "RootQuery");
        let mutation = graph.mutation().unwrap();
        assert_eq!(mutation.name, "Mutation");
        assert_eq!(
            mutation.get_field("saveWidget").unwrap().arguments[0].ty.to_string(),
            "WidgetInput!"
        );
    }

    #[test]
    fn custom_scalars_are_registered_once() {
        let introspector = StaticIntrospector::new()
            .with_scalar("java.util.UUID", "UUID")
            .with_type(
                TypeDefinition::object("com.example.Query")
                    .function(FunctionDef::new("id", TypeUsage::of("java.util.UUID")))
                    .function(
                        FunctionDef::new("ids", TypeUsage::list(TypeUsage::of("java.util.UUID")))
                            .parameter(ParameterDef::new("seed", TypeUsage::of("java.util.UUID"))),
                    ),
            );

        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Query"),
            &[],
            &[],
        )
        .unwrap();

        assert_eq!(graph.types().len(), 1);
        assert!(matches!(type_named(&graph, "UUID"), NamedType::Scalar(_)));
    }

    struct MoneyHooks;

    impl SchemaGeneratorHooks for MoneyHooks {
        fn will_generate_graphql_type(&self, type_id: &TypeId) -> Option<NamedType> {
            match type_id.as_str() {
                "java.math.BigDecimal" => Some(NamedType::Scalar(ScalarType::new("Decimal"))),
                "com.example.Address" => Some(NamedType::Object(
                    ObjectType::new("PostalAddress")
                        .field(FieldDefinition::new("line", TypeRef::named("String"))),
                )),
                _ => None,
            }
        }

        fn is_valid_property(&self, _parent: &TypeId, property: &PropertyDef) -> bool {
            !property.name.starts_with('_')
        }

        fn will_resolve_monad(&self, usage: &TypeUsage) -> TypeUsage {
            if usage.type_id.as_str() == "Future" {
                usage.arguments[0].clone()
            } else {
                usage.clone()
            }
        }
    }

    #[test]
    fn hooks_customize_generation() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::object("com.example.Invoice")
                    .property(PropertyDef::new("total", TypeUsage::of("java.math.BigDecimal")))
                    .property(PropertyDef::new("_secret", TypeUsage::of("String"))),
            )
            .with_type(TypeDefinition::object("com.example.Query").function(FunctionDef::new(
                "invoice",
                TypeUsage::of("Future").argument(TypeUsage::of("com.example.Invoice")),
            )));
        let config = config().with_hooks(MoneyHooks);

        let graph = generate_schema(
            &config,
            &introspector,
            &query("com.example.Query"),
            &[],
            &[],
        )
        .unwrap();

        assert_eq!(graph.query().get_field("invoice").unwrap().ty.to_string(), "Invoice!");
        let invoice = type_named(&graph, "Invoice").as_object().unwrap();
        assert_eq!(invoice.fields.len(), 1);
        assert_eq!(invoice.fields[0].ty.to_string(), "Decimal!");
        assert!(matches!(type_named(&graph, "Decimal"), NamedType::Scalar(_)));

        let introspector = introspector.with_type(
            TypeDefinition::object("com.example.Shipping").function(
                FunctionDef::new("ship", TypeUsage::of("Boolean")).parameter(ParameterDef::new(
                    "to",
                    TypeUsage::of("com.example.Address"),
                )),
            ),
        );
        let err = generate_schema(
            &config,
            &introspector,
            &query("com.example.Shipping"),
            &[],
            &[],
        )
        .unwrap_err();
        match err {
            Error::InvalidInputType { type_id, reason } => {
                assert_eq!(type_id, TypeId::new("com.example.Address"));
                assert!(reason.contains("PostalAddress"));
            }
            other => panic!("expected invalid input type, got {other:?}"),
        }
    }

    #[test]
    fn input_suffix_is_not_duplicated() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::object("com.example.SearchInput")
                    .property(PropertyDef::new("term", TypeUsage::of("String"))),
            )
            .with_type(
                TypeDefinition::object("com.example.Query").function(
                    FunctionDef::new("search", TypeUsage::list(TypeUsage::of("String")))
                        .parameter(ParameterDef::new("input", TypeUsage::of("com.example.SearchInput"))),
                ),
            );

        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Query"),
            &[],
            &[],
        )
        .unwrap();
        assert!(graph.get_type("SearchInput").is_some());
        assert!(graph.get_type("SearchInputInput").is_none());
    }

    #[test]
    fn suffixed_type_used_as_input_and_output_conflicts() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::object("com.example.SearchInput")
                    .property(PropertyDef::new("term", TypeUsage::of("String"))),
            )
            .with_type(
                TypeDefinition::object("com.example.Query")
                    .function(
                        FunctionDef::new("search", TypeUsage::of("String").nullable()).parameter(
                            ParameterDef::new("input", TypeUsage::of("com.example.SearchInput")),
                        ),
                    )
                    .function(FunctionDef::new(
                        "lastSearch",
                        TypeUsage::of("com.example.SearchInput"),
                    )),
            );

        let err = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Query"),
            &[],
            &[],
        )
        .unwrap_err();

        match err {
            Error::ConflictingTypes {
                name,
                existing,
                new,
            } => {
                assert_eq!(name, "SearchInput");
                assert_eq!(existing, TypeKey::input(TypeId::new("com.example.SearchInput")));
                assert_eq!(new, TypeKey::output(TypeId::new("com.example.SearchInput")));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn types_named_like_a_root_conflict() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::object("com.example.model.Query")
                    .property(PropertyDef::new("text", TypeUsage::of("String"))),
            )
            .with_type(
                TypeDefinition::object("com.example.Root")
                    .function(FunctionDef::new("saved", TypeUsage::of("com.example.model.Query"))),
            );

        let err = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Root"),
            &[],
            &[],
        )
        .unwrap_err();

        match err {
            Error::ConflictingTypes { name, new, .. } => {
                assert_eq!(name, "Query");
                assert_eq!(new, TypeKey::output(TypeId::new("com.example.model.Query")));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn unused_root_names_stay_available() {
        let introspector = StaticIntrospector::new()
            .with_type(
                TypeDefinition::object("com.example.model.Mutation")
                    .property(PropertyDef::new("kind", TypeUsage::of("String"))),
            )
            .with_type(
                TypeDefinition::object("com.example.Root")
                    .function(FunctionDef::new("last", TypeUsage::of("com.example.model.Mutation"))),
            );

        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.Root"),
            &[],
            &[],
        )
        .unwrap();
        assert!(graph.get_type("Mutation").is_some());
        assert!(graph.mutation().is_none());
    }

    /// Serves descriptions and directives from its own tables instead of the
    /// metadata tags.
    struct AnnotatingIntrospector {
        inner: StaticIntrospector,
    }

    impl TypeIntrospector for AnnotatingIntrospector {
        fn kind(&self, ty: &TypeId) -> Result<TypeKind> {
            self.inner.kind(ty)
        }
        fn metadata(&self, ty: &TypeId) -> Result<Vec<MetadataTag>> {
            self.inner.metadata(ty)
        }
        fn declared_properties(&self, ty: &TypeId) -> Result<Vec<PropertyDef>> {
            self.inner.declared_properties(ty)
        }
        fn declared_functions(&self, ty: &TypeId) -> Result<Vec<FunctionDef>> {
            self.inner.declared_functions(ty)
        }
        fn supertypes(&self, ty: &TypeId) -> Result<Vec<TypeId>> {
            self.inner.supertypes(ty)
        }
        fn enum_constants(&self, ty: &TypeId) -> Result<Vec<EnumConstant>> {
            self.inner.enum_constants(ty)
        }
        fn concrete_subtypes(&self, root: &TypeId, within: &[String]) -> Result<Vec<TypeId>> {
            self.inner.concrete_subtypes(root, within)
        }
        fn is_list_like(&self, ty: &TypeId) -> bool {
            self.inner.is_list_like(ty)
        }
        fn scalar_name(&self, ty: &TypeId) -> Option<String> {
            self.inner.scalar_name(ty)
        }
        fn description(&self, ty: &TypeId) -> Result<Option<String>> {
            Ok(Some(format!("Generated from {ty}")))
        }
        fn declared_directives(&self, ty: &TypeId) -> Result<Vec<DirectiveTag>> {
            Ok(vec![DirectiveTag::new("source").argument("type", ty.as_str())])
        }
    }

    #[test]
    fn type_descriptions_and_directives_come_from_the_introspector() {
        let introspector = AnnotatingIntrospector {
            inner: widget_introspector(),
        };
        let graph = generate_schema(
            &config(),
            &introspector,
            &query("com.example.WidgetQuery"),
            &[],
            &[],
        )
        .unwrap();

        let widget = type_named(&graph, "Widget").as_object().unwrap();
        assert_eq!(
            widget.description.as_deref(),
            Some("Generated from com.example.Widget")
        );
        assert_eq!(widget.directives.len(), 1);
        assert_eq!(widget.directives[0].name, "source");
        assert!(graph
            .directives()
            .iter()
            .any(|definition| definition.name == "source"));
    }

    #[test]
    fn independent_runs_produce_identical_graphs() {
        let introspector = bakery().with_types(widget_introspector().definitions().to_vec());
        let roots = [
            TopLevelObject::new("com.example.Bakery"),
            TopLevelObject::new("com.example.WidgetQuery"),
        ];
        let config = config();

        let first = generate_schema(&config, &introspector, &roots, &[], &[]).unwrap();
        let second = generate_schema(&config, &introspector, &roots, &[], &[]).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
