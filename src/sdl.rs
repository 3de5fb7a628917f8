//! SDL printing for generated type graphs.

use crate::types::{
    Deprecation, DirectiveApplication, DirectiveDefinition, FieldDefinition, InputValueDefinition,
    NamedType, ObjectType, TypeGraph,
};
use async_graphql::Value as GqlValue;
use std::fmt::Write;

/// Print `graph` in GraphQL schema definition language.
///
/// Directive definitions come first, then the root types and the named types
/// in graph order. A `schema` block is emitted only when the root types do not
/// use the default names.
pub fn print_schema(graph: &TypeGraph) -> String {
    print_schema_excluding(graph, &[])
}

/// Like [`print_schema`], leaving out the definitions of the named directives.
pub(crate) fn print_schema_excluding(graph: &TypeGraph, excluded_directives: &[&str]) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if let Some(schema) = schema_block(graph) {
        blocks.push(schema);
    }
    blocks.extend(
        graph
            .directives()
            .iter()
            .filter(|definition| !excluded_directives.contains(&definition.name.as_str()))
            .map(directive_definition),
    );
    blocks.extend(graph.roots().map(|(_, root)| object("type", root)));
    blocks.extend(graph.types().iter().map(|ty| named_type(ty)));

    let mut sdl = blocks.join("\n\n");
    sdl.push('\n');
    sdl
}

impl TypeGraph {
    /// Schema definition language for this graph. See [`print_schema`].
    pub fn sdl(&self) -> String {
        print_schema(self)
    }
}

fn schema_block(graph: &TypeGraph) -> Option<String> {
    let defaults = graph.query().name == "Query"
        && graph.mutation().map_or(true, |root| root.name == "Mutation")
        && graph
            .subscription()
            .map_or(true, |root| root.name == "Subscription");
    if defaults {
        return None;
    }

    let mut out = String::from("schema {\n");
    for (schema_type, root) in graph.roots() {
        let operation = format!("{schema_type:?}").to_lowercase();
        let _ = writeln!(out, "  {operation}: {}", root.name);
    }
    out.push('}');
    Some(out)
}

fn named_type(ty: &NamedType) -> String {
    match ty {
        NamedType::Object(ty) => object("type", ty),
        NamedType::Interface(ty) => {
            let mut out = description(ty.description.as_deref(), "");
            let _ = write!(out, "interface {}", ty.name);
            out.push_str(&implements(&ty.interfaces));
            out.push_str(&directives(&ty.directives));
            out.push_str(&fields(&ty.fields));
            out
        }
        NamedType::Union(ty) => {
            let mut out = description(ty.description.as_deref(), "");
            let _ = write!(out, "union {}{}", ty.name, directives(&ty.directives));
            if !ty.members.is_empty() {
                let _ = write!(out, " = {}", ty.members.join(" | "));
            }
            out
        }
        NamedType::Enum(ty) => {
            let mut out = description(ty.description.as_deref(), "");
            let _ = write!(out, "enum {}{}", ty.name, directives(&ty.directives));
            if !ty.values.is_empty() {
                out.push_str(" {\n");
                for value in &ty.values {
                    out.push_str(&description(value.description.as_deref(), "  "));
                    let _ = writeln!(
                        out,
                        "  {}{}{}",
                        value.name,
                        deprecated(&value.deprecation),
                        directives(&value.directives)
                    );
                }
                out.push('}');
            }
            out
        }
        NamedType::Scalar(ty) => {
            let mut out = description(ty.description.as_deref(), "");
            let _ = write!(out, "scalar {}{}", ty.name, directives(&ty.directives));
            out
        }
        NamedType::InputObject(ty) => {
            let mut out = description(ty.description.as_deref(), "");
            let _ = write!(out, "input {}{}", ty.name, directives(&ty.directives));
            if !ty.fields.is_empty() {
                out.push_str(" {\n");
                for field in &ty.fields {
                    out.push_str(&description(field.description.as_deref(), "  "));
                    let _ = writeln!(out, "  {}", input_value(field));
                }
                out.push('}');
            }
            out
        }
    }
}

fn object(keyword: &str, ty: &ObjectType) -> String {
    let mut out = description(ty.description.as_deref(), "");
    let _ = write!(out, "{keyword} {}", ty.name);
    out.push_str(&implements(&ty.interfaces));
    out.push_str(&directives(&ty.directives));
    out.push_str(&fields(&ty.fields));
    out
}

fn implements(interfaces: &[String]) -> String {
    if interfaces.is_empty() {
        String::new()
    } else {
        format!(" implements {}", interfaces.join(" & "))
    }
}

fn fields(fields: &[FieldDefinition]) -> String {
    if fields.is_empty() {
        return String::new();
    }
    let mut out = String::from(" {\n");
    for field in fields {
        out.push_str(&description(field.description.as_deref(), "  "));
        let _ = writeln!(
            out,
            "  {}{}: {}{}{}",
            field.name,
            arguments(&field.arguments),
            field.ty,
            deprecated(&field.deprecation),
            directives(&field.directives)
        );
    }
    out.push('}');
    out
}

fn arguments(arguments: &[InputValueDefinition]) -> String {
    if arguments.is_empty() {
        return String::new();
    }
    let arguments: Vec<String> = arguments.iter().map(input_value).collect();
    format!("({})", arguments.join(", "))
}

fn input_value(value: &InputValueDefinition) -> String {
    let description = value
        .description
        .as_ref()
        .map(|description| format!("{} ", GqlValue::String(description.clone())))
        .unwrap_or_default();
    format!(
        "{description}{}: {}{}",
        value.name,
        value.ty,
        directives(&value.directives)
    )
}

fn deprecated(deprecation: &Deprecation) -> String {
    match deprecation.reason() {
        Some(reason) => format!(
            " @deprecated(reason: {})",
            GqlValue::String(reason.to_string())
        ),
        None => String::new(),
    }
}

fn directives(applications: &[DirectiveApplication]) -> String {
    let mut out = String::new();
    for application in applications {
        let _ = write!(out, " @{}", application.name);
        if !application.arguments.is_empty() {
            let arguments: Vec<String> = application
                .arguments
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect();
            let _ = write!(out, "({})", arguments.join(", "));
        }
    }
    out
}

fn directive_definition(definition: &DirectiveDefinition) -> String {
    let mut out = description(definition.description.as_deref(), "");
    let _ = write!(
        out,
        "directive @{}{}",
        definition.name,
        arguments(&definition.arguments)
    );
    if definition.repeatable {
        out.push_str(" repeatable");
    }
    let locations: Vec<&str> = definition
        .locations
        .iter()
        .map(|location| location.as_sdl())
        .collect();
    let _ = write!(out, " on {}", locations.join(" | "));
    out
}

/// Block string description followed by a newline, or nothing.
fn description(description: Option<&str>, indent: &str) -> String {
    match description {
        Some(text) => {
            let mut out = format!("{indent}\"\"\"\n");
            for line in text.replace("\"\"\"", "\\\"\"\"").lines() {
                let _ = writeln!(out, "{indent}{line}");
            }
            let _ = writeln!(out, "{indent}\"\"\"");
            out
        }
        None => String::new(),
    }
}
