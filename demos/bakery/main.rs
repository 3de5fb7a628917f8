use anyhow::Result;
use async_graphql::Value as GqlValue;
use graphql_schema_generator::{
    generate_federated_schema, DynamicSchema, EnumConstant, FunctionDef, MetadataTag,
    ParameterDef, PropertyDef, SchemaGeneratorConfig, StaticIntrospector, TopLevelObject,
    TypeDefinition, TypeUsage,
};
use serde_json::json;
use tracing::info;

const PACKAGE: &str = "com.bakery";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let introspector = bakery_model();
    let config = SchemaGeneratorConfig::new([PACKAGE]);
    let graph = generate_federated_schema(
        &config,
        &introspector,
        &[TopLevelObject::new("com.bakery.BakeryQuery")],
        &[TopLevelObject::new("com.bakery.BakeryMutation")],
        &[],
    )?;

    info!(types = graph.types().len(), "generated bakery schema");
    println!("{}", graph.sdl());

    let root = GqlValue::from_json(json!({
        "cakes": [
            { "__typename": "StrawBerryCake", "id": "1", "berries": 12, "frosting": "VANILLA" },
            { "__typename": "ChocolateCake", "id": "2", "cocoa": 0.7 }
        ],
        "baker": { "id": "b1", "name": "Ada", "favorite": null }
    }))?;
    let schema = DynamicSchema::build_with_root(&graph, root)?;

    let response = schema
        .execute(
            r#"{
                cakes {
                    __typename
                    ... on StrawBerryCake { id berries frosting }
                    ... on ChocolateCake { id cocoa }
                }
                baker { name }
                _entities(representations: [{ __typename: "Baker", id: "b1" }]) {
                    ... on Baker { id }
                }
            }"#,
        )
        .await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

/// Cakes form a union; bakers are an entity owned by another service and
/// referenced through a cycle (`Baker.favorite -> Cake -> StrawBerryCake.baker`).
fn bakery_model() -> StaticIntrospector {
    StaticIntrospector::new()
        .with_type(
            TypeDefinition::enumeration("com.bakery.Frosting")
                .constant(EnumConstant::new("VANILLA"))
                .constant(EnumConstant::new("CHOCOLATE"))
                .constant(
                    EnumConstant::new("BUTTERCREAM").tag(MetadataTag::deprecated("sold out")),
                ),
        )
        .with_type(
            TypeDefinition::union("com.bakery.Cake")
                .tag(MetadataTag::description("Anything that comes out of the oven")),
        )
        .with_type(
            TypeDefinition::object("com.bakery.StrawBerryCake")
                .supertype("com.bakery.Cake")
                .property(PropertyDef::new("id", TypeUsage::of("ID")))
                .property(PropertyDef::new("berries", TypeUsage::of("Int")))
                .property(PropertyDef::new(
                    "frosting",
                    TypeUsage::of("com.bakery.Frosting").nullable(),
                ))
                .property(PropertyDef::new("baker", TypeUsage::of("com.bakery.Baker").nullable())),
        )
        .with_type(
            TypeDefinition::object("com.bakery.ChocolateCake")
                .supertype("com.bakery.Cake")
                .property(PropertyDef::new("id", TypeUsage::of("ID")))
                .property(PropertyDef::new("cocoa", TypeUsage::of("Float"))),
        )
        .with_type(
            TypeDefinition::object("com.bakery.Baker")
                .tag(MetadataTag::extends())
                .tag(MetadataTag::key("id"))
                .property(PropertyDef::new("id", TypeUsage::of("ID")).tag(MetadataTag::external()))
                .property(PropertyDef::new("name", TypeUsage::of("String")).tag(MetadataTag::external()))
                .property(PropertyDef::new(
                    "favorite",
                    TypeUsage::of("com.bakery.Cake").nullable(),
                )),
        )
        .with_type(
            TypeDefinition::object("com.bakery.Order")
                .property(PropertyDef::new("cake", TypeUsage::of("com.bakery.Cake")))
                .property(PropertyDef::new("quantity", TypeUsage::of("Int"))),
        )
        .with_type(
            TypeDefinition::object("com.bakery.BakeryQuery")
                .function(FunctionDef::new(
                    "cakes",
                    TypeUsage::list(TypeUsage::of("com.bakery.Cake")),
                ))
                .function(
                    FunctionDef::new("baker", TypeUsage::of("com.bakery.Baker"))
                        .tag(MetadataTag::provides("name")),
                ),
        )
        .with_type(
            TypeDefinition::object("com.bakery.BakeryMutation").function(
                FunctionDef::new("placeOrder", TypeUsage::of("com.bakery.Order").nullable())
                    .parameter(ParameterDef::new(
                        "frosting",
                        TypeUsage::of("com.bakery.Frosting"),
                    ))
                    .parameter(ParameterDef::new("quantity", TypeUsage::of("Int"))),
            ),
        )
}
