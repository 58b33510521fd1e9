//! Built-in demo API used by `routeschema doc` and the integration tests.
//!
//! Covers every input location, nested anonymous records, sequences, the
//! three security scheme kinds and a documentation-only operation.

use crate::error::SchemaError;
use crate::registry::{OperationRecord, Registry, RegistryError};
use crate::schema::{Describe, FieldShape, RecordShape, TypeShape};
use crate::security::{ApiKeySecurity, BearerSecurity, SecurityScheme};
use crate::typed::handler;
use http::Method;
use serde::{Deserialize, Serialize};

pub const DEMO_API_KEY: &str = "demo-key";
pub const DEMO_TOKEN: &str = "demo-token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub price: f64,
    pub tags: Vec<String>,
}

impl Describe for Item {
    fn describe() -> TypeShape {
        RecordShape::named("Item")
            .field(FieldShape::of::<u64>("ID").json("id").validate("required"))
            .field(FieldShape::of::<String>("Name").validate("required"))
            .field(FieldShape::of::<f64>("Price").validate("min=0"))
            .field(FieldShape::of::<Vec<String>>("Tags"))
            .into()
    }
}

#[derive(Debug, Deserialize)]
pub struct IdParams {
    pub id: u64,
}

fn id_params() -> RecordShape {
    RecordShape::anonymous().field(
        FieldShape::of::<u64>("ID")
            .json("id")
            .tag("param", "id")
            .validate("required"),
    )
}

#[derive(Debug, Deserialize)]
pub struct GetItem {
    pub params: IdParams,
}

impl Describe for GetItem {
    fn describe() -> TypeShape {
        RecordShape::named("GetItem")
            .field(FieldShape::new("Params", id_params()))
            .into()
    }
}

#[derive(Debug, Deserialize)]
pub struct ListItems {
    pub query: ListQuery,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: u32,
    pub offset: u32,
    pub tag: Option<String>,
}

impl Describe for ListItems {
    fn describe() -> TypeShape {
        RecordShape::named("ListItems")
            .field(FieldShape::new(
                "Query",
                RecordShape::anonymous()
                    .field(
                        FieldShape::of::<u32>("Limit")
                            .default_value("10")
                            .validate("min=1,max=100"),
                    )
                    .field(FieldShape::of::<u32>("Offset").default_value("0"))
                    .field(FieldShape::of::<Option<String>>("Tag")),
            ))
            .into()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateItem {
    pub body: NewItem,
}

#[derive(Debug, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub dimensions: Option<Dimensions>,
}

#[derive(Debug, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Describe for CreateItem {
    fn describe() -> TypeShape {
        RecordShape::anonymous()
            .field(FieldShape::new(
                "Body",
                RecordShape::anonymous()
                    .field(FieldShape::of::<String>("Name").validate("required,min=1,max=64"))
                    .field(FieldShape::of::<f64>("Price").validate("required,min=0"))
                    .field(FieldShape::of::<Vec<String>>("Tags").validate("max=10"))
                    .field(FieldShape::new(
                        "Dimensions",
                        TypeShape::pointer(
                            RecordShape::anonymous()
                                .field(FieldShape::of::<f64>("Width"))
                                .field(FieldShape::of::<f64>("Height")),
                        ),
                    )),
            ))
            .into()
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchItems {
    pub q: String,
    pub sort: String,
}

impl Describe for SearchItems {
    fn describe() -> TypeShape {
        RecordShape::named("SearchItems")
            .field(FieldShape::of::<String>("Q").tag("query", "q").validate("required"))
            .field(
                FieldShape::of::<String>("Sort")
                    .default_value("name")
                    .validate("oneof=name price"),
            )
            .into()
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: u32,
    pub page: SearchPage,
    pub results: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub number: u32,
    pub size: u32,
}

impl Describe for SearchResponse {
    fn describe() -> TypeShape {
        RecordShape::named("SearchResponse")
            .field(FieldShape::of::<u32>("Total"))
            .field(FieldShape::new(
                "Page",
                RecordShape::anonymous()
                    .field(FieldShape::of::<u32>("Number").validate("min=1"))
                    .field(FieldShape::of::<u32>("Size")),
            ))
            .field(FieldShape::of::<Vec<Item>>("Results"))
            .into()
    }
}

#[derive(Debug, Deserialize)]
pub struct GetUser {
    pub params: IdParams,
}

impl Describe for GetUser {
    fn describe() -> TypeShape {
        RecordShape::named("GetUser")
            .field(FieldShape::new("Params", id_params()))
            .into()
    }
}

#[derive(Debug, Serialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    /// Credential method that authenticated the request
    pub auth: String,
}

impl Describe for User {
    fn describe() -> TypeShape {
        RecordShape::named("User")
            .field(FieldShape::of::<u64>("ID").json("id"))
            .field(FieldShape::of::<String>("Email").validate("required,email"))
            .field(FieldShape::of::<String>("Auth"))
            .into()
    }
}

fn sample_item(id: u64) -> Item {
    Item {
        id,
        name: format!("item-{}", id),
        price: 9.5,
        tags: vec!["demo".to_string()],
    }
}

pub fn api_key() -> SecurityScheme {
    SecurityScheme::single(
        ApiKeySecurity::header("ApiKeyAuth", "X-API-Key")
            .description("Static demo key")
            .validator(|_req, key| key == DEMO_API_KEY),
    )
}

pub fn bearer() -> SecurityScheme {
    SecurityScheme::single(
        BearerSecurity::new("BearerAuth")
            .bearer_format("JWT")
            .validator(|_req, token| token == DEMO_TOKEN),
    )
}

/// Build the demo registry.
pub fn registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    let either = SecurityScheme::multi("ApiKeyOrBearer", vec![api_key(), bearer()]);

    registry.get(
        "/items",
        handler(|_req, input: ListItems| {
            let start = u64::from(input.query.offset) + 1;
            let items: Vec<Item> = (start..start + u64::from(input.query.limit.min(3)))
                .map(sample_item)
                .filter(|item| match &input.query.tag {
                    Some(tag) => item.tags.contains(tag),
                    None => true,
                })
                .collect();
            Ok(items)
        }),
        &[],
    )?;
    registry.get(
        "/items/search",
        handler(|_req, input: SearchItems| {
            let results = vec![Item {
                name: input.q.clone(),
                ..sample_item(1)
            }];
            Ok(SearchResponse {
                total: 1,
                page: SearchPage { number: 1, size: 20 },
                results,
            })
        }),
        &[],
    )?;
    registry.get(
        "/items/:id",
        handler(|_req, input: GetItem| {
            if input.params.id == 0 {
                return Err(SchemaError::new("ERR_ITEM_NOT_FOUND", "Item not found").into());
            }
            Ok(sample_item(input.params.id))
        }),
        &[],
    )?;

    {
        let mut admin = registry.group("/admin", &[bearer()]);
        admin.post(
            "/items",
            handler(|_req, input: CreateItem| {
                Ok(Item {
                    id: 100,
                    name: input.body.name,
                    price: input.body.price,
                    tags: input.body.tags,
                })
            }),
            &[],
        )?;
    }

    registry.get(
        "/users/:id",
        handler(|req, input: GetUser| {
            Ok(User {
                id: input.params.id,
                email: format!("user{}@example.com", input.params.id),
                auth: req
                    .credential()
                    .map(|c| c.method.clone())
                    .unwrap_or_default(),
            })
        }),
        &[either],
    )?;

    registry.register(
        OperationRecord::described(Method::DELETE, "/items/:id", GetItem::describe(), None)
            .with_security(&[api_key()]),
    )?;

    Ok(registry)
}
