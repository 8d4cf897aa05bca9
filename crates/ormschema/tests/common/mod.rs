//! Shared model fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use ormschema::prelude::*;
use ormschema::Getter;
use serde_json::json;

pub struct Fixture {
    pub user: ModelRef,
    pub article: ModelRef,
    pub number: ModelRef,
    pub company: ModelRef,
    pub employee: ModelRef,
    pub engineer: ModelRef,
    pub inspector: Inspector,
}

impl Fixture {
    pub fn registry(&self) -> &Registry {
        self.inspector.registry()
    }
}

fn documented_getter() -> Getter {
    Arc::new(|obj: &dyn Instance| obj.get("documented"))
}

/// A model with every kind of attribute.
pub fn user_model() -> ModelRef {
    let documented = documented_getter();
    let property_documented = LoadsAttributes::checked(
        "property_documented",
        ["documented"],
        &documented,
    )
    .unwrap()
    .apply(PropertyAttr {
        getter: Some(documented),
        doc: Some("Documented property".to_string()),
        ..PropertyAttr::default()
    });

    ModelClass::builder("User")
        .table("users")
        .doc("Model comment")
        .column("_ignored", ColumnAttr::new(SqlType::Text))
        .column("annotated_int", ColumnAttr::new(SqlType::Integer).primary_key())
        .column("int", ColumnAttr::new(SqlType::Integer))
        .column("enum", ColumnAttr::new(SqlType::Enum("EnumType".to_string())))
        .column("optional", ColumnAttr::new(SqlType::Text).nullable(true))
        .column("required", ColumnAttr::new(SqlType::Text).nullable(false))
        .column(
            "default",
            ColumnAttr::new(SqlType::Text).nullable(false).default("value"),
        )
        .column(
            "documented",
            ColumnAttr::new(SqlType::Text).doc("Some descriptive text"),
        )
        .column("json_attr", ColumnAttr::new(SqlType::Json))
        .property(
            "property_without_type",
            PropertyAttr::getter(|_| Ok(AttrValue::null())),
        )
        .property(
            "property_typed",
            PropertyAttr::getter(|_| Ok(json!("b").into())).returns(TypeRef::Str),
        )
        .property("property_documented", property_documented)
        .property(
            "property_nullable",
            PropertyAttr::getter(|_| Ok(json!("o").into())).returns(TypeRef::Str.optional()),
        )
        .property(
            "property_writable",
            PropertyAttr::getter(|_| Ok(json!("a").into()))
                .returns(TypeRef::Str)
                .with_setter_default("default"),
        )
        .hybrid_property(
            "hybrid_property_typed",
            PropertyAttr::getter(|_| Ok(json!("c").into())).returns(TypeRef::Str),
        )
        .hybrid_property(
            "hybrid_property_writable",
            PropertyAttr::getter(|_| Ok(AttrValue::null()))
                .returns(TypeRef::Str)
                .with_setter_default("default"),
        )
        .hybrid_method("hybrid_method_attr", MethodAttr::new())
        .expression(
            "expression",
            ExpressionAttr::new(SqlType::Integer).sql("int + annotated_int"),
        )
        .composite("point", CompositeAttr::new("Point", ["int", "annotated_int"]))
        .relationship(
            "articles_list",
            RelationshipAttr::one_to_many("Article").back_populates("user"),
        )
        .relationship(
            "articles_set",
            RelationshipAttr::one_to_many("Article")
                .collection_class(CollectionClass::Set)
                .viewonly(),
        )
        .relationship(
            "articles_dict_attr",
            RelationshipAttr::one_to_many("Article").collection_class(CollectionClass::Dict),
        )
        .relationship(
            "articles_dict_keyfun",
            RelationshipAttr::one_to_many("Article").collection_class(CollectionClass::custom(
                "mapped_collection",
                || Ok(json!({})),
            )),
        )
        .relationship(
            "articles_bag",
            RelationshipAttr::one_to_many("Article").collection_class(CollectionClass::custom(
                "needs_arguments",
                || Err("missing keyfunc".into()),
            )),
        )
        .association_proxy("article_titles", ProxyAttr::new("articles_list", "title"))
        .association_proxy("article_authors", ProxyAttr::new("articles_list", "user"))
        .relationship(
            "articles_q",
            RelationshipAttr::one_to_many("Article").dynamic(),
        )
        .build()
}

pub fn article_model() -> ModelRef {
    ModelClass::builder("Article")
        .table("articles")
        .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
        .column(
            "user_id",
            ColumnAttr::new(SqlType::Integer).foreign_key("users.annotated_int"),
        )
        .column("title", ColumnAttr::new(SqlType::Text))
        .relationship(
            "user",
            RelationshipAttr::many_to_one("User").back_populates("articles_list"),
        )
        .build()
}

/// Required and default fields in every combination.
pub fn number_model() -> ModelRef {
    let int = || ColumnAttr::new(SqlType::Integer);
    ModelClass::builder("Number")
        .table("numbers")
        .column("id", int().primary_key())
        .column("n", int().nullable(true))
        .column("nd1", int().nullable(true).default(100))
        .column("nd2", int().nullable(true).default_callable(|| json!(100)))
        .column("nd3", int().nullable(true).server_default("SELECT 1"))
        .column("d1", int().nullable(false).default(100))
        .column("d2", int().nullable(false).default_callable(|| json!(100)))
        .column("d3", int().nullable(false).server_default("SELECT 1"))
        .build()
}

/// Joined-table inheritance: Company has Employees, an Engineer is an Employee.
pub fn company_models() -> (ModelRef, ModelRef, ModelRef) {
    let company = ModelClass::builder("Company")
        .table("jti_company")
        .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
        .column("name", ColumnAttr::new(SqlType::VarChar(50)))
        .relationship(
            "employees",
            RelationshipAttr::one_to_many("Employee").back_populates("company"),
        )
        .build();
    let employee = ModelClass::builder("Employee")
        .table("jti_employee")
        .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
        .column("name", ColumnAttr::new(SqlType::VarChar(50)))
        .column("type", ColumnAttr::new(SqlType::VarChar(50)))
        .column(
            "company_id",
            ColumnAttr::new(SqlType::Integer).foreign_key("jti_company.id"),
        )
        .relationship(
            "company",
            RelationshipAttr::many_to_one("Company").back_populates("employees"),
        )
        .build();
    let engineer = ModelClass::builder("Engineer")
        .table("jti_engineer")
        .parent(&employee)
        .column(
            "id",
            ColumnAttr::new(SqlType::Integer)
                .primary_key()
                .foreign_key("jti_employee.id"),
        )
        .column("engineer_name", ColumnAttr::new(SqlType::VarChar(30)))
        .build();
    (company, employee, engineer)
}

pub fn fixture() -> Fixture {
    let user = user_model();
    let article = article_model();
    let number = number_model();
    let (company, employee, engineer) = company_models();

    let registry = Registry::new()
        .with(&user)
        .with(&article)
        .with(&number)
        .with(&company)
        .with(&employee)
        .with(&engineer);

    Fixture {
        user,
        article,
        number,
        company,
        employee,
        engineer,
        inspector: Inspector::new(registry),
    }
}

/// A user with two articles, both pointing back at it.
///
/// Only `annotated_int`, `int` and `articles_list` are loaded on the user.
pub fn user_with_articles(fx: &Fixture) -> (InstanceRef, Vec<InstanceRef>) {
    let user = std::rc::Rc::new(
        DynamicInstance::new(&fx.user)
            .with("annotated_int", json!(1))
            .with("int", json!(42)),
    );
    let user_ref: InstanceRef = user.clone();

    let articles: Vec<InstanceRef> = [(10, "First"), (11, "Second")]
        .into_iter()
        .map(|(id, title)| {
            let article = DynamicInstance::new(&fx.article)
                .with("id", json!(id))
                .with("user_id", json!(1))
                .with("title", json!(title))
                .with("user", user_ref.clone());
            article.into_ref()
        })
        .collect();

    user.set("articles_list", AttrValue::collection(articles.clone()));
    (user_ref, articles)
}

/// A loader that serves `value` for `name` and nulls for everything else.
pub fn loader_serving(
    name: &'static str,
    value: serde_json::Value,
) -> impl Fn(&DynamicInstance, &str) -> Result<AttrValue> + 'static {
    move |_, attr| {
        if attr == name {
            Ok(value.clone().into())
        } else {
            Ok(AttrValue::null())
        }
    }
}
