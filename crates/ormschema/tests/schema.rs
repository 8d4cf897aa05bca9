mod common;

use ormschema::prelude::*;
use ormschema::{DefaultFactory, FieldDefault, model_fields};
use serde_json::json;

use common::{fixture, user_with_articles};

#[test]
fn input_schema_keeps_writable_public_fields() {
    let fx = fixture();
    let config = SchemaConfig::new()
        .kinds(AttributeKind::ALL_LOCAL_FIELDS)
        .only_writable()
        .naming("{model}Input")
        .unwrap();
    let fields = model_fields(&fx.inspector, &fx.user, &config).unwrap();

    assert_eq!(
        fields.keys().map(String::as_str).collect::<Vec<_>>(),
        vec![
            "annotated_int",
            "int",
            "enum",
            "optional",
            "required",
            "default",
            "documented",
            "json_attr",
            "property_writable",
            "hybrid_property_writable",
            "point",
        ]
    );
    assert_eq!(fields["documented"].title.as_deref(), Some("Some descriptive text"));
    assert_eq!(
        fields["property_writable"].default,
        FieldDefault::Value(json!("default"))
    );
    assert_eq!(fields["point"].ty, TypeRef::ForwardRef("Point".to_string()));
}

#[test]
fn output_schema_keeps_readable_fields() {
    let fx = fixture();
    let config = SchemaConfig::new()
        .kinds(AttributeKind::ALL_PROPERTIES)
        .only_readable();
    let fields = model_fields(&fx.inspector, &fx.user, &config).unwrap();
    assert_eq!(fields.len(), 7);
    assert_eq!(fields["property_nullable"].ty, TypeRef::Str.optional());
    assert_eq!(fields["property_without_type"].ty, TypeRef::Any);
    assert_eq!(
        fields["property_documented"].title.as_deref(),
        Some("Documented property")
    );
}

#[test]
fn namespace_resolves_relationships_through_the_naming_pattern() {
    let fx = fixture();
    let config = SchemaConfig::new()
        .kinds(AttributeKind::COLUMN | AttributeKind::ALL_RELATIONSHIPS)
        .naming("{model}Db")
        .unwrap();
    let mut models = Models::new(&fx.inspector, config);
    models.add(&fx.user).unwrap();
    models.add(&fx.article).unwrap();
    models.resolve_forward_refs().unwrap();

    let user = models.get("UserDb").unwrap();
    assert_eq!(user.doc.as_deref(), Some("Model comment"));
    let forward = |name: &str| TypeRef::ForwardRef(name.to_string());
    assert_eq!(user.fields["articles_list"].ty, TypeRef::list(forward("ArticleDb")));
    assert_eq!(
        user.fields["articles_list"].default,
        FieldDefault::Factory(DefaultFactory::List)
    );
    assert_eq!(
        user.fields["articles_dict_attr"].ty,
        TypeRef::dict(TypeRef::Any, forward("ArticleDb"))
    );
    assert_eq!(
        user.fields["article_titles"].ty,
        TypeRef::dict(TypeRef::Str, forward("ArticleDb"))
    );
    assert_eq!(
        user.fields["article_authors"].ty,
        TypeRef::dict(forward("UserDb"), forward("ArticleDb"))
    );
    assert!(!user.fields.contains_key("_ignored"));
    assert!(!user.fields.contains_key("articles_q"));

    let article = models.get("ArticleDb").unwrap();
    assert_eq!(article.fields["user"].ty, forward("UserDb").optional());
    assert_eq!(article.required(), vec!["id"]);

    let schema = models.json_schema();
    assert_eq!(
        schema["definitions"]["ArticleDb"]["properties"]["user"]["anyOf"][0],
        json!({"$ref": "#/definitions/UserDb"})
    );
    assert_eq!(
        schema["definitions"]["UserDb"]["required"],
        json!(["annotated_int", "required", "articles_bag"])
    );
    assert_eq!(
        schema["definitions"]["UserDb"]["properties"]["articles_list"]["default"],
        json!([])
    );
}

#[test]
fn subclass_schema_points_at_its_parent() {
    let fx = fixture();
    let config = SchemaConfig::new()
        .kinds(AttributeKind::COLUMN | AttributeKind::RELATIONSHIP)
        .naming("{model}Out")
        .unwrap();
    let mut models = Models::new(&fx.inspector, config);
    models.add(&fx.engineer).unwrap();

    let engineer = models.get("EngineerOut").unwrap();
    assert_eq!(engineer.parent.as_deref(), Some("EmployeeOut"));
    assert!(matches!(
        models.resolve_forward_refs(),
        Err(Error::UnresolvedForwardRef { ref reference, .. }) if reference == "CompanyOut"
    ));

    models.add(&fx.company).unwrap();
    assert!(matches!(
        models.resolve_forward_refs(),
        Err(Error::UnresolvedForwardRef { ref reference, .. }) if reference == "EmployeeOut"
    ));

    models.add(&fx.employee).unwrap();
    models.resolve_forward_refs().unwrap();
}

#[test]
fn dump_all_loads_what_it_needs() {
    let fx = fixture();
    let config = SchemaConfig::new()
        .kinds(AttributeKind::COLUMN | AttributeKind::RELATIONSHIP)
        .exclude([
            "enum",
            "optional",
            "required",
            "default",
            "documented",
            "json_attr",
            "articles_set",
            "articles_dict_attr",
            "articles_dict_keyfun",
            "articles_bag",
        ]);
    let mut models = Models::new(&fx.inspector, config);
    models.add(&fx.user).unwrap();
    models.add(&fx.article).unwrap();

    let (user, _) = user_with_articles(&fx);
    let out = models.dump(user.as_ref(), DumpMode::All).unwrap();
    assert_eq!(
        out,
        json!({
            "annotated_int": 1,
            "int": 42,
            "articles_list": [
                {"id": 10, "user_id": 1, "title": "First", "user": null},
                {"id": 11, "user_id": 1, "title": "Second", "user": null},
            ],
        })
    );
}

#[test]
fn dump_loaded_only_never_loads() {
    let fx = fixture();
    let config = SchemaConfig::new()
        .kinds(AttributeKind::ALL_LOCAL_FIELDS)
        .exclude(Filter::names(["point", "expression"]));
    let mut models = Models::new(&fx.inspector, config);
    models.add(&fx.user).unwrap();

    let user = DynamicInstance::new(&fx.user)
        .with("annotated_int", json!(1))
        .with("documented", json!("Hello"));
    let out = models.dump(&user, DumpMode::LoadedOnly).unwrap();

    assert!(user.fetch_log().is_empty());
    assert_eq!(out["annotated_int"], 1);
    assert_eq!(out["int"], json!(null));
    // declares what it reads, and that is loaded
    assert_eq!(out["property_documented"], "Hello");
    // no declaration: not evaluated
    assert_eq!(out["property_typed"], json!(null));

    user.expire("documented");
    let out = models.dump(&user, DumpMode::LoadedOnly).unwrap();
    assert_eq!(out["property_documented"], json!(null));
    assert!(user.fetch_log().is_empty());

    let out = models.dump(&user, DumpMode::All).unwrap();
    assert_eq!(out["property_typed"], "b");
    assert!(!user.fetch_log().is_empty());
}

#[test]
fn dump_needs_the_related_schema() {
    let fx = fixture();
    let config = SchemaConfig::new().kinds(AttributeKind::COLUMN | AttributeKind::RELATIONSHIP);
    let mut models = Models::new(&fx.inspector, config);
    models.add(&fx.article).unwrap();

    let (_, articles) = user_with_articles(&fx);
    assert!(matches!(
        models.dump(articles[0].as_ref(), DumpMode::LoadedOnly),
        Err(Error::UnknownModel { ref model }) if model == "User"
    ));
}
