mod common;

use std::collections::BTreeSet;

use ormschema::prelude::*;

use common::{Fixture, fixture};

const USER_PK: &[&str] = &["annotated_int"];
const USER_COLUMNS: &[&str] = &[
    "_ignored",
    "annotated_int",
    "int",
    "enum",
    "optional",
    "required",
    "default",
    "documented",
    "json_attr",
];
const USER_PROPS: &[&str] = &[
    "property_without_type",
    "property_typed",
    "property_documented",
    "property_nullable",
    "property_writable",
];
const USER_HYBRIDS: &[&str] = &[
    "hybrid_property_typed",
    "hybrid_property_writable",
    "hybrid_method_attr",
];
const USER_OTHER: &[&str] = &["expression", "point"];
const USER_RELS: &[&str] = &[
    "articles_list",
    "articles_set",
    "articles_dict_attr",
    "articles_dict_keyfun",
    "articles_bag",
    "article_titles",
    "article_authors",
    "articles_q",
];

fn set(groups: &[&[&str]]) -> BTreeSet<String> {
    groups
        .iter()
        .flat_map(|group| group.iter().map(|name| (*name).to_string()))
        .collect()
}

fn all_fields() -> BTreeSet<String> {
    set(&[USER_COLUMNS, USER_PROPS, USER_HYBRIDS, USER_OTHER, USER_RELS])
}

/// Names left on User after excluding with `filter`.
fn remaining(fx: &Fixture, filter: &Filter) -> BTreeSet<String> {
    fx.inspector
        .info(&fx.user, AttributeKind::ALL, filter)
        .unwrap()
        .into_keys()
        .collect()
}

fn minus(a: &BTreeSet<String>, b: &BTreeSet<String>) -> BTreeSet<String> {
    a.difference(b).cloned().collect()
}

#[test]
fn exclude_nothing_keeps_everything() {
    let fx = fixture();
    assert_eq!(remaining(&fx, &Filter::Never), all_fields());
    assert!(remaining(&fx, &Filter::Always).is_empty());
}

#[test]
fn primary_key_filters() {
    let fx = fixture();
    assert_eq!(
        remaining(&fx, &Filter::PrimaryKey),
        minus(&all_fields(), &set(&[USER_PK]))
    );
    assert_eq!(remaining(&fx, &Filter::NotPrimaryKey), set(&[USER_PK]));
    assert_eq!(
        remaining(&fx, &Filter::not(Filter::PrimaryKey)),
        set(&[USER_PK])
    );
}

#[test]
fn flag_filters() {
    let fx = fixture();
    assert!(remaining(&fx, &Filter::Readable).is_empty());

    assert_eq!(
        remaining(&fx, &Filter::Writable),
        set(&[&[
            "property_without_type",
            "property_typed",
            "property_documented",
            "property_nullable",
            "hybrid_property_typed",
            "hybrid_method_attr",
            "expression",
            "articles_set",
            "article_titles",
            "article_authors",
        ]])
    );

    assert_eq!(
        remaining(&fx, &Filter::Nullable),
        set(&[
            &[
                "annotated_int",
                "required",
                "default",
                "property_typed",
                "property_writable",
                "hybrid_property_typed",
                "hybrid_property_writable",
                "point",
            ],
            USER_RELS,
        ])
    );
}

#[test]
fn kind_filters() {
    let fx = fixture();
    assert_eq!(
        remaining(&fx, &Filter::by_kind(AttributeKind::COLUMN)),
        minus(&all_fields(), &set(&[USER_COLUMNS]))
    );
    assert_eq!(
        remaining(
            &fx,
            &Filter::by_kind_where(AttributeKind::COLUMN, Filter::names(["int", "point"]))
        ),
        minus(&all_fields(), &set(&[&["int"]]))
    );
}

#[test]
fn name_identity_and_predicate_filters() {
    let fx = fixture();
    assert_eq!(remaining(&fx, &!Filter::names(["int"])), set(&[&["int"]]));
    assert_eq!(
        remaining(&fx, &Filter::from(["int", "enum"])),
        minus(&all_fields(), &set(&[&["int", "enum"]]))
    );

    let handle = fx.user.attribute("int").unwrap();
    assert_eq!(
        remaining(&fx, &Filter::attributes([handle])),
        minus(&all_fields(), &set(&[&["int"]]))
    );

    assert_eq!(
        remaining(&fx, &Filter::predicate(|name| name.starts_with('_'))),
        minus(&all_fields(), &set(&[&["_ignored"]]))
    );
    assert_eq!(
        remaining(
            &fx,
            &Filter::attr_predicate(|_, attr| attr.as_relationship().is_some())
        ),
        minus(
            &all_fields(),
            &set(&[&[
                "articles_list",
                "articles_set",
                "articles_dict_attr",
                "articles_dict_keyfun",
                "articles_bag",
                "articles_q",
            ]])
        )
    );
}

#[test]
fn combinators() {
    let fx = fixture();
    let either = Filter::either([
        Filter::PrimaryKey,
        Filter::by_kind(AttributeKind::ALL_RELATIONSHIPS | AttributeKind::DYNAMIC_LOADER),
    ]);
    assert_eq!(
        remaining(&fx, &either),
        minus(&minus(&all_fields(), &set(&[USER_PK])), &set(&[USER_RELS]))
    );

    let both = Filter::and([Filter::Nullable, Filter::by_kind(AttributeKind::COLUMN)]);
    assert_eq!(
        remaining(&fx, &both),
        minus(
            &all_fields(),
            &set(&[&["_ignored", "int", "enum", "optional", "documented", "json_attr"]])
        )
    );

    // empty combinators: EITHER() matches nothing, AND() matches everything
    assert_eq!(remaining(&fx, &Filter::either([])), all_fields());
    assert!(remaining(&fx, &Filter::and([])).is_empty());
    // double negation
    assert_eq!(
        remaining(&fx, &!!Filter::names(["int"])),
        remaining(&fx, &Filter::names(["int"]))
    );
}

#[test]
fn bound_filters_list_their_matches() {
    let fx = fixture();
    let bound = Filter::PrimaryKey.bind(&fx.inspector, &fx.article).unwrap();
    assert!(bound.matches("id"));
    assert!(!bound.matches("title"));
    assert_eq!(bound.matching_names(), vec!["id"]);
}
