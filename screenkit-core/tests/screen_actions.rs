//! Integration tests for action lists run against a context

mod common;

use common::FakeDelegator;
use parking_lot::Mutex;
use screenkit_core::service::{LocalDispatcher, ServiceDefinition};
use screenkit_core::{
    ActionEnv, ActionError, ActionList, Context, DefinitionError, Element, EntityValue,
    MemoryPropertySource, MemoryStore, ScopedStore, ScreenDefinition, Value, ValueMap,
};
use std::sync::Arc;

fn el(tag: &str, attrs: &[(&str, &str)]) -> Element {
    attrs
        .iter()
        .fold(Element::new(tag), |el, (k, v)| el.with_attr(*k, *v))
}

fn list(elements: Vec<Element>) -> ActionList {
    ActionList::from_elements(&elements).unwrap()
}

#[test]
fn test_set_with_from_field_and_value_fails_to_build() {
    let err = ActionList::from_elements(&[el(
        "set",
        &[("field", "a"), ("from-field", "b"), ("value", "c")],
    )])
    .unwrap_err();
    assert!(matches!(err, DefinitionError::FromFieldAndValue { .. }));
}

#[test]
fn test_expanded_value_end_to_end() {
    let mut ctx = Context::new();
    ctx.insert("b", "x");
    list(vec![el("set", &[("field", "a"), ("value", "${b}+suffix")])])
        .run(&mut ctx, &ActionEnv::new())
        .unwrap();
    assert_eq!(ctx.get("a"), Some(&Value::from("x+suffix")));
}

#[test]
fn test_scoped_keys_follow_widget_trail() {
    let session = Arc::new(MemoryStore::new());
    let application = Arc::new(MemoryStore::new());
    let env = ActionEnv::new()
        .with_session(session.clone())
        .with_application(application.clone());
    let actions = list(vec![
        el("set", &[("field", "viewIndex"), ("value", "2"), ("to-scope", "user")]),
        el("set", &[("field", "theme"), ("value", "dark"), ("to-scope", "application")]),
    ]);

    let mut ctx = Context::new();
    ctx.set_widget_trail(["FindOrders", "ListOrders"]);
    actions.run(&mut ctx, &env).unwrap();
    assert_eq!(
        session.get("FindOrders|ListOrders|viewIndex"),
        Some(Value::from("2"))
    );
    assert_eq!(
        application.get("FindOrders|ListOrders|theme"),
        Some(Value::from("dark"))
    );

    let mut bare = Context::new();
    actions.run(&mut bare, &env).unwrap();
    assert_eq!(session.get("viewIndex"), Some(Value::from("2")));
    assert_eq!(application.get("theme"), Some(Value::from("dark")));
}

#[test]
fn test_scoped_reads_fall_back_along_the_trail() {
    let session = Arc::new(MemoryStore::new());
    session.set("FindOrders|viewSize", Value::from("50"));
    let env = ActionEnv::new().with_session(session);

    let mut ctx = Context::new();
    ctx.set_widget_trail(["FindOrders", "ListOrders", "Pager"]);
    list(vec![el(
        "set",
        &[("field", "viewSize"), ("from-field", "viewSize"), ("from-scope", "user"), ("type", "Integer")],
    )])
    .run(&mut ctx, &env)
    .unwrap();
    assert_eq!(ctx.get("viewSize"), Some(&Value::Int(50)));
}

#[test]
fn test_global_set_is_not_duplicated_locally() {
    let actions = list(vec![el(
        "set",
        &[("field", "title"), ("value", "Orders"), ("global", "true")],
    )]);

    let mut ctx = Context::with_global();
    actions.run(&mut ctx, &ActionEnv::new()).unwrap();
    assert_eq!(
        ctx.global().unwrap().get("title"),
        Some(&Value::from("Orders"))
    );
    assert!(!ctx.local().contains_key("title"));

    let mut no_global = Context::new();
    actions.run(&mut no_global, &ActionEnv::new()).unwrap();
    assert_eq!(no_global.local().get("title"), Some(&Value::from("Orders")));
}

#[test]
fn test_get_related_without_source_is_a_no_op() {
    let env = ActionEnv::new().with_delegator(Arc::new(FakeDelegator::default()));
    let actions = list(vec![
        el(
            "get-related-one",
            &[("value-name", "product"), ("relation-name", "PrimaryProductCategory"), ("to-value-name", "category")],
        ),
        el(
            "get-related",
            &[("value-name", "product"), ("relation-name", "ProductPrice"), ("list-name", "prices")],
        ),
    ]);

    let mut ctx = Context::new();
    actions.run(&mut ctx, &env).unwrap();
    assert!(ctx.get("category").is_none());
    assert!(ctx.get("prices").is_none());
}

#[test]
fn test_get_related_rejects_non_entity_source() {
    let env = ActionEnv::new().with_delegator(Arc::new(FakeDelegator::default()));
    let mut ctx = Context::new();
    ctx.insert("product", "WG-1111");

    let err = list(vec![el(
        "get-related-one",
        &[("value-name", "product"), ("relation-name", "PrimaryProductCategory"), ("to-value-name", "category")],
    )])
    .run(&mut ctx, &env)
    .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"Screen action #0 <get-related-one> failed: Env variable for value-name product is not an entity value; for the relation-name: PrimaryProductCategory");
    assert!(matches!(err.source, ActionError::NotAnEntity { .. }));
}

#[test]
fn test_get_related_fetches_values() {
    let delegator = FakeDelegator::default()
        .with_relation(
            "PrimaryProductCategory",
            vec![EntityValue::new("ProductCategory").with_field("productCategoryId", "WIDGETS")],
        )
        .with_relation(
            "ProductPrice",
            vec![
                EntityValue::new("ProductPrice").with_field("productPriceTypeId", "LIST_PRICE"),
                EntityValue::new("ProductPrice").with_field("productPriceTypeId", "DEFAULT_PRICE"),
            ],
        );
    let env = ActionEnv::new().with_delegator(Arc::new(delegator));

    let mut ctx = Context::new();
    ctx.insert("product", EntityValue::new("Product").with_field("productId", "WG-1111"));
    let mut filter = ValueMap::new();
    filter.insert("productPriceTypeId".into(), Value::from("LIST_PRICE"));
    ctx.insert("priceFilter", filter);

    list(vec![
        el(
            "get-related-one",
            &[("value-name", "product"), ("relation-name", "PrimaryProductCategory"), ("to-value-name", "category")],
        ),
        el(
            "get-related",
            &[("value-name", "product"), ("relation-name", "ProductPrice"), ("list-name", "prices"), ("map-name", "priceFilter")],
        ),
    ])
    .run(&mut ctx, &env)
    .unwrap();

    let category = ctx.get("category").and_then(Value::as_entity).unwrap();
    assert_eq!(category.get("productCategoryId"), Some(&Value::from("WIDGETS")));
    assert_eq!(ctx.get("prices").and_then(Value::as_list).map(Vec::len), Some(1));
}

#[test]
fn test_get_related_unknown_relation() {
    let env = ActionEnv::new().with_delegator(Arc::new(FakeDelegator::default()));
    let mut ctx = Context::new();
    ctx.insert("product", EntityValue::new("Product"));

    let err = list(vec![el(
        "get-related",
        &[("value-name", "product"), ("relation-name", "Nope"), ("list-name", "out")],
    )])
    .run(&mut ctx, &env)
    .unwrap_err();
    insta::assert_snapshot!(err.source.to_string(), @"Problem getting related from entity with name Product for the relation-name: Nope: Unknown relation [Nope] on entity Product");
}

fn label_env() -> ActionEnv {
    let source = MemoryPropertySource::new()
        .with_resource("OrderUiLabels", None, [("Title", "Order"), ("OrderOnly", "o")])
        .with_resource("CommonUiLabels", None, [("Title", "Common"), ("CommonOnly", "c")]);
    ActionEnv::new().with_properties(Arc::new(source))
}

fn property_map(resource: &str, global: bool) -> Element {
    el(
        "property-map",
        &[
            ("resource", resource),
            ("map-name", "uiLabelMap"),
            ("global", if global { "true" } else { "false" }),
        ],
    )
}

#[test]
fn test_property_map_appends_with_first_wins() {
    let mut ctx = Context::new();
    list(vec![
        property_map("OrderUiLabels", false),
        property_map("CommonUiLabels", false),
    ])
    .run(&mut ctx, &label_env())
    .unwrap();

    let labels = ctx.get("uiLabelMap").and_then(Value::as_bundle).unwrap();
    assert_eq!(labels.get("Title").as_deref(), Some("Order"));
    assert_eq!(labels.get("OrderOnly").as_deref(), Some("o"));
    assert_eq!(labels.get("CommonOnly").as_deref(), Some("c"));
    assert_eq!(labels.resources(), vec!["OrderUiLabels", "CommonUiLabels"]);
}

#[test]
fn test_global_property_map_is_not_double_added() {
    let mut ctx = Context::with_global();
    list(vec![property_map("OrderUiLabels", true)])
        .run(&mut ctx, &label_env())
        .unwrap();

    let local = ctx.local().get("uiLabelMap").and_then(Value::as_bundle).cloned().unwrap();
    let global = ctx
        .global()
        .and_then(|g| g.get("uiLabelMap"))
        .and_then(Value::as_bundle)
        .cloned()
        .unwrap();
    assert!(!local.same_as(&global));

    // a nested layer still reads the base map through the stack
    ctx.push();
    list(vec![property_map("CommonUiLabels", true)])
        .run(&mut ctx, &label_env())
        .unwrap();
    assert_eq!(global.layer_count(), 2);
    assert_eq!(local.layer_count(), 2);
}

#[test]
fn test_global_property_map_shared_handle_added_once() {
    let mut ctx = Context::with_global();
    list(vec![property_map("OrderUiLabels", true)])
        .run(&mut ctx, &label_env())
        .unwrap();
    let global = ctx
        .global()
        .and_then(|g| g.get("uiLabelMap"))
        .and_then(Value::as_bundle)
        .cloned()
        .unwrap();

    // a fresh request layer over the same global map reads the global handle
    let mut request = Context::with_global();
    request
        .global_mut()
        .unwrap()
        .insert("uiLabelMap".into(), Value::Bundle(global.clone()));
    list(vec![property_map("CommonUiLabels", true)])
        .run(&mut request, &label_env())
        .unwrap();
    assert_eq!(global.layer_count(), 2);
    assert_eq!(global.resources(), vec!["OrderUiLabels", "CommonUiLabels"]);
}

#[test]
fn test_service_auto_field_map_prefers_context_over_parameters() {
    let seen = Arc::new(Mutex::new(ValueMap::new()));
    let captured = seen.clone();
    let dispatcher = LocalDispatcher::new().with_service(
        ServiceDefinition::new("getOrder", move |input| {
            *captured.lock() = input;
            Ok(ValueMap::new())
        })
        .with_in_params(["id"]),
    );
    let env = ActionEnv::new().with_dispatcher(Arc::new(dispatcher));

    let mut ctx = Context::new();
    let mut parameters = ValueMap::new();
    parameters.insert("id".into(), Value::from("7"));
    ctx.insert("parameters", parameters);
    ctx.insert("id", "9");

    list(vec![el(
        "service",
        &[("service-name", "getOrder"), ("auto-field-map", "true")],
    )])
    .run(&mut ctx, &env)
    .unwrap();
    assert_eq!(seen.lock().get("id"), Some(&Value::from("9")));
}

#[test]
fn test_service_field_maps_override_auto_map() {
    let seen = Arc::new(Mutex::new(ValueMap::new()));
    let captured = seen.clone();
    let dispatcher = LocalDispatcher::new().with_service(
        ServiceDefinition::new("getOrder", move |input| {
            *captured.lock() = input;
            Ok(ValueMap::new())
        })
        .with_in_params(["id"]),
    );
    let env = ActionEnv::new().with_dispatcher(Arc::new(dispatcher));

    let mut ctx = Context::new();
    let mut parameters = ValueMap::new();
    parameters.insert("id".into(), Value::from("7"));
    ctx.insert("parameters", parameters);

    let service = el("service", &[("service-name", "getOrder"), ("auto-field-map", "true")])
        .with_child(el("field-map", &[("field-name", "id"), ("value", "WS${parameters.id}")]));
    list(vec![service]).run(&mut ctx, &env).unwrap();
    assert_eq!(seen.lock().get("id"), Some(&Value::from("WS7")));
}

fn order_delegator() -> FakeDelegator {
    FakeDelegator::default().with_rows(
        "OrderHeader",
        &["orderId"],
        vec![
            EntityValue::new("OrderHeader")
                .with_field("orderId", "WS1")
                .with_field("statusId", "ORDER_CREATED"),
            EntityValue::new("OrderHeader")
                .with_field("orderId", "WS2")
                .with_field("statusId", "ORDER_APPROVED"),
        ],
    )
}

#[test]
fn test_entity_one_auto_field_map_uses_parameters() {
    let delegator = Arc::new(order_delegator());
    let env = ActionEnv::new().with_delegator(delegator.clone());

    let mut ctx = Context::new();
    let mut parameters = ValueMap::new();
    parameters.insert("orderId".into(), Value::from("WS2"));
    ctx.insert("parameters", parameters);

    list(vec![
        el("entity-one", &[("entity-name", "OrderHeader"), ("value-name", "orderHeader")]),
        el(
            "entity-one",
            &[("entity-name", "OrderHeader"), ("value-name", "missing"), ("auto-field-map", "false")],
        )
        .with_child(el("field-map", &[("field-name", "orderId"), ("value", "WS9")])),
    ])
    .run(&mut ctx, &env)
    .unwrap();

    let header = ctx.get("orderHeader").and_then(Value::as_entity).unwrap();
    assert_eq!(header.get("statusId"), Some(&Value::from("ORDER_APPROVED")));
    assert_eq!(ctx.get("missing"), Some(&Value::Null));
}

#[test]
fn test_entity_and_and_condition_lists() {
    let delegator = Arc::new(order_delegator());
    let env = ActionEnv::new().with_delegator(delegator.clone());
    let mut ctx = Context::new();
    ctx.insert("status", "ORDER_CREATED");

    let and = el("entity-and", &[("entity-name", "OrderHeader"), ("list-name", "created")])
        .with_child(el("field-map", &[("field-name", "statusId"), ("from-field", "status")]))
        .with_child(el("order-by", &[("field-name", "-orderId")]));
    let condition = el(
        "entity-condition",
        &[("entity-name", "OrderHeader"), ("list-name", "some"), ("distinct", "true")],
    )
    .with_child(el(
        "condition-expr",
        &[("field-name", "statusId"), ("operator", "in"), ("value", "ORDER_CREATED, ORDER_APPROVED")],
    ));

    list(vec![and, condition]).run(&mut ctx, &env).unwrap();
    assert_eq!(ctx.get("created").and_then(Value::as_list).map(Vec::len), Some(1));
    assert_eq!(ctx.get("some").and_then(Value::as_list).map(Vec::len), Some(2));

    let query = delegator.last_query().unwrap();
    assert!(query.distinct);
    assert!(!query.use_cache);
}

#[test]
fn test_finder_failures_are_uniform() {
    let env = ActionEnv::new().with_delegator(Arc::new(FakeDelegator::default()));
    let err = list(vec![el(
        "entity-and",
        &[("entity-name", "Nope"), ("list-name", "out")],
    )])
    .run(&mut Context::new(), &env)
    .unwrap_err();
    insta::assert_snapshot!(err.source.to_string(), @"Error doing entity query by and: Unknown entity: Nope");
}

#[test]
fn test_yaml_definition_runs() {
    let definition = ScreenDefinition::from_yaml_str(
        r#"
name: OrderView
actions:
  - tag: property-map
    attributes: { resource: OrderUiLabels, map-name: uiLabelMap }
  - tag: set
    attributes: { field: pageTitle, value: "${uiLabelMap.Title} ${orderId}" }
  - tag: property-to-field
    attributes: { resource: CommonUiLabels, property: Title, field: commonTitle }
"#,
    )
    .unwrap();
    let actions = ActionList::from_definition(&definition).unwrap();

    let mut ctx = Context::new();
    ctx.insert("orderId", "WS1");
    actions.run(&mut ctx, &label_env()).unwrap();
    assert_eq!(ctx.get("pageTitle"), Some(&Value::from("Order WS1")));
    assert_eq!(ctx.get("commonTitle"), Some(&Value::from("Common")));
}
