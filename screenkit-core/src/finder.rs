//! Declarative entity finders: by primary key, by field equality, and by
//! condition tree.

use crate::accessor::FieldAccessor;
use crate::context::{keys, Context};
use crate::definition::Element;
use crate::entity::{ComparisonOperator, Delegator, EntityCondition, EntityQuery, JoinOperator};
use crate::error::{DefinitionError, FinderError};
use crate::expander::Expander;
use crate::field_map::{expand_field_maps, read_field_maps, FieldMapEntry};
use screenkit_types::{EntityValue, Value, ValueMap};
use tracing::debug;

fn child_field_names(element: &Element, tag: &str) -> Result<Vec<String>, DefinitionError> {
    element
        .children_named(tag)
        .map(|c| c.require_attr("field-name").map(str::to_string))
        .collect()
}

fn expand_flag(exdr: &Expander, context: &Context) -> bool {
    exdr.expand_string(context) == "true"
}

fn select_fields(value: EntityValue, select: &[String]) -> EntityValue {
    if select.is_empty() {
        return value;
    }
    let name = value.entity_name().to_string();
    let fields = value
        .into_fields()
        .into_iter()
        .filter(|(k, _)| select.contains(k))
        .collect();
    EntityValue::from_fields(name, fields)
}

/// `entity-one`: find one value by primary key
#[derive(Debug, Clone)]
pub struct PrimaryKeyFinder {
    entity_name: Expander,
    value_name: FieldAccessor,
    use_cache: Expander,
    auto_field_map: bool,
    field_maps: Vec<FieldMapEntry>,
    select: Vec<String>,
}

impl PrimaryKeyFinder {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            entity_name: Expander::new(element.require_attr("entity-name")?),
            value_name: FieldAccessor::new(element.require_attr("value-name")?),
            use_cache: Expander::new(element.attr("use-cache")),
            auto_field_map: element.bool_attr("auto-field-map", true)?,
            field_maps: read_field_maps(element)?,
            select: child_field_names(element, "select-field")?,
        })
    }

    pub fn run_find(&self, context: &mut Context, delegator: &dyn Delegator) -> Result<(), FinderError> {
        let entity_name = self.entity_name.expand_string(context);
        let mut primary_key = ValueMap::new();

        if self.auto_field_map {
            let parameters = context.get(keys::PARAMETERS).and_then(Value::as_map);
            for field in delegator.primary_key_fields(&entity_name)? {
                let value = context
                    .get(&field)
                    .filter(|v| !v.is_null())
                    .or_else(|| parameters.and_then(|p| p.get(&field)))
                    .filter(|v| !v.is_null())
                    .cloned();
                if let Some(value) = value {
                    primary_key.insert(field, value);
                }
            }
        }
        expand_field_maps(&self.field_maps, context, &mut primary_key)?;

        let found = delegator
            .find_one(&entity_name, &primary_key, expand_flag(&self.use_cache, context))?
            .map(|v| select_fields(v, &self.select));
        if found.is_none() {
            debug!(entity = %entity_name, "no value found by primary key");
        }
        self.value_name
            .put(context, found.map(Value::Entity).unwrap_or(Value::Null))?;
        Ok(())
    }
}

/// Options shared by the list finders
#[derive(Debug, Clone)]
struct ListOptions {
    entity_name: Expander,
    list_name: FieldAccessor,
    use_cache: Expander,
    filter_by_date: Expander,
    distinct: Expander,
    select: Vec<String>,
    order_by: Vec<String>,
}

impl ListOptions {
    fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            entity_name: Expander::new(element.require_attr("entity-name")?),
            list_name: FieldAccessor::new(element.require_attr("list-name")?),
            use_cache: Expander::new(element.attr("use-cache")),
            filter_by_date: Expander::new(element.attr("filter-by-date")),
            distinct: Expander::new(element.attr("distinct")),
            select: child_field_names(element, "select-field")?,
            order_by: child_field_names(element, "order-by")?,
        })
    }

    fn query(&self, context: &Context, condition: Option<EntityCondition>) -> EntityQuery {
        EntityQuery {
            entity_name: self.entity_name.expand_string(context),
            condition,
            select: self.select.clone(),
            order_by: self.order_by.clone(),
            use_cache: expand_flag(&self.use_cache, context),
            distinct: expand_flag(&self.distinct, context),
            filter_by_date: expand_flag(&self.filter_by_date, context),
        }
    }

    fn run(
        &self,
        context: &mut Context,
        delegator: &dyn Delegator,
        condition: Option<EntityCondition>,
    ) -> Result<(), FinderError> {
        let query = self.query(context, condition);
        let found = delegator.find_list(&query)?;
        debug!(entity = %query.entity_name, count = found.len(), "entity list query");
        let list = found.into_iter().map(Value::Entity).collect();
        self.list_name.put(context, Value::List(list))?;
        Ok(())
    }
}

/// `entity-and`: find a list by field equality
#[derive(Debug, Clone)]
pub struct ByAndFinder {
    options: ListOptions,
    field_maps: Vec<FieldMapEntry>,
}

impl ByAndFinder {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            options: ListOptions::from_element(element)?,
            field_maps: read_field_maps(element)?,
        })
    }

    pub fn run_find(&self, context: &mut Context, delegator: &dyn Delegator) -> Result<(), FinderError> {
        let mut fields = ValueMap::new();
        expand_field_maps(&self.field_maps, context, &mut fields)?;
        let condition = (!fields.is_empty()).then(|| EntityCondition::and_map(&fields));
        self.options.run(context, delegator, condition)
    }
}

/// An unresolved condition: ignore flags and value sources still attached
#[derive(Debug, Clone)]
pub enum ConditionSpec {
    Expr {
        field_name: String,
        operator: ComparisonOperator,
        env_name: Option<FieldAccessor>,
        value: Expander,
        ignore_if_null: bool,
        ignore_if_empty: bool,
        ignore_case: bool,
        ignore: Expander,
    },
    List {
        join: JoinOperator,
        conditions: Vec<ConditionSpec>,
    },
}

impl ConditionSpec {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        match element.tag.as_str() {
            "condition-expr" => {
                let operator_name = element.attr("operator");
                let operator = ComparisonOperator::parse(operator_name).ok_or_else(|| {
                    DefinitionError::InvalidAttribute {
                        tag: element.tag.clone(),
                        attribute: "operator".to_string(),
                        value: operator_name.to_string(),
                    }
                })?;
                Ok(Self::Expr {
                    field_name: element.require_attr("field-name")?.to_string(),
                    operator,
                    env_name: element
                        .has_attr("env-name")
                        .then(|| FieldAccessor::new(element.attr("env-name"))),
                    value: Expander::new(element.attr("value")),
                    ignore_if_null: element.bool_attr("ignore-if-null", false)?,
                    ignore_if_empty: element.bool_attr("ignore-if-empty", false)?,
                    ignore_case: element.bool_attr("ignore-case", false)?,
                    ignore: Expander::new(element.attr("ignore")),
                })
            }
            "condition-list" => {
                let combine = element.attr("combine");
                let join = JoinOperator::parse(combine).ok_or_else(|| {
                    DefinitionError::InvalidAttribute {
                        tag: element.tag.clone(),
                        attribute: "combine".to_string(),
                        value: combine.to_string(),
                    }
                })?;
                let conditions = element
                    .children
                    .iter()
                    .map(Self::from_element)
                    .collect::<Result<_, _>>()?;
                Ok(Self::List { join, conditions })
            }
            other => Err(DefinitionError::UnsupportedCondition(other.to_string())),
        }
    }

    /// Resolve against the context. Ignored expressions and empty lists
    /// resolve to `None`.
    pub fn resolve(&self, context: &Context) -> Option<EntityCondition> {
        match self {
            Self::Expr {
                field_name,
                operator,
                env_name,
                value,
                ignore_if_null,
                ignore_if_empty,
                ignore_case,
                ignore,
            } => {
                if expand_flag(ignore, context) {
                    return None;
                }
                let mut resolved = match env_name {
                    Some(acc) => acc.get_value(context).unwrap_or(Value::Null),
                    None => value.expand(context),
                };
                if *ignore_if_null && resolved.is_null() {
                    return None;
                }
                if *ignore_if_empty && resolved.is_empty() {
                    return None;
                }
                if operator.takes_list() {
                    if let Value::String(s) = &resolved {
                        resolved = Value::List(
                            s.split(',')
                                .map(|item| Value::String(item.trim().to_string()))
                                .collect(),
                        );
                    }
                }
                Some(EntityCondition::Expr {
                    field: field_name.clone(),
                    operator: *operator,
                    value: resolved,
                    ignore_case: *ignore_case,
                })
            }
            Self::List { join, conditions } => {
                let conditions: Vec<_> = conditions.iter().filter_map(|c| c.resolve(context)).collect();
                if conditions.is_empty() {
                    None
                } else {
                    Some(EntityCondition::List {
                        join: *join,
                        conditions,
                    })
                }
            }
        }
    }
}

/// `entity-condition`: find a list by condition tree
#[derive(Debug, Clone)]
pub struct ByConditionFinder {
    options: ListOptions,
    condition: Option<ConditionSpec>,
}

impl ByConditionFinder {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        let condition = element
            .children
            .iter()
            .find(|c| c.tag.starts_with("condition-"))
            .map(ConditionSpec::from_element)
            .transpose()?;
        Ok(Self {
            options: ListOptions::from_element(element)?,
            condition,
        })
    }

    pub fn run_find(&self, context: &mut Context, delegator: &dyn Delegator) -> Result<(), FinderError> {
        let condition = self.condition.as_ref().and_then(|c| c.resolve(context));
        self.options.run(context, delegator, condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(field: &str) -> Element {
        Element::new("condition-expr").with_attr("field-name", field)
    }

    #[test]
    fn test_ignore_flags_drop_expressions() {
        let condition = ConditionSpec::from_element(
            &Element::new("condition-list")
                .with_attr("combine", "or")
                .with_child(expr("statusId").with_attr("env-name", "status").with_attr("ignore-if-null", "true"))
                .with_child(expr("orderTypeId").with_attr("value", "${type}").with_attr("ignore-if-empty", "true"))
                .with_child(expr("partyId").with_attr("value", "x").with_attr("ignore", "${skipParty}")),
        )
        .unwrap();

        let mut ctx = Context::new();
        ctx.insert("skipParty", "true");
        assert_eq!(condition.resolve(&ctx), None);

        ctx.insert("status", "ORDER_CREATED");
        assert_eq!(
            condition.resolve(&ctx),
            Some(EntityCondition::List {
                join: JoinOperator::Or,
                conditions: vec![EntityCondition::equals("statusId", "ORDER_CREATED")],
            })
        );
    }

    #[test]
    fn test_in_operator_splits_strings() {
        let condition = ConditionSpec::from_element(
            &expr("statusId").with_attr("operator", "in").with_attr("value", "A, B"),
        )
        .unwrap();
        let Some(EntityCondition::Expr { value, .. }) = condition.resolve(&Context::new()) else {
            panic!("expected an expression");
        };
        assert_eq!(value, Value::List(vec![Value::from("A"), Value::from("B")]));
    }

    #[test]
    fn test_bad_operator_and_combine() {
        assert!(matches!(
            ConditionSpec::from_element(&expr("a").with_attr("operator", "approx")),
            Err(DefinitionError::InvalidAttribute { .. })
        ));
        assert!(matches!(
            ConditionSpec::from_element(&Element::new("condition-list").with_attr("combine", "xor")),
            Err(DefinitionError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_condition_object_is_rejected() {
        let el = Element::new("entity-condition")
            .with_attr("entity-name", "OrderHeader")
            .with_attr("list-name", "orders")
            .with_child(Element::new("condition-object").with_attr("field", "cond"));
        let err = ByConditionFinder::from_element(&el).unwrap_err();
        assert!(matches!(err, DefinitionError::UnsupportedCondition(ref tag) if tag == "condition-object"));
        assert_eq!(
            err.to_string(),
            "Condition element not supported with name: condition-object"
        );
    }

    #[test]
    fn test_select_fields() {
        let value = EntityValue::new("Product")
            .with_field("productId", "WG-1")
            .with_field("productName", "Widget");
        let trimmed = select_fields(value, &["productId".to_string()]);
        assert_eq!(trimmed.fields().len(), 1);
        assert_eq!(trimmed.entity_name(), "Product");
    }
}
