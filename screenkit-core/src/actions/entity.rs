use crate::accessor::FieldAccessor;
use crate::context::Context;
use crate::definition::Element;
use crate::env::ActionEnv;
use crate::error::{ActionError, DefinitionError, FinderError};
use crate::finder::{ByAndFinder, ByConditionFinder, PrimaryKeyFinder};
use screenkit_types::{EntityValue, Value};
use tracing::{debug, error};

fn finder_error(strategy: &'static str) -> impl FnOnce(FinderError) -> ActionError {
    move |source| {
        error!("Error doing entity query by {strategy}: {source}");
        ActionError::Finder { strategy, source }
    }
}

/// `<entity-one>`
#[derive(Debug, Clone)]
pub struct EntityOne {
    finder: PrimaryKeyFinder,
}

impl EntityOne {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            finder: PrimaryKeyFinder::from_element(element)?,
        })
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        self.finder
            .run_find(context, env.delegator()?)
            .map_err(finder_error("primary key"))
    }
}

/// `<entity-and>`
#[derive(Debug, Clone)]
pub struct EntityAnd {
    finder: ByAndFinder,
}

impl EntityAnd {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            finder: ByAndFinder::from_element(element)?,
        })
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        self.finder
            .run_find(context, env.delegator()?)
            .map_err(finder_error("and"))
    }
}

/// `<entity-condition>`
#[derive(Debug, Clone)]
pub struct EntityCondition {
    finder: ByConditionFinder,
}

impl EntityCondition {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            finder: ByConditionFinder::from_element(element)?,
        })
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        self.finder
            .run_find(context, env.delegator()?)
            .map_err(finder_error("condition"))
    }
}

/// The entity value a relation starts from, or `None` to skip quietly
fn source_entity<'a>(
    context: &'a Context,
    value_name: &FieldAccessor,
    relation_name: &str,
) -> Result<Option<&'a EntityValue>, ActionError> {
    match value_name.get(context) {
        None | Some(Value::Null) => {
            debug!("Value not found with name: {value_name}, not getting related...");
            Ok(None)
        }
        Some(Value::Entity(entity)) => Ok(Some(entity)),
        Some(_) => {
            let err = ActionError::NotAnEntity {
                value_name: value_name.original_name().to_string(),
                relation_name: relation_name.to_string(),
            };
            error!("{err}");
            Err(err)
        }
    }
}

/// `<get-related-one>`: follow a to-one relation
#[derive(Debug, Clone)]
pub struct GetRelatedOne {
    value_name: FieldAccessor,
    to_value_name: FieldAccessor,
    relation_name: String,
    use_cache: bool,
}

impl GetRelatedOne {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            value_name: FieldAccessor::new(element.require_attr("value-name")?),
            to_value_name: FieldAccessor::new(element.require_attr("to-value-name")?),
            relation_name: element.require_attr("relation-name")?.to_string(),
            use_cache: element.attr("use-cache") == "true",
        })
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        let Some(value) = source_entity(context, &self.value_name, &self.relation_name)? else {
            return Ok(());
        };
        let related = env
            .delegator()?
            .related_one(value, &self.relation_name, self.use_cache)
            .map_err(|source| ActionError::Relation {
                target: "related one",
                entity_name: value.entity_name().to_string(),
                relation_name: self.relation_name.clone(),
                source,
            })?;
        self.to_value_name
            .put(context, related.map(Value::Entity).unwrap_or(Value::Null))?;
        Ok(())
    }
}

/// `<get-related>`: follow a to-many relation
#[derive(Debug, Clone)]
pub struct GetRelated {
    value_name: FieldAccessor,
    list_name: FieldAccessor,
    map_name: FieldAccessor,
    order_by_list_name: FieldAccessor,
    relation_name: String,
    use_cache: bool,
}

impl GetRelated {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            value_name: FieldAccessor::new(element.require_attr("value-name")?),
            list_name: FieldAccessor::new(element.require_attr("list-name")?),
            map_name: FieldAccessor::new(element.attr("map-name")),
            order_by_list_name: FieldAccessor::new(element.attr("order-by-list-name")),
            relation_name: element.require_attr("relation-name")?.to_string(),
            use_cache: element.attr("use-cache") == "true",
        })
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        let Some(value) = source_entity(context, &self.value_name, &self.relation_name)? else {
            return Ok(());
        };
        let order_by: Vec<String> = self
            .order_by_list_name
            .get(context)
            .and_then(Value::as_list)
            .map(|items| items.iter().map(Value::to_string).collect())
            .unwrap_or_default();
        let constraints = self.map_name.get(context).and_then(Value::as_map);

        let related = env
            .delegator()?
            .related(value, &self.relation_name, constraints, &order_by, self.use_cache)
            .map_err(|source| ActionError::Relation {
                target: "related",
                entity_name: value.entity_name().to_string(),
                relation_name: self.relation_name.clone(),
                source,
            })?;
        let list = related.into_iter().map(Value::Entity).collect();
        self.list_name.put(context, Value::List(list))?;
        Ok(())
    }
}
