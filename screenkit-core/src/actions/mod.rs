//! Screen actions: the typed steps that populate a context before render.
//!
//! An [`ActionList`] is built once from a screen definition and then run
//! for every request. Running is sequential and fail-fast: the first
//! failing action stops the list, and the error names its position and tag.

mod entity;
mod property;
mod script;
mod service;
mod set_field;

pub use entity::{EntityAnd, EntityCondition, EntityOne, GetRelated, GetRelatedOne};
pub use property::{PropertyMap, PropertyToField};
pub use script::Script;
pub use service::Service;
pub use set_field::{Scope, SetField};

use crate::context::Context;
use crate::definition::{Element, ScreenDefinition};
use crate::env::ActionEnv;
use crate::error::{ActionError, ActionFailed, DefinitionError};
use tracing::debug;

/// One action of a screen
#[derive(Debug, Clone)]
pub enum ScreenAction {
    SetField(SetField),
    PropertyMap(PropertyMap),
    PropertyToField(PropertyToField),
    Script(Script),
    Service(Service),
    EntityOne(EntityOne),
    EntityAnd(EntityAnd),
    EntityCondition(EntityCondition),
    GetRelatedOne(GetRelatedOne),
    GetRelated(GetRelated),
}

impl ScreenAction {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(match element.tag.as_str() {
            "set" => Self::SetField(SetField::from_element(element)?),
            "property-map" => Self::PropertyMap(PropertyMap::from_element(element)?),
            "property-to-field" => Self::PropertyToField(PropertyToField::from_element(element)?),
            "script" => Self::Script(Script::from_element(element)?),
            "service" => Self::Service(Service::from_element(element)?),
            "entity-one" => Self::EntityOne(EntityOne::from_element(element)?),
            "entity-and" => Self::EntityAnd(EntityAnd::from_element(element)?),
            "entity-condition" => Self::EntityCondition(EntityCondition::from_element(element)?),
            "get-related-one" => Self::GetRelatedOne(GetRelatedOne::from_element(element)?),
            "get-related" => Self::GetRelated(GetRelated::from_element(element)?),
            other => return Err(DefinitionError::UnsupportedAction(other.to_string())),
        })
    }

    /// The definition tag this action was built from
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SetField(_) => "set",
            Self::PropertyMap(_) => "property-map",
            Self::PropertyToField(_) => "property-to-field",
            Self::Script(_) => "script",
            Self::Service(_) => "service",
            Self::EntityOne(_) => "entity-one",
            Self::EntityAnd(_) => "entity-and",
            Self::EntityCondition(_) => "entity-condition",
            Self::GetRelatedOne(_) => "get-related-one",
            Self::GetRelated(_) => "get-related",
        }
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        match self {
            Self::SetField(a) => a.run(context, env),
            Self::PropertyMap(a) => a.run(context, env),
            Self::PropertyToField(a) => a.run(context, env),
            Self::Script(a) => a.run(context, env),
            Self::Service(a) => a.run(context, env),
            Self::EntityOne(a) => a.run(context, env),
            Self::EntityAnd(a) => a.run(context, env),
            Self::EntityCondition(a) => a.run(context, env),
            Self::GetRelatedOne(a) => a.run(context, env),
            Self::GetRelated(a) => a.run(context, env),
        }
    }
}

/// An ordered, immutable list of actions
#[derive(Debug, Clone, Default)]
pub struct ActionList {
    actions: Vec<ScreenAction>,
}

impl ActionList {
    pub fn from_elements(elements: &[Element]) -> Result<Self, DefinitionError> {
        let actions = elements
            .iter()
            .map(ScreenAction::from_element)
            .collect::<Result<_, _>>()?;
        Ok(Self { actions })
    }

    pub fn from_definition(definition: &ScreenDefinition) -> Result<Self, DefinitionError> {
        Self::from_elements(&definition.actions)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScreenAction> {
        self.actions.iter()
    }

    /// Run every action in order, stopping at the first failure.
    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionFailed> {
        for (index, action) in self.actions.iter().enumerate() {
            debug!(index, tag = action.tag(), "running screen action");
            action.run(context, env).map_err(|source| ActionFailed {
                index,
                tag: action.tag(),
                source,
            })?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ActionList {
    type Item = &'a ScreenAction;
    type IntoIter = std::slice::Iter<'a, ScreenAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
