use crate::accessor::FieldAccessor;
use crate::context::Context;
use crate::definition::Element;
use crate::env::ActionEnv;
use crate::error::{ActionError, DefinitionError, PropertyError};
use crate::expander::Expander;
use crate::properties::format_message;
use screenkit_types::{BundleMap, Value};
use tracing::debug;

fn property_error(resource: &str) -> impl FnOnce(PropertyError) -> ActionError + '_ {
    move |source| ActionError::Property {
        resource: resource.to_string(),
        source,
    }
}

/// The bundle map in `slot`, if any. Other non-null values are an error.
fn existing_bundle(slot: Option<&Value>, map_name: &FieldAccessor) -> Result<Option<BundleMap>, ActionError> {
    match slot {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bundle(bundle)) => Ok(Some(bundle.clone())),
        Some(other) => Err(ActionError::NotABundle {
            map_name: map_name.original_name().to_string(),
            found: other.type_name(),
        }),
    }
}

/// `<property-map>`: expose a resource bundle as a map of messages.
///
/// Repeated loads into the same map stack later resources underneath
/// earlier ones, so the first resource loaded wins on shared keys.
#[derive(Debug, Clone)]
pub struct PropertyMap {
    resource: Expander,
    map_name: FieldAccessor,
    global: Expander,
}

impl PropertyMap {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            resource: Expander::new(element.require_attr("resource")?),
            map_name: FieldAccessor::new(element.require_attr("map-name")?),
            global: Expander::new(element.attr("global")),
        })
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        let global = self.global.expand_string(context) == "true";
        let locale = context.locale();
        let resource = self.resource.expand_string(context);
        let properties = env.properties()?;
        let bundle = properties
            .bundle(&resource, locale.as_ref())
            .map_err(property_error(&resource))?;

        let existing = existing_bundle(self.map_name.get(context), &self.map_name)?;
        match &existing {
            None => self
                .map_name
                .put(context, Value::Bundle(BundleMap::new(bundle.clone())))?,
            Some(map) => {
                if !map.add_bottom(bundle.clone()) {
                    debug!(resource = %resource, "resource already layered in {}", self.map_name);
                }
            }
        }

        if !global {
            return Ok(());
        }
        let Some(global_map) = context.global_mut() else {
            return Ok(());
        };
        let global_existing = existing_bundle(self.map_name.get(&*global_map), &self.map_name)?;
        match global_existing {
            None => self
                .map_name
                .put(global_map, Value::Bundle(BundleMap::new(bundle)))?,
            Some(global_bundle) => {
                let same = existing.as_ref().is_some_and(|local| local.same_as(&global_bundle));
                if !same {
                    global_bundle.add_bottom(bundle);
                }
            }
        }
        Ok(())
    }
}

/// `<property-to-field>`: copy one localized message into a field.
#[derive(Debug, Clone)]
pub struct PropertyToField {
    resource: Expander,
    property: Expander,
    field: FieldAccessor,
    default: Expander,
    no_locale: bool,
    arg_list_name: FieldAccessor,
}

impl PropertyToField {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            resource: Expander::new(element.attr("resource")),
            property: Expander::new(element.attr("property")),
            field: FieldAccessor::new(element.require_attr("field")?),
            default: Expander::new(element.attr("default")),
            no_locale: element.attr("no-locale") == "true",
            arg_list_name: FieldAccessor::new(element.attr("arg-list-name")),
        })
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        let locale = context.locale();
        let resource = self.resource.expand_string(context);
        let property = self.property.expand_string(context);
        let properties = env.properties()?;

        let found = if self.no_locale {
            properties.property(&resource, &property)
        } else {
            properties.message(&resource, &property, locale.as_ref())
        };
        let message = match found {
            Ok(message) => message,
            // a missing resource reads like a missing key
            Err(PropertyError::NotFound { .. }) => None,
            Err(source) => return Err(property_error(&resource)(source)),
        };

        let raw = match message {
            Some(m) if !m.is_empty() => m,
            _ => self.default.expand_string(context),
        };
        let mut value = Expander::expand_str(&raw, context);

        if !self.arg_list_name.is_empty() {
            if let Some(Value::List(args)) = self.arg_list_name.get(context) {
                if !args.is_empty() {
                    value = format_message(&value, args);
                }
            }
        }

        self.field.put(context, Value::String(value))?;
        Ok(())
    }
}
