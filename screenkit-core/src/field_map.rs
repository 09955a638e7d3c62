//! `<field-map>` children shared by services and finders.

use crate::accessor::FieldAccessor;
use crate::context::Context;
use crate::definition::Element;
use crate::error::{ContextError, DefinitionError};
use crate::expander::Expander;
use screenkit_types::{Value, ValueMap};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldMapSource {
    Field(FieldAccessor),
    Value(Expander),
}

/// One `field-name` ← (`from-field` | `value`) mapping.
///
/// `value` wins when both are given; a mapping with neither reads the
/// context field of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapEntry {
    pub target: FieldAccessor,
    pub source: FieldMapSource,
}

impl FieldMapEntry {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        let field_name = element.require_attr("field-name")?;
        let source = if element.has_attr("value") {
            FieldMapSource::Value(Expander::new(element.attr("value")))
        } else if element.has_attr("from-field") {
            FieldMapSource::Field(FieldAccessor::new(element.attr("from-field")))
        } else {
            FieldMapSource::Field(FieldAccessor::new(field_name))
        };
        Ok(Self {
            target: FieldAccessor::new(field_name),
            source,
        })
    }

    pub fn resolve(&self, context: &Context) -> Value {
        match &self.source {
            FieldMapSource::Field(acc) => acc.get_value(context).unwrap_or(Value::Null),
            FieldMapSource::Value(exdr) => exdr.expand(context),
        }
    }
}

/// All `field-map` children of `element`, in document order
pub fn read_field_maps(element: &Element) -> Result<Vec<FieldMapEntry>, DefinitionError> {
    element
        .children_named("field-map")
        .map(FieldMapEntry::from_element)
        .collect()
}

/// Resolve each entry against `context` and write it into `target`.
pub fn expand_field_maps(
    entries: &[FieldMapEntry],
    context: &Context,
    target: &mut ValueMap,
) -> Result<(), ContextError> {
    for entry in entries {
        entry.target.put(target, entry.resolve(context))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources() {
        let el = Element::new("service")
            .with_child(Element::new("field-map").with_attr("field-name", "orderId"))
            .with_child(
                Element::new("field-map")
                    .with_attr("field-name", "partyId")
                    .with_attr("from-field", "userLogin.partyId"),
            )
            .with_child(
                Element::new("field-map")
                    .with_attr("field-name", "statusId")
                    .with_attr("value", "ORDER_${state}"),
            )
            .with_child(Element::new("field-map").with_attr("field-name", "missing"));

        let entries = read_field_maps(&el).unwrap();
        assert_eq!(entries.len(), 4);

        let mut ctx = Context::new();
        ctx.insert("orderId", "WS10000");
        ctx.insert("state", "APPROVED");
        let mut login = ValueMap::new();
        login.insert("partyId".into(), Value::from("admin"));
        ctx.insert("userLogin", login);

        let mut out = ValueMap::new();
        expand_field_maps(&entries, &ctx, &mut out).unwrap();
        assert_eq!(out["orderId"], Value::from("WS10000"));
        assert_eq!(out["partyId"], Value::from("admin"));
        assert_eq!(out["statusId"], Value::from("ORDER_APPROVED"));
        assert_eq!(out["missing"], Value::Null);
    }

    #[test]
    fn test_field_name_required() {
        let el = Element::new("service").with_child(Element::new("field-map").with_attr("value", "x"));
        assert!(read_field_maps(&el).is_err());
    }
}
