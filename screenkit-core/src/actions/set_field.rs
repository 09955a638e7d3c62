use crate::accessor::FieldAccessor;
use crate::context::{keys, Context};
use crate::convert::convert;
use crate::definition::Element;
use crate::env::ActionEnv;
use crate::error::{ActionError, DefinitionError};
use crate::expander::Expander;
use crate::scope::{find_in_trail, trail_key, ScopedStore};
use screenkit_types::Value;
use tracing::debug;

/// Where a set action reads from or writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Screen,
    User,
    Application,
}

impl Scope {
    fn parse(name: &str) -> Self {
        match name {
            "user" => Scope::User,
            "application" => Scope::Application,
            _ => Scope::Screen,
        }
    }

    fn store<'a>(&self, env: &'a ActionEnv) -> Result<Option<&'a dyn ScopedStore>, ActionError> {
        match self {
            Scope::Screen => Ok(None),
            Scope::User => env.session().map(Some),
            Scope::Application => env.application().map(Some),
        }
    }
}

/// `<set>`: copy or compute a value into a field.
#[derive(Debug, Clone)]
pub struct SetField {
    field: FieldAccessor,
    from_field: FieldAccessor,
    value: Expander,
    default_value: Expander,
    global: Expander,
    type_name: String,
    to_scope: Scope,
    from_scope: Scope,
}

impl SetField {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        let field = FieldAccessor::new(element.require_attr("field")?);
        let from_field = FieldAccessor::new(element.attr("from-field"));
        let value = Expander::new(element.attr("value"));
        if !from_field.is_empty() && !value.is_empty() {
            return Err(DefinitionError::FromFieldAndValue {
                from_field: from_field.original_name().to_string(),
                value: value.original().to_string(),
            });
        }
        Ok(Self {
            field,
            from_field,
            value,
            default_value: Expander::new(element.attr("default-value")),
            global: Expander::new(element.attr("global")),
            type_name: element.attr("type").trim().to_string(),
            to_scope: Scope::parse(element.attr("to-scope")),
            from_scope: Scope::parse(element.attr("from-scope")),
        })
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        let global = self.global.expand_string(context) == "true";

        let mut new_value = self.source_value(context, env)?;
        if new_value.is_empty() && !self.default_value.is_empty() {
            new_value = Value::String(self.default_value.expand_string(context));
        }

        if !self.type_name.is_empty() {
            let shown = new_value.to_string();
            new_value = convert(new_value, &self.type_name).map_err(|source| {
                let err = ActionError::Conversion {
                    field: self.field.original_name().to_string(),
                    type_name: self.type_name.clone(),
                    value: shown,
                    source,
                };
                tracing::error!("{err}");
                err
            })?;
        }

        match self.to_scope.store(env)? {
            Some(store) => {
                let key = trail_key(&context.widget_trail(), self.field.original_name());
                debug!(key = %key, scope = ?self.to_scope, "setting scoped value");
                store.set(&key, new_value.clone());
            }
            None if !global => {
                debug!(field = %self.field, "setting screen field");
                self.field.put(context, new_value.clone())?;
            }
            None => {}
        }

        if global {
            match context.global_mut() {
                Some(global_map) => self.field.put(global_map, new_value.clone())?,
                None => self.field.put(context, new_value.clone())?,
            }
        }

        if let Some(Value::Map(page)) = context.get_mut(keys::PAGE) {
            self.field.put(page, new_value)?;
        }
        Ok(())
    }

    fn source_value(&self, context: &Context, env: &ActionEnv) -> Result<Value, ActionError> {
        if !self.from_field.is_empty() {
            let value = match self.from_scope.store(env)? {
                Some(store) => find_in_trail(
                    store,
                    &context.widget_trail(),
                    self.from_field.original_name(),
                ),
                None => self.from_field.get_value(context),
            };
            debug!(from_field = %self.from_field, scope = ?self.from_scope, found = value.is_some(), "reading set source");
            return Ok(value.unwrap_or(Value::Null));
        }
        if !self.value.is_empty() {
            return Ok(Value::String(self.value.expand_string(context)));
        }
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::MemoryStore;
    use screenkit_types::ValueMap;
    use std::sync::Arc;

    fn set(attrs: &[(&str, &str)]) -> SetField {
        let el = attrs
            .iter()
            .fold(Element::new("set"), |el, (k, v)| el.with_attr(*k, *v));
        SetField::from_element(&el).unwrap()
    }

    #[test]
    fn test_from_field_and_value_rejected() {
        let el = Element::new("set")
            .with_attr("field", "a")
            .with_attr("from-field", "b")
            .with_attr("value", "c");
        let err = SetField::from_element(&el).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot specify a from-field [b] and a value [c] on the set action in a screen widget"
        );
    }

    #[test]
    fn test_default_and_type() {
        let mut ctx = Context::new();
        set(&[("field", "viewSize"), ("from-field", "parameters.VIEW_SIZE"), ("default-value", "20"), ("type", "Integer")])
            .run(&mut ctx, &ActionEnv::new())
            .unwrap();
        assert_eq!(ctx.get("viewSize"), Some(&Value::Int(20)));
    }

    #[test]
    fn test_conversion_failure_names_field() {
        let mut ctx = Context::new();
        let err = set(&[("field", "n"), ("value", "abc"), ("type", "Long")])
            .run(&mut ctx, &ActionEnv::new())
            .unwrap_err();
        assert!(matches!(
            &err,
            ActionError::Conversion { field, type_name, value, .. }
                if field == "n" && type_name == "Long" && value == "abc"
        ));
    }

    #[test]
    fn test_integer_overflow_is_a_conversion_error() {
        let mut ctx = Context::new();
        let err = set(&[("field", "n"), ("value", "3000000000"), ("type", "Integer")])
            .run(&mut ctx, &ActionEnv::new())
            .unwrap_err();
        assert!(matches!(err, ActionError::Conversion { ref type_name, .. } if type_name == "Integer"));
        assert!(ctx.get("n").is_none());
    }

    #[test]
    fn test_page_map_mirror() {
        let mut ctx = Context::new();
        ctx.insert(keys::PAGE, ValueMap::new());
        set(&[("field", "title"), ("value", "Orders")])
            .run(&mut ctx, &ActionEnv::new())
            .unwrap();
        let page = ctx.get(keys::PAGE).and_then(Value::as_map).unwrap();
        assert_eq!(page.get("title"), Some(&Value::from("Orders")));
    }

    #[test]
    fn test_scoped_write_requires_store() {
        let mut ctx = Context::new();
        let action = set(&[("field", "x"), ("value", "1"), ("to-scope", "user")]);
        assert!(matches!(
            action.run(&mut ctx, &ActionEnv::new()),
            Err(ActionError::MissingCollaborator("session store"))
        ));

        let session = Arc::new(MemoryStore::new());
        let env = ActionEnv::new().with_session(session.clone());
        action.run(&mut ctx, &env).unwrap();
        assert_eq!(session.get("x"), Some(Value::from("1")));
        assert!(ctx.get("x").is_none());
    }
}
