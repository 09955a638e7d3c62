use crate::accessor::FieldAccessor;
use crate::context::{keys, Context};
use crate::definition::Element;
use crate::env::ActionEnv;
use crate::error::{ActionError, DefinitionError, ServiceError};
use crate::expander::Expander;
use crate::field_map::{expand_field_maps, read_field_maps, FieldMapEntry};
use screenkit_types::{Value, ValueMap};
use tracing::error;

const QUERY_STRING: &str = "queryString";
const QUERY_STRING_MAP: &str = "queryStringMap";
const QUERY_STRING_ENCODED: &str = "queryStringEncoded";

/// `<service>`: call a service synchronously and keep its results.
#[derive(Debug, Clone)]
pub struct Service {
    service_name: Expander,
    result_map_name: Option<FieldAccessor>,
    auto_field_map: Expander,
    field_maps: Vec<FieldMapEntry>,
}

impl Service {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        let result_map_name = element.attr("result-map-name");
        Ok(Self {
            service_name: Expander::new(element.require_attr("service-name")?),
            result_map_name: (!result_map_name.is_empty()).then(|| FieldAccessor::new(result_map_name)),
            auto_field_map: Expander::new(element.attr("auto-field-map")),
            field_maps: read_field_maps(element)?,
        })
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        let service = self.service_name.expand_string(context);
        if service.is_empty() {
            return Err(ActionError::EmptyServiceName(
                self.service_name.original().to_string(),
            ));
        }
        let dispatcher = env.dispatcher()?;
        let wrap = |source: ServiceError| {
            error!("Error calling service with name {service}: {source}");
            ActionError::Service {
                service: service.clone(),
                source,
            }
        };

        let auto_field_map = self.auto_field_map.expand_string(context);
        let mut input = match auto_field_map.as_str() {
            "true" => {
                // parameters first so context entries override them
                let mut combined = context
                    .get(keys::PARAMETERS)
                    .and_then(Value::as_map)
                    .cloned()
                    .unwrap_or_default();
                combined.extend(context.flatten());
                dispatcher
                    .make_valid_context(&service, &combined)
                    .map_err(wrap)?
            }
            "" | "false" => ValueMap::new(),
            name => match FieldAccessor::new(name).get(context).and_then(Value::as_map) {
                Some(source) => dispatcher
                    .make_valid_context(&service, source)
                    .map_err(wrap)?,
                None => ValueMap::new(),
            },
        };
        expand_field_maps(&self.field_maps, context, &mut input)?;

        let result = dispatcher.run_sync(&service, input).map_err(wrap)?;

        match &self.result_map_name {
            Some(result_map_name) => {
                let query_string = result.get(QUERY_STRING).cloned().unwrap_or_default();
                let query_string_map = result.get(QUERY_STRING_MAP).cloned().unwrap_or_default();
                result_map_name.put(context, Value::Map(result))?;

                if let Some(qs) = query_string.as_str().filter(|qs| !qs.is_empty()) {
                    context.insert(QUERY_STRING_ENCODED, qs.replace('&', "%26"));
                }
                context.insert(QUERY_STRING, query_string);
                context.insert(QUERY_STRING_MAP, query_string_map);
            }
            None => context.extend(result),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{LocalDispatcher, ServiceDefinition};
    use std::sync::Arc;

    fn env() -> ActionEnv {
        let dispatcher = LocalDispatcher::new()
            .with_service(
                ServiceDefinition::new("findOrders", |input| {
                    let mut out = ValueMap::new();
                    out.insert("echo".into(), Value::Map(input));
                    out.insert("queryString".into(), Value::from("a=1&b=2"));
                    out.insert("queryStringMap".into(), Value::Map(ValueMap::new()));
                    Ok(out)
                })
                .with_in_params(["id", "statusId"]),
            )
            .with_service(ServiceDefinition::new("fails", |_| Err("no such order".to_string())));
        ActionEnv::new().with_dispatcher(Arc::new(dispatcher))
    }

    fn service(attrs: &[(&str, &str)]) -> Service {
        let el = attrs
            .iter()
            .fold(Element::new("service"), |el, (k, v)| el.with_attr(*k, *v));
        Service::from_element(&el).unwrap()
    }

    #[test]
    fn test_result_map_promotes_query_string() {
        let mut ctx = Context::new();
        service(&[("service-name", "findOrders"), ("result-map-name", "result")])
            .run(&mut ctx, &env())
            .unwrap();

        assert!(ctx.get("result").and_then(Value::as_map).is_some());
        assert_eq!(ctx.get("queryString"), Some(&Value::from("a=1&b=2")));
        assert_eq!(ctx.get("queryStringEncoded"), Some(&Value::from("a=1%26b=2")));
        assert!(ctx.get("echo").is_none());
    }

    #[test]
    fn test_named_auto_field_map() {
        let mut ctx = Context::new();
        let mut form = ValueMap::new();
        form.insert("statusId".into(), Value::from("ORDER_HOLD"));
        form.insert("ignored".into(), Value::from("x"));
        ctx.insert("form", form);

        service(&[("service-name", "findOrders"), ("auto-field-map", "form")])
            .run(&mut ctx, &env())
            .unwrap();
        let echo = ctx.get("echo").and_then(Value::as_map).unwrap();
        assert_eq!(echo.len(), 1);
        assert_eq!(echo["statusId"], Value::from("ORDER_HOLD"));
    }

    #[test]
    fn test_empty_name_and_failures() {
        let mut ctx = Context::new();
        let err = service(&[("service-name", "${nothing}")])
            .run(&mut ctx, &env())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Service name was empty, expanded from: ${nothing}"
        );

        let err = service(&[("service-name", "fails")]).run(&mut ctx, &env()).unwrap_err();
        assert!(err.to_string().starts_with("Error calling service with name fails"));
    }
}
