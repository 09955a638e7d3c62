//! Service dispatch.

use crate::error::ServiceError;
use parking_lot::RwLock;
use screenkit_types::ValueMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Runs named services synchronously.
pub trait ServiceDispatcher: Send + Sync {
    /// Keep only the entries of `source` that `service` declares as input.
    fn make_valid_context(
        &self,
        service: &str,
        source: &ValueMap,
    ) -> Result<ValueMap, ServiceError>;

    fn run_sync(&self, service: &str, input: ValueMap) -> Result<ValueMap, ServiceError>;
}

type Handler = Arc<dyn Fn(ValueMap) -> Result<ValueMap, String> + Send + Sync>;

/// An in-process service: its input parameters and implementation
#[derive(Clone)]
pub struct ServiceDefinition {
    pub name: String,
    pub in_params: Vec<String>,
    handler: Handler,
}

impl ServiceDefinition {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ValueMap) -> Result<ValueMap, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            in_params: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn with_in_params<I: IntoIterator<Item = S>, S: Into<String>>(mut self, params: I) -> Self {
        self.in_params = params.into_iter().map(Into::into).collect();
        self
    }

}

impl fmt::Debug for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDefinition")
            .field("name", &self.name)
            .field("in_params", &self.in_params)
            .finish()
    }
}

/// A registry of in-process services.
#[derive(Default)]
pub struct LocalDispatcher {
    services: RwLock<HashMap<String, ServiceDefinition>>,
}

impl LocalDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, service: ServiceDefinition) {
        self.services.write().insert(service.name.clone(), service);
    }

    pub fn with_service(self, service: ServiceDefinition) -> Self {
        self.register(service);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.read().contains_key(name)
    }

    fn lookup(&self, name: &str) -> Result<ServiceDefinition, ServiceError> {
        self.services
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(name.to_string()))
    }
}

impl ServiceDispatcher for LocalDispatcher {
    fn make_valid_context(
        &self,
        service: &str,
        source: &ValueMap,
    ) -> Result<ValueMap, ServiceError> {
        let def = self.lookup(service)?;
        Ok(def
            .in_params
            .iter()
            .filter_map(|p| source.get(p).map(|v| (p.clone(), v.clone())))
            .collect())
    }

    fn run_sync(&self, service: &str, input: ValueMap) -> Result<ValueMap, ServiceError> {
        let def = self.lookup(service)?;
        (def.handler)(input).map_err(|message| ServiceError::Failed {
            service: service.to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenkit_types::Value;

    fn echo() -> ServiceDefinition {
        ServiceDefinition::new("echo", |input| Ok(input))
            .with_in_params(["id", "name"])
    }

    #[test]
    fn test_make_valid_context_filters_params() {
        let dispatcher = LocalDispatcher::new().with_service(echo());
        let mut source = ValueMap::new();
        source.insert("id".into(), Value::from("7"));
        source.insert("junk".into(), Value::from("x"));
        source.insert("result".into(), Value::from("r"));

        let valid = dispatcher.make_valid_context("echo", &source).unwrap();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid.get("id"), Some(&Value::from("7")));
        assert!(valid.get("result").is_none());
    }

    #[test]
    fn test_unknown_and_failing_services() {
        let dispatcher = LocalDispatcher::new()
            .with_service(ServiceDefinition::new("boom", |_| Err("kaput".to_string())));

        assert_eq!(
            dispatcher.run_sync("missing", ValueMap::new()),
            Err(ServiceError::NotFound("missing".to_string()))
        );
        assert_eq!(
            dispatcher.run_sync("boom", ValueMap::new()),
            Err(ServiceError::Failed {
                service: "boom".to_string(),
                message: "kaput".to_string(),
            })
        );
    }
}
