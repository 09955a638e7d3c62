//! Script and simple-method runners.
//!
//! Scripts are picked by the file suffix of their location. A location of
//! the form `component://.../Methods.xml#methodName` names a simple method
//! instead: it runs against a copy of the context and hands back a result
//! map.

use crate::context::Context;
use crate::error::ScriptError;
use screenkit_types::ValueMap;
use std::fmt;
use std::sync::Arc;

/// Runs a script file against the live context
pub trait ScriptRunner: Send + Sync {
    fn run(&self, location: &str, context: &mut Context) -> Result<(), ScriptError>;
}

impl<F> ScriptRunner for F
where
    F: Fn(&str, &mut Context) -> Result<(), ScriptError> + Send + Sync,
{
    fn run(&self, location: &str, context: &mut Context) -> Result<(), ScriptError> {
        self(location, context)
    }
}

/// Runs a method defined in an XML method file
pub trait MethodRunner: Send + Sync {
    fn run_method(
        &self,
        resource: &str,
        method: &str,
        context: ValueMap,
    ) -> Result<ValueMap, ScriptError>;
}

impl<F> MethodRunner for F
where
    F: Fn(&str, &str, ValueMap) -> Result<ValueMap, ScriptError> + Send + Sync,
{
    fn run_method(
        &self,
        resource: &str,
        method: &str,
        context: ValueMap,
    ) -> Result<ValueMap, ScriptError> {
        self(resource, method, context)
    }
}

#[derive(Clone)]
struct Registration {
    suffix: String,
    kind: String,
    runner: Arc<dyn ScriptRunner>,
}

/// How a script location resolved
pub enum ScriptTarget<'a> {
    Script {
        kind: &'a str,
        runner: &'a Arc<dyn ScriptRunner>,
    },
    Method {
        resource: &'a str,
        method: &'a str,
    },
}

/// Script runners keyed by file suffix, plus an optional method runner.
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    runners: Vec<Registration>,
    method_runner: Option<Arc<dyn MethodRunner>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `runner` for locations ending in `suffix` (`.groovy`).
    /// Later registrations for the same suffix replace earlier ones.
    pub fn with_runner(
        mut self,
        suffix: impl Into<String>,
        kind: impl Into<String>,
        runner: Arc<dyn ScriptRunner>,
    ) -> Self {
        let suffix = suffix.into();
        self.runners.retain(|r| r.suffix != suffix);
        self.runners.push(Registration {
            suffix,
            kind: kind.into(),
            runner,
        });
        self
    }

    pub fn with_method_runner(mut self, runner: Arc<dyn MethodRunner>) -> Self {
        self.method_runner = Some(runner);
        self
    }

    pub fn method_runner(&self) -> Option<&Arc<dyn MethodRunner>> {
        self.method_runner.as_ref()
    }

    pub fn resolve<'a>(&'a self, location: &'a str) -> Option<ScriptTarget<'a>> {
        if let Some(reg) = self.runners.iter().find(|r| location.ends_with(&r.suffix)) {
            return Some(ScriptTarget::Script {
                kind: &reg.kind,
                runner: &reg.runner,
            });
        }
        if location.contains(".xml#") {
            let (resource, method) = crate::definition::split_combined(location);
            return Some(ScriptTarget::Method { resource, method });
        }
        None
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<_> = self
            .runners
            .iter()
            .map(|r| format!("{}={}", r.suffix, r.kind))
            .collect();
        f.debug_struct("ScriptRegistry")
            .field("runners", &kinds)
            .field("method_runner", &self.method_runner.is_some())
            .finish()
    }
}
