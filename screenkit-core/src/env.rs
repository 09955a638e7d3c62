//! Collaborators injected into each action run.

use crate::entity::Delegator;
use crate::error::ActionError;
use crate::properties::PropertySource;
use crate::scope::ScopedStore;
use crate::script::ScriptRegistry;
use crate::service::ServiceDispatcher;
use std::fmt;
use std::sync::Arc;

/// The external services an action list may call.
///
/// Every collaborator is optional; an action that needs a missing one fails
/// with [`ActionError::MissingCollaborator`]. Cloning shares the handles.
#[derive(Clone, Default)]
pub struct ActionEnv {
    session: Option<Arc<dyn ScopedStore>>,
    application: Option<Arc<dyn ScopedStore>>,
    dispatcher: Option<Arc<dyn ServiceDispatcher>>,
    delegator: Option<Arc<dyn Delegator>>,
    properties: Option<Arc<dyn PropertySource>>,
    scripts: ScriptRegistry,
}

impl ActionEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, store: Arc<dyn ScopedStore>) -> Self {
        self.session = Some(store);
        self
    }

    pub fn with_application(mut self, store: Arc<dyn ScopedStore>) -> Self {
        self.application = Some(store);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn ServiceDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn with_delegator(mut self, delegator: Arc<dyn Delegator>) -> Self {
        self.delegator = Some(delegator);
        self
    }

    pub fn with_properties(mut self, properties: Arc<dyn PropertySource>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_scripts(mut self, scripts: ScriptRegistry) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn session(&self) -> Result<&dyn ScopedStore, ActionError> {
        self.session
            .as_deref()
            .ok_or(ActionError::MissingCollaborator("session store"))
    }

    pub fn application(&self) -> Result<&dyn ScopedStore, ActionError> {
        self.application
            .as_deref()
            .ok_or(ActionError::MissingCollaborator("application store"))
    }

    pub fn dispatcher(&self) -> Result<&dyn ServiceDispatcher, ActionError> {
        self.dispatcher
            .as_deref()
            .ok_or(ActionError::MissingCollaborator("service dispatcher"))
    }

    pub fn delegator(&self) -> Result<&dyn Delegator, ActionError> {
        self.delegator
            .as_deref()
            .ok_or(ActionError::MissingCollaborator("entity delegator"))
    }

    pub fn properties(&self) -> Result<&dyn PropertySource, ActionError> {
        self.properties
            .as_deref()
            .ok_or(ActionError::MissingCollaborator("property source"))
    }

    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }
}

impl fmt::Debug for ActionEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEnv")
            .field("session", &self.session.is_some())
            .field("application", &self.application.is_some())
            .field("dispatcher", &self.dispatcher.is_some())
            .field("delegator", &self.delegator.is_some())
            .field("properties", &self.properties.is_some())
            .field("scripts", &self.scripts)
            .finish()
    }
}
