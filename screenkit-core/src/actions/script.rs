use crate::context::Context;
use crate::definition::Element;
use crate::env::ActionEnv;
use crate::error::{ActionError, DefinitionError};
use crate::script::ScriptTarget;
use tracing::{debug, error};

/// `<script>`: run a script file or a simple method against the context.
#[derive(Debug, Clone)]
pub struct Script {
    location: String,
}

impl Script {
    pub fn from_element(element: &Element) -> Result<Self, DefinitionError> {
        Ok(Self {
            location: element.require_attr("location")?.to_string(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn run(&self, context: &mut Context, env: &ActionEnv) -> Result<(), ActionError> {
        let scripts = env.scripts();
        match scripts.resolve(&self.location) {
            Some(ScriptTarget::Script { kind, runner }) => {
                debug!(location = %self.location, kind, "running script");
                runner.run(&self.location, context).map_err(|source| {
                    error!("Error running {kind} script at location [{}]: {source}", self.location);
                    ActionError::Script {
                        kind: kind.to_string(),
                        location: self.location.clone(),
                        source,
                    }
                })
            }
            Some(ScriptTarget::Method { resource, method }) => {
                let runner = scripts
                    .method_runner()
                    .ok_or(ActionError::MissingCollaborator("simple method runner"))?;
                debug!(resource, method, "running simple method");
                let results = runner
                    .run_method(resource, method, context.flatten())
                    .map_err(|source| ActionError::Script {
                        kind: "simple method".to_string(),
                        location: self.location.clone(),
                        source,
                    })?;
                context.extend(results);
                Ok(())
            }
            None => Err(ActionError::UnsupportedScript(self.location.clone())),
        }
    }
}
