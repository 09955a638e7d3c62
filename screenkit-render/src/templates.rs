//! Built-in XSL-FO templates.

use crate::error::RenderError;
use crate::view::ScreenRenderer;
use askama::Template;
use screenkit_core::{Context, Value};
use std::sync::Arc;
use tracing::debug;

/// Context key the view handler stores the transform failure under
pub const ERROR_MESSAGE_KEY: &str = "errorMessage";

/// Single page FO document reporting a failed transform
#[derive(Template)]
#[template(path = "fo_error.xml")]
pub struct FoErrorTemplate {
    pub title: String,
    pub error_message: String,
}

impl FoErrorTemplate {
    pub fn from_context(context: &Context) -> Self {
        Self {
            title: String::from("Error rendering document"),
            error_message: context
                .get(ERROR_MESSAGE_KEY)
                .map(Value::to_string)
                .unwrap_or_default(),
        }
    }
}

/// Wraps a renderer so the error template location always resolves.
///
/// Requests for `location` go to the inner renderer first; when it has no
/// such screen, [`FoErrorTemplate`] is rendered instead.
pub struct WithErrorScreen {
    inner: Arc<dyn ScreenRenderer>,
    location: String,
}

impl WithErrorScreen {
    pub fn new(inner: Arc<dyn ScreenRenderer>, location: impl Into<String>) -> Self {
        Self {
            inner,
            location: location.into(),
        }
    }
}

impl ScreenRenderer for WithErrorScreen {
    fn render(
        &self,
        location: &str,
        context: &mut Context,
        out: &mut String,
    ) -> Result<(), RenderError> {
        if location != self.location {
            return self.inner.render(location, context, out);
        }

        let start = out.len();
        match self.inner.render(location, context, out) {
            Err(RenderError::ScreenNotFound(_)) => {
                debug!("No screen at {location}, using the built-in FO error page");
                out.truncate(start);
                out.push_str(&FoErrorTemplate::from_context(context).render()?);
                Ok(())
            }
            other => other,
        }
    }
}
