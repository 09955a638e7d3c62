//! The FO view handler: screen → XSL-FO → paginated bytes.

use crate::error::{RenderError, TransformError, ViewError};
use crate::format::OutputFormat;
use crate::templates::ERROR_MESSAGE_KEY;
use screenkit_core::config::RenderConfig;
use screenkit_core::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

pub const DEFAULT_ERROR_TEMPLATE: &str = "component://common/widget/CommonScreens.xml#FoError";

/// Renders a screen location into XSL-FO text
pub trait ScreenRenderer: Send + Sync {
    fn render(
        &self,
        location: &str,
        context: &mut Context,
        out: &mut String,
    ) -> Result<(), RenderError>;
}

/// Converts XSL-FO into one of the paginated output formats
pub trait FormattingEngine: Send + Sync {
    fn transform(
        &self,
        fo: &str,
        format: OutputFormat,
        out: &mut Vec<u8>,
    ) -> Result<(), TransformError>;

    /// Drop any images the engine cached while transforming
    fn clear_image_cache(&self);
}

/// Fills a fresh context with whatever the incoming request carries
pub trait RequestPopulator {
    fn populate(&self, context: &mut Context);
}

impl<F> RequestPopulator for F
where
    F: Fn(&mut Context),
{
    fn populate(&self, context: &mut Context) {
        self(context)
    }
}

/// The view being asked for
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderRequest {
    pub name: String,
    /// Screen location rendered to FO
    pub page: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl RenderRequest {
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    pub content_type: String,
    pub encoding: Option<String>,
    pub body: Vec<u8>,
}

pub struct FoViewHandler {
    renderer: Arc<dyn ScreenRenderer>,
    engine: Arc<dyn FormattingEngine>,
    default_content_type: String,
    error_template: String,
}

impl FoViewHandler {
    pub fn new(renderer: Arc<dyn ScreenRenderer>, engine: Arc<dyn FormattingEngine>) -> Self {
        Self {
            renderer,
            engine,
            default_content_type: OutputFormat::DEFAULT_MIME.to_string(),
            error_template: DEFAULT_ERROR_TEMPLATE.to_string(),
        }
    }

    pub fn from_config(
        renderer: Arc<dyn ScreenRenderer>,
        engine: Arc<dyn FormattingEngine>,
        config: &RenderConfig,
    ) -> Self {
        Self {
            renderer,
            engine,
            default_content_type: config.default_content_type.clone(),
            error_template: config.error_template.clone(),
        }
    }

    pub fn with_error_template(mut self, location: impl Into<String>) -> Self {
        self.error_template = location.into();
        self
    }

    pub fn error_template(&self) -> &str {
        &self.error_template
    }

    /// Render `request.page` to FO and transform it into the requested format.
    ///
    /// A failed transform is retried once against the error template with
    /// `errorMessage` set in a freshly populated context. If that also
    /// fails, the original transform error is returned.
    pub fn render(
        &self,
        request: &RenderRequest,
        populator: &dyn RequestPopulator,
    ) -> Result<RenderedView, ViewError> {
        let content_type = match request.content_type.as_deref() {
            Some(ct) if !ct.trim().is_empty() => ct.to_string(),
            _ => self.default_content_type.clone(),
        };
        let format = OutputFormat::from_mime(&content_type)
            .ok_or_else(|| ViewError::UnsupportedContentType(content_type.clone()))?;

        let fo = self
            .render_fo(&request.page, populator, None)
            .map_err(ViewError::Render)?;
        debug!("Transforming the following xsl-fo template: {fo}");

        let mut body = Vec::new();
        let outcome = match self.engine.transform(&fo, format, &mut body) {
            Ok(()) => Ok(()),
            Err(e @ TransformError::Configuration(_)) => {
                error!("FOP TransformerConfiguration Exception {e}");
                Err(ViewError::Configuration(e))
            }
            Err(e) => {
                error!("FOP transform failed: {e}");
                info!(
                    "Rendering the error message using the default error template: {}",
                    self.error_template
                );
                self.render_error_page(&e, format, populator)
                    .map(|fallback| body = fallback)
                    .map_err(|_| ViewError::Transform {
                        content_type: content_type.clone(),
                        source: e,
                    })
            }
        };

        self.engine.clear_image_cache();
        outcome?;

        Ok(RenderedView {
            content_type,
            encoding: request.encoding.clone(),
            body,
        })
    }

    fn render_fo(
        &self,
        location: &str,
        populator: &dyn RequestPopulator,
        error_message: Option<&str>,
    ) -> Result<String, RenderError> {
        let mut context = Context::new();
        populator.populate(&mut context);
        if let Some(message) = error_message {
            context.insert(ERROR_MESSAGE_KEY, message);
        }
        let mut fo = String::new();
        self.renderer.render(location, &mut context, &mut fo)?;
        Ok(fo)
    }

    fn render_error_page(
        &self,
        cause: &TransformError,
        format: OutputFormat,
        populator: &dyn RequestPopulator,
    ) -> Result<Vec<u8>, ViewError> {
        let fo = self
            .render_fo(&self.error_template, populator, Some(&cause.to_string()))
            .map_err(ViewError::Render)?;
        let mut body = Vec::new();
        self.engine
            .transform(&fo, format, &mut body)
            .map_err(|source| ViewError::Transform {
                content_type: format.mime().to_string(),
                source,
            })?;
        Ok(body)
    }
}
