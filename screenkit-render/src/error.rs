//! Error types for the FO view path.

use thiserror::Error;

/// Failures rendering a screen to XSL-FO
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Screen not found: {0}")]
    ScreenNotFound(String),

    #[error("Failed to render template: {0}")]
    Template(#[from] askama::Error),

    #[error("{0}")]
    Screen(String),
}

/// Failures converting XSL-FO into paginated output
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// The engine could not be set up for the requested output.
    /// These are never retried against the error template.
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Transform(String),
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Problems with the response writer/output stream: {0}")]
    Render(#[source] RenderError),

    #[error("Transformer Configuration Error: {0}")]
    Configuration(#[source] TransformError),

    #[error("Unable to transform FO to {content_type}: {source}")]
    Transform {
        content_type: String,
        #[source]
        source: TransformError,
    },
}
