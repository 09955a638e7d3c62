//! # screenkit-render
//!
//! XSL-FO view handling for screenkit.
//!
//! A screen is rendered to XSL-FO by a [`ScreenRenderer`] and handed to a
//! [`FormattingEngine`] that produces PDF, PCL or PostScript. A failed
//! transform falls back to an error screen once.

pub mod error;
pub mod format;
pub mod templates;
pub mod view;

pub use error::{RenderError, TransformError, ViewError};
pub use format::OutputFormat;
pub use templates::{FoErrorTemplate, WithErrorScreen, ERROR_MESSAGE_KEY};
pub use view::{
    FoViewHandler, FormattingEngine, RenderRequest, RenderedView, RequestPopulator,
    ScreenRenderer, DEFAULT_ERROR_TEMPLATE,
};
