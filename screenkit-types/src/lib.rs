//! Shared types for screenkit
//!
//! This crate provides the dynamic value model that screen actions read from
//! and write into a request context, along with locales, entity values and
//! layered resource-bundle maps.

mod bundle;
mod entity;
mod locale;
mod value;

pub use bundle::{BundleMap, ResourceBundle};
pub use entity::EntityValue;
pub use locale::Locale;
pub use value::{Value, ValueMap};
