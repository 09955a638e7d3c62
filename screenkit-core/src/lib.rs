//! # screenkit-core
//!
//! Core library for the screenkit screen action engine.
//!
//! This crate provides the request context, field accessors and string
//! expanders, the declarative screen actions that populate a context, and
//! the capability traits (services, entities, scripts, properties, scoped
//! stores) those actions call out to.

pub mod accessor;
pub mod actions;
pub mod config;
pub mod context;
pub mod convert;
pub mod definition;
pub mod entity;
pub mod env;
pub mod error;
pub mod expander;
pub mod field_map;
pub mod finder;
pub mod properties;
pub mod scope;
pub mod script;
pub mod service;

pub use accessor::FieldAccessor;
pub use actions::{ActionList, ScreenAction};
pub use config::Config;
pub use context::{keys, Context, FieldStore};
pub use definition::{Element, ScreenDefinition};
pub use entity::{Delegator, EntityCondition, EntityQuery};
pub use env::ActionEnv;
pub use error::{ActionError, ActionFailed, DefinitionError};
pub use expander::Expander;
pub use properties::{FilePropertySource, MemoryPropertySource, PropertySource};
pub use scope::{MemoryStore, ScopedStore};
pub use script::{MethodRunner, ScriptRegistry, ScriptRunner};
pub use service::{LocalDispatcher, ServiceDefinition, ServiceDispatcher};

pub use screenkit_types::{BundleMap, EntityValue, Locale, ResourceBundle, Value, ValueMap};
