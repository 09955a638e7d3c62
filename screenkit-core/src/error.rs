//! Error types for screen definitions, actions, and their collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building actions from their definitions
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Action element not supported with name: {0}")]
    UnsupportedAction(String),

    #[error("Condition element not supported with name: {0}")]
    UnsupportedCondition(String),

    #[error("Cannot specify a from-field [{from_field}] and a value [{value}] on the set action in a screen widget")]
    FromFieldAndValue { from_field: String, value: String },

    #[error("Missing required attribute [{attribute}] on <{tag}>")]
    MissingAttribute { tag: String, attribute: String },

    #[error("Invalid value [{value}] for attribute [{attribute}] on <{tag}>")]
    InvalidAttribute {
        tag: String,
        attribute: String,
        value: String,
    },

    #[error("Failed to read screen definition: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse screen definition YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse screen definition JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors writing through a field path
#[derive(Debug, Error, PartialEq)]
pub enum ContextError {
    #[error("Field path is empty")]
    EmptyPath,

    #[error("Cannot write [{path}]: segment [{segment}] lands on a {found}, not a container")]
    NotAContainer {
        path: String,
        segment: String,
        found: &'static str,
    },

    #[error("Cannot write [{path}]: index {index} is past the end of a list of {len}")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
}

/// Errors coercing a value to a declared type
#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("Conversion to type [{0}] is not supported")]
    Unsupported(String),

    #[error("Cannot convert {from} [{value}] to {to}")]
    Invalid {
        from: &'static str,
        to: String,
        value: String,
    },
}

/// Errors loading resource bundles
#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("Resource bundle not found: {resource} (locale {locale})")]
    NotFound { resource: String, locale: String },

    #[error("Failed to read properties file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by a service dispatcher
#[derive(Debug, Error, PartialEq)]
pub enum ServiceError {
    #[error("Service not found: {0}")]
    NotFound(String),

    #[error("Service [{service}] failed: {message}")]
    Failed { service: String, message: String },
}

/// Errors reported by script and simple-method runners
#[derive(Debug, Error, PartialEq)]
pub enum ScriptError {
    #[error("Script not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Failed(String),
}

/// Errors reported by the entity layer
#[derive(Debug, Error, PartialEq)]
pub enum EntityError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Unknown relation [{relation}] on entity {entity}")]
    UnknownRelation { entity: String, relation: String },

    #[error("Entity query failed: {0}")]
    Query(String),
}

/// Errors raised while running a declarative finder
#[derive(Debug, Error)]
pub enum FinderError {
    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// A run-time failure inside one action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Could not convert field value for the field: [{field}] to the [{type_name}] type for the value [{value}]: {source}")]
    Conversion {
        field: String,
        type_name: String,
        value: String,
        #[source]
        source: ConversionError,
    },

    #[error("Service name was empty, expanded from: {0}")]
    EmptyServiceName(String),

    #[error("Error calling service with name {service}: {source}")]
    Service {
        service: String,
        #[source]
        source: ServiceError,
    },

    #[error("Error running {kind} script at location [{location}]: {source}")]
    Script {
        kind: String,
        location: String,
        #[source]
        source: ScriptError,
    },

    #[error("For screen script actions the script type is not yet supported for location: [{0}]")]
    UnsupportedScript(String),

    #[error("Error doing entity query by {strategy}: {source}")]
    Finder {
        strategy: &'static str,
        #[source]
        source: FinderError,
    },

    #[error("Env variable for value-name {value_name} is not an entity value; for the relation-name: {relation_name}")]
    NotAnEntity {
        value_name: String,
        relation_name: String,
    },

    #[error("Problem getting {target} from entity with name {entity_name} for the relation-name: {relation_name}: {source}")]
    Relation {
        target: &'static str,
        entity_name: String,
        relation_name: String,
        #[source]
        source: EntityError,
    },

    #[error("Could not load property resource [{resource}]: {source}")]
    Property {
        resource: String,
        #[source]
        source: PropertyError,
    },

    #[error("Value at [{map_name}] is a {found}, not a property map")]
    NotABundle {
        map_name: String,
        found: &'static str,
    },

    #[error("No {0} is available to this action")]
    MissingCollaborator(&'static str),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// The uniform failure of an action list: which action failed, and why.
#[derive(Debug, Error)]
#[error("Screen action #{index} <{tag}> failed: {source}")]
pub struct ActionFailed {
    pub index: usize,
    pub tag: &'static str,
    #[source]
    pub source: ActionError,
}

pub type Result<T> = std::result::Result<T, ActionError>;
