//! Entity queries and the delegator capability.

use crate::error::EntityError;
use screenkit_types::{EntityValue, Value, ValueMap};
use std::fmt;

/// Comparison used by a condition expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanEqualTo,
    GreaterThanEqualTo,
    In,
    NotIn,
    Between,
    Like,
    NotLike,
}

impl ComparisonOperator {
    const ALL: [ComparisonOperator; 11] = [
        Self::Equals,
        Self::NotEquals,
        Self::LessThan,
        Self::GreaterThan,
        Self::LessThanEqualTo,
        Self::GreaterThanEqualTo,
        Self::In,
        Self::NotIn,
        Self::Between,
        Self::Like,
        Self::NotLike,
    ];

    /// Parse an operator attribute; empty means `equals`.
    pub fn parse(name: &str) -> Option<Self> {
        if name.is_empty() {
            return Some(Self::Equals);
        }
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not-equals",
            Self::LessThan => "less-than",
            Self::GreaterThan => "greater-than",
            Self::LessThanEqualTo => "less-than-equal-to",
            Self::GreaterThanEqualTo => "greater-than-equal-to",
            Self::In => "in",
            Self::NotIn => "not-in",
            Self::Between => "between",
            Self::Like => "like",
            Self::NotLike => "not-like",
        }
    }

    /// Operators whose right-hand side is a collection
    pub fn takes_list(self) -> bool {
        matches!(self, Self::In | Self::NotIn | Self::Between)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinOperator {
    #[default]
    And,
    Or,
}

impl JoinOperator {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "" | "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

/// A resolved condition tree, ready for the delegator
#[derive(Debug, Clone, PartialEq)]
pub enum EntityCondition {
    Expr {
        field: String,
        operator: ComparisonOperator,
        value: Value,
        ignore_case: bool,
    },
    List {
        join: JoinOperator,
        conditions: Vec<EntityCondition>,
    },
}

impl EntityCondition {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Expr {
            field: field.into(),
            operator: ComparisonOperator::Equals,
            value: value.into(),
            ignore_case: false,
        }
    }

    /// `field = value` for every entry, joined with AND, in key order
    pub fn and_map(fields: &ValueMap) -> Self {
        let mut keys: Vec<&String> = fields.keys().collect();
        keys.sort();
        Self::List {
            join: JoinOperator::And,
            conditions: keys
                .into_iter()
                .map(|k| Self::equals(k.clone(), fields[k].clone()))
                .collect(),
        }
    }
}

/// A list query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityQuery {
    pub entity_name: String,
    pub condition: Option<EntityCondition>,
    /// Fields to return; empty means all
    pub select: Vec<String>,
    pub order_by: Vec<String>,
    pub use_cache: bool,
    pub distinct: bool,
    /// Keep only rows whose `fromDate`/`thruDate` range covers now
    pub filter_by_date: bool,
}

impl EntityQuery {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Default::default()
        }
    }
}

/// Access to the entity engine.
pub trait Delegator: Send + Sync {
    /// Names of the primary key fields of `entity`
    fn primary_key_fields(&self, entity: &str) -> Result<Vec<String>, EntityError>;

    fn find_one(
        &self,
        entity: &str,
        primary_key: &ValueMap,
        use_cache: bool,
    ) -> Result<Option<EntityValue>, EntityError>;

    fn find_list(&self, query: &EntityQuery) -> Result<Vec<EntityValue>, EntityError>;

    fn related_one(
        &self,
        value: &EntityValue,
        relation: &str,
        use_cache: bool,
    ) -> Result<Option<EntityValue>, EntityError>;

    /// Related values, optionally narrowed by equality on `by_and` and sorted
    fn related(
        &self,
        value: &EntityValue,
        relation: &str,
        by_and: Option<&ValueMap>,
        order_by: &[String],
        use_cache: bool,
    ) -> Result<Vec<EntityValue>, EntityError>;
}
