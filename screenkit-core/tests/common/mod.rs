//! Shared fakes for the integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use screenkit_core::entity::{ComparisonOperator, EntityCondition, JoinOperator};
use screenkit_core::error::EntityError;
use screenkit_core::{Delegator, EntityQuery, EntityValue, Value, ValueMap};
use std::collections::HashMap;

/// An in-memory entity store that records the queries it receives
#[derive(Default)]
pub struct FakeDelegator {
    pub rows: HashMap<String, Vec<EntityValue>>,
    pub primary_keys: HashMap<String, Vec<String>>,
    /// relation name -> related values
    pub relations: HashMap<String, Vec<EntityValue>>,
    pub queries: Mutex<Vec<EntityQuery>>,
    pub lookups: Mutex<Vec<ValueMap>>,
}

impl FakeDelegator {
    pub fn with_rows(mut self, entity: &str, pk: &[&str], rows: Vec<EntityValue>) -> Self {
        self.rows.insert(entity.to_string(), rows);
        self.primary_keys
            .insert(entity.to_string(), pk.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_relation(mut self, relation: &str, values: Vec<EntityValue>) -> Self {
        self.relations.insert(relation.to_string(), values);
        self
    }

    pub fn last_query(&self) -> Option<EntityQuery> {
        self.queries.lock().last().cloned()
    }
}

fn matches(value: &EntityValue, condition: &EntityCondition) -> bool {
    match condition {
        EntityCondition::Expr {
            field,
            operator,
            value: expected,
            ..
        } => {
            let actual = value.get(field).cloned().unwrap_or(Value::Null);
            match operator {
                ComparisonOperator::Equals => &actual == expected,
                ComparisonOperator::NotEquals => &actual != expected,
                ComparisonOperator::In => expected
                    .as_list()
                    .is_some_and(|items| items.contains(&actual)),
                _ => true,
            }
        }
        EntityCondition::List { join, conditions } => match join {
            JoinOperator::And => conditions.iter().all(|c| matches(value, c)),
            JoinOperator::Or => conditions.iter().any(|c| matches(value, c)),
        },
    }
}

impl Delegator for FakeDelegator {
    fn primary_key_fields(&self, entity: &str) -> Result<Vec<String>, EntityError> {
        self.primary_keys
            .get(entity)
            .cloned()
            .ok_or_else(|| EntityError::UnknownEntity(entity.to_string()))
    }

    fn find_one(
        &self,
        entity: &str,
        primary_key: &ValueMap,
        _use_cache: bool,
    ) -> Result<Option<EntityValue>, EntityError> {
        self.lookups.lock().push(primary_key.clone());
        let rows = self
            .rows
            .get(entity)
            .ok_or_else(|| EntityError::UnknownEntity(entity.to_string()))?;
        Ok(rows
            .iter()
            .find(|row| primary_key.iter().all(|(k, v)| row.get(k) == Some(v)))
            .cloned())
    }

    fn find_list(&self, query: &EntityQuery) -> Result<Vec<EntityValue>, EntityError> {
        self.queries.lock().push(query.clone());
        let rows = self
            .rows
            .get(&query.entity_name)
            .ok_or_else(|| EntityError::UnknownEntity(query.entity_name.clone()))?;
        Ok(rows
            .iter()
            .filter(|row| query.condition.as_ref().map_or(true, |c| matches(row, c)))
            .cloned()
            .collect())
    }

    fn related_one(
        &self,
        value: &EntityValue,
        relation: &str,
        _use_cache: bool,
    ) -> Result<Option<EntityValue>, EntityError> {
        self.relations
            .get(relation)
            .map(|values| values.first().cloned())
            .ok_or_else(|| EntityError::UnknownRelation {
                entity: value.entity_name().to_string(),
                relation: relation.to_string(),
            })
    }

    fn related(
        &self,
        value: &EntityValue,
        relation: &str,
        by_and: Option<&ValueMap>,
        _order_by: &[String],
        _use_cache: bool,
    ) -> Result<Vec<EntityValue>, EntityError> {
        let values = self
            .relations
            .get(relation)
            .ok_or_else(|| EntityError::UnknownRelation {
                entity: value.entity_name().to_string(),
                relation: relation.to_string(),
            })?;
        Ok(values
            .iter()
            .filter(|v| by_and.map_or(true, |m| m.iter().all(|(k, x)| v.get(k) == Some(x))))
            .cloned()
            .collect())
    }
}
