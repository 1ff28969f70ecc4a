//! Data-dependent predicates attached to role grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Action;

const SECONDS_PER_DAY: i64 = 86_400;

/// Facts about the resource instance being acted on, supplied by the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityContext {
    pub created_at: DateTime<Utc>,
}

impl EntityContext {
    pub fn created_at(created_at: DateTime<Utc>) -> Self {
        Self { created_at }
    }

    /// Whole days elapsed since creation, floored (a record created in the
    /// future yields a negative count).
    pub fn days_since_creation(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at)
            .num_seconds()
            .div_euclid(SECONDS_PER_DAY)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
}

impl ComparisonOperator {
    /// Accepts symbolic, short and long spellings. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let op = match raw.trim().to_ascii_lowercase().as_str() {
            "<" | "lt" | "less_than" => ComparisonOperator::LessThan,
            "<=" | "lte" | "less_than_or_equal" | "less_than_or_equals" => {
                ComparisonOperator::LessThanOrEqual
            }
            ">" | "gt" | "greater_than" => ComparisonOperator::GreaterThan,
            ">=" | "gte" | "greater_than_or_equal" | "greater_than_or_equals" => {
                ComparisonOperator::GreaterThanOrEqual
            }
            "==" | "=" | "eq" | "equal" | "equals" => ComparisonOperator::Equal,
            _ => return None,
        };
        Some(op)
    }

    pub fn compare(self, lhs: i64, rhs: i64) -> bool {
        match self {
            ComparisonOperator::LessThan => lhs < rhs,
            ComparisonOperator::LessThanOrEqual => lhs <= rhs,
            ComparisonOperator::GreaterThan => lhs > rhs,
            ComparisonOperator::GreaterThanOrEqual => lhs >= rhs,
            ComparisonOperator::Equal => lhs == rhs,
        }
    }
}

/// Closed set of grant conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintPredicate {
    /// Restricts `action` by the age of the target record, in whole days.
    TimeRelativeToCreation {
        action: Action,
        operator: ComparisonOperator,
        threshold_days: i64,
    },
}

/// Why a constraint did not hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintOutcome {
    Satisfied,
    ActionMismatch,
    MissingEntityContext,
    Failed,
}

impl ConstraintPredicate {
    pub fn action(&self) -> Action {
        match self {
            ConstraintPredicate::TimeRelativeToCreation { action, .. } => *action,
        }
    }

    pub fn check(
        &self,
        required: Action,
        entity: Option<&EntityContext>,
        now: DateTime<Utc>,
    ) -> ConstraintOutcome {
        match self {
            ConstraintPredicate::TimeRelativeToCreation {
                action,
                operator,
                threshold_days,
            } => {
                if *action != required {
                    return ConstraintOutcome::ActionMismatch;
                }
                let Some(entity) = entity else {
                    return ConstraintOutcome::MissingEntityContext;
                };
                if operator.compare(entity.days_since_creation(now), *threshold_days) {
                    ConstraintOutcome::Satisfied
                } else {
                    ConstraintOutcome::Failed
                }
            }
        }
    }
}
