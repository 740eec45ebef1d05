//! Restriction metadata for API serializers.

use crate::error::BlueprintError;
use crate::model::Restrictions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of a blueprint relationship the requesting course is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseRole {
    Master,
    Child,
}

impl fmt::Display for CourseRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseRole::Master => f.write_str("master"),
            CourseRole::Child => f.write_str("child"),
        }
    }
}

impl FromStr for CourseRole {
    type Err = BlueprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master" => Ok(CourseRole::Master),
            "child" => Ok(CourseRole::Child),
            other => Err(BlueprintError::InvalidArgument(format!(
                "invalid course role: {}",
                other
            ))),
        }
    }
}

/// Serializes to `{}` when the item plays no part in the requested role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestrictionSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_master_course_child_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_master_course_master_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted_by_master_course: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_course_restrictions: Option<Restrictions>,
}

impl RestrictionSummary {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn child(restricted: bool, restrictions: &Restrictions) -> Self {
        Self {
            is_master_course_child_content: Some(true),
            restricted_by_master_course: Some(restricted),
            master_course_restrictions: restricted.then(|| restrictions.clone()),
            ..Self::default()
        }
    }

    pub fn master(restrictions: &Restrictions) -> Self {
        let restricted = restrictions.any_locked();
        Self {
            is_master_course_master_content: Some(true),
            restricted_by_master_course: Some(restricted),
            master_course_restrictions: restricted.then(|| restrictions.clone()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::none()
    }
}
