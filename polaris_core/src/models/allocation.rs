//! Resource allocation records for the time-allocation committee views.

use serde::{Deserialize, Serialize};

use super::ids::AllocatedBlockId;

/// Observing time of one resource type, granted to an allocated proposal for
/// a given observing mode and grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatedBlock {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AllocatedBlockId>,
    pub resource_type: String,
    pub amount: f64,
    pub mode: String,
    pub grade: String,
}

impl AllocatedBlock {
    pub fn new(
        resource_type: impl Into<String>,
        amount: f64,
        mode: impl Into<String>,
        grade: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            resource_type: resource_type.into(),
            amount,
            mode: mode.into(),
            grade: grade.into(),
        }
    }
}

/// Total observing time for one (mode, grade) pair across a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeGradeTotal {
    pub mode_name: String,
    pub grade_name: String,
    pub total_time: f64,
}

impl ModeGradeTotal {
    pub fn new(mode_name: impl Into<String>, grade_name: impl Into<String>, total_time: f64) -> Self {
        Self {
            mode_name: mode_name.into(),
            grade_name: grade_name.into(),
            total_time,
        }
    }
}
