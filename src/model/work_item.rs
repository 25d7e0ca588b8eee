use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FIELD_TITLE: &str = "System.Title";
pub const FIELD_DESCRIPTION: &str = "System.Description";
pub const FIELD_WORK_ITEM_TYPE: &str = "System.WorkItemType";
pub const FIELD_ACCEPTANCE_CRITERIA: &str = "Microsoft.VSTS.Common.AcceptanceCriteria";

pub const USER_STORY: &str = "User Story";

/// Public shape of a user story returned by `GET /workitems`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: u64,
    pub title: String,
    pub description: String,
    #[serde(rename = "workItemType")]
    pub work_item_type: String,
    pub acceptance_criteria: String,
}

/// Lightweight reference returned by a WIQL query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WorkItemRef {
    pub id: u64,
}

/// A work item as the backend returns it: field paths mapped to raw JSON values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWorkItem {
    pub id: u64,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl RawWorkItem {
    /// Field value, treating JSON null the same as a missing key.
    pub fn field(&self, path: &str) -> Option<&Value> {
        self.fields.get(path).filter(|v| !v.is_null())
    }

    /// True when the field is missing, null, or an empty string.
    pub fn is_blank(&self, path: &str) -> bool {
        match self.field(path) {
            None => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        }
    }
}

/// Result of sending a field patch to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    Rejected { status: u16, body: String },
}
