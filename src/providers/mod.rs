pub mod azure;

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::model::work_item::{PatchOutcome, RawWorkItem, WorkItemRef};

/// Remote work item tracking backend.
#[async_trait]
pub trait WorkItemTracker: Send + Sync {
    fn name(&self) -> &str;

    /// References to every work item of the given type, in backend order.
    async fn query_by_type(&self, work_item_type: &str) -> Result<Vec<WorkItemRef>, TrackerError>;

    async fn fetch_by_id(
        &self,
        id: u64,
        project: Option<&str>,
    ) -> Result<RawWorkItem, TrackerError>;

    /// Replace a single field. A non-success status is an outcome, not an error.
    async fn apply_field_patch(
        &self,
        id: u64,
        field_path: &str,
        value: &str,
    ) -> Result<PatchOutcome, TrackerError>;
}
