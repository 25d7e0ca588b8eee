use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::WorkItemTracker;
use crate::config::AzureConfig;
use crate::error::TrackerError;
use crate::model::work_item::{PatchOutcome, RawWorkItem, WorkItemRef};

const API_VERSION: &str = "7.1";

pub struct AzureDevOpsTracker {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl AzureDevOpsTracker {
    pub fn new(config: &AzureConfig) -> Result<Self, TrackerError> {
        // PATs go in the password slot with an empty user name.
        let creds = format!(":{}", config.personal_access_token);
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs()))
            .build()?;
        Ok(Self {
            base_url: config.organization_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {encoded}"),
            client,
        })
    }

    fn wiql_url(&self) -> String {
        format!("{}/_apis/wit/wiql?api-version={API_VERSION}", self.base_url)
    }

    fn work_item_url(&self, id: u64, project: Option<&str>) -> String {
        match project.filter(|p| !p.is_empty()) {
            Some(p) => format!(
                "{}/{}/_apis/wit/workitems/{id}?api-version={API_VERSION}",
                self.base_url,
                urlencoding::encode(p)
            ),
            None => format!(
                "{}/_apis/wit/workitems/{id}?api-version={API_VERSION}",
                self.base_url
            ),
        }
    }
}

/// WIQL selecting every work item of one type. Single quotes are doubled.
pub fn wiql_for_type(work_item_type: &str) -> String {
    format!(
        "SELECT [System.Id] FROM WorkItems WHERE [System.WorkItemType] = '{}'",
        work_item_type.replace('\'', "''")
    )
}

/// One-operation JSON Patch document replacing `field_path`.
pub fn replace_field_patch(field_path: &str, value: &str) -> serde_json::Value {
    json!([{
        "op": "replace",
        "path": format!("/fields/{field_path}"),
        "value": value,
    }])
}

#[derive(Deserialize)]
struct WiqlResponse {
    #[serde(rename = "workItems", default)]
    work_items: Vec<WorkItemRef>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Prefer the backend's `message` field; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

async fn remote_error(resp: reqwest::Response) -> TrackerError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    TrackerError::Remote {
        status,
        message: error_message(&body),
    }
}

#[async_trait]
impl WorkItemTracker for AzureDevOpsTracker {
    fn name(&self) -> &str {
        "Azure DevOps"
    }

    async fn query_by_type(&self, work_item_type: &str) -> Result<Vec<WorkItemRef>, TrackerError> {
        let query = wiql_for_type(work_item_type);
        tracing::debug!(%query, "running wiql query");

        let resp = self
            .client
            .post(self.wiql_url())
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .json(&json!({ "query": query }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(remote_error(resp).await);
        }

        let body = resp.text().await?;
        let parsed: WiqlResponse = serde_json::from_str(&body)
            .map_err(|e| TrackerError::Decode(format!("wiql response: {e}")))?;
        tracing::debug!(count = parsed.work_items.len(), "wiql query returned");
        Ok(parsed.work_items)
    }

    async fn fetch_by_id(
        &self,
        id: u64,
        project: Option<&str>,
    ) -> Result<RawWorkItem, TrackerError> {
        tracing::debug!(id, project = project.unwrap_or(""), "fetching work item");

        let resp = self
            .client
            .get(self.work_item_url(id, project))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound { id });
        }
        if !status.is_success() {
            return Err(remote_error(resp).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| TrackerError::Decode(format!("work item {id}: {e}")))
    }

    async fn apply_field_patch(
        &self,
        id: u64,
        field_path: &str,
        value: &str,
    ) -> Result<PatchOutcome, TrackerError> {
        let patch = replace_field_patch(field_path, value);
        let body = serde_json::to_vec(&patch)
            .map_err(|e| TrackerError::Decode(format!("patch document: {e}")))?;

        let resp = self
            .client
            .patch(self.work_item_url(id, None))
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json-patch+json")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            tracing::info!(id, field = field_path, "field patched");
            return Ok(PatchOutcome::Applied);
        }

        let text = resp.text().await.unwrap_or_default();
        tracing::warn!(id, field = field_path, status = status.as_u16(), "patch rejected");
        Ok(PatchOutcome::Rejected {
            status: status.as_u16(),
            body: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(org: &str) -> AzureDevOpsTracker {
        AzureDevOpsTracker::new(&AzureConfig {
            organization_url: org.into(),
            personal_access_token: "pat".into(),
            project_id: "Platform".into(),
            request_timeout_secs: None,
        })
        .unwrap()
    }

    #[test]
    fn auth_header_uses_empty_user_and_pat() {
        let t = tracker("https://dev.azure.com/acme");
        // base64(":pat")
        assert_eq!(t.auth_header, "Basic OnBhdA==");
    }

    #[test]
    fn urls_are_built_from_trimmed_org() {
        let t = tracker("https://dev.azure.com/acme/");
        assert_eq!(
            t.wiql_url(),
            "https://dev.azure.com/acme/_apis/wit/wiql?api-version=7.1"
        );
        assert_eq!(
            t.work_item_url(5, None),
            "https://dev.azure.com/acme/_apis/wit/workitems/5?api-version=7.1"
        );
        assert_eq!(
            t.work_item_url(5, Some("My Project")),
            "https://dev.azure.com/acme/My%20Project/_apis/wit/workitems/5?api-version=7.1"
        );
        assert_eq!(
            t.work_item_url(5, Some("")),
            "https://dev.azure.com/acme/_apis/wit/workitems/5?api-version=7.1"
        );
    }

    #[test]
    fn wiql_escapes_quotes() {
        assert_eq!(
            wiql_for_type("User Story"),
            "SELECT [System.Id] FROM WorkItems WHERE [System.WorkItemType] = 'User Story'"
        );
        assert!(wiql_for_type("O'Brien").ends_with("= 'O''Brien'"));
    }

    #[test]
    fn patch_document_is_single_replace() {
        let patch = replace_field_patch("Microsoft.VSTS.Common.AcceptanceCriteria", "Given x");
        let ops = patch.as_array().unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0]["op"], "replace");
        assert_eq!(ops[0]["path"], "/fields/Microsoft.VSTS.Common.AcceptanceCriteria");
        assert_eq!(ops[0]["value"], "Given x");
    }

    #[test]
    fn wiql_response_keeps_backend_order() {
        let parsed: WiqlResponse = serde_json::from_str(
            r#"{"queryType":"flat","workItems":[{"id":30,"url":"u"},{"id":4,"url":"u"}]}"#,
        )
        .unwrap();
        let ids: Vec<u64> = parsed.work_items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![30, 4]);
    }

    #[test]
    fn error_message_prefers_backend_message() {
        assert_eq!(
            error_message(r#"{"$id":"1","message":"TF401232: Work item 9 does not exist","typeKey":"X"}"#),
            "TF401232: Work item 9 does not exist"
        );
        assert_eq!(error_message(" gateway timeout \n"), "gateway timeout");
    }
}
