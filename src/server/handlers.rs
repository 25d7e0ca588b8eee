use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::ApiError;
use crate::model::work_item::{
    PatchOutcome, RawWorkItem, WorkItem, FIELD_ACCEPTANCE_CRITERIA, FIELD_DESCRIPTION,
    FIELD_TITLE, FIELD_WORK_ITEM_TYPE, USER_STORY,
};
use crate::util::html::{normalize, normalize_value};

/// Substituted when a story has no acceptance criteria. Consumers match on this text.
pub const MISSING_FIELD_PLACEHOLDER: &str = "Campo não encontrado";

const NO_DESCRIPTION: &str = "no description present";

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "See /openapi.json for the API documentation." }))
}

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn openapi() -> Json<Value> {
    Json(super::openapi::document())
}

/// `GET /workitems`: every user story, normalized, in backend query order.
///
/// Items are fetched one by one and the first failure aborts the whole list.
/// Every backend failure here is a 500, even an item that vanished after the query.
pub async fn list_work_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkItem>>, ApiError> {
    let refs = state
        .tracker
        .query_by_type(USER_STORY)
        .await
        .map_err(ApiError::remote)?;
    tracing::info!(count = refs.len(), "listing user stories");

    let mut results = Vec::with_capacity(refs.len());
    for item_ref in refs {
        let raw = state
            .tracker
            .fetch_by_id(item_ref.id, None)
            .await
            .map_err(ApiError::remote)?;
        results.push(project_story(&raw)?);
    }
    Ok(Json(results))
}

fn project_story(raw: &RawWorkItem) -> Result<WorkItem, ApiError> {
    let title = required_text(raw, FIELD_TITLE)?;
    let description = normalize_value(Some(required(raw, FIELD_DESCRIPTION)?));
    let work_item_type = required_text(raw, FIELD_WORK_ITEM_TYPE)?;
    let acceptance_criteria = match raw.field(FIELD_ACCEPTANCE_CRITERIA) {
        Some(v) => normalize_value(Some(v)),
        None => normalize(Some(MISSING_FIELD_PLACEHOLDER)),
    };

    Ok(WorkItem {
        id: raw.id,
        title,
        description,
        work_item_type,
        acceptance_criteria,
    })
}

fn required<'a>(raw: &'a RawWorkItem, path: &str) -> Result<&'a Value, ApiError> {
    raw.field(path).ok_or_else(|| {
        ApiError::Remote(format!(
            "error retrieving work items: work item {} has no field {path}",
            raw.id
        ))
    })
}

fn required_text(raw: &RawWorkItem, path: &str) -> Result<String, ApiError> {
    Ok(match required(raw, path)? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Fetch with the configured project, then check the description separately.
///
/// The two steps are distinct failure domains: a missing description stays a
/// 404 instead of being folded into the generic 500 used for fetch failures.
async fn fetch_with_description(state: &AppState, id: u64) -> Result<RawWorkItem, ApiError> {
    let raw = state
        .tracker
        .fetch_by_id(id, Some(&*state.project_id))
        .await?;
    if raw.is_blank(FIELD_DESCRIPTION) {
        return Err(ApiError::NotFound(NO_DESCRIPTION.to_string()));
    }
    Ok(raw)
}

/// `GET /user-story/{id}/description`: the description as a bare JSON string.
pub async fn get_description(
    State(state): State<AppState>,
    Path(work_item_id): Path<u64>,
) -> Result<Json<String>, ApiError> {
    let raw = fetch_with_description(&state, work_item_id).await?;
    Ok(Json(normalize_value(raw.field(FIELD_DESCRIPTION))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCriteriaParams {
    pub new_criteria_accept: String,
}

/// `PUT /user-story/{id}/update-criteria`: fill in acceptance criteria if unset.
///
/// A rejected patch is reported in a 200 body, not as an error status.
pub async fn update_criteria(
    State(state): State<AppState>,
    Path(work_item_id): Path<u64>,
    Query(params): Query<UpdateCriteriaParams>,
) -> Result<Json<String>, ApiError> {
    let raw = fetch_with_description(&state, work_item_id).await?;

    // Presence is decided on the raw value; markup-only content counts as set.
    if !raw.is_blank(FIELD_ACCEPTANCE_CRITERIA) {
        tracing::info!(id = raw.id, "acceptance criteria already set, skipping patch");
        return Ok(Json(
            "AcceptanceCriteria already set; no changes made".to_string(),
        ));
    }

    let outcome = state
        .tracker
        .apply_field_patch(raw.id, FIELD_ACCEPTANCE_CRITERIA, &params.new_criteria_accept)
        .await?;

    let message = match outcome {
        PatchOutcome::Applied => format!(
            "AcceptanceCriteria updated successfully to {}",
            params.new_criteria_accept
        ),
        PatchOutcome::Rejected { status, body } => {
            format!("Failed to update AcceptanceCriteria. Status code: {status} {body}")
        }
    };
    Ok(Json(message))
}
