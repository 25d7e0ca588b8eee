use serde_json::{json, Value};

fn work_item_id_param() -> Value {
    json!({
        "name": "work_item_id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Error" } } }
    })
}

fn string_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": { "type": "string" } } }
    })
}

fn list_operation() -> Value {
    json!({
        "get": {
            "summary": "List every User Story with HTML stripped from rich-text fields",
            "responses": {
                "200": {
                    "description": "User stories in backend query order",
                    "content": { "application/json": { "schema": {
                        "type": "array",
                        "items": { "$ref": "#/components/schemas/WorkItem" }
                    } } }
                },
                "500": error_response("Backend failure or missing required field")
            }
        }
    })
}

fn description_operation() -> Value {
    json!({
        "get": {
            "summary": "Plain-text description of one User Story",
            "parameters": [work_item_id_param()],
            "responses": {
                "200": string_response("Description text"),
                "404": error_response("Work item or description not found"),
                "500": error_response("Backend failure")
            }
        }
    })
}

fn update_criteria_operation() -> Value {
    let new_criteria = json!({
        "name": "new_criteria_accept",
        "in": "query",
        "required": true,
        "schema": { "type": "string" }
    });
    json!({
        "put": {
            "summary": "Set acceptance criteria when the field is still empty",
            "parameters": [work_item_id_param(), new_criteria],
            "responses": {
                "200": string_response("Outcome message, including rejected patches"),
                "400": { "description": "Missing new_criteria_accept" },
                "404": error_response("Work item or description not found"),
                "500": error_response("Backend failure")
            }
        }
    })
}

fn schemas() -> Value {
    let work_item = json!({
        "type": "object",
        "required": ["id", "title", "description", "workItemType", "acceptance_criteria"],
        "properties": {
            "id": { "type": "integer", "format": "int64" },
            "title": { "type": "string" },
            "description": { "type": "string" },
            "workItemType": { "type": "string" },
            "acceptance_criteria": { "type": "string" }
        }
    });
    json!({
        "WorkItem": work_item,
        "Error": {
            "type": "object",
            "properties": { "detail": { "type": "string" } }
        }
    })
}

/// OpenAPI 3 description of the HTTP surface, served at `/openapi.json`.
pub fn document() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Automation IA Azure",
            "description": "User Story access on Azure DevOps.",
            "version": "1.0"
        },
        "paths": {
            "/": {
                "get": {
                    "summary": "General information",
                    "responses": { "200": { "description": "Pointer to this document" } }
                }
            },
            "/workitems": list_operation(),
            "/user-story/{work_item_id}/description": description_operation(),
            "/user-story/{work_item_id}/update-criteria": update_criteria_operation()
        },
        "components": { "schemas": schemas() }
    })
}
