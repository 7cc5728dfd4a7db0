use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::errors::ScenarioResult;
use crate::server::app::AppState;
use crate::server::errors::ApiError;
use crate::services::{OptionInput, ScenarioFields, ScenarioWithOptions, ValidationService};

/// Option as submitted inside a scenario body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OptionRequest {
    pub text: Option<String>,
    pub next_scenario_id: Option<String>,
    pub order_index: Option<i32>,
}

impl OptionRequest {
    pub fn into_input(self) -> ScenarioResult<OptionInput> {
        Ok(OptionInput {
            text: ValidationService::require("text", self.text)?,
            next_scenario_id: ValidationService::require(
                "next_scenario_id",
                self.next_scenario_id,
            )?,
            order_index: self.order_index,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateScenarioRequest {
    pub id: Option<String>,
    pub message: Option<String>,
    pub html_content: Option<String>,
    pub parent_id: Option<String>,
    pub order_index: Option<i32>,
    pub options: Option<Vec<OptionRequest>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateScenarioRequest {
    pub message: Option<String>,
    pub html_content: Option<String>,
    pub parent_id: Option<String>,
    pub order_index: Option<i32>,
    /// When present, replaces every option of the scenario.
    pub options: Option<Vec<OptionRequest>>,
}

fn collect_options(options: Option<Vec<OptionRequest>>) -> ScenarioResult<Option<Vec<OptionInput>>> {
    options
        .map(|options| {
            options
                .into_iter()
                .map(OptionRequest::into_input)
                .collect::<ScenarioResult<Vec<_>>>()
        })
        .transpose()
}

#[utoipa::path(
    get,
    path = "/api/scenarios",
    responses(
        (status = 200, description = "All scenarios with their options", body = [ScenarioWithOptions])
    )
)]
pub async fn list_scenarios(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScenarioWithOptions>>, ApiError> {
    Ok(Json(state.scenarios.get_all().await?))
}

#[utoipa::path(
    get,
    path = "/api/scenarios/{id}",
    params(
        ("id" = String, Path, description = "Scenario ID")
    ),
    responses(
        (status = 200, description = "Scenario found", body = ScenarioWithOptions),
        (status = 404, description = "Scenario not found")
    )
)]
pub async fn get_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScenarioWithOptions>, ApiError> {
    state
        .scenarios
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Scenario", id))
}

#[utoipa::path(
    post,
    path = "/api/scenarios",
    request_body = CreateScenarioRequest,
    responses(
        (status = 201, description = "Scenario created", body = ScenarioWithOptions),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Scenario id already taken")
    )
)]
pub async fn create_scenario(
    State(state): State<AppState>,
    payload: Result<Json<CreateScenarioRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScenarioWithOptions>), ApiError> {
    let Json(payload) = payload?;

    let id = ValidationService::require("id", payload.id)?;
    let fields = ScenarioFields {
        message: ValidationService::require("message", payload.message)?,
        html_content: payload.html_content,
        parent_id: payload.parent_id,
        order_index: payload.order_index,
    };
    let options = collect_options(payload.options)?.unwrap_or_default();

    let created = state
        .scenarios
        .create_with_options(&id, fields, options)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/scenarios/{id}",
    params(
        ("id" = String, Path, description = "Scenario ID")
    ),
    request_body = UpdateScenarioRequest,
    responses(
        (status = 200, description = "Scenario updated", body = ScenarioWithOptions),
        (status = 400, description = "Missing or invalid fields"),
        (status = 404, description = "Scenario not found")
    )
)]
pub async fn update_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateScenarioRequest>, JsonRejection>,
) -> Result<Json<ScenarioWithOptions>, ApiError> {
    let Json(payload) = payload?;

    let fields = ScenarioFields {
        message: ValidationService::require("message", payload.message)?,
        html_content: payload.html_content,
        parent_id: payload.parent_id,
        order_index: payload.order_index,
    };
    let options = collect_options(payload.options)?;

    state
        .scenarios
        .update_with_options(&id, fields, options)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Scenario", id))
}

#[utoipa::path(
    delete,
    path = "/api/scenarios/{id}",
    params(
        ("id" = String, Path, description = "Scenario ID")
    ),
    responses(
        (status = 200, description = "Scenario and its options deleted"),
        (status = 404, description = "Scenario not found")
    )
)]
pub async fn delete_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.scenarios.delete(&id).await? {
        Ok(Json(json!({ "message": "Scenario deleted successfully" })))
    } else {
        Err(ApiError::not_found("Scenario", id))
    }
}
