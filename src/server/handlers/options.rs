use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::server::app::AppState;
use crate::server::errors::ApiError;
use crate::services::{OptionInput, ScenarioOption, ValidationService};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOptionRequest {
    pub scenario_id: Option<String>,
    pub text: Option<String>,
    pub next_scenario_id: Option<String>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOptionRequest {
    pub text: Option<String>,
    pub next_scenario_id: Option<String>,
    pub order_index: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/api/options",
    request_body = CreateOptionRequest,
    responses(
        (status = 201, description = "Option created", body = ScenarioOption),
        (status = 400, description = "Missing fields or unknown scenario")
    )
)]
pub async fn create_option(
    State(state): State<AppState>,
    payload: Result<Json<CreateOptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScenarioOption>), ApiError> {
    let Json(payload) = payload?;

    let scenario_id = ValidationService::require("scenario_id", payload.scenario_id)?;
    let input = OptionInput {
        text: ValidationService::require("text", payload.text)?,
        next_scenario_id: ValidationService::require("next_scenario_id", payload.next_scenario_id)?,
        order_index: payload.order_index,
    };

    let option = state.scenarios.create_option(&scenario_id, input).await?;
    Ok((StatusCode::CREATED, Json(option)))
}

#[utoipa::path(
    put,
    path = "/api/options/{id}",
    params(
        ("id" = i32, Path, description = "Option ID")
    ),
    request_body = UpdateOptionRequest,
    responses(
        (status = 200, description = "Option updated", body = ScenarioOption),
        (status = 400, description = "Missing fields or unknown target"),
        (status = 404, description = "Option not found")
    )
)]
pub async fn update_option(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateOptionRequest>, JsonRejection>,
) -> Result<Json<ScenarioOption>, ApiError> {
    let Json(payload) = payload?;

    let input = OptionInput {
        text: ValidationService::require("text", payload.text)?,
        next_scenario_id: ValidationService::require("next_scenario_id", payload.next_scenario_id)?,
        order_index: payload.order_index,
    };

    state
        .scenarios
        .update_option(id, input)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Option", id.to_string()))
}

#[utoipa::path(
    delete,
    path = "/api/options/{id}",
    params(
        ("id" = i32, Path, description = "Option ID")
    ),
    responses(
        (status = 200, description = "Option deleted"),
        (status = 404, description = "Option not found")
    )
)]
pub async fn delete_option(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    if state.scenarios.delete_option(id).await? {
        Ok(Json(json!({ "message": "Option deleted successfully" })))
    } else {
        Err(ApiError::not_found("Option", id.to_string()))
    }
}
