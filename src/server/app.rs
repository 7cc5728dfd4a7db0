use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{health, options, scenarios};
use crate::services::{ScenarioOption, ScenarioService, ScenarioWithOptions};

#[derive(Clone)]
pub struct AppState {
    pub scenarios: ScenarioService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        scenarios::list_scenarios,
        scenarios::get_scenario,
        scenarios::create_scenario,
        scenarios::update_scenario,
        scenarios::delete_scenario,
        options::create_option,
        options::update_option,
        options::delete_option,
    ),
    components(schemas(
        ScenarioWithOptions,
        ScenarioOption,
        scenarios::CreateScenarioRequest,
        scenarios::UpdateScenarioRequest,
        scenarios::OptionRequest,
        options::CreateOptionRequest,
        options::UpdateOptionRequest,
    )),
    tags((name = "chatflow", description = "Scenario graph administration"))
)]
pub struct ApiDoc;

pub async fn create_app(db: DatabaseConnection, cors_origin: Option<&str>) -> Result<Router> {
    let state = AppState {
        scenarios: ScenarioService::new(db),
    };

    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin: {}", origin))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/scenarios",
            get(scenarios::list_scenarios).post(scenarios::create_scenario),
        )
        .route(
            "/scenarios/:id",
            get(scenarios::get_scenario)
                .put(scenarios::update_scenario)
                .delete(scenarios::delete_scenario),
        )
        .route("/options", post(options::create_option))
        .route(
            "/options/:id",
            put(options::update_option).delete(options::delete_option),
        )
}
