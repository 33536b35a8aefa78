use crate::{
    aggregate_from_start, aggregate_range, health, index_handler, precipitation,
    precipitation_all, routes, station_details, stations, temperature_observations,
    ClimateAccess, ClimateData, ClimateService, ErrorBody, RangeMode, Station,
};
use anyhow::anyhow;
use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Router,
};
use climate_api_core::is_file;
use hyper::{header::ACCEPT, Method};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

#[derive(Clone)]
pub struct AppState {
    pub climate: Arc<ClimateService>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::climate::climate_routes::precipitation,
        routes::climate::climate_routes::precipitation_all,
        routes::climate::climate_routes::stations,
        routes::climate::climate_routes::station_details,
        routes::climate::climate_routes::temperature_observations,
        routes::climate::climate_routes::aggregate_from_start,
        routes::climate::climate_routes::aggregate_range,
        routes::climate::climate_routes::health,
    ),
    components(schemas(Station, ErrorBody)),
    tags(
        (name = "climate api", description = "a read-only RESTful api over daily station temperature and precipitation observations")
    )
)]
struct ApiDoc;

/// Opens the observation database and checks its schema before serving.
pub async fn build_app_state(
    database: String,
    range_mode: RangeMode,
    echo_sql: bool,
) -> Result<AppState, anyhow::Error> {
    if !is_file(&database) {
        return Err(anyhow!("observation database not found: {}", database));
    }

    let climate_db = ClimateAccess::new(&database, echo_sql)
        .await
        .map_err(|e| anyhow!("error opening observation database {}: {}", database, e))?;
    climate_db
        .verify_schema()
        .await
        .map_err(|e| anyhow!("unexpected observation database layout: {}", e))?;

    Ok(state_from(Arc::new(climate_db), range_mode))
}

pub fn state_from(climate_db: Arc<dyn ClimateData>, range_mode: RangeMode) -> AppState {
    AppState {
        climate: Arc::new(ClimateService::new(climate_db, range_mode)),
    }
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([ACCEPT])
        .allow_origin(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health))
        // every API path is served with and without a trailing slash
        .route("/api/v1.0/precipitation", get(precipitation))
        .route("/api/v1.0/precipitation/", get(precipitation))
        .route("/api/v1.0/precipitation/all", get(precipitation_all))
        .route("/api/v1.0/precipitation/all/", get(precipitation_all))
        .route("/api/v1.0/stations", get(stations))
        .route("/api/v1.0/stations/", get(stations))
        .route("/api/v1.0/stations/details", get(station_details))
        .route("/api/v1.0/stations/details/", get(station_details))
        .route("/api/v1.0/tobs", get(temperature_observations))
        .route("/api/v1.0/tobs/", get(temperature_observations))
        .route("/api/v1.0/{start}", get(aggregate_from_start))
        .route("/api/v1.0/{start}/", get(aggregate_from_start))
        .route("/api/v1.0/{start}/{end}", get(aggregate_range))
        .route("/api/v1.0/{start}/{end}/", get(aggregate_range))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .merge(Scalar::with_url("/docs", api_docs))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default()
        .to_owned();
    info!(target: "http_request", "new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}
