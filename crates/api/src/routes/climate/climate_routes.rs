use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    format_date, service::Error, AppState, ErrorBody, Station, TemperatureSummary,
};

/// One `[min, max, avg]` row, all null when nothing matched.
pub type SummaryRow = [Option<f64>; 3];

fn summary_rows(summary: Option<TemperatureSummary>) -> Vec<SummaryRow> {
    let row = match summary {
        Some(s) => [Some(s.min), Some(s.max), Some(s.avg)],
        None => [None, None, None],
    };
    vec![row]
}

#[utoipa::path(
    get,
    path = "/api/v1.0/precipitation",
    responses(
        (status = OK, description = "Precipitation for the year before the latest observation, keyed by date; the last station reported wins", body = HashMap<String, Option<f64>>),
        (status = SERVICE_UNAVAILABLE, description = "Failed to query the observation store", body = ErrorBody)
    ))]
pub async fn precipitation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, Option<f64>>>, Error> {
    let by_date = state.climate.precipitation_last_year().await?;
    let latest_per_date = by_date
        .into_iter()
        .map(|(date, values)| (format_date(date), values.last().copied().flatten()))
        .collect();
    Ok(Json(latest_per_date))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/precipitation/all",
    responses(
        (status = OK, description = "Every precipitation value for the year before the latest observation, grouped by date", body = HashMap<String, Vec<Option<f64>>>),
        (status = SERVICE_UNAVAILABLE, description = "Failed to query the observation store", body = ErrorBody)
    ))]
pub async fn precipitation_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, Vec<Option<f64>>>>, Error> {
    let by_date = state.climate.precipitation_last_year().await?;
    let grouped = by_date
        .into_iter()
        .map(|(date, values)| (format_date(date), values))
        .collect();
    Ok(Json(grouped))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/stations",
    responses(
        (status = OK, description = "Station identifiers in ascending order", body = Vec<String>),
        (status = SERVICE_UNAVAILABLE, description = "Failed to query the observation store", body = ErrorBody)
    ))]
pub async fn stations(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, Error> {
    Ok(Json(state.climate.stations().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/stations/details",
    responses(
        (status = OK, description = "Station records in ascending identifier order", body = Vec<Station>),
        (status = SERVICE_UNAVAILABLE, description = "Failed to query the observation store", body = ErrorBody)
    ))]
pub async fn station_details(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Station>>, Error> {
    Ok(Json(state.climate.station_details().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/tobs",
    responses(
        (status = OK, description = "[date, temperature] pairs for the year before the latest observation, oldest first", body = Vec<Vec<serde_json::Value>>),
        (status = SERVICE_UNAVAILABLE, description = "Failed to query the observation store", body = ErrorBody)
    ))]
pub async fn temperature_observations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<(String, f64)>>, Error> {
    let observations = state
        .climate
        .temperature_observations_last_year()
        .await?
        .into_iter()
        .map(|obs| (format_date(obs.date), obs.tobs))
        .collect();
    Ok(Json(observations))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/{start}",
    params(
         ("start" = String, Path, description = "Start date, YYYY-MM-DD"),
    ),
    responses(
        (status = OK, description = "One [min, max, avg] temperature row, nulls when no data", body = Vec<Vec<Option<f64>>>),
        (status = BAD_REQUEST, description = "Start is not a YYYY-MM-DD date", body = ErrorBody),
        (status = SERVICE_UNAVAILABLE, description = "Failed to query the observation store", body = ErrorBody)
    ))]
pub async fn aggregate_from_start(
    State(state): State<Arc<AppState>>,
    Path(start): Path<String>,
) -> Result<Json<Vec<SummaryRow>>, Error> {
    let summary = state.climate.aggregate_from_start(&start).await?;
    Ok(Json(summary_rows(summary)))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/{start}/{end}",
    params(
         ("start" = String, Path, description = "Start date, YYYY-MM-DD, inclusive"),
         ("end" = String, Path, description = "End date, YYYY-MM-DD, inclusive"),
    ),
    responses(
        (status = OK, description = "One [min, max, avg] temperature row, nulls when no data", body = Vec<Vec<Option<f64>>>),
        (status = BAD_REQUEST, description = "Start or end is not a YYYY-MM-DD date", body = ErrorBody),
        (status = SERVICE_UNAVAILABLE, description = "Failed to query the observation store", body = ErrorBody)
    ))]
pub async fn aggregate_range(
    State(state): State<Arc<AppState>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<Vec<SummaryRow>>, Error> {
    let summary = state.climate.aggregate_range(&start, &end).await?;
    Ok(Json(summary_rows(summary)))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = OK, description = "Observation store reachable"),
        (status = SERVICE_UNAVAILABLE, description = "Observation store unreachable", body = ErrorBody)
    ))]
pub async fn health(State(state): State<Arc<AppState>>) -> Result<(StatusCode, &'static str), Error> {
    state.climate.health_check().await?;
    Ok((StatusCode::OK, "ok"))
}
