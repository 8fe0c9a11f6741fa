use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value};
use tower_http::trace::TraceLayer;

use crate::dates;
use crate::db::models::{TemperatureReading, TemperatureStats};
use crate::db::Repository;
use crate::error::ApiError;

const NO_DATA_FROM_START: &str = "No data found for the given start date.";
const NO_DATA_IN_RANGE: &str = "No data found for the given date range.";

const ROUTE_LIST: &str = "Welcome to the Climate Analysis API!<br/>\
    Available Routes:<br/>\
    /api/v1.0/precipitation (precipitation totals for the last 12 months)<br/>\
    /api/v1.0/stations (all weather station identifiers)<br/>\
    /api/v1.0/tobs (temperature observations from the most active station)<br/>\
    /api/v1.0/&lt;start&gt; (where 'start' is a date in YYYY-MM-DD format)<br/>\
    /api/v1.0/&lt;start&gt;/&lt;end&gt; (where 'start' and 'end' are dates in YYYY-MM-DD format)";

/// The full HTTP surface. Static routes take priority over the `{start}`
/// captures, so `/api/v1.0/stations` never reaches the stats handler.
pub fn router(repository: Arc<Repository>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/v1.0/precipitation", get(precipitation))
        .route("/api/v1.0/stations", get(stations))
        .route("/api/v1.0/tobs", get(tobs))
        .route("/api/v1.0/{start}", get(stats_from))
        .route("/api/v1.0/{start}/{end}", get(stats_range))
        .layer(TraceLayer::new_for_http())
        .with_state(repository)
}

async fn home() -> Html<&'static str> {
    Html(ROUTE_LIST)
}

/// Date-to-precipitation mapping for the trailing 12 months. The key is the
/// date alone, so when several stations report the same date the later row
/// in date-sorted order silently wins.
async fn precipitation(
    State(repository): State<Arc<Repository>>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let readings = repository.recent_precipitation().await?;

    let mut by_date = Map::new();
    for reading in readings {
        by_date.insert(
            reading.date,
            reading.precipitation.map_or(Value::Null, Value::from),
        );
    }

    Ok(Json(by_date))
}

async fn stations(
    State(repository): State<Arc<Repository>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(repository.station_ids().await?))
}

/// Every reading for the most active station in the window, duplicate dates
/// included. Unlike the precipitation route, nothing collapses here.
async fn tobs(
    State(repository): State<Arc<Repository>>,
) -> Result<Json<Vec<TemperatureReading>>, ApiError> {
    Ok(Json(repository.recent_temperatures().await?))
}

async fn stats_from(
    State(repository): State<Arc<Repository>>,
    Path(start): Path<String>,
) -> Result<Json<TemperatureStats>, ApiError> {
    if dates::parse_iso_date(&start).is_none() {
        return Err(ApiError::InvalidDate);
    }

    let stats = repository
        .temperature_stats_from(&start)
        .await?
        .ok_or(ApiError::NoData(NO_DATA_FROM_START))?;

    Ok(Json(stats))
}

async fn stats_range(
    State(repository): State<Arc<Repository>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<TemperatureStats>, ApiError> {
    if dates::parse_iso_date(&start).is_none() || dates::parse_iso_date(&end).is_none() {
        return Err(ApiError::InvalidDate);
    }

    let stats = repository
        .temperature_stats_in_range(&start, &end)
        .await?
        .ok_or(ApiError::NoData(NO_DATA_IN_RANGE))?;

    Ok(Json(stats))
}
