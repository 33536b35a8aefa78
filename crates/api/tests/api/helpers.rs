use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use climate_api::{
    app, state_from, ClimateAccess, ClimateData, DateRange, Error, Precipitation, RangeMode,
    Station, TemperatureObservation, TemperatureSummary,
};
use hyper::{header, Method};
use mockall::mock;
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;
use time::Date;
use tower::ServiceExt;

mock! {
    pub ClimateAccess {}
    #[async_trait]
    impl ClimateData for ClimateAccess {
        async fn latest_date(&self) -> Result<Option<Date>, Error>;
        async fn precipitation(&self, range: DateRange) -> Result<Vec<Precipitation>, Error>;
        async fn temperatures(&self, range: DateRange) -> Result<Vec<TemperatureObservation>, Error>;
        async fn temperature_summary(&self, range: DateRange) -> Result<Option<TemperatureSummary>, Error>;
        async fn station_ids(&self) -> Result<Vec<String>, Error>;
        async fn stations(&self) -> Result<Vec<Station>, Error>;
        async fn health_check(&self) -> Result<(), Error>;
    }
}

pub const SCHEMA: &str = r#"
    CREATE TABLE station (
        id INTEGER PRIMARY KEY,
        station TEXT,
        name TEXT,
        latitude FLOAT,
        longitude FLOAT,
        elevation FLOAT
    );
    CREATE TABLE measurement (
        id INTEGER PRIMARY KEY,
        station TEXT,
        date TEXT,
        prcp FLOAT,
        tobs FLOAT
    );
"#;

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
}

/// A single long-lived connection so the in-memory database survives between queries
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to create schema");
    pool
}

pub async fn insert_measurements(pool: &SqlitePool, rows: &[(&str, &str, Option<f64>, f64)]) {
    for (station, date, prcp, tobs) in rows {
        sqlx::query("INSERT INTO measurement (station, date, prcp, tobs) VALUES (?, ?, ?, ?)")
            .bind(*station)
            .bind(*date)
            .bind(*prcp)
            .bind(*tobs)
            .execute(pool)
            .await
            .expect("Failed to insert measurement");
    }
}

pub async fn insert_stations(pool: &SqlitePool, ids: &[&str]) {
    for (index, id) in ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO station (station, name, latitude, longitude, elevation) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(*id)
        .bind(format!("STATION {}, HI US", index))
        .bind(21.0 + index as f64 / 10.0)
        .bind(-157.8)
        .bind(3.0 * index as f64)
        .execute(pool)
        .await
        .expect("Failed to insert station");
    }
}

pub async fn spawn_app(pool: SqlitePool, range_mode: RangeMode) -> TestApp {
    let climate_db = Arc::new(ClimateAccess::from_pool(pool.clone()));
    TestApp {
        app: app(state_from(climate_db, range_mode)),
        pool,
    }
}

pub fn spawn_mock_app(climate_db: MockClimateAccess, range_mode: RangeMode) -> Router {
    app(state_from(Arc::new(climate_db), range_mode))
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::ACCEPT, "application/json")
        .body(Body::empty())
        .unwrap();

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    let json = serde_json::from_slice(&body).expect("Response was not JSON");
    (status, json)
}
