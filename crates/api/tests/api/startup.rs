use crate::helpers::{get_json, SCHEMA};
use axum::http::StatusCode;
use climate_api::{app, build_app_state, RangeMode};
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{path::PathBuf, str::FromStr};

async fn create_database(name: &str, schema: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{}-{}.sqlite", name, std::process::id()));
    let _ = std::fs::remove_file(&path);

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create database file");
    sqlx::raw_sql(schema).execute(&pool).await.unwrap();
    sqlx::query(
        "INSERT INTO station (station, name, latitude, longitude, elevation)
         VALUES ('USC00519397', 'WAIKIKI 717.2, HI US', 21.2716, -157.8168, 3.0)",
    )
    .execute(&pool)
    .await
    .ok();
    pool.close().await;
    path
}

#[tokio::test]
async fn serves_from_database_file() {
    let path = create_database("climate-api-startup", SCHEMA).await;

    let state = build_app_state(path.display().to_string(), RangeMode::Requested, false)
        .await
        .expect("Failed to build app state");
    let (status, body) = get_json(&app(state), "/api/v1.0/stations").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["USC00519397"]));
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn missing_database_fails_fast() {
    let result = build_app_state(
        "/nonexistent/path/hawaii.sqlite".to_string(),
        RangeMode::Requested,
        false,
    )
    .await;

    let err = result.err().expect("missing database should fail");
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn unexpected_layout_fails_fast() {
    let path = create_database(
        "climate-api-bad-layout",
        "CREATE TABLE station (station TEXT, name TEXT, latitude FLOAT, longitude FLOAT, elevation FLOAT);
         CREATE TABLE measurement (station TEXT, date TEXT);",
    )
    .await;

    let result = build_app_state(path.display().to_string(), RangeMode::LastYear, true).await;
    std::fs::remove_file(&path).unwrap();

    let err = result.err().expect("layout check should fail");
    let message = err.to_string();
    assert!(message.contains("prcp"), "{message}");
    assert!(message.contains("tobs"), "{message}");
}
