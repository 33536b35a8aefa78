use crate::helpers::{get_json, insert_measurements, memory_pool, spawn_app};
use axum::http::StatusCode;
use climate_api::RangeMode;
use serde_json::{json, Value};

fn triple(body: &Value) -> (f64, f64, f64) {
    let row = &body[0];
    (
        row[0].as_f64().unwrap(),
        row[1].as_f64().unwrap(),
        row[2].as_f64().unwrap(),
    )
}

async fn seeded(range_mode: RangeMode) -> crate::helpers::TestApp {
    let pool = memory_pool().await;
    insert_measurements(
        &pool,
        &[
            ("USC00519397", "2010-01-01", Some(0.08), 65.0),
            ("USC00519397", "2016-08-22", Some(0.0), 90.0),
            ("USC00519397", "2016-08-23", Some(0.0), 58.0),
            ("USC00513117", "2017-02-14", Some(0.1), 62.0),
            ("USC00519281", "2017-08-23", Some(0.0), 70.0),
        ],
    )
    .await;
    spawn_app(pool, range_mode).await
}

#[tokio::test]
async fn start_aggregate_matches_direct_computation() {
    let test_app = seeded(RangeMode::Requested).await;

    let (status, body) = get_json(&test_app.app, "/api/v1.0/2016-08-23").await;

    assert_eq!(status, StatusCode::OK);
    let (min, max, avg) = triple(&body);
    assert_eq!(min, 58.0);
    assert_eq!(max, 70.0);
    assert!((avg - 190.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn range_aggregate_is_inclusive_on_both_ends() {
    let test_app = seeded(RangeMode::Requested).await;

    let (status, body) = get_json(&test_app.app, "/api/v1.0/2016-08-22/2017-02-14").await;

    assert_eq!(status, StatusCode::OK);
    let (min, max, avg) = triple(&body);
    assert_eq!(min, 58.0);
    assert_eq!(max, 90.0);
    assert!((avg - 70.0).abs() < 1e-9);
}

#[tokio::test]
async fn range_matching_nothing_returns_null_row() {
    let test_app = seeded(RangeMode::Requested).await;

    let (status, body) = get_json(&test_app.app, "/api/v1.0/2011-01-01/2011-12-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([[null, null, null]]));

    let (status, body) = get_json(&test_app.app, "/api/v1.0/2018-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([[null, null, null]]));
}

#[tokio::test]
async fn last_year_mode_ignores_caller_bounds() {
    let test_app = seeded(RangeMode::LastYear).await;

    // window is 2016-08-23 ..= 2017-08-23 regardless of the path
    let (status, from_start) = get_json(&test_app.app, "/api/v1.0/2010-01-01").await;
    assert_eq!(status, StatusCode::OK);
    let (min, max, avg) = triple(&from_start);
    assert_eq!((min, max), (58.0, 70.0));
    assert!((avg - 190.0 / 3.0).abs() < 1e-9);

    let (status, ranged) = get_json(&test_app.app, "/api/v1.0/2011-01-01/2011-12-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ranged, from_start);
}

#[tokio::test]
async fn malformed_dates_are_bad_requests() {
    for range_mode in [RangeMode::Requested, RangeMode::LastYear] {
        let test_app = seeded(range_mode).await;

        for uri in [
            "/api/v1.0/2017-02-30",
            "/api/v1.0/last-week",
            "/api/v1.0/2016-08-23/20170823",
            "/api/v1.0/+2016-08-23",
            "/api/v1.0/%202016-08-23",
            "/api/v1.0/2016-08-23/%202017-08-23",
        ] {
            let (status, body) = get_json(&test_app.app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));
        }
    }
}
