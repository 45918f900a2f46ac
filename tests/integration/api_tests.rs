//! 控制面 API 集成测试

use crate::helpers::{directory, test_settings};
use crate::mocks::{MockChannel, MockSink};
use actix_web::{test, web, App};
use hydrowatch::routes;
use hydrowatch::services::{PipelineComponents, SchedulerConfig, SimulationScheduler};
use serde_json::Value;
use std::sync::Arc;

fn scheduler() -> Arc<SimulationScheduler> {
    let settings = test_settings("");
    let components = PipelineComponents::from_settings(
        &settings,
        Arc::new(MockSink::new(directory())),
        Arc::new(MockChannel::new()),
    )
    .expect("管线应能组装");

    Arc::new(SimulationScheduler::new(
        components,
        settings.build_sensors(),
        SchedulerConfig::from_settings(&settings),
    ))
}

macro_rules! app {
    ($scheduler:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($scheduler.clone()))
                .configure(routes::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_reports_simulation_state() {
    let scheduler = scheduler();
    let app = app!(scheduler);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["simulation"], "stopped");

    let req = test::TestRequest::get().uri("/health/live").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["alive"], true);
}

#[actix_web::test]
async fn test_start_stop_are_idempotent() {
    let scheduler = scheduler();
    let app = app!(scheduler);

    for _ in 0..2 {
        let req = test::TestRequest::post().uri("/api/v1/simulation/start").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["state"], "running");
        assert_eq!(body["data"]["tick_count"], 1);
        assert_eq!(body["data"]["sensors"].as_array().map(Vec::len), Some(2));
    }

    let req = test::TestRequest::get().uri("/api/v1/simulation/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["state"], "running");
    assert_eq!(body["data"]["sensors"][0]["stats"]["total_readings"], 1);

    for _ in 0..2 {
        let req = test::TestRequest::post().uri("/api/v1/simulation/stop").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["state"], "stopped");
    }

    scheduler.shutdown().await;
}

#[actix_web::test]
async fn test_recent_readings_respect_limit() {
    let scheduler = scheduler();
    scheduler.run_tick().await;
    scheduler.run_tick().await;
    let app = app!(scheduler);

    let req = test::TestRequest::get()
        .uri("/api/v1/readings/recent?limit=3")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let readings = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(readings.len(), 3);
    // 新的在前：最后一个 tick 的 S2 排第一
    assert_eq!(readings[0]["sensor_id"], "S2");

    let req = test::TestRequest::get().uri("/api/v1/readings/recent").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(4));
}

#[actix_web::test]
async fn test_invalid_limit_is_rejected() {
    let scheduler = scheduler();
    let app = app!(scheduler);

    for uri in ["/api/v1/alerts/recent?limit=0", "/api/v1/readings/recent?limit=500"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400, "{}", uri);
    }
}

#[actix_web::test]
async fn test_store_stats_and_empty_alerts() {
    let scheduler = scheduler();
    scheduler.run_tick().await;
    let app = app!(scheduler);

    let req = test::TestRequest::get().uri("/api/v1/store/stats").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["readings_persisted"], 2);
    assert_eq!(body["data"]["buffered_readings"], 2);
    assert_eq!(body["data"]["alerts_persisted"], 0);

    let req = test::TestRequest::get().uri("/api/v1/alerts/recent").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}
