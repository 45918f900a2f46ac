//! 健康检查 API 处理器

use crate::db::PostgresPool;
use crate::models::{HealthCheckResponse, SchedulerState};
use crate::services::SimulationScheduler;
use actix_web::{web, HttpResponse};
use std::sync::Arc;
use std::time::Instant;

/// 应用启动时间
static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

/// 健康检查：模拟调度状态与（若启用）数据库连通性
pub async fn health(
    scheduler: web::Data<Arc<SimulationScheduler>>,
    pg_pool: Option<web::Data<Arc<PostgresPool>>>,
) -> HttpResponse {
    let simulation = match scheduler.status().await.state {
        SchedulerState::Running => "running",
        SchedulerState::Stopped => "stopped",
    };

    let database_ok = match pg_pool {
        Some(pool) => pool.health_check().await.is_ok(),
        None => true,
    };

    let response = HealthCheckResponse {
        status: if database_ok { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        simulation: simulation.to_string(),
        uptime_seconds: START_TIME.elapsed().as_secs(),
    };

    HttpResponse::Ok().json(response)
}

/// 存活检查（用于 Kubernetes）
pub async fn live() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "alive": true
    }))
}
