//! 模拟调度控制 API 处理器

use crate::errors::AppError;
use crate::models::ApiResponse;
use crate::services::SimulationScheduler;
use actix_web::{web, HttpResponse};
use std::sync::Arc;

/// 启动模拟（已运行时返回当前状态）
pub async fn start_simulation(
    scheduler: web::Data<Arc<SimulationScheduler>>,
) -> Result<HttpResponse, AppError> {
    let status = scheduler.start().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(status, "模拟已运行")))
}

/// 停止模拟
pub async fn stop_simulation(
    scheduler: web::Data<Arc<SimulationScheduler>>,
) -> Result<HttpResponse, AppError> {
    let status = scheduler.stop().await;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(status, "模拟已停止")))
}

/// 查询调度状态与各传感器计数
pub async fn simulation_status(
    scheduler: web::Data<Arc<SimulationScheduler>>,
) -> Result<HttpResponse, AppError> {
    let status = scheduler.status().await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
}
