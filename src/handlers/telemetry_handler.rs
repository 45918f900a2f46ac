//! 读数与预警查询 API 处理器

use crate::errors::AppError;
use crate::models::{ApiResponse, RecentQuery};
use crate::services::SimulationScheduler;
use actix_web::{web, HttpResponse};
use std::sync::Arc;
use validator::Validate;

/// 最近的读数
pub async fn recent_readings(
    scheduler: web::Data<Arc<SimulationScheduler>>,
    query: web::Query<RecentQuery>,
) -> Result<HttpResponse, AppError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let readings = scheduler.store().recent_readings(query.limit);

    Ok(HttpResponse::Ok().json(ApiResponse::success(readings)))
}

/// 最近的预警记录
pub async fn recent_alerts(
    scheduler: web::Data<Arc<SimulationScheduler>>,
    query: web::Query<RecentQuery>,
) -> Result<HttpResponse, AppError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let alerts = scheduler.store().recent_alerts(query.limit);

    Ok(HttpResponse::Ok().json(ApiResponse::success(alerts)))
}

/// 存储统计
pub async fn store_stats(
    scheduler: web::Data<Arc<SimulationScheduler>>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(scheduler.store().stats())))
}
