//! 路由配置模块

use crate::handlers;
use actix_web::web;

/// 配置所有路由
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // 健康检查路由
        .service(
            web::scope("/health")
                .route("", web::get().to(handlers::health))
                .route("/live", web::get().to(handlers::live)),
        )
        // API v1 路由
        .service(
            web::scope("/api/v1")
                // 模拟调度控制
                .service(
                    web::scope("/simulation")
                        .route("/start", web::post().to(handlers::start_simulation))
                        .route("/stop", web::post().to(handlers::stop_simulation))
                        .route("/status", web::get().to(handlers::simulation_status)),
                )
                .route("/readings/recent", web::get().to(handlers::recent_readings))
                .route("/alerts/recent", web::get().to(handlers::recent_alerts))
                .route("/store/stats", web::get().to(handlers::store_stats)),
        );
}
