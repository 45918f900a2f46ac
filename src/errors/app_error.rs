//! 统一错误类型定义

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// 应用错误类型
///
/// 管线内可恢复错误（持久化、通知对象解析、分发）只在日志中体现，
/// 不会从 tick 中向外抛出；`SchedulerFatal` 是唯一会阻止调度器启动的错误。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // 读数生成错误（阈值配置异常导致 NaN/溢出）
    #[error("读数生成失败: {0}")]
    Generation(String),

    // 持久化错误（可恢复，降级到内存缓冲）
    #[error("持久化失败: {0}")]
    Persistence(String),

    // 通知对象解析错误（可恢复，降级到应急名单）
    #[error("通知对象解析失败: {0}")]
    RecipientResolution(String),

    // 单个地址的分发错误（可恢复）
    #[error("通知发送失败: {0}")]
    Dispatch(String),

    // 调度器启动时的不可恢复配置错误
    #[error("调度器配置错误: {0}")]
    SchedulerFatal(String),

    // 请求验证错误 (400)
    #[error("请求参数无效: {0}")]
    ValidationError(String),

    // 数据库错误 (500)
    #[error("数据库错误: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // 内部错误 (500)
    #[error("内部服务错误: {0}")]
    InternalError(String),

    // 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),
}

/// API 错误响应结构
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::SchedulerFatal(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Generation(_)
            | AppError::Persistence(_)
            | AppError::RecipientResolution(_)
            | AppError::Dispatch(_)
            | AppError::DatabaseError(_)
            | AppError::InternalError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // 不暴露内部错误细节
        let message = match self {
            AppError::ValidationError(msg) => msg.clone(),
            AppError::SchedulerFatal(msg) => msg.clone(),
            AppError::DatabaseError(_) | AppError::Persistence(_) => "存储服务暂时不可用".to_string(),
            AppError::ConfigError(_) => "服务配置错误".to_string(),
            _ => "服务内部错误".to_string(),
        };

        tracing::error!(
            error = %self,
            status = %status,
            "请求处理错误"
        );

        HttpResponse::build(status).json(ErrorResponse {
            code: status.as_u16(),
            message,
        })
    }
}
