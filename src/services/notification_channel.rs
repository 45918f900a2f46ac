//! 通知发送通道

use crate::errors::AppError;
use async_trait::async_trait;

/// 单个地址的消息发送通道
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// 仅写日志的通道（未配置 SMTP 时使用）
#[derive(Debug, Default, Clone)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), AppError> {
        tracing::info!(
            to = %address,
            subject = %subject,
            body_len = body.len(),
            "通知（仅日志）"
        );
        Ok(())
    }
}
